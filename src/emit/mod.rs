use crate::ast::{
    Block, Expr, Function, JsxAttrValue, JsxChild, JsxElement, Lit, Pos, Program, Span, Stmt,
};

mod source_map;

pub use source_map::{Mapping, SourceMap};

/// The serialized tree plus its position-mapping artifact
#[derive(Debug, Clone, PartialEq)]
pub struct EmitOutput {
    pub code: String,
    pub map: SourceMap,
}

/// Serialize a (possibly rewritten) tree back to JavaScript. `file` names the
/// original source in the mapping artifact.
pub fn emit(program: &Program, file: &str) -> EmitOutput {
    let mut emitter = Emitter::new(file);
    for stmt in &program.body.stmts {
        emitter.stmt(stmt);
    }
    EmitOutput { code: emitter.code, map: emitter.map }
}

// Binding strengths for parenthesization. Anything at least CALLEE_PREC can
// be a callee or member object without parentheses.
const ARG_PREC: u8 = 2;
const UNARY_PREC: u8 = 9;
const CALLEE_PREC: u8 = 10;
const PRIMARY_PREC: u8 = 11;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Assign { .. } | Expr::Arrow { .. } => ARG_PREC,
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => UNARY_PREC,
        Expr::Call { .. } | Expr::Member { .. } => CALLEE_PREC,
        Expr::Ident(_) | Expr::Lit { .. } | Expr::Array { .. } | Expr::Function { .. }
        | Expr::Jsx { .. } => PRIMARY_PREC,
    }
}

struct Emitter {
    code: String,
    line: u32,
    column: u32,
    indent: u32,
    map: SourceMap,
}

impl Emitter {
    fn new(file: &str) -> Self {
        Self {
            code: String::new(),
            line: 1,
            column: 0,
            indent: 0,
            map: SourceMap::new(file),
        }
    }

    // region writing
    fn write(&mut self, s: &str) {
        debug_assert!(!s.contains('\n'), "use newline() for line breaks");
        self.code.push_str(s);
        self.column += s.chars().count() as u32;
    }

    fn newline(&mut self) {
        self.code.push('\n');
        self.line += 1;
        self.column = 0;
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write("  ");
        }
    }

    /// Record a mapping entry at the cursor, unless the node is synthetic
    fn map_node(&mut self, span: Span) {
        if !span.is_synthetic() {
            self.map.record(Pos { line: self.line, column: self.column }, span.start);
        }
    }
    // endregion

    // region statements
    fn stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.stmt_here(stmt);
        self.newline();
    }

    /// Emit a statement at the cursor, without surrounding indentation or
    /// line break; used for labeled statement bodies
    fn stmt_here(&mut self, stmt: &Stmt) {
        self.map_node(stmt.span());
        match stmt {
            Stmt::Labeled { label, body, .. } => {
                self.write(&label.name);
                self.write(": ");
                self.stmt_here(body);
            }
            Stmt::Expr { expr, .. } => {
                self.expr(expr, 0);
                self.write(";");
            }
            Stmt::Return { arg, .. } => {
                self.write("return");
                if let Some(arg) = arg {
                    self.write(" ");
                    self.expr(arg, 0);
                }
                self.write(";");
            }
            Stmt::VarDecl { kind, decls, .. } => {
                self.write(kind.as_str());
                self.write(" ");
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&decl.name.name);
                    if let Some(init) = &decl.init {
                        self.write(" = ");
                        self.expr(init, ARG_PREC);
                    }
                }
                self.write(";");
            }
            Stmt::FunctionDecl { func, .. } => self.function(func),
            Stmt::If { cond, then, else_, .. } => {
                self.write("if (");
                self.expr(cond, 0);
                self.write(") ");
                self.block(then);
                if let Some(else_) = else_ {
                    self.write(" else ");
                    self.block(else_);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.write("while (");
                self.expr(cond, 0);
                self.write(") ");
                self.block(body);
            }
            Stmt::Block(block) => self.block(block),
        }
    }

    /// `{`, the statements on their own indented lines, `}` at the current
    /// indent; the cursor stays after the `}`
    fn block(&mut self, block: &Block) {
        self.write("{");
        self.newline();
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn function(&mut self, func: &Function) {
        self.write("function");
        if let Some(name) = &func.name {
            self.write(" ");
            self.write(&name.name);
        }
        self.write("(");
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&param.name);
        }
        self.write(") ");
        self.block(&func.body);
    }
    // endregion

    // region expressions
    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let parens = precedence(expr) < min_prec;
        if parens {
            self.write("(");
        }
        self.map_node(expr.span());
        match expr {
            Expr::Ident(ident) => self.write(&ident.name),
            Expr::Lit { lit, .. } => match lit {
                Lit::Str(value) => self.write(&enquote::enquote('"', value)),
                Lit::Num(raw) => self.write(raw),
                Lit::Bool(true) => self.write("true"),
                Lit::Bool(false) => self.write("false"),
                Lit::Null => self.write("null"),
            },
            Expr::Array { elems, .. } => {
                self.write("[");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(elem, ARG_PREC);
                }
                self.write("]");
            }
            Expr::Member { object, property, .. } => {
                self.expr(object, CALLEE_PREC);
                self.write(".");
                self.write(&property.name);
            }
            Expr::Call { callee, args, .. } => {
                self.expr(callee, CALLEE_PREC);
                self.write("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(arg, ARG_PREC);
                }
                self.write(")");
            }
            Expr::Assign { target, value, .. } => {
                self.expr(target, CALLEE_PREC);
                self.write(" = ");
                self.expr(value, ARG_PREC);
            }
            Expr::Unary { op, operand, .. } => {
                self.write(op.as_str());
                self.expr(operand, UNARY_PREC);
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                self.expr(lhs, op.precedence());
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.expr(rhs, op.precedence() + 1);
            }
            Expr::Arrow { params, body, .. } => {
                self.write("(");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&param.name);
                }
                self.write(") => ");
                self.block(body);
            }
            Expr::Function { func, .. } => self.function(func),
            Expr::Jsx { elem, .. } => self.jsx(elem),
        }
        if parens {
            self.write(")");
        }
    }

    fn jsx(&mut self, elem: &JsxElement) {
        self.write("<");
        self.write(&elem.tag.name);
        for attr in &elem.attrs {
            self.write(" ");
            self.write(&attr.name.name);
            match &attr.value {
                None => {}
                Some(JsxAttrValue::Str(value, _)) => {
                    self.write("=");
                    self.write(&enquote::enquote('"', value));
                }
                Some(JsxAttrValue::Expr(expr)) => {
                    self.write("={");
                    self.expr(expr, 0);
                    self.write("}");
                }
            }
        }
        if elem.children.is_empty() {
            self.write("/>");
            return;
        }
        self.write(">");
        for child in &elem.children {
            match child {
                JsxChild::Element(child) => self.jsx(child),
                JsxChild::Expr(expr) => {
                    self.write("{");
                    self.expr(expr, 0);
                    self.write("}");
                }
            }
        }
        self.write("</");
        self.write(&elem.tag.name);
        self.write(">");
    }
    // endregion
}

#[cfg(test)]
mod tests {
    use crate::syntax::{parse, Dialect};

    use super::*;

    fn roundtrip(source: &str) -> String {
        let program = parse(source, Dialect::Plain).unwrap();
        emit(&program, "test.djs").code
    }

    #[test]
    fn emits_plain_statements() {
        let source = "a();\nlet x = 1, y;\nconsole.log(x, \"hi\");\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn emits_control_flow() {
        let source = "if (a < 2) {\n  b();\n} else {\n  c();\n}\nwhile (!done) {\n  step();\n}\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn emits_functions_and_arrows() {
        let source = "function go(a, b) {\n  each(a, (x) => {\n    use(x, b);\n  });\n}\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn preserves_labels() {
        let source = "defer: x = F();\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn parenthesizes_by_precedence() {
        assert_eq!(roundtrip("f((a + b) * c);"), "f((a + b) * c);\n");
        assert_eq!(roundtrip("f(a + b * c);"), "f(a + b * c);\n");
    }

    #[test]
    fn emits_bracket_elements() {
        let source = "render(<panel title=\"hi\" width={12}><row>{body}</row><sep/></panel>);\n";
        let program = parse(source, Dialect::Jsx).unwrap();
        assert_eq!(emit(&program, "test.djsx").code, source);
    }

    #[test]
    fn maps_statements_to_original_positions() {
        let program = parse("a();\nb();\n", Dialect::Plain).unwrap();
        let output = emit(&program, "test.djs");
        let b = output
            .map
            .mappings
            .iter()
            .find(|m| m.generated.line == 2 && m.generated.column == 0)
            .expect("statement on line 2 should be mapped");
        assert_eq!(b.original.line, 2);
        assert_eq!(b.original.column, 0);
    }
}
