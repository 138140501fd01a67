//! The defer rewrite: desugars runs of `defer:`-labeled bindings into
//! right-nested continuation-passing calls. [transform] drives the per-block
//! rewrite over every block-like scope in a parsed tree, depth first; the
//! rewrite itself is split into scanning/validation ([scan]), folding
//! ([nest]) and splicing ([rewrite]).

use join_lazy_fmt::Join;

use crate::analyses::scopes::declared_names;
use crate::ast::{Block, Expr, JsxAttrValue, JsxChild, JsxElement, Program, Stmt};
use crate::debug;
use crate::diagnostics::FileLogger;

mod nest;
mod rewrite;
mod scan;

pub use nest::WrapKind;
pub use scan::{DeferBinding, DEFER_LABEL};

/// Whether a block's enclosing scope is the top-level program scope or a
/// function body. Continuation bodies are function scopes: they're arrow
/// functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    Function,
}

/// Rewrite every defer sequence in the tree, in place. Recoverable problems
/// (malformed runs) go to `e`; this never fails.
pub fn transform(program: &mut Program, e: &FileLogger<'_>) {
    visit_block(&mut program.body, ScopeKind::TopLevel, e);
}

/// Rewrite this block, then its children. Children are visited after the
/// rewrite so freshly built continuation bodies get visited too: that's
/// where a second defer run in the same original block ends up.
fn visit_block(block: &mut Block, scope: ScopeKind, e: &FileLogger<'_>) {
    let changed = rewrite::rewrite_block(block, scope, e);
    for stmt in &mut block.stmts {
        visit_stmt(stmt, scope, e);
    }
    if changed {
        let names = declared_names(block);
        debug!(
            e,
            "refreshed bindings after rewrite: [{}]",
            ", ".join(names.iter().map(|name| name.as_str()))
            => block.span
        );
    }
}

fn visit_stmt(stmt: &mut Stmt, scope: ScopeKind, e: &FileLogger<'_>) {
    match stmt {
        Stmt::Labeled { body, .. } => visit_stmt(body, scope, e),
        Stmt::Expr { expr, .. } => visit_expr(expr, e),
        Stmt::Return { arg, .. } => {
            if let Some(arg) = arg {
                visit_expr(arg, e);
            }
        }
        Stmt::VarDecl { decls, .. } => {
            for decl in decls {
                if let Some(init) = &mut decl.init {
                    visit_expr(init, e);
                }
            }
        }
        Stmt::FunctionDecl { func, .. } => visit_block(&mut func.body, ScopeKind::Function, e),
        Stmt::If { cond, then, else_, .. } => {
            visit_expr(cond, e);
            visit_block(then, scope, e);
            if let Some(else_) = else_ {
                visit_block(else_, scope, e);
            }
        }
        Stmt::While { cond, body, .. } => {
            visit_expr(cond, e);
            visit_block(body, scope, e);
        }
        Stmt::Block(block) => visit_block(block, scope, e),
    }
}

fn visit_expr(expr: &mut Expr, e: &FileLogger<'_>) {
    match expr {
        Expr::Ident(_) | Expr::Lit { .. } => {}
        Expr::Array { elems, .. } => {
            for elem in elems {
                visit_expr(elem, e);
            }
        }
        Expr::Member { object, .. } => visit_expr(object, e),
        Expr::Call { callee, args, .. } => {
            visit_expr(callee, e);
            for arg in args {
                visit_expr(arg, e);
            }
        }
        Expr::Assign { target, value, .. } => {
            visit_expr(target, e);
            visit_expr(value, e);
        }
        Expr::Unary { operand, .. } => visit_expr(operand, e),
        Expr::Binary { lhs, rhs, .. } => {
            visit_expr(lhs, e);
            visit_expr(rhs, e);
        }
        Expr::Arrow { body, .. } => visit_block(body, ScopeKind::Function, e),
        Expr::Function { func, .. } => visit_block(&mut func.body, ScopeKind::Function, e),
        Expr::Jsx { elem, .. } => visit_jsx(elem, e),
    }
}

fn visit_jsx(elem: &mut JsxElement, e: &FileLogger<'_>) {
    for attr in &mut elem.attrs {
        if let Some(JsxAttrValue::Expr(expr)) = &mut attr.value {
            visit_expr(expr, e);
        }
    }
    for child in &mut elem.children {
        match child {
            JsxChild::Element(child) => visit_jsx(child, e),
            JsxChild::Expr(expr) => visit_expr(expr, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use test_log::test;

    use crate::diagnostics::FileDiagnostics;
    use crate::emit::emit;
    use crate::syntax::{parse, Dialect};

    use super::*;

    fn rewrite_dialect(source: &str, dialect: Dialect) -> String {
        let mut program = parse(source, dialect).unwrap();
        let diagnostics = FileDiagnostics::new(PathBuf::from("test"), false);
        let e = FileLogger::new(&diagnostics);
        transform(&mut program, &e);
        emit(&program, "test").code
    }

    #[test]
    fn visits_blocks_depth_first() {
        let code = rewrite_dialect(
            "if (ready) {\n  defer: x = F();\n  use(x);\n} else {\n  while (waiting) {\n    defer: y = G();\n    use(y);\n  }\n}",
            Dialect::Plain,
        );
        assert_eq!(
            code,
            "if (ready) {\n  F((x) => {\n    use(x);\n  });\n} else {\n  while (waiting) {\n    G((y) => {\n      use(y);\n    });\n  }\n}\n"
        );
    }

    #[test]
    fn if_and_while_bodies_inherit_the_enclosing_scope() {
        // Top-level if body: a trailing return doesn't wrap
        let top = rewrite_dialect("if (a) {\n  defer: x = F();\n  return x;\n}", Dialect::Plain);
        assert_eq!(top, "if (a) {\n  F((x) => {\n    return x;\n  });\n}\n");
        // The same block inside a function: it wraps
        let nested = rewrite_dialect(
            "function go(a) {\n  if (a) {\n    defer: x = F();\n    return x;\n  }\n}",
            Dialect::Plain,
        );
        assert_eq!(
            nested,
            "function go(a) {\n  if (a) {\n    return F((x) => {\n      return x;\n    });\n  }\n}\n"
        );
    }

    #[test]
    fn rewrites_inside_bracket_expression_children() {
        let code = rewrite_dialect(
            "render(<panel on={() => {\n  defer: x = F();\n  use(x);\n}}/>);",
            Dialect::Jsx,
        );
        assert_eq!(
            code,
            "render(<panel on={() => {\n  F((x) => {\n    use(x);\n  });\n}}/>);\n"
        );
    }
}
