use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

/// A position in the original source. Lines are 1-based so that line 0 can mark
/// synthesized nodes; columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

/// Source range of a node. Nodes built by the rewrite carry [Span::SYNTHETIC]
/// and are skipped when recording position-mapping entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const SYNTHETIC: Span = Span {
        start: Pos { line: 0, column: 0 },
        end: Pos { line: 0, column: 0 },
    };

    pub fn is_synthetic(&self) -> bool {
        self.start.line == 0
    }

    /// Range from the start of `self` to the end of `other`
    pub fn to(self, other: Span) -> Span {
        Span { start: self.start, end: other.end }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// An identifier with its source range
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: SmolStr,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<SmolStr>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

/// One parsed source unit. The body is a [Block] so the rewrite sees the
/// top-level statement list through the same interface as any nested block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Block,
}

/// An ordered, mutable statement list. This is the unit the defer rewrite
/// operates on: it splices statements out of `stmts` and splices one back in.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }

    /// A block created by the rewrite, with no corresponding source range
    pub fn synthetic(stmts: Vec<Stmt>) -> Self {
        Self { stmts, span: Span::SYNTHETIC }
    }
}

/// `var` / `let` / `const`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

/// One `name = init` (or bare `name`) inside a variable declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

/// A function declaration or function expression's shared innards
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
}

/// The closed set of statement kinds the compiler distinguishes. The defer
/// rewrite only inspects [Stmt::Labeled], [Stmt::Expr] and [Stmt::Return];
/// everything else passes through untouched (but is still traversed for
/// nested blocks).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Labeled { label: Ident, body: Box<Stmt>, span: Span },
    Expr { expr: Expr, span: Span },
    Return { arg: Option<Expr>, span: Span },
    VarDecl { kind: DeclKind, decls: Vec<Declarator>, span: Span },
    FunctionDecl { func: Function, span: Span },
    If { cond: Expr, then: Block, else_: Option<Block>, span: Span },
    While { cond: Expr, body: Block, span: Span },
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Labeled { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::FunctionDecl { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. } => *span,
            Stmt::Block(block) => block.span,
        }
    }
}

/// Literal values. Strings are stored unquoted; numbers keep their raw
/// spelling so emission doesn't reformat them.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(SmolStr),
    Num(SmolStr),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::EqEqEq => "===",
            BinaryOp::NotEqEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding strength, used both for precedence climbing in the parser and
    /// for parenthesization in the emitter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 3,
            BinaryOp::And => 4,
            BinaryOp::EqEq | BinaryOp::NotEq | BinaryOp::EqEqEq | BinaryOp::NotEqEq => 5,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 6,
            BinaryOp::Add | BinaryOp::Sub => 7,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 8,
        }
    }
}

/// The closed set of expression kinds. The defer rewrite only inspects
/// [Expr::Assign], [Expr::Ident] and [Expr::Call]; it builds [Expr::Arrow]
/// continuations.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Lit { lit: Lit, span: Span },
    Array { elems: Vec<Expr>, span: Span },
    Member { object: Box<Expr>, property: Ident, span: Span },
    Call { callee: Box<Expr>, args: Vec<Expr>, span: Span },
    Assign { target: Box<Expr>, value: Box<Expr>, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, span: Span },
    Arrow { params: Vec<Ident>, body: Block, span: Span },
    Function { func: Function, span: Span },
    Jsx { elem: JsxElement, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::Lit { span, .. }
            | Expr::Array { span, .. }
            | Expr::Member { span, .. }
            | Expr::Call { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Arrow { span, .. }
            | Expr::Function { span, .. }
            | Expr::Jsx { span, .. } => *span,
        }
    }
}

/// Element from the bracket-syntax extension (`.djsx` files). Children are
/// nested elements or braced expressions; there are no bare-text children.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub tag: Ident,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttr {
    pub name: Ident,
    pub value: Option<JsxAttrValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    Str(SmolStr, Span),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Element(JsxElement),
    Expr(Expr),
}
