use std::fmt::{self, Display, Formatter};

use crate::ast::{Block, Expr, Span, Stmt};

use super::scan::DeferBinding;
use super::ScopeKind;

/// How the outermost call gets spliced back into the block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapKind {
    /// `return F(...)` — the block originally ended in a return statement
    /// and the enclosing scope is a function
    ReturnWrap,
    /// `F(...);` as a bare expression statement
    ExpressionWrap,
}

impl Display for WrapKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WrapKind::ReturnWrap => write!(f, "return-wrap"),
            WrapKind::ExpressionWrap => write!(f, "expression-wrap"),
        }
    }
}

/// Decide the wrap from the block's original last statement. When the final
/// body is empty the last statement is the last deferred binding itself, so
/// `last` is `None` and the result is [WrapKind::ExpressionWrap].
///
/// Note that a triggering `return` is not removed: it stays as the last
/// statement of the innermost continuation, returning from that continuation.
/// The outer wrap only makes the replacement statement return the outermost
/// call's own result. Known limitation, kept for compatibility.
pub(super) fn decide(last: Option<&Stmt>, scope: ScopeKind) -> WrapKind {
    match (last, scope) {
        (Some(Stmt::Return { .. }), ScopeKind::Function) => WrapKind::ReturnWrap,
        _ => WrapKind::ExpressionWrap,
    }
}

/// Fold a validated run and its final body into the outermost call.
///
/// Right fold, innermost first: walking the run in reverse, each binding's
/// call gets a one-parameter arrow continuation appended whose body is
/// everything built so far. The call built last (for the first binding in
/// source order) is the outermost one, so source order becomes nesting depth
/// and execution order is unchanged — only control transfer changes, from
/// "next statement" to "continuation invoked by the callee".
///
/// Panics if `sequence` is empty; the scanner's guard makes that unreachable.
pub(super) fn nest(sequence: Vec<DeferBinding>, final_body: Vec<Stmt>) -> Expr {
    assert!(!sequence.is_empty(), "cannot nest an empty defer sequence");
    let mut body = Block::synthetic(final_body);
    for binding in sequence.into_iter().rev() {
        let DeferBinding { target, callee, mut args, .. } = binding;
        let continuation = Expr::Arrow {
            params: vec![target],
            body,
            span: Span::SYNTHETIC,
        };
        args.push(continuation);
        let call = Expr::Call {
            callee: Box::new(callee),
            args,
            span: Span::SYNTHETIC,
        };
        body = Block::synthetic(vec![Stmt::Expr { expr: call, span: Span::SYNTHETIC }]);
    }
    match body.stmts.pop() {
        Some(Stmt::Expr { expr, .. }) => expr,
        _ => unreachable!("the fold always leaves exactly one call statement"),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ident, Pos};
    use crate::syntax::{parse, Dialect};
    use crate::transform::scan::into_binding;

    use super::*;

    fn bindings_and_rest(source: &str, run_len: usize) -> (Vec<DeferBinding>, Vec<Stmt>) {
        let program = parse(source, Dialect::Plain).unwrap();
        let mut stmts = program.body.stmts;
        let rest = stmts.split_off(run_len);
        (stmts.into_iter().map(into_binding).collect(), rest)
    }

    #[test]
    fn outermost_call_is_first_binding() {
        let (sequence, rest) =
            bindings_and_rest("defer: x = F();\ndefer: y = G();\nlog(x, y);", 2);
        let outermost = nest(sequence, rest);
        let Expr::Call { callee, args, .. } = outermost else {
            panic!("expected a call");
        };
        assert!(matches!(*callee, Expr::Ident(ident) if ident.name.as_str() == "F"));
        // F's only original argument list was empty, so just the continuation
        assert_eq!(args.len(), 1);
        let Expr::Arrow { params, body, .. } = &args[0] else {
            panic!("expected a continuation");
        };
        assert_eq!(params[0].name.as_str(), "x");
        // The continuation body holds G's call; the final body is innermost
        let Stmt::Expr { expr: Expr::Call { callee, args, .. }, .. } = &body.stmts[0] else {
            panic!("expected nested call");
        };
        assert!(matches!(&**callee, Expr::Ident(ident) if ident.name.as_str() == "G"));
        let Expr::Arrow { body: inner, .. } = &args[0] else {
            panic!("expected inner continuation");
        };
        assert_eq!(inner.stmts.len(), 1);
    }

    #[test]
    fn original_arguments_stay_in_order() {
        let (sequence, rest) = bindings_and_rest("defer: x = F(a, b);\nlog(x);", 1);
        let Expr::Call { args, .. } = nest(sequence, rest) else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0], Expr::Ident(ident) if ident.name.as_str() == "a"));
        assert!(matches!(&args[1], Expr::Ident(ident) if ident.name.as_str() == "b"));
        assert!(matches!(&args[2], Expr::Arrow { .. }));
    }

    #[test]
    fn built_nodes_are_synthetic() {
        let (sequence, rest) = bindings_and_rest("defer: x = F();\nlog(x);", 1);
        let outermost = nest(sequence, rest);
        assert!(outermost.span().is_synthetic());
        let Expr::Call { args, .. } = &outermost else {
            panic!("expected a call");
        };
        // ...but the original final-body statements keep their spans
        let Expr::Arrow { body, .. } = &args[0] else {
            panic!("expected a continuation");
        };
        assert_eq!(body.stmts[0].span().start, Pos { line: 2, column: 0 });
    }

    #[test]
    fn return_in_function_scope_wraps() {
        let ret = Stmt::Return { arg: None, span: Span::SYNTHETIC };
        assert_eq!(decide(Some(&ret), ScopeKind::Function), WrapKind::ReturnWrap);
    }

    #[test]
    fn return_at_top_level_does_not_wrap() {
        let ret = Stmt::Return { arg: None, span: Span::SYNTHETIC };
        assert_eq!(decide(Some(&ret), ScopeKind::TopLevel), WrapKind::ExpressionWrap);
    }

    #[test]
    fn empty_final_body_does_not_wrap() {
        assert_eq!(decide(None, ScopeKind::Function), WrapKind::ExpressionWrap);
    }

    #[test]
    fn non_return_tail_does_not_wrap() {
        let expr = Stmt::Expr {
            expr: Expr::Ident(Ident::new("x", Span::SYNTHETIC)),
            span: Span::SYNTHETIC,
        };
        assert_eq!(decide(Some(&expr), ScopeKind::Function), WrapKind::ExpressionWrap);
    }

    #[test]
    #[should_panic(expected = "cannot nest an empty defer sequence")]
    fn empty_sequence_is_a_defect() {
        nest(Vec::new(), Vec::new());
    }
}
