use crate::ast::{Expr, Ident, Span, Stmt};
use crate::diagnostics::FileLogger;
use crate::warning;

/// The reserved marker label. A statement labeled with it must be exactly
/// `defer: target = callee(args...);`.
pub const DEFER_LABEL: &str = "defer";

/// One validated deferred binding, pulled out of its labeled statement.
/// `target` becomes the continuation parameter; `callee` and `args` are the
/// original nodes, reused in the rebuilt call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferBinding {
    pub target: Ident,
    pub callee: Expr,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Result of scanning a candidate run starting at a marker statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ScanOutcome {
    /// `len` contiguous, validated deferred bindings start at the scan index
    Run { len: usize },
    /// Some statement in the run has the wrong shape; the whole run is
    /// discarded (a diagnostic was already recorded against the offender)
    Invalid,
}

/// Does this statement carry the reserved marker label?
pub(super) fn is_defer_marker(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Labeled { label, .. } if label.name.as_str() == DEFER_LABEL)
}

/// Is this marker statement's body exactly `identifier = call(...)`?
fn has_binding_shape(stmt: &Stmt) -> bool {
    let Stmt::Labeled { body, .. } = stmt else {
        return false;
    };
    let Stmt::Expr { expr: Expr::Assign { target, value, .. }, .. } = &**body else {
        return false;
    };
    matches!(&**target, Expr::Ident(_)) && matches!(&**value, Expr::Call { .. })
}

/// Collect the maximal contiguous run of marker statements starting at
/// `start` (which must point at one) and validate every statement in it.
/// A shape failure anywhere discards the entire run: the offender gets a
/// warning naming its location and the statements are left untouched.
pub(super) fn scan_run(stmts: &[Stmt], start: usize, e: &FileLogger<'_>) -> ScanOutcome {
    debug_assert!(is_defer_marker(&stmts[start]), "scan_run must start at a marker");
    let mut len = 0;
    for stmt in &stmts[start..] {
        if !is_defer_marker(stmt) {
            break;
        }
        if !has_binding_shape(stmt) {
            warning!(e, "invalid deferred-binding structure" => stmt.span());
            return ScanOutcome::Invalid;
        }
        len += 1;
    }
    ScanOutcome::Run { len }
}

/// Destructure a validated marker statement into its binding. Only call on
/// statements a [scan_run] pass accepted.
pub(super) fn into_binding(stmt: Stmt) -> DeferBinding {
    let span = stmt.span();
    match stmt {
        Stmt::Labeled { body, .. } => match *body {
            Stmt::Expr { expr: Expr::Assign { target, value, .. }, .. } => {
                match (*target, *value) {
                    (Expr::Ident(target), Expr::Call { callee, args, .. }) => DeferBinding {
                        target,
                        callee: *callee,
                        args,
                        span,
                    },
                    _ => unreachable!("defer-binding shape was validated by scan_run"),
                }
            }
            _ => unreachable!("defer-binding shape was validated by scan_run"),
        },
        _ => unreachable!("defer-binding shape was validated by scan_run"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::diagnostics::FileDiagnostics;
    use crate::syntax::{parse, Dialect};

    use super::*;

    fn scan(source: &str, start: usize) -> (ScanOutcome, usize) {
        let program = parse(source, Dialect::Plain).unwrap();
        let diagnostics = FileDiagnostics::new(PathBuf::from("test.djs"), false);
        let e = FileLogger::new(&diagnostics);
        let outcome = scan_run(&program.body.stmts, start, &e);
        (outcome, diagnostics.count_warnings())
    }

    #[test]
    fn collects_maximal_contiguous_run() {
        let (outcome, warnings) =
            scan("defer: x = F();\ndefer: y = G();\nlog(x, y);\ndefer: z = H();", 0);
        assert_eq!(outcome, ScanOutcome::Run { len: 2 });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn run_of_one_is_valid() {
        let (outcome, warnings) = scan("defer: x = F();", 0);
        assert_eq!(outcome, ScanOutcome::Run { len: 1 });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn non_call_right_side_invalidates_run() {
        let (outcome, warnings) = scan("defer: x = notACall;", 0);
        assert_eq!(outcome, ScanOutcome::Invalid);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn failure_in_tail_discards_whole_run() {
        let (outcome, warnings) = scan("defer: x = F();\ndefer: y;", 0);
        assert_eq!(outcome, ScanOutcome::Invalid);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn non_identifier_target_invalidates_run() {
        let (outcome, warnings) = scan("defer: obj.x = F();", 0);
        assert_eq!(outcome, ScanOutcome::Invalid);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn destructures_validated_binding() {
        let program = parse("defer: x = F(a, b);", Dialect::Plain).unwrap();
        let stmt = program.body.stmts.into_iter().next().unwrap();
        let binding = into_binding(stmt);
        assert_eq!(binding.target.name.as_str(), "x");
        assert_eq!(binding.args.len(), 2);
        assert!(matches!(binding.callee, Expr::Ident(ident) if ident.name.as_str() == "F"));
    }
}
