//! The per-file pipeline: parse, rewrite, serialize. This is the whole
//! compile for one source unit; everything stateful (file selection, output
//! paths, diagnostics printing) lives in [crate::compiler].

use crate::diagnostics::{FileDiagnostics, FileLogger};
use crate::emit::{emit, EmitOutput};
use crate::syntax::{parse, Dialect, ParseError};
use crate::transform::transform;

/// Compile one source unit: parse it with `dialect`, rewrite defer sequences
/// in place, and serialize the result. `file` names the source in the
/// position-mapping artifact.
///
/// Malformed defer runs are recoverable: they're recorded on `diagnostics`
/// and their statements stay as-is in the output (likely invalid for the
/// target runtime, which beats silently guessing at semantics). A parse
/// failure is fatal for the file.
pub fn compile_source(
    source: &str,
    dialect: Dialect,
    file: &str,
    diagnostics: &FileDiagnostics,
) -> Result<EmitOutput, ParseError> {
    let mut program = parse(source, dialect)?;
    let e = FileLogger::new(diagnostics);
    transform(&mut program, &e);
    Ok(emit(&program, file))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use test_log::test;

    use crate::diagnostics::FileDiagnostics;
    use crate::syntax::Dialect;

    use super::*;

    #[test]
    fn compiles_and_maps_a_unit() {
        let diagnostics = FileDiagnostics::new(PathBuf::from("unit.djs"), false);
        let output = compile_source(
            "defer: x = F();\nlog(x);",
            Dialect::Plain,
            "unit.djs",
            &diagnostics,
        )
        .unwrap();
        assert_eq!(output.code, "F((x) => {\n  log(x);\n});\n");
        assert_eq!(output.map.file, "unit.djs");
        // log(x) survives from the source, so it has a mapping entry
        assert!(output.map.mappings.iter().any(|m| m.original.line == 2));
        assert_eq!(diagnostics.count_errors(), 0);
    }

    #[test]
    fn parse_failure_is_fatal_for_the_file() {
        let diagnostics = FileDiagnostics::new(PathBuf::from("unit.djs"), false);
        let err = compile_source("let = 3;", Dialect::Plain, "unit.djs", &diagnostics)
            .unwrap_err();
        assert_eq!(err.pos.line, 1);
        assert_eq!(err.excerpt, "let = 3;");
    }
}
