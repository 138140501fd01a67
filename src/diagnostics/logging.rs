use std::path::Path;

use super::{FileDiagnostic, FileDiagnostics, GlobalDiagnostic, ProjectDiagnostics};

/// Allows you to log project (global or file) diagnostics.
///
/// Methods which can log project diagnostics take this as a parameter named
/// `e`. They should not take [ProjectDiagnostics] in order to separate
/// logging from printing.
#[derive(Debug, Clone, Copy)]
pub struct ProjectLogger<'a>(&'a ProjectDiagnostics);

/// Allows you to log file diagnostics. The defer rewrite takes this as an
/// injected collector so it can be tested without capturing process output.
#[derive(Debug, Clone, Copy)]
pub struct FileLogger<'a>(&'a FileDiagnostics);

impl<'a> ProjectLogger<'a> {
    pub fn new(diagnostics: &'a ProjectDiagnostics) -> Self {
        Self(diagnostics)
    }

    pub fn file(&self, path: impl AsRef<Path>) -> FileLogger<'a> {
        FileLogger(self.0.file(path))
    }

    pub fn log(&self, diagnostic: GlobalDiagnostic) {
        self.0.insert_global(diagnostic)
    }
}

impl<'a> FileLogger<'a> {
    pub fn new(diagnostics: &'a FileDiagnostics) -> Self {
        Self(diagnostics)
    }

    pub fn log(&self, diagnostic: FileDiagnostic) {
        self.0.insert(diagnostic)
    }
}

#[macro_export]
macro_rules! log_diag {
    ($e:expr, $level:expr, $format:literal $(, $arg:expr)* $(,)? => $loc:expr $(;
         $additional_info:expr)* $(;)?) => {
        $e.log($crate::diagnostics::FileDiagnostic {
            level: $level,
            message: format!($format $(, $arg)*),
            location: $loc,
            additional_info: $crate::misc::chain![
                $($additional_info),*
            ].collect::<::smallvec::SmallVec<_>>(),
        })
    };
    ($e:expr, $level:expr, $format:literal $(, $arg:expr)* $(,)? $(;
         $additional_info:expr)* $(;)?) => {
        $e.log($crate::diagnostics::GlobalDiagnostic {
            level: $level,
            message: format!($format $(, $arg)*),
            additional_info: $crate::misc::chain![
                $($additional_info),*
            ].collect::<::smallvec::SmallVec<_>>(),
        })
    };
}

#[macro_export]
macro_rules! error {
    ($e:expr, $( $arg:tt )*) => {
        $crate::log_diag!($e, $crate::diagnostics::DiagnosticLevel::Error, $( $arg )*)
    };
}

#[macro_export]
macro_rules! warning {
    ($e:expr, $( $arg:tt )*) => {
        $crate::log_diag!($e, $crate::diagnostics::DiagnosticLevel::Warning, $( $arg )*)
    };
}

#[macro_export]
macro_rules! info {
    ($e:expr, $( $arg:tt )*) => {
        $crate::log_diag!($e, $crate::diagnostics::DiagnosticLevel::Info, $( $arg )*)
    };
}

#[macro_export]
macro_rules! debug {
    ($e:expr, $( $arg:tt )*) => {
        $crate::log_diag!($e, $crate::diagnostics::DiagnosticLevel::Debug, $( $arg )*)
    };
}

#[macro_export]
macro_rules! additional_info {
    ($type_:expr, $format:literal $(, $arg:expr)* $(,)? => $loc:expr) => {{
        let loc = $loc;
        ::std::iter::once($crate::diagnostics::AdditionalInfo {
            type_: $type_,
            message: format!($format $(, $arg)*),
            location: Some(loc),
        })
    }};
    ($type_:expr, $format:literal $(, $arg:expr)* $(,)?) => {
        ::std::iter::once($crate::diagnostics::AdditionalInfo {
            type_: $type_,
            message: format!($format $(, $arg)*),
            location: None,
        })
    };
}

#[macro_export]
macro_rules! issue {
    ($($arg:tt)*) => {
        $crate::additional_info!($crate::diagnostics::AdditionalInfoType::Issue, $($arg)*)
    };
}

#[macro_export]
macro_rules! hint {
    ($($arg:tt)*) => {
        $crate::additional_info!($crate::diagnostics::AdditionalInfoType::Hint, $($arg)*)
    };
}

#[macro_export]
macro_rules! note {
    ($($arg:tt)*) => {
        $crate::additional_info!($crate::diagnostics::AdditionalInfoType::Note, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::ast::{Pos, Span};
    use crate::diagnostics::{DiagnosticLevel, FileDiagnostics, ProjectDiagnostics};

    use super::*;

    fn span(line: u32) -> Span {
        Span { start: Pos { line, column: 0 }, end: Pos { line, column: 1 } }
    }

    #[test]
    fn file_logger_records_located_diagnostics() {
        let diagnostics = FileDiagnostics::new(PathBuf::from("a.djs"), false);
        let e = FileLogger::new(&diagnostics);
        warning!(e, "invalid deferred-binding structure" => span(3));
        error!(e, "invalid syntax: {}", "oops" => span(5); issue!("let = 3;"));
        assert_eq!(diagnostics.count_warnings(), 1);
        assert_eq!(diagnostics.count_errors(), 1);
        let rendered = diagnostics.to_string();
        assert!(rendered.contains("a.djs:3: invalid deferred-binding structure"));
        assert!(rendered.contains("a.djs:5: invalid syntax: oops"));
        assert!(rendered.contains("issue: let = 3;"));
    }

    #[test]
    fn duplicate_diagnostics_collapse() {
        let diagnostics = FileDiagnostics::new(PathBuf::from("a.djs"), false);
        let e = FileLogger::new(&diagnostics);
        warning!(e, "invalid deferred-binding structure" => span(3));
        warning!(e, "invalid deferred-binding structure" => span(3));
        warning!(e, "something else" => span(3));
        assert_eq!(diagnostics.count_warnings(), 2);
    }

    #[test]
    fn project_logger_counts_globals() {
        let diagnostics = ProjectDiagnostics::new(false);
        let e = ProjectLogger::new(&diagnostics);
        error!(e, "failed to read '{}'", "missing.djs");
        warning!(e.file("b.djs"), "invalid deferred-binding structure" => span(1));
        let output = diagnostics.into_output();
        assert_eq!(output.num_errors, 1);
        assert_eq!(output.num_warnings, 1);
    }
}
