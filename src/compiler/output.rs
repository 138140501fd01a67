use std::ops::Add;
use std::process::exit;

use thiserror::Error;

use crate::diagnostics::DiagnosticLevel;

/// Accumulated result of compiling one or more packages
#[derive(Debug, Default)]
pub struct Output {
    pub num_warnings: usize,
    pub num_errors: usize,
}

/// Errors which abort a package's compile before any file is processed
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("Directory must be package root AKA have at least one of src/, bin/, or tests/")]
    InvalidPackageRoot,
    #[error("When {action}: {source}")]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one diagnostic. Infos and debugs don't affect the exit code.
    pub fn count(&mut self, level: DiagnosticLevel) {
        match level {
            DiagnosticLevel::Error => self.num_errors += 1,
            DiagnosticLevel::Warning => self.num_warnings += 1,
            DiagnosticLevel::Info | DiagnosticLevel::Debug => {}
        }
    }

    /// Print and return the exit code
    pub fn report(self) -> i32 {
        let Output { num_warnings, num_errors } = self;
        if num_errors > 0 {
            if num_warnings > 0 {
                eprintln!("Failed with {} errors, {} warnings", num_errors, num_warnings);
            } else {
                eprintln!("Failed with {} errors", num_errors);
            }
            1
        } else if num_warnings > 0 {
            eprintln!("Succeeded but with {} warnings", num_warnings);
            0
        } else {
            eprintln!("Succeeded");
            0
        }
    }
}

impl Add for Output {
    type Output = Output;

    fn add(self, rhs: Self) -> Self::Output {
        Output {
            num_warnings: self.num_warnings + rhs.num_warnings,
            num_errors: self.num_errors + rhs.num_errors,
        }
    }
}

impl FatalError {
    /// Print and exit; for top-level use where there's nothing to clean up
    pub fn exit(self) -> ! {
        eprintln!("{}", self);
        exit(2)
    }
}
