use std::cell::RefCell;
use std::collections::BTreeMap;
use std::env::VarError;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use elsa::FrozenMap;
use lazy_static::lazy_static;
use nonempty::NonEmpty;
use smallvec::SmallVec;

use crate::ast::Span;
use crate::compiler::Output;

/// All diagnostics for a package: one [FileDiagnostics] per source file plus
/// diagnostics not tied to any file (io and traversal failures).
pub struct ProjectDiagnostics {
    /// If set, diagnostics are printed through [log] immediately after being
    /// recorded. Off in tests, which inspect the stored records instead.
    print_immediately: bool,
    global: RefCell<Vec<GlobalDiagnostic>>,
    files: FrozenMap<PathBuf, Box<FileDiagnostics>>,
}

// Manual impl because [FrozenMap] doesn't implement [Debug]
impl fmt::Debug for ProjectDiagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectDiagnostics")
            .field("print_immediately", &self.print_immediately)
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}

/// All diagnostics recorded against one source file, keyed by location so
/// iteration is in source order. Multiple diagnostics may share a location as
/// long as their messages differ; exact duplicates are dropped.
#[derive(Debug)]
pub struct FileDiagnostics {
    path: PathBuf,
    print_immediately: bool,
    diagnostics: RefCell<BTreeMap<Span, NonEmpty<FileDiagnostic>>>,
}

/// A diagnostic tied to a location in a file
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: Span,
    /// Ex: hints or root causes
    pub additional_info: SmallVec<[AdditionalInfo; 4]>,
}

/// A diagnostic not tied to a location (or even a file)
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDiagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub additional_info: SmallVec<[AdditionalInfo; 4]>,
}

/// Diagnostic level AKA error, warning, info, or debug
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// Must be fixed, fails the compile
    Error,
    /// Should be fixed but the compile still succeeds
    Warning,
    /// Doesn't have to be addressed, shown to the user
    Info,
    /// Only shown in debug mode
    Debug,
}

/// What kinds of diagnostics get printed. This isn't quite the level of the
/// diagnostics themselves but similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerLevel {
    DontLog,
    DoLog { level: DiagnosticLevel },
}

/// Additional info tied to a diagnostic, like hints or root causes
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalInfo {
    pub type_: AdditionalInfoType,
    pub message: String,
    pub location: Option<Span>,
}

/// Whether additional info is a cause, a suggestion, or other context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalInfoType {
    Issue,
    Hint,
    Note,
}

impl ProjectDiagnostics {
    pub fn new(print_immediately: bool) -> Self {
        Self {
            print_immediately,
            global: RefCell::new(Vec::new()),
            files: FrozenMap::new(),
        }
    }

    /// Get or create the diagnostics for one file. `path` should be the
    /// path surfaced to the user (relative to the source root).
    pub fn file(&self, path: impl AsRef<Path>) -> &FileDiagnostics {
        let path = path.as_ref();
        match self.files.get(path) {
            Some(file) => file,
            None => self.files.insert(
                path.to_path_buf(),
                Box::new(FileDiagnostics::new(path.to_path_buf(), self.print_immediately)),
            ),
        }
    }

    pub fn insert_global(&self, diagnostic: GlobalDiagnostic) {
        if self.print_immediately && RUST_LOG.logs(diagnostic.level) {
            diagnostic.log_to_rust();
        }
        self.global.borrow_mut().push(diagnostic);
    }

    /// Fold everything recorded so far into error/warning counts
    pub fn into_output(self) -> Output {
        let mut output = Output::new();
        for diagnostic in self.global.into_inner() {
            output.count(diagnostic.level);
        }
        for (_, file) in self.files.into_map() {
            for diagnostic in file.diagnostics.into_inner().into_values() {
                for diagnostic in diagnostic {
                    output.count(diagnostic.level);
                }
            }
        }
        output
    }
}

impl FileDiagnostics {
    pub fn new(path: PathBuf, print_immediately: bool) -> Self {
        Self {
            path,
            print_immediately,
            diagnostics: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the given diagnostic. An exact duplicate (same location and
    /// message) is dropped so restart-based rescans don't multiply reports.
    pub fn insert(&self, diagnostic: FileDiagnostic) {
        let do_print = |diagnostic: &FileDiagnostic| {
            if self.print_immediately && RUST_LOG.logs(diagnostic.level) {
                diagnostic.log_to_rust(&self.path);
            }
        };

        let mut diagnostics = self.diagnostics.borrow_mut();
        match diagnostics.entry(diagnostic.location) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                do_print(&diagnostic);
                entry.insert(NonEmpty::new(diagnostic));
            }
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                let diagnostics = entry.get_mut();
                if diagnostics.iter().any(|d| d.message == diagnostic.message) {
                    log::debug!("Redundant diagnostic:\n  {}", diagnostic.message);
                } else {
                    do_print(&diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    /// Count how many diagnostics of a certain level were recorded
    pub fn count_level(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics
            .borrow()
            .values()
            .map(|diagnostics| diagnostics.iter().filter(|d| d.level == level).count())
            .sum()
    }

    pub fn count_errors(&self) -> usize {
        self.count_level(DiagnosticLevel::Error)
    }

    pub fn count_warnings(&self) -> usize {
        self.count_level(DiagnosticLevel::Warning)
    }
}

impl FileDiagnostic {
    pub fn from_global(diagnostic: GlobalDiagnostic, location: Span) -> Self {
        Self {
            level: diagnostic.level,
            message: diagnostic.message,
            location,
            additional_info: diagnostic.additional_info,
        }
    }

    pub fn add_info(&mut self, info: impl Iterator<Item = AdditionalInfo>) {
        self.additional_info.extend(info);
    }

    /// Print the diagnostic using the [log] crate
    pub fn log_to_rust(&self, path: &Path) {
        log::log!(
            self.level.rust_log_level(),
            "{}",
            DisplayFileDiagnostic { path, diagnostic: self }
        );
    }
}

impl GlobalDiagnostic {
    pub fn log_to_rust(&self) {
        log::log!(self.level.rust_log_level(), "{}", DisplayMessageAndInfo(&self.message, &self.additional_info));
    }
}

impl DiagnosticLevel {
    pub fn rust_log_level(&self) -> log::Level {
        match self {
            DiagnosticLevel::Error => log::Level::Error,
            DiagnosticLevel::Warning => log::Level::Warn,
            DiagnosticLevel::Info => log::Level::Info,
            DiagnosticLevel::Debug => log::Level::Debug,
        }
    }
}

impl Display for DiagnosticLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Debug => write!(f, "debug"),
        }
    }
}

lazy_static! {
    pub static ref RUST_LOG: LoggerLevel = LoggerLevel::get_rust_log();
}

impl LoggerLevel {
    pub fn logs(&self, level: DiagnosticLevel) -> bool {
        match self {
            LoggerLevel::DontLog => false,
            LoggerLevel::DoLog { level: log_level } => *log_level >= level,
        }
    }

    fn get_rust_log() -> LoggerLevel {
        match std::env::var("RUST_LOG") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "off" | "none" | "0" => LoggerLevel::DontLog,
                "error" | "1" => LoggerLevel::DoLog { level: DiagnosticLevel::Error },
                "warn" | "2" => LoggerLevel::DoLog { level: DiagnosticLevel::Warning },
                "info" | "3" => LoggerLevel::DoLog { level: DiagnosticLevel::Info },
                "debug" | "trace" | "4" => LoggerLevel::DoLog { level: DiagnosticLevel::Debug },
                _ => {
                    log::error!("Invalid RUST_LOG value: {}", value);
                    LoggerLevel::default()
                }
            },
            Err(VarError::NotPresent) => LoggerLevel::default(),
            Err(VarError::NotUnicode(value)) => {
                log::error!("Invalid RUST_LOG value: not unicode ({})", value.to_string_lossy());
                LoggerLevel::default()
            }
        }
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        LoggerLevel::DoLog { level: DiagnosticLevel::Info }
    }
}

// region display
struct DisplayFileDiagnostic<'a> {
    path: &'a Path,
    diagnostic: &'a FileDiagnostic,
}

struct DisplayMessageAndInfo<'a>(&'a str, &'a SmallVec<[AdditionalInfo; 4]>);

impl Display for FileDiagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for diagnostics in self.diagnostics.borrow().values() {
            for diagnostic in diagnostics {
                writeln!(
                    f,
                    "{}: {}",
                    diagnostic.level,
                    DisplayFileDiagnostic { path: &self.path, diagnostic }
                )?;
            }
        }
        Ok(())
    }
}

impl<'a> Display for DisplayFileDiagnostic<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.diagnostic.location.is_synthetic() {
            write!(f, "{}: ", self.path.display())?;
        } else {
            write!(f, "{}:{}: ", self.path.display(), self.diagnostic.location.start.line)?;
        }
        write!(
            f,
            "{}",
            DisplayMessageAndInfo(&self.diagnostic.message, &self.diagnostic.additional_info)
        )
    }
}

impl<'a> Display for DisplayMessageAndInfo<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        for info in self.1 {
            write!(f, "\n  {}", info)?;
        }
        Ok(())
    }
}

impl Display for AdditionalInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_)?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Display for AdditionalInfoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AdditionalInfoType::Issue => write!(f, "issue"),
            AdditionalInfoType::Hint => write!(f, "hint"),
            AdditionalInfoType::Note => write!(f, "note"),
        }
    }
}
// endregion
