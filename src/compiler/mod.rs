use std::collections::BTreeMap;
use std::fs::{copy, create_dir, create_dir_all, read_to_string, remove_dir_all, write};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::exit;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use lazy_static::lazy_static;
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::compile::compile_source;
use crate::diagnostics::{FileLogger, ProjectDiagnostics, ProjectLogger};
use crate::syntax::{Dialect, EXTENSIONS};
use crate::{error, issue};

mod output;

pub use output::{FatalError, Output};

/// Compiles a set of packages, each fully independently
pub struct Compiler {
    packages: BTreeMap<PathBuf, PackageCompiler>,
}

struct PackageCompiler {
    path: PathBuf,
}

const SRC_DIR_NAMES: [&str; 3] = ["src", "bin", "tests"];
const OUT_DIR_NAME: &str = "out";
const VENDOR_DIR_NAME: &str = "node_modules";
const OUT_EXTENSION: &str = "js";
const MAP_EXTENSION: &str = "js.map.json";

lazy_static! {
    /// Matches relative paths of compilable sources. Anything else under a
    /// source dir is copied to `out/` verbatim.
    static ref ELIGIBLE: GlobSet = {
        let mut builder = GlobSetBuilder::new();
        for extension in EXTENSIONS {
            let glob = GlobBuilder::new(&format!("**/*.{}", extension))
                .literal_separator(false)
                .build()
                .expect("eligible-source glob is well-formed");
            builder.add(glob);
        }
        builder.build().expect("eligible-source glob set is well-formed")
    };
}

impl Compiler {
    pub fn run(package_paths: impl IntoIterator<Item = PathBuf>) -> ! {
        exit(Self::try_new(package_paths).unwrap_or_else(|err| err.exit()).run_batch())
    }

    pub fn try_new(package_paths: impl IntoIterator<Item = PathBuf>) -> Result<Self, FatalError> {
        Ok(Self {
            packages: package_paths
                .into_iter()
                .map(|path| PackageCompiler::try_new(path.clone()).map(|package| (path, package)))
                .collect::<Result<BTreeMap<PathBuf, PackageCompiler>, FatalError>>()?,
        })
    }

    /// Compile all packages fully from scratch, and return the process exit
    /// code
    pub fn run_batch(&mut self) -> i32 {
        self.packages
            .par_iter_mut()
            .map(|(_, package)| package.run_batch())
            .reduce(Output::new, |a, b| a + b)
            .report()
    }
}

impl PackageCompiler {
    pub fn try_new(path: PathBuf) -> Result<Self, FatalError> {
        if !SRC_DIR_NAMES.iter().any(|dir_name| path.join(dir_name).is_dir()) {
            return Err(FatalError::InvalidPackageRoot);
        }
        // Prove we can write before compiling anything. run_batch recreates
        // the out dir from scratch anyway.
        let out_dir = path.join(OUT_DIR_NAME);
        create_dir_all(&out_dir).map_err(|source| FatalError::IoError {
            action: format!("creating out dir ({})", out_dir.display()),
            source,
        })?;
        Ok(Self { path })
    }

    /// Compile the package fully from scratch, and return the number of
    /// errors and warnings
    pub fn run_batch(&mut self) -> Output {
        let diagnostics = ProjectDiagnostics::new(true);
        let e = ProjectLogger::new(&diagnostics);

        // Remove old outputs
        let output_root = self.path.join(OUT_DIR_NAME);
        match remove_dir_all(&output_root) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                error!(e, "failed to remove old output root '{}'", output_root.display();
                    issue!("{}", err));
                return diagnostics.into_output();
            }
        }
        if let Err(err) = create_dir(&output_root) {
            error!(e, "failed to create output root '{}'", output_root.display();
                issue!("{}", err));
            return diagnostics.into_output();
        }

        for dir_name in SRC_DIR_NAMES {
            let root_dir = self.path.join(dir_name);
            if !root_dir.is_dir() {
                continue;
            }
            self.run_src_dir(dir_name, &root_dir, &output_root, &diagnostics);
        }
        diagnostics.into_output()
    }

    /// Compile one source dir (`src/`, `bin/`, or `tests/`) into its mirror
    /// under `out/`. Compilable sources become `.js` plus `.js.map.json`;
    /// everything else is copied verbatim. Vendored dependencies are skipped
    /// entirely.
    fn run_src_dir(
        &self,
        dir_name: &str,
        root_dir: &Path,
        output_root: &Path,
        diagnostics: &ProjectDiagnostics,
    ) {
        let e = ProjectLogger::new(diagnostics);
        let walk = WalkDir::new(root_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != VENDOR_DIR_NAME);
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!(e, "failed to process a file under '{}'", root_dir.display();
                        issue!("{}", err));
                    continue;
                }
            };
            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(root_dir) else {
                continue;
            };
            let output_path = output_root.join(dir_name).join(relative_path);
            if entry.file_type().is_dir() {
                if let Err(err) = create_dir(&output_path) {
                    error!(e, "failed to create output dir '{}'", output_path.display();
                        issue!("{}", err));
                }
            } else if !ELIGIBLE.is_match(relative_path) {
                if let Err(err) = copy(path, &output_path) {
                    error!(e, "failed to copy '{}' to '{}'", path.display(), output_path.display();
                        issue!("{}", err));
                }
            } else {
                let source_path = Path::new(dir_name).join(relative_path);
                self.compile_file(path, &source_path, &output_path, diagnostics);
            }
        }
    }

    /// Compile one eligible source file. `source_path` is the path surfaced
    /// to the user (relative to the package root); `output_path` still has
    /// the source extension, which gets replaced per artifact.
    fn compile_file(
        &self,
        path: &Path,
        source_path: &Path,
        output_path: &Path,
        diagnostics: &ProjectDiagnostics,
    ) {
        let e = ProjectLogger::new(diagnostics);
        // Selection already proved the extension is one of ours
        let Some(dialect) = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Dialect::of_extension)
        else {
            return;
        };
        let source = match read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                error!(e, "failed to read '{}'", path.display(); issue!("{}", err));
                return;
            }
        };
        let file_diagnostics = diagnostics.file(source_path);
        let file = source_path.display().to_string();
        let emitted = match compile_source(&source, dialect, &file, file_diagnostics) {
            Ok(emitted) => emitted,
            Err(err) => {
                let fe = FileLogger::new(file_diagnostics);
                error!(fe, "invalid syntax: {}", err.message => err.span();
                    issue!("{}", err.excerpt));
                return;
            }
        };
        if let Err(err) = write(output_path.with_extension(OUT_EXTENSION), emitted.code) {
            error!(e, "failed to write output for '{}'", source_path.display();
                issue!("{}", err));
        }
        let map = match serde_json::to_string_pretty(&emitted.map.to_json()) {
            Ok(map) => map,
            Err(err) => {
                error!(e, "failed to serialize position map for '{}'", source_path.display();
                    issue!("{}", err));
                return;
            }
        };
        if let Err(err) = write(output_path.with_extension(MAP_EXTENSION), map) {
            error!(e, "failed to write position map for '{}'", source_path.display();
                issue!("{}", err));
        }
    }
}
