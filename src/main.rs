use std::path::PathBuf;

use clap::Parser;

use deferscript::compiler::Compiler;

/// Compile DeferScript packages to JavaScript
#[derive(Debug, Parser)]
#[command(name = "deferc", version, about)]
struct Args {
    /// Package roots to compile. Each must contain at least one of src/,
    /// bin/, or tests/. Defaults to the current directory.
    packages: Vec<PathBuf>,
}

fn main() -> ! {
    env_logger::init();
    let args = Args::parse();
    let packages = if args.packages.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.packages
    };
    Compiler::run(packages)
}
