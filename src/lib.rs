#![doc = include_str!("../README.md")]

/// Binding re-resolution after a rewrite
pub mod analyses;
/// Syntax tree: spans, statements, expressions
pub mod ast;
/// The per-file pipeline (parse, rewrite, serialize)
pub mod compile;
/// Batch driver: package layout, file selection, outputs, exit code
pub mod compiler;
/// Diagnostics (errors/warnings/etc) and logging
pub mod diagnostics;
/// Serializer and the position-mapping artifact
pub mod emit;
/// Utilities which could go in any crate
pub mod misc;
/// Lexer, parser, and dialect selection
pub mod syntax;
/// The defer rewrite itself
pub mod transform;
