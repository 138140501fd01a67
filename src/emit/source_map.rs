use serde_json::{json, Value};

use crate::ast::Pos;

/// One generated-position → original-position entry. Synthetic nodes (built
/// by the rewrite) record no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Pos,
    pub original: Pos,
}

/// The position-mapping artifact emitted next to each compiled file.
/// Entries are in generated order because the emitter records them as it
/// writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    pub file: String,
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into(), mappings: Vec::new() }
    }

    pub fn record(&mut self, generated: Pos, original: Pos) {
        self.mappings.push(Mapping { generated, original });
    }

    pub fn to_json(&self) -> Value {
        json!({
            "file": self.file,
            "mappings": self.mappings.iter().map(|m| json!({
                "generated": [m.generated.line, m.generated.column],
                "original": [m.original.line, m.original.column],
            })).collect::<Vec<_>>(),
        })
    }
}
