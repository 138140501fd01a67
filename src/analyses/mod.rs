/// Block-level binding resolution
pub mod scopes;
