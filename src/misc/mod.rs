mod chain;

pub use crate::chain;
