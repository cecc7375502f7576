//! SQL fragments: fixed column lists and list filters pushed as bound parameters.

mod filters;
pub use filters::*;
