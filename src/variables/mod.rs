//! Variable engine.
//!
//! Finds `{name}` / `{name:tag}` placeholders and substitutes them from a lookup,
//! leaving unknown placeholders untouched for a later pass.

pub mod find;
pub mod substitution;

pub use find::{find_variables, Variable};
pub use substitution::{merge_variables, replace_variables};
