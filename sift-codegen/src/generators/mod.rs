//! Code generators for criteria types.

mod attrs;
mod criteria;

pub use criteria::derive_criteria_impl;
