#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod context;

pub use context::{Caller, CallerBuilder};
