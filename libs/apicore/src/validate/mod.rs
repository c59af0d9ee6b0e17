//! Field-capability-aware validation of parsed filters and search requests
//! against a model's declared metadata.

pub mod filters;
pub mod search;

pub use filters::FilterCriteriaValidator;
pub use search::SearchEngineValidator;
