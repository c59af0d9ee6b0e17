//! Metadata-driven REST request-resolution pipeline: route registry, path
//! scorer, dialect parsers, filter/search validators, RBAC gate, router
//! orchestrator, and response formatter.
//!
//! This crate owns request *resolution*, not persistence, schema
//! generation, or OpenAPI emission — those are external collaborators
//! reached through the traits in [`metadata`] and [`router`].

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod authz;
pub mod error;
pub mod format;
pub mod metadata;
pub mod parsers;
pub mod path_scorer;
pub mod registry;
pub mod request;
pub mod route;
pub mod router;
pub mod validate;

pub use error::{ErrorEnvelope, PipelineError};
pub use format::{ResponseDialect, ResponseFormatter, ResultSet};
pub use metadata::{FieldDescriptor, FieldType, ModelCatalog, ModelMetadata};
pub use registry::RouteRegistry;
pub use request::ParsedRequest;
pub use route::{HttpMethod, Route, RouteDeclaration, RouteSource};
pub use router::{Handler, RequestContext, Router};
