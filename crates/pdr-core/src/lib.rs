pub mod config;
pub mod logging;

// Resolution pipeline
pub mod asset;
pub mod cache;
pub mod extract;
pub mod fetch;
pub mod probe;
pub mod rank;
pub mod resolver;
pub mod retry;
pub mod url_model;
pub mod validate;

// Catalog refresh
pub mod catalog;
pub mod filter;
pub mod report;

pub use asset::{AssetFormat, Candidate, RankedAsset, SourcePattern, Validation, ValidationErrorCode};
pub use resolver::{Resolution, ResolutionError, ResolveOptions, Resolver};
