//! CLI command handlers, one per file.

mod clear_cache;
mod metadata;
mod refresh;
mod resolve;

pub use clear_cache::run_clear_cache;
pub use metadata::run_metadata;
pub use refresh::run_refresh;
pub use resolve::run_resolve;
