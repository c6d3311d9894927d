// Port Layer - Interfaces for external dependencies

pub mod dom_job_source;
pub mod key_value_store;
pub mod page_context;
pub mod time_provider; // For deterministic testing
pub mod url_resolver;

// Re-exports
pub use dom_job_source::{DomJobSource, PostingElement};
pub use key_value_store::KeyValueStore;
pub use page_context::{FeedSurface, NetworkSurface, PageContext};
pub use time_provider::TimeProvider;
pub use url_resolver::{ResolutionError, UrlResolver};
