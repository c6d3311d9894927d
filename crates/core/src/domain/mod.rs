// Domain Layer - Pure business logic and entities

pub mod cached_url;
pub mod error;
pub mod filter;
pub mod job;
pub mod page;
pub mod settings;

// Re-exports
pub use cached_url::{CachedJobUrl, HOUR_MS, LAST_SEEN_COALESCE_MS};
pub use error::DomainError;
pub use filter::{FilterRuleSet, UrlSnapshot};
pub use job::{JobId, JobRecord};
pub use page::{FeedSession, PageMode, PageState, PostingAnnotation};
pub use settings::Settings;
