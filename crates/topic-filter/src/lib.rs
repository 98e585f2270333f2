//! Topic filter query compiler.
//!
//! This crate compiles search-query strings into composable topic filters:
//! - Tolerant `key:value` scanning with `-` (exclude) and `=` (exact) prefixes
//! - Tag, category, status, and membership-state keyword semantics
//! - Merge-on-repeat registered scopes, finalized after scanning
//! - Fail-closed visibility through a [`CapabilityOracle`]
//!
//! Storage, name resolution, and permissions are supplied by the caller
//! through the traits in [`directory`]. The crate never executes a query.

pub mod config;
pub mod directory;
pub mod error;
pub mod query;
pub mod types;

// Re-export main types
pub use config::{load_or_create_filter_config, FilterConfig};
pub use directory::memory::{MemoryDirectory, MemoryGuardian};
pub use directory::{CapabilityOracle, NameResolver, SiteSettings, TagResolution};
pub use error::{Result, TopicFilterError};
pub use query::{
    FilterChain, FilterContext, FilterResult, PredicateSink, SqlWhereBuilder, TopicFilterCompiler,
    TopicPredicate,
};
pub use types::{ActorId, CategoryId, NotificationLevel, TagId, TopicStatus};
