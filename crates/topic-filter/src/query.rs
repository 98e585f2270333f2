//! Query compilation for topic lists.
//!
//! This module turns a human-typed query such as
//! `tags:foo+bar status:closed category:news` into a [`FilterResult`]:
//! - Token scanning (`[-=]key:value`) and delimited value lists
//! - Keyword handlers for `in:`, `status:`, `tags:` and `category:`
//! - Registered scopes that merge repeated keywords into one predicate
//! - Sinks that replay the result onto a target query builder

mod categories;
mod compiler;
mod context;
mod list;
mod lookup;
mod predicate;
mod scanner;
mod scope;
mod sink;
mod state;
mod status;
mod tags;

#[cfg(test)]
mod tests;

pub use compiler::{FilterBuilder, TopicFilterCompiler};
pub use context::FilterContext;
pub use list::{parse_value_list, ListDelimiter, ValueList};
pub use predicate::{FilterChain, FilterResult, TagJoin, TopicPredicate};
pub use scanner::{scan_query, KeyFlag, QueryScanner, QueryToken};
pub use scope::{RegisteredScope, ScopeKey, ScopeRegistry};
pub use sink::{PredicateSink, SqlParam, SqlQuery, SqlWhereBuilder};
pub use tags::{TagClause, TagMatchMode};
