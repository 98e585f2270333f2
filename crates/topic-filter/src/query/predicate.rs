//! Filter output model.
//!
//! A compiled query is a [`FilterResult`]: either an ordered chain of
//! [`TopicPredicate`]s that must all hold, or [`FilterResult::Empty`] when
//! the query can be proven to match nothing.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{ActorId, CategoryId, NotificationLevel, TagId, TopicStatus};

use super::sink::PredicateSink;

/// One condition on a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopicPredicate {
    Status {
        status: TopicStatus,
    },
    /// Pinned, with an expiry after the pin start, and not yet expired at `at`.
    ActivelyPinned {
        at: DateTime<Utc>,
    },
    BookmarkedBy {
        actor: ActorId,
    },
    /// The actor's membership row has one of `levels`. An empty set matches nothing.
    NotificationLevelIn {
        actor: ActorId,
        levels: BTreeSet<NotificationLevel>,
    },
    CategoryIn {
        ids: BTreeSet<CategoryId>,
    },
    /// Inner join per entry; the topic carries every tag group.
    TaggedWithAll {
        joins: Vec<TagJoin>,
    },
    /// Single inner join; the topic carries at least one tag. Results are distinct.
    TaggedWithAny {
        alias: String,
        tag_ids: BTreeSet<TagId>,
    },
    /// Left outer join per entry; the topic lacks at least one tag group.
    MissingSomeTag {
        joins: Vec<TagJoin>,
    },
    /// The topic carries none of the tags.
    TaggedWithNone {
        tag_ids: BTreeSet<TagId>,
    },
}

/// An aliased join onto the topic/tag membership relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagJoin {
    pub alias: String,
    /// A tag and, for alias tags, its target.
    pub tag_ids: BTreeSet<TagId>,
}

/// Conjunction of predicates, in application order. Append only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterChain {
    predicates: Vec<TopicPredicate>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: TopicPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[TopicPredicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Result of compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterResult {
    Filter(FilterChain),
    /// No record can match.
    Empty,
}

impl Default for FilterResult {
    fn default() -> Self {
        Self::unfiltered()
    }
}

impl FilterResult {
    /// The base collection with no predicates.
    pub fn unfiltered() -> Self {
        Self::Filter(FilterChain::new())
    }

    /// Adds a predicate. Once empty, stays empty.
    pub fn and(self, predicate: TopicPredicate) -> Self {
        match self {
            Self::Filter(chain) => Self::Filter(chain.and(predicate)),
            Self::Empty => Self::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_unfiltered(&self) -> bool {
        matches!(self, Self::Filter(chain) if chain.is_empty())
    }

    pub fn chain(&self) -> Option<&FilterChain> {
        match self {
            Self::Filter(chain) => Some(chain),
            Self::Empty => None,
        }
    }

    pub fn predicates(&self) -> &[TopicPredicate] {
        self.chain().map(FilterChain::predicates).unwrap_or_default()
    }

    /// Replays this result against `sink` in chain order.
    pub fn apply_to<S: PredicateSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Self::Filter(chain) => {
                for predicate in chain.predicates() {
                    sink.apply(predicate);
                }
            }
            Self::Empty => sink.none(),
        }
    }
}
