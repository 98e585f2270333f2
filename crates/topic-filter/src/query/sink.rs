//! Predicate sinks.
//!
//! A [`PredicateSink`] is the query abstraction a [`FilterResult`] is replayed
//! onto. [`SqlWhereBuilder`] is the reference sink: it lowers predicates to a
//! parameterized `SELECT` over the `topics` table. It does not execute
//! anything.
//!
//! [`FilterResult`]: super::predicate::FilterResult

use chrono::{DateTime, Utc};

use crate::types::TopicStatus;

use super::predicate::{TagJoin, TopicPredicate};

/// Target of compiled predicates.
pub trait PredicateSink {
    fn apply(&mut self, predicate: &TopicPredicate);

    /// Called instead of [`apply`](Self::apply) when nothing can match.
    fn none(&mut self);
}

/// Bound value for a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Timestamp(DateTime<Utc>),
}

/// Rendered SQL plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

const TOPIC_USERS_JOIN: &str = "INNER JOIN topic_users ON topic_users.topic_id = topics.id";
const CATEGORIES_JOIN: &str = "INNER JOIN categories ON categories.id = topics.category_id";

/// Lowers predicates to SQL against `topics`, `topic_users`, `topic_tags`
/// and `categories`.
///
/// Soft-deleted topics are excluded unless a `status:deleted` predicate was
/// applied.
#[derive(Debug, Clone, Default)]
pub struct SqlWhereBuilder {
    joins: Vec<String>,
    join_params: Vec<SqlParam>,
    conditions: Vec<String>,
    condition_params: Vec<SqlParam>,
    distinct: bool,
    includes_deleted: bool,
    matches_nothing: bool,
}

impl SqlWhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn includes_deleted(&self) -> bool {
        self.includes_deleted
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn to_sql(&self) -> SqlQuery {
        if self.matches_nothing {
            return SqlQuery {
                sql: "SELECT topics.* FROM topics WHERE FALSE".to_string(),
                params: Vec::new(),
            };
        }

        let mut conditions = Vec::with_capacity(self.conditions.len() + 1);
        if !self.includes_deleted {
            conditions.push("topics.deleted_at IS NULL".to_string());
        }
        conditions.extend(self.conditions.iter().cloned());

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str("topics.* FROM topics");
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut params = self.join_params.clone();
        params.extend(self.condition_params.iter().cloned());
        SqlQuery { sql, params }
    }

    fn join_once(&mut self, join: &str) {
        if !self.joins.iter().any(|existing| existing == join) {
            self.joins.push(join.to_string());
        }
    }

    fn condition(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    fn tag_join(&mut self, kind: &str, join: &TagJoin) {
        // An alias and its target can both be on one topic.
        if join.tag_ids.len() > 1 {
            self.distinct = true;
        }
        let alias = &join.alias;
        self.joins.push(format!(
            "{kind} JOIN topic_tags {alias} ON {alias}.topic_id = topics.id AND {alias}.tag_id IN ({})",
            placeholders(join.tag_ids.len())
        ));
        self.join_params
            .extend(join.tag_ids.iter().map(|id| SqlParam::Int(id.get())));
    }

    fn status(&mut self, status: TopicStatus) {
        match status {
            TopicStatus::Open => self.condition("NOT topics.closed AND NOT topics.archived"),
            TopicStatus::Closed => self.condition("topics.closed"),
            TopicStatus::Archived => self.condition("topics.archived"),
            TopicStatus::Listed => self.condition("topics.visible"),
            TopicStatus::Unlisted => self.condition("NOT topics.visible"),
            TopicStatus::Public => {
                self.join_once(CATEGORIES_JOIN);
                self.condition("NOT categories.read_restricted");
            }
            TopicStatus::Deleted => {
                self.includes_deleted = true;
                self.condition("topics.deleted_at IS NOT NULL");
            }
        }
    }
}

impl PredicateSink for SqlWhereBuilder {
    fn apply(&mut self, predicate: &TopicPredicate) {
        match predicate {
            TopicPredicate::Status { status } => self.status(*status),
            TopicPredicate::ActivelyPinned { at } => {
                self.condition(
                    "topics.pinned_at IS NOT NULL AND topics.pinned_until > topics.pinned_at \
                     AND ? < topics.pinned_until",
                );
                self.condition_params.push(SqlParam::Timestamp(*at));
            }
            TopicPredicate::BookmarkedBy { actor } => {
                self.join_once(TOPIC_USERS_JOIN);
                self.condition("topic_users.bookmarked AND topic_users.user_id = ?");
                self.condition_params.push(SqlParam::Int(actor.get()));
            }
            TopicPredicate::NotificationLevelIn { actor, levels } => {
                if levels.is_empty() {
                    self.condition("FALSE");
                    return;
                }
                self.join_once(TOPIC_USERS_JOIN);
                self.condition(format!(
                    "topic_users.notification_level IN ({}) AND topic_users.user_id = ?",
                    placeholders(levels.len())
                ));
                self.condition_params
                    .extend(levels.iter().map(|level| SqlParam::Int(level.as_i64())));
                self.condition_params.push(SqlParam::Int(actor.get()));
            }
            TopicPredicate::CategoryIn { ids } => {
                if ids.is_empty() {
                    self.condition("FALSE");
                    return;
                }
                self.condition(format!(
                    "topics.category_id IN ({})",
                    placeholders(ids.len())
                ));
                self.condition_params
                    .extend(ids.iter().map(|id| SqlParam::Int(id.get())));
            }
            TopicPredicate::TaggedWithAll { joins } => {
                for join in joins {
                    self.tag_join("INNER", join);
                }
            }
            TopicPredicate::TaggedWithAny { alias, tag_ids } => {
                self.tag_join(
                    "INNER",
                    &TagJoin {
                        alias: alias.clone(),
                        tag_ids: tag_ids.clone(),
                    },
                );
                self.distinct = true;
            }
            TopicPredicate::MissingSomeTag { joins } => {
                for join in joins {
                    self.tag_join("LEFT", join);
                }
                let missing: Vec<String> = joins
                    .iter()
                    .map(|join| format!("{}.topic_id IS NULL", join.alias))
                    .collect();
                self.condition(format!("({})", missing.join(" OR ")));
            }
            TopicPredicate::TaggedWithNone { tag_ids } => {
                self.condition(format!(
                    "topics.id NOT IN (SELECT topic_tags.topic_id FROM topic_tags \
                     WHERE topic_tags.tag_id IN ({}))",
                    placeholders(tag_ids.len())
                ));
                self.condition_params
                    .extend(tag_ids.iter().map(|id| SqlParam::Int(id.get())));
            }
        }
    }

    fn none(&mut self) {
        self.matches_nothing = true;
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
