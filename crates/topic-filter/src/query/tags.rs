//! `tags:` keyword.
//!
//! The clause shape is a 2×2 of include/exclude and all/any:
//!
//! | | all (`+` or single) | any (`,`) |
//! |---|---|---|
//! | include | one inner join per tag | one inner join, `IN`, distinct |
//! | exclude (`-`) | one left join per tag, some join missing | `NOT IN` subquery |

use std::collections::BTreeSet;

use crate::types::TagId;

use super::compiler::FilterBuilder;
use super::context::FilterContext;
use super::list::ListDelimiter;
use super::predicate::{TagJoin, TopicPredicate};

/// Whether a tag clause needs every tag or just one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatchMode {
    All,
    Any,
}

impl TagMatchMode {
    pub fn from_delimiter(delimiter: Option<ListDelimiter>) -> Self {
        match delimiter {
            Some(ListDelimiter::Comma) => Self::Any,
            Some(ListDelimiter::Plus) | None => Self::All,
        }
    }
}

/// A parsed `tags:` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagClause {
    pub names: Vec<String>,
    pub mode: TagMatchMode,
    pub exclude: bool,
}

/// Resolved ids, grouped per requested name.
#[derive(Debug, Default)]
struct ResolvedTags {
    groups: Vec<BTreeSet<TagId>>,
    all_ids: BTreeSet<TagId>,
}

pub fn filter_tags(
    builder: FilterBuilder,
    context: &FilterContext<'_>,
    clause: TagClause,
) -> FilterBuilder {
    if !context.settings().tagging_enabled() {
        tracing::debug!("tagging disabled, ignoring tags clause");
        return builder;
    }

    let names = dedup_names(clause.names);
    if names.is_empty() {
        return builder;
    }

    let resolved = resolve_tags(context, &names);
    if clause.mode == TagMatchMode::All && resolved.groups.len() != names.len() {
        return builder.none("tags clause requires a tag that does not resolve");
    }
    if resolved.all_ids.is_empty() {
        tracing::debug!(?names, "no tags resolved, ignoring tags clause");
        return builder;
    }

    match (clause.exclude, clause.mode) {
        (false, TagMatchMode::All) => include_topics_with_all_tags(builder, resolved),
        (false, TagMatchMode::Any) => include_topics_with_any_tags(builder, resolved),
        (true, TagMatchMode::All) => exclude_topics_with_all_tags(builder, resolved),
        (true, TagMatchMode::Any) => exclude_topics_with_any_tags(builder, resolved),
    }
}

fn include_topics_with_all_tags(
    mut builder: FilterBuilder,
    resolved: ResolvedTags,
) -> FilterBuilder {
    let joins = tag_joins(&mut builder, resolved.groups);
    builder.and(TopicPredicate::TaggedWithAll { joins })
}

fn include_topics_with_any_tags(
    mut builder: FilterBuilder,
    resolved: ResolvedTags,
) -> FilterBuilder {
    let alias = builder.next_tag_alias();
    builder.and(TopicPredicate::TaggedWithAny {
        alias,
        tag_ids: resolved.all_ids,
    })
}

fn exclude_topics_with_all_tags(
    mut builder: FilterBuilder,
    resolved: ResolvedTags,
) -> FilterBuilder {
    let joins = tag_joins(&mut builder, resolved.groups);
    builder.and(TopicPredicate::MissingSomeTag { joins })
}

fn exclude_topics_with_any_tags(builder: FilterBuilder, resolved: ResolvedTags) -> FilterBuilder {
    builder.and(TopicPredicate::TaggedWithNone {
        tag_ids: resolved.all_ids,
    })
}

fn tag_joins(builder: &mut FilterBuilder, groups: Vec<BTreeSet<TagId>>) -> Vec<TagJoin> {
    groups
        .into_iter()
        .map(|tag_ids| TagJoin {
            alias: builder.next_tag_alias(),
            tag_ids,
        })
        .collect()
}

fn resolve_tags(context: &FilterContext<'_>, names: &[String]) -> ResolvedTags {
    let resolutions = context
        .resolver()
        .tag_ids_for_names(names, context.guardian())
        .unwrap_or_else(|error| {
            tracing::warn!("tag lookup failed, treating as unresolved: {error}");
            Vec::new()
        });

    let mut resolved = ResolvedTags::default();
    for name in names {
        let group: BTreeSet<TagId> = resolutions
            .iter()
            .filter(|resolution| resolution.name.eq_ignore_ascii_case(name))
            .flat_map(|resolution| resolution.ids())
            .collect();
        if group.is_empty() {
            continue;
        }
        resolved.all_ids.extend(group.iter().copied());
        resolved.groups.push(group);
    }
    resolved
}

fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
