//! Query compiler.
//!
//! [`TopicFilterCompiler`] scans a query, hands every recognized keyword to
//! its handler, and finalizes registered scopes once the query is exhausted.
//! Handlers take a [`FilterBuilder`] by value and return the next state.

use crate::types::CategoryId;

use super::categories::filter_categories;
use super::context::FilterContext;
use super::list::{is_category_slug_char, is_tag_name_char, parse_value_list, ListDelimiter};
use super::predicate::{FilterResult, TopicPredicate};
use super::scanner::{scan_query, KeyFlag, QueryToken};
use super::scope::{RegisteredScope, ScopeRegistry};
use super::state::filter_state;
use super::status::filter_status;
use super::tags::{filter_tags, TagClause, TagMatchMode};

const TAG_DELIMITERS: &[ListDelimiter] = &[ListDelimiter::Comma, ListDelimiter::Plus];
const CATEGORY_DELIMITERS: &[ListDelimiter] = &[ListDelimiter::Comma];

// ---------------------------------------------------------------------------
// Builder state
// ---------------------------------------------------------------------------

/// Working state of one compilation.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    result: FilterResult,
    scopes: ScopeRegistry,
    next_alias: usize,
}

impl FilterBuilder {
    pub fn new(base: FilterResult) -> Self {
        Self {
            result: base,
            scopes: ScopeRegistry::new(),
            next_alias: 0,
        }
    }

    pub fn and(mut self, predicate: TopicPredicate) -> Self {
        self.result = self.result.and(predicate);
        self
    }

    /// Pins the result to "matches nothing".
    pub fn none(mut self, reason: &str) -> Self {
        tracing::debug!(reason, "topic filter collapsed to empty");
        self.result = FilterResult::Empty;
        self
    }

    pub fn register(mut self, scope: RegisteredScope) -> Self {
        if !self.is_empty() {
            self.scopes.register(scope);
        }
        self
    }

    /// Allocates a join alias unique within this compilation.
    pub fn next_tag_alias(&mut self) -> String {
        let alias = format!("tags_{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn result(&self) -> &FilterResult {
        &self.result
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// Applies registered scopes in registration order.
    pub fn finish(self) -> FilterResult {
        let Self { result, scopes, .. } = self;
        scopes.finalize().fold(result, FilterResult::and)
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles query strings into [`FilterResult`]s.
pub struct TopicFilterCompiler<'a> {
    context: FilterContext<'a>,
}

impl<'a> TopicFilterCompiler<'a> {
    pub fn new(context: FilterContext<'a>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &FilterContext<'a> {
        &self.context
    }

    /// Compiles `query` against the unfiltered collection.
    pub fn compile(&self, query: &str) -> FilterResult {
        self.compile_onto(FilterResult::unfiltered(), query)
    }

    /// Compiles `query` on top of an existing filter.
    pub fn compile_onto(&self, base: FilterResult, query: &str) -> FilterResult {
        let _span = tracing::debug_span!("compile_topic_filter", query).entered();

        let context = self.context.pinned();
        scan_query(query)
            .fold(FilterBuilder::new(base), |builder, token| {
                dispatch(&context, builder, token)
            })
            .finish()
    }

    /// Applies a single `status:` value, optionally scoped to a category.
    pub fn apply_status(&self, status: &str, category: Option<CategoryId>) -> FilterResult {
        self.apply_status_onto(FilterResult::unfiltered(), status, category)
    }

    pub fn apply_status_onto(
        &self,
        base: FilterResult,
        status: &str,
        category: Option<CategoryId>,
    ) -> FilterResult {
        filter_status(FilterBuilder::new(base), &self.context, status, category).finish()
    }
}

fn dispatch(
    context: &FilterContext<'_>,
    builder: FilterBuilder,
    token: QueryToken<'_>,
) -> FilterBuilder {
    if builder.is_empty() {
        return builder;
    }
    tracing::debug!(key = token.key, value = token.value, "dispatching query token");

    match token.key {
        "in" => filter_state(builder, context, token.value),
        "status" => filter_status(builder, context, token.value, None),
        "tags" => {
            if token.flag.is_some_and(|flag| flag != KeyFlag::Exclude) {
                tracing::debug!("skipping tags clause with non-exclude prefix");
                return builder;
            }
            let Some(list) = parse_value_list(token.value, TAG_DELIMITERS, is_tag_name_char) else {
                tracing::debug!(value = token.value, "skipping malformed tag list");
                return builder;
            };
            let clause = TagClause {
                names: list.items,
                mode: TagMatchMode::from_delimiter(list.delimiter),
                exclude: token.flag == Some(KeyFlag::Exclude),
            };
            filter_tags(builder, context, clause)
        }
        "category" | "categories" => {
            if token.flag.is_some_and(|flag| flag != KeyFlag::Exact) {
                tracing::debug!("skipping category clause with non-exact prefix");
                return builder;
            }
            let Some(list) =
                parse_value_list(token.value, CATEGORY_DELIMITERS, is_category_slug_char)
            else {
                tracing::debug!(value = token.value, "skipping malformed category list");
                return builder;
            };
            let exact = token.flag == Some(KeyFlag::Exact);
            filter_categories(builder, context, list.items, exact)
        }
        other => {
            tracing::debug!(key = other, "ignoring unknown query keyword");
            builder
        }
    }
}
