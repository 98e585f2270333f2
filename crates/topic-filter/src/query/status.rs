//! `status:` keyword.

use crate::types::{CategoryId, TopicStatus};

use super::compiler::FilterBuilder;
use super::context::FilterContext;
use super::lookup::lookup_topic_status;
use super::predicate::TopicPredicate;

/// Adds the predicate for one status value.
///
/// Unknown values are ignored. `deleted` is only honoured when the guardian
/// lets the actor see deleted topics (in `category`, if given); otherwise it
/// is ignored as well rather than emptying the result.
pub fn filter_status(
    builder: FilterBuilder,
    context: &FilterContext<'_>,
    value: &str,
    category: Option<CategoryId>,
) -> FilterBuilder {
    let Some(status) = lookup_topic_status(value) else {
        tracing::debug!(value, "ignoring unknown status");
        return builder;
    };

    if status == TopicStatus::Deleted && !context.guardian().can_see_deleted_topics(category) {
        tracing::debug!(?category, "actor cannot see deleted topics, ignoring status:deleted");
        return builder;
    }

    builder.and(TopicPredicate::Status { status })
}
