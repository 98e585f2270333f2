//! `in:` keyword.

use std::collections::BTreeSet;

use super::compiler::FilterBuilder;
use super::context::FilterContext;
use super::lookup::{lookup_notification_level, lookup_topic_state, TopicState};
use super::predicate::TopicPredicate;
use super::scope::RegisteredScope;

pub fn filter_state(
    builder: FilterBuilder,
    context: &FilterContext<'_>,
    value: &str,
) -> FilterBuilder {
    match lookup_topic_state(value) {
        TopicState::Pinned => builder.and(TopicPredicate::ActivelyPinned { at: context.now() }),
        TopicState::Bookmarked => match context.guardian().current_actor() {
            Some(actor) => builder.and(TopicPredicate::BookmarkedBy { actor }),
            None => builder.none("in:bookmarked requires an authenticated actor"),
        },
        TopicState::Levels(names) => {
            let Some(actor) = context.guardian().current_actor() else {
                return builder.none("in: notification levels require an authenticated actor");
            };
            // Unknown names drop out; an all-unknown list leaves an empty set.
            let levels: BTreeSet<_> = names
                .split(',')
                .filter_map(lookup_notification_level)
                .collect();
            builder.register(RegisteredScope::NotificationLevels { actor, levels })
        }
    }
}
