//! `category:` / `categories:` keyword.

use std::collections::BTreeSet;

use crate::types::CategoryId;

use super::compiler::FilterBuilder;
use super::context::FilterContext;
use super::scope::RegisteredScope;

/// Restricts topics to the named categories.
///
/// Every slug must resolve to a category the actor can see, otherwise the
/// whole result is emptied. Unless `exact` is set, each category brings its
/// descendants along.
pub fn filter_categories(
    builder: FilterBuilder,
    context: &FilterContext<'_>,
    slugs: Vec<String>,
    exact: bool,
) -> FilterBuilder {
    let mut seen = BTreeSet::new();
    let slugs: Vec<String> = slugs
        .into_iter()
        .filter(|slug| seen.insert(slug.clone()))
        .collect();

    let resolved = context
        .resolver()
        .category_ids_for_slugs(&slugs)
        .unwrap_or_else(|error| {
            tracing::warn!("category lookup failed, treating as unresolved: {error}");
            Vec::new()
        });

    // Two slugs may name the same category, so count before collapsing ids.
    let visible: Vec<CategoryId> = resolved
        .into_iter()
        .filter(|&id| context.guardian().can_see_category(id))
        .collect();
    if visible.len() < slugs.len() {
        return builder.none("category unknown or not visible to the actor");
    }
    let visible: BTreeSet<CategoryId> = visible.into_iter().collect();

    let ids = if exact {
        visible
    } else {
        with_descendants(context, visible)
    };
    builder.register(RegisteredScope::Categories { ids })
}

fn with_descendants(
    context: &FilterContext<'_>,
    roots: BTreeSet<CategoryId>,
) -> BTreeSet<CategoryId> {
    let mut pending: Vec<CategoryId> = roots.iter().copied().collect();
    let mut ids = roots;

    while let Some(id) = pending.pop() {
        let children = context.resolver().subcategory_ids(id).unwrap_or_else(|error| {
            tracing::warn!(%id, "subcategory lookup failed: {error}");
            Vec::new()
        });
        for child in children {
            if ids.insert(child) {
                pending.push(child);
            }
        }
    }
    ids
}
