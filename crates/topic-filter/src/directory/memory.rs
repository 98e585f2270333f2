//! In-memory collaborator implementations.

use std::collections::BTreeSet;

use fnv::FnvHashMap;

use crate::error::Result;
use crate::types::{ActorId, CategoryId, TagId};

use super::{CapabilityOracle, NameResolver, TagResolution};

#[derive(Debug, Clone)]
struct TagRecord {
    id: TagId,
    target_id: Option<TagId>,
    category: Option<CategoryId>,
}

#[derive(Debug, Clone)]
struct CategoryRecord {
    id: CategoryId,
    slug: String,
    parent: Option<CategoryId>,
}

/// Tag and category directory held in memory.
///
/// Tag names match case-insensitively. A tag registered against a category is
/// only visible to actors who can see that category.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    tags: FnvHashMap<String, TagRecord>,
    categories: Vec<CategoryRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, name: &str, id: i64) -> Self {
        self.insert_tag(name, TagId(id), None, None);
        self
    }

    /// Registers `name` as an alias of `target`.
    pub fn with_tag_alias(mut self, name: &str, id: i64, target: i64) -> Self {
        self.insert_tag(name, TagId(id), Some(TagId(target)), None);
        self
    }

    pub fn with_category_tag(mut self, name: &str, id: i64, category: i64) -> Self {
        self.insert_tag(name, TagId(id), None, Some(CategoryId(category)));
        self
    }

    pub fn with_category(mut self, slug: &str, id: i64) -> Self {
        self.categories.push(CategoryRecord {
            id: CategoryId(id),
            slug: slug.to_string(),
            parent: None,
        });
        self
    }

    pub fn with_subcategory(mut self, slug: &str, id: i64, parent: i64) -> Self {
        self.categories.push(CategoryRecord {
            id: CategoryId(id),
            slug: slug.to_string(),
            parent: Some(CategoryId(parent)),
        });
        self
    }

    fn insert_tag(
        &mut self,
        name: &str,
        id: TagId,
        target_id: Option<TagId>,
        category: Option<CategoryId>,
    ) {
        self.tags.insert(
            name.to_lowercase(),
            TagRecord {
                id,
                target_id,
                category,
            },
        );
    }

    /// Resolves a slug, accepting the `parent:child` form.
    fn resolve_slug(&self, slug: &str) -> Option<CategoryId> {
        match slug.split_once(':') {
            Some((parent_slug, child_slug)) => {
                let parent = self.find_category(parent_slug, None)?;
                self.find_category(child_slug, Some(parent))
            }
            None => self.find_category(slug, None).or_else(|| {
                self.categories
                    .iter()
                    .find(|record| record.slug == slug)
                    .map(|record| record.id)
            }),
        }
    }

    fn find_category(&self, slug: &str, parent: Option<CategoryId>) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|record| record.slug == slug && record.parent == parent)
            .map(|record| record.id)
    }
}

impl NameResolver for MemoryDirectory {
    fn tag_ids_for_names(
        &self,
        names: &[String],
        oracle: &dyn CapabilityOracle,
    ) -> Result<Vec<TagResolution>> {
        Ok(names
            .iter()
            .filter_map(|name| {
                let record = self.tags.get(&name.to_lowercase())?;
                if let Some(category) = record.category {
                    if !oracle.can_see_category(category) {
                        return None;
                    }
                }
                let resolution = TagResolution::new(name.as_str(), record.id);
                Some(match record.target_id {
                    Some(target) => resolution.with_target(target),
                    None => resolution,
                })
            })
            .collect())
    }

    fn category_ids_for_slugs(&self, slugs: &[String]) -> Result<Vec<CategoryId>> {
        Ok(slugs
            .iter()
            .filter_map(|slug| self.resolve_slug(slug))
            .collect())
    }

    fn subcategory_ids(&self, id: CategoryId) -> Result<Vec<CategoryId>> {
        Ok(self
            .categories
            .iter()
            .filter(|record| record.parent == Some(id))
            .map(|record| record.id)
            .collect())
    }
}

/// Capability oracle with fixed answers.
#[derive(Debug, Default, Clone)]
pub struct MemoryGuardian {
    actor: Option<ActorId>,
    hidden_categories: BTreeSet<CategoryId>,
    sees_deleted: bool,
    deleted_categories: BTreeSet<CategoryId>,
}

impl MemoryGuardian {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_actor(actor: i64) -> Self {
        Self {
            actor: Some(ActorId(actor)),
            ..Self::default()
        }
    }

    pub fn hiding_category(mut self, id: i64) -> Self {
        self.hidden_categories.insert(CategoryId(id));
        self
    }

    /// Grants deleted-topic visibility everywhere.
    pub fn seeing_deleted(mut self) -> Self {
        self.sees_deleted = true;
        self
    }

    /// Grants deleted-topic visibility inside one category only.
    pub fn seeing_deleted_in(mut self, category: i64) -> Self {
        self.deleted_categories.insert(CategoryId(category));
        self
    }
}

impl CapabilityOracle for MemoryGuardian {
    fn current_actor(&self) -> Option<ActorId> {
        self.actor
    }

    fn can_see_category(&self, id: CategoryId) -> bool {
        !self.hidden_categories.contains(&id)
    }

    fn can_see_deleted_topics(&self, category: Option<CategoryId>) -> bool {
        self.sees_deleted || category.is_some_and(|id| self.deleted_categories.contains(&id))
    }
}
