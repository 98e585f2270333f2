//! Collaborator traits consumed by the filter compiler.
//!
//! The compiler never talks to storage directly. Every lookup goes through
//! these traits; [`memory`] holds in-memory implementations.

pub mod memory;

use crate::error::Result;
use crate::types::{ActorId, CategoryId, TagId};

/// Answers visibility questions for the actor compiling a query.
pub trait CapabilityOracle {
    /// The authenticated actor, or `None` for anonymous access.
    fn current_actor(&self) -> Option<ActorId>;

    fn can_see_category(&self, id: CategoryId) -> bool;

    /// Whether soft-deleted topics are visible, optionally scoped to a category.
    fn can_see_deleted_topics(&self, category: Option<CategoryId>) -> bool;
}

/// Resolves human-typed names to storage ids.
pub trait NameResolver {
    /// Resolves tag names that are visible to `oracle`.
    ///
    /// Unknown or invisible names are simply absent from the result. Alias
    /// tags report the tag they point at in `target_id`.
    fn tag_ids_for_names(
        &self,
        names: &[String],
        oracle: &dyn CapabilityOracle,
    ) -> Result<Vec<TagResolution>>;

    fn category_ids_for_slugs(&self, slugs: &[String]) -> Result<Vec<CategoryId>>;

    /// Direct children of a category.
    fn subcategory_ids(&self, id: CategoryId) -> Result<Vec<CategoryId>>;
}

/// Site-wide flags.
pub trait SiteSettings {
    fn tagging_enabled(&self) -> bool;
}

/// One resolved tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResolution {
    /// The requested name this row answers for.
    pub name: String,
    pub id: TagId,
    pub target_id: Option<TagId>,
}

impl TagResolution {
    pub fn new(name: impl Into<String>, id: TagId) -> Self {
        Self {
            name: name.into(),
            id,
            target_id: None,
        }
    }

    pub fn with_target(mut self, target_id: TagId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    /// The tag's own id followed by its alias target, if any.
    pub fn ids(&self) -> impl Iterator<Item = TagId> + '_ {
        std::iter::once(self.id).chain(self.target_id)
    }
}
