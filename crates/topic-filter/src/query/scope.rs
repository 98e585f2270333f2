//! Registered scopes.
//!
//! Some keywords may appear several times in one query but must still
//! produce a single predicate (`in:watching in:tracking` is one membership
//! condition, not two contradicting ones). Handlers for those keywords
//! register a scope here instead of applying a predicate; repeated
//! registrations under the same key merge, and the registry is finalized
//! once after the whole query has been scanned.

use std::collections::BTreeSet;

use fnv::FnvHashMap;

use crate::types::{ActorId, CategoryId, NotificationLevel};

use super::predicate::TopicPredicate;

/// Logical concern a scope is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    NotificationLevels,
    Categories,
}

/// Deferred predicate parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisteredScope {
    NotificationLevels {
        actor: ActorId,
        levels: BTreeSet<NotificationLevel>,
    },
    Categories {
        ids: BTreeSet<CategoryId>,
    },
}

impl RegisteredScope {
    pub fn key(&self) -> ScopeKey {
        match self {
            Self::NotificationLevels { .. } => ScopeKey::NotificationLevels,
            Self::Categories { .. } => ScopeKey::Categories,
        }
    }

    /// Set parameters are unioned, scalar parameters take the newer value.
    fn merge(&mut self, other: RegisteredScope) {
        match (self, other) {
            (
                Self::NotificationLevels { actor, levels },
                Self::NotificationLevels {
                    actor: newer_actor,
                    levels: more_levels,
                },
            ) => {
                *actor = newer_actor;
                levels.extend(more_levels);
            }
            (Self::Categories { ids }, Self::Categories { ids: more_ids }) => {
                ids.extend(more_ids);
            }
            (current, other) => {
                debug_assert_eq!(current.key(), other.key(), "merge across scope keys");
                *current = other;
            }
        }
    }

    pub fn finalize(self) -> TopicPredicate {
        match self {
            Self::NotificationLevels { actor, levels } => {
                TopicPredicate::NotificationLevelIn { actor, levels }
            }
            Self::Categories { ids } => TopicPredicate::CategoryIn { ids },
        }
    }
}

/// At most one scope per key, kept in first-registration order.
#[derive(Debug, Default, Clone)]
pub struct ScopeRegistry {
    scopes: Vec<RegisteredScope>,
    positions: FnvHashMap<ScopeKey, usize>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the scope for its key, or merges into the existing one.
    pub fn register(&mut self, scope: RegisteredScope) {
        let key = scope.key();
        match self.positions.get(&key) {
            Some(&position) => {
                tracing::trace!(?key, "merging registered scope");
                self.scopes[position].merge(scope);
            }
            None => {
                tracing::trace!(?key, "registering scope");
                self.positions.insert(key, self.scopes.len());
                self.scopes.push(scope);
            }
        }
    }

    pub fn get(&self, key: ScopeKey) -> Option<&RegisteredScope> {
        self.positions
            .get(&key)
            .and_then(|&position| self.scopes.get(position))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Consumes the registry, yielding one predicate per key.
    pub fn finalize(self) -> impl Iterator<Item = TopicPredicate> {
        self.scopes.into_iter().map(RegisteredScope::finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(ids: &[i64]) -> RegisteredScope {
        RegisteredScope::Categories {
            ids: ids.iter().copied().map(CategoryId).collect(),
        }
    }

    #[test]
    fn duplicate_keys_union_their_sets() {
        let mut registry = ScopeRegistry::new();
        registry.register(categories(&[1, 2]));
        registry.register(categories(&[2, 3]));

        assert_eq!(registry.len(), 1);
        let predicates: Vec<_> = registry.finalize().collect();
        assert_eq!(
            predicates,
            vec![TopicPredicate::CategoryIn {
                ids: [CategoryId(1), CategoryId(2), CategoryId(3)]
                    .into_iter()
                    .collect(),
            }]
        );
    }

    #[test]
    fn scalar_parameters_take_the_latest_value() {
        let mut registry = ScopeRegistry::new();
        registry.register(RegisteredScope::NotificationLevels {
            actor: ActorId(1),
            levels: [NotificationLevel::Watching].into_iter().collect(),
        });
        registry.register(RegisteredScope::NotificationLevels {
            actor: ActorId(2),
            levels: [NotificationLevel::Tracking].into_iter().collect(),
        });

        match registry.get(ScopeKey::NotificationLevels) {
            Some(RegisteredScope::NotificationLevels { actor, levels }) => {
                assert_eq!(*actor, ActorId(2));
                assert_eq!(levels.len(), 2);
            }
            other => panic!("expected notification levels scope, got {other:?}"),
        }
    }

    #[test]
    fn finalizes_in_first_registration_order() {
        let mut registry = ScopeRegistry::new();
        registry.register(categories(&[5]));
        registry.register(RegisteredScope::NotificationLevels {
            actor: ActorId(1),
            levels: BTreeSet::new(),
        });
        registry.register(categories(&[6]));

        let predicates: Vec<_> = registry.finalize().collect();
        assert!(matches!(
            predicates.as_slice(),
            [
                TopicPredicate::CategoryIn { .. },
                TopicPredicate::NotificationLevelIn { .. }
            ]
        ));
    }

    #[test]
    fn empty_registry_finalizes_to_nothing() {
        let registry = ScopeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.finalize().count(), 0);
    }
}
