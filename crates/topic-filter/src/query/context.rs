//! Collaborators and clock for one compilation.

use chrono::{DateTime, Utc};

use crate::directory::{CapabilityOracle, NameResolver, SiteSettings};

/// Everything a compilation reads besides the query string.
///
/// All members are read-only; the same context can back any number of
/// compilations.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    guardian: &'a dyn CapabilityOracle,
    resolver: &'a dyn NameResolver,
    settings: &'a dyn SiteSettings,
    now: Option<DateTime<Utc>>,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        guardian: &'a dyn CapabilityOracle,
        resolver: &'a dyn NameResolver,
        settings: &'a dyn SiteSettings,
    ) -> Self {
        Self {
            guardian,
            resolver,
            settings,
            now: None,
        }
    }

    /// Pins the instant used by time-relative predicates.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn guardian(&self) -> &'a dyn CapabilityOracle {
        self.guardian
    }

    pub fn resolver(&self) -> &'a dyn NameResolver {
        self.resolver
    }

    pub fn settings(&self) -> &'a dyn SiteSettings {
        self.settings
    }

    /// The pinned instant, or the wall clock when none is pinned.
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Copy with the clock read once, so one compilation sees one instant.
    pub fn pinned(self) -> Self {
        let now = self.now();
        self.at(now)
    }
}
