// src/sync.rs
//! Group synchronization.
//!
//! One snapshot is taken per pass and handed to every member, so all members
//! converge on the same values whatever order they are visited in.

use std::ops::AddAssign;

use crate::registry::GroupRegistry;
use crate::target::RenderTarget;

/// Outcome of a sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Members whose render target received the snapshot
    pub applied: usize,
    /// Live members skipped because they were inactive or disabled
    pub skipped_inactive: usize,
    /// Members whose render target is gone or was never assigned
    pub skipped_dead: usize,
}

impl SyncReport {
    pub fn visited(&self) -> usize {
        self.applied + self.skipped_inactive + self.skipped_dead
    }
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, rhs: Self) {
        self.applied += rhs.applied;
        self.skipped_inactive += rhs.skipped_inactive;
        self.skipped_dead += rhs.skipped_dead;
    }
}

/// Apply the store for `key` to every live, active member of that group.
///
/// Inactive and dead members are skipped but stay registered; they pick the
/// values up on their next apply.
#[tracing::instrument(level = "debug", skip_all, fields(group = key))]
pub fn apply_to_group(registry: &GroupRegistry, key: &str) -> SyncReport {
    let mut report = SyncReport::default();
    let Some(store) = registry.store(key) else {
        log::debug!("No property group '{}' to apply", key);
        return report;
    };

    let snapshot = store.snapshot();
    for &handle in registry.members(key) {
        match registry.member_target(handle) {
            None => report.skipped_dead += 1,
            Some(target) if !target.is_active_and_enabled() => report.skipped_inactive += 1,
            Some(target) => {
                target.apply_property_block(&snapshot);
                report.applied += 1;
            }
        }
    }

    log::trace!(
        "Applied group '{}' ({} props) to {} members, {} inactive, {} dead",
        key,
        snapshot.len(),
        report.applied,
        report.skipped_inactive,
        report.skipped_dead
    );
    report
}

/// Apply the store for `key` to a single render target, regardless of
/// membership. Returns false when the group has no store.
pub fn apply_to_target(registry: &GroupRegistry, key: &str, target: &dyn RenderTarget) -> bool {
    match registry.store(key) {
        Some(store) => {
            target.apply_property_block(&store.snapshot());
            true
        }
        None => false,
    }
}
