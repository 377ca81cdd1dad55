// src/registry.rs
//! Group registry
//! - Group key -> { shared PropertyStore, dense member list }
//! - Store and member list live in one record, so they are created and
//!   removed together
//! - Members are slot handles with a generation; the registry keeps only
//!   weak references to render targets

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{InstanceError, Result};
use crate::store::PropertyStore;
use crate::sync::{self, SyncReport};
use crate::target::RenderTarget;

/// Registry shared between members and external callers.
pub type SharedRegistry = Arc<RwLock<GroupRegistry>>;

// ---------- Group key ----------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub const DEFAULT: &'static str = "default";

    pub fn new(key: impl Into<String>) -> Self {
        GroupKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GroupKey {
    fn default() -> Self {
        GroupKey(Self::DEFAULT.to_string())
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey(s.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(s: String) -> Self {
        GroupKey(s)
    }
}

impl Borrow<str> for GroupKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------- Handle type ----------
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct MemberHandle {
    index: usize,
    gen: u32,
}

impl MemberHandle {
    fn new(index: usize, gen: u32) -> Self {
        MemberHandle { index, gen }
    }
    fn index(self) -> usize {
        self.index
    }
    fn gen(self) -> u32 {
        self.gen
    }
}

// ---------- Internal records ----------
struct MemberSlot {
    /// Never wraps: a slot whose generation is exhausted is retired
    generation: u32,
    record: Option<MemberRecord>,
}

struct MemberRecord {
    target: Option<Weak<dyn RenderTarget>>,
    /// Group this member is currently registered with
    group: Option<GroupKey>,
}

struct Group {
    store: PropertyStore,
    members: Vec<MemberHandle>,
}

// ---------- GroupRegistry ----------
pub struct GroupRegistry {
    groups: HashMap<GroupKey, Group>,
    slots: Vec<MemberSlot>,
    free: Vec<usize>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// New registry wrapped for sharing between members.
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    // ---------- Member slots ----------

    /// Allocate a member handle. The registry keeps only a weak reference to
    /// `target`; it never extends the renderer's lifetime.
    pub fn attach(&mut self, target: Option<&Arc<dyn RenderTarget>>) -> MemberHandle {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(MemberSlot {
                    generation: 0,
                    record: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.generation += 1;
        slot.record = Some(MemberRecord {
            target: target.map(Arc::downgrade),
            group: None,
        });
        MemberHandle::new(index, slot.generation)
    }

    /// Release a handle. Unregisters it first, which may tear its group down.
    pub fn detach(&mut self, handle: MemberHandle) -> Result<()> {
        if let Some(key) = self.record(handle)?.group.clone() {
            self.unregister_member(key.as_str(), handle)?;
        }
        let slot = &mut self.slots[handle.index()];
        slot.record = None;
        if slot.generation < u32::MAX {
            self.free.push(handle.index());
        } else {
            log::debug!("Retiring member slot {}", handle.index());
        }
        Ok(())
    }

    pub fn is_live(&self, handle: MemberHandle) -> bool {
        self.record(handle).is_ok()
    }

    /// Group the handle is currently registered with.
    pub fn key_of(&self, handle: MemberHandle) -> Option<&GroupKey> {
        self.record(handle).ok()?.group.as_ref()
    }

    /// Render target behind `handle`, if the handle is live and the target
    /// has not been dropped.
    pub fn member_target(&self, handle: MemberHandle) -> Option<Arc<dyn RenderTarget>> {
        self.record(handle).ok()?.target.as_ref()?.upgrade()
    }

    fn record(&self, handle: MemberHandle) -> Result<&MemberRecord> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.gen())
            .and_then(|s| s.record.as_ref())
            .ok_or(InstanceError::UnknownMember(handle))
    }

    fn record_mut(&mut self, handle: MemberHandle) -> Result<&mut MemberRecord> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.gen())
            .and_then(|s| s.record.as_mut())
            .ok_or(InstanceError::UnknownMember(handle))
    }

    // ---------- Stores ----------

    /// Store for `key`, created empty if absent. Idempotent.
    pub fn get_or_create_store(&mut self, key: &str) -> &mut PropertyStore {
        &mut self.group_entry(key).store
    }

    fn group_entry(&mut self, key: &str) -> &mut Group {
        self.groups.entry(GroupKey::from(key)).or_insert_with(|| {
            log::debug!("Created property group '{}'", key);
            Group {
                store: PropertyStore::new(),
                members: Vec::new(),
            }
        })
    }

    pub fn store(&self, key: &str) -> Option<&PropertyStore> {
        self.groups.get(key).map(|g| &g.store)
    }

    pub fn store_mut(&mut self, key: &str) -> Option<&mut PropertyStore> {
        self.groups.get_mut(key).map(|g| &mut g.store)
    }

    // ---------- Membership ----------

    /// Add `handle` to the group for `key`, creating the group if absent.
    ///
    /// No-op if already a member of `key`. A handle registered elsewhere is
    /// moved: a member belongs to at most one group at a time.
    pub fn register_member(&mut self, key: &str, handle: MemberHandle) -> Result<()> {
        match self.record(handle)?.group.clone() {
            Some(current) if current.as_str() == key => return Ok(()),
            Some(current) => {
                self.unregister_member(current.as_str(), handle)?;
            }
            None => {}
        }

        self.group_entry(key).members.push(handle);
        self.record_mut(handle)?.group = Some(GroupKey::from(key));
        log::trace!("Registered {:?} with group '{}'", handle, key);
        Ok(())
    }

    /// Remove `handle` from the group for `key`. When the group empties, its
    /// store goes with it. Returns whether the handle was a member.
    pub fn unregister_member(&mut self, key: &str, handle: MemberHandle) -> Result<bool> {
        let Some(group) = self.groups.get_mut(key) else {
            return Ok(false);
        };
        let Some(pos) = group.members.iter().position(|&h| h == handle) else {
            return Ok(false);
        };
        group.members.swap_remove(pos);
        let emptied = group.members.is_empty();

        if let Ok(record) = self.record_mut(handle) {
            if record.group.as_ref().map(|g| g.as_str()) == Some(key) {
                record.group = None;
            }
        }
        if emptied {
            self.groups.remove(key);
            log::debug!("Tore down property group '{}'", key);
        }
        Ok(true)
    }

    pub fn members(&self, key: &str) -> &[MemberHandle] {
        self.groups
            .get(key)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn member_count(&self, key: &str) -> usize {
        self.members(key).len()
    }

    pub fn contains_group(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    // ---------- Sync ----------

    /// Push the group's current values to every live, active member.
    pub fn apply_to_group(&self, key: &str) -> SyncReport {
        sync::apply_to_group(self, key)
    }

    /// Re-sync every group, e.g. after a batch of deferred writes.
    pub fn apply_all(&self) -> SyncReport {
        let mut total = SyncReport::default();
        for key in self.groups.keys() {
            total += sync::apply_to_group(self, key.as_str());
        }
        total
    }

    // ---------- Teardown ----------

    /// Drop stores that were created ahead of membership and never gained a
    /// member. Returns how many were removed.
    pub fn prune_unused(&mut self) -> usize {
        let before = self.groups.len();
        self.groups.retain(|_, g| !g.members.is_empty());
        before - self.groups.len()
    }

    /// Drop every group. Member handles stay valid but belong to no group.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if let Some(record) = slot.record.as_mut() {
                record.group = None;
            }
        }
        log::debug!("Cleared {} property groups", self.groups.len());
        self.groups.clear();
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTarget;

    #[test]
    fn store_lifecycle_follows_membership() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        let b = reg.attach(None);

        reg.register_member("fx", a).unwrap();
        reg.register_member("fx", b).unwrap();
        assert_eq!(reg.group_count(), 1);
        assert_eq!(reg.member_count("fx"), 2);

        assert!(reg.unregister_member("fx", a).unwrap());
        assert!(reg.store("fx").is_some());

        assert!(reg.unregister_member("fx", b).unwrap());
        assert!(reg.store("fx").is_none());
        assert!(!reg.contains_group("fx"));
        assert_eq!(reg.group_count(), 0);
    }

    #[test]
    fn get_or_create_store_is_idempotent() {
        let mut reg = GroupRegistry::new();
        reg.get_or_create_store("fx").set("_FillAmount", 0.5f32).unwrap();
        reg.get_or_create_store("fx");
        assert_eq!(reg.group_count(), 1);
        assert_eq!(reg.store("fx").unwrap().get_float("_FillAmount").unwrap(), 0.5);
    }

    #[test]
    fn registering_twice_is_a_no_op() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        reg.register_member("fx", a).unwrap();
        reg.register_member("fx", a).unwrap();
        assert_eq!(reg.member_count("fx"), 1);
    }

    #[test]
    fn registering_elsewhere_moves_the_member() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        reg.register_member("old", a).unwrap();
        reg.register_member("new", a).unwrap();

        assert!(!reg.contains_group("old"));
        assert_eq!(reg.members("new"), &[a]);
        assert_eq!(reg.key_of(a).map(GroupKey::as_str), Some("new"));
    }

    #[test]
    fn unregistering_a_non_member_changes_nothing() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        let b = reg.attach(None);
        reg.register_member("fx", a).unwrap();

        assert!(!reg.unregister_member("fx", b).unwrap());
        assert!(!reg.unregister_member("missing", a).unwrap());
        assert_eq!(reg.member_count("fx"), 1);
    }

    #[test]
    fn detach_invalidates_handle_and_reuses_slot() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        reg.register_member("fx", a).unwrap();
        reg.detach(a).unwrap();

        assert!(!reg.is_live(a));
        assert!(!reg.contains_group("fx"));
        assert!(matches!(
            reg.register_member("fx", a),
            Err(InstanceError::UnknownMember(_))
        ));

        let b = reg.attach(None);
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert!(reg.is_live(b));
    }

    #[test]
    fn exhausted_slots_are_retired() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        reg.detach(a).unwrap();
        reg.slots[a.index()].generation = u32::MAX - 1;

        let last = reg.attach(None);
        assert_eq!(last.index(), a.index());
        assert_eq!(last.gen(), u32::MAX);
        reg.detach(last).unwrap();

        let fresh = reg.attach(None);
        assert_ne!(fresh.index(), a.index());
        assert!(!reg.is_live(last));
        assert!(reg.is_live(fresh));
    }

    #[test]
    fn dropped_targets_are_not_resolved() {
        let mut reg = GroupRegistry::new();
        let target = RecordingTarget::new();
        let dyn_target: Arc<dyn RenderTarget> = target.clone();
        let h = reg.attach(Some(&dyn_target));
        assert!(reg.member_target(h).is_some());

        drop(dyn_target);
        drop(target);
        assert!(reg.member_target(h).is_none());
        assert!(reg.is_live(h));
    }

    #[test]
    fn prune_and_clear() {
        let mut reg = GroupRegistry::new();
        let a = reg.attach(None);
        reg.get_or_create_store("pending");
        reg.register_member("fx", a).unwrap();

        assert_eq!(reg.prune_unused(), 1);
        assert!(reg.contains_group("fx"));

        reg.clear();
        assert_eq!(reg.group_count(), 0);
        assert!(reg.key_of(a).is_none());
        assert!(reg.is_live(a));
    }

    #[test]
    fn default_key_is_default() {
        assert_eq!(GroupKey::default().as_str(), "default");
    }
}
