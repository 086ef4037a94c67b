#![forbid(unsafe_code)]

//! Tile registry: an arena of mounted tile handles keyed by [`TileId`].
//!
//! Mounting a tile is [`TileRegistry::register`]; unmounting is
//! [`TileRegistry::unregister`], which calls [`TileHandle::unmount`] before
//! handing the handle back, so no countdown or tween survives removal.
//!
//! Every registration is stamped with a fresh [`MountEpoch`]. Deferred
//! commands remember the epoch they were planned against and resolve through
//! [`TileRegistry::get_current_mut`], so a command aimed at a tile that was
//! unmounted (or unmounted and remounted under the same id) finds nothing.
//!
//! Iteration is in id order, which keeps seeded cascades reproducible.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::layout::TileId;
use crate::tile::{Face, TileHandle};

/// Generation stamp of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountEpoch(u64);

#[derive(Debug)]
struct Slot<H> {
    epoch: MountEpoch,
    handle: H,
}

/// Arena of mounted tile handles, one per grid instance.
#[derive(Debug)]
pub struct TileRegistry<H> {
    slots: BTreeMap<TileId, Slot<H>>,
    next_epoch: u64,
}

impl<H> Default for TileRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> TileRegistry<H> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            next_epoch: 0,
        }
    }

    /// Number of mounted tiles.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no tile is mounted.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` is mounted.
    pub fn contains(&self, id: TileId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Epoch of the current registration of `id`.
    pub fn epoch(&self, id: TileId) -> Option<MountEpoch> {
        self.slots.get(&id).map(|slot| slot.epoch)
    }

    /// Handle for `id`.
    pub fn get(&self, id: TileId) -> Option<&H> {
        self.slots.get(&id).map(|slot| &slot.handle)
    }

    /// Mutable handle for `id`.
    pub fn get_mut(&mut self, id: TileId) -> Option<&mut H> {
        self.slots.get_mut(&id).map(|slot| &mut slot.handle)
    }

    /// Mutable handle for `id`, only if it is still the registration
    /// stamped `epoch`.
    pub fn get_current_mut(&mut self, id: TileId, epoch: MountEpoch) -> Option<&mut H> {
        self.slots
            .get_mut(&id)
            .filter(|slot| slot.epoch == epoch)
            .map(|slot| &mut slot.handle)
    }

    /// Mounted ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.slots.keys().copied()
    }

    /// Mounted handles in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &H)> {
        self.slots.iter().map(|(id, slot)| (*id, &slot.handle))
    }

    /// Mutable handles in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TileId, &mut H)> {
        self.slots.iter_mut().map(|(id, slot)| (*id, &mut slot.handle))
    }

    /// Every `(id, epoch)` pair mounted right now, in id order.
    pub fn snapshot(&self) -> Vec<(TileId, MountEpoch)> {
        self.slots.iter().map(|(id, slot)| (*id, slot.epoch)).collect()
    }
}

impl<H: TileHandle> TileRegistry<H> {
    /// Mount `handle` under `id`.
    ///
    /// An existing registration under the same id is unmounted and dropped
    /// first, so keys stay unique.
    pub fn register(&mut self, id: TileId, handle: H) -> MountEpoch {
        let epoch = MountEpoch(self.next_epoch);
        self.next_epoch += 1;
        if let Some(mut previous) = self.slots.insert(id, Slot { epoch, handle }) {
            previous.handle.unmount();
        }
        tilecascade_core::trace!(tile = id.0, "tile registered");
        epoch
    }

    /// Unmount `id`. Repeated calls return `None`.
    pub fn unregister(&mut self, id: TileId) -> Option<H> {
        let mut slot = self.slots.remove(&id)?;
        slot.handle.unmount();
        tilecascade_core::trace!(tile = id.0, "tile unregistered");
        Some(slot.handle)
    }

    /// Unmount every tile.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.handle.unmount();
        }
        self.slots.clear();
    }

    /// Advance every mounted tile's own timers by `dt`.
    pub fn advance_all(&mut self, dt: Duration) {
        if dt.is_zero() {
            return;
        }
        for slot in self.slots.values_mut() {
            slot.handle.advance(dt);
        }
    }

    /// Send every tile currently showing its back to the front, without
    /// jitter. Tiles already showing front are not touched.
    ///
    /// Returns how many tiles were commanded.
    pub fn flip_all_to_front(&mut self) -> usize {
        let mut commanded = 0;
        for slot in self.slots.values_mut() {
            if slot.handle.visible_face() == Face::Back {
                slot.handle.flip(Some(Face::Front), None);
                commanded += 1;
            }
        }
        commanded
    }
}
