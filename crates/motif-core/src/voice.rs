//! Scheduled voice bookkeeping.
//!
//! Every voice the scheduler issues is tracked in a [`VoiceArena`] slot
//! until it is reaped or cancelled. Slots are recycled, but each carries an
//! epoch that is bumped on removal, so a [`VoiceHandle`] from an earlier
//! occupant never resolves to a later one.

use crate::device::NodeId;
use crate::note::Waveform;
use std::fmt;

/// Identifies one call to the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u64);

impl PassId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass#{}", self.0)
    }
}

/// A note event bound to a device source and absolute clock times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledVoice {
    pub pass: PassId,
    /// Index of the originating event in its pattern.
    pub event_index: usize,
    pub waveform: Waveform,
    pub source: NodeId,
    /// Device clock seconds.
    pub start: f64,
    /// Device clock seconds.
    pub stop: f64,
}

/// Epoch-checked reference to an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    slot: u32,
    epoch: u32,
}

impl VoiceHandle {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

#[derive(Debug, Default)]
struct Slot {
    epoch: u32,
    voice: Option<ScheduledVoice>,
}

/// Slot storage for live voices.
#[derive(Debug, Default)]
pub struct VoiceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl VoiceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, voice: ScheduledVoice) -> VoiceHandle {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.voice = Some(voice);
            return VoiceHandle {
                slot,
                epoch: entry.epoch,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            epoch: 0,
            voice: Some(voice),
        });
        VoiceHandle { slot, epoch: 0 }
    }

    /// Resolve a handle. Stale handles resolve to `None`.
    pub fn get(&self, handle: VoiceHandle) -> Option<&ScheduledVoice> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.epoch == handle.epoch)
            .and_then(|s| s.voice.as_ref())
    }

    pub fn contains(&self, handle: VoiceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Free a slot and invalidate every handle to it.
    pub fn remove(&mut self, handle: VoiceHandle) -> Option<ScheduledVoice> {
        let entry = self.slots.get_mut(handle.slot as usize)?;
        if entry.epoch != handle.epoch {
            return None;
        }
        let voice = entry.voice.take()?;
        entry.epoch = entry.epoch.wrapping_add(1);
        self.free.push(handle.slot);
        self.live -= 1;
        Some(voice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoiceHandle, &ScheduledVoice)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.voice.as_ref().map(|v| {
                (
                    VoiceHandle {
                        slot: i as u32,
                        epoch: s.epoch,
                    },
                    v,
                )
            })
        })
    }

    /// Handles of live voices matching `pred`.
    pub fn handles_where(&self, mut pred: impl FnMut(&ScheduledVoice) -> bool) -> Vec<VoiceHandle> {
        self.iter()
            .filter(|(_, v)| pred(v))
            .map(|(h, _)| h)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
