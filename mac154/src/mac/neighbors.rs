//! Per-neighbor transmit queue accounting.
//!
//! The MAC does not own neighbor storage; the upper layer does. What the
//! TSCH link selector needs from it is a queue depth per neighbor, so
//! that contended slots go to the fullest queue. The depth counters are
//! approximate by design: producers bump them outside the context lock.

use core::sync::atomic::{AtomicUsize, Ordering};

use mac154_frame::Address;

/// The transmit queue interface the TSCH state machine drains.
pub trait TxQueue {
    /// Take the next frame queued for `neighbor`, if any.
    fn dequeue(&mut self, neighbor: &Address) -> Option<crate::phy::FrameBuffer>;

    /// The approximate number of frames queued for `neighbor`.
    fn queued(&self, neighbor: &Address) -> usize;
}

struct NeighborEntry {
    address: Address,
    queued: AtomicUsize,
}

/// Approximate per-neighbor queue depth counters.
pub struct NeighborTable<const N: usize> {
    entries: heapless::Vec<NeighborEntry, N>,
}

impl<const N: usize> NeighborTable<N> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Record one frame queued for `address`. Unknown neighbors are
    /// added; when the table is full the frame simply goes unaccounted,
    /// which only weakens slot prioritization.
    pub fn packet_queued(&mut self, address: Address) {
        match self.entries.iter().find(|e| e.address == address) {
            Some(entry) => {
                entry.queued.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                let _ = self.entries.push(NeighborEntry {
                    address,
                    queued: AtomicUsize::new(1),
                });
            }
        }
    }

    /// Record one frame dequeued for `address`.
    pub fn packet_dequeued(&self, address: &Address) {
        if let Some(entry) = self.entries.iter().find(|e| e.address == *address) {
            let _ = entry
                .queued
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
        }
    }

    /// The approximate queue depth for `address`.
    pub fn queue_depth(&self, address: &Address) -> usize {
        self.entries
            .iter()
            .find(|e| e.address == *address)
            .map(|e| e.queued.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl<const N: usize> Default for NeighborTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
