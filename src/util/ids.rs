//! Monotonic per-persistence snapshot-ID allocator.
//!
//! IDs follow the scheme `"{node_id}:{seq}"` for node snapshots and
//! `"end:{seq}"` for end snapshots, where `seq` is a counter starting at 1
//! and incremented on every allocation. The node kind embedded in the ID
//! makes it readable and usable as a resume cursor.

/// Allocates snapshot IDs for a single persistence instance.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next_seq: u64,
}

impl IdAllocator {
    /// Creates a fresh allocator whose first allocation is sequence 1.
    pub fn new() -> Self {
        Self { next_seq: 1 }
    }

    /// Allocates the next node-snapshot ID, `"{node_id}:{seq}"`.
    pub fn alloc_node_id(&mut self, node_id: &str) -> String {
        let seq = self.take_seq();
        format!("{node_id}:{seq}")
    }

    /// Allocates the next end-snapshot ID, `"end:{seq}"`.
    pub fn alloc_end_id(&mut self) -> String {
        let seq = self.take_seq();
        format!("end:{seq}")
    }

    /// Advances the counter so the next allocation exceeds `seq`, without
    /// ever moving it backward. Used when loading a history document to
    /// avoid colliding with IDs already present in the document.
    pub fn bump_past(&mut self, seq: u64) {
        if seq >= self.next_seq {
            self.next_seq = seq + 1;
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Extracts the trailing `seq` component of a snapshot ID such as
/// `"Foo:12"` or `"end:3"`. Returns `None` for malformed IDs.
pub fn parse_seq(id: &str) -> Option<u64> {
    id.rsplit(':').next()?.parse().ok()
}
