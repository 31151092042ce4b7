use std::sync::atomic::{AtomicU32, Ordering};

/// Allocator for outbound sequence numbers.
///
/// Starts at 1 and increases by one per request. Wraparound is permitted
/// and skips 0, which is reserved for the generic_nack replies the session
/// sends for malformed input.
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU32,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// The next sequence number.
    pub fn next(&self) -> u32 {
        loop {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            if n != 0 {
                return n;
            }
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
