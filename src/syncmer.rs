//! Syncmer selection: windows whose smallest k-mer hash sits at either end.

use crate::digester::{BadCharPolicy, Digester, MinimizedHash};
use crate::error::{MinnowError, Result};
use crate::sliding_min::{AdaptiveMin, SlidingMin};
use crate::Emit;

/// Selects every window of `w` consecutive k-mers whose minimum hash value
/// occurs at the window's first or last k-mer, emitting the window's start
/// position together with that minimum value.
///
/// The comparison is by hash value, so a window whose minimum is achieved at
/// both ends is emitted once. Unlike the window-minimizer there is no
/// duplicate collapse; distinct windows are distinct emissions (their start
/// positions strictly increase).
#[derive(Debug, Clone)]
pub struct Syncmer<'s, Q: SlidingMin = AdaptiveMin> {
    digester: Digester<'s>,
    queue: Q,
}

impl<'s> Syncmer<'s, AdaptiveMin> {
    /// Build a syncmer selector with a runtime-sized buffer for windows of
    /// `w` k-mers.
    pub fn new(
        seq: &'s [u8],
        k: usize,
        w: usize,
        start: usize,
        minimized: MinimizedHash,
        policy: BadCharPolicy,
    ) -> Result<Self> {
        Self::with_queue(seq, k, AdaptiveMin::new(w)?, start, minimized, policy)
    }
}

impl<'s, Q: SlidingMin> Syncmer<'s, Q> {
    /// Build a syncmer selector around a caller-supplied window buffer.
    pub fn with_queue(
        seq: &'s [u8],
        k: usize,
        queue: Q,
        start: usize,
        minimized: MinimizedHash,
        policy: BadCharPolicy,
    ) -> Result<Self> {
        if queue.window() == 0 {
            return Err(MinnowError::bad_construction(
                "window size must be at least 1",
            ));
        }
        Ok(Syncmer {
            digester: Digester::new(seq, k, start, minimized, policy)?,
            queue,
        })
    }

    /// Number of k-mers per window.
    pub fn window(&self) -> usize {
        self.queue.window()
    }

    /// Roll forward, appending syncmer windows to `out` until it holds
    /// `amount` entries or the stream ends.
    pub fn roll_minimizer(&mut self, amount: usize, out: &mut impl Emit) {
        let w = self.queue.window();
        while out.len() < amount && self.digester.valid() {
            let hash = self.digester.minimized_hash() as u32;
            self.queue.insert(self.digester.pos() as u32, hash);
            if self.queue.len() == w {
                if let Some(b) = self.queue.boundary_min() {
                    if b.at_boundary {
                        out.push(b.start_pos, b.hash);
                    }
                }
            }
            self.digester.roll_one();
        }
    }

    /// Replace the bound sequence and clear the window buffer.
    pub fn new_seq(&mut self, seq: &'s [u8], start: usize) -> Result<()> {
        self.queue.reset();
        self.digester.new_seq(seq, start)
    }

    /// Logically append to the bound sequence; windows straddling the
    /// boundary behave as on one contiguous sequence.
    pub fn append_seq(&mut self, seq: &'s [u8]) -> Result<()> {
        self.digester.append_seq(seq)
    }

    /// The underlying digester.
    pub fn digester(&self) -> &Digester<'s> {
        &self.digester
    }
}
