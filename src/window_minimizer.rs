//! Window-minimizer selection: the smallest k-mer of every window of `w`
//! consecutive k-mers, with consecutive duplicates collapsed.

use crate::digester::{BadCharPolicy, Digester, MinimizedHash};
use crate::error::{MinnowError, Result};
use crate::sliding_min::{AdaptiveMin, MinEntry, SlidingMin};
use crate::Emit;

/// Selects, for every window of `w` consecutive k-mers, the one with the
/// smallest hash (ties to the most recent), emitting each chosen `(pos,
/// hash)` once even when adjacent windows agree on it.
///
/// Generic over the window buffer so callers can pin a compile-time-sized
/// structure; [`WindowMinimizer::new`] picks [`AdaptiveMin`] sized at
/// runtime.
#[derive(Debug, Clone)]
pub struct WindowMinimizer<'s, Q: SlidingMin = AdaptiveMin> {
    digester: Digester<'s>,
    queue: Q,
    /// Last emitted entry; `None` until the first window minimum goes out.
    last: Option<MinEntry>,
}

impl<'s> WindowMinimizer<'s, AdaptiveMin> {
    /// Build a window-minimizer with a runtime-sized buffer for windows of
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

impl<'s, Q: SlidingMin> WindowMinimizer<'s, Q> {
    /// Build a window-minimizer around a caller-supplied window buffer; the
    /// window size is the buffer's.
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
        Ok(WindowMinimizer {
            digester: Digester::new(seq, k, start, minimized, policy)?,
            queue,
            last: None,
        })
    }

    /// Number of k-mers per window.
    pub fn window(&self) -> usize {
        self.queue.window()
    }

    /// Roll forward, appending window minima to `out` until it holds
    /// `amount` entries or the stream ends. Selection state survives across
    /// calls and across [`append_seq`](Self::append_seq).
    pub fn roll_minimizer(&mut self, amount: usize, out: &mut impl Emit) {
        let w = self.queue.window();
        while out.len() < amount && self.digester.valid() {
            let hash = self.digester.minimized_hash() as u32;
            self.queue.insert(self.digester.pos() as u32, hash);
            if self.queue.len() == w {
                if let Some(min) = self.queue.min() {
                    if self.last != Some(min) {
                        out.push(min.pos, min.hash);
                        self.last = Some(min);
                    }
                }
            }
            self.digester.roll_one();
        }
    }

    /// Replace the bound sequence and clear all selection state.
    pub fn new_seq(&mut self, seq: &'s [u8], start: usize) -> Result<()> {
        self.queue.reset();
        self.last = None;
        self.digester.new_seq(seq, start)
    }

    /// Logically append to the bound sequence. The window buffer and the
    /// duplicate-collapse state carry over, so windows straddling the
    /// boundary behave as on one contiguous sequence.
    pub fn append_seq(&mut self, seq: &'s [u8]) -> Result<()> {
        self.digester.append_seq(seq)
    }

    /// The underlying digester.
    pub fn digester(&self) -> &Digester<'s> {
        &self.digester
    }
}
