//! minnow: a streaming DNA k-mer minimizer engine.
//!
//! A [`Digester`] rolls a 64-bit ntHash (forward, reverse-complement, and
//! canonical) across a borrowed nucleotide sequence one base at a time,
//! handling non-ACGT bytes under a skip or rewrite policy and stitching
//! k-mers across [`Digester::append_seq`] boundaries. On top of it sit three
//! selection schemes that thin the k-mer stream to a representative subset:
//!
//! - [`Modimizer`]: k-mers whose hash lands in a residue class
//! - [`WindowMinimizer`]: the smallest k-mer of every window of `w` k-mers,
//!   consecutive duplicates collapsed
//! - [`Syncmer`]: windows whose smallest k-mer sits at either end
//!
//! The window-backed selectors run over a pluggable sliding-minimum
//! structure (see [`SlidingMin`]); the sharding functions
//! ([`window_minimizers_sharded`] and friends) split a sequence into
//! overlapping shards and digest them on a rayon pool without changing the
//! emission stream; [`c_api`] exposes one C call per scheme for scripting
//! bindings.
//!
//! Positions are 32-bit coordinates on the concatenation of every appended
//! sequence, and reported hashes are the low 32 bits of the selected 64-bit
//! hash.
//!
//! ```
//! use minnow::{BadCharPolicy, MinimizedHash, WindowMinimizer};
//!
//! let seq = b"CCGTGTCCGTGTACGTATTGCACCGTAACGTT";
//! let mut digest = WindowMinimizer::new(
//!     seq,
//!     4,
//!     8,
//!     0,
//!     MinimizedHash::Canonical,
//!     BadCharPolicy::SkipOver,
//! )
//! .unwrap();
//!
//! let mut positions: Vec<u32> = Vec::new();
//! digest.roll_minimizer(usize::MAX, &mut positions);
//! // positions now holds one representative k-mer per window of 8
//! ```

// Expose the C-API module
pub mod c_api;

pub mod logging;
pub mod nthash;

mod digester;
mod error;
mod modimizer;
mod shard;
mod sliding_min;
mod syncmer;
mod window_minimizer;

pub use digester::{is_acgt, BadCharPolicy, Digester, MinimizedHash, MIN_K};
pub use error::{MinnowError, Result};
pub use modimizer::Modimizer;
pub use shard::{
    mod_minimizers_sharded, mod_minimizers_sharded_with_hashes, syncmers_sharded,
    syncmers_sharded_with_hashes, window_minimizers_sharded,
    window_minimizers_sharded_with_hashes,
};
pub use sliding_min::{
    AdaptiveMin, BoundaryMin, MinEntry, ScanMin, SegmentTreeMin, SlidingMin, TrackedScanMin,
    ADAPTIVE_SCAN_MAX,
};
pub use syncmer::Syncmer;
pub use window_minimizer::WindowMinimizer;

// --- CONSTANTS ---

/// Default k-mer size for the scripting surface.
pub const DEFAULT_K: usize = 31;

/// Default window size (in k-mers) for the scripting surface.
pub const DEFAULT_WINDOW: usize = 11;

/// Default modimizer modulus for the scripting surface.
pub const DEFAULT_MOD: u64 = 100;

/// Longest sequence the engine addresses: positions are reported as u32 on
/// the concatenated coordinate, so the total digested length must stay below
/// this.
pub const MAX_SEQUENCE_LENGTH: usize = u32::MAX as usize;

// --- OUTPUT SINKS ---

/// Output sink for the selection layer.
///
/// Selectors append `(position, hash)` entries until the sink reports the
/// requested amount. `Vec<u32>` collects positions only; `Vec<(u32, u32)>`
/// keeps the low-32-bit hash alongside each position.
pub trait Emit {
    fn push(&mut self, pos: u32, hash: u32);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emit for Vec<u32> {
    #[inline]
    fn push(&mut self, pos: u32, _hash: u32) {
        Vec::push(self, pos);
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl Emit for Vec<(u32, u32)> {
    #[inline]
    fn push(&mut self, pos: u32, hash: u32) {
        Vec::push(self, (pos, hash));
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}
