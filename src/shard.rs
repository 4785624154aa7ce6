//! Data-parallel digestion: split a sequence into overlapping shards, run an
//! independent digester per shard, and concatenate the outputs so the result
//! is exactly the single-pass emission stream.
//!
//! Shards are planned in k-mer space (modimizer) or window space
//! (window-minimizer and syncmer): every shard owns a contiguous range of
//! k-mers/windows and borrows just enough trailing bytes to finish the work
//! it owns. Non-first window-minimizer shards additionally digest one leading
//! window without emitting it, seeding the duplicate-collapse state with the
//! minimum the previous shard saw last.
//!
//! Equivalence with the single-pass stream holds whenever every k-mer in the
//! sequence hashes: always under [`BadCharPolicy::WriteOver`], and for
//! ACGT-only input under [`BadCharPolicy::SkipOver`]. With skipped bytes the
//! k-mers composing a window near a cut can start arbitrarily far left of it,
//! which no bounded overlap can recover; the functions still run in that
//! case, but the shard boundaries may perturb window composition.

use rayon::prelude::*;

use crate::digester::{BadCharPolicy, Digester, MinimizedHash, MIN_K};
use crate::error::{MinnowError, Result};
use crate::sliding_min::{AdaptiveMin, MinEntry, SlidingMin};

/// Contiguous near-even partition of `0..total` into `parts` ranges.
fn split_even(total: usize, parts: usize) -> Vec<(usize, usize)> {
    let base = total / parts;
    let extra = total % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut lo = 0;
    for i in 0..parts {
        let hi = lo + base + usize::from(i < extra);
        ranges.push((lo, hi));
        lo = hi;
    }
    ranges
}

fn validate(k: usize, shards: usize) -> Result<()> {
    if k < MIN_K {
        return Err(MinnowError::bad_construction(format!(
            "k must be at least {}, got {}",
            MIN_K, k
        )));
    }
    if shards == 0 {
        return Err(MinnowError::bad_construction(
            "shard count must be at least 1",
        ));
    }
    Ok(())
}

/// Modimizer over `seq` executed on up to `shards` parallel digesters;
/// returns exactly the single-pass position stream.
pub fn mod_minimizers_sharded(
    seq: &[u8],
    k: usize,
    modulus: u64,
    residue: u64,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<u32>> {
    mod_minimizers_sharded_with_hashes(seq, k, modulus, residue, minimized, policy, shards)
        .map(strip_hashes)
}

/// Like [`mod_minimizers_sharded`], reporting `(position, hash)` pairs.
pub fn mod_minimizers_sharded_with_hashes(
    seq: &[u8],
    k: usize,
    modulus: u64,
    residue: u64,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<(u32, u32)>> {
    validate(k, shards)?;
    if residue >= modulus {
        return Err(MinnowError::bad_mod(modulus, residue));
    }
    let n_kmers = seq.len().saturating_sub(k - 1);
    if n_kmers == 0 {
        return Ok(Vec::new());
    }
    let shards = shards.min(n_kmers);
    let ranges = split_even(n_kmers, shards);
    log::debug!(
        "modimizer: {} k-mers across {} shards (k={}, mod={})",
        n_kmers,
        shards,
        k,
        modulus
    );

    let per_shard: Vec<Vec<(u32, u32)>> = ranges
        .par_iter()
        .map(|&(lo, hi)| {
            let slice = &seq[lo..(hi + k - 1).min(seq.len())];
            let mut out = Vec::new();
            let mut dig = match Digester::new(slice, k, 0, minimized, policy) {
                Ok(dig) => dig,
                // ranges are non-empty and k-wide, so this cannot fire; stay
                // silent rather than panic inside the pool
                Err(_) => return out,
            };
            while dig.valid() {
                let pos = dig.pos();
                if pos + lo >= hi {
                    break;
                }
                let hash = dig.minimized_hash() as u32;
                if u64::from(hash) % modulus == residue {
                    out.push(((pos + lo) as u32, hash));
                }
                dig.roll_one();
            }
            out
        })
        .collect();

    Ok(per_shard.into_iter().flatten().collect())
}

/// Window-minimizer over `seq` executed on up to `shards` parallel
/// digesters; returns exactly the single-pass position stream (see the
/// module docs for the policy caveat).
pub fn window_minimizers_sharded(
    seq: &[u8],
    k: usize,
    w: usize,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<u32>> {
    window_minimizers_sharded_with_hashes(seq, k, w, minimized, policy, shards).map(strip_hashes)
}

/// Like [`window_minimizers_sharded`], reporting `(position, hash)` pairs.
pub fn window_minimizers_sharded_with_hashes(
    seq: &[u8],
    k: usize,
    w: usize,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<(u32, u32)>> {
    let ranges = plan_windows(seq.len(), k, w, shards)?;
    log::debug!(
        "window-minimizer: {} shards over {} windows (k={}, w={})",
        ranges.len(),
        ranges.last().map_or(0, |r| r.1),
        k,
        w
    );

    let per_shard: Vec<Vec<(u32, u32)>> = ranges
        .par_iter()
        .map(|&(lo, hi)| run_window_shard(seq, k, w, minimized, policy, lo, hi, Selection::Minimum))
        .collect();

    Ok(per_shard.into_iter().flatten().collect())
}

/// Syncmer over `seq` executed on up to `shards` parallel digesters; returns
/// exactly the single-pass position stream (see the module docs for the
/// policy caveat).
pub fn syncmers_sharded(
    seq: &[u8],
    k: usize,
    w: usize,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<u32>> {
    syncmers_sharded_with_hashes(seq, k, w, minimized, policy, shards).map(strip_hashes)
}

/// Like [`syncmers_sharded`], reporting `(position, hash)` pairs.
pub fn syncmers_sharded_with_hashes(
    seq: &[u8],
    k: usize,
    w: usize,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    shards: usize,
) -> Result<Vec<(u32, u32)>> {
    let ranges = plan_windows(seq.len(), k, w, shards)?;
    log::debug!(
        "syncmer: {} shards over {} windows (k={}, w={})",
        ranges.len(),
        ranges.last().map_or(0, |r| r.1),
        k,
        w
    );

    let per_shard: Vec<Vec<(u32, u32)>> = ranges
        .par_iter()
        .map(|&(lo, hi)| run_window_shard(seq, k, w, minimized, policy, lo, hi, Selection::Boundary))
        .collect();

    Ok(per_shard.into_iter().flatten().collect())
}

fn strip_hashes(pairs: Vec<(u32, u32)>) -> Vec<u32> {
    pairs.into_iter().map(|(pos, _)| pos).collect()
}

/// Partition the window index space `0..n_windows` into owned ranges.
fn plan_windows(len: usize, k: usize, w: usize, shards: usize) -> Result<Vec<(usize, usize)>> {
    validate(k, shards)?;
    if w == 0 {
        return Err(MinnowError::bad_construction(
            "window size must be at least 1",
        ));
    }
    let n_kmers = len.saturating_sub(k - 1);
    let n_windows = n_kmers.saturating_sub(w - 1);
    if n_windows == 0 {
        return Ok(Vec::new());
    }
    Ok(split_even(n_windows, shards.min(n_windows)))
}

enum Selection {
    /// Window-minimizer emission with duplicate collapse.
    Minimum,
    /// Syncmer emission (boundary minimum, no collapse).
    Boundary,
}

/// Digest the windows `[lo, hi)` of `seq` on a private digester.
///
/// The byte slice handed to the digester covers window `lo - 1` (for `lo >
/// 0`, the seed window) through the last byte of window `hi - 1`. Window
/// indices equal k-mer start positions on clean input, which is the domain
/// where shard equivalence is exact.
#[allow(clippy::too_many_arguments)]
fn run_window_shard(
    seq: &[u8],
    k: usize,
    w: usize,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    lo: usize,
    hi: usize,
    selection: Selection,
) -> Vec<(u32, u32)> {
    let seed_windows = usize::from(lo > 0);
    let byte_lo = lo - seed_windows;
    let byte_hi = (hi + w + k - 2).min(seq.len());
    let slice = &seq[byte_lo..byte_hi];

    let mut out = Vec::new();
    let mut dig = match Digester::new(slice, k, 0, minimized, policy) {
        Ok(dig) => dig,
        Err(_) => return out,
    };
    let mut queue = match AdaptiveMin::new(w) {
        Ok(queue) => queue,
        Err(_) => return out,
    };

    let windows_total = seed_windows + (hi - lo);
    let mut windows_done = 0usize;
    let mut last: Option<MinEntry> = None;

    while dig.valid() && windows_done < windows_total {
        let hash = dig.minimized_hash() as u32;
        queue.insert((dig.pos() + byte_lo) as u32, hash);
        if queue.len() == w {
            match selection {
                Selection::Minimum => {
                    if let Some(min) = queue.min() {
                        if last != Some(min) {
                            if windows_done >= seed_windows {
                                out.push((min.pos, min.hash));
                            }
                            last = Some(min);
                        }
                    }
                }
                Selection::Boundary => {
                    if let Some(b) = queue.boundary_min() {
                        if b.at_boundary && windows_done >= seed_windows {
                            out.push((b.start_pos, b.hash));
                        }
                    }
                }
            }
            windows_done += 1;
        }
        dig.roll_one();
    }
    out
}
