//! Rolling k-mer digestion over borrowed nucleotide sequences.
//!
//! A [`Digester`] walks a byte slice one base at a time, maintaining the
//! forward, reverse-complement, and canonical ntHash of the current k-mer.
//! Sequences can be swapped out ([`Digester::new_seq`]) or logically
//! concatenated ([`Digester::append_seq`]); in the latter case a small carry
//! buffer keeps the k-mer that straddles the boundary rolling as if the two
//! sequences had been one allocation, and reported positions stay on a single
//! concatenated coordinate.
//!
//! Non-ACGT bytes are handled by one of two policies chosen at construction:
//! skip every k-mer that touches one, or pretend the byte was an `A`.

use std::collections::VecDeque;

use crate::error::{MinnowError, Result};
use crate::nthash::{
    base_forward_hash, base_reverse_hash, canonical, next_forward_hash, next_reverse_hash,
};

/// Smallest supported k-mer size.
pub const MIN_K: usize = 4;

const ACGT_LUT: [bool; 256] = {
    let mut lut = [false; 256];
    lut[b'A' as usize] = true;
    lut[b'a' as usize] = true;
    lut[b'C' as usize] = true;
    lut[b'c' as usize] = true;
    lut[b'G' as usize] = true;
    lut[b'g' as usize] = true;
    lut[b'T' as usize] = true;
    lut[b't' as usize] = true;
    lut
};

/// True if the byte is an upper- or lowercase A, C, G, or T.
#[inline(always)]
pub fn is_acgt(byte: u8) -> bool {
    ACGT_LUT[byte as usize]
}

/// Which of the three hashes the selection layer minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizedHash {
    /// min(forward, reverse-complement); strand-agnostic
    Canonical,
    Forward,
    Reverse,
}

/// Behavior on non-ACGT bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadCharPolicy {
    /// Skip every k-mer containing a non-ACGT byte.
    SkipOver,
    /// Treat every non-ACGT byte as an `A`.
    WriteOver,
}

/// Rolling k-mer scanner bound to a borrowed sequence.
///
/// The sequence is borrowed, not copied; the caller keeps it alive until the
/// next [`new_seq`](Digester::new_seq)/[`append_seq`](Digester::append_seq)
/// or drop. Cloning a digester yields an independent scanner that continues
/// with an identical stream.
#[derive(Debug, Clone)]
pub struct Digester<'s> {
    seq: &'s [u8],
    /// Combined length of all previously appended sequences.
    offset: usize,
    /// Index of the next byte to be rolled out; junk while the carry is
    /// non-empty (the carry front rolls out instead).
    start: usize,
    /// Index of the next byte to be rolled in.
    end: usize,
    fhash: u64,
    rhash: u64,
    chash: u64,
    k: usize,
    /// Bytes of the previous sequence still participating in the current
    /// k-mer, oldest first. Holds at most k-1 bytes except directly after a
    /// successful append stitch, where it briefly holds the full k-mer.
    carry: VecDeque<u8>,
    minimized: MinimizedHash,
    policy: BadCharPolicy,
    valid: bool,
}

impl<'s> Digester<'s> {
    /// Create a digester over `seq`, hashing k-mers from byte `start` on.
    ///
    /// Fails with [`MinnowError::BadConstruction`] if `k < MIN_K` or `start`
    /// is past the end of the sequence. A sequence too short (or too dirty)
    /// to contain any k-mer is not an error; the digester just starts out
    /// with `valid() == false`.
    pub fn new(
        seq: &'s [u8],
        k: usize,
        start: usize,
        minimized: MinimizedHash,
        policy: BadCharPolicy,
    ) -> Result<Self> {
        if k < MIN_K {
            return Err(MinnowError::bad_construction(format!(
                "k must be at least {}, got {}",
                MIN_K, k
            )));
        }
        if start >= seq.len() {
            return Err(MinnowError::bad_construction(format!(
                "start {} is past the end of a {}-byte sequence",
                start,
                seq.len()
            )));
        }
        let mut dig = Digester {
            seq,
            offset: 0,
            start,
            end: start + k,
            fhash: 0,
            rhash: 0,
            chash: 0,
            k,
            carry: VecDeque::with_capacity(k),
            minimized,
            policy,
            valid: false,
        };
        dig.init_hash();
        Ok(dig)
    }

    /// Position of the first base of the current k-mer on the concatenated
    /// coordinate spanning every appended sequence.
    #[inline]
    pub fn pos(&self) -> usize {
        self.offset + self.start - self.carry.len()
    }

    /// True iff the three hashes describe the k-mer at [`pos`](Digester::pos).
    #[inline]
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Forward-strand hash of the current k-mer.
    #[inline]
    pub fn fhash(&self) -> u64 {
        self.fhash
    }

    /// Reverse-complement-strand hash of the current k-mer.
    #[inline]
    pub fn rhash(&self) -> u64 {
        self.rhash
    }

    /// Canonical hash of the current k-mer.
    #[inline]
    pub fn chash(&self) -> u64 {
        self.chash
    }

    /// The hash selected by the `minimized` construction parameter; this is
    /// the value the selection layer feeds to its window structures.
    #[inline]
    pub fn minimized_hash(&self) -> u64 {
        match self.minimized {
            MinimizedHash::Canonical => self.chash,
            MinimizedHash::Forward => self.fhash,
            MinimizedHash::Reverse => self.rhash,
        }
    }

    /// K-mer size.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Length of the currently bound sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// The currently bound sequence.
    #[inline]
    pub fn sequence(&self) -> &'s [u8] {
        self.seq
    }

    /// Which hash the selection layer minimizes.
    #[inline]
    pub fn minimized(&self) -> MinimizedHash {
        self.minimized
    }

    /// The non-ACGT policy chosen at construction.
    #[inline]
    pub fn policy(&self) -> BadCharPolicy {
        self.policy
    }

    /// Advance to the next k-mer. Returns whether a valid hash was produced.
    ///
    /// Returning `false` means the stream ran out (or, under
    /// [`BadCharPolicy::SkipOver`], no further clean window exists); it is
    /// not an error.
    pub fn roll_one(&mut self) -> bool {
        match self.policy {
            BadCharPolicy::SkipOver => self.roll_one_skip_over(),
            BadCharPolicy::WriteOver => self.roll_one_write_over(),
        }
    }

    /// Replace the bound sequence and start over at `start`, discarding the
    /// carry and resetting the concatenated coordinate to zero.
    pub fn new_seq(&mut self, seq: &'s [u8], start: usize) -> Result<()> {
        if start >= seq.len() {
            return Err(MinnowError::bad_construction(format!(
                "start {} is past the end of a {}-byte sequence",
                start,
                seq.len()
            )));
        }
        self.seq = seq;
        self.offset = 0;
        self.start = start;
        self.end = start + self.k;
        self.valid = false;
        self.init_hash();
        Ok(())
    }

    /// Logically append `seq` to the current sequence.
    ///
    /// The old sequence is dropped; up to k-1 of its trailing bytes move into
    /// the carry so the k-mers straddling the boundary hash exactly as if the
    /// two sequences had been contiguous. Only legal once the current
    /// sequence has been rolled to its end; otherwise
    /// [`MinnowError::NotRolledTillEnd`].
    pub fn append_seq(&mut self, seq: &'s [u8]) -> Result<()> {
        if self.end < self.seq.len() {
            return Err(MinnowError::not_rolled_till_end(self.end, self.seq.len()));
        }
        log::debug!(
            "appending {} bytes after {} consumed",
            seq.len(),
            self.offset + self.seq.len()
        );
        self.stitch(seq);
        Ok(())
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    #[inline]
    fn set_hashes_from(&mut self, window: &[u8]) {
        self.fhash = base_forward_hash(window);
        self.rhash = base_reverse_hash(window);
        self.chash = canonical(self.fhash, self.rhash);
        self.valid = true;
    }

    /// Find the first hashable window at or after `start` and compute its
    /// hashes. Clears the carry. Leaves `valid` reflecting the outcome.
    fn init_hash(&mut self) -> bool {
        self.carry.clear();
        match self.policy {
            BadCharPolicy::SkipOver => self.init_hash_skip_over(),
            BadCharPolicy::WriteOver => self.init_hash_write_over(),
        }
    }

    fn init_hash_skip_over(&mut self) -> bool {
        let seq = self.seq;
        'scan: while self.end <= seq.len() {
            for i in self.start..self.end {
                if !is_acgt(seq[i]) {
                    self.start = i + 1;
                    self.end = self.start + self.k;
                    continue 'scan;
                }
            }
            let window = &seq[self.start..self.end];
            self.fhash = base_forward_hash(window);
            self.rhash = base_reverse_hash(window);
            self.chash = canonical(self.fhash, self.rhash);
            self.valid = true;
            return true;
        }
        self.valid = false;
        false
    }

    fn init_hash_write_over(&mut self) -> bool {
        if self.end <= self.seq.len() {
            let window: Vec<u8> = self.seq[self.start..self.end]
                .iter()
                .map(|&b| if is_acgt(b) { b } else { b'A' })
                .collect();
            self.set_hashes_from(&window);
            return true;
        }
        self.valid = false;
        false
    }

    fn roll_one_skip_over(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if self.end >= self.seq.len() {
            self.valid = false;
            return false;
        }
        let incoming = self.seq[self.end];
        if let Some(&outgoing) = self.carry.front() {
            if is_acgt(incoming) {
                self.fhash = next_forward_hash(self.fhash, self.k, outgoing, incoming);
                self.rhash = next_reverse_hash(self.rhash, self.k, outgoing, incoming);
                self.carry.pop_front();
                self.end += 1;
                self.chash = canonical(self.fhash, self.rhash);
                true
            } else {
                // the carry only ever feeds bytes before `end`; once we jump
                // past the bad byte none of it can reach a window again
                self.carry.clear();
                self.start = self.end + 1;
                self.end = self.start + self.k;
                self.init_hash()
            }
        } else if is_acgt(incoming) {
            let outgoing = self.seq[self.start];
            self.fhash = next_forward_hash(self.fhash, self.k, outgoing, incoming);
            self.rhash = next_reverse_hash(self.rhash, self.k, outgoing, incoming);
            self.start += 1;
            self.end += 1;
            self.chash = canonical(self.fhash, self.rhash);
            true
        } else {
            self.start = self.end + 1;
            self.end = self.start + self.k;
            self.init_hash()
        }
    }

    fn roll_one_write_over(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if self.end >= self.seq.len() {
            self.valid = false;
            return false;
        }
        let raw = self.seq[self.end];
        let incoming = if is_acgt(raw) { raw } else { b'A' };
        let outgoing = match self.carry.pop_front() {
            // carry bytes were substituted when they were stored
            Some(b) => b,
            None => {
                let b = self.seq[self.start];
                self.start += 1;
                if is_acgt(b) {
                    b
                } else {
                    b'A'
                }
            }
        };
        self.end += 1;
        self.fhash = next_forward_hash(self.fhash, self.k, outgoing, incoming);
        self.rhash = next_reverse_hash(self.rhash, self.k, outgoing, incoming);
        self.chash = canonical(self.fhash, self.rhash);
        true
    }

    /// Shared body of `append_seq`: move the old tail into the carry, bind
    /// the new sequence, and pull from its front until a full k-mer is
    /// assembled (or the attempt dies on a bad byte / short input).
    fn stitch(&mut self, new_seq: &'s [u8]) {
        let skip = self.policy == BadCharPolicy::SkipOver;
        self.offset += self.seq.len();

        // A previously stitched k-mer (initialized, and possibly rolled some
        // distance) still holds its leading byte at the carry front;
        // re-stitching without dropping that byte would hash the same k-mer
        // twice. A carry that never filled to k has no such byte.
        if (self.start != self.end || self.carry.len() == self.k) && !self.carry.is_empty() {
            self.carry.pop_front();
        }

        // Walk the old tail backward, collecting up to k-1-|carry| bytes.
        let mut tail: Vec<u8> = Vec::with_capacity(self.k);
        if !self.seq.is_empty() {
            let mut ind = self.seq.len() - 1;
            while tail.len() + self.carry.len() < self.k - 1 && ind >= self.start {
                let b = self.seq[ind];
                if is_acgt(b) {
                    tail.push(b);
                } else if skip {
                    break;
                } else {
                    tail.push(b'A');
                }
                if ind == 0 {
                    break;
                }
                ind -= 1;
            }
        }
        for &b in tail.iter().rev() {
            self.carry.push_back(b);
        }

        // Pull bytes from the front of the new sequence until the carry holds
        // a whole k-mer.
        self.seq = new_seq;
        self.start = 0;
        self.end = 0;
        let mut ind = 0;
        while self.carry.len() < self.k && ind < self.seq.len() {
            let b = self.seq[ind];
            if is_acgt(b) {
                self.carry.push_back(b);
            } else if skip {
                // the straddling k-mer is dead; restart cleanly past the bad byte
                self.start = ind + 1;
                self.end = self.start + self.k;
                self.carry.clear();
                self.init_hash();
                return;
            } else {
                self.carry.push_back(b'A');
            }
            ind += 1;
            self.start += 1;
            self.end += 1;
        }

        if self.carry.len() == self.k {
            let window: Vec<u8> = self.carry.iter().copied().collect();
            self.set_hashes_from(&window);
        } else {
            // not enough material for a straddling k-mer yet; a later append
            // may still complete it
            self.valid = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nthash;

    fn dig<'a>(seq: &'a [u8], k: usize, policy: BadCharPolicy) -> Digester<'a> {
        Digester::new(seq, k, 0, MinimizedHash::Canonical, policy).unwrap()
    }

    /// Fresh-hash oracle: hashes of the k-mer at `pos` with WriteOver
    /// substitution applied.
    fn fresh_hashes(seq: &[u8], pos: usize, k: usize) -> (u64, u64, u64) {
        let window: Vec<u8> = seq[pos..pos + k]
            .iter()
            .map(|&b| if is_acgt(b) { b } else { b'A' })
            .collect();
        let f = nthash::base_forward_hash(&window);
        let r = nthash::base_reverse_hash(&window);
        (f, r, nthash::canonical(f, r))
    }

    #[test]
    fn test_rejects_small_k() {
        for k in 0..MIN_K {
            assert!(matches!(
                Digester::new(
                    b"ACGTACGT",
                    k,
                    0,
                    MinimizedHash::Canonical,
                    BadCharPolicy::SkipOver
                ),
                Err(MinnowError::BadConstruction(_))
            ));
        }
    }

    #[test]
    fn test_rejects_start_past_end() {
        assert!(matches!(
            Digester::new(
                b"ACGTACGT",
                4,
                8,
                MinimizedHash::Canonical,
                BadCharPolicy::SkipOver
            ),
            Err(MinnowError::BadConstruction(_))
        ));
    }

    #[test]
    fn test_short_sequence_is_invalid_not_error() {
        let d = Digester::new(
            b"ACG",
            4,
            0,
            MinimizedHash::Canonical,
            BadCharPolicy::SkipOver,
        )
        .unwrap();
        assert!(!d.valid());
        // length 4 exactly, start 1: no window fits
        let d = Digester::new(
            b"ACGT",
            4,
            1,
            MinimizedHash::Canonical,
            BadCharPolicy::SkipOver,
        )
        .unwrap();
        assert!(!d.valid());
    }

    #[test]
    fn test_roll_matches_fresh_hashes() {
        let seq = b"CATACCGGTGTTCTCGCTTCAACGACCGC";
        for k in [4usize, 6, 8] {
            let mut d = dig(seq, k, BadCharPolicy::SkipOver);
            let mut seen = 0;
            while d.valid() {
                let (f, r, c) = fresh_hashes(seq, d.pos(), k);
                assert_eq!(d.fhash(), f);
                assert_eq!(d.rhash(), r);
                assert_eq!(d.chash(), c);
                seen += 1;
                d.roll_one();
            }
            assert_eq!(seen, seq.len() - k + 1);
        }
    }

    #[test]
    fn test_skip_over_no_valid_kmer() {
        // every 4-window of CCGNGT touches the N
        let d = dig(b"CCGNGT", 4, BadCharPolicy::SkipOver);
        assert!(!d.valid());
    }

    #[test]
    fn test_skip_over_restarts_after_bad_byte() {
        let seq = b"ACTGNNACTGAC";
        let mut d = dig(seq, 4, BadCharPolicy::SkipOver);
        let mut positions = Vec::new();
        while d.valid() {
            positions.push(d.pos());
            d.roll_one();
        }
        assert_eq!(positions, vec![0, 6, 7, 8]);
    }

    #[test]
    fn test_write_over_substitutes_a() {
        // N treated as A: the stream must equal a clean run over CCGAGT
        let mut d = dig(b"CCGNGT", 4, BadCharPolicy::WriteOver);
        let mut clean = dig(b"CCGAGT", 4, BadCharPolicy::SkipOver);
        let mut count = 0;
        while d.valid() {
            assert!(clean.valid());
            assert_eq!(d.pos(), clean.pos());
            assert_eq!(d.fhash(), clean.fhash());
            assert_eq!(d.rhash(), clean.rhash());
            assert_eq!(d.chash(), clean.chash());
            count += 1;
            d.roll_one();
            clean.roll_one();
        }
        assert_eq!(count, 3);
        assert!(!clean.valid());
    }

    #[test]
    fn test_positions_monotonic() {
        let seq = b"ACGTNACGTACGTNNACGTACGTACG";
        let mut d = dig(seq, 4, BadCharPolicy::SkipOver);
        let mut last = None;
        while d.valid() {
            if let Some(prev) = last {
                assert!(d.pos() > prev);
            }
            last = Some(d.pos());
            d.roll_one();
        }
    }

    #[test]
    fn test_append_requires_rolled_to_end() {
        let mut d = dig(b"ACGTACGT", 4, BadCharPolicy::SkipOver);
        assert!(matches!(
            d.append_seq(b"ACGT"),
            Err(MinnowError::NotRolledTillEnd { .. })
        ));
    }

    #[test]
    fn test_append_continues_stream() {
        let full = b"CATACCGGTGTTCTCGCTT";
        let (head, tail) = full.split_at(9);
        let mut joined = dig(head, 6, BadCharPolicy::SkipOver);
        let mut direct = dig(full, 6, BadCharPolicy::SkipOver);

        let mut joined_stream = Vec::new();
        while joined.valid() {
            joined_stream.push((joined.pos(), joined.chash()));
            joined.roll_one();
        }
        joined.append_seq(tail).unwrap();
        while joined.valid() {
            joined_stream.push((joined.pos(), joined.chash()));
            joined.roll_one();
        }

        let mut direct_stream = Vec::new();
        while direct.valid() {
            direct_stream.push((direct.pos(), direct.chash()));
            direct.roll_one();
        }
        assert_eq!(joined_stream, direct_stream);
    }

    #[test]
    fn test_new_seq_resets_coordinates() {
        let mut d = dig(b"ACGTACGTACGT", 4, BadCharPolicy::SkipOver);
        while d.roll_one() {}
        d.append_seq(b"ACGTACGT").unwrap();
        while d.roll_one() {}
        d.new_seq(b"TTTTACGT", 0).unwrap();
        assert!(d.valid());
        assert_eq!(d.pos(), 0);
        let (f, r, c) = fresh_hashes(b"TTTTACGT", 0, 4);
        assert_eq!((d.fhash(), d.rhash(), d.chash()), (f, r, c));
    }

    #[test]
    fn test_new_seq_rejects_bad_start() {
        let mut d = dig(b"ACGTACGT", 4, BadCharPolicy::SkipOver);
        assert!(matches!(
            d.new_seq(b"ACGT", 4),
            Err(MinnowError::BadConstruction(_))
        ));
    }

    #[test]
    fn test_clone_resumes_identically() {
        let seq = b"CATACCGGTGTTCTCGCTTCAACGACCGC";
        let mut a = dig(seq, 5, BadCharPolicy::SkipOver);
        for _ in 0..7 {
            a.roll_one();
        }
        let mut b = a.clone();
        while a.valid() {
            assert!(b.valid());
            assert_eq!(a.pos(), b.pos());
            assert_eq!(a.chash(), b.chash());
            a.roll_one();
            b.roll_one();
        }
        assert_eq!(a.valid(), b.valid());
    }

    #[test]
    fn test_minimized_hash_selection() {
        let seq = b"GATTACAGATTACA";
        for (m, pick) in [
            (MinimizedHash::Canonical, 0),
            (MinimizedHash::Forward, 1),
            (MinimizedHash::Reverse, 2),
        ] {
            let d = Digester::new(seq, 4, 0, m, BadCharPolicy::SkipOver).unwrap();
            let expect = [d.chash(), d.fhash(), d.rhash()][pick];
            assert_eq!(d.minimized_hash(), expect);
        }
    }
}
