//! Modulo-minimizer selection: emit every k-mer whose hash lands in a fixed
//! residue class.

use crate::digester::{BadCharPolicy, Digester, MinimizedHash};
use crate::error::{MinnowError, Result};
use crate::Emit;

/// Selects k-mers whose hash satisfies `hash % modulus == residue`.
///
/// The congruence is evaluated on the low 32 bits of the selected 64-bit
/// hash, which is also the hash value reported alongside positions. There is
/// no inter-k-mer state: every k-mer is judged on its own.
#[derive(Debug, Clone)]
pub struct Modimizer<'s> {
    digester: Digester<'s>,
    modulus: u64,
    residue: u64,
}

impl<'s> Modimizer<'s> {
    /// Build a modimizer over `seq`. Fails with [`MinnowError::BadMod`] if
    /// `residue >= modulus` (which also rules out a zero modulus), and with
    /// [`MinnowError::BadConstruction`] for the digester's own parameter
    /// failures.
    pub fn new(
        seq: &'s [u8],
        k: usize,
        modulus: u64,
        residue: u64,
        start: usize,
        minimized: MinimizedHash,
        policy: BadCharPolicy,
    ) -> Result<Self> {
        if residue >= modulus {
            return Err(MinnowError::bad_mod(modulus, residue));
        }
        Ok(Modimizer {
            digester: Digester::new(seq, k, start, minimized, policy)?,
            modulus,
            residue,
        })
    }

    /// Roll forward, appending matching k-mers to `out` until it holds
    /// `amount` entries or the stream ends.
    pub fn roll_minimizer(&mut self, amount: usize, out: &mut impl Emit) {
        while out.len() < amount && self.digester.valid() {
            let hash = self.digester.minimized_hash() as u32;
            if u64::from(hash) % self.modulus == self.residue {
                out.push(self.digester.pos() as u32, hash);
            }
            self.digester.roll_one();
        }
    }

    /// Replace the bound sequence; see [`Digester::new_seq`].
    pub fn new_seq(&mut self, seq: &'s [u8], start: usize) -> Result<()> {
        self.digester.new_seq(seq, start)
    }

    /// Logically append to the bound sequence; see [`Digester::append_seq`].
    pub fn append_seq(&mut self, seq: &'s [u8]) -> Result<()> {
        self.digester.append_seq(seq)
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn residue(&self) -> u64 {
        self.residue
    }

    /// The underlying digester.
    pub fn digester(&self) -> &Digester<'s> {
        &self.digester
    }
}
