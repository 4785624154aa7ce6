//! Unified error type for the minnow library.
//!
//! Every failure the engine can raise is synchronous and fatal to the call
//! that produced it; anything else (non-ACGT bases, running off the end of a
//! sequence, too little sequence to form a k-mer) is a normal outcome that
//! shows up as `valid() == false` and shorter emission streams, never as an
//! error.

use std::fmt;

/// Unified error type for the minnow library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinnowError {
    /// Invalid digester parameters: k too small, a start index past the end
    /// of the sequence, or a zero-width window.
    BadConstruction(String),

    /// Modulo-minimizer parameters with `residue >= modulus`.
    BadMod { modulus: u64, residue: u64 },

    /// `append_seq` called before the current sequence was rolled to its end.
    NotRolledTillEnd { end: usize, len: usize },
}

impl fmt::Display for MinnowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinnowError::BadConstruction(detail) => {
                write!(f, "Bad construction: {}", detail)
            }
            MinnowError::BadMod { modulus, residue } => {
                write!(
                    f,
                    "Bad modulus: residue {} is not below modulus {}",
                    residue, modulus
                )
            }
            MinnowError::NotRolledTillEnd { end, len } => {
                write!(
                    f,
                    "Sequence must be rolled to its end before appending (cursor at {} of {})",
                    end, len
                )
            }
        }
    }
}

impl std::error::Error for MinnowError {}

/// Convenience type alias for Results using MinnowError.
pub type Result<T> = std::result::Result<T, MinnowError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl MinnowError {
    /// Create a construction error.
    pub fn bad_construction(detail: impl Into<String>) -> Self {
        MinnowError::BadConstruction(detail.into())
    }

    /// Create a modulus error.
    pub fn bad_mod(modulus: u64, residue: u64) -> Self {
        MinnowError::BadMod { modulus, residue }
    }

    /// Create a premature-append error.
    pub fn not_rolled_till_end(end: usize, len: usize) -> Self {
        MinnowError::NotRolledTillEnd { end, len }
    }
}
