//! C API for minnow - FFI bindings for external language integration.
//!
//! This module is the scripting surface: one call per selection scheme,
//! taking a raw sequence and returning the selected positions (optionally
//! interleaved with their 32-bit hashes). It exists so Python (ctypes/cffi)
//! and other languages can drive the engine without a handle object; each
//! call builds a fresh digester internally.
//!
//! All calls fix the knobs the binding layer has always fixed: canonical
//! hashes, the skip-over bad-character policy, residue 0 for the modimizer,
//! and digestion from the start of the sequence.
//!
//! # Safety
//!
//! All functions that take raw pointers perform null checks and validation
//! internally. These `extern "C"` functions cannot be marked `unsafe` in
//! Rust since they are designed to be called from C code.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use libc::{c_char, size_t};
use std::cell::RefCell;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::slice;

use crate::digester::{BadCharPolicy, MinimizedHash};
use crate::modimizer::Modimizer;
use crate::syncmer::Syncmer;
use crate::window_minimizer::WindowMinimizer;
use crate::MAX_SEQUENCE_LENGTH;

// --- Error Reporting ---

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: String) {
    LAST_ERROR.with(|e| {
        // Sanitize null bytes to prevent silent error suppression
        let sanitized = err.replace('\0', "\\0");
        *e.borrow_mut() =
            Some(CString::new(sanitized).expect("sanitized string should not contain null bytes"));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Returns the last error on this thread, or NULL if the last call
/// succeeded.
///
/// The returned string is owned by the library and must NOT be freed by the
/// caller. It remains valid until the next failing minnow call on this
/// thread.
#[no_mangle]
pub extern "C" fn minnow_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(std::ptr::null())
    })
}

// --- C-Compatible Structs ---

/// Array of u32 values returned by the digestion calls.
///
/// `stride == 1`: `data[i]` is the i-th position.
/// `stride == 2`: `data[2*i]` is the i-th position, `data[2*i + 1]` its
/// hash (low 32 bits of the canonical hash).
///
/// `len` counts u32 values, not entries. On error all fields are zero/NULL
/// and `minnow_last_error()` explains; an empty result with a non-zero
/// stride is a success.
///
/// Free with `minnow_pos_array_free()`. Do NOT free twice.
#[repr(C)]
pub struct MinnowPosArray {
    pub data: *mut u32,
    pub len: size_t,
    pub capacity: size_t,
    pub stride: size_t,
}

impl MinnowPosArray {
    fn error() -> Self {
        MinnowPosArray {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
            stride: 0,
        }
    }

    fn from_vec(mut values: Vec<u32>, stride: size_t) -> Self {
        values.shrink_to_fit();
        let mut values = ManuallyDrop::new(values);
        MinnowPosArray {
            data: values.as_mut_ptr(),
            len: values.len(),
            capacity: values.capacity(),
            stride,
        }
    }
}

/// Frees an array returned by a minnow digestion call. A NULL `data` field
/// is safe to pass.
#[no_mangle]
pub extern "C" fn minnow_pos_array_free(arr: MinnowPosArray) {
    if !arr.data.is_null() {
        unsafe {
            let _ = Vec::from_raw_parts(arr.data, arr.len, arr.capacity);
        }
    }
}

// --- Input Validation ---

fn checked_seq<'a>(seq: *const c_char, seq_len: size_t) -> Option<&'a [u8]> {
    if seq.is_null() {
        set_last_error("sequence pointer is NULL".to_string());
        return None;
    }
    if seq_len == 0 {
        set_last_error("sequence length is zero".to_string());
        return None;
    }
    if seq_len > MAX_SEQUENCE_LENGTH {
        set_last_error(format!(
            "sequence length {} exceeds maximum {}",
            seq_len, MAX_SEQUENCE_LENGTH
        ));
        return None;
    }
    Some(unsafe { slice::from_raw_parts(seq as *const u8, seq_len) })
}

fn interleave(pairs: Vec<(u32, u32)>) -> Vec<u32> {
    let mut flat = Vec::with_capacity(pairs.len() * 2);
    for (pos, hash) in pairs {
        flat.push(pos);
        flat.push(hash);
    }
    flat
}

// --- Digestion Calls ---

/// Runs window-minimizer digestion over `seq` with k-mer size `k` and a
/// window of `w` k-mers.
///
/// Returns the deduplicated minimizer positions; with `include_hash` each
/// position is followed by the low 32 bits of its canonical hash
/// (`stride == 2`).
#[no_mangle]
pub extern "C" fn minnow_window_minimizer(
    seq: *const c_char,
    seq_len: size_t,
    k: size_t,
    w: size_t,
    include_hash: bool,
) -> MinnowPosArray {
    let Some(bytes) = checked_seq(seq, seq_len) else {
        return MinnowPosArray::error();
    };
    let mut dig = match WindowMinimizer::new(
        bytes,
        k,
        w,
        0,
        MinimizedHash::Canonical,
        BadCharPolicy::SkipOver,
    ) {
        Ok(dig) => dig,
        Err(e) => {
            set_last_error(format!("window_minimizer: {}", e));
            return MinnowPosArray::error();
        }
    };
    clear_last_error();
    if include_hash {
        let mut out: Vec<(u32, u32)> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(interleave(out), 2)
    } else {
        let mut out: Vec<u32> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(out, 1)
    }
}

/// Runs mod-minimizer digestion over `seq` with k-mer size `k`, keeping
/// k-mers whose canonical hash is divisible by `modulus`.
///
/// Returns the matching positions; with `include_hash` each position is
/// followed by the low 32 bits of its canonical hash (`stride == 2`).
#[no_mangle]
pub extern "C" fn minnow_modimizer(
    seq: *const c_char,
    seq_len: size_t,
    k: size_t,
    modulus: u64,
    include_hash: bool,
) -> MinnowPosArray {
    let Some(bytes) = checked_seq(seq, seq_len) else {
        return MinnowPosArray::error();
    };
    let mut dig = match Modimizer::new(
        bytes,
        k,
        modulus,
        0,
        0,
        MinimizedHash::Canonical,
        BadCharPolicy::SkipOver,
    ) {
        Ok(dig) => dig,
        Err(e) => {
            set_last_error(format!("modimizer: {}", e));
            return MinnowPosArray::error();
        }
    };
    clear_last_error();
    if include_hash {
        let mut out: Vec<(u32, u32)> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(interleave(out), 2)
    } else {
        let mut out: Vec<u32> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(out, 1)
    }
}

/// Runs syncmer digestion over `seq` with k-mer size `k` and a window of
/// `w` k-mers.
///
/// Returns the start position of every window whose minimum canonical hash
/// sits at either end; with `include_hash` each position is followed by the
/// low 32 bits of that minimum (`stride == 2`).
#[no_mangle]
pub extern "C" fn minnow_syncmer(
    seq: *const c_char,
    seq_len: size_t,
    k: size_t,
    w: size_t,
    include_hash: bool,
) -> MinnowPosArray {
    let Some(bytes) = checked_seq(seq, seq_len) else {
        return MinnowPosArray::error();
    };
    let mut dig = match Syncmer::new(
        bytes,
        k,
        w,
        0,
        MinimizedHash::Canonical,
        BadCharPolicy::SkipOver,
    ) {
        Ok(dig) => dig,
        Err(e) => {
            set_last_error(format!("syncmer: {}", e));
            return MinnowPosArray::error();
        }
    };
    clear_last_error();
    if include_hash {
        let mut out: Vec<(u32, u32)> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(interleave(out), 2)
    } else {
        let mut out: Vec<u32> = Vec::new();
        dig.roll_minimizer(usize::MAX, &mut out);
        MinnowPosArray::from_vec(out, 1)
    }
}
