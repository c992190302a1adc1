//! Boundary error types.
//!
//! Everything that happens *inside* a `run_step` resolves to "return 0,
//! let the caller decide" per spec — those anomalies never show up here.
//! `PrgError` only covers the one real I/O boundary the core touches:
//! loading a PRG file off disk.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrgError {
    #[error("could not read PRG file: {0}")]
    Io(#[from] std::io::Error),

    #[error("PRG payload too short: {len} bytes (need at least a 2-byte load address)")]
    TooShort { len: usize },
}
