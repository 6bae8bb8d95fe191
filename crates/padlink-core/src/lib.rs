//! Core primitives for the padlink ceremony.
//!
//! This crate exposes the building blocks used to establish and operate a
//! one-time-pad secured channel between two devices that meet in person:
//!
//! * [`pad`] — the shared key material with exactly-once, bidirectional
//!   consumption cursors.
//! * [`otp`] — the XOR cipher primitive; all reuse protection lives in the
//!   pad's cursors.
//! * [`derive`] — deterministic channel identifiers, relay tokens, and the
//!   spoken mnemonic checksum, all pure functions of the pad bytes.
//! * [`metadata`] — the ceremony header travelling in front of the pad
//!   bytes inside the fountain payload.
//! * [`fountain`] — a rateless fountain code that streams the payload
//!   through QR-displayable frames, tolerant of arbitrary scan order,
//!   duplicates, and drops.
//!
//! The modules are intentionally small and focused so that the surrounding
//! application layers (scanner, renderer, relay client, storage) can be
//! combined without pulling bespoke plumbing into each consumer.

pub mod derive;
pub mod fountain;
pub mod metadata;
pub mod otp;
pub mod pad;
pub mod wordlist;

mod error;

pub use error::PadlinkError;
