//! Snapshot encoding/decoding for the backing file
//!
//! The whole store is written as one JSON document holding both collections
//! as arrays of `[id, entity]` pairs.

pub mod snapshot;

pub use snapshot::{DecodeError, Snapshot, decode, encode};
