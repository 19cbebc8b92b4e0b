//! Per-sequence memoization tables (§3, §4.2 of the spec).
//!
//! `AlphaTable`/`VTable` are scalar-keyed by `(i, y)`; `EtaTable` stores a
//! shared dense vector per `(i, y)`; `WgCache` is the direct-mapped feature
//! score/vector cache keyed by `(y, y_prev, i, d)`. All four are created on
//! entry to per-sequence processing and dropped on exit (including on an
//! error return) — ordinary Rust scoping gives us the "released on all exit
//! paths" resource discipline from §5 for free.

mod table;
mod wg_cache;

pub use table::{AlphaTable, EtaTable, VEntry, VTable};
pub use wg_cache::{WgCache, DEFAULT_CAPACITY};
