//! Date-chunk planning.
//!
//! Splits a station's requested date range into month-sized, half-open
//! chunks. A chunk is the unit of fetching, caching and progress.

mod range;

pub use range::{plan_chunks, Chunk};
