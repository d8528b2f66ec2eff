//! Real-world scenario benchmarks.
//!
//! These benchmarks model what the remix binary does every audio callback:
//! rendering percussion hits, overlapping slices, and full engine blocks with
//! scheduler dispatch.

mod remix;
mod voices;

pub use remix::bench_remix;
pub use voices::bench_voices;
