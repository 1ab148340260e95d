//! A breeding and selection engine for distributed evolutionary
//! computation.
//!
//! This crate re-exports the public API of the workspace: core types
//! (fitness, genomes, populations, codecs, generator state transfer),
//! selection strategies, the (μ,λ)/(μ+λ) and SPEA2 breeders, and the
//! master/slave evaluation protocol.

pub use brood_breeders::*;
pub use brood_core::*;
pub use brood_eval::*;
pub use brood_selectors::*;
