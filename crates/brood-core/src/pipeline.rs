//! Breeding-pipeline and selector seams.
//!
//! A breeding pipeline is a user-composable operator graph that emits one
//! child per `produce` call. Breeders clone the species' pipeline prototype
//! once per worker thread, bracket the slot loop with `prepare` / `finish`,
//! and hand every call a [BreedContext] naming the sorted parent
//! subpopulation, the thread's generator, and the thread's
//! [ProducedCounter].
//!
//! The counter is the contract between evolution-strategy breeders and
//! selectors: the selector records every selection it performs, and the
//! breeder checks after each `produce` that exactly one selection happened.
//! A pipeline topology that selects zero or twice per child is caught at the
//! call site instead of silently skewing parent indexing.

use crate::Result;
use crate::individual::Individual;
use crate::population::Subpopulation;
use crate::rng::MersenneTwister;
use crate::species::Species;

/// Per-thread production ledger. `start` is the first child slot owned by
/// the thread, so `position` is the global index of the child currently
/// being produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedCounter {
    start: usize,
    produced: usize,
}

impl ProducedCounter {
    pub fn new(start: usize) -> Self {
        ProducedCounter { start, produced: 0 }
    }

    /// Global slot index of the child being produced.
    pub fn position(&self) -> usize {
        self.start + self.produced
    }

    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Called by a selector for every selection it performs.
    pub fn record(&mut self) {
        self.produced += 1;
    }
}

/// Everything a pipeline may consult while producing one child.
pub struct BreedContext<'a> {
    /// The current generation's subpopulation, rank-sorted best-first.
    pub parents: &'a Subpopulation,
    pub species: &'a Species,
    pub rng: &'a mut MersenneTwister,
    pub counter: &'a mut ProducedCounter,
    /// Parents retained per generation; zero outside (μ,λ) breeding.
    pub mu: usize,
    /// Children produced per generation; zero outside (μ,λ) breeding.
    pub lambda: usize,
    pub subpop: usize,
    pub generation: usize,
    pub thread: usize,
}

pub trait BreedingPipeline: Send + Sync {
    /// Called once per thread before the slot loop.
    fn prepare(&mut self, _subpop: usize, _thread: usize) {}

    /// Produce exactly one child.
    fn produce(&mut self, ctx: &mut BreedContext<'_>) -> Result<Individual>;

    /// Called once per thread after the slot loop.
    fn finish(&mut self, _subpop: usize, _thread: usize) {}

    /// Pipelines are prototypes on the species; each worker thread breeds
    /// through its own copy.
    fn clone_pipeline(&self) -> Box<dyn BreedingPipeline>;
}

impl Clone for Box<dyn BreedingPipeline> {
    fn clone(&self) -> Self {
        self.clone_pipeline()
    }
}

/// A selection method usable as a pipeline source: returns the index of the
/// chosen parent within `ctx.parents`.
pub trait Selector: Send + Sync {
    fn select(&mut self, ctx: &mut BreedContext<'_>) -> Result<usize>;

    fn clone_selector(&self) -> Box<dyn Selector>;
}

impl Clone for Box<dyn Selector> {
    fn clone(&self) -> Self {
        self.clone_selector()
    }
}
