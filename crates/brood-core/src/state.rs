//! Evolution state and the breeder seam.
//!
//! The state owns the population, the species table, and one generator per
//! breeding thread so each thread draws from an independent stream. The full
//! generational loop belongs to the application; [Evolution] carries just
//! enough of it (evaluate, breed, count generations) for a slave to re-evolve
//! the individuals a master hands it.

use crate::Result;
use crate::population::Population;
use crate::problem::Problem;
use crate::rng::MersenneTwister;
use crate::species::{Species, SpeciesId};
use brood_error::brood_err;
use std::sync::Arc;

pub struct EvolutionState {
    pub generation: usize,
    pub population: Population,
    pub species: Vec<Species>,
    pub random: Vec<MersenneTwister>,
    pub breedthreads: usize,
}

impl EvolutionState {
    pub fn new(species: Vec<Species>, breedthreads: usize, seed: u32) -> Self {
        let breedthreads = breedthreads.max(1);
        EvolutionState {
            generation: 0,
            population: Population::default(),
            species,
            random: (0..breedthreads)
                .map(|thread| MersenneTwister::new(seed.wrapping_add(thread as u32)))
                .collect(),
            breedthreads,
        }
    }

    pub fn species(&self, id: SpeciesId) -> Result<&Species> {
        self.species
            .get(id.0)
            .ok_or_else(|| brood_err!(Breed: "unknown species index {}", id.0))
    }
}

/// A population-level breeding strategy: consumes the current population and
/// produces the next one.
pub trait Breeder: Send {
    fn breed(&mut self, state: &mut EvolutionState) -> Result<Population>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolveOutcome {
    Running,
    Done,
}

/// A minimal evaluate-then-breed cycle around an [EvolutionState].
pub struct Evolution {
    pub state: EvolutionState,
    pub breeder: Box<dyn Breeder>,
    pub problem: Arc<dyn Problem>,
    pub max_generations: Option<usize>,
}

impl Evolution {
    pub fn new(
        state: EvolutionState,
        breeder: Box<dyn Breeder>,
        problem: Arc<dyn Problem>,
        max_generations: Option<usize>,
    ) -> Self {
        Evolution {
            state,
            breeder,
            problem,
            max_generations,
        }
    }

    /// Run one generation: evaluate whatever is unevaluated, breed the next
    /// population, and advance the generation counter.
    pub fn evolve(&mut self) -> Result<EvolveOutcome> {
        self.evaluate()?;

        let next = self.breeder.breed(&mut self.state)?;
        self.state.population = next;
        self.state.generation += 1;

        match self.max_generations {
            Some(max) if self.state.generation >= max => Ok(EvolveOutcome::Done),
            _ => Ok(EvolveOutcome::Running),
        }
    }

    /// Evaluate every individual whose fitness is stale.
    pub fn evaluate(&mut self) -> Result<()> {
        let EvolutionState {
            population,
            species,
            ..
        } = &mut self.state;

        for (index, subpop) in population.subpops.iter_mut().enumerate() {
            let species = species
                .get(subpop.species.0)
                .ok_or_else(|| brood_err!(Breed: "unknown species index {}", subpop.species.0))?;

            for individual in subpop.individuals.iter_mut() {
                if !individual.evaluated {
                    self.problem.evaluate(individual, species, index, 0)?;
                }
            }
        }
        Ok(())
    }
}

/// A restartable snapshot: everything that cannot be rebuilt from the
/// parameter database. Species (and their pipelines) are reconstructed from
/// parameters on restore.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    pub generation: usize,
    pub population: Population,
    pub random: Vec<MersenneTwister>,
}

#[cfg(feature = "serde")]
impl Checkpoint {
    pub fn of(state: &EvolutionState) -> Self {
        Checkpoint {
            generation: state.generation,
            population: state.population.clone(),
            random: state.random.clone(),
        }
    }

    pub fn restore(self, state: &mut EvolutionState) {
        state.generation = self.generation;
        state.population = self.population;
        state.random = self.random;
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let encoded = serde_json::to_string(self)
            .map_err(|e| brood_err!(Codec: "checkpoint encode failed: {}", e))?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| brood_err!(Codec: "checkpoint decode failed: {}", e))
    }
}
