use crate::fitness::Fitness;
use crate::genome::Genome;
use crate::individual::Individual;
use crate::pipeline::BreedingPipeline;
use std::fmt::{self, Debug, Formatter};

/// Index of a species in the evolution state's species table. Individuals
/// carry the index rather than a handle, so clones stay cheap and the table
/// stays the single owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SpeciesId(pub usize);

/// Shared description of a kind of individual: the genome and fitness
/// prototypes new individuals are cloned from, and the breeding-pipeline
/// prototype worker threads clone before producing children.
pub struct Species {
    pub name: String,
    pub genome_prototype: Genome,
    pub fitness_prototype: Fitness,
    pub pipeline: Box<dyn BreedingPipeline>,
}

impl Species {
    pub fn new(
        name: impl Into<String>,
        genome_prototype: Genome,
        fitness_prototype: Fitness,
        pipeline: Box<dyn BreedingPipeline>,
    ) -> Self {
        Species {
            name: name.into(),
            genome_prototype,
            fitness_prototype,
            pipeline,
        }
    }

    /// A fresh, unevaluated individual cloned from the prototypes.
    pub fn new_individual(&self, id: SpeciesId) -> Individual {
        Individual::new(
            id,
            self.genome_prototype.clone(),
            self.fitness_prototype.clone(),
        )
    }
}

impl Clone for Species {
    fn clone(&self) -> Self {
        Species {
            name: self.name.clone(),
            genome_prototype: self.genome_prototype.clone(),
            fitness_prototype: self.fitness_prototype.clone(),
            pipeline: self.pipeline.clone_pipeline(),
        }
    }
}

impl Debug for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Species")
            .field("name", &self.name)
            .field("genome", &self.genome_prototype.kind())
            .field("fitness", &self.fitness_prototype.kind())
            .finish()
    }
}
