use crate::fitness;
use crate::individual::Individual;
use crate::species::SpeciesId;
use std::ops::Range;

/// An ordered run of individuals of one species. `archive_size` is only
/// meaningful under SPEA2 breeding, where the archive always occupies the
/// last `archive_size` slots after elites are loaded.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subpopulation {
    pub species: SpeciesId,
    pub individuals: Vec<Individual>,
    pub archive_size: usize,
}

impl Subpopulation {
    pub fn new(species: SpeciesId) -> Self {
        Subpopulation {
            species,
            individuals: Vec::new(),
            archive_size: 0,
        }
    }

    pub fn with_individuals(species: SpeciesId, individuals: Vec<Individual>) -> Self {
        Subpopulation {
            species,
            individuals,
            archive_size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Sort best-first by the fitness dominance order. Mutually
    /// non-dominated individuals keep an unspecified relative order.
    pub fn rank_sort(&mut self) {
        self.individuals
            .sort_by(|a, b| fitness::order(&a.fitness, &b.fitness));
    }

    /// Slot range holding the SPEA2 archive.
    pub fn archive_range(&self) -> Range<usize> {
        self.len().saturating_sub(self.archive_size)..self.len()
    }
}

/// The generation's full population: one subpopulation per species
/// configuration. The evolution state owns it exclusively; breeders build a
/// replacement from an empty shell.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Population {
    pub subpops: Vec<Subpopulation>,
}

impl Population {
    pub fn new(subpops: Vec<Subpopulation>) -> Self {
        Population { subpops }
    }

    pub fn len(&self) -> usize {
        self.subpops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subpops.is_empty()
    }

    /// An empty population with the same species layout and archive sizes,
    /// ready for a breeder to refill.
    pub fn clone_shell(&self) -> Population {
        Population {
            subpops: self
                .subpops
                .iter()
                .map(|subpop| Subpopulation {
                    species: subpop.species,
                    individuals: Vec::new(),
                    archive_size: subpop.archive_size,
                })
                .collect(),
        }
    }
}
