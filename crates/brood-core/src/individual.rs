use crate::fitness::Fitness;
use crate::genome::Genome;
use crate::species::SpeciesId;

/// An evolvable entity: a genome, its fitness, and a flag recording whether
/// the fitness was produced against the current genome. Cloning deep-copies
/// the genome and fitness; the species handle is an index into the evolution
/// state's species table and is shared.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Individual {
    pub genome: Genome,
    pub fitness: Fitness,
    pub evaluated: bool,
    pub species: SpeciesId,
}

impl Individual {
    pub fn new(species: SpeciesId, genome: Genome, fitness: Fitness) -> Self {
        Individual {
            genome,
            fitness,
            evaluated: false,
            species,
        }
    }

    /// Record a freshly computed fitness for the current genome.
    pub fn set_fitness(&mut self, fitness: Fitness) {
        self.fitness = fitness;
        self.evaluated = true;
    }

    /// Mark the fitness stale after the genome changed.
    pub fn invalidate(&mut self) {
        self.evaluated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_deep_for_genome() {
        let original = Individual::new(
            SpeciesId(0),
            Genome::Int(vec![1, 2, 3]),
            Fitness::Scalar(0.0),
        );

        let mut copy = original.clone();
        if let Genome::Int(words) = &mut copy.genome {
            words[0] = 99;
        }

        assert_eq!(original.genome, Genome::Int(vec![1, 2, 3]));
        assert_eq!(copy.species, original.species);
    }

    #[test]
    fn test_set_fitness_marks_evaluated() {
        let mut individual = Individual::new(
            SpeciesId(0),
            Genome::Bit(vec![true]),
            Fitness::Scalar(0.0),
        );
        assert!(!individual.evaluated);

        individual.set_fitness(Fitness::Scalar(3.0));
        assert!(individual.evaluated);

        individual.invalidate();
        assert!(!individual.evaluated);
    }
}
