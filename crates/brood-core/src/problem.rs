//! Problem forms.
//!
//! A [Problem] scores one individual at a time; a [GroupedProblem] scores a
//! batch together, which is how competitive fitness works. Both must be
//! shareable across evaluation threads. The concrete problems here are the
//! stock forms used by slaves and tests; real applications supply their own.

use crate::Result;
use crate::fitness::{Fitness, MultiObjective, Spea2Fitness};
use crate::genome::Genome;
use crate::individual::Individual;
use crate::species::Species;

pub trait Problem: Send + Sync {
    fn evaluate(
        &self,
        individual: &mut Individual,
        species: &Species,
        subpop: usize,
        thread: usize,
    ) -> Result<()>;
}

/// One entry of a grouped-evaluation batch.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub subpop: usize,
    pub individual: Individual,
    pub update_fitness: bool,
}

pub trait GroupedProblem: Send + Sync {
    /// Evaluate the batch as a group. With `count_victories_only` the
    /// fitness of each member is its number of victories against the rest of
    /// the group; otherwise the problem assigns its raw score.
    fn evaluate_group(
        &self,
        members: &mut [GroupMember],
        species: &[Species],
        count_victories_only: bool,
    ) -> Result<()>;
}

/// Sum of the genome's words: the count of set bits for bit genomes, the sum
/// of opcode tags for trees.
pub fn genome_sum(genome: &Genome) -> f64 {
    match genome {
        Genome::Int(words) => words.iter().map(|w| *w as f64).sum(),
        Genome::Long(words) => words.iter().map(|w| *w as f64).sum(),
        Genome::Float(words) => words.iter().map(|w| *w as f64).sum(),
        Genome::Double(words) => words.iter().sum(),
        Genome::Bit(words) => words.iter().filter(|w| **w).count() as f64,
        Genome::Tree(root) => {
            fn sum(node: &crate::genome::TreeNode) -> f64 {
                node.op as f64 + node.children.iter().map(sum).sum::<f64>()
            }
            sum(root)
        }
    }
}

/// Build a fitness of the species' shape from a single score.
pub fn fitness_from_score(prototype: &Fitness, score: f64) -> Result<Fitness> {
    Ok(match prototype {
        Fitness::Scalar(_) => Fitness::Scalar(score as f32),
        Fitness::Multi(multi) => {
            let mut fitness = MultiObjective::new(multi.spec().clone());
            fitness.set_objectives(vec![score as f32; multi.spec().num_objectives()])?;
            Fitness::Multi(fitness)
        }
        Fitness::Spea2(spea2) => {
            let mut objectives = MultiObjective::new(spea2.objectives().spec().clone());
            objectives.set_objectives(vec![
                score as f32;
                spea2.objectives().spec().num_objectives()
            ])?;
            Fitness::Spea2(Spea2Fitness::new(objectives))
        }
    })
}

/// Scores an individual by the sum of its genome words.
#[derive(Debug, Clone, Default)]
pub struct GenomeSumProblem;

impl GenomeSumProblem {
    pub fn new() -> Self {
        GenomeSumProblem
    }
}

impl Problem for GenomeSumProblem {
    fn evaluate(
        &self,
        individual: &mut Individual,
        species: &Species,
        _subpop: usize,
        _thread: usize,
    ) -> Result<()> {
        let score = genome_sum(&individual.genome);
        let fitness = fitness_from_score(&species.fitness_prototype, score)?;
        individual.set_fitness(fitness);
        Ok(())
    }
}

/// Grouped form of [GenomeSumProblem]: members compete on genome sums.
#[derive(Debug, Clone, Default)]
pub struct GenomeSumContest;

impl GenomeSumContest {
    pub fn new() -> Self {
        GenomeSumContest
    }
}

impl GroupedProblem for GenomeSumContest {
    fn evaluate_group(
        &self,
        members: &mut [GroupMember],
        species: &[Species],
        count_victories_only: bool,
    ) -> Result<()> {
        let sums: Vec<f64> = members
            .iter()
            .map(|member| genome_sum(&member.individual.genome))
            .collect();

        for (i, member) in members.iter_mut().enumerate() {
            let score = if count_victories_only {
                sums.iter()
                    .enumerate()
                    .filter(|(j, sum)| *j != i && sums[i] > **sum)
                    .count() as f64
            } else {
                sums[i]
            };

            let prototype = &species[member.individual.species.0].fitness_prototype;
            let fitness = fitness_from_score(prototype, score)?;
            member.individual.set_fitness(fitness);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BreedContext, BreedingPipeline};
    use crate::species::SpeciesId;

    struct NullPipeline;

    impl BreedingPipeline for NullPipeline {
        fn produce(&mut self, _ctx: &mut BreedContext<'_>) -> Result<Individual> {
            unreachable!()
        }

        fn clone_pipeline(&self) -> Box<dyn BreedingPipeline> {
            Box::new(NullPipeline)
        }
    }

    fn scalar_species(genome: Genome) -> Species {
        Species::new("test", genome, Fitness::Scalar(0.0), Box::new(NullPipeline))
    }

    #[test]
    fn test_genome_sum_problem_marks_evaluated() {
        let species = scalar_species(Genome::Int(vec![0; 3]));
        let mut individual = species.new_individual(SpeciesId(0));
        individual.genome = Genome::Int(vec![1, 2, 3]);

        GenomeSumProblem::new()
            .evaluate(&mut individual, &species, 0, 0)
            .unwrap();

        assert!(individual.evaluated);
        assert_eq!(individual.fitness, Fitness::Scalar(6.0));
    }

    #[test]
    fn test_contest_counts_victories() {
        let species = vec![scalar_species(Genome::Int(vec![0; 1]))];
        let mut members: Vec<GroupMember> = [3, 1, 2]
            .iter()
            .map(|value| {
                let mut individual = species[0].new_individual(SpeciesId(0));
                individual.genome = Genome::Int(vec![*value]);
                GroupMember {
                    subpop: 0,
                    individual,
                    update_fitness: true,
                }
            })
            .collect();

        GenomeSumContest::new()
            .evaluate_group(&mut members, &species, true)
            .unwrap();

        let scores: Vec<f32> = members
            .iter()
            .map(|m| m.individual.fitness.fitness_scalar())
            .collect();
        assert_eq!(scores, vec![2.0, 0.0, 1.0]);
    }
}
