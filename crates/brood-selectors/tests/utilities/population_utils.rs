use brood_core::*;
use std::sync::Arc;

/// A pipeline stub for species that are never bred in these tests.
struct NullPipeline;

impl BreedingPipeline for NullPipeline {
    fn produce(&mut self, _ctx: &mut BreedContext<'_>) -> Result<Individual> {
        unreachable!("selector tests never run a pipeline")
    }

    fn clone_pipeline(&self) -> Box<dyn BreedingPipeline> {
        Box::new(NullPipeline)
    }
}

#[allow(dead_code)]
pub fn scalar_species() -> Species {
    Species::new(
        "scalar",
        Genome::Int(vec![0; 4]),
        Fitness::Scalar(0.0),
        Box::new(NullPipeline),
    )
}

/// A subpopulation of evaluated scalar individuals, one per value, in the
/// given order.
#[allow(dead_code)]
pub fn scalar_subpop(values: &[f32]) -> Subpopulation {
    let species = scalar_species();
    let individuals = values
        .iter()
        .map(|value| {
            let mut individual = species.new_individual(SpeciesId(0));
            individual.set_fitness(Fitness::Scalar(*value));
            individual
        })
        .collect();
    Subpopulation::with_individuals(SpeciesId(0), individuals)
}

#[allow(dead_code)]
pub fn spea2_species(num_objectives: usize) -> Species {
    let spec = Arc::new(ObjectiveSpec::uniform(true, num_objectives, 0.0, 100.0).unwrap());
    Species::new(
        "archive",
        Genome::Int(vec![0; 4]),
        Fitness::Spea2(Spea2Fitness::new(MultiObjective::new(spec))),
        Box::new(NullPipeline),
    )
}

/// A subpopulation of spea2 individuals with the given objective points and
/// pre-assigned archive ranks.
#[allow(dead_code)]
pub fn spea2_subpop(points: &[Vec<f32>], ranks: &[f32], archive_size: usize) -> Subpopulation {
    let species = spea2_species(points[0].len());
    let prototype = species.fitness_prototype.as_multi().unwrap().spec().clone();

    let individuals = points
        .iter()
        .zip(ranks.iter())
        .map(|(point, rank)| {
            let mut objectives = MultiObjective::new(Arc::clone(&prototype));
            objectives.set_objectives(point.clone()).unwrap();
            let mut fitness = Spea2Fitness::new(objectives);
            fitness.set_archive_rank(*rank);

            let mut individual = species.new_individual(SpeciesId(0));
            individual.set_fitness(Fitness::Spea2(fitness));
            individual
        })
        .collect();

    let mut subpop = Subpopulation::with_individuals(SpeciesId(0), individuals);
    subpop.archive_size = archive_size;
    subpop
}
