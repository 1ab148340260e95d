use brood_breeders::MutationPipeline;
use brood_core::*;
use brood_selectors::{EsSelector, Spea2TournamentSelector};
use std::sync::Arc;

/// An evolution state with one scalar subpopulation bred by a zero-rate
/// mutation pipeline fed from evolution-strategy selection: children are
/// exact clones of their parents, so tests can identify lineage by genome.
#[allow(dead_code)]
pub fn es_state(values: &[f32], breedthreads: usize) -> EvolutionState {
    let species = Species::new(
        "scalar",
        Genome::Int(vec![0]),
        Fitness::Scalar(0.0),
        Box::new(MutationPipeline::new(Box::new(EsSelector::new()), 0.0)),
    );

    let individuals = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let mut individual = species.new_individual(SpeciesId(0));
            individual.genome = Genome::Int(vec![i as i32]);
            individual.set_fitness(Fitness::Scalar(*value));
            individual
        })
        .collect();

    let mut state = EvolutionState::new(vec![species], breedthreads, 1234);
    state.population = Population::new(vec![Subpopulation::with_individuals(
        SpeciesId(0),
        individuals,
    )]);
    state
}

/// Overwrite the scalar fitnesses of subpopulation 0 in slot order.
#[allow(dead_code)]
pub fn assign_scalars(state: &mut EvolutionState, values: &[f32]) {
    let subpop = &mut state.population.subpops[0];
    assert_eq!(subpop.len(), values.len());
    for (individual, value) in subpop.individuals.iter_mut().zip(values.iter()) {
        individual.set_fitness(Fitness::Scalar(*value));
    }
}

/// An evolution state with one spea2 subpopulation bred from its archive by
/// tournament selection and zero-rate mutation.
#[allow(dead_code)]
pub fn spea2_state(points: &[Vec<f32>], archive_size: usize, breedthreads: usize) -> EvolutionState {
    let spec = Arc::new(ObjectiveSpec::uniform(true, points[0].len(), -100.0, 100.0).unwrap());
    let species = Species::new(
        "archive",
        Genome::Int(vec![0]),
        Fitness::Spea2(Spea2Fitness::new(MultiObjective::new(Arc::clone(&spec)))),
        Box::new(MutationPipeline::new(
            Box::new(Spea2TournamentSelector::new(2)),
            0.0,
        )),
    );

    let individuals = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let mut objectives = MultiObjective::new(Arc::clone(&spec));
            objectives.set_objectives(point.clone()).unwrap();

            let mut individual = species.new_individual(SpeciesId(0));
            individual.genome = Genome::Int(vec![i as i32]);
            individual.set_fitness(Fitness::Spea2(Spea2Fitness::new(objectives)));
            individual
        })
        .collect();

    let mut subpop = Subpopulation::with_individuals(SpeciesId(0), individuals);
    subpop.archive_size = archive_size;

    let mut state = EvolutionState::new(vec![species], breedthreads, 99);
    state.population = Population::new(vec![subpop]);
    state
}

/// Objective points of the individuals in the given slot range.
#[allow(dead_code)]
pub fn points_in(subpop: &Subpopulation, range: std::ops::Range<usize>) -> Vec<Vec<f32>> {
    subpop.individuals[range]
        .iter()
        .map(|i| i.fitness.as_multi().unwrap().objectives().to_vec())
        .collect()
}
