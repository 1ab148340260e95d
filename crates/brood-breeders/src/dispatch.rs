//! Parallel slot dispatch shared by the breeders.
//!
//! Child slots are divided across `breedthreads` worker threads in floor-size
//! chunks, with the last thread absorbing the remainder. Threads are created
//! fresh for the generation and joined before the dispatch returns, so every
//! slot is written by exactly one thread and nothing outlives the borrow of
//! the parent population. Each thread breeds through its own clone of the
//! species' pipeline prototype and draws from its own generator.

use brood_core::{
    BreedContext, EvolutionState, Individual, Population, ProducedCounter, Result, Species,
};
use brood_error::{brood_bail, brood_err};

/// Per-subpopulation (μ, λ) tables, present only under evolution-strategy
/// breeding where the once-per-child selection contract is enforced.
#[derive(Clone, Copy)]
pub(crate) struct EsParams<'a> {
    pub mu: &'a [usize],
    pub lambda: &'a [usize],
}

/// Produce `counts[s]` children for every subpopulation, in parallel.
/// Returns the children grouped per subpopulation, in slot order.
pub(crate) fn breed_in_parallel(
    state: &mut EvolutionState,
    counts: &[usize],
    es: Option<EsParams<'_>>,
) -> Result<Vec<Vec<Individual>>> {
    let generation = state.generation;
    let mut randoms = std::mem::take(&mut state.random);
    let threads = randoms.len().max(1);

    let population = &state.population;
    let species_table = &state.species;

    let joined: Result<Vec<Vec<Vec<Individual>>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = randoms
            .iter_mut()
            .enumerate()
            .map(|(thread, rng)| {
                scope.spawn(move || {
                    breed_thread(
                        population,
                        species_table,
                        counts,
                        es,
                        thread,
                        threads,
                        generation,
                        rng,
                    )
                })
            })
            .collect();

        let mut results = Vec::with_capacity(threads);
        for handle in handles {
            match handle.join() {
                Ok(result) => results.push(result?),
                Err(_) => return Err(brood_err!(Breed: "a breeding thread panicked")),
            }
        }
        Ok(results)
    });

    state.random = randoms;
    let per_thread = joined?;

    let mut children: Vec<Vec<Individual>> =
        counts.iter().map(|count| Vec::with_capacity(*count)).collect();
    for thread_output in per_thread {
        for (subpop, slice) in thread_output.into_iter().enumerate() {
            children[subpop].extend(slice);
        }
    }
    Ok(children)
}

fn breed_thread(
    population: &Population,
    species_table: &[Species],
    counts: &[usize],
    es: Option<EsParams<'_>>,
    thread: usize,
    threads: usize,
    generation: usize,
    rng: &mut brood_core::MersenneTwister,
) -> Result<Vec<Vec<Individual>>> {
    let mut output = Vec::with_capacity(population.subpops.len());

    for (s, subpop) in population.subpops.iter().enumerate() {
        let count = counts[s];
        let chunk = count / threads;
        let start = thread * chunk;
        let end = if thread + 1 == threads { count } else { start + chunk };

        let species = species_table
            .get(subpop.species.0)
            .ok_or_else(|| brood_err!(Breed: "unknown species index {}", subpop.species.0))?;

        let (mu, lambda) = match es {
            Some(es) => (es.mu[s], es.lambda[s]),
            None => (0, 0),
        };

        let mut pipeline = species.pipeline.clone_pipeline();
        pipeline.prepare(s, thread);

        let mut counter = ProducedCounter::new(start);
        let mut children = Vec::with_capacity(end - start);
        for slot in start..end {
            let before = counter.produced();
            let mut ctx = BreedContext {
                parents: subpop,
                species,
                rng: &mut *rng,
                counter: &mut counter,
                mu,
                lambda,
                subpop: s,
                generation,
                thread,
            };

            let child = pipeline.produce(&mut ctx)?;

            if es.is_some() {
                let delta = counter.produced() - before;
                if delta != 1 {
                    brood_bail!(Breed:
                        "pipeline performed {} selections while producing child slot {} of \
                         subpopulation {}; evolution-strategy breeding requires exactly one",
                        delta, slot, s);
                }
            }
            if child.species != subpop.species {
                brood_bail!(Breed:
                    "pipeline produced an individual of species {} into subpopulation {} of \
                     species {}",
                    child.species.0, s, subpop.species.0);
            }

            children.push(child);
        }
        pipeline.finish(s, thread);

        output.push(children);
    }

    Ok(output)
}
