//! The SPEA2 breeder.
//!
//! Each generation the breeder assigns every individual its archive rank
//! (raw strength-based fitness plus a k-th nearest-neighbor density term),
//! truncates the non-dominated set down to the configured archive size by
//! iterative nearest-neighbor pruning, rearranges the old subpopulation so
//! the archive occupies its last slots, and breeds the remaining slots of
//! the next generation from that archive.
//!
//! Elites are loaded on the calling thread before any breeding thread
//! starts; that is the only reason the pruning scratch may be reused across
//! generations without locking.

use crate::dispatch::breed_in_parallel;
use brood_core::{Breeder, EvolutionState, Individual, Population, Result, Subpopulation};
use brood_error::{brood_bail, brood_err};

/// Assign SPEA2 archive ranks to every individual of the subpopulation.
///
/// Strength `S(i)` is the number of individuals `i` dominates; the raw
/// fitness of `i` is the summed strength of everything dominating `i` (zero
/// exactly for non-dominated individuals); the density term is
/// `1 / (σ_k + 2)` with `σ_k` the distance to the ⌊√N⌋-th nearest neighbor.
/// The archive rank is their sum, so ranks below 1 mark the non-dominated.
pub fn assign_archive_ranks(subpop: &mut Subpopulation) -> Result<()> {
    let n = subpop.len();
    if n == 0 {
        return Ok(());
    }

    for individual in &subpop.individuals {
        if individual.fitness.as_spea2().is_none() {
            brood_bail!(Breed:
                "spea2 breeding requires spea2 fitness, found {}", individual.fitness.kind());
        }
    }

    let objectives: Vec<_> = subpop
        .individuals
        .iter()
        .map(|i| i.fitness.as_multi().unwrap().clone())
        .collect();

    let mut strength = vec![0usize; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && objectives[i].dominates(&objectives[j]) {
                strength[i] += 1;
            }
        }
    }

    let k = (n as f64).sqrt() as usize;
    let mut row = vec![0.0f64; n];
    for i in 0..n {
        let mut raw = 0usize;
        for j in 0..n {
            if i != j && objectives[j].dominates(&objectives[i]) {
                raw += strength[j];
            }
        }

        for j in 0..n {
            row[j] = objectives[i].distance_to(&objectives[j]);
        }
        row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let sigma = row[k.min(n - 1)];
        let density = 1.0 / (sigma + 2.0);

        subpop.individuals[i]
            .fitness
            .as_spea2_mut()
            .unwrap()
            .set_archive_rank(raw as f32 + density as f32);
    }
    Ok(())
}

/// Pruning scratch reused across generations. Grown in place, never shrunk.
#[derive(Default)]
struct TruncationScratch {
    distances: Vec<Vec<f64>>,
    neighbors: Vec<Vec<usize>>,
}

impl TruncationScratch {
    fn ensure(&mut self, n: usize) {
        if self.distances.len() < n {
            self.distances.resize_with(n, Vec::new);
            self.neighbors.resize_with(n, Vec::new);
        }
        for row in self.distances.iter_mut().take(n) {
            if row.len() < n {
                row.resize(n, 0.0);
            }
        }
        for row in self.neighbors.iter_mut().take(n) {
            if row.len() < n {
                row.resize(n, 0);
            }
        }
    }
}

#[derive(Default)]
pub struct Spea2Breeder {
    scratch: TruncationScratch,
}

impl Spea2Breeder {
    pub fn new() -> Self {
        Spea2Breeder::default()
    }

    /// Select the archive of the subpopulation and rearrange it so the
    /// archive occupies the last `archive_size` slots. Returns clones of the
    /// archive members in worst-to-best rank order, ready to be placed into
    /// the top of the next generation.
    ///
    /// Must be called with archive ranks already assigned, from a single
    /// thread, before breeding threads start.
    pub fn load_elites(&mut self, subpop: &mut Subpopulation) -> Result<Vec<Individual>> {
        let len = subpop.len();
        let archive_size = subpop.archive_size;
        if archive_size == 0 || archive_size > len {
            brood_bail!(InvalidConfig:
                "archive size {} must be between 1 and the subpopulation size {}",
                archive_size, len);
        }
        for individual in &subpop.individuals {
            if individual.fitness.as_spea2().is_none() {
                brood_bail!(Breed:
                    "spea2 breeding requires spea2 fitness, found {}", individual.fitness.kind());
            }
        }

        // Best (lowest) archive rank first.
        subpop.individuals.sort_by(|a, b| {
            let ra = a.fitness.as_spea2().unwrap().archive_rank();
            let rb = b.fitness.as_spea2().unwrap().archive_rank();
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let non_dominated = subpop
            .individuals
            .iter()
            .take_while(|i| i.fitness.as_spea2().unwrap().is_non_dominated())
            .count();

        let survivors: Vec<usize> = if non_dominated <= archive_size {
            // Every non-dominated individual fits (or none exist at all);
            // top up with the best-ranked dominated individuals.
            (0..archive_size).collect()
        } else {
            self.truncate_by_density(&subpop.individuals, non_dominated, archive_size)
        };

        let mut keep = vec![false; len];
        for index in &survivors {
            keep[*index] = true;
        }

        let individuals = std::mem::take(&mut subpop.individuals);
        let mut archive = Vec::with_capacity(archive_size);
        let mut rest = Vec::with_capacity(len - archive_size);
        for (index, individual) in individuals.into_iter().enumerate() {
            if keep[index] {
                archive.push(individual);
            } else {
                rest.push(individual);
            }
        }

        // Worst of the archive first, so the clones fill the top of the new
        // generation back-to-front toward the best.
        archive.reverse();
        let clones = archive.clone();

        subpop.individuals = rest;
        subpop.individuals.extend(archive);
        Ok(clones)
    }

    /// Iteratively drop the most crowded of the `n` non-dominated
    /// individuals until `archive_size` remain. Crowding is judged by the
    /// lexicographic sequence of each row's sorted neighbor distances; the
    /// diagonal is pinned to -1 so every row leads with itself and ties
    /// resolve identically across rows.
    fn truncate_by_density(
        &mut self,
        individuals: &[Individual],
        n: usize,
        archive_size: usize,
    ) -> Vec<usize> {
        self.scratch.ensure(n);
        let distances = &mut self.scratch.distances;
        let neighbors = &mut self.scratch.neighbors;

        for i in 0..n {
            distances[i][i] = -1.0;
            for j in 0..i {
                let d = individuals[i]
                    .fitness
                    .as_spea2()
                    .unwrap()
                    .distance_to(individuals[j].fitness.as_spea2().unwrap());
                distances[i][j] = d;
                distances[j][i] = d;
            }
        }

        for i in 0..n {
            for (slot, index) in neighbors[i][..n].iter_mut().zip(0..n) {
                *slot = index;
            }
            let row = &distances[i];
            neighbors[i][..n].sort_by(|a, b| {
                row[*a]
                    .partial_cmp(&row[*b])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(b))
            });
        }

        let mut alive = vec![true; n];
        let mut mf = n;
        while mf > archive_size {
            let mut minpos = usize::MAX;
            for i in (0..n).filter(|i| alive[*i]) {
                if minpos == usize::MAX {
                    minpos = i;
                    continue;
                }
                for j in 1..mf.saturating_sub(1) {
                    let di = distances[i][neighbors[i][j]];
                    let dm = distances[minpos][neighbors[minpos][j]];
                    if di < dm {
                        minpos = i;
                        break;
                    } else if di > dm {
                        break;
                    }
                }
            }

            alive[minpos] = false;
            for i in 0..n {
                distances[i][minpos] = f64::INFINITY;
                distances[minpos][i] = f64::INFINITY;
            }
            for i in 0..n {
                if let Some(pos) = neighbors[i][..mf].iter().position(|x| *x == minpos) {
                    neighbors[i][pos..mf].rotate_left(1);
                }
            }
            mf -= 1;
        }

        (0..n).filter(|i| alive[*i]).collect()
    }
}

impl Breeder for Spea2Breeder {
    fn breed(&mut self, state: &mut EvolutionState) -> Result<Population> {
        let mut archives = Vec::with_capacity(state.population.len());
        for subpop in state.population.subpops.iter_mut() {
            assign_archive_ranks(subpop)?;
            archives.push(self.load_elites(subpop)?);
        }

        let counts: Vec<usize> = state
            .population
            .subpops
            .iter()
            .map(|subpop| subpop.len() - subpop.archive_size)
            .collect();

        let children = breed_in_parallel(state, &counts, None)?;

        let mut next = state.population.clone_shell();
        for (s, (brood, archive)) in children.into_iter().zip(archives).enumerate() {
            if brood.len() + archive.len() != state.population.subpops[s].len() {
                return Err(brood_err!(Breed:
                    "subpopulation {} bred {} children for {} open slots",
                    s, brood.len(),
                    state.population.subpops[s].len() - archive.len()));
            }
            next.subpops[s].individuals = brood;
            next.subpops[s].individuals.extend(archive);
        }
        Ok(next)
    }
}
