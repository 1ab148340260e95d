//! The (μ,λ) evolution-strategy breeder.
//!
//! Each generation the top μ individuals of every subpopulation parent
//! exactly λ children; the parents themselves are discarded. Child slots are
//! laid out in blocks of λ/μ per parent, which is what lets the selector
//! derive the parent from the slot index alone, and what the 1/5-rule
//! statistics rely on when they compare each child against the parent that
//! produced it.

use crate::dispatch::{EsParams, breed_in_parallel};
use brood_core::{Breeder, EvolutionState, ParameterDatabase, Population, Result};
use brood_error::{brood_bail, brood_err};

/// Outcome of the 1/5-rule success measurement for one subpopulation:
/// whether more, fewer, or exactly λ/5 children strictly beat their parent.
/// Mutation-strength adaptation keys off this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    UnderOneFifthBetter,
    ExactlyOneFifthBetter,
    OverOneFifthBetter,
}

impl Comparison {
    pub fn as_i8(self) -> i8 {
        match self {
            Comparison::UnderOneFifthBetter => -1,
            Comparison::ExactlyOneFifthBetter => 0,
            Comparison::OverOneFifthBetter => 1,
        }
    }
}

#[derive(Debug)]
pub struct MuCommaLambdaBreeder {
    mu: Vec<usize>,
    lambda: Vec<usize>,
    comparison: Vec<Comparison>,
    pub(crate) parent_population: Option<Population>,
}

impl MuCommaLambdaBreeder {
    pub fn new(mu: Vec<usize>, lambda: Vec<usize>) -> Result<Self> {
        if mu.len() != lambda.len() {
            brood_bail!(InvalidConfig:
                "{} es.mu values but {} es.lambda values", mu.len(), lambda.len());
        }

        for (s, (m, l)) in mu.iter().zip(lambda.iter()).enumerate() {
            if *m < 1 {
                brood_bail!(InvalidConfig: "es.mu.{} must be >= 1", s);
            }
            if *l < 1 {
                brood_bail!(InvalidConfig: "es.lambda.{} must be >= 1", s);
            }
            if l % m != 0 {
                brood_bail!(InvalidConfig:
                    "es.lambda.{s} ({l}) must be a multiple of es.mu.{s} ({m})");
            }
        }

        let comparison = vec![Comparison::ExactlyOneFifthBetter; mu.len()];
        Ok(MuCommaLambdaBreeder {
            mu,
            lambda,
            comparison,
            parent_population: None,
        })
    }

    /// Read `es.mu.<s>` and `es.lambda.<s>` for every subpopulation.
    pub fn from_params(params: &ParameterDatabase, num_subpops: usize) -> Result<Self> {
        let mut mu = Vec::with_capacity(num_subpops);
        let mut lambda = Vec::with_capacity(num_subpops);
        for s in 0..num_subpops {
            mu.push(params.get_usize(&format!("es.mu.{}", s))?);
            lambda.push(params.get_usize(&format!("es.lambda.{}", s))?);
        }
        MuCommaLambdaBreeder::new(mu, lambda)
    }

    pub fn mu(&self) -> &[usize] {
        &self.mu
    }

    pub fn lambda(&self) -> &[usize] {
        &self.lambda
    }

    /// The most recent 1/5-rule measurement, one entry per subpopulation.
    pub fn comparison(&self) -> &[Comparison] {
        &self.comparison
    }

    /// Sorted-rank parent index for the child at `slot`.
    pub fn parent_of(&self, subpop: usize, slot: usize) -> usize {
        slot / (self.lambda[subpop] / self.mu[subpop])
    }

    /// Count the children of the current population that strictly beat the
    /// parent that produced them, and classify the count against λ/5.
    fn update_statistics(&mut self, population: &Population) {
        let Some(parents) = &self.parent_population else {
            return;
        };

        for (s, subpop) in population.subpops.iter().enumerate().take(self.lambda.len()) {
            let lambda = self.lambda[s];
            let mut better = 0usize;
            for i in 0..lambda.min(subpop.len()) {
                let parent = &parents.subpops[s].individuals[self.parent_of(s, i)];
                if subpop.individuals[i].fitness.better_than(&parent.fitness) {
                    better += 1;
                }
            }

            let threshold = lambda as f32 / 5.0;
            self.comparison[s] = if (better as f32) > threshold {
                Comparison::OverOneFifthBetter
            } else if (better as f32) < threshold {
                Comparison::UnderOneFifthBetter
            } else {
                Comparison::ExactlyOneFifthBetter
            };

            tracing::debug!(subpop = s, better, lambda, comparison = ?self.comparison[s],
                "one-fifth rule measured");
        }
    }

    fn validate(&self, state: &EvolutionState) -> Result<()> {
        if state.population.len() != self.mu.len() {
            brood_bail!(InvalidConfig:
                "population holds {} subpopulations but {} es.mu values are configured",
                state.population.len(), self.mu.len());
        }

        for (s, subpop) in state.population.subpops.iter().enumerate() {
            if subpop.len() < self.mu[s] {
                brood_bail!(InvalidConfig:
                    "subpopulation {} holds {} individuals, fewer than es.mu.{} ({})",
                    s, subpop.len(), s, self.mu[s]);
            }
        }
        Ok(())
    }

    pub(crate) fn breed_children(&mut self, state: &mut EvolutionState) -> Result<Population> {
        self.update_statistics(&state.population);
        self.validate(state)?;

        for subpop in state.population.subpops.iter_mut() {
            subpop.rank_sort();
        }
        // The statistics of the next generation index parents by sorted
        // rank, so the snapshot is taken after the sort.
        self.parent_population = Some(state.population.clone());

        let lambda = self.lambda.clone();
        let children = breed_in_parallel(
            state,
            &lambda,
            Some(EsParams {
                mu: &self.mu,
                lambda: &self.lambda,
            }),
        )?;

        let mut next = state.population.clone_shell();
        for (s, brood) in children.into_iter().enumerate() {
            debug_assert_eq!(brood.len(), self.lambda[s]);
            next.subpops[s].individuals = brood;
        }
        Ok(next)
    }

    pub(crate) fn parents(&self, subpop: usize) -> Result<&[brood_core::Individual]> {
        let parents = self
            .parent_population
            .as_ref()
            .ok_or_else(|| brood_err!(Breed: "no parent population has been bred yet"))?;
        Ok(&parents.subpops[subpop].individuals[..self.mu[subpop]])
    }
}

impl Breeder for MuCommaLambdaBreeder {
    fn breed(&mut self, state: &mut EvolutionState) -> Result<Population> {
        self.breed_children(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_must_be_multiple_of_mu() {
        let err = MuCommaLambdaBreeder::new(vec![3], vec![10]).unwrap_err();
        assert!(err.to_string().contains("must be a multiple of"));
        assert!(err.to_string().contains("es.lambda.0"));

        assert!(MuCommaLambdaBreeder::new(vec![2], vec![10]).is_ok());
        assert!(MuCommaLambdaBreeder::new(vec![0], vec![10]).is_err());
        assert!(MuCommaLambdaBreeder::new(vec![2], vec![0]).is_err());
        assert!(MuCommaLambdaBreeder::new(vec![2], vec![10, 4]).is_err());
    }

    #[test]
    fn test_parent_indexing() {
        let breeder = MuCommaLambdaBreeder::new(vec![2], vec![10]).unwrap();
        let parents: Vec<usize> = (0..10).map(|slot| breeder.parent_of(0, slot)).collect();
        assert_eq!(parents, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_from_params_reads_per_subpop_tables() {
        let mut params = ParameterDatabase::new();
        params.set("es.mu.0", "2");
        params.set("es.lambda.0", "8");
        params.set("es.mu.1", "3");
        params.set("es.lambda.1", "9");

        let breeder = MuCommaLambdaBreeder::from_params(&params, 2).unwrap();
        assert_eq!(breeder.mu(), &[2, 3]);
        assert_eq!(breeder.lambda(), &[8, 9]);

        let err = MuCommaLambdaBreeder::from_params(&params, 3).unwrap_err();
        assert!(err.to_string().contains("es.mu.2"));
    }
}
