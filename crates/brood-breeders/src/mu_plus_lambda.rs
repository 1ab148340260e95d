use crate::mu_comma_lambda::{Comparison, MuCommaLambdaBreeder};
use brood_core::{Breeder, EvolutionState, ParameterDatabase, Population, Result};

/// The (μ+λ) variant: identical to (μ,λ) breeding except that the μ parents
/// survive into the next generation alongside their λ children, so each
/// subpopulation grows to λ+μ and the next rank-sort decides between old and
/// new blood.
pub struct MuPlusLambdaBreeder {
    inner: MuCommaLambdaBreeder,
}

impl MuPlusLambdaBreeder {
    pub fn new(mu: Vec<usize>, lambda: Vec<usize>) -> Result<Self> {
        Ok(MuPlusLambdaBreeder {
            inner: MuCommaLambdaBreeder::new(mu, lambda)?,
        })
    }

    pub fn from_params(params: &ParameterDatabase, num_subpops: usize) -> Result<Self> {
        Ok(MuPlusLambdaBreeder {
            inner: MuCommaLambdaBreeder::from_params(params, num_subpops)?,
        })
    }

    pub fn mu(&self) -> &[usize] {
        self.inner.mu()
    }

    pub fn lambda(&self) -> &[usize] {
        self.inner.lambda()
    }

    pub fn comparison(&self) -> &[Comparison] {
        self.inner.comparison()
    }
}

impl Breeder for MuPlusLambdaBreeder {
    fn breed(&mut self, state: &mut EvolutionState) -> Result<Population> {
        let mut next = self.inner.breed_children(state)?;

        // Children occupy slots [0, λ); the retained parents follow them.
        for s in 0..next.len() {
            let parents = self.inner.parents(s)?.to_vec();
            next.subpops[s].individuals.extend(parents);
        }
        Ok(next)
    }
}
