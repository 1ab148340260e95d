//! Tag-to-constructor registries.
//!
//! Parameter files name breeders and problems by short string tags. Rather
//! than reflective instantiation, the application registers each tag with a
//! factory at startup and the slave resolves tags through the registry when
//! it builds a temporary evolution state.

use crate::Result;
use crate::params::ParameterDatabase;
use crate::problem::Problem;
use crate::state::Breeder;
use brood_error::brood_err;
use std::collections::HashMap;
use std::sync::Arc;

pub type BreederFactory = fn(&ParameterDatabase, usize) -> Result<Box<dyn Breeder>>;
pub type ProblemFactory = fn(&ParameterDatabase) -> Result<Arc<dyn Problem>>;

#[derive(Default)]
pub struct Registry {
    breeders: HashMap<String, BreederFactory>,
    problems: HashMap<String, ProblemFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register_breeder(&mut self, tag: impl Into<String>, factory: BreederFactory) {
        self.breeders.insert(tag.into(), factory);
    }

    pub fn register_problem(&mut self, tag: impl Into<String>, factory: ProblemFactory) {
        self.problems.insert(tag.into(), factory);
    }

    pub fn create_breeder(
        &self,
        tag: &str,
        params: &ParameterDatabase,
        num_subpops: usize,
    ) -> Result<Box<dyn Breeder>> {
        match self.breeders.get(tag) {
            Some(factory) => factory(params, num_subpops),
            None => Err(brood_err!(InvalidConfig: "unknown breeder tag '{}'", tag)),
        }
    }

    pub fn create_problem(&self, tag: &str, params: &ParameterDatabase) -> Result<Arc<dyn Problem>> {
        match self.problems.get(tag) {
            Some(factory) => factory(params),
            None => Err(brood_err!(InvalidConfig: "unknown problem tag '{}'", tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::GenomeSumProblem;

    #[test]
    fn test_unknown_tag_is_a_config_error() {
        let registry = Registry::new();
        let err = registry
            .create_problem("nope", &ParameterDatabase::new())
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_registered_factory_resolves() {
        let mut registry = Registry::new();
        registry.register_problem("sum", |_| Ok(Arc::new(GenomeSumProblem::new())));
        assert!(registry.create_problem("sum", &ParameterDatabase::new()).is_ok());
    }
}
