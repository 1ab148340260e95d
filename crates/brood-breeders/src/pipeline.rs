use brood_core::{BreedContext, BreedingPipeline, Individual, Result, Selector};

/// The stock breeding pipeline: draw one parent through the configured
/// selector, clone it, point-perturb the genome.
pub struct MutationPipeline {
    selector: Box<dyn Selector>,
    rate: f32,
}

impl MutationPipeline {
    pub fn new(selector: Box<dyn Selector>, rate: f32) -> Self {
        MutationPipeline { selector, rate }
    }
}

impl BreedingPipeline for MutationPipeline {
    fn produce(&mut self, ctx: &mut BreedContext<'_>) -> Result<Individual> {
        let parent = self.selector.select(ctx)?;

        let mut child = ctx.parents.individuals[parent].clone();
        child.genome.perturb(ctx.rng, self.rate);
        child.invalidate();
        Ok(child)
    }

    fn clone_pipeline(&self) -> Box<dyn BreedingPipeline> {
        Box::new(MutationPipeline {
            selector: self.selector.clone_selector(),
            rate: self.rate,
        })
    }
}
