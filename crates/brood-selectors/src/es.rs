use brood_core::{BreedContext, Selector};
use brood_error::{brood_bail, brood_err};

/// Evolution-strategy parent selection.
///
/// Under a (μ,λ) breeder the child slots are laid out in blocks of λ/μ per
/// parent, so the parent of the child currently being produced is simply the
/// slot index divided by the block width, taken from the top-μ of the
/// rank-sorted subpopulation. The selector records itself on the thread's
/// production counter; the breeder verifies afterwards that exactly one
/// selection happened per child, whatever pipeline graph sat in between.
#[derive(Debug, Clone, Default)]
pub struct EsSelector;

impl EsSelector {
    pub fn new() -> Self {
        EsSelector
    }
}

impl Selector for EsSelector {
    fn select(&mut self, ctx: &mut BreedContext<'_>) -> brood_core::Result<usize> {
        if ctx.mu == 0 || ctx.lambda == 0 {
            brood_bail!(Breed:
                "evolution-strategy selection is only usable under a (mu,lambda) breeder");
        }

        let per_parent = ctx.lambda / ctx.mu;
        let position = ctx.counter.position();
        if position >= ctx.lambda {
            brood_bail!(Breed:
                "child slot {} is outside lambda {} for subpopulation {}",
                position, ctx.lambda, ctx.subpop);
        }

        let parent = position / per_parent;
        if parent >= ctx.parents.len() {
            return Err(brood_err!(Breed:
                "parent {} does not exist in subpopulation {} of size {}",
                parent, ctx.subpop, ctx.parents.len()));
        }

        ctx.counter.record();
        Ok(parent)
    }

    fn clone_selector(&self) -> Box<dyn Selector> {
        Box::new(self.clone())
    }
}
