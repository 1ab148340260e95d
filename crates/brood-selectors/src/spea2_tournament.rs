use brood_core::{BreedContext, Selector};
use brood_error::brood_bail;

/// Tournament selection over the SPEA2 archive.
///
/// After elites are loaded the archive occupies the last `archive_size`
/// slots of the old subpopulation, so the tournament samples only that tail
/// and keeps the entrant with the best (lowest) archive rank.
#[derive(Debug, Clone)]
pub struct Spea2TournamentSelector {
    size: usize,
}

impl Spea2TournamentSelector {
    pub fn new(size: usize) -> Self {
        Spea2TournamentSelector { size: size.max(1) }
    }
}

impl Default for Spea2TournamentSelector {
    fn default() -> Self {
        Spea2TournamentSelector::new(2)
    }
}

impl Selector for Spea2TournamentSelector {
    fn select(&mut self, ctx: &mut BreedContext<'_>) -> brood_core::Result<usize> {
        let archive = ctx.parents.archive_range();
        if archive.is_empty() {
            brood_bail!(Breed:
                "subpopulation {} has no archive to select from", ctx.subpop);
        }
        if ctx.parents.individuals[archive.start].fitness.as_spea2().is_none() {
            brood_bail!(Breed:
                "archive tournament requires spea2 fitness in subpopulation {}", ctx.subpop);
        }

        let mut best = archive.start + ctx.rng.below(archive.len());
        for _ in 1..self.size {
            let entrant = archive.start + ctx.rng.below(archive.len());
            if ctx.parents.individuals[entrant]
                .fitness
                .better_than(&ctx.parents.individuals[best].fitness)
            {
                best = entrant;
            }
        }

        Ok(best)
    }

    fn clone_selector(&self) -> Box<dyn Selector> {
        Box::new(self.clone())
    }
}
