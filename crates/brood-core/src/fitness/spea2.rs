use super::multi::MultiObjective;

/// A multi-objective fitness carrying the SPEA2 archive rank assigned by the
/// archive builder: raw strength-based fitness plus a nearest-neighbor
/// density term. Ranks below 1 mark non-dominated individuals; lower is
/// better. The rank is meaningful only within the generation that assigned
/// it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spea2Fitness {
    objectives: MultiObjective,
    archive_rank: f32,
}

impl Spea2Fitness {
    pub fn new(objectives: MultiObjective) -> Self {
        Spea2Fitness {
            objectives,
            archive_rank: 0.0,
        }
    }

    pub fn objectives(&self) -> &MultiObjective {
        &self.objectives
    }

    pub fn objectives_mut(&mut self) -> &mut MultiObjective {
        &mut self.objectives
    }

    pub fn archive_rank(&self) -> f32 {
        self.archive_rank
    }

    pub fn set_archive_rank(&mut self, rank: f32) {
        self.archive_rank = rank;
    }

    /// Rank below 1 means no other individual dominates this one.
    pub fn is_non_dominated(&self) -> bool {
        self.archive_rank < 1.0
    }

    pub fn distance_to(&self, other: &Spea2Fitness) -> f64 {
        self.objectives.distance_to(&other.objectives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::{Fitness, ObjectiveSpec};
    use std::sync::Arc;

    fn spea2(values: Vec<f32>, rank: f32) -> Fitness {
        let spec = Arc::new(ObjectiveSpec::uniform(true, values.len(), 0.0, 10.0).unwrap());
        let mut objectives = MultiObjective::new(spec);
        objectives.set_objectives(values).unwrap();
        let mut fitness = Spea2Fitness::new(objectives);
        fitness.set_archive_rank(rank);
        Fitness::Spea2(fitness)
    }

    #[test]
    fn test_rank_orders_archive_fitness() {
        let a = spea2(vec![1.0, 2.0], 0.25);
        let b = spea2(vec![2.0, 1.0], 1.75);

        assert!(a.better_than(&b));
        assert!(!b.better_than(&a));
        assert!(a.as_spea2().unwrap().is_non_dominated());
        assert!(!b.as_spea2().unwrap().is_non_dominated());
    }

    #[test]
    fn test_equal_ranks_are_equivalent() {
        let a = spea2(vec![1.0, 2.0], 0.5);
        let b = spea2(vec![2.0, 1.0], 0.5);
        assert!(a.equivalent_to(&b));
    }
}
