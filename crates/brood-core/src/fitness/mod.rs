//! Fitness representations and the dominance relation.
//!
//! A fitness is one of three shapes: a single scalar, a multi-objective
//! vector judged by Pareto dominance, or a multi-objective vector carrying an
//! additional archive rank for density-based truncation. The shapes are a
//! tagged sum rather than a class hierarchy; comparing two fitnesses of
//! different shapes (or with incompatible objective specs) is a programming
//! error and panics.

pub mod multi;
pub mod spea2;

pub use multi::{MultiObjective, ObjectiveSpec};
pub use spea2::Spea2Fitness;

use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fitness {
    /// A single real value; higher is better.
    Scalar(f32),
    Multi(MultiObjective),
    Spea2(Spea2Fitness),
}

impl Fitness {
    pub fn kind(&self) -> &'static str {
        match self {
            Fitness::Scalar(_) => "scalar",
            Fitness::Multi(_) => "multi-objective",
            Fitness::Spea2(_) => "spea2",
        }
    }

    /// Strict "is better than" relation: total order on scalars, Pareto
    /// dominance on multi-objective fitnesses, archive-rank order (lower rank
    /// wins) on SPEA2 fitnesses.
    ///
    /// # Panics
    ///
    /// When the two fitnesses have different shapes, or multi-objective
    /// fitnesses that disagree on direction or objective count.
    pub fn better_than(&self, other: &Fitness) -> bool {
        match (self, other) {
            (Fitness::Scalar(a), Fitness::Scalar(b)) => a > b,
            (Fitness::Multi(a), Fitness::Multi(b)) => a.dominates(b),
            (Fitness::Spea2(a), Fitness::Spea2(b)) => a.archive_rank() < b.archive_rank(),
            (a, b) => panic!(
                "cannot compare a {} fitness against a {} fitness",
                a.kind(),
                b.kind()
            ),
        }
    }

    /// True when neither fitness is better than the other.
    pub fn equivalent_to(&self, other: &Fitness) -> bool {
        !self.better_than(other) && !other.better_than(self)
    }

    /// Collapse to a single scalar for consumers that cannot handle multiple
    /// objectives: the maximum objective value. Selection never relies on
    /// this.
    pub fn fitness_scalar(&self) -> f32 {
        match self {
            Fitness::Scalar(value) => *value,
            Fitness::Multi(multi) => multi.max_objective(),
            Fitness::Spea2(spea2) => spea2.objectives().max_objective(),
        }
    }

    pub fn as_multi(&self) -> Option<&MultiObjective> {
        match self {
            Fitness::Multi(multi) => Some(multi),
            Fitness::Spea2(spea2) => Some(spea2.objectives()),
            Fitness::Scalar(_) => None,
        }
    }

    pub fn as_spea2(&self) -> Option<&Spea2Fitness> {
        match self {
            Fitness::Spea2(spea2) => Some(spea2),
            _ => None,
        }
    }

    pub fn as_spea2_mut(&mut self) -> Option<&mut Spea2Fitness> {
        match self {
            Fitness::Spea2(spea2) => Some(spea2),
            _ => None,
        }
    }
}

/// Best-first comparator over fitnesses, for rank-sorting a subpopulation.
/// Mutually non-dominated fitnesses compare equal; the sort order among them
/// is unspecified.
pub fn order(a: &Fitness, b: &Fitness) -> Ordering {
    if a.better_than(b) {
        Ordering::Less
    } else if b.better_than(a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn spec(maximize: bool) -> Arc<ObjectiveSpec> {
        Arc::new(ObjectiveSpec::new(maximize, vec![0.0, 0.0], vec![10.0, 10.0]).unwrap())
    }

    fn multi(values: Vec<f32>, maximize: bool) -> Fitness {
        let mut fitness = MultiObjective::new(spec(maximize));
        fitness.set_objectives(values).unwrap();
        Fitness::Multi(fitness)
    }

    #[test]
    fn test_scalar_total_order() {
        let a = Fitness::Scalar(1.0);
        let b = Fitness::Scalar(2.0);
        assert!(b.better_than(&a));
        assert!(!a.better_than(&b));
        assert!(a.equivalent_to(&a));
    }

    #[test]
    fn test_pareto_dominance_maximize() {
        let a = multi(vec![2.0, 3.0], true);
        let b = multi(vec![2.0, 4.0], true);

        assert!(b.better_than(&a));
        assert!(!a.better_than(&b));
        assert!(!a.equivalent_to(&b));
    }

    #[test]
    fn test_pareto_dominance_minimize() {
        let a = multi(vec![2.0, 3.0], false);
        let b = multi(vec![2.0, 4.0], false);

        assert!(a.better_than(&b));
        assert!(!b.better_than(&a));
    }

    #[test]
    fn test_dominance_is_irreflexive_and_asymmetric() {
        let a = multi(vec![1.0, 9.0], true);
        let b = multi(vec![9.0, 1.0], true);

        assert!(!a.better_than(&a));
        assert!(a.equivalent_to(&a));
        assert!(a.equivalent_to(&b));
        assert!(b.equivalent_to(&a));
        assert!(!(a.better_than(&b) && b.better_than(&a)));
    }

    #[test]
    #[should_panic(expected = "cannot compare")]
    fn test_shape_mismatch_panics() {
        let a = Fitness::Scalar(1.0);
        let b = multi(vec![1.0, 2.0], true);
        a.better_than(&b);
    }

    #[test]
    fn test_fitness_scalar_is_max_objective() {
        let a = multi(vec![2.0, 7.0], true);
        assert_eq!(a.fitness_scalar(), 7.0);
    }
}
