use crate::Result;
use brood_error::{brood_bail, brood_err};
use std::sync::Arc;

/// Per-objective direction and bounds, shared by every fitness of a species.
/// One allocation per species; individuals hold an [Arc] handle.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveSpec {
    maximize: bool,
    min: Vec<f32>,
    max: Vec<f32>,
}

impl ObjectiveSpec {
    pub fn new(maximize: bool, min: Vec<f32>, max: Vec<f32>) -> Result<Self> {
        if min.len() != max.len() || min.is_empty() {
            brood_bail!(InvalidConfig:
                "multi.num-objectives: {} min bounds but {} max bounds", min.len(), max.len());
        }

        for (i, (lo, hi)) in min.iter().zip(max.iter()).enumerate() {
            if !(lo < hi) {
                brood_bail!(InvalidConfig:
                    "multi.min.{i} ({lo}) must be below multi.max.{i} ({hi})");
            }
        }

        Ok(ObjectiveSpec { maximize, min, max })
    }

    /// Uniform bounds across `count` objectives.
    pub fn uniform(maximize: bool, count: usize, min: f32, max: f32) -> Result<Self> {
        ObjectiveSpec::new(maximize, vec![min; count], vec![max; count])
    }

    pub fn maximize(&self) -> bool {
        self.maximize
    }

    pub fn num_objectives(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f32] {
        &self.min
    }

    pub fn max(&self) -> &[f32] {
        &self.max
    }

    /// The least desirable legal value for objective `i`.
    pub fn worst(&self, i: usize) -> f32 {
        if self.maximize { self.min[i] } else { self.max[i] }
    }
}

/// An ordered vector of objective values judged by Pareto dominance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiObjective {
    objectives: Vec<f32>,
    spec: Arc<ObjectiveSpec>,
}

impl MultiObjective {
    /// A fresh fitness with every objective at its worst bound.
    pub fn new(spec: Arc<ObjectiveSpec>) -> Self {
        let objectives = (0..spec.num_objectives()).map(|i| spec.worst(i)).collect();
        MultiObjective { objectives, spec }
    }

    pub fn objectives(&self) -> &[f32] {
        &self.objectives
    }

    pub fn spec(&self) -> &Arc<ObjectiveSpec> {
        &self.spec
    }

    pub fn maximize(&self) -> bool {
        self.spec.maximize
    }

    /// Replace the objective vector. The length must match the spec. A
    /// non-finite entry is replaced by the worst bound for that objective and
    /// a warning is logged.
    pub fn set_objectives(&mut self, values: Vec<f32>) -> Result<()> {
        if values.len() != self.spec.num_objectives() {
            return Err(brood_err!(Fitness:
                "expected {} objectives, got {}", self.spec.num_objectives(), values.len()));
        }

        self.objectives = values;
        for (i, value) in self.objectives.iter_mut().enumerate() {
            if !value.is_finite() {
                let worst = self.spec.worst(i);
                tracing::warn!(objective = i, value = %value, clamped = worst,
                    "non-finite objective replaced with worst bound");
                *value = worst;
            }
        }
        Ok(())
    }

    /// Pareto strict dominance: at least as good on every objective and
    /// strictly better on at least one.
    ///
    /// # Panics
    ///
    /// When the fitnesses disagree on direction or objective count.
    pub fn dominates(&self, other: &MultiObjective) -> bool {
        if self.spec.maximize != other.spec.maximize
            || self.objectives.len() != other.objectives.len()
        {
            panic!(
                "fitness mismatch: {} objectives ({}) vs {} objectives ({})",
                self.objectives.len(),
                if self.spec.maximize { "maximize" } else { "minimize" },
                other.objectives.len(),
                if other.spec.maximize { "maximize" } else { "minimize" },
            );
        }

        let mut better_in_any = false;
        for (a, b) in self.objectives.iter().zip(other.objectives.iter()) {
            if self.spec.maximize {
                if a < b {
                    return false;
                }
                if a > b {
                    better_in_any = true;
                }
            } else {
                if a > b {
                    return false;
                }
                if a < b {
                    better_in_any = true;
                }
            }
        }

        better_in_any
    }

    /// Euclidean distance in objective space.
    pub fn distance_to(&self, other: &MultiObjective) -> f64 {
        self.objectives
            .iter()
            .zip(other.objectives.iter())
            .map(|(a, b)| {
                let d = (*a - *b) as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn max_objective(&self) -> f32 {
        self.objectives.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
    }
}
