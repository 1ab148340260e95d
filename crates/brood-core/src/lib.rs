pub mod codec;
pub mod fitness;
pub mod genome;
pub mod individual;
pub mod params;
pub mod pipeline;
pub mod population;
pub mod problem;
pub mod registry;
pub mod rng;
pub mod species;
pub mod state;

pub use brood_error::{BroodError, BroodResult, ErrorCode, ErrorSink};

pub type Result<T> = BroodResult<T>;

pub use fitness::{Fitness, MultiObjective, ObjectiveSpec, Spea2Fitness};
pub use genome::{Genome, GenomeKind, TreeNode};
pub use individual::Individual;
pub use params::ParameterDatabase;
pub use pipeline::{BreedContext, BreedingPipeline, ProducedCounter, Selector};
pub use population::{Population, Subpopulation};
pub use problem::{GenomeSumContest, GenomeSumProblem, GroupMember, GroupedProblem, Problem};
pub use registry::Registry;
pub use rng::MersenneTwister;
pub use species::{Species, SpeciesId};
pub use state::{Breeder, Evolution, EvolutionState, EvolveOutcome};

#[cfg(feature = "serde")]
pub use state::Checkpoint;
