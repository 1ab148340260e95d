mod dispatch;
mod mu_comma_lambda;
mod mu_plus_lambda;
mod pipeline;
mod spea2;

pub use mu_comma_lambda::{Comparison, MuCommaLambdaBreeder};
pub use mu_plus_lambda::MuPlusLambdaBreeder;
pub use pipeline::MutationPipeline;
pub use spea2::{Spea2Breeder, assign_archive_ranks};
