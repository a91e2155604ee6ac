mod decrement;
mod substitution;

pub use decrement::{DecrementJob, run_decrement};
pub use substitution::{SubstitutionJob, run_substitution};
