pub mod operator;

pub use operator::{ExitMutationOperator, MutationResult, DEFAULT_MAX_RETRIES};
