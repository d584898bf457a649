pub mod config;
pub mod mutator;

pub use config::{MutationConfig, MutationTier};
pub use mutator::ExitMutator;
