//! Exit-strategy mutation pipeline for generated trading strategies.
//!
//! Four stages over one strategy's source text: detect the exit logic
//! profile, apply a weighted-random structural edit, regenerate the source,
//! and validate it through three ordered layers with bounded retries.

pub mod engines;
pub mod error;
pub mod syntax;
pub mod types;

pub use engines::detection::{ExitDetector, ExitMechanism, ExitProfile};
pub use engines::mutation::{ExitMutator, MutationConfig, MutationTier};
pub use engines::pipeline::{ExitMutationOperator, MutationResult, DEFAULT_MAX_RETRIES};
pub use engines::validation::{CodeValidator, ValidationResult};
pub use error::{ExitForgeError, Result};
pub use types::{BinOp, CmpOp, Expr, Module, Number, Stmt};
