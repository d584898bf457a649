use crate::types::{Number, Stmt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable name that combines the individual exit signals.
pub const COMBINATION_VARIABLE: &str = "any_exit";

/// Reserved `ast_nodes` key for the combination assignment.
pub const COMBINATION_KEY: &str = "combination";

/// One of the three recognized ways a strategy closes a position early.
///
/// Variant order is the canonical sort order of mechanism names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ExitMechanism {
    ProfitTarget,
    StopLoss,
    TimeBased,
}

impl ExitMechanism {
    pub const ALL: [ExitMechanism; 3] = [
        ExitMechanism::ProfitTarget,
        ExitMechanism::StopLoss,
        ExitMechanism::TimeBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitMechanism::ProfitTarget => "profit_target",
            ExitMechanism::StopLoss => "stop_loss",
            ExitMechanism::TimeBased => "time_based",
        }
    }

    /// The variable a strategy binds this mechanism's signal to.
    pub fn variable_name(&self) -> &'static str {
        match self {
            ExitMechanism::ProfitTarget => "profit_exit",
            ExitMechanism::StopLoss => "stop_exit",
            ExitMechanism::TimeBased => "time_exit",
        }
    }

    pub fn from_variable(name: &str) -> Option<ExitMechanism> {
        match name {
            "profit_exit" => Some(ExitMechanism::ProfitTarget),
            "stop_exit" => Some(ExitMechanism::StopLoss),
            "time_exit" => Some(ExitMechanism::TimeBased),
            _ => None,
        }
    }
}

/// Extracted shape of one strategy's exit logic.
///
/// Created fresh by every `detect()` call and consumed once by the mutator;
/// never persisted by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitProfile {
    /// Mechanisms present, sorted by canonical name.
    pub mechanisms: Vec<ExitMechanism>,
    /// Recognized parameter name -> current default value.
    pub parameters: BTreeMap<String, Number>,
    /// Mechanism name (or [`COMBINATION_KEY`]) -> statement offsets inside
    /// the exit routine body. Offsets give the mutator targeted access
    /// without re-scanning the tree.
    pub ast_nodes: BTreeMap<String, Vec<usize>>,
    /// Cloned subtree of the exit routine, when present.
    pub method_node: Option<Stmt>,
}

impl ExitProfile {
    pub fn has_method(&self) -> bool {
        self.method_node.is_some()
    }

    /// Offset of the combination assignment inside the routine body.
    pub fn combination_offset(&self) -> Option<usize> {
        self.ast_nodes
            .get(COMBINATION_KEY)
            .and_then(|offsets| offsets.first().copied())
    }

    pub fn mechanism_names(&self) -> Vec<&'static str> {
        self.mechanisms.iter().map(ExitMechanism::as_str).collect()
    }
}
