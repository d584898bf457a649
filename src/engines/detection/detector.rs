use super::profile::{ExitMechanism, ExitProfile, COMBINATION_KEY, COMBINATION_VARIABLE};
use crate::error::Result;
use crate::syntax::parse_module;
use crate::types::{Expr, Module, Stmt};
use std::collections::BTreeMap;

/// Exact name of the routine holding the exit logic.
pub const EXIT_METHOD_NAME: &str = "_apply_exit_strategies";

/// Fixed vocabulary of parameter keys harvested from keyed-default accessors.
pub const RECOGNIZED_PARAMETERS: [&str; 4] = [
    "stop_atr_mult",
    "profit_atr_mult",
    "max_holding_days",
    "atr_period",
];

/// Locates the exit routine and extracts mechanisms, parameter defaults
/// and the syntax nodes implementing each mechanism. Pure function of the
/// source text.
#[derive(Debug, Default)]
pub struct ExitDetector;

impl ExitDetector {
    pub fn new() -> Self {
        Self
    }

    /// A parse failure is fatal; a missing exit routine is not, it just
    /// leaves `method_node` empty.
    pub fn detect(&self, code: &str) -> Result<ExitProfile> {
        let module = parse_module(code)?;

        let mut mechanisms = Vec::new();
        let mut parameters = BTreeMap::new();
        module.for_each_stmt(&mut |stmt| {
            // Subscript/attribute targets are not mechanism bindings
            if let Stmt::Assign {
                target: Expr::Name(name),
                value,
            } = stmt
            {
                if let Some(mechanism) = ExitMechanism::from_variable(name) {
                    mechanisms.push(mechanism);
                }
                if let Some((key, default)) = value.keyed_default() {
                    if RECOGNIZED_PARAMETERS.contains(&key) {
                        parameters.insert(key.to_string(), default);
                    }
                }
            }
        });
        mechanisms.sort();
        mechanisms.dedup();

        let method = module.find_function(EXIT_METHOD_NAME);
        let ast_nodes = method
            .map(Self::map_method_nodes)
            .unwrap_or_default();

        Ok(ExitProfile {
            mechanisms,
            parameters,
            ast_nodes,
            method_node: method.cloned(),
        })
    }

    fn map_method_nodes(method: &Stmt) -> BTreeMap<String, Vec<usize>> {
        let mut ast_nodes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let Stmt::FunctionDef { body, .. } = method else {
            return ast_nodes;
        };
        for (offset, stmt) in body.iter().enumerate() {
            let Stmt::Assign {
                target: Expr::Name(name),
                value,
            } = stmt
            else {
                continue;
            };
            if let Some(mechanism) = ExitMechanism::from_variable(name) {
                ast_nodes
                    .entry(mechanism.as_str().to_string())
                    .or_default()
                    .push(offset);
            }
            // The combination only counts when it is an OR of signals
            if name == COMBINATION_VARIABLE && matches!(value, Expr::Or(_)) {
                ast_nodes
                    .entry(COMBINATION_KEY.to_string())
                    .or_default()
                    .push(offset);
            }
        }
        ast_nodes
    }
}

/// Scan a module for every recognized keyed-default accessor, anywhere in
/// an expression. Shared with the validator's parameter-bounds check.
pub fn collect_parameters(module: &Module) -> Vec<(String, crate::types::Number)> {
    let mut found = Vec::new();
    module.for_each_expr(&mut |expr| {
        if let Some((key, default)) = expr.keyed_default() {
            if RECOGNIZED_PARAMETERS.contains(&key) {
                found.push((key.to_string(), default));
            }
        }
    });
    found
}
