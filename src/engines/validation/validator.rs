use super::result::ValidationResult;
use crate::engines::detection::{
    collect_parameters, ExitMechanism, COMBINATION_VARIABLE, EXIT_METHOD_NAME,
};
use crate::syntax::parse_module;
use crate::types::{Expr, Module, Stmt};
use std::collections::BTreeSet;

/// State the exit logic is expected to track between bars.
const STATE_VARIABLES: [&str; 3] = ["entry_price", "highest_price", "holding_days"];

/// Variable the exit routine is expected to return.
const RESULT_VARIABLE: &str = "signals";

/// Runs three ordered validation layers over regenerated source text:
/// syntax, semantics, and type shape. Semantic and type checks are skipped
/// when the syntax layer reports any error.
///
/// Only parse failures, a missing exit routine, and out-of-policy parameter
/// values block; everything else is a warning. The asymmetry keeps the
/// evolutionary search permissive instead of stalling on advisory findings.
#[derive(Debug, Default)]
pub struct CodeValidator;

impl CodeValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, code: &str) -> ValidationResult {
        let (syntax, module) = self.check_syntax(code);
        let mut layers = vec![syntax];
        if layers[0].success {
            if let Some(module) = &module {
                layers.push(self.check_semantics(module));
                layers.push(self.check_types(module));
            }
        }
        ValidationResult::aggregate(&layers)
    }

    fn check_syntax(&self, code: &str) -> (ValidationResult, Option<Module>) {
        let mut result = ValidationResult::ok();
        let module = match parse_module(code) {
            Ok(module) => module,
            Err(e) => {
                result.add_error(format!("syntax check failed: {}", e));
                return (result, None);
            }
        };

        match module.find_function(EXIT_METHOD_NAME) {
            Some(method) => {
                if method_uses_positional_access(method) {
                    result.add_warning(
                        "positional row access (.iloc) in exit logic; prefer label-based access",
                    );
                }
            }
            None => {
                result.add_error(format!(
                    "exit routine '{}' not found",
                    EXIT_METHOD_NAME
                ));
            }
        }

        (result, Some(module))
    }

    fn check_semantics(&self, module: &Module) -> ValidationResult {
        let mut result = ValidationResult::ok();

        // Parameter values must stay within policy bounds
        for (key, value) in collect_parameters(module) {
            let v = value.as_f64();
            match key.as_str() {
                "stop_atr_mult" | "profit_atr_mult" => {
                    if v <= 0.0 {
                        result.add_error(format!("{} must be positive, got {}", key, value));
                    } else if v > 10.0 {
                        result.add_warning(format!(
                            "{} of {} is unusually large for an ATR multiplier",
                            key, value
                        ));
                    }
                }
                "max_holding_days" => {
                    if !(1.0..=252.0).contains(&v) {
                        result.add_error(format!(
                            "max_holding_days must be between 1 and 252 trading days, got {}",
                            value
                        ));
                    }
                }
                "atr_period" => {
                    if !(5.0..=100.0).contains(&v) {
                        result.add_warning(format!(
                            "atr_period of {} is outside the usual 5-100 range",
                            value
                        ));
                    }
                }
                _ => {}
            }
        }

        if !has_combination_assignment(module) {
            result.add_warning(format!(
                "no '{}' combination assignment found; exits may not be applied",
                COMBINATION_VARIABLE
            ));
        }

        let seen = collect_identifiers(module);
        for state in STATE_VARIABLES {
            if !seen.contains(state) {
                result.add_warning(format!(
                    "state variable '{}' is never tracked; exit state management looks incomplete",
                    state
                ));
            }
        }

        result
    }

    fn check_types(&self, module: &Module) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if !has_reindex_call(module) {
            result.add_warning(
                "no reindex call found; exit signals may be misaligned with the price index",
            );
        }

        module.for_each_stmt(&mut |stmt| {
            if let Stmt::Assign {
                target: Expr::Name(name),
                value,
            } = stmt
            {
                if ExitMechanism::from_variable(name).is_some()
                    && !matches!(value, Expr::Compare { .. })
                {
                    result.add_warning(format!(
                        "'{}' is not assigned from a comparison; exit signal may not be boolean",
                        name
                    ));
                }
            }
        });

        if let Some(Stmt::FunctionDef { body, .. }) = module.find_function(EXIT_METHOD_NAME) {
            let returns_signals = matches!(
                body.last(),
                Some(Stmt::Return { value: Some(Expr::Name(name)) }) if name == RESULT_VARIABLE
            );
            if !returns_signals {
                result.add_warning(format!(
                    "exit routine does not end with 'return {}'",
                    RESULT_VARIABLE
                ));
            }
        }

        result
    }
}

fn collect_identifiers(module: &Module) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    module.for_each_expr(&mut |expr| match expr {
        Expr::Name(name) => {
            seen.insert(name.clone());
        }
        Expr::Attribute { attr, .. } => {
            seen.insert(attr.clone());
        }
        _ => {}
    });
    seen
}

fn method_uses_positional_access(method: &Stmt) -> bool {
    let Stmt::FunctionDef { body, .. } = method else {
        return false;
    };
    let mut found = false;
    for stmt in body {
        for expr in stmt.exprs() {
            expr.for_each(&mut |node| {
                if matches!(node, Expr::Attribute { attr, .. } if attr == "iloc") {
                    found = true;
                }
            });
        }
    }
    found
}

fn has_combination_assignment(module: &Module) -> bool {
    let mut found = false;
    module.for_each_stmt(&mut |stmt| {
        if matches!(
            stmt,
            Stmt::Assign { target: Expr::Name(name), .. } if name == COMBINATION_VARIABLE
        ) {
            found = true;
        }
    });
    found
}

fn has_reindex_call(module: &Module) -> bool {
    let mut found = false;
    module.for_each_expr(&mut |expr| {
        if let Expr::Call { func, .. } = expr {
            if matches!(func.as_ref(), Expr::Attribute { attr, .. } if attr == "reindex") {
                found = true;
            }
        }
    });
    found
}
