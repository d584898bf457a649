use super::config::{MutationConfig, MutationTier};
use crate::engines::detection::{ExitMechanism, ExitProfile};
use crate::error::{ExitForgeError, Result};
use crate::types::{Expr, Number, Stmt};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
enum StructuralOp {
    Add,
    Remove,
    Swap,
}

/// Applies one weighted-random structural edit to a copy of the exit
/// routine. The profile and its AST are never mutated in place.
pub struct ExitMutator {
    rng: StdRng,
}

impl Default for ExitMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitMutator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a mutated clone of `profile.method_node`. Serializing it back
    /// to source text is the operator's job.
    pub fn mutate(&mut self, profile: &ExitProfile, config: &MutationConfig) -> Result<Stmt> {
        config.validate()?;

        let mut method = profile.method_node.clone().ok_or_else(|| {
            ExitForgeError::Precondition(
                "exit routine not found; nothing to mutate".to_string(),
            )
        })?;

        if let Some(seed) = config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let tier = match config.mutation_tier {
            Some(tier) => tier,
            None => self.select_tier(&config.probability_weights)?,
        };
        log::trace!("selected mutation tier: {}", tier.as_str());

        let Stmt::FunctionDef { body, .. } = &mut method else {
            return Err(ExitForgeError::Mutation(
                "profile method node is not a function definition".to_string(),
            ));
        };

        match tier {
            MutationTier::Parametric => {
                self.apply_parametric(body, &config.parameter_ranges);
            }
            MutationTier::Structural => self.apply_structural(body, profile),
            MutationTier::Relational => self.apply_relational(body),
        }

        Ok(method)
    }

    fn select_tier(&mut self, weights: &BTreeMap<MutationTier, f64>) -> Result<MutationTier> {
        let entries: Vec<(MutationTier, f64)> = MutationTier::ALL
            .iter()
            .filter_map(|tier| {
                let weight = weights.get(tier).copied().unwrap_or(0.0);
                (weight > 0.0).then_some((*tier, weight))
            })
            .collect();
        let dist = WeightedIndex::new(entries.iter().map(|(_, w)| *w)).map_err(|e| {
            ExitForgeError::Configuration(format!("invalid probability weights: {}", e))
        })?;
        Ok(entries[dist.sample(&mut self.rng)].0)
    }

    /// Rewrite the default literal of every recognized keyed-default
    /// accessor whose key has a configured range. Prefers a value different
    /// from the current one whenever the range offers an alternative.
    fn apply_parametric(&mut self, body: &mut [Stmt], ranges: &BTreeMap<String, Vec<Number>>) {
        for stmt in body.iter_mut() {
            match stmt {
                Stmt::Assign { value, .. }
                | Stmt::Expr { value }
                | Stmt::Return { value: Some(value) } => {
                    self.rewrite_keyed_defaults(value, ranges);
                }
                _ => {}
            }
        }
    }

    fn rewrite_keyed_defaults(&mut self, expr: &mut Expr, ranges: &BTreeMap<String, Vec<Number>>) {
        let hit = expr
            .keyed_default()
            .and_then(|(key, current)| ranges.get(key).map(|range| (range.clone(), current)));
        if let Some((range, current)) = hit {
            let alternatives: Vec<Number> = range
                .iter()
                .copied()
                .filter(|candidate| !candidate.approx_eq(&current))
                .collect();
            let pool = if alternatives.is_empty() { range } else { alternatives };
            let choice = pool[self.rng.gen_range(0..pool.len())];
            if let Expr::Call { args, .. } = expr {
                args[1] = Expr::Num(choice);
            }
            return;
        }

        match expr {
            Expr::Attribute { value, .. } => self.rewrite_keyed_defaults(value, ranges),
            Expr::Subscript { value, index } => {
                self.rewrite_keyed_defaults(value, ranges);
                self.rewrite_keyed_defaults(index, ranges);
            }
            Expr::Call { func, args } => {
                self.rewrite_keyed_defaults(func, ranges);
                for arg in args {
                    self.rewrite_keyed_defaults(arg, ranges);
                }
            }
            Expr::Compare { left, right, .. } | Expr::BinOp { left, right, .. } => {
                self.rewrite_keyed_defaults(left, ranges);
                self.rewrite_keyed_defaults(right, ranges);
            }
            Expr::Or(operands) => {
                for operand in operands {
                    self.rewrite_keyed_defaults(operand, ranges);
                }
            }
            Expr::Name(_) | Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) => {}
        }
    }

    /// Add, remove or swap one mechanism operand of the combination OR.
    /// At least one mechanism always remains active; without a combination
    /// node the tier is a no-op for this attempt.
    fn apply_structural(&mut self, body: &mut [Stmt], profile: &ExitProfile) {
        let Some(offset) = profile.combination_offset() else {
            return;
        };
        let Some(Stmt::Assign { value, .. }) = body.get_mut(offset) else {
            return;
        };
        let Expr::Or(existing) = &mut *value else {
            return;
        };
        let mut operands = existing.clone();

        let present: Vec<usize> = operands
            .iter()
            .enumerate()
            .filter_map(|(i, operand)| match operand {
                Expr::Name(name) if ExitMechanism::from_variable(name).is_some() => Some(i),
                _ => None,
            })
            .collect();
        let missing: Vec<ExitMechanism> = ExitMechanism::ALL
            .iter()
            .copied()
            .filter(|mechanism| {
                !operands.iter().any(|operand| {
                    matches!(operand, Expr::Name(name) if name == mechanism.variable_name())
                })
            })
            .collect();

        let mut allowed = Vec::new();
        if !missing.is_empty() {
            allowed.push(StructuralOp::Add);
        }
        if present.len() >= 2 {
            allowed.push(StructuralOp::Remove);
            allowed.push(StructuralOp::Swap);
        }
        let Some(op) = allowed.get(self.rng.gen_range(0..allowed.len().max(1))).copied() else {
            return;
        };

        match op {
            StructuralOp::Add => {
                let mechanism = missing[self.rng.gen_range(0..missing.len())];
                operands.push(Expr::Name(mechanism.variable_name().to_string()));
            }
            StructuralOp::Remove => {
                let victim = present[self.rng.gen_range(0..present.len())];
                operands.remove(victim);
            }
            StructuralOp::Swap => {
                let a = self.rng.gen_range(0..present.len());
                let mut b = self.rng.gen_range(0..present.len() - 1);
                if b >= a {
                    b += 1;
                }
                operands.swap(present[a], present[b]);
            }
        }

        *value = if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Or(operands)
        };
    }

    /// Swap the comparison operator of one mechanism assignment for its
    /// strict/inclusive partner. Direction is always preserved.
    fn apply_relational(&mut self, body: &mut [Stmt]) {
        let candidates: Vec<usize> = body
            .iter()
            .enumerate()
            .filter_map(|(i, stmt)| match stmt {
                Stmt::Assign {
                    target: Expr::Name(name),
                    value: Expr::Compare { op, .. },
                } if ExitMechanism::from_variable(name).is_some()
                    && op.direction_preserving_swap().is_some() =>
                {
                    Some(i)
                }
                _ => None,
            })
            .collect();
        if candidates.is_empty() {
            return;
        }

        let pick = candidates[self.rng.gen_range(0..candidates.len())];
        if let Stmt::Assign {
            value: Expr::Compare { op, .. },
            ..
        } = &mut body[pick]
        {
            if let Some(swapped) = op.direction_preserving_swap() {
                *op = swapped;
            }
        }
    }
}
