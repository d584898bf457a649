use crate::engines::detection::{ExitDetector, ExitProfile, EXIT_METHOD_NAME};
use crate::engines::mutation::{ExitMutator, MutationConfig};
use crate::engines::validation::{CodeValidator, ValidationResult};
use crate::error::Result;
use crate::syntax::{parse_module, print_module};
use crate::types::Stmt;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Outcome of one full pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
    /// Regenerated source on success; the last generated candidate on
    /// exhaustion; the original source when mutation never produced code.
    pub code: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub profile: Option<ExitProfile>,
    pub validation: Option<ValidationResult>,
    /// Mutation attempts consumed (1-based; 0 when detection fails).
    pub attempts: usize,
}

/// Wires detector -> mutator -> regeneration -> validator into one call
/// with a bounded retry loop.
///
/// Detection failures are terminal. Validation failures trigger a fresh
/// mutation attempt up to `max_retries`; intermediate failures are never
/// surfaced, only the final result.
pub struct ExitMutationOperator {
    detector: ExitDetector,
    mutator: ExitMutator,
    validator: CodeValidator,
    max_retries: usize,
}

impl Default for ExitMutationOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitMutationOperator {
    pub fn new() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            detector: ExitDetector::new(),
            mutator: ExitMutator::new(),
            validator: CodeValidator::new(),
            max_retries,
        }
    }

    pub fn mutate_exit_strategy(
        &mut self,
        code: &str,
        config: Option<MutationConfig>,
    ) -> MutationResult {
        let config = config.unwrap_or_default();

        let profile = match self.detector.detect(code) {
            Ok(profile) => profile,
            Err(e) => {
                return Self::detection_failure(code, e.to_string(), None);
            }
        };
        if profile.mechanisms.is_empty() {
            return Self::detection_failure(
                code,
                "no exit mechanisms detected".to_string(),
                Some(profile),
            );
        }

        // Parse once for splicing; detection already proved the text parses
        let module = match parse_module(code) {
            Ok(module) => module,
            Err(e) => return Self::detection_failure(code, e.to_string(), Some(profile)),
        };
        let method_index = module
            .body
            .iter()
            .position(|stmt| matches!(stmt, Stmt::FunctionDef { name, .. } if name == EXIT_METHOD_NAME));

        let mut last_code = None;
        let mut last_validation: Option<ValidationResult> = None;

        for attempt in 1..=self.max_retries {
            log::debug!("mutation attempt {}/{}", attempt, self.max_retries);

            let mutated = match self.mutator.mutate(&profile, &config) {
                Ok(mutated) => mutated,
                Err(e) => {
                    if attempt == self.max_retries {
                        log::warn!("mutation failed on final attempt: {}", e);
                        return MutationResult {
                            success: false,
                            code: code.to_string(),
                            errors: vec![e.to_string()],
                            warnings: Vec::new(),
                            profile: Some(profile),
                            validation: last_validation,
                            attempts: attempt,
                        };
                    }
                    continue;
                }
            };

            let new_code = match method_index {
                Some(index) => {
                    let mut regenerated = module.clone();
                    regenerated.body[index] = mutated;
                    print_module(&regenerated)
                }
                // Unreachable in practice: mutate() requires the method node
                None => {
                    print_module(&crate::types::Module { body: vec![mutated] })
                }
            };

            let validation = self.validator.validate(&new_code);
            if validation.success {
                log::debug!("mutation validated on attempt {}", attempt);
                return MutationResult {
                    success: true,
                    code: new_code,
                    errors: Vec::new(),
                    warnings: validation.warnings.clone(),
                    profile: Some(profile),
                    validation: Some(validation),
                    attempts: attempt,
                };
            }

            last_code = Some(new_code);
            last_validation = Some(validation);
        }

        log::warn!(
            "mutation retries exhausted after {} attempts",
            self.max_retries
        );
        let (errors, warnings) = match &last_validation {
            Some(validation) => (validation.errors.clone(), validation.warnings.clone()),
            None => (vec!["mutation retries exhausted".to_string()], Vec::new()),
        };
        MutationResult {
            success: false,
            code: last_code.unwrap_or_else(|| code.to_string()),
            errors,
            warnings,
            profile: Some(profile),
            validation: last_validation,
            attempts: self.max_retries,
        }
    }

    /// Detect-only bypass: extract a profile without mutating anything.
    pub fn detect(&self, code: &str) -> Result<ExitProfile> {
        self.detector.detect(code)
    }

    /// Validate-only bypass: run the three layers over arbitrary text.
    pub fn validate(&self, code: &str) -> ValidationResult {
        self.validator.validate(code)
    }

    fn detection_failure(
        code: &str,
        message: String,
        profile: Option<ExitProfile>,
    ) -> MutationResult {
        MutationResult {
            success: false,
            code: code.to_string(),
            errors: vec![message],
            warnings: Vec::new(),
            profile,
            validation: None,
            attempts: 0,
        }
    }
}
