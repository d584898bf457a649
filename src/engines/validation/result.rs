use serde::{Deserialize, Serialize};

/// Outcome of validating one code string.
///
/// Invariant: `success` is true exactly when `errors` is empty. Warnings
/// never affect success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.success = false;
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// AND success across all layers, concatenating errors and warnings in
    /// layer order. An empty slice aggregates to a vacuous pass.
    pub fn aggregate(results: &[ValidationResult]) -> ValidationResult {
        let mut combined = ValidationResult::ok();
        for result in results {
            combined.success = combined.success && result.success;
            combined.errors.extend(result.errors.iter().cloned());
            combined.warnings.extend(result.warnings.iter().cloned());
        }
        combined
    }
}
