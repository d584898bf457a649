use exitforge::{CodeValidator, ValidationResult};

fn clean_strategy() -> &'static str {
    "def _apply_exit_strategies(self, df, signals):\n\
     \x20   stop_atr_mult = params.get('stop_atr_mult', 2.0)\n\
     \x20   profit_atr_mult = params.get('profit_atr_mult', 3.0)\n\
     \x20   max_holding_days = params.get('max_holding_days', 20)\n\
     \x20   atr_period = params.get('atr_period', 14)\n\
     \x20   entry_price = self.entry_price\n\
     \x20   highest_price = self.highest_price\n\
     \x20   holding_days = self.holding_days\n\
     \x20   stop_exit = close < entry_price - atr * stop_atr_mult\n\
     \x20   profit_exit = close > entry_price + atr * profit_atr_mult\n\
     \x20   time_exit = holding_days >= max_holding_days\n\
     \x20   any_exit = stop_exit | profit_exit | time_exit\n\
     \x20   signals = signals.reindex(df.index)\n\
     \x20   return signals\n"
}

fn check_invariant(result: &ValidationResult) {
    assert_eq!(result.success, result.errors.is_empty());
}

#[test]
fn clean_strategy_passes_without_findings() {
    let result = CodeValidator::new().validate(clean_strategy());
    check_invariant(&result);
    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
}

#[test]
fn unparseable_code_fails_with_a_single_error() {
    let result = CodeValidator::new().validate("def broken(:");
    check_invariant(&result);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.warnings.is_empty());
}

#[test]
fn missing_exit_routine_is_blocking() {
    let result = CodeValidator::new().validate("stop_exit = close < 1.0\n");
    check_invariant(&result);
    assert!(!result.success);
    assert!(result.errors[0].contains("_apply_exit_strategies"));
    // semantic and type layers are skipped when syntax fails
    assert!(result.warnings.is_empty());
}

#[test]
fn positional_row_access_is_only_a_warning() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   prev = df.iloc[0]\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("iloc")));
}

#[test]
fn non_positive_atr_multiplier_is_blocking() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_atr_mult = params.get('stop_atr_mult', 0.0)\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.contains("must be positive")));
}

#[test]
fn oversized_atr_multiplier_is_only_a_warning() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_atr_mult = params.get('stop_atr_mult', 12.0)\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("unusually large")));
}

#[test]
fn holding_period_outside_policy_is_blocking() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   max_holding_days = params.get('max_holding_days', 500)\n\
                  \x20   time_exit = holding_days >= max_holding_days\n\
                  \x20   any_exit = time_exit | stop_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.contains("between 1 and 252")));
}

#[test]
fn short_atr_period_is_only_a_warning() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   atr_period = params.get('atr_period', 3)\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("5-100")));
}

#[test]
fn missing_combination_warns_that_exits_may_not_apply() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("may not be applied")));
}

#[test]
fn untracked_state_variables_warn() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("highest_price")));
    assert!(result.warnings.iter().any(|w| w.contains("holding_days")));
}

#[test]
fn missing_reindex_warns_about_alignment() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("reindex")));
}

#[test]
fn non_comparison_exit_signal_warns() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = df['stop']\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("may not be boolean")));
}

#[test]
fn missing_final_return_warns() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("return signals")));
}

#[test]
fn findings_accumulate_across_layers_in_order() {
    // iloc (syntax layer) warning must precede the semantic state warning
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   prev = df.iloc[0]\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit | profit_exit\n\
                  \x20   signals = signals.reindex(df.index)\n\
                  \x20   return signals\n";
    let result = CodeValidator::new().validate(source);
    check_invariant(&result);
    let iloc = result.warnings.iter().position(|w| w.contains("iloc")).unwrap();
    let state = result
        .warnings
        .iter()
        .position(|w| w.contains("highest_price"))
        .unwrap();
    assert!(iloc < state);
}
