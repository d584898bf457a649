use exitforge::{ExitDetector, ExitForgeError, ExitMechanism, Number};

fn sample_strategy() -> &'static str {
    "def _apply_exit_strategies(self, df, signals):\n\
     \x20   stop_atr_mult = params.get('stop_atr_mult', 2.0)\n\
     \x20   stop_exit = close < entry_price * 0.95\n\
     \x20   profit_exit = close > entry_price * 1.1\n\
     \x20   any_exit = stop_exit | profit_exit\n\
     \x20   signals = signals.reindex(df.index)\n\
     \x20   return signals\n"
}

#[test]
fn detects_mechanisms_in_sorted_order() {
    let detector = ExitDetector::new();
    let profile = detector.detect(sample_strategy()).unwrap();

    assert_eq!(
        profile.mechanisms,
        vec![ExitMechanism::ProfitTarget, ExitMechanism::StopLoss]
    );
    assert_eq!(profile.mechanism_names(), vec!["profit_target", "stop_loss"]);
}

#[test]
fn extracts_recognized_parameters() {
    let detector = ExitDetector::new();
    let profile = detector.detect(sample_strategy()).unwrap();

    assert_eq!(profile.parameters.len(), 1);
    assert!(profile.parameters["stop_atr_mult"].approx_eq(&Number::Float(2.0)));
}

#[test]
fn detection_is_idempotent() {
    let detector = ExitDetector::new();
    let first = detector.detect(sample_strategy()).unwrap();
    let second = detector.detect(sample_strategy()).unwrap();

    assert_eq!(first.mechanisms, second.mechanisms);
    assert_eq!(first.parameters, second.parameters);
    assert_eq!(first.ast_nodes, second.ast_nodes);
}

#[test]
fn records_ast_nodes_per_mechanism_and_combination() {
    let detector = ExitDetector::new();
    let profile = detector.detect(sample_strategy()).unwrap();

    assert_eq!(profile.ast_nodes["stop_loss"], vec![1]);
    assert_eq!(profile.ast_nodes["profit_target"], vec![2]);
    assert_eq!(profile.combination_offset(), Some(3));
    assert!(profile.has_method());
}

#[test]
fn missing_routine_is_a_soft_condition() {
    let source = "stop_exit = close < entry_price * 0.95\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();

    assert!(profile.method_node.is_none());
    assert_eq!(profile.mechanisms, vec![ExitMechanism::StopLoss]);
    assert!(profile.ast_nodes.is_empty());
}

#[test]
fn parse_failure_is_fatal() {
    let detector = ExitDetector::new();
    let result = detector.detect("stop_exit = $$$");
    assert!(matches!(result, Err(ExitForgeError::Parse(_))));
}

#[test]
fn non_literal_defaults_are_silently_ignored() {
    let source = "stop_atr_mult = params.get('stop_atr_mult', default_mult)\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();
    assert!(profile.parameters.is_empty());
}

#[test]
fn unknown_parameter_keys_are_ignored() {
    let source = "lookback = params.get('lookback', 30)\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();
    assert!(profile.parameters.is_empty());
}

#[test]
fn subscript_targets_are_not_mechanism_bindings() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   df['stop_exit'] = close < entry_price\n\
                  \x20   return signals\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();
    assert!(profile.mechanisms.is_empty());
    assert!(profile.ast_nodes.is_empty());
}

#[test]
fn combination_requires_a_boolean_or_expression() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_exit = close < entry_price\n\
                  \x20   any_exit = stop_exit\n\
                  \x20   return signals\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();
    assert_eq!(profile.combination_offset(), None);
    assert_eq!(profile.ast_nodes["stop_loss"], vec![0]);
}

#[test]
fn full_strategy_yields_all_three_mechanisms() {
    let source = "def _apply_exit_strategies(self, df, signals):\n\
                  \x20   stop_atr_mult = params.get('stop_atr_mult', 2.0)\n\
                  \x20   profit_atr_mult = params.get('profit_atr_mult', 3.0)\n\
                  \x20   max_holding_days = params.get('max_holding_days', 20)\n\
                  \x20   atr_period = params.get('atr_period', 14)\n\
                  \x20   stop_exit = close < entry_price - atr * stop_atr_mult\n\
                  \x20   profit_exit = close > entry_price + atr * profit_atr_mult\n\
                  \x20   time_exit = holding_days >= max_holding_days\n\
                  \x20   any_exit = stop_exit | profit_exit | time_exit\n\
                  \x20   return signals\n";
    let detector = ExitDetector::new();
    let profile = detector.detect(source).unwrap();

    assert_eq!(
        profile.mechanism_names(),
        vec!["profit_target", "stop_loss", "time_based"]
    );
    assert_eq!(profile.parameters.len(), 4);
    assert!(profile.parameters["max_holding_days"].approx_eq(&Number::Integer(20)));
    assert_eq!(profile.combination_offset(), Some(7));
}
