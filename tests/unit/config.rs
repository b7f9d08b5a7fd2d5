use super::*;

fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn empty_object_is_default() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.backend, BackendKind::Auto);
    assert!(config.optimizer.enabled);
    assert_eq!(config.optimizer.learning_rate, 0.01);
}

#[test]
fn file_values_are_read() {
    let config = Config::from_json_str(
        r#"{ "backend": "software", "optimizer": { "enabled": false, "learning_rate": 0.05 } }"#,
    )
    .unwrap();
    assert_eq!(config.backend, BackendKind::Software);
    assert!(!config.optimizer.enabled);
    assert_eq!(config.optimizer.learning_rate, 0.05);
}

#[test]
fn bad_json_and_bad_rates_are_config_errors() {
    assert!(matches!(
        Config::from_json_str("{ backend"),
        Err(FivedError::Config(_))
    ));
    assert!(matches!(
        Config::from_json_str(r#"{ "optimizer": { "learning_rate": -1.0 } }"#),
        Err(FivedError::Config(_))
    ));
}

#[test]
fn env_overrides_file_values() {
    let config = Config::default()
        .apply_env(env(&[
            ("FIVED_BACKEND", "gdi"),
            ("FIVED_OPTIMIZER", "off"),
            ("FIVED_LEARNING_RATE", " 0.2 "),
        ]))
        .unwrap();
    assert_eq!(config.backend, BackendKind::Software);
    assert!(!config.optimizer.enabled);
    assert_eq!(config.optimizer.learning_rate, 0.2);
}

#[test]
fn unset_env_keeps_values() {
    let base = Config {
        backend: BackendKind::Gpu,
        ..Config::default()
    };
    assert_eq!(base.clone().apply_env(env(&[])).unwrap(), base);
}

#[test]
fn invalid_env_values_are_rejected() {
    assert!(Config::default().apply_env(env(&[("FIVED_BACKEND", "metal")])).is_err());
    assert!(Config::default().apply_env(env(&[("FIVED_LEARNING_RATE", "fast")])).is_err());
}

#[test]
fn missing_file_is_a_config_error() {
    let err = Config::from_json_path(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, FivedError::Config(_)));
}
