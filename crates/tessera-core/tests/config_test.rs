use std::collections::HashMap;
use std::io::Write;

use tessera_core::config::*;
use tessera_core::errors::ConfigError;
use tessera_core::tile::Axis;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = TesseraConfig::from_toml("").unwrap();

    // Storage defaults
    assert_eq!(config.storage.container_path, "tessera.tess");
    assert_eq!(config.storage.domain_code, "general");
    assert_eq!(config.storage.compression_level, 3);
    assert_eq!(config.storage.hot_cache_capacity, 1_024);
    assert!(!config.storage.truncate_torn_tail);

    // Spatial defaults
    assert_eq!(config.spatial.cells_per_axis, 16);
    assert_eq!(config.spatial.domains.len(), 1);
    let general = config.spatial.domain("general").unwrap();
    assert_eq!(general.low_certainty_threshold, 30.0);
    assert_eq!(general.range(Axis::Granularity), AxisRange::new(1.0, 1000.0));
    assert_eq!(config.spatial.weights.per_expert, 20.0);

    // Judge defaults
    assert_eq!(config.judge.max_attempts, 2);
    assert_eq!(config.judge.complexity_threshold, 0.5);
    assert_eq!(config.judge.factual_weight, 0.6);
    assert_eq!(config.judge.consistency_weight, 0.4);

    // Marks defaults
    assert_eq!(config.marks.community_confidence, 0.7);
    assert_eq!(config.marks.expert_confidence, 0.9);
    assert_eq!(config.marks.multi_expert_confidence, 0.95);

    // Observability defaults
    assert_eq!(config.observability.log_level, "info");
    assert!(!config.observability.json_logs);

    assert!(config.validate().is_ok());
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[storage]
container_path = "/data/medical.tess"

[judge]
max_attempts = 4

[[spatial.domains]]
code = "medical"
name = "Medicine"
low_certainty_threshold = 25.0

[spatial.domains.keyword_map.guideline]
axis = "certainty"
value = 90.0

[[spatial.domains.risky_patterns]]
pattern = "always (cures|prevents)"
claim_type = "absolute_efficacy"
severity = "high"
"#;
    let config = TesseraConfig::from_toml(toml).unwrap();
    assert_eq!(config.storage.container_path, "/data/medical.tess");
    // Untouched keys keep defaults.
    assert_eq!(config.storage.compression_level, 3);
    assert_eq!(config.judge.max_attempts, 4);

    let medical = config.spatial.domain("medical").unwrap();
    assert_eq!(medical.name, "Medicine");
    assert_eq!(medical.low_certainty_threshold, 25.0);
    assert_eq!(medical.certainty_range, AxisRange::new(0.0, 100.0));
    let hint = &medical.keyword_map["guideline"];
    assert_eq!(hint.axis, Axis::Certainty);
    assert_eq!(hint.value, 90.0);
    assert_eq!(medical.risky_patterns[0].severity, Severity::High);
    assert!(config.validate().is_ok());
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = TesseraConfig::from_toml("[judge\nmax_attempts = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn validate_rejects_zero_attempts() {
    let mut config = TesseraConfig::default();
    config.judge.max_attempts = 0;
    let err = config.validate().unwrap_err();
    match err {
        ConfigError::ValidationFailed { field, .. } => assert_eq!(field, "judge.max_attempts"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn validate_rejects_threshold_out_of_range() {
    let mut config = TesseraConfig::default();
    config.judge.pass_threshold = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_duplicate_domains() {
    let mut config = TesseraConfig::default();
    config.spatial.domains.push(DomainSchema::default());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate domain"));
}

#[test]
fn validate_rejects_empty_axis_range() {
    let mut config = TesseraConfig::default();
    config.spatial.domains[0].verification_range = AxisRange::new(10.0, 10.0);
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_bad_risky_regex() {
    let mut config = TesseraConfig::default();
    config.spatial.domains[0].risky_patterns.push(RiskyPattern {
        pattern: "(unclosed".into(),
        claim_type: "broken".into(),
        severity: Severity::Moderate,
    });
    assert!(config.validate().is_err());
}

#[test]
fn env_overrides_take_precedence_over_file_values() {
    let mut config = TesseraConfig::from_toml("[judge]\nmax_attempts = 3\n").unwrap();
    let env: HashMap<&str, &str> = [
        ("TESSERA_MAX_ATTEMPTS", "5"),
        ("TESSERA_CONTAINER_PATH", "/tmp/override.tess"),
        ("TESSERA_COMPLEXITY_THRESHOLD", "not-a-number"),
    ]
    .into_iter()
    .collect();
    config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.judge.max_attempts, 5);
    assert_eq!(config.storage.container_path, "/tmp/override.tess");
    // Unparseable values are ignored.
    assert_eq!(config.judge.complexity_threshold, 0.5);
}

#[test]
fn from_file_reads_toml_and_reports_missing_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[marks]\nexpert_confidence = 0.85").unwrap();
    let config = TesseraConfig::from_file(file.path()).unwrap();
    assert_eq!(config.marks.expert_confidence, 0.85);

    let missing = std::path::Path::new("/definitely/not/here.toml");
    assert!(matches!(
        TesseraConfig::from_file(missing),
        Err(ConfigError::FileNotFound { .. })
    ));
}

#[test]
fn config_round_trips_through_toml() {
    let config = TesseraConfig::default();
    let text = toml::to_string(&config).unwrap();
    let back = TesseraConfig::from_toml(&text).unwrap();
    assert_eq!(back.spatial.domains, config.spatial.domains);
    assert_eq!(back.judge.max_chunks, config.judge.max_chunks);
}
