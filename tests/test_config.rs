use glucoscan::config::{ExtractionConfig, ParserConfig};
use glucoscan::ExtractionError;

#[test]
fn test_defaults_match_reference_parameters() {
    let config = ExtractionConfig::default();

    assert_eq!(config.preprocess.clahe_clip_limit, 3.0);
    assert_eq!(config.preprocess.clahe_tiles, 8);
    assert_eq!(config.preprocess.bilateral_diameter, 9);
    assert_eq!(config.preprocess.threshold_block_size, 15);
    assert_eq!(config.preprocess.threshold_offset, 2.0);
    assert_eq!(config.detector.epsilon_fraction, 0.02);
    assert_eq!((config.detector.min_aspect, config.detector.max_aspect), (0.4, 2.5));
    assert_eq!(
        (config.detector.min_area_fraction, config.detector.max_area_fraction),
        (0.05, 0.9)
    );
    assert_eq!(config.classifier.patch_size, 224);
    assert!(!config.classifier.gate_extraction);
    assert_eq!(config.parser.keywords, vec!["gula".to_string()]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_other_defaults() -> anyhow::Result<()> {
    let config = ExtractionConfig::from_json_str(
        r#"{ "parser": { "keywords": ["sugar", "gula"] }, "detector": { "min_aspect": 0.5 } }"#,
    )?;

    assert_eq!(config.parser.keywords, vec!["sugar", "gula"]);
    assert_eq!(config.parser.unit_marker, "g");
    assert_eq!(config.detector.min_aspect, 0.5);
    assert_eq!(config.detector.max_aspect, 2.5);
    assert_eq!(config.preprocess.threshold_block_size, 15);
    Ok(())
}

#[test]
fn test_even_block_size_is_rejected() {
    let err = ExtractionConfig::from_json_str(r#"{ "preprocess": { "threshold_block_size": 14 } }"#)
        .unwrap_err();
    assert!(matches!(err, ExtractionError::Config(_)));
}

#[test]
fn test_empty_keywords_are_rejected() {
    let config = ExtractionConfig {
        parser: ParserConfig {
            keywords: vec!["  ".to_string()],
            ..ParserConfig::default()
        },
        ..ExtractionConfig::default()
    };
    assert!(matches!(config.validate(), Err(ExtractionError::Config(_))));
}

#[test]
fn test_inverted_bounds_are_rejected() {
    let err = ExtractionConfig::from_json_str(
        r#"{ "detector": { "min_area_fraction": 0.95, "max_area_fraction": 0.9 } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ExtractionError::Config(_)));
}

#[test]
fn test_malformed_json_is_a_config_error() {
    let err = ExtractionConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ExtractionError::Config(_)));
}

#[test]
fn test_loads_from_file() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("glucoscan.json");
    std::fs::write(&path, r#"{ "classifier": { "gate_extraction": true } }"#)?;

    let config = ExtractionConfig::from_json_file(&path)?;
    assert!(config.classifier.gate_extraction);
    assert_eq!(config.classifier.patch_size, 224);

    let missing = ExtractionConfig::from_json_file(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(ExtractionError::Config(_))));
    Ok(())
}

#[test]
fn test_non_positive_bilateral_sigmas_are_rejected() {
    for json in [
        r#"{ "preprocess": { "bilateral_sigma_color": 0.0 } }"#,
        r#"{ "preprocess": { "bilateral_sigma_space": -5.0 } }"#,
    ] {
        let err = ExtractionConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)), "accepted {}", json);
    }
}
