//! Error module tests

use crate::error::Error;

#[test]
fn test_error_codes() {
    assert_eq!(Error::ConfigError("x".into()).code(), "E600");
    assert_eq!(Error::InvalidPayload("x".into()).code(), "E700");
    assert_eq!(Error::InvalidInput("x".into()).code(), "E800");

    let io = Error::from(std::io::Error::other("disk"));
    assert_eq!(io.code(), "E9999");
}

#[test]
fn test_error_display() {
    let config = Error::ConfigError("bad timeout".to_string());
    let payload = Error::InvalidPayload("missing children".to_string());

    assert!(config.to_string().contains("bad timeout"));
    assert!(payload.to_string().contains("missing children"));
}

#[test]
fn test_error_suggestions() {
    assert_eq!(
        Error::ConfigError("x".into()).suggestion().as_deref(),
        Some("opsdeck config list")
    );
    assert!(Error::InvalidPayload("x".into()).suggestion().is_some());
    assert!(Error::InvalidInput("x".into()).suggestion().is_none());
}

#[test]
fn test_json_error_conversion() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let converted: Error = err.into();
    assert!(matches!(converted, Error::Json(_)));
}
