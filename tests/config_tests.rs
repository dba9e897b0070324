// Config loading and validation tests

use infrawatch::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8000
host = "0.0.0.0"

[store]
history_limit = 120
active_threshold_secs = 60
default_query_limit = 100

[publishing]
broadcast_capacity = 60

[docker]
stop_timeout_secs = 10
scan_timeout_secs = 120

[monitoring]
stats_log_interval_secs = 60
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.store.history_limit, 120);
    assert_eq!(config.store.active_threshold_secs, 60);
    assert_eq!(config.publishing.broadcast_capacity, 60);
    assert_eq!(config.docker.stop_timeout_secs, 10);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_defaults_apply_when_omitted() {
    let minimal = VALID_CONFIG
        .replace("active_threshold_secs = 60\n", "")
        .replace("default_query_limit = 100\n", "");
    let config = AppConfig::load_from_str(&minimal).expect("load_from_str");
    assert_eq!(config.store.active_threshold_secs, 60);
    assert_eq!(config.store.default_query_limit, 100);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8000", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_history_limit_zero() {
    let bad = VALID_CONFIG.replace("history_limit = 120", "history_limit = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("history_limit"));
}

#[test]
fn test_config_validation_rejects_broadcast_capacity_zero() {
    let bad = VALID_CONFIG.replace("broadcast_capacity = 60", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("broadcast_capacity"));
}

#[test]
fn test_config_validation_rejects_stop_timeout_zero() {
    let bad = VALID_CONFIG.replace("stop_timeout_secs = 10", "stop_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stop_timeout_secs"));
}

#[test]
fn test_config_validation_rejects_scan_timeout_zero() {
    let bad = VALID_CONFIG.replace("scan_timeout_secs = 120", "scan_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scan_timeout_secs"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 60",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}
