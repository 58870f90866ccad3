mod common;

use std::sync::Arc;

use finance_backend::observability::{
    get_metrics, init_metrics, mask_sensitive, AggregatedHealth, DependencyHealth, HealthChecker,
    HealthStatus, LatencyTimer, LogConfig, LogFormat, RequestContext,
};

#[test]
fn test_log_config_default() {
    let config = LogConfig::default();
    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert!(config.include_target);
    assert!(!config.include_file);
    assert!(!config.include_line);
}

#[test]
fn test_log_format_from_str() {
    assert_eq!(LogFormat::from("json"), LogFormat::Json);
    assert_eq!(LogFormat::from("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::from("compact"), LogFormat::Compact);
    assert_eq!(LogFormat::from("pretty"), LogFormat::Pretty);
    assert_eq!(LogFormat::from("unknown"), LogFormat::Pretty);
}

#[test]
fn test_mask_sensitive_inn_and_phone() {
    assert_eq!(mask_sensitive("77070838931", 2), "77*******31");
    assert_eq!(mask_sensitive("+79161234567", 3), "+79******567");
    assert_eq!(mask_sensitive("1234", 2), "****");
}

#[test]
fn test_mask_sensitive_multibyte() {
    assert_eq!(mask_sensitive("Сбербанк", 1), "С******к");
}

#[test]
fn test_request_context_identity() {
    let anonymous = RequestContext::new("req-1");
    assert_eq!(anonymous.request_id, "req-1");
    assert!(anonymous.user.is_none());
    assert!(!anonymous.is_admin);

    let admin = anonymous.clone().with_user("root", true);
    assert_eq!(admin.user.as_deref(), Some("root"));
    assert!(admin.is_admin);
}

#[test]
fn test_latency_timer() {
    let timer = LatencyTimer::new();
    std::thread::sleep(std::time::Duration::from_millis(10));
    let elapsed = timer.elapsed_ms();
    assert!(elapsed >= 10.0);
    assert!(timer.elapsed_secs() >= 0.01);
}

#[test]
fn test_prometheus_render_after_recording() {
    let handle = init_metrics().expect("Failed to install recorder");
    // A second call reuses the installed recorder
    let again = init_metrics().expect("Failed to reuse recorder");

    let metrics = get_metrics();
    metrics.record_http_request("GET", "/api/v1/categories", 200, 3.0);
    metrics.record_transaction_created("debit", true);
    metrics.record_login(false);

    let rendered = handle.render();
    assert!(rendered.contains("finance_http_requests_total"));
    assert!(rendered.contains("finance_transactions_created_total"));
    assert!(again.render().contains("finance_logins_total"));
}

#[test]
fn test_aggregated_health() {
    let health = AggregatedHealth::new(
        "1.0.0".to_string(),
        60,
        vec![
            DependencyHealth::healthy("database", 2.0),
            DependencyHealth::degraded("storage", "High latency detected"),
        ],
    );
    assert_eq!(health.status, HealthStatus::Degraded);

    let health = AggregatedHealth::new(
        "1.0.0".to_string(),
        60,
        vec![
            DependencyHealth::degraded("database", "slow"),
            DependencyHealth::unhealthy("storage", "Bucket 'images' does not exist"),
        ],
    );
    assert_eq!(health.status, HealthStatus::Unhealthy);

    let empty = AggregatedHealth::new("1.0.0".to_string(), 0, vec![]);
    assert_eq!(empty.status, HealthStatus::Healthy);
}

#[test]
fn test_health_serialization() {
    let health = AggregatedHealth::new(
        "1.0.0".to_string(),
        100,
        vec![DependencyHealth::healthy("database", 5.5)],
    );
    let json = serde_json::to_value(&health).unwrap();

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["uptime_seconds"], 100);
    assert_eq!(json["dependencies"][0]["name"], "database");
    assert_eq!(json["dependencies"][0]["latency_ms"], 5.5);
}

#[tokio::test]
async fn test_storage_check_follows_gateway() {
    let up = HealthChecker::new(common::lazy_pool(), common::memory_files(), "images");
    let storage = up.check_storage().await;
    assert_eq!(storage.name, "storage");
    assert!(!storage.status.is_unhealthy());
    assert!(up.is_alive());

    let down = HealthChecker::new(
        common::lazy_pool(),
        Arc::new(common::MemoryFiles::failing()),
        "images",
    );
    let storage = down.check_storage().await;
    assert_eq!(storage.status, HealthStatus::Unhealthy);
    assert!(storage.message.is_some());
}
