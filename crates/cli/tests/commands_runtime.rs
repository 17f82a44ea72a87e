use std::env;
use std::sync::{Mutex, OnceLock};

use automarket_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

const VALID_ENV: &[(&str, &str)] = &[
    ("AUTOMARKET_BOT_TOKEN", "123456:test-token"),
    ("AUTOMARKET_WEBHOOK_SECRET", "long-random-webhook-secret"),
    ("AUTOMARKET_ADMIN_PASSWORD", "correct-horse-battery"),
    ("AUTOMARKET_PUBLIC_URL", "https://cars.example.com"),
    ("AUTOMARKET_DATABASE_URL", "sqlite::memory:"),
];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(VALID_ENV, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_required_settings() {
    with_env(&[], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_and_verifies_the_demo_catalog() {
    with_env(VALID_ENV, || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("2 brands"));
        assert!(message.contains("3 cars"));
        assert!(message.contains("1 leads"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(VALID_ENV, || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn config_redacts_secrets_and_names_sources() {
    with_env(VALID_ENV, || {
        let output = config::run();

        assert!(output.contains("telegram.bot_token = 123456:*** (source: env (AUTOMARKET_BOT_TOKEN))"));
        assert!(output.contains("telegram.webhook_secret = <redacted>"));
        assert!(output.contains("admin.password = <redacted>"));
        assert!(!output.contains("test-token"));
        assert!(!output.contains("correct-horse-battery"));
        assert!(output.contains("logging.level = info (source: default)"));
    });
}

#[test]
fn doctor_json_reports_pass_with_valid_env() {
    with_env(VALID_ENV, || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks should be an array");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn doctor_fails_and_skips_checks_when_config_is_invalid() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks should be an array");
        assert_eq!(checks[0]["status"], "fail");
        assert_eq!(checks[1]["status"], "skipped");
        assert_eq!(checks[2]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AUTOMARKET_DATABASE_URL",
        "AUTOMARKET_DATABASE_MAX_CONNECTIONS",
        "AUTOMARKET_DATABASE_TIMEOUT_SECS",
        "AUTOMARKET_BOT_TOKEN",
        "AUTOMARKET_WEBHOOK_SECRET",
        "AUTOMARKET_ADMIN_CHAT_IDS",
        "AUTOMARKET_SERVER_BIND_ADDRESS",
        "AUTOMARKET_SERVER_PORT",
        "AUTOMARKET_PUBLIC_URL",
        "AUTOMARKET_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "AUTOMARKET_ADMIN_PASSWORD",
        "AUTOMARKET_ADMIN_SESSION_TTL_HOURS",
        "AUTOMARKET_UPLOAD_DIR",
        "AUTOMARKET_ADMIN_MAX_PHOTOS",
        "AUTOMARKET_LOGGING_LEVEL",
        "AUTOMARKET_LOGGING_FORMAT",
        "AUTOMARKET_LOG_LEVEL",
        "AUTOMARKET_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
