// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_session_matches_harness_lease() {
    let config = SessionConfig::default();
    assert_eq!(config.ttl, Duration::from_secs(10));
    assert_eq!(config.lock_delay, Duration::from_millis(1));
    assert_eq!(config.behavior, SessionBehavior::Release);
    assert_eq!(config.renew_interval, None);
}

#[test]
fn builders_override_defaults() {
    let config = SessionConfig::default()
        .with_name("worker-3")
        .with_ttl(Duration::from_secs(30))
        .with_lock_delay(Duration::from_secs(1))
        .with_behavior(SessionBehavior::Delete)
        .with_renew_interval(Duration::from_secs(5));

    assert_eq!(config.name.as_deref(), Some("worker-3"));
    assert_eq!(config.ttl, Duration::from_secs(30));
    assert_eq!(config.lock_delay, Duration::from_secs(1));
    assert_eq!(config.behavior.as_str(), "delete");
    assert_eq!(config.renew_interval, Some(Duration::from_secs(5)));
}

#[test]
fn session_config_parses_humantime_durations() {
    let config: SessionConfig = toml::from_str(
        r#"
ttl = "15s"
lock_delay = "250ms"
behavior = "delete"
renew_interval = "5s"
"#,
    )
    .unwrap();

    assert_eq!(config.ttl, Duration::from_secs(15));
    assert_eq!(config.lock_delay, Duration::from_millis(250));
    assert_eq!(config.behavior, SessionBehavior::Delete);
    assert_eq!(config.renew_interval, Some(Duration::from_secs(5)));
}

#[test]
fn session_id_displays_raw_value() {
    let id = SessionId::new("adf4238a-882b-9ddc-4a9d-5b6758e4159e");
    assert_eq!(id.to_string(), "adf4238a-882b-9ddc-4a9d-5b6758e4159e");
    assert_eq!(id.as_str(), id.0);
}
