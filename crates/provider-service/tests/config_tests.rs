// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Layered configuration loading against real files on disk

mod fixtures;

use std::time::Duration;

use config::Map;
use provider_service::{Environment, ServiceConfig};
use serde_json::json;

use fixtures::config_dir;

#[test]
fn defaults_without_files() {
    let dir = config_dir(&[]);
    let config = ServiceConfig::load_from(dir.path(), None).unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(
        config.health_check.interval_seconds.value(),
        Duration::from_secs(300)
    );
    assert_eq!(
        config.health_check.timeout_seconds.value(),
        Duration::from_secs(30)
    );
    assert!(!config.providers.digiflazz.enabled);
    assert!(!config.providers.bangjeff.enabled);
    assert!(!config.providers.vipreseller.enabled);
}

#[test]
fn base_file_sets_provider_sections() {
    let dir = config_dir(&[(
        "config.json",
        json!({
            "health_check": {"interval_seconds": 60},
            "providers": {
                "digiflazz": {
                    "enabled": true,
                    "username": "dflz-user",
                    "api_key": "dflz-key",
                    "timeout_seconds": 15
                },
                "bangjeff": {
                    "enabled": true,
                    "member_id": "M-100",
                    "secret_key": "bj-secret",
                    "webhook_token": "bj-token"
                }
            }
        }),
    )]);

    let config = ServiceConfig::load_from(dir.path(), None).unwrap();
    assert_eq!(
        config.health_check.interval_seconds.value(),
        Duration::from_secs(60)
    );
    assert_eq!(
        config.health_check.timeout_seconds.value(),
        Duration::from_secs(30)
    );

    let digiflazz = &config.providers.digiflazz;
    assert!(digiflazz.enabled);
    assert_eq!(digiflazz.username.as_ref().unwrap().expose(), "dflz-user");
    assert_eq!(digiflazz.timeout_seconds.value(), Duration::from_secs(15));
    assert!(digiflazz.webhook_secret.is_none());

    let bangjeff = &config.providers.bangjeff;
    assert_eq!(bangjeff.member_id.as_ref().unwrap().expose(), "M-100");
    assert_eq!(bangjeff.timeout_seconds.value(), Duration::from_secs(30));

    assert!(!config.providers.vipreseller.enabled);
}

#[test]
fn environment_file_overrides_base_file() {
    let dir = config_dir(&[
        (
            "config.json",
            json!({
                "health_check": {"interval_seconds": 60, "timeout_seconds": 20},
                "providers": {"vipreseller": {"enabled": false}}
            }),
        ),
        (
            "config.production.json",
            json!({
                "health_check": {"interval_seconds": 600},
                "providers": {
                    "vipreseller": {"enabled": true, "api_id": "vip-id", "api_key": "vip-key"}
                }
            }),
        ),
    ]);

    let config = ServiceConfig::load_from(dir.path(), Some("PRODUCTION")).unwrap();
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(
        config.health_check.interval_seconds.value(),
        Duration::from_secs(600)
    );
    assert_eq!(
        config.health_check.timeout_seconds.value(),
        Duration::from_secs(20)
    );
    assert!(config.providers.vipreseller.enabled);

    let development = ServiceConfig::load_from(dir.path(), Some("development")).unwrap();
    assert_eq!(development.environment, Environment::Development);
    assert!(!development.providers.vipreseller.enabled);
}

#[test]
fn out_of_range_values_are_rejected() {
    for health_check in [
        json!({"interval_seconds": 0}),
        json!({"timeout_seconds": 0}),
        json!({"timeout_seconds": 301}),
    ] {
        let dir = config_dir(&[("config.json", json!({"health_check": health_check}))]);
        let result = ServiceConfig::load_from(dir.path(), None);
        assert!(result.is_err(), "{health_check} should be rejected");
    }

    let dir = config_dir(&[(
        "config.json",
        json!({"providers": {"digiflazz": {"timeout_seconds": 0}}}),
    )]);
    assert!(ServiceConfig::load_from(dir.path(), None).is_err());
}

#[test]
fn blank_credentials_are_rejected() {
    let dir = config_dir(&[(
        "config.json",
        json!({"providers": {"bangjeff": {"enabled": true, "member_id": "  ", "secret_key": "s"}}}),
    )]);
    assert!(ServiceConfig::load_from(dir.path(), None).is_err());
}

#[test]
fn unknown_environment_is_rejected() {
    let dir = config_dir(&[]);
    assert!(ServiceConfig::load_from(dir.path(), Some("staging")).is_err());
}

#[test]
fn debug_output_redacts_credentials() {
    let dir = config_dir(&[(
        "config.json",
        json!({"providers": {"vipreseller": {"enabled": true, "api_id": "vip-id", "api_key": "vip-very-secret"}}}),
    )]);
    let config = ServiceConfig::load_from(dir.path(), None).unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("vip-very-secret"));
}

fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[test]
fn environment_variables_override_files() {
    let dir = config_dir(&[(
        "config.json",
        json!({
            "health_check": {"interval_seconds": 60},
            "providers": {"bangjeff": {"member_id": "file-member", "secret_key": "file-secret"}}
        }),
    )]);

    let config = ServiceConfig::load_with_vars(
        dir.path(),
        None,
        vars(&[
            ("FULFILLMENT__HEALTH_CHECK__INTERVAL_SECONDS", "45"),
            ("FULFILLMENT__PROVIDERS__BANGJEFF__ENABLED", "true"),
            ("FULFILLMENT__PROVIDERS__BANGJEFF__MEMBER_ID", "M-200"),
            ("UNRELATED__PROVIDERS__BANGJEFF__SECRET_KEY", "ignored"),
        ]),
    )
    .unwrap();

    assert_eq!(
        config.health_check.interval_seconds.value(),
        Duration::from_secs(45)
    );
    let bangjeff = &config.providers.bangjeff;
    assert!(bangjeff.enabled);
    assert_eq!(bangjeff.member_id.as_ref().unwrap().expose(), "M-200");
    assert_eq!(bangjeff.secret_key.as_ref().unwrap().expose(), "file-secret");
}

#[test]
fn numeric_looking_credentials_stay_verbatim() {
    let dir = config_dir(&[]);
    let config = ServiceConfig::load_with_vars(
        dir.path(),
        None,
        vars(&[
            ("FULFILLMENT__PROVIDERS__BANGJEFF__ENABLED", "true"),
            ("FULFILLMENT__PROVIDERS__BANGJEFF__MEMBER_ID", "000123"),
            ("FULFILLMENT__PROVIDERS__BANGJEFF__SECRET_KEY", "1e3"),
            ("FULFILLMENT__PROVIDERS__DIGIFLAZZ__API_KEY", "0x10"),
        ]),
    )
    .unwrap();

    let bangjeff = &config.providers.bangjeff;
    assert_eq!(bangjeff.member_id.as_ref().unwrap().expose(), "000123");
    assert_eq!(bangjeff.secret_key.as_ref().unwrap().expose(), "1e3");
    assert_eq!(
        config.providers.digiflazz.api_key.as_ref().unwrap().expose(),
        "0x10"
    );
}

#[test]
fn out_of_range_environment_variable_is_rejected() {
    let dir = config_dir(&[]);
    let result = ServiceConfig::load_with_vars(
        dir.path(),
        None,
        vars(&[("FULFILLMENT__HEALTH_CHECK__TIMEOUT_SECONDS", "0")]),
    );
    assert!(result.is_err());
}
