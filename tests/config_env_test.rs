// ABOUTME: Integration tests for loading server configuration from process environment variables
// ABOUTME: Serialized because every test mutates the shared process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use serial_test::serial;
use unlocked_server::config::{Environment, LogFormat, ServerConfig};

const VARS: &[&str] = &[
    "APP_ENV",
    "HTTP_PORT",
    "DATABASE_URL",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LOG_FILE",
    "JWT_SECRET",
    "SESSION_TTL_HOURS",
    "BCRYPT_COST",
    "DEFAULT_ADMIN_PASSWORD",
    "ENCRYPTION_KEY",
    "HYDRA_ADMIN_URL",
    "HYDRA_ADMIN_TOKEN",
    "HYDRA_PUBLIC_URL",
    "APP_URL",
    "FRONTEND_URL",
    "HTTP_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    clear_env();
    env::set_var("APP_ENV", "development");
    env::set_var("HTTP_PORT", "8181");
    env::set_var("DATABASE_URL", "sqlite:./data/test-env.db");
    env::set_var("LOG_FORMAT", "json");
    env::set_var("JWT_SECRET", "env-secret");
    env::set_var("SESSION_TTL_HOURS", "2");
    env::set_var("HYDRA_ADMIN_URL", "http://hydra:4445/");
    env::set_var("HYDRA_ADMIN_TOKEN", "hydra-token");
    env::set_var("HYDRA_PUBLIC_URL", "http://hydra:4444");
    env::set_var("APP_URL", "https://unlocked.example.org");
    env::set_var("HTTP_TIMEOUT_SECS", "3");

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.http_port, 8181);
    assert_eq!(config.database.url, "sqlite:./data/test-env.db");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.auth.jwt_secret, "env-secret");
    assert_eq!(config.auth.session_ttl_hours, 2);
    assert_eq!(config.oidc.hydra_admin_base(), "http://hydra:4445");
    assert_eq!(config.oidc.hydra_admin_token, "hydra-token");
    assert_eq!(config.oidc.app_url, "https://unlocked.example.org");
    assert_eq!(config.oidc.http_timeout, Duration::from_secs(3));

    // Tokens never show up in debug output
    let debug = format!("{:?}", config.oidc);
    assert!(!debug.contains("hydra-token"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_values_fall_back_to_defaults() {
    clear_env();
    env::set_var("HTTP_PORT", "   ");
    env::set_var("LOG_LEVEL", "");

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(config.logging.file.is_none());
    assert_eq!(config.auth.default_admin_password, "ChangeMe!");

    clear_env();
}

#[test]
#[serial]
fn test_production_without_secrets_fails() {
    clear_env();
    env::set_var("APP_ENV", "production");

    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.message.contains("JWT_SECRET"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numbers_are_config_errors() {
    clear_env();
    env::set_var("BCRYPT_COST", "high");

    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.message.contains("BCRYPT_COST"));

    clear_env();
}
