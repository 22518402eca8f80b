//! Failure paths that don't need a running database.

use postsync::config::DATABASE_URL_VAR;
use postsync::{Config, ConfigError, Error, Schema};

fn config_for(url: &str) -> Config {
    Config::from_lookup(|key| (key == DATABASE_URL_VAR).then(|| url.to_string()))
        .expect("url should parse")
}

#[tokio::test]
async fn test_unreachable_database_is_a_connect_error() {
    // Nothing listens on port 1.
    let config = config_for("postgres://postgres@127.0.0.1:1/postgres?connect_timeout=2");

    let err = postsync::run(&config, Schema::new())
        .await
        .expect_err("connection should fail");
    assert!(matches!(err, Error::Connect(_)), "unexpected error: {err:?}");

    // The I/O cause is part of the message, not only the error kind.
    let cause = std::error::Error::source(&err)
        .and_then(|e| e.source())
        .expect("connect errors carry their cause");
    let message = err.to_string();
    assert!(message.ends_with(&cause.to_string()), "{message}");
}

#[test]
fn test_missing_url_is_a_config_error() {
    let err: Error = Config::from_lookup(|_| None).unwrap_err().into();
    assert!(matches!(
        err,
        Error::Config(ConfigError::Missing { var }) if var == DATABASE_URL_VAR
    ));
}
