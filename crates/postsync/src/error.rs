use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not connect to database: {}", chain(.0))]
    Connect(#[source] tokio_postgres::Error),

    #[error("could not read database schema: {}", chain(.0))]
    Introspect(#[source] tokio_postgres::Error),

    #[error("schema change rejected: {}\n  statement: {sql}", chain(.source))]
    Ddl {
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },
}

/// Render an error followed by its causes.
///
/// `tokio_postgres::Error` only names its kind (`db error`, `error connecting
/// to server`); the server message or the I/O error is in the source chain.
pub(crate) fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("db error")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("ERROR: relation \"idx_posts_deleted_at\" already exists")]
    struct Inner;

    #[test]
    fn test_chain_includes_causes() {
        assert_eq!(
            chain(&Outer(Inner)),
            "db error: ERROR: relation \"idx_posts_deleted_at\" already exists"
        );
        assert_eq!(chain(&Inner), "ERROR: relation \"idx_posts_deleted_at\" already exists");
    }
}
