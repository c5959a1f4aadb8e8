//! Connection descriptors for SQLite.
//!
//! ```text
//! sqlite::memory:                  # private in-memory database
//! sqlite:///var/lib/app/main.db    # file-backed
//! sqlite:data/app.db?tx=immediate  # relative path, BEGIN IMMEDIATE on open
//! ```

use scopedb_core::ConstructError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How the handle's transaction is started when it is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Autocommit; the handle is not transactional.
    #[default]
    None,
    Deferred,
    /// Take the write lock up front.
    Immediate,
}

impl TransactionMode {
    pub(crate) fn begin_sql(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Deferred => Some("BEGIN DEFERRED"),
            Self::Immediate => Some("BEGIN IMMEDIATE"),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "deferred" => Some(Self::Deferred),
            "immediate" => Some(Self::Immediate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SqliteDescriptor {
    File {
        path: PathBuf,
        #[serde(default)]
        transaction: TransactionMode,
    },
    Memory {
        #[serde(default)]
        transaction: TransactionMode,
    },
}

impl SqliteDescriptor {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            transaction: TransactionMode::None,
        }
    }

    pub fn memory() -> Self {
        Self::Memory {
            transaction: TransactionMode::None,
        }
    }

    pub fn with_transaction(mut self, mode: TransactionMode) -> Self {
        match &mut self {
            Self::File { transaction, .. } | Self::Memory { transaction } => *transaction = mode,
        }
        self
    }

    pub fn transaction(&self) -> TransactionMode {
        match self {
            Self::File { transaction, .. } | Self::Memory { transaction } => *transaction,
        }
    }

    /// Parse a `sqlite:` descriptor string. Other schemes are reported as
    /// unsupported.
    pub fn parse(raw: &str) -> Result<Self, ConstructError> {
        let Some(rest) = raw.strip_prefix("sqlite:") else {
            return Err(ConstructError::unsupported(raw));
        };

        let (location, query) = match rest.split_once('?') {
            Some((loc, q)) => (loc, Some(q)),
            None => (rest, None),
        };

        let mut mode = TransactionMode::None;
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            match pair.split_once('=') {
                Some(("tx", value)) => {
                    mode = TransactionMode::parse(value).ok_or_else(|| {
                        ConstructError::failed(raw, format!("unknown transaction mode: {value}"))
                    })?;
                }
                _ => {
                    return Err(ConstructError::failed(
                        raw,
                        format!("unknown option: {pair}"),
                    ))
                }
            }
        }

        let descriptor = match location {
            ":memory:" => Self::memory(),
            "" | "//" => return Err(ConstructError::failed(raw, "missing database path")),
            path => Self::file(path.strip_prefix("//").unwrap_or(path)),
        };
        Ok(descriptor.with_transaction(mode))
    }
}

impl fmt::Display for SqliteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, .. } => write!(f, "sqlite://{}", path.display())?,
            Self::Memory { .. } => f.write_str("sqlite::memory:")?,
        }
        match self.transaction() {
            TransactionMode::None => Ok(()),
            TransactionMode::Deferred => f.write_str("?tx=deferred"),
            TransactionMode::Immediate => f.write_str("?tx=immediate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_memory() {
        let d = SqliteDescriptor::parse("sqlite::memory:").unwrap();
        assert_eq!(d, SqliteDescriptor::memory());
        assert_eq!(d.to_string(), "sqlite::memory:");
    }

    #[test]
    fn parse_absolute_file_with_tx() {
        let d = SqliteDescriptor::parse("sqlite:///var/lib/app.db?tx=immediate").unwrap();
        assert_eq!(
            d,
            SqliteDescriptor::file("/var/lib/app.db").with_transaction(TransactionMode::Immediate)
        );
        assert_eq!(d.to_string(), "sqlite:///var/lib/app.db?tx=immediate");
    }

    #[test]
    fn parse_relative_file() {
        let d = SqliteDescriptor::parse("sqlite:data/app.db?tx=deferred").unwrap();
        assert_eq!(d.transaction(), TransactionMode::Deferred);
        assert!(matches!(d, SqliteDescriptor::File { ref path, .. } if path == &PathBuf::from("data/app.db")));
    }

    #[test]
    fn parse_rejects_other_schemes_and_bad_options() {
        assert!(SqliteDescriptor::parse("postgres://db/app")
            .unwrap_err()
            .is_unsupported());
        assert!(!SqliteDescriptor::parse("sqlite::memory:?tx=eventually")
            .unwrap_err()
            .is_unsupported());
        assert!(SqliteDescriptor::parse("sqlite:").is_err());
        assert!(SqliteDescriptor::parse("sqlite::memory:?cache=shared").is_err());
    }

    #[test]
    fn serde_tagged_form() {
        let d: SqliteDescriptor =
            serde_json_like("{\"kind\":\"memory\",\"transaction\":\"immediate\"}");
        assert_eq!(
            d,
            SqliteDescriptor::memory().with_transaction(TransactionMode::Immediate)
        );
    }

    fn serde_json_like(raw: &str) -> SqliteDescriptor {
        // YAML is a JSON superset
        serde_yaml::from_str(raw).unwrap()
    }
}
