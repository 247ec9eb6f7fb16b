//! CLI command implementations.

pub mod seed;
pub mod setup;
pub mod sql;
pub mod stats;

use std::str::FromStr;

use funda_core::{EntityKind, UnknownEntity};
use funda_store::{SchemaError, StoreConfigError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] StoreConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("could not encode stats: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} of {1} tables could not be set up")]
    Setup(usize, usize),
}

/// One table, or every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    One(EntityKind),
}

impl Target {
    /// The entities this target covers, in bootstrap order.
    #[must_use]
    pub fn entities(self) -> Vec<EntityKind> {
        match self {
            Self::All => EntityKind::ALL.to_vec(),
            Self::One(entity) => vec![entity],
        }
    }
}

impl FromStr for Target {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::One)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!("all".parse::<Target>().unwrap(), Target::All);
        assert_eq!(
            "fundas".parse::<Target>().unwrap(),
            Target::One(EntityKind::Cases)
        );
        assert!("orders".parse::<Target>().is_err());
        assert_eq!(Target::All.entities().len(), 4);
    }
}
