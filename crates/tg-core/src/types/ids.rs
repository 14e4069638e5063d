use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;
use utoipa::ToSchema;

/// Identifier of one run. Caller-supplied ids are opaque; any non-empty
/// string is accepted. Store-assigned ids use the `run_<ulid>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct RunId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "run id must not be empty"),
        }
    }
}

impl std::error::Error for IdError {}

impl RunId {
    pub const PREFIX: &'static str = "run_";

    pub fn new(value: String) -> Result<Self, IdError> {
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_ids_accepted() {
        let id = RunId::new("b7c1e1f2-anything".to_string()).unwrap();
        assert_eq!(id.as_str(), "b7c1e1f2-anything");
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(RunId::new(String::new()), Err(IdError::Empty));
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert!(a.as_str().starts_with(RunId::PREFIX));
        assert_ne!(a, b);
    }
}
