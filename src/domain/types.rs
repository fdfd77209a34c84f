use std::fmt;

/// One scheduling scope (a guild). Opaque string id, used as the key in the
/// snapshot's `servers` map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TenantId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Player uid on the remote service. Digits only, at least 6 of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Uid(String);

impl Uid {
    pub fn parse(s: &str) -> Result<Self, UidError> {
        let s = s.trim();
        if s.len() < 6 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(UidError::Invalid(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum UidError {
    #[error("invalid uid: {0} (expected at least 6 digits)")]
    Invalid(String),
}

/// Backend partition of the remote service ("ind", "bd", ...). Opaque except
/// that it must not be empty; wire name is `server`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn parse(s: &str) -> Result<Self, RegionError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RegionError::Empty);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum RegionError {
    #[error("region must not be empty")]
    Empty,
}
