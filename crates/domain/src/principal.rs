use std::fmt::{Display, Formatter};

use campusdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Backend identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Creates a validated user identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        positive("user id", value).map(Self)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Backend identifier of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(i64);

impl RoleId {
    /// Creates a validated role identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        positive("role id", value).map(Self)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Entity receiving capability grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    /// A single user account.
    User(UserId),
    /// A role shared by many users.
    Role(RoleId),
}

impl Principal {
    /// Returns a stable label for the principal kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Role(_) => "role",
        }
    }

    /// Returns the raw backend identifier.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::User(user_id) => user_id.as_i64(),
            Self::Role(role_id) => role_id.as_i64(),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.kind(), self.id())
    }
}

fn positive(label: &str, value: i64) -> AppResult<i64> {
    if value <= 0 {
        return Err(AppError::Validation(format!(
            "{label} must be positive, got {value}"
        )));
    }

    Ok(value)
}
