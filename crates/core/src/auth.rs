use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, TenantId};

/// Account tier of an authenticated console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Platform operator; may delegate any permission in the catalog.
    SuperAdmin,
    /// Tenant administrator; may only delegate permissions it holds itself.
    Admin,
    /// Regular staff account; cannot assign permissions.
    Staff,
}

impl AccountRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Returns whether the account may grant capabilities it does not hold.
    #[must_use]
    pub fn is_unrestricted_assigner(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Returns whether the account may open permission assignment screens.
    #[must_use]
    pub fn can_assign_permissions(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl FromStr for AccountRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(AppError::Validation(format!(
                "unknown account role '{value}'"
            ))),
        }
    }
}

/// Authenticated actor performing console operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: i64,
    display_name: String,
    role: AccountRole,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates a user identity from decoded session data.
    #[must_use]
    pub fn new(
        user_id: i64,
        display_name: impl Into<String>,
        role: AccountRole,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            role,
            tenant_id,
        }
    }

    /// Returns the backend user identifier of the actor.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the account tier of the actor.
    #[must_use]
    pub fn role(&self) -> AccountRole {
        self.role
    }

    /// Returns the tenant linked to the identity.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
