use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campusdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Reserved sub-module label for module-scoped permissions.
pub const GENERAL_SUB_MODULE: &str = "General";

/// Stable backend identifier of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(value: i64) -> AppResult<Self> {
        if value <= 0 {
            return Err(AppError::Validation(format!(
                "permission id must be positive, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Capability column of the assignment matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityVerb {
    /// Read access.
    View,
    /// Create access.
    Create,
    /// Update access.
    Edit,
    /// Delete access.
    Delete,
}

impl CapabilityVerb {
    /// Returns the verb as it appears in permission keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Create => "Create",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }

    /// Returns all verbs in column order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[CapabilityVerb] = &[
            CapabilityVerb::View,
            CapabilityVerb::Create,
            CapabilityVerb::Edit,
            CapabilityVerb::Delete,
        ];

        ALL
    }

    /// Extracts the verb from the trailing segment of a dotted permission key.
    ///
    /// Returns `None` when the key does not end in one of the four verbs.
    #[must_use]
    pub fn from_permission_key(permission_key: &str) -> Option<Self> {
        permission_key
            .rsplit('.')
            .next()
            .and_then(|segment| Self::from_str(segment).ok())
    }
}

impl FromStr for CapabilityVerb {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "View" => Ok(Self::View),
            "Create" => Ok(Self::Create),
            "Edit" => Ok(Self::Edit),
            "Delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown capability verb '{value}'"
            ))),
        }
    }
}

impl Display for CapabilityVerb {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Four independent CRUD capability bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// View bit.
    pub can_view: bool,
    /// Create bit.
    pub can_create: bool,
    /// Edit bit.
    pub can_edit: bool,
    /// Delete bit.
    pub can_delete: bool,
}

impl CapabilityFlags {
    /// Creates flags from the four bits in column order.
    #[must_use]
    pub fn new(can_view: bool, can_create: bool, can_edit: bool, can_delete: bool) -> Self {
        Self {
            can_view,
            can_create,
            can_edit,
            can_delete,
        }
    }

    /// Returns flags with every bit set.
    #[must_use]
    pub fn all_granted() -> Self {
        Self::new(true, true, true, true)
    }

    /// Returns whether the bit for `verb` is set.
    #[must_use]
    pub fn allows(&self, verb: CapabilityVerb) -> bool {
        match verb {
            CapabilityVerb::View => self.can_view,
            CapabilityVerb::Create => self.can_create,
            CapabilityVerb::Edit => self.can_edit,
            CapabilityVerb::Delete => self.can_delete,
        }
    }

    /// Sets the bit for `verb`.
    pub fn set(&mut self, verb: CapabilityVerb, value: bool) {
        match verb {
            CapabilityVerb::View => self.can_view = value,
            CapabilityVerb::Create => self.can_create = value,
            CapabilityVerb::Edit => self.can_edit = value,
            CapabilityVerb::Delete => self.can_delete = value,
        }
    }

    /// Returns whether any bit is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.can_view || self.can_create || self.can_edit || self.can_delete
    }

    /// Returns the bitwise union with `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.can_view || other.can_view,
            self.can_create || other.can_create,
            self.can_edit || other.can_edit,
            self.can_delete || other.can_delete,
        )
    }

    /// Iterates over the verbs whose bit is set.
    pub fn granted_verbs(self) -> impl Iterator<Item = CapabilityVerb> {
        CapabilityVerb::all()
            .iter()
            .copied()
            .filter(move |verb| self.allows(*verb))
    }
}

/// Resolves the sub-module label for a permission.
///
/// The backend does not always fill `subModuleName`. When it is blank, the
/// second-to-last segment of a key with more than two segments is used
/// (`"Academic Management.Sessions.Create"` gives `"Sessions"`); any other key
/// falls back to [`GENERAL_SUB_MODULE`].
#[must_use]
pub fn normalize_sub_module_name(sub_module_name: Option<&str>, permission_key: &str) -> String {
    if let Some(name) = sub_module_name.map(str::trim).filter(|name| !name.is_empty()) {
        return name.to_owned();
    }

    let segments: Vec<&str> = permission_key.split('.').collect();
    if segments.len() > 2 {
        let candidate = segments[segments.len() - 2].trim();
        if !candidate.is_empty() {
            return candidate.to_owned();
        }
    }

    GENERAL_SUB_MODULE.to_owned()
}

/// Immutable permission reference data owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    permission_id: PermissionId,
    permission_key: NonEmptyString,
    permission_name: String,
    module_name: NonEmptyString,
    sub_module_name: String,
}

impl Permission {
    /// Creates a validated permission, normalizing the sub-module label.
    pub fn new(
        permission_id: PermissionId,
        permission_key: impl Into<String>,
        permission_name: impl Into<String>,
        module_name: impl Into<String>,
        sub_module_name: Option<&str>,
    ) -> AppResult<Self> {
        let permission_key = NonEmptyString::new(permission_key)?;
        let module_name = NonEmptyString::new(module_name).map_err(|_| {
            AppError::Validation(format!(
                "permission '{}' has a blank module name",
                permission_key.as_str()
            ))
        })?;
        let sub_module_name = normalize_sub_module_name(sub_module_name, permission_key.as_str());

        Ok(Self {
            permission_id,
            permission_key,
            permission_name: permission_name.into(),
            module_name,
            sub_module_name,
        })
    }

    /// Returns the stable permission identifier.
    #[must_use]
    pub fn permission_id(&self) -> PermissionId {
        self.permission_id
    }

    /// Returns the dotted permission key.
    #[must_use]
    pub fn permission_key(&self) -> &str {
        self.permission_key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn permission_name(&self) -> &str {
        self.permission_name.as_str()
    }

    /// Returns the owning module name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module_name.as_str()
    }

    /// Returns the normalized sub-module label.
    #[must_use]
    pub fn sub_module_name(&self) -> &str {
        self.sub_module_name.as_str()
    }

    /// Returns the capability verb encoded in the key, if any.
    #[must_use]
    pub fn verb(&self) -> Option<CapabilityVerb> {
        CapabilityVerb::from_permission_key(self.permission_key.as_str())
    }
}

/// Permission held by the assigning actor, with the actor's own bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermission {
    /// Permission reference data.
    pub permission: Permission,
    /// Capabilities the actor holds for this permission.
    pub flags: CapabilityFlags,
}

/// Current grant of one permission to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Granted capabilities.
    pub flags: CapabilityFlags,
}
