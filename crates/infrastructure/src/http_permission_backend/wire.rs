use std::collections::BTreeMap;

use campusdesk_application::AssignmentRecord;
use campusdesk_core::{AppError, AppResult};
use campusdesk_domain::{
    CapabilityFlags, EffectivePermission, GENERAL_SUB_MODULE, ModuleCapabilities, Permission,
    PermissionCapabilities, PermissionGrant, PermissionId, Principal, SessionCapabilitySet,
    SubModuleCapabilities,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `{ success, message, data }` wrapper returned by every endpoint.
///
/// Missing fields and explicit `null`s both decode as `None`.
#[derive(Debug, Deserialize)]
pub(super) struct ApiEnvelope<T> {
    pub(super) success: Option<bool>,
    pub(super) message: Option<String>,
    pub(super) data: Option<T>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FlagsDto {
    #[serde(default)]
    pub(super) can_view: bool,
    #[serde(default)]
    pub(super) can_create: bool,
    #[serde(default)]
    pub(super) can_edit: bool,
    #[serde(default)]
    pub(super) can_delete: bool,
}

impl From<FlagsDto> for CapabilityFlags {
    fn from(value: FlagsDto) -> Self {
        CapabilityFlags::new(
            value.can_view,
            value.can_create,
            value.can_edit,
            value.can_delete,
        )
    }
}

impl From<CapabilityFlags> for FlagsDto {
    fn from(value: CapabilityFlags) -> Self {
        Self {
            can_view: value.can_view,
            can_create: value.can_create,
            can_edit: value.can_edit,
            can_delete: value.can_delete,
        }
    }
}

/// Catalog and effective-permission row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PermissionDto {
    pub(super) permission_id: i64,
    pub(super) permission_key: String,
    #[serde(default)]
    pub(super) permission_name: Option<String>,
    pub(super) module_name: String,
    #[serde(default)]
    pub(super) sub_module_name: Option<String>,
    #[serde(default)]
    pub(super) sub_module_id: Option<i64>,
    #[serde(flatten)]
    pub(super) flags: FlagsDto,
}

impl PermissionDto {
    fn into_permission(self) -> AppResult<Permission> {
        let permission_name = self
            .permission_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.permission_key.clone());

        Permission::new(
            PermissionId::new(self.permission_id)?,
            self.permission_key,
            permission_name,
            self.module_name,
            self.sub_module_name.as_deref(),
        )
    }

    pub(super) fn into_effective(self) -> AppResult<EffectivePermission> {
        let flags = self.flags.into();
        Ok(EffectivePermission {
            permission: self.into_permission()?,
            flags,
        })
    }
}

/// Converts catalog rows; the first malformed row fails the whole read.
pub(super) fn normalize_catalog(rows: Vec<PermissionDto>) -> AppResult<Vec<Permission>> {
    rows.into_iter()
        .map(|row| {
            let (permission_id, sub_module_id) = (row.permission_id, row.sub_module_id);
            reject_malformed(permission_id, sub_module_id, row.into_permission())
        })
        .collect()
}

/// Converts effective-permission rows; the first malformed row fails the read.
pub(super) fn normalize_effective(
    rows: Vec<PermissionDto>,
) -> AppResult<Vec<EffectivePermission>> {
    rows.into_iter()
        .map(|row| {
            let (permission_id, sub_module_id) = (row.permission_id, row.sub_module_id);
            reject_malformed(permission_id, sub_module_id, row.into_effective())
        })
        .collect()
}

fn reject_malformed<T>(
    permission_id: i64,
    sub_module_id: Option<i64>,
    row: AppResult<T>,
) -> AppResult<T> {
    row.map_err(|error| {
        warn!(permission_id, ?sub_module_id, %error, "malformed permission row");
        AppError::Fetch(format!("invalid permission row {permission_id}: {error}"))
    })
}

/// Current grant row of a user or role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GrantDto {
    pub(super) permission_id: i64,
    #[serde(flatten)]
    pub(super) flags: FlagsDto,
}

/// Converts grant rows; a later row for the same permission wins.
pub(super) fn normalize_grants(rows: Vec<GrantDto>) -> AppResult<Vec<PermissionGrant>> {
    let mut grants: BTreeMap<PermissionId, PermissionGrant> = BTreeMap::new();
    for row in rows {
        let permission_id = PermissionId::new(row.permission_id)
            .map_err(|error| AppError::Fetch(format!("invalid grant row: {error}")))?;
        grants.insert(
            permission_id,
            PermissionGrant {
                permission_id,
                flags: row.flags.into(),
            },
        );
    }

    Ok(grants.into_values().collect())
}

/// One bulk-write row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AssignmentRecordDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) role_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) user_id: Option<i64>,
    pub(super) permission_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) permission_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) permission_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) sub_module_name: Option<String>,
    pub(super) is_assigned: bool,
    #[serde(flatten)]
    pub(super) flags: FlagsDto,
}

impl From<&AssignmentRecord> for AssignmentRecordDto {
    fn from(record: &AssignmentRecord) -> Self {
        let (role_id, user_id) = match record.principal {
            Principal::Role(role_id) => (Some(role_id.as_i64()), None),
            Principal::User(user_id) => (None, Some(user_id.as_i64())),
        };

        Self {
            role_id,
            user_id,
            permission_id: record.permission_id.as_i64(),
            permission_key: record.permission_key.clone(),
            permission_name: record.permission_name.clone(),
            module_name: record.module_name.clone(),
            sub_module_name: record.sub_module_name.clone(),
            is_assigned: record.is_assigned,
            flags: record.flags.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionPermissionDto {
    pub(super) permission_name: String,
    #[serde(flatten)]
    pub(super) flags: FlagsDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionSubModuleDto {
    #[serde(default)]
    pub(super) sub_module_name: Option<String>,
    #[serde(default)]
    pub(super) permissions: Vec<SessionPermissionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionModuleDto {
    pub(super) module_name: String,
    #[serde(default)]
    pub(super) sub_modules: Vec<SessionSubModuleDto>,
}

/// Converts the `/me` hierarchy; a blank sub-module name becomes `General`.
pub(super) fn session_capabilities(modules: Vec<SessionModuleDto>) -> SessionCapabilitySet {
    SessionCapabilitySet::new(
        modules
            .into_iter()
            .map(|module| ModuleCapabilities {
                module_name: module.module_name,
                sub_modules: module
                    .sub_modules
                    .into_iter()
                    .map(|sub_module| SubModuleCapabilities {
                        sub_module_name: sub_module
                            .sub_module_name
                            .filter(|name| !name.trim().is_empty())
                            .unwrap_or_else(|| GENERAL_SUB_MODULE.to_owned()),
                        permissions: sub_module
                            .permissions
                            .into_iter()
                            .map(|permission| PermissionCapabilities {
                                permission_name: permission.permission_name,
                                flags: permission.flags.into(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    )
}
