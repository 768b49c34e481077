use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use campusdesk_core::{AccountRole, AppError, AppResult, TenantId, UserIdentity};
use campusdesk_domain::{
    CapabilityFlags, CapabilityVerb, EffectivePermission, Permission, PermissionGrant,
    PermissionId, Principal, RoleId, SessionCapabilitySet, UserId,
};

use crate::{AssignmentRecord, PermissionBackend, SaveAcknowledgement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveBehaviour {
    Confirm,
    PersistWithoutConfirmation,
    DropWithoutConfirmation,
    Fail,
}

pub(crate) struct FakePermissionBackend {
    pub(crate) catalog: Vec<Permission>,
    pub(crate) effective: Vec<EffectivePermission>,
    pub(crate) grants: Mutex<HashMap<Principal, Vec<PermissionGrant>>>,
    pub(crate) saves: Mutex<Vec<(Principal, Vec<AssignmentRecord>)>>,
    pub(crate) save_behaviour: SaveBehaviour,
    pub(crate) session: Mutex<Option<SessionCapabilitySet>>,
    pub(crate) fail_grant_reads: bool,
}

impl FakePermissionBackend {
    pub(crate) fn new(catalog: Vec<Permission>) -> Self {
        Self {
            catalog,
            effective: Vec::new(),
            grants: Mutex::new(HashMap::new()),
            saves: Mutex::new(Vec::new()),
            save_behaviour: SaveBehaviour::Confirm,
            session: Mutex::new(None),
            fail_grant_reads: false,
        }
    }

    async fn persist(&self, principal: Principal, records: &[AssignmentRecord]) {
        self.grants.lock().await.insert(
            principal,
            records.iter().map(AssignmentRecord::grant).collect(),
        );
    }
}

#[async_trait]
impl PermissionBackend for FakePermissionBackend {
    async fn list_permission_catalog(&self, _tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        Ok(self.catalog.clone())
    }

    async fn list_effective_permissions(
        &self,
        _actor: &UserIdentity,
    ) -> AppResult<Vec<EffectivePermission>> {
        Ok(self.effective.clone())
    }

    async fn list_principal_grants(
        &self,
        _tenant_id: TenantId,
        principal: Principal,
    ) -> AppResult<Vec<PermissionGrant>> {
        if self.fail_grant_reads {
            return Err(AppError::Fetch("grant endpoint unavailable".to_owned()));
        }

        Ok(self
            .grants
            .lock()
            .await
            .get(&principal)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_principal_grants(
        &self,
        _tenant_id: TenantId,
        principal: Principal,
        records: &[AssignmentRecord],
    ) -> AppResult<SaveAcknowledgement> {
        self.saves.lock().await.push((principal, records.to_vec()));

        match self.save_behaviour {
            SaveBehaviour::Confirm => {
                self.persist(principal, records).await;
                Ok(SaveAcknowledgement::Confirmed)
            }
            SaveBehaviour::PersistWithoutConfirmation => {
                self.persist(principal, records).await;
                Ok(SaveAcknowledgement::Unconfirmed {
                    message: "Failed to update permissions".to_owned(),
                })
            }
            SaveBehaviour::DropWithoutConfirmation => Ok(SaveAcknowledgement::Unconfirmed {
                message: "Failed to update permissions".to_owned(),
            }),
            SaveBehaviour::Fail => Err(AppError::Save("backend returned 500".to_owned())),
        }
    }

    async fn load_session_capabilities(
        &self,
        _actor: &UserIdentity,
    ) -> AppResult<SessionCapabilitySet> {
        self.session
            .lock()
            .await
            .clone()
            .ok_or_else(|| AppError::Fetch("session permissions unavailable".to_owned()))
    }
}

pub(crate) fn actor(user_id: i64, role: AccountRole) -> UserIdentity {
    UserIdentity::new(user_id, "Ada Admin", role, TenantId::new())
}

pub(crate) fn user(value: i64) -> Principal {
    match UserId::new(value) {
        Ok(user_id) => Principal::User(user_id),
        Err(error) => panic!("invalid test user id: {error}"),
    }
}

pub(crate) fn role(value: i64) -> Principal {
    match RoleId::new(value) {
        Ok(role_id) => Principal::Role(role_id),
        Err(error) => panic!("invalid test role id: {error}"),
    }
}

pub(crate) fn permission_id(value: i64) -> PermissionId {
    match PermissionId::new(value) {
        Ok(permission_id) => permission_id,
        Err(error) => panic!("invalid test permission id: {error}"),
    }
}

pub(crate) fn permission(id: i64, module_name: &str, key: &str) -> Permission {
    match Permission::new(permission_id(id), key, key, module_name, None) {
        Ok(permission) => permission,
        Err(error) => panic!("invalid test permission: {error}"),
    }
}

/// `Academic Management` with a General row and a `Sessions` row, ids 1..=8.
pub(crate) fn academic_catalog() -> Vec<Permission> {
    let mut permissions = Vec::new();
    let mut next_id = 1;
    for scope in ["Academic Management", "Academic Management.Sessions"] {
        for verb in CapabilityVerb::all() {
            permissions.push(permission(
                next_id,
                "Academic Management",
                &format!("{scope}.{verb}"),
            ));
            next_id += 1;
        }
    }
    permissions
}

pub(crate) fn holding(
    permissions: &[Permission],
    flags: CapabilityFlags,
) -> Vec<EffectivePermission> {
    permissions
        .iter()
        .cloned()
        .map(|permission| EffectivePermission { permission, flags })
        .collect()
}
