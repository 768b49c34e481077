use std::sync::Arc;

use campusdesk_core::{AppError, AppResult, UserIdentity};
use campusdesk_domain::{
    AssignerScope, CapabilityFlags, CapabilityMatrix, EffectivePermission, Principal,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::permission_ports::{AssignmentRecord, PermissionBackend, SaveAcknowledgement};

mod session;
mod submission;

#[cfg(test)]
mod tests;

pub use session::AssignmentSession;
pub use submission::{flatten_matrix, records_match_grants};

/// Outcome of a successful bulk save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSaveReport {
    /// Principal whose grants were written.
    pub principal: Principal,
    /// Number of flattened records sent.
    pub record_count: usize,
    /// Whether success was established by re-reading the grants.
    pub verified_by_refetch: bool,
    /// Completion timestamp.
    pub saved_at: DateTime<Utc>,
}

/// Application service driving the permission assignment screens.
#[derive(Clone)]
pub struct PermissionAssignmentService {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionAssignmentService {
    /// Creates a new service from a backend implementation.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    /// Loads the actor's ceiling and the principal's grants and builds an
    /// editable session.
    ///
    /// Any failed read aborts the whole load; no partially built matrix is
    /// returned.
    pub async fn open(
        &self,
        actor: &UserIdentity,
        principal: Principal,
    ) -> AppResult<AssignmentSession> {
        require_assigner(actor, principal)?;

        let scope = AssignerScope::for_role(actor.role());
        let ceiling = match scope {
            AssignerScope::Unrestricted => self
                .backend
                .list_permission_catalog(actor.tenant_id())
                .await?
                .into_iter()
                .map(|permission| EffectivePermission {
                    permission,
                    flags: CapabilityFlags::all_granted(),
                })
                .collect(),
            AssignerScope::Restricted => self.backend.list_effective_permissions(actor).await?,
        };
        let grants = self
            .backend
            .list_principal_grants(actor.tenant_id(), principal)
            .await?;

        let matrix = CapabilityMatrix::build(scope, &ceiling, &grants);
        info!(
            actor = actor.user_id(),
            actor_name = actor.display_name(),
            tenant_id = %actor.tenant_id(),
            principal = %principal,
            ceiling_permissions = ceiling.len(),
            target_grants = grants.len(),
            "opened permission assignment session"
        );

        Ok(AssignmentSession::new(principal, matrix))
    }

    /// Writes the session's matrix in one bulk request.
    ///
    /// On failure the session keeps its edits so the save can be retried.
    pub async fn save(
        &self,
        actor: &UserIdentity,
        session: &mut AssignmentSession,
    ) -> AppResult<AssignmentSaveReport> {
        require_assigner(actor, session.principal())?;

        let principal = session.principal();
        let records = session.records();
        let acknowledgement = self
            .backend
            .save_principal_grants(actor.tenant_id(), principal, &records)
            .await?;

        let verified_by_refetch = match acknowledgement {
            SaveAcknowledgement::Confirmed => false,
            SaveAcknowledgement::Unconfirmed { message } => {
                self.verify_unconfirmed_save(actor, principal, &records, message.as_str())
                    .await?;
                true
            }
        };

        session.mark_saved();
        info!(
            actor = actor.user_id(),
            actor_name = actor.display_name(),
            tenant_id = %actor.tenant_id(),
            principal = %principal,
            record_count = records.len(),
            verified_by_refetch,
            "saved permission assignments"
        );

        Ok(AssignmentSaveReport {
            principal,
            record_count: records.len(),
            verified_by_refetch,
            saved_at: Utc::now(),
        })
    }

    // Some write endpoints answer `success: false` (or drop `data`) for writes
    // that were persisted. Re-read the grants and accept the save only when
    // every written record is reflected exactly.
    async fn verify_unconfirmed_save(
        &self,
        actor: &UserIdentity,
        principal: Principal,
        records: &[AssignmentRecord],
        message: &str,
    ) -> AppResult<()> {
        let grants = self
            .backend
            .list_principal_grants(actor.tenant_id(), principal)
            .await
            .map_err(|error| {
                AppError::Save(format!(
                    "backend did not confirm the save ('{message}') and re-reading grants failed: {error}"
                ))
            })?;

        if !records_match_grants(records, &grants) {
            return Err(AppError::Save(format!(
                "backend did not confirm the save for {principal}: {message}"
            )));
        }

        warn!(
            principal = %principal,
            backend_message = %message,
            "backend did not confirm the save but persisted grants match; treating as saved"
        );
        Ok(())
    }
}

fn require_assigner(actor: &UserIdentity, principal: Principal) -> AppResult<()> {
    if !actor.role().can_assign_permissions() {
        return Err(AppError::Forbidden(format!(
            "account role '{}' cannot assign permissions",
            actor.role().as_str()
        )));
    }

    if let Principal::User(user_id) = principal
        && user_id.as_i64() == actor.user_id()
    {
        return Err(AppError::Forbidden(
            "actors cannot edit their own user permissions".to_owned(),
        ));
    }

    Ok(())
}
