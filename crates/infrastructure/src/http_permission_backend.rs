use async_trait::async_trait;
use campusdesk_application::{AssignmentRecord, PermissionBackend, SaveAcknowledgement};
use campusdesk_core::{AppError, AppResult, TenantId, UserIdentity};
use campusdesk_domain::{
    EffectivePermission, Permission, PermissionGrant, Principal, SessionCapabilitySet,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

mod envelope;
mod wire;


use envelope::{classify_fetch, classify_save};
use wire::{
    ApiEnvelope, AssignmentRecordDto, GrantDto, PermissionDto, SessionModuleDto,
    normalize_catalog, normalize_effective, normalize_grants, session_capabilities,
};

/// Header carrying the tenant (school) of every request.
pub const TENANT_HEADER: &str = "X-Tenant-Id";

/// REST implementation of the permission backend port.
#[derive(Clone)]
pub struct HttpPermissionBackend {
    http_client: reqwest::Client,
    base_url: Url,
    api_token: String,
}

impl HttpPermissionBackend {
    /// Creates a backend client rooted at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url,
            api_token: api_token.into(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!(
                    "backend base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn principal_segments(principal: Principal) -> [String; 4] {
        match principal {
            Principal::User(user_id) => [
                "api".to_owned(),
                "permissions".to_owned(),
                "users".to_owned(),
                user_id.as_i64().to_string(),
            ],
            Principal::Role(role_id) => [
                "api".to_owned(),
                "roles".to_owned(),
                role_id.as_i64().to_string(),
                "permissions".to_owned(),
            ],
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        tenant_id: TenantId,
        segments: &[&str],
    ) -> AppResult<T> {
        let url = self.endpoint(segments)?;
        debug!(operation, %url, %tenant_id, "GET backend");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.api_token.as_str())
            .header(TENANT_HEADER, tenant_id.to_string())
            .send()
            .await
            .map_err(|error| AppError::Fetch(format!("{operation} request failed: {error}")))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|error| {
            AppError::Fetch(format!("{operation} response could not be read: {error}"))
        })?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body).map_err(|error| {
            AppError::Fetch(format!(
                "{operation} returned an unreadable body (status {status}): {error}"
            ))
        })?;

        classify_fetch(operation, status, envelope)
    }
}

#[async_trait]
impl PermissionBackend for HttpPermissionBackend {
    async fn list_permission_catalog(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let rows: Vec<PermissionDto> = self
            .fetch("permission catalog", tenant_id, &["api", "permissions"])
            .await?;
        normalize_catalog(rows)
    }

    async fn list_effective_permissions(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<EffectivePermission>> {
        let actor_id = actor.user_id().to_string();
        let rows: Vec<PermissionDto> = self
            .fetch(
                "effective permissions",
                actor.tenant_id(),
                &["api", "permissions", "effective", "admins", actor_id.as_str()],
            )
            .await?;
        normalize_effective(rows)
    }

    async fn list_principal_grants(
        &self,
        tenant_id: TenantId,
        principal: Principal,
    ) -> AppResult<Vec<PermissionGrant>> {
        let segments = Self::principal_segments(principal);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let rows: Vec<GrantDto> = self.fetch("principal grants", tenant_id, &segments).await?;
        normalize_grants(rows)
    }

    async fn save_principal_grants(
        &self,
        tenant_id: TenantId,
        principal: Principal,
        records: &[AssignmentRecord],
    ) -> AppResult<SaveAcknowledgement> {
        let segments = Self::principal_segments(principal);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let url = self.endpoint(&segments)?;
        let payload: Vec<AssignmentRecordDto> =
            records.iter().map(AssignmentRecordDto::from).collect();
        debug!(%url, %tenant_id, %principal, record_count = payload.len(), "POST backend");

        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.api_token.as_str())
            .header(TENANT_HEADER, tenant_id.to_string())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                AppError::Save(format!("saving grants for {principal} failed: {error}"))
            })?;
        let status = response.status();
        let envelope = response.bytes().await.ok().and_then(|body| {
            serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&body).ok()
        });

        classify_save("saving grants", status, envelope)
    }

    async fn load_session_capabilities(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<SessionCapabilitySet> {
        let modules: Vec<SessionModuleDto> = self
            .fetch(
                "session capabilities",
                actor.tenant_id(),
                &["api", "permissions", "me"],
            )
            .await?;
        Ok(session_capabilities(modules))
    }
}
