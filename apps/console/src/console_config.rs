use std::env;
use std::str::FromStr;
use std::time::Duration;

use campusdesk_core::{AccountRole, AppError, TenantId, UserIdentity};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ACTOR_NAME: &str = "console";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: Url,
    pub api_token: String,
    pub tenant_id: TenantId,
    pub actor_id: i64,
    pub actor_name: String,
    pub actor_role: AccountRole,
    pub http_timeout: Duration,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base_url = required_non_empty(&lookup, "CAMPUSDESK_API_BASE_URL")?;
        let api_base_url = Url::parse(api_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid CAMPUSDESK_API_BASE_URL: {error}"))
        })?;
        if api_base_url.cannot_be_a_base() {
            return Err(AppError::Validation(
                "CAMPUSDESK_API_BASE_URL must be an http(s) base url".to_owned(),
            ));
        }

        let api_token = required_non_empty(&lookup, "CAMPUSDESK_API_TOKEN")?;
        let tenant_id = uuid::Uuid::parse_str(
            required_non_empty(&lookup, "CAMPUSDESK_TENANT_ID")?.trim(),
        )
        .map(TenantId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid CAMPUSDESK_TENANT_ID: {error}")))?;
        let actor_id = required_non_empty(&lookup, "CAMPUSDESK_ACTOR_ID")?
            .trim()
            .parse::<i64>()
            .map_err(|error| AppError::Validation(format!("invalid CAMPUSDESK_ACTOR_ID: {error}")))?;

        let actor_name = optional(&lookup, "CAMPUSDESK_ACTOR_NAME")
            .unwrap_or_else(|| DEFAULT_ACTOR_NAME.to_owned());
        let actor_role = optional(&lookup, "CAMPUSDESK_ACTOR_ROLE")
            .map(|value| AccountRole::from_str(value.trim()))
            .transpose()?
            .unwrap_or(AccountRole::Admin);
        let http_timeout_secs = optional(&lookup, "CAMPUSDESK_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value.trim().parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid CAMPUSDESK_HTTP_TIMEOUT_SECS: {error}"))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Ok(Self {
            api_base_url,
            api_token,
            tenant_id,
            actor_id,
            actor_name,
            actor_role,
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
        })
    }

    pub fn actor(&self) -> UserIdentity {
        UserIdentity::new(
            self.actor_id,
            self.actor_name.as_str(),
            self.actor_role,
            self.tenant_id,
        )
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
