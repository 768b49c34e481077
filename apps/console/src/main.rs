//! Campusdesk permission administration console.

#![forbid(unsafe_code)]

mod commands;
mod console_config;
mod render;

use std::sync::Arc;

use campusdesk_application::{
    AssignmentSession, PermissionAssignmentService, PermissionBackend, SessionCapabilityService,
    SessionCapabilityStore,
};
use campusdesk_core::{AppError, AppResult, UserIdentity};
use campusdesk_domain::{Principal, RouteRegistry};
use campusdesk_infrastructure::HttpPermissionBackend;
use clap::Parser;
use tracing::info;

use crate::commands::{Cli, Command};
use crate::console_config::{ConsoleConfig, init_tracing};
use crate::render::{MatrixTable, ModuleOverview};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ConsoleConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let backend: Arc<dyn PermissionBackend> = Arc::new(HttpPermissionBackend::new(
        http_client,
        config.api_base_url.clone(),
        config.api_token.as_str(),
    ));
    let actor = config.actor();

    info!(
        actor = actor.user_id(),
        role = actor.role().as_str(),
        tenant_id = %actor.tenant_id(),
        api_base_url = %config.api_base_url,
        "campusdesk-console started"
    );

    let assignments = PermissionAssignmentService::new(Arc::clone(&backend));
    let capabilities =
        SessionCapabilityService::new(backend, Arc::new(SessionCapabilityStore::new()));

    match cli.command {
        Command::Matrix { principal } => {
            let session = assignments.open(&actor, principal.principal()?).await?;
            print!("{}", MatrixTable(session.matrix()));
        }
        Command::ToggleCell {
            principal,
            module,
            sub_module,
            verb,
            switch,
        } => {
            edit_and_save(&assignments, &actor, principal.principal()?, |session| {
                session.toggle_cell(module.as_str(), sub_module.as_str(), verb, switch.value())
            })
            .await?;
        }
        Command::ToggleSubModule {
            principal,
            module,
            sub_module,
            switch,
        } => {
            edit_and_save(&assignments, &actor, principal.principal()?, |session| {
                session
                    .toggle_sub_module(module.as_str(), sub_module.as_str(), switch.value())
                    .map(|_| ())
            })
            .await?;
        }
        Command::ToggleModule {
            principal,
            module,
            switch,
        } => {
            edit_and_save(&assignments, &actor, principal.principal()?, |session| {
                session.toggle_module(module.as_str(), switch.value())
            })
            .await?;
        }
        Command::Check { permission_names } => {
            let snapshot = capabilities.refresh(&actor).await?;
            for permission_name in &permission_names {
                println!(
                    "{permission_name}: {}",
                    snapshot.check_permission(permission_name.as_str())
                );
            }
            println!("any: {}", snapshot.has_any_permission(&permission_names));
            println!("all: {}", snapshot.has_all_permissions(&permission_names));
        }
        Command::Modules => {
            let snapshot = capabilities.refresh(&actor).await?;
            let routes = RouteRegistry::school_console();
            print!(
                "{}",
                ModuleOverview {
                    capabilities: &snapshot,
                    routes: &routes,
                }
            );
        }
    }

    Ok(())
}

async fn edit_and_save<F>(
    assignments: &PermissionAssignmentService,
    actor: &UserIdentity,
    principal: Principal,
    edit: F,
) -> AppResult<()>
where
    F: FnOnce(&mut AssignmentSession) -> AppResult<()>,
{
    let mut session = assignments.open(actor, principal).await?;
    edit(&mut session)?;

    if session.is_dirty() {
        let report = assignments.save(actor, &mut session).await?;
        println!(
            "saved {} permission records for {} at {}",
            report.record_count,
            report.principal,
            report.saved_at.to_rfc3339()
        );
    } else {
        println!("no changes for {principal}");
    }

    print!("{}", MatrixTable(session.matrix()));
    Ok(())
}
