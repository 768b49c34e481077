use std::str::FromStr;

use campusdesk_core::{AppError, AppResult};
use campusdesk_domain::{CapabilityVerb, Principal, RoleId, UserId};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "campusdesk-console")]
#[command(about = "Campusdesk permission administration console", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the assignment matrix of a user or role
    Matrix {
        #[command(flatten)]
        principal: PrincipalArgs,
    },
    /// Set one capability of one sub-module row and save
    ToggleCell {
        #[command(flatten)]
        principal: PrincipalArgs,

        /// Module name, e.g. "Academic Management"
        #[arg(long)]
        module: String,

        /// Sub-module name; "General" addresses module-level permissions
        #[arg(long)]
        sub_module: String,

        /// Capability: view, create, edit or delete
        #[arg(long, value_parser = parse_verb)]
        verb: CapabilityVerb,

        #[command(flatten)]
        switch: SwitchArgs,
    },
    /// Enable or disable every capability of one sub-module row and save
    ToggleSubModule {
        #[command(flatten)]
        principal: PrincipalArgs,

        /// Module name
        #[arg(long)]
        module: String,

        /// Sub-module name
        #[arg(long)]
        sub_module: String,

        #[command(flatten)]
        switch: SwitchArgs,
    },
    /// Enable or disable a whole module and save
    ToggleModule {
        #[command(flatten)]
        principal: PrincipalArgs,

        /// Module name
        #[arg(long)]
        module: String,

        #[command(flatten)]
        switch: SwitchArgs,
    },
    /// Check permission names against the signed-in actor's capabilities
    Check {
        /// Permission names, e.g. "Billing.Read"
        #[arg(required = true)]
        permission_names: Vec<String>,
    },
    /// List modules and console routes visible to the signed-in actor
    Modules,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PrincipalArgs {
    /// Target user id
    #[arg(long)]
    user: Option<i64>,

    /// Target role id
    #[arg(long)]
    role: Option<i64>,
}

impl PrincipalArgs {
    pub fn principal(&self) -> AppResult<Principal> {
        match (self.user, self.role) {
            (Some(user_id), _) => Ok(Principal::User(UserId::new(user_id)?)),
            (None, Some(role_id)) => Ok(Principal::Role(RoleId::new(role_id)?)),
            (None, None) => Err(AppError::Validation(
                "either --user or --role is required".to_owned(),
            )),
        }
    }
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SwitchArgs {
    /// Grant the capabilities
    #[arg(long)]
    enable: bool,

    /// Revoke the capabilities
    #[arg(long)]
    disable: bool,
}

impl SwitchArgs {
    pub fn value(&self) -> bool {
        self.enable && !self.disable
    }
}

fn parse_verb(value: &str) -> Result<CapabilityVerb, String> {
    let mut characters = value.trim().chars();
    let normalized: String = characters
        .next()
        .map(|first| {
            first
                .to_uppercase()
                .chain(characters.flat_map(char::to_lowercase))
                .collect()
        })
        .unwrap_or_default();

    CapabilityVerb::from_str(normalized.as_str()).map_err(|error| error.to_string())
}
