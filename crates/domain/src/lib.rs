//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod matrix;
mod permission;
mod principal;
mod session;

pub use matrix::{AssignerScope, CapabilityMatrix, MatrixCell, PermissionRef};
pub use permission::{
    CapabilityFlags, CapabilityVerb, EffectivePermission, GENERAL_SUB_MODULE, Permission,
    PermissionGrant, PermissionId, normalize_sub_module_name,
};
pub use principal::{Principal, RoleId, UserId};
pub use session::{
    ModuleAction, ModuleCapabilities, NavigationEntry, PermissionCapabilities, RouteBinding,
    RouteRegistry, SessionCapabilitySet, SubModuleCapabilities,
};
