//! Capability set of the signed-in actor and the read-only queries used to
//! gate buttons, routes and navigation entries.

mod routes;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{CapabilityFlags, CapabilityVerb};

pub use routes::{NavigationEntry, RouteBinding, RouteRegistry};

/// CRUD-style action suffix used in module-level permission names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleAction {
    /// `<Module>.Read`
    Read,
    /// `<Module>.Create`
    Create,
    /// `<Module>.Update`
    Update,
    /// `<Module>.Delete`
    Delete,
    /// `<Module>.Manage`
    Manage,
}

impl ModuleAction {
    /// Returns the permission-name suffix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Manage => "Manage",
        }
    }

    /// Returns all actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ModuleAction] = &[
            ModuleAction::Read,
            ModuleAction::Create,
            ModuleAction::Update,
            ModuleAction::Delete,
            ModuleAction::Manage,
        ];

        ALL
    }

    /// Returns the full permission name for `module_name`.
    #[must_use]
    pub fn permission_name(&self, module_name: &str) -> String {
        format!("{module_name}.{}", self.as_str())
    }
}

/// Capability bits the actor holds for one named permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCapabilities {
    /// Permission name as published by the backend.
    pub permission_name: String,
    /// Held capabilities.
    pub flags: CapabilityFlags,
}

/// Permissions grouped under one sub-module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubModuleCapabilities {
    /// Sub-module name.
    pub sub_module_name: String,
    /// Permissions in the sub-module.
    pub permissions: Vec<PermissionCapabilities>,
}

/// Sub-modules grouped under one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCapabilities {
    /// Module name.
    pub module_name: String,
    /// Sub-modules of the module.
    pub sub_modules: Vec<SubModuleCapabilities>,
}

/// Resolved capability hierarchy of the signed-in actor.
///
/// Lookups are exact and case-sensitive. Anything missing from the hierarchy
/// answers `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCapabilitySet {
    modules: Vec<ModuleCapabilities>,
}

impl SessionCapabilitySet {
    /// Creates a capability set from a resolved hierarchy.
    #[must_use]
    pub fn new(modules: Vec<ModuleCapabilities>) -> Self {
        Self { modules }
    }

    /// Returns the module hierarchy.
    #[must_use]
    pub fn modules(&self) -> &[ModuleCapabilities] {
        self.modules.as_slice()
    }

    /// Returns whether the set holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns whether `permission_name` exists with any capability granted.
    #[must_use]
    pub fn check_permission(&self, permission_name: &str) -> bool {
        self.modules
            .iter()
            .flat_map(|module| module.sub_modules.iter())
            .flat_map(|sub_module| sub_module.permissions.iter())
            .any(|permission| {
                permission.permission_name == permission_name && permission.flags.any()
            })
    }

    /// Returns whether at least one of `permission_names` is granted.
    #[must_use]
    pub fn has_any_permission<S: AsRef<str>>(&self, permission_names: &[S]) -> bool {
        permission_names
            .iter()
            .any(|name| self.check_permission(name.as_ref()))
    }

    /// Returns whether every one of `permission_names` is granted.
    #[must_use]
    pub fn has_all_permissions<S: AsRef<str>>(&self, permission_names: &[S]) -> bool {
        permission_names
            .iter()
            .all(|name| self.check_permission(name.as_ref()))
    }

    /// Returns whether `<module_name>.<action>` is granted.
    #[must_use]
    pub fn can(&self, module_name: &str, action: ModuleAction) -> bool {
        self.check_permission(action.permission_name(module_name).as_str())
    }

    /// Shorthand for [`ModuleAction::Read`].
    #[must_use]
    pub fn can_read(&self, module_name: &str) -> bool {
        self.can(module_name, ModuleAction::Read)
    }

    /// Shorthand for [`ModuleAction::Create`].
    #[must_use]
    pub fn can_create(&self, module_name: &str) -> bool {
        self.can(module_name, ModuleAction::Create)
    }

    /// Shorthand for [`ModuleAction::Update`].
    #[must_use]
    pub fn can_update(&self, module_name: &str) -> bool {
        self.can(module_name, ModuleAction::Update)
    }

    /// Shorthand for [`ModuleAction::Delete`].
    #[must_use]
    pub fn can_delete(&self, module_name: &str) -> bool {
        self.can(module_name, ModuleAction::Delete)
    }

    /// Shorthand for [`ModuleAction::Manage`].
    #[must_use]
    pub fn can_manage(&self, module_name: &str) -> bool {
        self.can(module_name, ModuleAction::Manage)
    }

    /// Returns whether any module action is granted, i.e. whether the module's
    /// pages and navigation entries are shown at all.
    #[must_use]
    pub fn can_view_module(&self, module_name: &str) -> bool {
        ModuleAction::all()
            .iter()
            .any(|action| self.can(module_name, *action))
    }

    /// Returns whether the module is present, regardless of capability bits.
    #[must_use]
    pub fn has_module_access(&self, module_name: &str) -> bool {
        self.module(module_name).is_some()
    }

    /// Returns whether the sub-module is present, regardless of capability bits.
    #[must_use]
    pub fn has_sub_module_access(&self, module_name: &str, sub_module_name: &str) -> bool {
        self.sub_module(module_name, sub_module_name).is_some()
    }

    /// Returns whether the route's owning sub-module grants `verb` through
    /// any of its permissions.
    #[must_use]
    pub fn can_perform_action(
        &self,
        routes: &RouteRegistry,
        route_path: &str,
        verb: CapabilityVerb,
    ) -> bool {
        routes
            .resolve(route_path)
            .and_then(|binding| {
                self.sub_module(binding.module_name(), binding.sub_module_name())
            })
            .is_some_and(|sub_module| {
                sub_module
                    .permissions
                    .iter()
                    .any(|permission| permission.flags.allows(verb))
            })
    }

    /// Filters navigation entries down to the modules the actor may view.
    #[must_use]
    pub fn visible_navigation<'a>(
        &self,
        entries: &'a [NavigationEntry],
    ) -> Vec<&'a NavigationEntry> {
        entries
            .iter()
            .filter(|entry| self.can_view_module(entry.module_name()))
            .collect()
    }

    fn module(&self, module_name: &str) -> Option<&ModuleCapabilities> {
        self.modules
            .iter()
            .find(|module| module.module_name == module_name)
    }

    fn sub_module(&self, module_name: &str, sub_module_name: &str) -> Option<&SubModuleCapabilities> {
        self.module(module_name).and_then(|module| {
            module
                .sub_modules
                .iter()
                .find(|sub_module| sub_module.sub_module_name == sub_module_name)
        })
    }
}
