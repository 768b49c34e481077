//! Editable capability matrix merging an assigner's ceiling with a target's
//! current grants.

mod hierarchy;


use std::collections::{BTreeMap, HashMap};

use campusdesk_core::AccountRole;
use serde::{Deserialize, Serialize};

use crate::{
    CapabilityFlags, CapabilityVerb, EffectivePermission, Permission, PermissionGrant,
    PermissionId,
};

/// How far an assigning actor may delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignerScope {
    /// The actor may grant every capability present in the matrix.
    Unrestricted,
    /// The actor may only grant capabilities it holds itself.
    Restricted,
}

impl AssignerScope {
    /// Resolves the delegation scope for an account tier.
    #[must_use]
    pub fn for_role(role: AccountRole) -> Self {
        if role.is_unrestricted_assigner() {
            Self::Unrestricted
        } else {
            Self::Restricted
        }
    }
}

/// Permission mapped to one capability column of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRef {
    /// Stable permission identifier.
    pub permission_id: PermissionId,
    /// Dotted permission key.
    pub permission_key: String,
    /// Display label.
    pub permission_name: String,
}

impl From<&Permission> for PermissionRef {
    fn from(permission: &Permission) -> Self {
        Self {
            permission_id: permission.permission_id(),
            permission_key: permission.permission_key().to_owned(),
            permission_name: permission.permission_name().to_owned(),
        }
    }
}

/// One module/sub-module row of the matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    permissions: BTreeMap<CapabilityVerb, PermissionRef>,
    admin_can: CapabilityFlags,
    user_can: CapabilityFlags,
    locked_granted: CapabilityFlags,
}

impl MatrixCell {
    /// Returns the permission backing `verb`, if the cell has one.
    #[must_use]
    pub fn permission(&self, verb: CapabilityVerb) -> Option<&PermissionRef> {
        self.permissions.get(&verb)
    }

    /// Iterates over mapped permissions in column order.
    pub fn permissions(&self) -> impl Iterator<Item = (CapabilityVerb, &PermissionRef)> {
        self.permissions.iter().map(|(verb, permission)| (*verb, permission))
    }

    /// Returns the assigner's ceiling for this cell.
    #[must_use]
    pub fn admin_can(&self) -> CapabilityFlags {
        self.admin_can
    }

    /// Returns the target's current state for this cell.
    #[must_use]
    pub fn user_can(&self) -> CapabilityFlags {
        self.user_can
    }

    /// Returns bits the target holds outside the assigner's ceiling.
    ///
    /// Toggles never touch these; they are written back unchanged on save.
    #[must_use]
    pub fn locked_granted(&self) -> CapabilityFlags {
        self.locked_granted
    }

    /// Returns everything the target will hold after a save.
    #[must_use]
    pub fn persisted_flags(&self) -> CapabilityFlags {
        self.user_can.union(self.locked_granted)
    }

    /// Returns whether every assignable verb is granted.
    #[must_use]
    pub fn is_fully_enabled(&self) -> bool {
        CapabilityVerb::all()
            .iter()
            .all(|verb| !self.admin_can.allows(*verb) || self.user_can.allows(*verb))
    }

    fn respects_ceiling(&self) -> bool {
        self.user_can
            .granted_verbs()
            .all(|verb| self.admin_can.allows(verb))
    }
}

/// Module → sub-module → cell view used by the assignment screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityMatrix {
    modules: BTreeMap<String, BTreeMap<String, MatrixCell>>,
}

impl CapabilityMatrix {
    /// Builds a matrix from the assigner's permissions and the target's grants.
    ///
    /// Permissions whose key does not end in a capability verb are skipped.
    /// A later permission mapped to the same cell and verb replaces an earlier
    /// one. Target bits outside the assigner's ceiling stay out of `user_can`
    /// and are kept as locked grants instead.
    #[must_use]
    pub fn build(
        scope: AssignerScope,
        actor_permissions: &[EffectivePermission],
        target_grants: &[PermissionGrant],
    ) -> Self {
        let grants: HashMap<PermissionId, CapabilityFlags> = target_grants
            .iter()
            .map(|grant| (grant.permission_id, grant.flags))
            .collect();

        let mut modules: BTreeMap<String, BTreeMap<String, MatrixCell>> = BTreeMap::new();
        for effective in actor_permissions {
            let permission = &effective.permission;
            let Some(verb) = permission.verb() else {
                continue;
            };

            let assignable = match scope {
                AssignerScope::Unrestricted => true,
                AssignerScope::Restricted => effective.flags.allows(verb),
            };
            let granted = grants
                .get(&permission.permission_id())
                .is_some_and(|flags| flags.allows(verb));

            let cell = modules
                .entry(permission.module_name().to_owned())
                .or_default()
                .entry(permission.sub_module_name().to_owned())
                .or_default();
            cell.admin_can.set(verb, assignable);
            cell.user_can.set(verb, assignable && granted);
            cell.locked_granted.set(verb, !assignable && granted);
            cell.permissions.insert(verb, PermissionRef::from(permission));
        }

        Self { modules }
    }

    /// Returns whether the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates over module names in display order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Iterates over the cells of one module.
    pub fn sub_modules(&self, module_name: &str) -> impl Iterator<Item = (&str, &MatrixCell)> {
        self.modules
            .get(module_name)
            .into_iter()
            .flat_map(|sub_modules| {
                sub_modules
                    .iter()
                    .map(|(name, cell)| (name.as_str(), cell))
            })
    }

    /// Iterates over every `(module, sub_module, cell)` row.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &MatrixCell)> {
        self.modules.iter().flat_map(|(module_name, sub_modules)| {
            sub_modules.iter().map(move |(sub_module_name, cell)| {
                (module_name.as_str(), sub_module_name.as_str(), cell)
            })
        })
    }

    /// Returns one cell.
    #[must_use]
    pub fn cell(&self, module_name: &str, sub_module_name: &str) -> Option<&MatrixCell> {
        self.modules
            .get(module_name)
            .and_then(|sub_modules| sub_modules.get(sub_module_name))
    }

    /// Returns the target's state for every row, keyed by module and sub-module.
    #[must_use]
    pub fn user_can_surface(&self) -> BTreeMap<(String, String), CapabilityFlags> {
        self.cells()
            .map(|(module_name, sub_module_name, cell)| {
                (
                    (module_name.to_owned(), sub_module_name.to_owned()),
                    cell.user_can,
                )
            })
            .collect()
    }

    /// Returns whether no granted bit exceeds the assigner's ceiling.
    #[must_use]
    pub fn respects_ceiling(&self) -> bool {
        self.cells().all(|(_, _, cell)| cell.respects_ceiling())
    }
}
