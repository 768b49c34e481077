use std::collections::BTreeMap;

use campusdesk_core::{AppError, AppResult};

use crate::{CapabilityFlags, CapabilityVerb, GENERAL_SUB_MODULE};

use super::{CapabilityMatrix, MatrixCell};

impl CapabilityMatrix {
    /// Sets one capability of one cell.
    ///
    /// Enabling a sub-module capability requires the module-level (`General`)
    /// capability to be enabled first, and every enable must stay within the
    /// assigner's ceiling. Disabling a `General` capability disables the same
    /// capability in every sibling sub-module. Rejected toggles leave the
    /// matrix unchanged.
    pub fn toggle_cell(
        &mut self,
        module_name: &str,
        sub_module_name: &str,
        verb: CapabilityVerb,
        value: bool,
    ) -> AppResult<()> {
        let sub_modules = self.sub_modules_mut(module_name)?;
        let Some(cell) = sub_modules.get(sub_module_name) else {
            return Err(unknown_sub_module(module_name, sub_module_name));
        };

        if value {
            if sub_module_name != GENERAL_SUB_MODULE
                && !general_prerequisite_met(sub_modules, verb)
            {
                return Err(AppError::Validation(format!(
                    "enable the module-level '{verb}' capability of '{module_name}' first"
                )));
            }

            if !cell.admin_can.allows(verb) {
                return Err(AppError::Validation(format!(
                    "cannot grant '{verb}' on '{module_name}/{sub_module_name}' without holding it"
                )));
            }
        }

        if let Some(cell) = sub_modules.get_mut(sub_module_name) {
            cell.user_can.set(verb, value);
        }

        if !value && sub_module_name == GENERAL_SUB_MODULE {
            for sibling in sub_modules.values_mut() {
                sibling.user_can.set(verb, false);
            }
        }

        Ok(())
    }

    /// Applies `value` to every assignable capability of every sub-module.
    ///
    /// This is the bulk path behind the module master switch; it does not
    /// check the per-sub-module prerequisite.
    pub fn toggle_module(&mut self, module_name: &str, value: bool) -> AppResult<()> {
        for cell in self.sub_modules_mut(module_name)?.values_mut() {
            for verb in CapabilityVerb::all() {
                if cell.admin_can.allows(*verb) {
                    cell.user_can.set(*verb, value);
                }
            }
        }

        Ok(())
    }

    /// Applies `value` to all four capabilities of one sub-module.
    ///
    /// For `General`, disabling also clears every sibling sub-module. For any
    /// other sub-module, enabling only sets capabilities whose module-level
    /// prerequisite is already met and skips the rest without error.
    /// Returns the resulting state of the toggled cell.
    pub fn toggle_sub_module(
        &mut self,
        module_name: &str,
        sub_module_name: &str,
        value: bool,
    ) -> AppResult<CapabilityFlags> {
        let sub_modules = self.sub_modules_mut(module_name)?;
        if !sub_modules.contains_key(sub_module_name) {
            return Err(unknown_sub_module(module_name, sub_module_name));
        }

        if sub_module_name == GENERAL_SUB_MODULE {
            if let Some(general) = sub_modules.get_mut(GENERAL_SUB_MODULE) {
                for verb in CapabilityVerb::all() {
                    if general.admin_can.allows(*verb) {
                        general.user_can.set(*verb, value);
                    }
                }
            }

            if !value {
                for sibling in sub_modules.values_mut() {
                    sibling.user_can = CapabilityFlags::default();
                }
            }
        } else if value {
            let allowed: Vec<CapabilityVerb> = CapabilityVerb::all()
                .iter()
                .copied()
                .filter(|verb| general_prerequisite_met(sub_modules, *verb))
                .collect();

            if let Some(cell) = sub_modules.get_mut(sub_module_name) {
                for verb in allowed {
                    if cell.admin_can.allows(verb) {
                        cell.user_can.set(verb, true);
                    }
                }
            }
        } else if let Some(cell) = sub_modules.get_mut(sub_module_name) {
            cell.user_can = CapabilityFlags::default();
        }

        Ok(sub_modules
            .get(sub_module_name)
            .map(MatrixCell::user_can)
            .unwrap_or_default())
    }

    /// Returns whether every assignable capability of the module is granted.
    ///
    /// Unknown modules are never fully enabled.
    #[must_use]
    pub fn is_module_fully_enabled(&self, module_name: &str) -> bool {
        self.modules.get(module_name).is_some_and(|sub_modules| {
            sub_modules.values().all(MatrixCell::is_fully_enabled)
        })
    }

    /// Returns whether every assignable capability of the sub-module is granted.
    #[must_use]
    pub fn is_sub_module_fully_enabled(&self, module_name: &str, sub_module_name: &str) -> bool {
        self.cell(module_name, sub_module_name)
            .is_some_and(MatrixCell::is_fully_enabled)
    }

    fn sub_modules_mut(
        &mut self,
        module_name: &str,
    ) -> AppResult<&mut BTreeMap<String, MatrixCell>> {
        self.modules.get_mut(module_name).ok_or_else(|| {
            AppError::Validation(format!("module '{module_name}' is not in the matrix"))
        })
    }
}

// A module without a General permission for `verb` imposes no prerequisite.
fn general_prerequisite_met(
    sub_modules: &BTreeMap<String, MatrixCell>,
    verb: CapabilityVerb,
) -> bool {
    sub_modules
        .get(GENERAL_SUB_MODULE)
        .filter(|general| general.permission(verb).is_some())
        .is_none_or(|general| general.user_can.allows(verb))
}

fn unknown_sub_module(module_name: &str, sub_module_name: &str) -> AppError {
    AppError::Validation(format!(
        "sub-module '{sub_module_name}' is not part of module '{module_name}'"
    ))
}
