use std::fmt::{self, Display, Formatter};

use campusdesk_domain::{
    CapabilityMatrix, CapabilityVerb, MatrixCell, RouteRegistry, SessionCapabilitySet,
};

const GRANTED: char = 'x';
const ASSIGNABLE: char = ' ';
const HELD_LOCKED: char = '#';
const LOCKED: char = '-';

/// The matrix as an indented table.
///
/// `[x]` granted, `[ ]` assignable, `[#]` held but outside the assigner's
/// ceiling, `[-]` outside the ceiling and not held.
pub struct MatrixTable<'a>(pub &'a CapabilityMatrix);

impl Display for MatrixTable<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let matrix = self.0;
        if matrix.is_empty() {
            return writeln!(formatter, "no assignable permissions");
        }

        let width = matrix
            .cells()
            .map(|(_, sub_module_name, _)| sub_module_name.len())
            .max()
            .unwrap_or_default();

        for module_name in matrix.module_names() {
            writeln!(formatter, "{module_name} [{}]", module_state(matrix, module_name))?;
            for (sub_module_name, cell) in matrix.sub_modules(module_name) {
                write!(formatter, "  {sub_module_name:<width$}")?;
                for verb in CapabilityVerb::all() {
                    write!(formatter, "  {verb}[{}]", marker(cell, *verb))?;
                }
                writeln!(formatter)?;
            }
        }
        Ok(())
    }
}

/// Module visibility and route access for the signed-in actor.
pub struct ModuleOverview<'a> {
    pub capabilities: &'a SessionCapabilitySet,
    pub routes: &'a RouteRegistry,
}

impl Display for ModuleOverview<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let capabilities = self.capabilities;
        for module in capabilities.modules() {
            let visibility = if capabilities.can_view_module(module.module_name.as_str()) {
                "visible"
            } else {
                "hidden"
            };
            writeln!(formatter, "{} [{visibility}]", module.module_name)?;
            for sub_module in &module.sub_modules {
                writeln!(formatter, "  {}", sub_module.sub_module_name)?;
            }
        }

        if !self.routes.bindings().is_empty() {
            writeln!(formatter, "routes:")?;
        }
        for binding in self.routes.bindings() {
            let verbs: Vec<&str> = CapabilityVerb::all()
                .iter()
                .filter(|verb| {
                    capabilities.can_perform_action(self.routes, binding.path_prefix(), **verb)
                })
                .map(CapabilityVerb::as_str)
                .collect();
            let verbs = if verbs.is_empty() {
                "none".to_owned()
            } else {
                verbs.join(",")
            };
            writeln!(formatter, "  {} -> {verbs}", binding.path_prefix())?;
        }
        Ok(())
    }
}

fn module_state(matrix: &CapabilityMatrix, module_name: &str) -> &'static str {
    if matrix.is_module_fully_enabled(module_name) {
        "all"
    } else if matrix
        .sub_modules(module_name)
        .any(|(_, cell)| cell.user_can().any())
    {
        "partial"
    } else {
        "none"
    }
}

fn marker(cell: &MatrixCell, verb: CapabilityVerb) -> char {
    if cell.user_can().allows(verb) {
        GRANTED
    } else if cell.admin_can().allows(verb) {
        ASSIGNABLE
    } else if cell.locked_granted().allows(verb) {
        HELD_LOCKED
    } else {
        LOCKED
    }
}
