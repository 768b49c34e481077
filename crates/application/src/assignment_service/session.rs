use campusdesk_core::AppResult;
use campusdesk_domain::{CapabilityFlags, CapabilityMatrix, CapabilityVerb, Principal};

use crate::permission_ports::AssignmentRecord;

use super::flatten_matrix;

/// Editing state of one open assignment screen.
///
/// Holds the matrix for exactly one principal; it is discarded when the
/// screen is left and rebuilt from fresh reads on the next open.
#[derive(Debug, Clone)]
pub struct AssignmentSession {
    principal: Principal,
    matrix: CapabilityMatrix,
    saved: CapabilityMatrix,
}

impl AssignmentSession {
    pub(super) fn new(principal: Principal, matrix: CapabilityMatrix) -> Self {
        Self {
            principal,
            saved: matrix.clone(),
            matrix,
        }
    }

    /// Returns the principal being edited.
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// Returns the current matrix.
    #[must_use]
    pub fn matrix(&self) -> &CapabilityMatrix {
        &self.matrix
    }

    /// Sets one capability of one cell.
    pub fn toggle_cell(
        &mut self,
        module_name: &str,
        sub_module_name: &str,
        verb: CapabilityVerb,
        value: bool,
    ) -> AppResult<()> {
        self.matrix
            .toggle_cell(module_name, sub_module_name, verb, value)
    }

    /// Applies the sub-module switch.
    pub fn toggle_sub_module(
        &mut self,
        module_name: &str,
        sub_module_name: &str,
        value: bool,
    ) -> AppResult<CapabilityFlags> {
        self.matrix
            .toggle_sub_module(module_name, sub_module_name, value)
    }

    /// Applies the module master switch.
    pub fn toggle_module(&mut self, module_name: &str, value: bool) -> AppResult<()> {
        self.matrix.toggle_module(module_name, value)
    }

    /// Returns whether edits differ from the last loaded or saved state.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.matrix != self.saved
    }

    /// Reverts unsaved edits.
    pub fn discard_changes(&mut self) {
        self.matrix = self.saved.clone();
    }

    /// Flattens the current matrix into bulk-save records.
    #[must_use]
    pub fn records(&self) -> Vec<AssignmentRecord> {
        flatten_matrix(&self.matrix, self.principal)
    }

    pub(super) fn mark_saved(&mut self) {
        self.saved = self.matrix.clone();
    }
}
