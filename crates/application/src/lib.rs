//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod capability_service;
mod permission_ports;

#[cfg(test)]
mod test_support;

pub use assignment_service::{
    AssignmentSaveReport, AssignmentSession, PermissionAssignmentService, flatten_matrix,
    records_match_grants,
};
pub use capability_service::{SessionCapabilityService, SessionCapabilityStore};
pub use permission_ports::{AssignmentRecord, PermissionBackend, SaveAcknowledgement};
