use std::collections::{BTreeMap, HashMap};

use campusdesk_domain::{CapabilityMatrix, PermissionGrant, PermissionId, Principal};

use crate::permission_ports::AssignmentRecord;

/// Flattens a matrix into one record per permission id.
///
/// Every record carries all four bits of the row that owns the permission,
/// so a single write never clears bits set through a sibling column. Bits
/// the target holds beyond the assigner's ceiling are carried through
/// untouched. A permission mapped into several rows receives the union of
/// their bits.
#[must_use]
pub fn flatten_matrix(matrix: &CapabilityMatrix, principal: Principal) -> Vec<AssignmentRecord> {
    let mut records: BTreeMap<PermissionId, AssignmentRecord> = BTreeMap::new();

    for (module_name, sub_module_name, cell) in matrix.cells() {
        let flags = cell.persisted_flags();
        for (_, permission) in cell.permissions() {
            records
                .entry(permission.permission_id)
                .and_modify(|record| {
                    record.flags = record.flags.union(flags);
                    record.is_assigned = record.flags.any();
                })
                .or_insert_with(|| AssignmentRecord {
                    principal,
                    permission_id: permission.permission_id,
                    permission_key: Some(permission.permission_key.clone()),
                    permission_name: Some(permission.permission_name.clone()),
                    module_name: Some(module_name.to_owned()),
                    sub_module_name: Some(sub_module_name.to_owned()),
                    is_assigned: flags.any(),
                    flags,
                });
        }
    }

    records.into_values().collect()
}

/// Returns whether every record is reflected bit-for-bit in `grants`.
///
/// A record without a matching grant only matches when it grants nothing.
#[must_use]
pub fn records_match_grants(records: &[AssignmentRecord], grants: &[PermissionGrant]) -> bool {
    let persisted: HashMap<PermissionId, PermissionGrant> = grants
        .iter()
        .map(|grant| (grant.permission_id, *grant))
        .collect();

    records.iter().all(|record| {
        persisted
            .get(&record.permission_id)
            .map(|grant| grant.flags)
            .unwrap_or_default()
            == record.flags
    })
}
