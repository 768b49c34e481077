use std::sync::Arc;

use campusdesk_core::{AccountRole, AppError};
use campusdesk_domain::{
    AssignerScope, CapabilityFlags, CapabilityMatrix, CapabilityVerb, EffectivePermission,
    GENERAL_SUB_MODULE, PermissionGrant,
};
use proptest::prelude::*;

use crate::test_support::{
    FakePermissionBackend, SaveBehaviour, academic_catalog, actor, holding, permission_id, role,
    user,
};

use super::{PermissionAssignmentService, flatten_matrix, records_match_grants};

const MODULE: &str = "Academic Management";
const SESSIONS: &str = "Sessions";

fn service(
    backend: FakePermissionBackend,
) -> (PermissionAssignmentService, Arc<FakePermissionBackend>) {
    let backend = Arc::new(backend);
    (PermissionAssignmentService::new(backend.clone()), backend)
}

fn grant(id: i64, flags: CapabilityFlags) -> PermissionGrant {
    PermissionGrant {
        permission_id: permission_id(id),
        flags,
    }
}

fn restricted_backend() -> FakePermissionBackend {
    let catalog = academic_catalog();
    let mut backend = FakePermissionBackend::new(catalog.clone());
    // The admin holds the whole General row but only View and Create on Sessions.
    let (general, sessions) = catalog.split_at(4);
    backend.effective = holding(general, CapabilityFlags::all_granted());
    backend.effective.extend(holding(
        sessions,
        CapabilityFlags::new(true, true, false, false),
    ));
    backend
}

#[tokio::test]
async fn open_caps_restricted_assigner_to_own_capabilities() {
    let (service, _) = service(restricted_backend());

    let Ok(session) = service.open(&actor(1, AccountRole::Admin), role(7)).await else {
        panic!("session should open");
    };

    let Some(cell) = session.matrix().cell(MODULE, SESSIONS) else {
        panic!("sessions row should exist");
    };
    assert_eq!(cell.admin_can(), CapabilityFlags::new(true, true, false, false));
    assert_eq!(cell.user_can(), CapabilityFlags::default());
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn open_lets_unrestricted_assigner_grant_whole_catalog() {
    let (service, backend) = service(FakePermissionBackend::new(academic_catalog()));
    backend.grants.lock().await.insert(
        user(20),
        vec![grant(5, CapabilityFlags::new(true, false, false, false))],
    );

    let Ok(session) = service.open(&actor(1, AccountRole::SuperAdmin), user(20)).await else {
        panic!("session should open");
    };

    let Some(cell) = session.matrix().cell(MODULE, SESSIONS) else {
        panic!("sessions row should exist");
    };
    assert_eq!(cell.admin_can(), CapabilityFlags::all_granted());
    assert_eq!(cell.user_can(), CapabilityFlags::new(true, false, false, false));
}

#[tokio::test]
async fn open_locks_target_bits_outside_ceiling() {
    let (service, backend) = service(restricted_backend());
    backend.grants.lock().await.insert(
        user(20),
        vec![grant(7, CapabilityFlags::all_granted())],
    );

    let Ok(session) = service.open(&actor(1, AccountRole::Admin), user(20)).await else {
        panic!("session should open");
    };

    assert!(session.matrix().respects_ceiling());
    let Some(cell) = session.matrix().cell(MODULE, SESSIONS) else {
        panic!("sessions row should exist");
    };
    assert!(!cell.user_can().can_edit);
    assert!(cell.locked_granted().can_edit);
}

#[tokio::test]
async fn save_keeps_grants_the_assigner_cannot_see() {
    let (service, backend) = service(restricted_backend());
    backend.grants.lock().await.insert(
        role(7),
        vec![grant(8, CapabilityFlags::new(false, false, false, true))],
    );
    let admin = actor(1, AccountRole::Admin);
    let Ok(mut session) = service.open(&admin, role(7)).await else {
        panic!("session should open");
    };

    assert!(
        session
            .toggle_cell(MODULE, GENERAL_SUB_MODULE, CapabilityVerb::View, true)
            .is_ok()
    );
    assert!(service.save(&admin, &mut session).await.is_ok());

    let grants = backend.grants.lock().await;
    let delete_kept = grants
        .get(&role(7))
        .and_then(|grants| grants.iter().find(|grant| grant.permission_id.as_i64() == 8))
        .is_some_and(|grant| grant.flags.can_delete);
    assert!(delete_kept);
}

#[tokio::test]
async fn open_fails_without_partial_matrix_when_grants_cannot_be_read() {
    let mut backend = restricted_backend();
    backend.fail_grant_reads = true;
    let (service, _) = service(backend);

    let result = service.open(&actor(1, AccountRole::Admin), role(7)).await;

    assert!(matches!(result, Err(AppError::Fetch(_))));
}

#[tokio::test]
async fn staff_cannot_open_assignment_session() {
    let (service, _) = service(restricted_backend());

    let result = service.open(&actor(1, AccountRole::Staff), role(7)).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn actor_cannot_edit_own_user_grants() {
    let (service, _) = service(restricted_backend());

    let result = service.open(&actor(20, AccountRole::SuperAdmin), user(20)).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn confirmed_save_writes_one_record_per_permission() {
    let (service, backend) = service(restricted_backend());
    let admin = actor(1, AccountRole::Admin);
    let Ok(mut session) = service.open(&admin, role(7)).await else {
        panic!("session should open");
    };

    for (sub_module_name, verb) in [
        (GENERAL_SUB_MODULE, CapabilityVerb::View),
        (GENERAL_SUB_MODULE, CapabilityVerb::Create),
        (SESSIONS, CapabilityVerb::View),
        (SESSIONS, CapabilityVerb::Create),
    ] {
        assert!(session.toggle_cell(MODULE, sub_module_name, verb, true).is_ok());
    }
    assert!(session.is_dirty());

    let Ok(report) = service.save(&admin, &mut session).await else {
        panic!("save should succeed");
    };

    assert!(!report.verified_by_refetch);
    assert_eq!(report.record_count, 8);
    assert!(!session.is_dirty());

    let saves = backend.saves.lock().await;
    let Some((principal, records)) = saves.first() else {
        panic!("save request should be recorded");
    };
    assert_eq!(*principal, role(7));
    // Every Sessions permission carries the whole row: View and Create.
    let sessions_bits = CapabilityFlags::new(true, true, false, false);
    for record in records.iter().filter(|record| record.permission_id.as_i64() > 4) {
        assert_eq!(record.flags, sessions_bits);
        assert!(record.is_assigned);
        assert_eq!(record.sub_module_name.as_deref(), Some(SESSIONS));
    }
}

#[tokio::test]
async fn failed_save_keeps_edits_for_retry() {
    let mut backend = restricted_backend();
    backend.save_behaviour = SaveBehaviour::Fail;
    let (service, _) = service(backend);
    let admin = actor(1, AccountRole::Admin);
    let Ok(mut session) = service.open(&admin, role(7)).await else {
        panic!("session should open");
    };
    assert!(session.toggle_module(MODULE, true).is_ok());
    let edited = session.matrix().clone();

    let result = service.save(&admin, &mut session).await;

    assert!(matches!(result, Err(AppError::Save(_))));
    assert!(session.is_dirty());
    assert_eq!(session.matrix(), &edited);
}

#[tokio::test]
async fn unconfirmed_save_is_accepted_when_refetch_matches() {
    let mut backend = restricted_backend();
    backend.save_behaviour = SaveBehaviour::PersistWithoutConfirmation;
    let (service, _) = service(backend);
    let admin = actor(1, AccountRole::Admin);
    let Ok(mut session) = service.open(&admin, user(20)).await else {
        panic!("session should open");
    };
    assert!(session.toggle_module(MODULE, true).is_ok());

    let Ok(report) = service.save(&admin, &mut session).await else {
        panic!("persisted save should be accepted");
    };

    assert!(report.verified_by_refetch);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn unconfirmed_save_fails_when_refetch_disagrees() {
    let mut backend = restricted_backend();
    backend.save_behaviour = SaveBehaviour::DropWithoutConfirmation;
    let (service, _) = service(backend);
    let admin = actor(1, AccountRole::Admin);
    let Ok(mut session) = service.open(&admin, user(20)).await else {
        panic!("session should open");
    };
    assert!(session.toggle_module(MODULE, true).is_ok());

    let result = service.save(&admin, &mut session).await;

    assert!(matches!(result, Err(AppError::Save(_))));
    assert!(session.is_dirty());
}

#[tokio::test]
async fn discard_changes_restores_loaded_state() {
    let (service, _) = service(restricted_backend());
    let Ok(mut session) = service.open(&actor(1, AccountRole::Admin), role(7)).await else {
        panic!("session should open");
    };

    assert!(session.toggle_module(MODULE, true).is_ok());
    session.discard_changes();

    assert!(!session.is_dirty());
    assert!(!session.matrix().is_module_fully_enabled(MODULE));
}

#[test]
fn records_without_grants_match_only_when_empty() {
    let matrix = CapabilityMatrix::build(
        AssignerScope::Unrestricted,
        &holding(&academic_catalog(), CapabilityFlags::all_granted()),
        &[],
    );
    let records = flatten_matrix(&matrix, role(3));

    assert!(records_match_grants(&records, &[]));
    assert!(!records_match_grants(
        &[crate::AssignmentRecord {
            flags: CapabilityFlags::new(true, false, false, false),
            ..records[0].clone()
        }],
        &[],
    ));
}

#[test]
fn record_round_trips_into_effective_permission() {
    let matrix = CapabilityMatrix::build(
        AssignerScope::Unrestricted,
        &holding(&academic_catalog(), CapabilityFlags::all_granted()),
        &[grant(6, CapabilityFlags::new(false, true, false, false))],
    );
    let records = flatten_matrix(&matrix, role(3));
    let Some(record) = records.iter().find(|record| record.permission_id.as_i64() == 6) else {
        panic!("record for permission 6 should exist");
    };

    let Ok(effective) = record.effective_permission() else {
        panic!("record should convert");
    };

    assert_eq!(effective.permission.module_name(), MODULE);
    assert_eq!(effective.permission.sub_module_name(), SESSIONS);
    assert_eq!(effective.permission.verb(), Some(CapabilityVerb::Create));
    assert_eq!(effective.flags, record.flags);
}

#[derive(Debug, Clone)]
enum Toggle {
    Cell(bool, usize, bool),
    SubModule(bool, bool),
    Module(bool),
}

fn toggle_strategy() -> impl Strategy<Value = Toggle> {
    prop_oneof![
        (any::<bool>(), 0usize..4, any::<bool>())
            .prop_map(|(general, verb, value)| Toggle::Cell(general, verb, value)),
        (any::<bool>(), any::<bool>())
            .prop_map(|(general, value)| Toggle::SubModule(general, value)),
        any::<bool>().prop_map(Toggle::Module),
    ]
}

fn row(general: bool) -> &'static str {
    if general { GENERAL_SUB_MODULE } else { SESSIONS }
}

fn ceiling_strategy() -> impl Strategy<Value = [CapabilityFlags; 2]> {
    let flags = any::<[bool; 4]>()
        .prop_map(|[view, create, edit, delete]| CapabilityFlags::new(view, create, edit, delete));
    (flags.clone(), flags).prop_map(|(general, sessions)| [general, sessions])
}

proptest! {
    #[test]
    fn flattened_records_rebuild_same_matrix(
        [general_ceiling, sessions_ceiling] in ceiling_strategy(),
        toggles in proptest::collection::vec(toggle_strategy(), 0..24),
    ) {
        let catalog = academic_catalog();
        let (general, sessions) = catalog.split_at(4);
        let mut ceiling = holding(general, general_ceiling);
        ceiling.extend(holding(sessions, sessions_ceiling));

        let mut matrix = CapabilityMatrix::build(AssignerScope::Restricted, &ceiling, &[]);
        for toggle in toggles {
            // Rejected toggles leave the matrix unchanged.
            let _ = match toggle {
                Toggle::Cell(general, verb, value) => {
                    matrix.toggle_cell(MODULE, row(general), CapabilityVerb::all()[verb], value)
                }
                Toggle::SubModule(general, value) => {
                    matrix.toggle_sub_module(MODULE, row(general), value).map(|_| ())
                }
                Toggle::Module(value) => matrix.toggle_module(MODULE, value),
            };
        }

        let records = flatten_matrix(&matrix, role(9));
        let record_ceiling: Vec<EffectivePermission> = records
            .iter()
            .filter_map(|record| record.effective_permission().ok())
            .collect();
        prop_assert_eq!(record_ceiling.len(), records.len());
        let grants: Vec<PermissionGrant> =
            records.iter().map(crate::AssignmentRecord::grant).collect();
        let rebuilt = CapabilityMatrix::build(AssignerScope::Restricted, &record_ceiling, &grants);

        prop_assert_eq!(rebuilt.user_can_surface(), matrix.user_can_surface());
        prop_assert!(records_match_grants(&records, &grants));
    }
}
