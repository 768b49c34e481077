use crate::{CapabilityFlags, CapabilityVerb};

use super::{
    ModuleCapabilities, NavigationEntry, PermissionCapabilities, RouteRegistry,
    SessionCapabilitySet, SubModuleCapabilities,
};

fn permission(name: &str, flags: CapabilityFlags) -> PermissionCapabilities {
    PermissionCapabilities {
        permission_name: name.to_owned(),
        flags,
    }
}

fn view_only() -> CapabilityFlags {
    CapabilityFlags::new(true, false, false, false)
}

fn session_set() -> SessionCapabilitySet {
    SessionCapabilitySet::new(vec![
        ModuleCapabilities {
            module_name: "Billing".to_owned(),
            sub_modules: vec![SubModuleCapabilities {
                sub_module_name: "General".to_owned(),
                permissions: vec![
                    permission("Billing.Read", view_only()),
                    permission("Billing.Delete", CapabilityFlags::default()),
                ],
            }],
        },
        ModuleCapabilities {
            module_name: "User Management".to_owned(),
            sub_modules: vec![
                SubModuleCapabilities {
                    sub_module_name: "Users".to_owned(),
                    permissions: vec![
                        permission("User Management.Users.View", view_only()),
                        permission(
                            "User Management.Users.Edit",
                            CapabilityFlags::new(false, false, true, false),
                        ),
                    ],
                },
                SubModuleCapabilities {
                    sub_module_name: "Roles".to_owned(),
                    permissions: Vec::new(),
                },
            ],
        },
    ])
}

#[test]
fn check_permission_requires_a_granted_bit() {
    let set = session_set();

    assert!(set.check_permission("Billing.Read"));
    assert!(!set.check_permission("Billing.Delete"));
    assert!(!set.check_permission("billing.read"));
}

#[test]
fn unknown_permission_is_false() {
    let set = session_set();

    assert!(!set.check_permission("Nonexistent.Permission"));
    assert!(!set.check_permission(""));
}

#[test]
fn empty_set_denies_everything() {
    let set = SessionCapabilitySet::default();

    assert!(set.is_empty());
    assert!(!set.check_permission("Billing.Read"));
    assert!(!set.has_any_permission(&["Billing.Read"]));
    assert!(!set.can_view_module("Billing"));
    assert!(!set.has_module_access("Billing"));
    assert!(!set.can_perform_action(
        &RouteRegistry::school_console(),
        "/users",
        CapabilityVerb::View
    ));
}

#[test]
fn malformed_hierarchy_answers_false() {
    let set = SessionCapabilitySet::new(vec![ModuleCapabilities {
        module_name: String::new(),
        sub_modules: vec![SubModuleCapabilities {
            sub_module_name: String::new(),
            permissions: vec![permission("", CapabilityFlags::default())],
        }],
    }]);

    assert!(!set.check_permission(""));
    assert!(!set.can_read(""));
    assert!(!set.has_sub_module_access("Billing", ""));
}

#[test]
fn any_and_all_combinators() {
    let set = session_set();

    assert!(set.has_any_permission(&["Billing.Delete", "Billing.Read"]));
    assert!(!set.has_any_permission::<&str>(&[]));
    assert!(set.has_all_permissions(&["Billing.Read", "User Management.Users.View"]));
    assert!(!set.has_all_permissions(&["Billing.Read", "Billing.Delete"]));
    assert!(set.has_all_permissions::<String>(&[]));
}

#[test]
fn module_shorthands_map_to_crud_names() {
    let set = session_set();

    assert!(set.can_read("Billing"));
    assert!(!set.can_create("Billing"));
    assert!(!set.can_update("Billing"));
    assert!(!set.can_delete("Billing"));
    assert!(!set.can_manage("Billing"));
}

#[test]
fn can_view_module_needs_one_module_action() {
    let set = session_set();

    assert!(set.can_view_module("Billing"));
    assert!(!set.can_view_module("User Management"));
    assert!(!set.can_view_module("Finance"));
}

#[test]
fn access_checks_ignore_capability_bits() {
    let set = session_set();

    assert!(set.has_module_access("User Management"));
    assert!(set.has_sub_module_access("User Management", "Roles"));
    assert!(!set.has_sub_module_access("User Management", "Tenants"));
    assert!(!set.has_sub_module_access("Finance", "Roles"));
}

#[test]
fn route_actions_resolve_to_owning_sub_module() {
    let set = session_set();
    let routes = RouteRegistry::school_console();

    assert!(set.can_perform_action(&routes, "/users", CapabilityVerb::View));
    assert!(set.can_perform_action(&routes, "/users/42/edit?tab=profile", CapabilityVerb::Edit));
    assert!(!set.can_perform_action(&routes, "/users", CapabilityVerb::Delete));
    assert!(!set.can_perform_action(&routes, "/roles", CapabilityVerb::View));
    assert!(!set.can_perform_action(&routes, "/unknown", CapabilityVerb::View));
}

#[test]
fn route_resolution_prefers_longest_segment_prefix() {
    let routes = RouteRegistry::new()
        .with_binding("/system", "System", "General")
        .with_binding("/system/logs", "System", "Logs");

    assert_eq!(
        routes.resolve("/system/logs/today").map(|binding| binding.sub_module_name()),
        Some("Logs")
    );
    assert_eq!(
        routes.resolve("/system/config").map(|binding| binding.sub_module_name()),
        Some("General")
    );
    assert!(routes.resolve("/systems").is_none());
}

#[test]
fn navigation_hides_modules_without_access() {
    let set = session_set();
    let entries = vec![
        NavigationEntry::new("Invoices", "/fee-structures", "Billing"),
        NavigationEntry::new("Users", "/users", "User Management"),
    ];

    let visible = set.visible_navigation(&entries);

    assert_eq!(visible.len(), 1);
    assert_eq!(visible.first().map(|entry| entry.label()), Some("Invoices"));
}
