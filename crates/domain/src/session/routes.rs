use serde::{Deserialize, Serialize};

/// Binds a console route prefix to the sub-module that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBinding {
    path_prefix: String,
    module_name: String,
    sub_module_name: String,
}

impl RouteBinding {
    /// Creates a route binding.
    #[must_use]
    pub fn new(
        path_prefix: impl Into<String>,
        module_name: impl Into<String>,
        sub_module_name: impl Into<String>,
    ) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            module_name: module_name.into(),
            sub_module_name: sub_module_name.into(),
        }
    }

    /// Returns the bound path prefix.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        self.path_prefix.as_str()
    }

    /// Returns the owning module.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module_name.as_str()
    }

    /// Returns the owning sub-module.
    #[must_use]
    pub fn sub_module_name(&self) -> &str {
        self.sub_module_name.as_str()
    }
}

/// Route table resolving console paths to owning sub-modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRegistry {
    bindings: Vec<RouteBinding>,
}

impl RouteRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding and returns the registry.
    #[must_use]
    pub fn with_binding(
        mut self,
        path_prefix: impl Into<String>,
        module_name: impl Into<String>,
        sub_module_name: impl Into<String>,
    ) -> Self {
        self.bindings
            .push(RouteBinding::new(path_prefix, module_name, sub_module_name));
        self
    }

    /// Routes of the school administration console.
    #[must_use]
    pub fn school_console() -> Self {
        Self::new()
            .with_binding("/users", "User Management", "Users")
            .with_binding("/roles", "User Management", "Roles")
            .with_binding("/permissions", "User Management", "Permissions")
            .with_binding("/classes", "Academic Management", "Classes")
            .with_binding("/sections", "Academic Management", "Sections")
            .with_binding("/subjects", "Academic Management", "Subjects")
            .with_binding("/sessions", "Academic Management", "Sessions")
            .with_binding("/fee-structures", "Finance", "Fee Structures")
            .with_binding("/tenants", "Tenant Management", "Tenants")
            .with_binding("/subscriptions", "Tenant Management", "Subscriptions")
            .with_binding("/modules", "System", "Modules")
            .with_binding("/analytics", "System", "Analytics")
            .with_binding("/system/logs", "System", "Logs")
            .with_binding("/system/config", "System", "Configuration")
    }

    /// Returns the binding with the longest matching segment prefix.
    ///
    /// Query strings and fragments are ignored; `/users` matches `/users/42`
    /// but not `/users-archive`.
    #[must_use]
    pub fn resolve(&self, route_path: &str) -> Option<&RouteBinding> {
        let path = route_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path_segments = segments(path);

        self.bindings
            .iter()
            .filter(|binding| {
                let prefix = segments(binding.path_prefix());
                !prefix.is_empty() && path_segments.starts_with(&prefix)
            })
            .max_by_key(|binding| segments(binding.path_prefix()).len())
    }

    /// Returns all bindings.
    #[must_use]
    pub fn bindings(&self) -> &[RouteBinding] {
        self.bindings.as_slice()
    }
}

/// Navigation menu entry gated by module visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    label: String,
    route: String,
    module_name: String,
}

impl NavigationEntry {
    /// Creates a navigation entry.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        route: impl Into<String>,
        module_name: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            route: route.into(),
            module_name: module_name.into(),
        }
    }

    /// Returns the menu label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the target route.
    #[must_use]
    pub fn route(&self) -> &str {
        self.route.as_str()
    }

    /// Returns the module gating this entry.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module_name.as_str()
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}
