//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_permission_backend;

pub use http_permission_backend::{HttpPermissionBackend, TENANT_HEADER};
