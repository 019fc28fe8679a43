//! Role-based access policy

use crate::models::Role;

/// Whether `role` is one of the roles permitted for a resource
///
/// There is no implicit superuser: an admin is only let through when
/// `Role::Admin` is part of `required`.
pub fn allowed(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}
