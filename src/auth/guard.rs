//! Ownership guard shared by every owner-scoped operation.

/// `true` iff the acting identity owns the resource or is a site admin.
pub fn authorize(resource_owner_id: &str, acting_identity_id: &str, is_site_admin: bool) -> bool {
    resource_owner_id == acting_identity_id || is_site_admin
}
