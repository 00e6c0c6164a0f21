use serde::{Deserialize, Serialize};

use crate::enums::ReviewStatus;

/// The eight audience/view booleans attached to packages, versions and
/// listings. Always recomputed, never edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VisibilityFlags {
    pub public_list: bool,
    pub public_detail: bool,
    pub owner_list: bool,
    pub owner_detail: bool,
    pub moderator_list: bool,
    pub moderator_detail: bool,
    pub admin_list: bool,
    pub admin_detail: bool,
}

impl VisibilityFlags {
    /// Visible to every audience.
    pub fn visible() -> Self {
        Self {
            public_list: true,
            public_detail: true,
            owner_list: true,
            owner_detail: true,
            moderator_list: true,
            moderator_detail: true,
            admin_list: true,
            admin_detail: true,
        }
    }

    /// Hidden from the public; owner, moderator and admin audiences keep
    /// access so a submitter can still inspect a rejected package.
    pub fn hidden_from_public() -> Self {
        Self {
            public_list: false,
            public_detail: false,
            ..Self::visible()
        }
    }
}

/// Compute a version's flags from its own state, its package's state and
/// the strictest community policy it is listed under.
///
/// `requires_approval` reflects whether any listing community requires
/// package listing approval; when none does, `unreviewed` is treated as
/// public.
pub fn version_visibility(
    version_is_active: bool,
    package_is_active: bool,
    review_status: ReviewStatus,
    requires_approval: bool,
) -> VisibilityFlags {
    if !version_is_active || !package_is_active {
        return VisibilityFlags::hidden_from_public();
    }
    match review_status {
        ReviewStatus::Rejected => VisibilityFlags::hidden_from_public(),
        ReviewStatus::Unreviewed if requires_approval => VisibilityFlags::hidden_from_public(),
        _ => VisibilityFlags::visible(),
    }
}

/// Compute a package's flags. A package with no active versions has no
/// `latest` and never appears on the public list.
pub fn package_visibility(package_is_active: bool, has_active_version: bool) -> VisibilityFlags {
    if !package_is_active {
        return VisibilityFlags::hidden_from_public();
    }
    if !has_active_version {
        let mut flags = VisibilityFlags::visible();
        flags.public_list = false;
        return flags;
    }
    VisibilityFlags::visible()
}

/// Compute a listing's flags from the package's flags and the listing's own
/// review state under its community's policy.
pub fn listing_visibility(
    package_flags: VisibilityFlags,
    listing_review_status: ReviewStatus,
    community_requires_approval: bool,
) -> VisibilityFlags {
    let mut flags = package_flags;
    let force_hidden = match listing_review_status {
        ReviewStatus::Rejected => true,
        ReviewStatus::Unreviewed => community_requires_approval,
        ReviewStatus::Approved => false,
    };
    if force_hidden {
        flags.public_list = false;
        flags.public_detail = false;
    }
    // Non-public audiences always see list and detail.
    flags.owner_list = true;
    flags.owner_detail = true;
    flags.moderator_list = true;
    flags.moderator_detail = true;
    flags.admin_list = true;
    flags.admin_detail = true;
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_approved_version_is_public() {
        let flags = version_visibility(true, true, ReviewStatus::Approved, true);
        assert!(flags.public_list && flags.public_detail);
    }

    #[test]
    fn unreviewed_is_public_without_approval_requirement() {
        let flags = version_visibility(true, true, ReviewStatus::Unreviewed, false);
        assert!(flags.public_list);
    }

    #[test]
    fn unreviewed_is_hidden_when_approval_required() {
        let flags = version_visibility(true, true, ReviewStatus::Unreviewed, true);
        assert!(!flags.public_list);
        assert!(flags.owner_detail);
    }

    #[test]
    fn rejected_is_hidden_but_owner_visible() {
        let flags = version_visibility(true, true, ReviewStatus::Rejected, false);
        assert!(!flags.public_list && !flags.public_detail);
        assert!(flags.owner_list && flags.moderator_detail && flags.admin_list);
    }

    #[test]
    fn inactive_version_is_hidden() {
        let flags = version_visibility(false, true, ReviewStatus::Approved, false);
        assert!(!flags.public_detail);
    }

    #[test]
    fn package_without_active_versions_is_off_the_list() {
        let flags = package_visibility(true, false);
        assert!(!flags.public_list);
        assert!(flags.public_detail);
    }

    #[test]
    fn rejected_listing_forces_public_hidden() {
        let flags = listing_visibility(VisibilityFlags::visible(), ReviewStatus::Rejected, false);
        assert!(!flags.public_list && !flags.public_detail);
        assert!(flags.owner_list);
    }

    #[test]
    fn approved_listing_inherits_package_flags() {
        let flags = listing_visibility(
            VisibilityFlags::hidden_from_public(),
            ReviewStatus::Approved,
            true,
        );
        assert!(!flags.public_list);
        assert!(flags.moderator_list);
    }
}
