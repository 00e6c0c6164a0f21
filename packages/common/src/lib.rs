pub mod config;
#[cfg(feature = "sea-orm")]
pub mod entity;
pub mod enums;
pub mod event;
pub mod package_manifest;
pub mod package_reference;
pub mod storage;
pub mod task;
pub mod validators;
pub mod visibility;

pub use enums::{FormatSpec, ReviewStatus, SubmissionStatus, TeamRole, UserMediaStatus};
pub use package_reference::PackageReference;
pub use visibility::VisibilityFlags;
