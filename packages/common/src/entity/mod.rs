pub mod async_submission;
pub mod chunked_cache;
pub mod community;
pub mod community_membership;
pub mod data_blob;
pub mod data_blob_ref;
pub mod download_event;
pub mod download_tracker;
pub mod namespace;
pub mod package;
pub mod package_category;
pub mod package_list_cache;
pub mod package_listing;
pub mod package_listing_category;
pub mod package_listing_section;
pub mod package_rating;
pub mod package_version;
pub mod package_version_dependency;
pub mod team;
pub mod team_member;
pub mod user;
pub mod user_media;
