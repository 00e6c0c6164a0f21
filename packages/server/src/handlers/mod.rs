pub mod auth;
pub mod download;
pub mod index;
pub mod package;
pub mod submission;
pub mod usermedia;
