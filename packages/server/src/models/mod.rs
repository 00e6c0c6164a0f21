pub mod auth;
pub mod package;
pub mod submission;
pub mod usermedia;
