pub mod blobs;
pub mod caches;
pub mod config;
pub mod context;
pub mod downloads;
pub mod error;
pub mod icon;
pub mod listing;
pub mod runner;
pub mod scheduler;
pub mod submission;
pub mod teams;
pub mod usermedia;
pub mod zipfile;

pub use context::RegistryContext;
pub use error::WorkerError;
