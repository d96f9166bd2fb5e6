//! cloudrive - multi-tenant file storage API
//!
//! Files and folders are owned by a principal, shared with other principals through
//! role grants, and shared anonymously through expiring bearer links.

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod logging;
pub mod share;
pub mod storage;
pub mod store;
pub mod web;

pub use access::{Access, AccessResolver, Action, Role};
pub use config::Config;
pub use db::Database;
pub use drive::{DriveService, ObjectRef};
pub use error::{DriveError, Result};
pub use share::{ShareResolution, ShareService};
