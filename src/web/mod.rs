//! Web API module for cloudrive.
//!
//! This module provides the JSON REST API over the drive, grant and share services,
//! plus the unauthenticated share-link and signed-blob routes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
