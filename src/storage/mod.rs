//! Blob storage for cloudrive.
//!
//! This module provides:
//! - Local filesystem storage implementing [`crate::store::ObjectStorage`]
//! - HMAC-signed, time-limited locators served by the `/blobs` route

mod local;
mod signer;

pub use local::LocalObjectStorage;
pub use signer::LocatorSigner;
