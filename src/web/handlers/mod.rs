//! API handlers for the cloudrive Web API.

pub mod auth;
pub mod blobs;
pub mod files;
pub mod folders;
pub mod moves;
pub mod permissions;
pub mod public;
pub mod shares;

pub use auth::*;
pub use blobs::*;
pub use files::*;
pub use folders::*;
pub use moves::*;
pub use permissions::*;
pub use public::*;
pub use shares::*;

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::access::{AccessResolver, GrantService};
use crate::config::Config;
use crate::db::{Database, DbPool, SqlStore, User};
use crate::drive::DriveService;
use crate::share::ShareService;
use crate::storage::{LocalObjectStorage, LocatorSigner};
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool (users and direct lookups).
    pub pool: DbPool,
    /// File and folder operations.
    pub drive: DriveService,
    /// Share links.
    pub shares: ShareService,
    /// Role grants.
    pub grants: GrantService,
    /// Blob storage behind signed locators.
    pub blobs: Arc<LocalObjectStorage>,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Base URL for public share links.
    pub public_base_url: String,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Wire the services over a database and the configured blob directory.
    pub fn new(config: &Config, db: &Database) -> crate::Result<Self> {
        let store = Arc::new(SqlStore::new(db.pool().clone()));
        let signer = LocatorSigner::new(config.signing_key())?;
        let blobs = Arc::new(LocalObjectStorage::new(
            &config.storage.path,
            config.server.public_base_url.as_str(),
            signer,
        )?);

        let max_upload_size = config.storage.max_upload_size_mb.saturating_mul(1024 * 1024);
        let locator_ttl = Duration::from_secs(config.storage.locator_ttl_secs);

        let resolver = AccessResolver::new(store.clone(), store.clone());
        let drive = DriveService::new(store.clone(), blobs.clone(), resolver.clone())
            .with_max_file_size(max_upload_size)
            .with_locator_ttl(locator_ttl);
        let shares = ShareService::new(store.clone(), store.clone(), blobs.clone(), resolver.clone())
            .with_locator_ttl(locator_ttl);
        let grants = GrantService::new(store.clone(), resolver).with_principals(store);

        tracing::info!("File storage initialized at: {}", config.storage.path);

        Ok(Self {
            pool: db.pool().clone(),
            drive,
            shares,
            grants,
            blobs,
            encoding_key: EncodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
            access_token_expiry: config.auth.access_token_expiry_secs,
            public_base_url: config
                .server
                .public_base_url
                .trim_end_matches('/')
                .to_string(),
            max_upload_size,
        })
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            email: user.email.clone(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
