//! HMAC-signed, time-limited blob locators.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{DriveError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies `(path, expires)` pairs.
#[derive(Clone)]
pub struct LocatorSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for LocatorSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorSigner").finish_non_exhaustive()
    }
}

impl LocatorSigner {
    /// Create a signer from a secret key.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(DriveError::Config("signing key must not be empty".to_string()));
        }
        Ok(Self { key: key.to_vec() })
    }

    fn mac(&self, path: &str, expires: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| DriveError::Config(format!("invalid signing key: {e}")))?;
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Hex signature for `path` valid until the unix timestamp `expires`.
    pub fn sign(&self, path: &str, expires: i64) -> Result<String> {
        Ok(hex::encode(self.mac(path, expires)?.finalize().into_bytes()))
    }

    /// Check a presented signature.
    ///
    /// Returns [`DriveError::Expired`] once `now` reaches `expires`, and
    /// [`DriveError::Denied`] for a signature that does not match.
    pub fn verify(&self, path: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> Result<()> {
        let signature = hex::decode(signature)
            .map_err(|_| DriveError::Denied("invalid locator signature".to_string()))?;
        self.mac(path, expires)?
            .verify_slice(&signature)
            .map_err(|_| DriveError::Denied("invalid locator signature".to_string()))?;

        if expires <= now.timestamp() {
            return Err(DriveError::Expired);
        }
        Ok(())
    }
}
