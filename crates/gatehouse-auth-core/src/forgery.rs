//! Anti-forgery tokens for the login form
//!
//! A token is a random nonce plus an HMAC over it; verification recomputes
//! the MAC. Stateless on the server side, so no storage is involved.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::{HmacKey, HmacKeyError};

/// Issues and verifies anti-forgery tokens
#[derive(Debug, Clone)]
pub struct AntiForgery {
    key: HmacKey,
}

impl AntiForgery {
    /// Create from a secret of at least 32 bytes
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, HmacKeyError> {
        Ok(Self {
            key: HmacKey::new(secret)?,
        })
    }

    /// Issue a fresh token: `<nonce-hex>.<mac-hex>`
    pub fn issue(&self) -> String {
        let mut nonce = [0u8; 16];
        OsRng.fill_bytes(&mut nonce);
        let nonce_hex = hex::encode(nonce);
        let mac = self.key.sign(nonce_hex.as_bytes());
        format!("{nonce_hex}.{}", hex::encode(mac))
    }

    /// Verify a token previously issued with the same secret
    pub fn verify(&self, token: &str) -> bool {
        let Some((nonce_hex, mac_hex)) = token.split_once('.') else {
            return false;
        };
        let Ok(mac) = hex::decode(mac_hex) else {
            return false;
        };
        self.key.verify(nonce_hex.as_bytes(), &mac)
    }
}
