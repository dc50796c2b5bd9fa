//! Client-side password stretching
//!
//! The auth server never sees the raw password. The client stretches it with
//! PBKDF2 salted by the account email, then derives the values it needs with
//! HKDF. Because the email is part of the salt, accounts whose primary email
//! changed must keep stretching with the original address.

use hkdf::Hkdf;
use hmac::Hmac;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

const NAMESPACE: &str = "identity.mozilla.com/picl/v1/";
const PBKDF2_ROUNDS: u32 = 1000;
const KEY_LENGTH: usize = 32;

#[derive(Debug, Error)]
#[error("password key derivation failed")]
pub struct DerivationError;

/// Values derived from a password and the email it is hashed with
#[derive(Clone, PartialEq, Eq)]
pub struct StretchedCredentials {
    auth_pw: [u8; KEY_LENGTH],
    unwrap_b_key: [u8; KEY_LENGTH],
}

impl fmt::Debug for StretchedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StretchedCredentials([redacted])")
    }
}

impl StretchedCredentials {
    /// Stretch `password` salted with `email`
    ///
    /// # Errors
    ///
    /// Returns an error if PBKDF2 or HKDF rejects the output length.
    pub fn derive(email: &str, password: &str) -> Result<Self, DerivationError> {
        let salt = format!("{NAMESPACE}quickStretch:{email}");
        let mut quick_stretched = [0u8; KEY_LENGTH];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(
            password.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            &mut quick_stretched,
        )
        .map_err(|_| DerivationError)?;

        let hkdf = Hkdf::<Sha256>::new(None, &quick_stretched);
        let mut auth_pw = [0u8; KEY_LENGTH];
        hkdf.expand(format!("{NAMESPACE}authPW").as_bytes(), &mut auth_pw)
            .map_err(|_| DerivationError)?;
        let mut unwrap_b_key = [0u8; KEY_LENGTH];
        hkdf.expand(format!("{NAMESPACE}unwrapBkey").as_bytes(), &mut unwrap_b_key)
            .map_err(|_| DerivationError)?;

        Ok(Self {
            auth_pw,
            unwrap_b_key,
        })
    }

    /// Hex-encoded `authPW` sent to the auth server
    #[must_use]
    pub fn auth_pw_hex(&self) -> String {
        hex::encode(self.auth_pw)
    }

    /// Hex-encoded key used to unwrap the account's sync key
    #[must_use]
    pub fn unwrap_b_key_hex(&self) -> String {
        hex::encode(self.unwrap_b_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let first = StretchedCredentials::derive("user@example.com", "correct horse").unwrap();
        let second = StretchedCredentials::derive("user@example.com", "correct horse").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.auth_pw_hex().len(), 64);
        assert_eq!(first.unwrap_b_key_hex().len(), 64);
    }

    #[test]
    fn test_email_salts_the_derivation() {
        let old = StretchedCredentials::derive("old@example.com", "correct horse").unwrap();
        let new = StretchedCredentials::derive("new@example.com", "correct horse").unwrap();
        assert_ne!(old.auth_pw_hex(), new.auth_pw_hex());
    }

    #[test]
    fn test_auth_pw_and_unwrap_key_differ() {
        let creds = StretchedCredentials::derive("user@example.com", "correct horse").unwrap();
        assert_ne!(creds.auth_pw_hex(), creds.unwrap_b_key_hex());
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let creds = StretchedCredentials::derive("user@example.com", "correct horse").unwrap();
        assert_eq!(format!("{creds:?}"), "StretchedCredentials([redacted])");
    }
}
