//! Per-core derived authentication keys.
//!
//! The key is `HMAC-SHA1(subscription_key, pad80(core_name + "solr" + salt))`
//! rendered as lower-case hex, where `pad80` repeats the derivation string
//! until it is exactly 80 bytes long. Strings already at or past 80 bytes are
//! used unchanged. This matches the keys issued to existing deployments.

use crate::errors::InvalidCredentialError;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use solr_multisub_shared::SecretString;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Length the derivation string is padded to before signing.
pub const DERIVATION_PAD_LEN: usize = 80;

const DERIVATION_INFIX: &str = "solr";

/// Hex-encoded derived key. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DerivedKey(SecretString);

impl DerivedKey {
    /// Borrow the hex string.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose()
    }

    /// Borrow the key as a secret.
    #[must_use]
    pub const fn as_secret(&self) -> &SecretString {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("DerivedKey").field(&self.0).finish()
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

/// Compute the derived key for one core.
pub fn derive_key(
    salt: &SecretString,
    core_name: &str,
    subscription_key: &SecretString,
) -> Result<DerivedKey, InvalidCredentialError> {
    if salt.is_blank() {
        return Err(InvalidCredentialError::EmptySalt);
    }
    if core_name.trim().is_empty() {
        return Err(InvalidCredentialError::EmptyCoreName);
    }
    if subscription_key.is_blank() {
        return Err(InvalidCredentialError::EmptySubscriptionKey);
    }

    let derivation = format!("{core_name}{DERIVATION_INFIX}{}", salt.expose());
    let padded = pad_repeating(derivation.as_bytes(), DERIVATION_PAD_LEN);

    let mut mac = HmacSha1::new_from_slice(subscription_key.expose().as_bytes())
        .map_err(|_| InvalidCredentialError::UnusableSubscriptionKey)?;
    mac.update(&padded);
    let digest = mac.finalize().into_bytes();

    Ok(DerivedKey(SecretString::from(hex::encode(digest))))
}

/// Right-pad `input` with copies of itself up to `target` bytes.
fn pad_repeating(input: &[u8], target: usize) -> Vec<u8> {
    if input.is_empty() || input.len() >= target {
        return input.to_vec();
    }
    input.iter().copied().cycle().take(target).collect()
}
