//! Secret detection and redaction utilities.
//!
//! Subscription keys, derived-key salts and derived keys all travel through
//! [`SecretString`], which never prints its contents.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// Uses case-insensitive pattern matching on common naming conventions.
///
/// # Examples
///
/// ```
/// use solr_multisub_shared::is_secret_key;
///
/// assert!(is_secret_key("MULTISUB_SUBSCRIPTION_KEY"));
/// assert!(is_secret_key("derivedKeySalt"));
/// assert!(!is_secret_key("AH_SITE_ENVIRONMENT"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["KEY", "SALT", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL"]
        .iter()
        .any(|pattern| key.contains(pattern))
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use solr_multisub_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("MULTISUB_MANUAL_KEY", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("MULTISUB_SCHEME", "https"), "https");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_credential_names() {
        assert!(is_secret_key("MULTISUB_SUBSCRIPTION_KEY"));
        assert!(is_secret_key("manualKey"));
        assert!(is_secret_key("derived_key_salt"));
        assert!(is_secret_key("DB_PASSWORD"));
        assert!(is_secret_key("ACCESS_TOKEN"));
    }

    #[test]
    fn leaves_routing_names_alone() {
        assert!(!is_secret_key("MULTISUB_SELECTOR"));
        assert!(!is_secret_key("AH_SITE_NAME"));
        assert!(!is_secret_key("balancer"));
        assert!(!is_secret_key("coreId"));
    }

    #[test]
    fn secret_string_never_prints_value() {
        let secret = SecretString::new("shh");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "shh");
    }

    #[test]
    fn blank_detection_trims() {
        assert!(SecretString::from("   ").is_blank());
        assert!(!SecretString::from(" k ").is_blank());
    }
}
