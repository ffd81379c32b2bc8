//! Subscription descriptors and the catalog parser.
//!
//! A descriptor lists the search cores reachable under one subscription. It is
//! parsed once from the cached connector payload and then shared read-only.

use crate::errors::MalformedSubscriptionError;
use serde::Serialize;
use serde_json::{Map, Value};
use solr_multisub_shared::SecretString;
use std::collections::BTreeSet;

/// Marker that identifies a failover core inside its id.
pub const FAILOVER_MARKER: &str = ".failover";

const FIELD_IDENTIFIER: &str = "identifier";
const FIELD_KEY: &str = "key";
const FIELD_SALT: &str = "derived_key_salt";
const FIELD_HEARTBEAT: &str = "heartbeat_data";
const FIELD_CORES: &str = "heartbeat_data.search_cores";
const FIELD_CORE_ID: &str = "core_id";
const FIELD_BALANCER: &str = "balancer";

/// Returns the region token of a balancer label.
///
/// The token is everything before the first `-`; the whole label when there
/// is none, and empty for an empty label.
///
/// ```
/// use solr_multisub_domain::region_prefix;
///
/// assert_eq!(region_prefix("use1-prod"), "use1");
/// assert_eq!(region_prefix("noseparator"), "noseparator");
/// assert_eq!(region_prefix(""), "");
/// ```
#[must_use]
pub fn region_prefix(balancer_label: &str) -> &str {
    balancer_label
        .split_once('-')
        .map_or(balancer_label, |(region, _)| region)
}

/// One search core advertised by a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreInfo {
    core_id: Box<str>,
    balancer_label: Box<str>,
    is_failover: bool,
}

impl CoreInfo {
    /// Build a core entry; the failover flag is computed from the id.
    pub fn new(core_id: impl Into<Box<str>>, balancer_label: impl Into<Box<str>>) -> Self {
        let core_id = core_id.into();
        let is_failover = core_id.contains(FAILOVER_MARKER);
        Self {
            core_id,
            balancer_label: balancer_label.into(),
            is_failover,
        }
    }

    /// Core identifier.
    #[must_use]
    pub fn core_id(&self) -> &str {
        &self.core_id
    }

    /// Balancer hostname or label; may be empty.
    #[must_use]
    pub fn balancer_label(&self) -> &str {
        &self.balancer_label
    }

    /// True when the core id carries the failover marker.
    #[must_use]
    pub const fn is_failover(&self) -> bool {
        self.is_failover
    }

    /// Region token of the balancer label.
    #[must_use]
    pub fn region(&self) -> &str {
        region_prefix(&self.balancer_label)
    }
}

/// Immutable snapshot of one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDescriptor {
    identifier: Box<str>,
    key: SecretString,
    derived_key_salt: SecretString,
    cores: Vec<CoreInfo>,
}

impl SubscriptionDescriptor {
    /// Assemble a descriptor from parts, rejecting duplicate core ids.
    pub fn new(
        identifier: impl Into<Box<str>>,
        key: SecretString,
        derived_key_salt: SecretString,
        cores: Vec<CoreInfo>,
    ) -> Result<Self, MalformedSubscriptionError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(MalformedSubscriptionError::EmptyField {
                field: FIELD_IDENTIFIER,
            });
        }
        ensure_unique_core_ids(&cores)?;
        Ok(Self {
            identifier,
            key,
            derived_key_salt,
            cores,
        })
    }

    /// Subscription identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Subscription key used to sign derived keys.
    #[must_use]
    pub const fn key(&self) -> &SecretString {
        &self.key
    }

    /// Salt mixed into every derived key.
    #[must_use]
    pub const fn derived_key_salt(&self) -> &SecretString {
        &self.derived_key_salt
    }

    /// Cores in descriptor order.
    #[must_use]
    pub fn cores(&self) -> &[CoreInfo] {
        &self.cores
    }

    /// Look up a core by id.
    #[must_use]
    pub fn find_core(&self, core_id: &str) -> Option<&CoreInfo> {
        self.cores.iter().find(|core| core.core_id() == core_id)
    }

    /// Core used when nothing is overridden: the first core, or the
    /// subscription identifier when the list is empty.
    #[must_use]
    pub fn primary_core_id(&self) -> &str {
        self.cores
            .first()
            .map_or(&*self.identifier, CoreInfo::core_id)
    }

    /// Fail unless this descriptor belongs to `expected`.
    ///
    /// Snapshots are looked up by file or cache key, so a descriptor stored
    /// under the wrong name would otherwise sign with another subscription's
    /// key and salt.
    pub fn ensure_identifier(&self, expected: &str) -> Result<(), MalformedSubscriptionError> {
        if &*self.identifier == expected.trim() {
            return Ok(());
        }
        Err(MalformedSubscriptionError::IdentifierMismatch {
            expected: expected.trim().to_owned(),
            actual: self.identifier.to_string(),
        })
    }

    /// Descriptor in the same JSON shape `parse_subscription` reads.
    ///
    /// The output carries the key and salt in clear text; it is meant for
    /// snapshot files, never for logs.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let cores = self
            .cores
            .iter()
            .map(|core| {
                serde_json::json!({
                    FIELD_CORE_ID: core.core_id(),
                    FIELD_BALANCER: core.balancer_label(),
                })
            })
            .collect::<Vec<_>>();
        serde_json::json!({
            FIELD_IDENTIFIER: &*self.identifier,
            FIELD_KEY: self.key.expose(),
            FIELD_SALT: self.derived_key_salt.expose(),
            FIELD_HEARTBEAT: { "search_cores": cores },
        })
    }

    /// Region token of the first failover core, if any.
    #[must_use]
    pub fn failover_region(&self) -> Option<&str> {
        self.cores
            .iter()
            .find(|core| core.is_failover())
            .map(CoreInfo::region)
    }
}

fn ensure_unique_core_ids(cores: &[CoreInfo]) -> Result<(), MalformedSubscriptionError> {
    let mut seen = BTreeSet::new();
    for core in cores {
        if !seen.insert(core.core_id()) {
            return Err(MalformedSubscriptionError::DuplicateCoreId {
                core_id: core.core_id().to_owned(),
            });
        }
    }
    Ok(())
}

/// Parse descriptor text as stored in the snapshot cache.
pub fn parse_subscription_json(
    input: &str,
) -> Result<SubscriptionDescriptor, MalformedSubscriptionError> {
    let value: Value =
        serde_json::from_str(input).map_err(|error| MalformedSubscriptionError::InvalidJson {
            message: error.to_string(),
        })?;
    parse_subscription(&value)
}

/// Parse a raw descriptor value into a typed snapshot.
///
/// The input is only borrowed; nothing is written back.
pub fn parse_subscription(raw: &Value) -> Result<SubscriptionDescriptor, MalformedSubscriptionError> {
    let root = raw
        .as_object()
        .ok_or(MalformedSubscriptionError::NotAnObject)?;

    let identifier = required_string(root, FIELD_IDENTIFIER, FIELD_IDENTIFIER)?;
    let key = required_string(root, FIELD_KEY, FIELD_KEY)?;
    let salt = required_string(root, FIELD_SALT, FIELD_SALT)?;

    let heartbeat = match root.get(FIELD_HEARTBEAT) {
        None | Some(Value::Null) => {
            return Err(MalformedSubscriptionError::MissingField {
                field: FIELD_HEARTBEAT,
            });
        },
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(MalformedSubscriptionError::WrongType {
                field: FIELD_HEARTBEAT,
                expected: "an object",
            });
        },
    };

    let entries = match heartbeat.get("search_cores") {
        None | Some(Value::Null) => {
            return Err(MalformedSubscriptionError::MissingField { field: FIELD_CORES });
        },
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(MalformedSubscriptionError::WrongType {
                field: FIELD_CORES,
                expected: "a list",
            });
        },
    };

    let cores = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_core(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    SubscriptionDescriptor::new(identifier, SecretString::from(key), SecretString::from(salt), cores)
}

fn required_string<'a>(
    map: &'a Map<String, Value>,
    name: &str,
    field: &'static str,
) -> Result<&'a str, MalformedSubscriptionError> {
    match map.get(name) {
        None | Some(Value::Null) => Err(MalformedSubscriptionError::MissingField { field }),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(MalformedSubscriptionError::EmptyField { field })
        },
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(MalformedSubscriptionError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn parse_core(index: usize, entry: &Value) -> Result<CoreInfo, MalformedSubscriptionError> {
    let Some(entry) = entry.as_object() else {
        return Err(MalformedSubscriptionError::InvalidCoreEntry {
            index,
            field: "entry",
        });
    };

    let core_id = match entry.get(FIELD_CORE_ID) {
        Some(Value::String(text)) if !text.trim().is_empty() => text.as_str(),
        _ => {
            return Err(MalformedSubscriptionError::InvalidCoreEntry {
                index,
                field: FIELD_CORE_ID,
            });
        },
    };

    let balancer = match entry.get(FIELD_BALANCER) {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(_) => {
            return Err(MalformedSubscriptionError::InvalidCoreEntry {
                index,
                field: FIELD_BALANCER,
            });
        },
    };

    Ok(CoreInfo::new(core_id, balancer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "identifier": "ABCD-12345",
            "key": "subscription-key",
            "derived_key_salt": "salt",
            "heartbeat_data": {
                "search_cores": [
                    { "core_id": "ABCD-12345", "balancer": "useast1-c1.search.example.com" },
                    { "core_id": "ABCD-12345.failover", "balancer": "uswest1-c1.search.example.com" },
                    { "core_id": "ABCD-12345.dev" }
                ]
            }
        })
    }

    #[test]
    fn region_prefix_examples() {
        assert_eq!(region_prefix("use1-prod"), "use1");
        assert_eq!(region_prefix("noseparator"), "noseparator");
        assert_eq!(region_prefix(""), "");
        assert_eq!(region_prefix("-leading"), "");
    }

    #[test]
    fn failover_flag_follows_core_id() {
        assert!(CoreInfo::new("X.failover", "").is_failover());
        assert!(CoreInfo::new("X.failover.dev", "").is_failover());
        assert!(!CoreInfo::new("X.prod", "").is_failover());
    }

    #[test]
    fn parses_cores_in_order() -> Result<(), MalformedSubscriptionError> {
        let descriptor = parse_subscription(&sample())?;
        assert_eq!(descriptor.identifier(), "ABCD-12345");
        assert_eq!(descriptor.key().expose(), "subscription-key");
        assert_eq!(descriptor.derived_key_salt().expose(), "salt");

        let ids: Vec<&str> = descriptor.cores().iter().map(CoreInfo::core_id).collect();
        assert_eq!(ids, ["ABCD-12345", "ABCD-12345.failover", "ABCD-12345.dev"]);
        assert_eq!(descriptor.cores()[0].region(), "useast1");
        assert_eq!(descriptor.cores()[2].balancer_label(), "");
        assert_eq!(descriptor.failover_region(), Some("uswest1"));
        assert_eq!(descriptor.primary_core_id(), "ABCD-12345");
        Ok(())
    }

    #[test]
    fn identifier_check_rejects_foreign_descriptor() -> Result<(), MalformedSubscriptionError> {
        let descriptor = parse_subscription(&sample())?;
        descriptor.ensure_identifier(" ABCD-12345 ")?;
        assert_eq!(
            descriptor.ensure_identifier("WXYZ-1"),
            Err(MalformedSubscriptionError::IdentifierMismatch {
                expected: "WXYZ-1".to_owned(),
                actual: "ABCD-12345".to_owned(),
            })
        );
        Ok(())
    }

    #[test]
    fn json_form_parses_back_to_the_same_snapshot() -> Result<(), MalformedSubscriptionError> {
        let descriptor = parse_subscription(&sample())?;
        let written = descriptor.to_json();
        assert_eq!(written["heartbeat_data"]["search_cores"][2]["balancer"], "");
        assert_eq!(parse_subscription(&written)?, descriptor);
        Ok(())
    }

    #[test]
    fn parse_does_not_touch_input() -> Result<(), MalformedSubscriptionError> {
        let raw = sample();
        let before = raw.clone();
        parse_subscription(&raw)?;
        assert_eq!(raw, before);
        Ok(())
    }

    #[test]
    fn missing_core_list_is_malformed() {
        let mut raw = sample();
        if let Some(heartbeat) = raw["heartbeat_data"].as_object_mut() {
            heartbeat.remove("search_cores");
        }
        assert_eq!(
            parse_subscription(&raw),
            Err(MalformedSubscriptionError::MissingField { field: FIELD_CORES })
        );
    }

    #[test]
    fn core_list_must_be_a_list() {
        let mut raw = sample();
        raw["heartbeat_data"]["search_cores"] = json!({ "core_id": "A" });
        assert_eq!(
            parse_subscription(&raw),
            Err(MalformedSubscriptionError::WrongType {
                field: FIELD_CORES,
                expected: "a list",
            })
        );
    }

    #[test]
    fn missing_credentials_are_malformed() {
        for field in [FIELD_IDENTIFIER, FIELD_KEY, FIELD_SALT] {
            let mut raw = sample();
            if let Some(root) = raw.as_object_mut() {
                root.remove(field);
            }
            assert_eq!(
                parse_subscription(&raw),
                Err(MalformedSubscriptionError::MissingField { field })
            );
        }
    }

    #[test]
    fn duplicate_core_ids_are_rejected() {
        let mut raw = sample();
        raw["heartbeat_data"]["search_cores"] = json!([
            { "core_id": "A", "balancer": "x" },
            { "core_id": "A", "balancer": "y" }
        ]);
        assert_eq!(
            parse_subscription(&raw),
            Err(MalformedSubscriptionError::DuplicateCoreId {
                core_id: "A".to_owned()
            })
        );
    }

    #[test]
    fn core_without_id_names_its_index() {
        let mut raw = sample();
        raw["heartbeat_data"]["search_cores"] = json!([{ "core_id": "A" }, { "balancer": "y" }]);
        assert_eq!(
            parse_subscription(&raw),
            Err(MalformedSubscriptionError::InvalidCoreEntry {
                index: 1,
                field: FIELD_CORE_ID,
            })
        );
    }

    #[test]
    fn empty_core_list_falls_back_to_identifier() -> Result<(), MalformedSubscriptionError> {
        let mut raw = sample();
        raw["heartbeat_data"]["search_cores"] = json!([]);
        let descriptor = parse_subscription(&raw)?;
        assert!(descriptor.cores().is_empty());
        assert_eq!(descriptor.primary_core_id(), "ABCD-12345");
        assert_eq!(descriptor.failover_region(), None);
        Ok(())
    }

    #[test]
    fn invalid_json_text_is_reported() {
        assert!(matches!(
            parse_subscription_json("{not json"),
            Err(MalformedSubscriptionError::InvalidJson { .. })
        ));
        assert_eq!(
            parse_subscription_json("[]"),
            Err(MalformedSubscriptionError::NotAnObject)
        );
    }

    proptest! {
        #[test]
        fn region_token_never_contains_separator(label in "[a-z0-9.-]{0,24}") {
            let region = region_prefix(&label);
            prop_assert!(!region.contains('-'));
            prop_assert!(label.starts_with(region));
        }
    }
}
