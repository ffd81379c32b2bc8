//! Override precedence.
//!
//! Rules are checked in a fixed order and the first match wins:
//! explicit selector, auto-switch, complete manual triple, default.

use solr_multisub_domain::{
    InvalidCredentialError, ManualField, OverrideConfig, SELECTOR_OTHER,
};
use solr_multisub_shared::SecretString;

/// Result of applying override precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A concrete core id was selected.
    Selected(Box<str>),
    /// The site environment decides; see the detector.
    NeedsAutoDetect,
    /// Connect with a manual identifier/key/core triple.
    ManualOverride {
        /// Subscription identifier.
        identifier: Box<str>,
        /// Subscription key.
        key: SecretString,
        /// Core name.
        core_name: Box<str>,
    },
    /// Nothing overridden.
    UseDefault,
}

impl ResolutionOutcome {
    /// Stable label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Selected(_) => "selected",
            Self::NeedsAutoDetect => "needs_auto_detect",
            Self::ManualOverride { .. } => "manual_override",
            Self::UseDefault => "use_default",
        }
    }
}

/// Apply override precedence.
///
/// A partially filled manual triple, or the `"other"` selector without a
/// complete triple, is rejected instead of silently using the default core.
pub fn resolve_outcome(
    overrides: &OverrideConfig,
) -> Result<ResolutionOutcome, InvalidCredentialError> {
    if let Some(selector) = overrides.selector().filter(|value| *value != SELECTOR_OTHER) {
        return Ok(ResolutionOutcome::Selected(selector.into()));
    }

    if overrides.auto_switch_enabled {
        return Ok(ResolutionOutcome::NeedsAutoDetect);
    }

    if let Some((identifier, key, core_name)) = overrides.manual.complete() {
        return Ok(ResolutionOutcome::ManualOverride {
            identifier: identifier.into(),
            key: key.clone(),
            core_name: core_name.into(),
        });
    }

    if overrides.selects_other() || !overrides.manual.is_empty() {
        return Err(InvalidCredentialError::IncompleteManualOverride {
            missing: overrides
                .manual
                .missing_fields()
                .into_iter()
                .map(ManualField::as_str)
                .collect(),
        });
    }

    Ok(ResolutionOutcome::UseDefault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use solr_multisub_domain::ManualCredentials;

    fn overrides(
        selector: Option<&str>,
        auto: bool,
        manual: ManualCredentials,
    ) -> OverrideConfig {
        OverrideConfig {
            selector: selector.map(Into::into),
            auto_switch_enabled: auto,
            manual,
        }
    }

    #[test]
    fn selector_wins_over_everything() -> Result<(), InvalidCredentialError> {
        let config = overrides(
            Some("X.prod"),
            true,
            ManualCredentials::new("A", "k", "A.dev"),
        );
        assert_eq!(
            resolve_outcome(&config)?,
            ResolutionOutcome::Selected("X.prod".into())
        );
        Ok(())
    }

    #[test]
    fn auto_switch_beats_manual() -> Result<(), InvalidCredentialError> {
        let config = overrides(None, true, ManualCredentials::new("A", "k", "A.dev"));
        assert_eq!(resolve_outcome(&config)?, ResolutionOutcome::NeedsAutoDetect);
        Ok(())
    }

    #[test]
    fn other_with_full_triple_is_manual() -> Result<(), InvalidCredentialError> {
        let config = overrides(
            Some(SELECTOR_OTHER),
            false,
            ManualCredentials::new("A", "k", "A.dev"),
        );
        let outcome = resolve_outcome(&config)?;
        assert!(matches!(
            outcome,
            ResolutionOutcome::ManualOverride { ref core_name, .. } if &**core_name == "A.dev"
        ));
        Ok(())
    }

    #[test]
    fn nothing_set_uses_default() -> Result<(), InvalidCredentialError> {
        assert_eq!(
            resolve_outcome(&OverrideConfig::default())?,
            ResolutionOutcome::UseDefault
        );
        Ok(())
    }

    #[test]
    fn partial_triple_names_missing_fields() {
        let config = overrides(
            None,
            false,
            ManualCredentials {
                identifier: Some("A".into()),
                key: None,
                core_name: None,
            },
        );
        assert_eq!(
            resolve_outcome(&config),
            Err(InvalidCredentialError::IncompleteManualOverride {
                missing: vec!["manual_key", "manual_core_name"],
            })
        );
    }

    #[test]
    fn other_without_triple_is_rejected() {
        let config = overrides(Some(SELECTOR_OTHER), false, ManualCredentials::default());
        assert!(matches!(
            resolve_outcome(&config),
            Err(InvalidCredentialError::IncompleteManualOverride { ref missing }) if missing.len() == 3
        ));
    }

    fn arb_manual() -> impl Strategy<Value = ManualCredentials> {
        (
            proptest::option::of("[A-Z]{0,4}"),
            proptest::option::of("[a-z]{0,4}"),
            proptest::option::of("[A-Z.]{0,6}"),
        )
            .prop_map(|(identifier, key, core_name)| ManualCredentials {
                identifier: identifier.map(Into::into),
                key: key.map(SecretString::from),
                core_name: core_name.map(Into::into),
            })
    }

    proptest! {
        #[test]
        fn concrete_selector_always_selected(
            selector in "[A-Z][A-Z0-9.-]{0,12}",
            auto in any::<bool>(),
            manual in arb_manual(),
        ) {
            let config = overrides(Some(selector.as_str()), auto, manual);
            prop_assert_eq!(
                resolve_outcome(&config),
                Ok(ResolutionOutcome::Selected(selector.as_str().into()))
            );
        }

        #[test]
        fn auto_switch_wins_without_selector(manual in arb_manual()) {
            let config = overrides(None, true, manual);
            prop_assert_eq!(resolve_outcome(&config), Ok(ResolutionOutcome::NeedsAutoDetect));
        }

        #[test]
        fn manual_requires_every_field(manual in arb_manual()) {
            let complete = manual.complete().is_some();
            let empty = manual.is_empty();
            let config = overrides(None, false, manual);
            let outcome = resolve_outcome(&config);
            if complete {
                let is_manual = matches!(outcome, Ok(ResolutionOutcome::ManualOverride { .. }));
                prop_assert!(is_manual);
            } else if empty {
                prop_assert_eq!(outcome, Ok(ResolutionOutcome::UseDefault));
            } else {
                let is_incomplete = matches!(
                    outcome,
                    Err(InvalidCredentialError::IncompleteManualOverride { .. })
                );
                prop_assert!(is_incomplete);
            }
        }
    }
}
