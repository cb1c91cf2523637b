//! migration of persisted state across schema versions.

use crate::error::ProviderError;
use instana_core::StateMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type UpgradeFn = fn(StateMap) -> Result<StateMap, String>;

/// upgrades state written by schema `version` to `version + 1`.
#[derive(Debug, Clone, Copy)]
pub struct StateUpgrader {
    pub version: u32,
    pub upgrade: UpgradeFn,
}

impl StateUpgrader {
    pub const fn new(version: u32, upgrade: UpgradeFn) -> Self {
        Self { version, upgrade }
    }
}

/// state tree persisted together with the schema version that wrote it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionedState {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub state: StateMap,
}

/// run every upgrader at or above `from_version`, in version order.
pub fn upgrade_state(
    upgraders: &[StateUpgrader],
    from_version: u32,
    state: StateMap,
) -> Result<StateMap, ProviderError> {
    let mut ordered: Vec<&StateUpgrader> = upgraders
        .iter()
        .filter(|upgrader| upgrader.version >= from_version)
        .collect();
    ordered.sort_by_key(|upgrader| upgrader.version);

    let mut state = state;
    for upgrader in ordered {
        debug!(version = upgrader.version, "upgrading state");
        state = (upgrader.upgrade)(state).map_err(|message| ProviderError::StateMigration {
            version: upgrader.version,
            message,
        })?;
    }
    Ok(state)
}

/// move `legacy` to `current` when present; otherwise leave the state untouched.
pub fn rename_legacy_field(mut state: StateMap, legacy: &str, current: &str) -> StateMap {
    if let Some(value) = state.remove(legacy) {
        state.insert(current.to_string(), value);
    }
    state
}

pub fn full_name_to_name(state: StateMap) -> Result<StateMap, String> {
    Ok(rename_legacy_field(state, "full_name", "name"))
}

pub fn full_label_to_label(state: StateMap) -> Result<StateMap, String> {
    Ok(rename_legacy_field(state, "full_label", "label"))
}

pub fn full_title_to_title(state: StateMap) -> Result<StateMap, String> {
    Ok(rename_legacy_field(state, "full_title", "title"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use instana_core::Value;

    fn state(entries: &[(&str, &str)]) -> StateMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    fn fail(_: StateMap) -> Result<StateMap, String> {
        Err("broken".to_string())
    }

    fn mark(mut state: StateMap) -> Result<StateMap, String> {
        state.insert("marked".to_string(), Value::Bool(true));
        Ok(state)
    }

    #[test]
    fn legacy_full_name_becomes_name() {
        let upgraded = full_name_to_name(state(&[("full_name", "test")])).unwrap();
        assert_eq!(upgraded, state(&[("name", "test")]));
    }

    #[test]
    fn current_state_is_unchanged() {
        let upgraded = full_name_to_name(state(&[("name", "test")])).unwrap();
        assert_eq!(upgraded, state(&[("name", "test")]));
    }

    #[test]
    fn chain_skips_older_versions_and_runs_in_order() {
        let upgraders = [
            StateUpgrader::new(1, mark),
            StateUpgrader::new(0, full_label_to_label),
        ];
        let upgraded = upgrade_state(&upgraders, 0, state(&[("full_label", "x")])).unwrap();
        assert_eq!(upgraded.get("label"), Some(&Value::from("x")));
        assert_eq!(upgraded.get("marked"), Some(&Value::Bool(true)));

        let upgraded = upgrade_state(&upgraders, 1, state(&[("full_label", "x")])).unwrap();
        assert!(upgraded.contains_key("full_label"));
    }

    #[test]
    fn failing_upgrader_reports_version() {
        let err = upgrade_state(&[StateUpgrader::new(3, fail)], 0, StateMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::StateMigration { version: 3, .. }
        ));
    }
}
