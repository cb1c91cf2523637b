//! helpers for sum types stored as a map of variant name to 0/1-element lists.

use crate::error::ProviderError;
use instana_core::{StateMap, StateMapExt, Value};

/// the single populated variant of `container`, with its fields.
///
/// a variant counts as populated when its list holds at least one element.
/// zero or several populated variants are reported as ambiguous.
pub fn select_variant<'m>(
    container: &'m StateMap,
    field: &str,
    variants: &[&'static str],
) -> Result<(&'static str, &'m StateMap), ProviderError> {
    let populated: Vec<(&'static str, &'m StateMap)> = variants
        .iter()
        .filter_map(|variant| container.block(variant).map(|fields| (*variant, fields)))
        .collect();

    match populated.as_slice() {
        [single] => Ok(*single),
        [] => Err(ProviderError::ambiguous(
            field,
            format!("exactly one of [{}] must be configured", variants.join(", ")),
        )),
        many => Err(ProviderError::ambiguous(
            field,
            format!(
                "only one of [{}] may be configured, found [{}]",
                variants.join(", "),
                many.iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

/// the populated nested block of a single-block field.
pub fn required_block<'m>(
    state: &'m StateMap,
    field: &str,
) -> Result<&'m StateMap, ProviderError> {
    state
        .block(field)
        .ok_or_else(|| ProviderError::invalid(field, "exactly one block must be configured"))
}

/// state fragment selecting `selected` with `fields`; every other variant is emptied.
pub fn variant_state(variants: &[&'static str], selected: &str, fields: StateMap) -> StateMap {
    let mut out = StateMap::new();
    for variant in variants {
        out.insert(variant.to_string(), Value::empty_list());
    }
    out.insert(selected.to_string(), Value::List(vec![Value::Map(fields)]));
    out
}

/// build a state map from static keys.
pub fn state_map<I>(entries: I) -> StateMap
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// alert severity as exposed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub const TERMS: &'static [&'static str] = &["warning", "critical"];

    pub fn term(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn api_code(&self) -> i32 {
        match self {
            Severity::Warning => 5,
            Severity::Critical => 10,
        }
    }

    pub fn from_term(field: &str, term: &str) -> Result<Self, ProviderError> {
        match term {
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(ProviderError::invalid(
                field,
                format!("{other} is not a supported severity, expected warning or critical"),
            )),
        }
    }

    pub fn from_api_code(field: &str, code: i32) -> Result<Self, ProviderError> {
        match code {
            5 => Ok(Severity::Warning),
            10 => Ok(Severity::Critical),
            other => Err(ProviderError::invalid(
                field,
                format!("{other} is not a supported severity code"),
            )),
        }
    }
}
