//! field schemas constraining the shape of a state tree.

use crate::value::{StateMap, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// returns true when `old` and `new` should be treated as equal for `key`.
pub type DiffSuppressFn = fn(key: &str, old: &str, new: &str) -> bool;
/// normalizes a string before it is stored in state.
pub type StateFn = fn(&str) -> String;
/// custom validation callback receiving the value and the field key.
pub type CustomValidateFn = fn(&Value, &str) -> Result<(), String>;

/// error raised when a value written to state does not fit its field kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("{path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("unknown field {0}")]
    UnknownField(String),
}

/// schema validation failure for a single field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// value validators attached to a field.
#[derive(Debug, Clone)]
pub enum Validator {
    OneOf(&'static [&'static str]),
    IntOneOf(&'static [i64]),
    IntBetween(i64, i64),
    FloatBetween(f64, f64),
    FloatAtLeast(f64),
    NonEmpty,
    Custom(CustomValidateFn),
}

impl Validator {
    /// check a scalar value, returning a message naming the field key on failure.
    pub fn check(&self, value: &Value, key: &str) -> Result<(), String> {
        match self {
            Validator::OneOf(allowed) => {
                let raw = value.as_str().unwrap_or_default();
                if allowed.contains(&raw) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {key} to be one of [{}], got {raw}",
                        allowed.join(", ")
                    ))
                }
            }
            Validator::IntOneOf(allowed) => match value.as_i64() {
                Some(raw) if allowed.contains(&raw) => Ok(()),
                _ => Err(format!(
                    "expected {key} to be one of {allowed:?}, got {value}"
                )),
            },
            Validator::IntBetween(min, max) => match value.as_i64() {
                Some(raw) if raw >= *min && raw <= *max => Ok(()),
                _ => Err(format!(
                    "expected {key} to be in the range ({min} - {max}), got {value}"
                )),
            },
            Validator::FloatBetween(min, max) => match value.as_f64() {
                Some(raw) if raw >= *min && raw <= *max => Ok(()),
                _ => Err(format!(
                    "expected {key} to be in the range ({min} - {max}), got {value}"
                )),
            },
            Validator::FloatAtLeast(min) => match value.as_f64() {
                Some(raw) if raw >= *min => Ok(()),
                _ => Err(format!("expected {key} to be at least ({min}), got {value}")),
            },
            Validator::NonEmpty => {
                if value.is_empty_value() {
                    Err(format!("expected {key} to not be empty"))
                } else {
                    Ok(())
                }
            }
            Validator::Custom(check) => check(value, key),
        }
    }
}

/// element type of list and set fields.
#[derive(Debug, Clone)]
pub enum Element {
    String,
    Int,
    Float,
    Bool,
    Resource(Schema),
    List(Box<Element>),
}

impl Element {
    fn label(&self) -> &'static str {
        match self {
            Element::String => "string",
            Element::Int => "int",
            Element::Float => "float",
            Element::Bool => "bool",
            Element::Resource(_) => "map",
            Element::List(_) => "list",
        }
    }
}

/// identity function for set elements.
#[derive(Debug, Clone)]
pub enum SetHash {
    /// identity over the whole element content.
    Element,
    /// identity over a single key field of a nested resource element.
    Key(&'static str),
}

impl SetHash {
    pub fn identity(&self, element: &Value) -> String {
        match self {
            SetHash::Element => element.canonical_key(),
            SetHash::Key(field) => element
                .as_map()
                .and_then(|map| map.get(*field))
                .map(Value::canonical_key)
                .unwrap_or_default(),
        }
    }
}

/// container kind of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Int,
    Float,
    Bool,
    List(Element),
    Set(Element, SetHash),
    /// string to string map.
    Map,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::List(_) => "list",
            FieldKind::Set(_, _) => "set",
            FieldKind::Map => "map",
        }
    }
}

/// schema of a single field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub kind: FieldKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub min_items: usize,
    pub max_items: Option<usize>,
    pub description: &'static str,
    pub deprecated: Option<&'static str>,
    pub validator: Option<Validator>,
    pub diff_suppress: Option<DiffSuppressFn>,
    pub state_func: Option<StateFn>,
}

impl FieldSchema {
    fn with_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            min_items: 0,
            max_items: None,
            description: "",
            deprecated: None,
            validator: None,
            diff_suppress: None,
            state_func: None,
        }
    }

    pub fn string() -> Self {
        Self::with_kind(FieldKind::String)
    }

    pub fn int() -> Self {
        Self::with_kind(FieldKind::Int)
    }

    pub fn float() -> Self {
        Self::with_kind(FieldKind::Float)
    }

    pub fn bool() -> Self {
        Self::with_kind(FieldKind::Bool)
    }

    pub fn string_map() -> Self {
        Self::with_kind(FieldKind::Map)
    }

    pub fn list(element: Element) -> Self {
        Self::with_kind(FieldKind::List(element))
    }

    pub fn set(element: Element, hash: SetHash) -> Self {
        Self::with_kind(FieldKind::Set(element, hash))
    }

    pub fn string_list() -> Self {
        Self::list(Element::String)
    }

    pub fn string_set() -> Self {
        Self::set(Element::String, SetHash::Element)
    }

    /// single nested block, stored as a list with at most one element.
    pub fn block(schema: Schema) -> Self {
        Self::list(Element::Resource(schema)).max_items(1)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional = true;
        self.required = false;
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn deprecated(mut self, message: &'static str) -> Self {
        self.deprecated = Some(message);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn diff_suppress(mut self, suppress: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }

    pub fn state_func(mut self, func: StateFn) -> Self {
        self.state_func = Some(func);
        self
    }

    /// nested schema for block fields.
    fn value_or_default(&self, value: Option<&Value>) -> Value {
        match value.filter(|v| !v.is_null()) {
            Some(value) => value.clone(),
            None => self.default.clone().unwrap_or_default(),
        }
    }

    pub fn nested(&self) -> Option<&Schema> {
        match &self.kind {
            FieldKind::List(Element::Resource(schema))
            | FieldKind::Set(Element::Resource(schema), _) => Some(schema),
            _ => None,
        }
    }

    /// normalize a value for storage: coerce scalars, apply the state function
    /// and canonicalize set elements.
    pub fn normalize(&self, path: &str, value: Value) -> Result<Value, StateError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match &self.kind {
            FieldKind::String => {
                let raw = coerce_string(path, value)?;
                Ok(Value::String(match self.state_func {
                    Some(func) => func(&raw),
                    None => raw,
                }))
            }
            FieldKind::Int => coerce_int(path, value),
            FieldKind::Float => coerce_float(path, value),
            FieldKind::Bool => coerce_bool(path, value),
            FieldKind::List(element) => {
                let items = expect_items(path, value, "list")?;
                let items = normalize_items(path, element, items)?;
                Ok(Value::List(items))
            }
            FieldKind::Set(element, hash) => {
                let items = expect_items(path, value, "set")?;
                let items = normalize_items(path, element, items)?;
                Ok(Value::Set(canonicalize_set(items, hash)))
            }
            FieldKind::Map => match value {
                Value::Map(map) => {
                    let mut out = StateMap::new();
                    for (key, entry) in map {
                        let entry_path = format!("{path}.{key}");
                        let raw = if entry.is_null() {
                            String::new()
                        } else {
                            coerce_string(&entry_path, entry)?
                        };
                        out.insert(key, Value::String(raw));
                    }
                    Ok(Value::Map(out))
                }
                other => Err(mismatch(path, "map", &other)),
            },
        }
    }
}

fn mismatch(path: &str, expected: &'static str, actual: &Value) -> StateError {
    StateError::TypeMismatch {
        path: path.to_string(),
        expected,
        actual: actual.type_label(),
    }
}

fn coerce_string(path: &str, value: Value) -> Result<String, StateError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(mismatch(path, "string", &other)),
    }
}

fn coerce_int(path: &str, value: Value) -> Result<Value, StateError> {
    match &value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| mismatch(path, "int", &value)),
        other => other
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch(path, "int", &value)),
    }
}

fn coerce_float(path: &str, value: Value) -> Result<Value, StateError> {
    match &value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| mismatch(path, "float", &value)),
        other => other
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| mismatch(path, "float", &value)),
    }
}

fn coerce_bool(path: &str, value: Value) -> Result<Value, StateError> {
    match &value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => s
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| mismatch(path, "bool", &value)),
        _ => Err(mismatch(path, "bool", &value)),
    }
}

fn expect_items(path: &str, value: Value, expected: &'static str) -> Result<Vec<Value>, StateError> {
    match value {
        Value::List(items) | Value::Set(items) => Ok(items),
        other => Err(mismatch(path, expected, &other)),
    }
}

fn normalize_items(
    path: &str,
    element: &Element,
    items: Vec<Value>,
) -> Result<Vec<Value>, StateError> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| normalize_element(&format!("{path}.{idx}"), element, item))
        .collect()
}

fn normalize_element(path: &str, element: &Element, value: Value) -> Result<Value, StateError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match element {
        Element::String => coerce_string(path, value).map(Value::String),
        Element::Int => coerce_int(path, value),
        Element::Float => coerce_float(path, value),
        Element::Bool => coerce_bool(path, value),
        Element::Resource(schema) => match value {
            Value::Map(map) => schema.normalize_at(path, map).map(Value::Map),
            other => Err(mismatch(path, "map", &other)),
        },
        Element::List(inner) => {
            let items = expect_items(path, value, "list")?;
            normalize_items(path, inner, items).map(Value::List)
        }
    }
}

/// dedupe set elements by identity and order them deterministically.
pub fn canonicalize_set(items: Vec<Value>, hash: &SetHash) -> Vec<Value> {
    let mut by_identity: BTreeMap<String, Value> = BTreeMap::new();
    for item in items {
        by_identity.entry(hash.identity(&item)).or_insert(item);
    }
    by_identity.into_values().collect()
}

/// schema of a resource or nested block.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<&'static str, FieldSchema>,
}

impl Schema {
    pub fn new<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, FieldSchema)>,
    {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// add or replace a field.
    pub fn with(mut self, name: &'static str, field: FieldSchema) -> Self {
        self.fields.insert(name, field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }

    pub fn field_names(&self) -> BTreeSet<&'static str> {
        self.fields.keys().copied().collect()
    }

    /// normalize every known field of a state map.
    pub fn normalize(&self, map: StateMap) -> Result<StateMap, StateError> {
        self.normalize_at("", map)
    }

    fn normalize_at(&self, prefix: &str, map: StateMap) -> Result<StateMap, StateError> {
        let mut out = StateMap::new();
        for (key, value) in map {
            let normalized = match self.fields.get(key.as_str()) {
                Some(field) => field.normalize(&join(prefix, &key), value)?,
                None => value,
            };
            out.insert(key, normalized);
        }
        Ok(out)
    }

    /// materialize defaults for absent fields, recursing into nested blocks.
    pub fn apply_defaults(&self, map: &mut StateMap) {
        for (name, field) in &self.fields {
            let absent = map.get(*name).map_or(true, Value::is_null);
            if absent {
                if let Some(default) = &field.default {
                    map.insert(name.to_string(), default.clone());
                }
                continue;
            }
            let Some(nested) = field.nested() else {
                continue;
            };
            if let Some(Value::List(items) | Value::Set(items)) = map.get_mut(*name) {
                for item in items.iter_mut() {
                    if let Some(inner) = item.as_map_mut() {
                        nested.apply_defaults(inner);
                    }
                }
            }
        }
    }

    /// validate a state map, collecting every failure.
    pub fn validate(&self, map: &StateMap) -> Vec<FieldError> {
        let mut errors = Vec::new();
        self.validate_at("", map, &mut errors);
        errors
    }

    fn validate_at(&self, prefix: &str, map: &StateMap, errors: &mut Vec<FieldError>) {
        for key in map.keys() {
            if prefix.is_empty() && key == "id" {
                continue;
            }
            if !self.fields.contains_key(key.as_str()) {
                errors.push(FieldError::new(join(prefix, key), "unknown field"));
            }
        }

        for (name, field) in &self.fields {
            let path = join(prefix, name);
            let value = map.get(*name).filter(|v| !v.is_null());
            let Some(value) = value else {
                if field.required {
                    errors.push(FieldError::new(path, "required field is missing"));
                }
                continue;
            };
            if field.required && matches!(value, Value::String(s) if s.is_empty()) {
                errors.push(FieldError::new(path, "required field is empty"));
                continue;
            }
            validate_value(&path, name, field, value, errors);
        }
    }

    /// paths of fields whose configured value differs from the stored state.
    pub fn diff(&self, old: &StateMap, new: &StateMap) -> Vec<String> {
        let mut changes = Vec::new();
        self.diff_at("", old, new, &mut changes);
        changes
    }

    fn diff_at(&self, prefix: &str, old: &StateMap, new: &StateMap, changes: &mut Vec<String>) {
        for (name, field) in &self.fields {
            let path = join(prefix, name);
            let raw_new = new.get(*name).filter(|v| !v.is_null());
            if raw_new.is_none() && field.computed {
                continue;
            }
            // an absent value reads as the default on both sides
            let old_value = field.value_or_default(old.get(*name));
            let new_value = field.value_or_default(raw_new);
            if old_value.is_empty_value() && new_value.is_empty_value() {
                continue;
            }

            let changed = match (&field.kind, &old_value, &new_value) {
                (FieldKind::String, Value::String(a), Value::String(b)) => match field.diff_suppress {
                    Some(suppress) => !suppress(&path, a, b),
                    None => a != b,
                },
                (FieldKind::List(Element::Resource(nested)), Value::List(a), Value::List(b))
                    if a.len() == b.len() =>
                {
                    for (idx, (a, b)) in a.iter().zip(b.iter()).enumerate() {
                        let empty = StateMap::new();
                        nested.diff_at(
                            &format!("{path}.{idx}"),
                            a.as_map().unwrap_or(&empty),
                            b.as_map().unwrap_or(&empty),
                            changes,
                        );
                    }
                    false
                }
                _ => old_value != new_value,
            };
            if changed {
                changes.push(path);
            }
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn validate_value(
    path: &str,
    key: &str,
    field: &FieldSchema,
    value: &Value,
    errors: &mut Vec<FieldError>,
) {
    match &field.kind {
        FieldKind::String | FieldKind::Int | FieldKind::Float | FieldKind::Bool => {
            if !scalar_matches(&field.kind, value) {
                errors.push(FieldError::new(
                    path,
                    format!("expected {}, got {}", field.kind.label(), value.type_label()),
                ));
                return;
            }
            if let Some(validator) = &field.validator {
                if let Err(message) = validator.check(value, key) {
                    errors.push(FieldError::new(path, message));
                }
            }
        }
        FieldKind::Map => {
            let Some(map) = value.as_map() else {
                errors.push(FieldError::new(
                    path,
                    format!("expected map, got {}", value.type_label()),
                ));
                return;
            };
            for (entry, item) in map {
                if item.as_str().is_none() {
                    errors.push(FieldError::new(
                        format!("{path}.{entry}"),
                        format!("expected string, got {}", item.type_label()),
                    ));
                }
            }
        }
        FieldKind::List(element) | FieldKind::Set(element, _) => {
            let Some(items) = value.as_list() else {
                errors.push(FieldError::new(
                    path,
                    format!("expected {}, got {}", field.kind.label(), value.type_label()),
                ));
                return;
            };
            if items.len() < field.min_items {
                errors.push(FieldError::new(
                    path,
                    format!(
                        "attribute supports {} item minimum, config has {} declared",
                        field.min_items,
                        items.len()
                    ),
                ));
            }
            if let Some(max) = field.max_items {
                if items.len() > max {
                    errors.push(FieldError::new(
                        path,
                        format!(
                            "attribute supports {max} item maximum, config has {} declared",
                            items.len()
                        ),
                    ));
                }
            }
            for (idx, item) in items.iter().enumerate() {
                validate_element(&format!("{path}.{idx}"), key, field, element, item, errors);
            }
        }
    }
}

fn validate_element(
    path: &str,
    key: &str,
    field: &FieldSchema,
    element: &Element,
    value: &Value,
    errors: &mut Vec<FieldError>,
) {
    match element {
        Element::Resource(schema) => match value.as_map() {
            Some(map) => schema.validate_at(path, map, errors),
            None => errors.push(FieldError::new(
                path,
                format!("expected map, got {}", value.type_label()),
            )),
        },
        Element::List(inner) => match value.as_list() {
            Some(items) => {
                for (idx, item) in items.iter().enumerate() {
                    validate_element(&format!("{path}.{idx}"), key, field, inner, item, errors);
                }
            }
            None => errors.push(FieldError::new(
                path,
                format!("expected list, got {}", value.type_label()),
            )),
        },
        scalar => {
            let kind = match scalar {
                Element::String => FieldKind::String,
                Element::Int => FieldKind::Int,
                Element::Float => FieldKind::Float,
                _ => FieldKind::Bool,
            };
            if !scalar_matches(&kind, value) {
                errors.push(FieldError::new(
                    path,
                    format!("expected {}, got {}", scalar.label(), value.type_label()),
                ));
                return;
            }
            if let Some(validator) = &field.validator {
                if let Err(message) = validator.check(value, key) {
                    errors.push(FieldError::new(path, message));
                }
            }
        }
    }
}

fn scalar_matches(kind: &FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::String => matches!(value, Value::String(_)),
        FieldKind::Int => value.as_i64().is_some(),
        FieldKind::Float => value.as_f64().is_some(),
        FieldKind::Bool => matches!(value, Value::Bool(_)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowercase(raw: &str) -> String {
        raw.to_lowercase()
    }

    fn case_insensitive(_key: &str, old: &str, new: &str) -> bool {
        old.eq_ignore_ascii_case(new)
    }

    fn test_schema() -> Schema {
        Schema::new([
            ("name", FieldSchema::string().required()),
            ("full_name", FieldSchema::string().computed()),
            (
                "kind",
                FieldSchema::string()
                    .optional()
                    .validate(Validator::OneOf(&["a", "b"])),
            ),
            (
                "code",
                FieldSchema::string()
                    .optional()
                    .state_func(lowercase)
                    .diff_suppress(case_insensitive),
            ),
            ("granularity", FieldSchema::int().default(600000i64)),
            ("ids", FieldSchema::string_set()),
            (
                "payload",
                FieldSchema::set(
                    Element::Resource(Schema::new([
                        ("key", FieldSchema::string().required()),
                        ("value", FieldSchema::string().optional()),
                    ])),
                    SetHash::Key("key"),
                ),
            ),
            (
                "rule",
                FieldSchema::block(Schema::new([
                    ("metric_name", FieldSchema::string().required()),
                    ("enabled", FieldSchema::bool().default(true)),
                ]))
                .min_items(1),
            ),
        ])
    }

    fn state(entries: Vec<(&str, Value)>) -> StateMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn normalize_applies_state_func_and_coerces() {
        let schema = test_schema();
        let map = schema
            .normalize(state(vec![
                ("code", Value::from("ABC")),
                ("granularity", Value::Float(300000.0)),
            ]))
            .unwrap();
        assert_eq!(map.get("code"), Some(&Value::from("abc")));
        assert!(matches!(map.get("granularity"), Some(Value::Int(300000))));
    }

    #[test]
    fn normalize_turns_lists_into_sets_keyed_by_hash() {
        let schema = test_schema();
        let map = schema
            .normalize(state(vec![(
                "payload",
                Value::List(vec![
                    Value::map([("key", Value::from("b")), ("value", Value::from("1"))]),
                    Value::map([("key", Value::from("a")), ("value", Value::from("2"))]),
                    Value::map([("key", Value::from("b")), ("value", Value::from("3"))]),
                ]),
            )]))
            .unwrap();
        let Some(Value::Set(items)) = map.get("payload") else {
            panic!("expected set");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get_path("key"), Some(&Value::from("a")));
        assert_eq!(items[1].get_path("value"), Some(&Value::from("1")));
    }

    #[test]
    fn normalize_rejects_wrong_kind() {
        let schema = test_schema();
        let err = schema
            .normalize(state(vec![("ids", Value::from("x"))]))
            .unwrap_err();
        assert_eq!(
            err,
            StateError::TypeMismatch {
                path: "ids".to_string(),
                expected: "set",
                actual: "string",
            }
        );
    }

    #[test]
    fn apply_defaults_recurses_into_blocks() {
        let schema = test_schema();
        let mut map = state(vec![(
            "rule",
            Value::block([("metric_name", Value::from("calls"))]),
        )]);
        schema.apply_defaults(&mut map);
        assert_eq!(map.get("granularity"), Some(&Value::Int(600000)));
        assert_eq!(
            map.get("rule").and_then(|v| v.get_path("0.enabled")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn validate_reports_paths() {
        let schema = test_schema();
        let errors = schema.validate(&state(vec![
            ("kind", Value::from("c")),
            ("bogus", Value::from("x")),
            ("rule", Value::List(vec![Value::map([("enabled", Value::Bool(true))])])),
        ]));
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"bogus"));
        assert!(paths.contains(&"name"));
        assert!(paths.contains(&"kind"));
        assert!(paths.contains(&"rule.0.metric_name"));
    }

    #[test]
    fn validate_enforces_cardinality() {
        let schema = test_schema();
        let block = Value::map([("metric_name", Value::from("x"))]);
        let errors = schema.validate(&state(vec![
            ("name", Value::from("n")),
            ("rule", Value::List(vec![block.clone(), block])),
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("1 item maximum"));

        let errors = schema.validate(&state(vec![
            ("name", Value::from("n")),
            ("rule", Value::empty_list()),
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("1 item minimum"));
    }

    #[test]
    fn diff_honors_suppression_sets_and_computed_fields() {
        let schema = test_schema();
        let old = state(vec![
            ("name", Value::from("n")),
            ("full_name", Value::from("n (TF managed)")),
            ("code", Value::from("abc")),
            ("ids", Value::string_set(["1", "2"])),
            ("granularity", Value::Int(600000)),
        ]);
        let new = state(vec![
            ("name", Value::from("n")),
            ("code", Value::from("ABC")),
            ("ids", Value::string_set(["2", "1"])),
        ]);
        assert!(schema.diff(&old, &new).is_empty());

        let new = state(vec![("name", Value::from("m"))]);
        let changes = schema.diff(&old, &new);
        assert!(changes.contains(&"name".to_string()));
        assert!(changes.contains(&"ids".to_string()));
    }

    #[test]
    fn diff_recurses_into_blocks() {
        let schema = test_schema();
        let old = state(vec![(
            "rule",
            Value::block([("metric_name", Value::from("a")), ("enabled", Value::Bool(true))]),
        )]);
        let new = state(vec![(
            "rule",
            Value::block([("metric_name", Value::from("b"))]),
        )]);
        assert_eq!(schema.diff(&old, &new), vec!["rule.0.metric_name".to_string()]);
    }

    #[test]
    fn absent_defaulted_fields_compare_as_their_default() {
        let schema = test_schema();
        let old = state(vec![("name", Value::from("n"))]);
        let new = state(vec![("name", Value::from("n"))]);
        assert!(schema.diff(&old, &new).is_empty());

        let new = state(vec![
            ("name", Value::from("n")),
            ("granularity", Value::Int(600000)),
        ]);
        assert!(schema.diff(&old, &new).is_empty());

        let new = state(vec![
            ("name", Value::from("n")),
            ("granularity", Value::Int(300000)),
        ]);
        assert_eq!(schema.diff(&old, &new), vec!["granularity".to_string()]);
    }
}
