//! schema callbacks shared by every tag filter field.

use super::{canonical_text, normalize, parse};
use crate::schema::{FieldSchema, Validator};
use crate::value::Value;

/// old and new are equivalent when both parse to the same canonical text,
/// or when neither parses and the raw strings match.
pub fn suppress_equivalent_tag_filters(_key: &str, old: &str, new: &str) -> bool {
    match (parse(old), parse(new)) {
        (Ok(old), Ok(new)) => canonical_text(&old) == canonical_text(&new),
        _ => old == new,
    }
}

/// state function storing the canonical form of parseable filters.
pub fn normalize_tag_filter(raw: &str) -> String {
    normalize(raw)
}

/// reject non-empty values the parser cannot consume.
pub fn validate_tag_filter(value: &Value, key: &str) -> Result<(), String> {
    let Some(raw) = value.as_str() else {
        return Err(format!("expected {key} to be a string"));
    };
    if raw.trim().is_empty() {
        return Ok(());
    }
    parse(raw)
        .map(|_| ())
        .map_err(|err| format!("{key} is not a valid tag filter: {err}"))
}

/// string field with the tag filter callbacks installed.
pub fn tag_filter_field(required: bool) -> FieldSchema {
    let field = FieldSchema::string()
        .diff_suppress(suppress_equivalent_tag_filters)
        .state_func(normalize_tag_filter)
        .validate(Validator::Custom(validate_tag_filter))
        .description("The tag filter expression");
    if required {
        field.required()
    } else {
        field.optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::tagfilter::{tag_filter_from_api, tag_filter_to_api};
    use crate::value::StateMap;

    #[test]
    fn suppresses_equivalent_filters() {
        assert!(suppress_equivalent_tag_filters(
            "tag_filter",
            "call.type@dest EQUALS 'HTTP'",
            "call.type EQUALS 'HTTP'"
        ));
        assert!(!suppress_equivalent_tag_filters(
            "tag_filter",
            "call.type EQUALS 'HTTP'",
            "call.type EQUALS 'GRPC'"
        ));
        assert!(suppress_equivalent_tag_filters("tag_filter", "broken (", "broken ("));
        assert!(!suppress_equivalent_tag_filters(
            "tag_filter",
            "broken (",
            "call.type EQUALS 'HTTP'"
        ));
    }

    #[test]
    fn redundant_brackets_match_the_api_read_back() {
        let configured = "a EQUALS 'x' OR (b EQUALS 'y' AND c EQUALS 'z')";
        let read_back = tag_filter_from_api(&tag_filter_to_api(configured).unwrap());
        assert_eq!(
            read_back,
            "a@dest EQUALS 'x' OR b@dest EQUALS 'y' AND c@dest EQUALS 'z'"
        );
        assert_eq!(normalize_tag_filter(configured), read_back);
        assert!(suppress_equivalent_tag_filters("tag_filter", &read_back, configured));

        // brackets that change meaning survive
        let grouped = "(a EQUALS 'x' OR b EQUALS 'y') AND c EQUALS 'z'";
        assert_eq!(
            normalize_tag_filter(grouped),
            "(a@dest EQUALS 'x' OR b@dest EQUALS 'y') AND c@dest EQUALS 'z'"
        );
        assert!(!suppress_equivalent_tag_filters(
            "tag_filter",
            &read_back,
            grouped
        ));
    }

    #[test]
    fn validation_names_the_field() {
        let err = validate_tag_filter(&Value::from("a EQUALS"), "tag_filter").unwrap_err();
        assert!(err.starts_with("tag_filter is not a valid tag filter"));
        assert!(err.contains("column 9"));
        assert!(validate_tag_filter(&Value::from("a IS_EMPTY"), "tag_filter").is_ok());
        assert!(validate_tag_filter(&Value::from(""), "tag_filter").is_ok());
    }

    #[test]
    fn field_normalizes_and_suppresses_diffs() {
        let schema = Schema::new([("tag_filter", tag_filter_field(true))]);
        let mut input = StateMap::new();
        input.insert(
            "tag_filter".to_string(),
            Value::from("call.type  EQUALS  'HTTP'"),
        );
        let stored = schema.normalize(input).unwrap();
        assert_eq!(
            stored.get("tag_filter"),
            Some(&Value::from("call.type@dest EQUALS 'HTTP'"))
        );

        let mut planned = StateMap::new();
        planned.insert(
            "tag_filter".to_string(),
            Value::from("call.type EQUALS 'HTTP'"),
        );
        assert!(schema.diff(&stored, &planned).is_empty());
    }

    #[test]
    fn required_field_rejects_invalid_filters() {
        let schema = Schema::new([("tag_filter", tag_filter_field(true))]);
        let mut state = StateMap::new();
        state.insert("tag_filter".to_string(), Value::from("a FOO 'x'"));
        let errors = schema.validate(&state);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "tag_filter");
    }
}
