//! affix handling for managed resource names.

/// suffix appended to managed names when none is configured.
pub const DEFAULT_SUFFIX: &str = " (TF managed)";

/// adds and strips a configured prefix/suffix around resource names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNameFormatter {
    prefix: String,
    suffix: String,
}

impl ResourceNameFormatter {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// wrap a short name with the configured affixes.
    pub fn format(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }

    /// strip the affixes, returning the input unchanged unless both are present.
    pub fn undo_format(&self, name: &str) -> String {
        let affix_len = self.prefix.len() + self.suffix.len();
        if name.len() < affix_len {
            return name.to_string();
        }
        match name
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
        {
            Some(short) => short.to_string(),
            None => name.to_string(),
        }
    }
}

impl Default for ResourceNameFormatter {
    fn default() -> Self {
        Self::new("", DEFAULT_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_wraps_name() {
        let formatter = ResourceNameFormatter::new("p ", " s");
        assert_eq!(formatter.format("my-chan"), "p my-chan s");
    }

    #[test]
    fn undo_format_strips_both_affixes() {
        let formatter = ResourceNameFormatter::new("p ", " s");
        assert_eq!(formatter.undo_format("p my-chan s"), "my-chan");
        assert_eq!(
            formatter.undo_format(&formatter.format("x")),
            "x".to_string()
        );
    }

    #[test]
    fn undo_format_keeps_foreign_names() {
        let formatter = ResourceNameFormatter::new("p ", " s");
        assert_eq!(formatter.undo_format("other"), "other");
        assert_eq!(formatter.undo_format("p only-prefix"), "p only-prefix");
        assert_eq!(formatter.undo_format("only-suffix s"), "only-suffix s");
        assert_eq!(formatter.undo_format("p"), "p");
    }

    #[test]
    fn default_uses_managed_suffix() {
        let formatter = ResourceNameFormatter::default();
        assert_eq!(formatter.format("svc"), "svc (TF managed)");
        assert_eq!(formatter.undo_format("svc (TF managed)"), "svc");
    }
}
