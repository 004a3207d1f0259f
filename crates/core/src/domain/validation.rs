use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one request, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Trims `value` and records an error if it is blank or longer than `max_chars`.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: String,
    max_chars: Option<usize>,
) -> String {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        errors.push(field, "must not be blank");
    } else if let Some(max) = max_chars {
        let len = trimmed.chars().count();
        if len > max {
            errors.push(field, format!("must be at most {max} characters (got {len})"));
        }
    }
    trimmed
}

/// Trims every entry; blank entries are reported by index.
pub(crate) fn text_list(errors: &mut ValidationErrors, field: &str, values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .enumerate()
        .map(|(idx, v)| {
            let trimmed = v.trim().to_string();
            if trimmed.is_empty() {
                errors.push(format!("{field}[{idx}]"), "must not be blank");
            }
            trimmed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_returns_value_when_clean() {
        assert_eq!(ValidationErrors::new().finish(7), Ok(7));
    }

    #[test]
    fn required_text_trims_and_flags_blank() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "title", "  hi ".into(), None), "hi");
        assert!(errors.is_empty());

        required_text(&mut errors, "title", "   ".into(), None);
        assert!(errors.has_field("title"));
    }

    #[test]
    fn required_text_enforces_max_chars() {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "title", "abcdef".into(), Some(5));
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.errors()[0].message.contains("at most 5"));
    }

    #[test]
    fn text_list_reports_blank_entries_by_index() {
        let mut errors = ValidationErrors::new();
        let out = text_list(&mut errors, "tags", vec![" a ".into(), "".into()]);
        assert_eq!(out, vec!["a".to_string(), String::new()]);
        assert!(errors.has_field("tags[1]"));
    }

    #[test]
    fn display_lists_every_field() {
        let mut errors = ValidationErrors::single("a", "bad");
        errors.push("b", "worse");
        let s = errors.to_string();
        assert!(s.contains("a: bad") && s.contains("b: worse"));
    }
}
