//! Text input validation.
//!
//! Validation runs as a pure function over a snapshot of the input's
//! value and its sibling rule controls. Failures are expected, user-facing
//! outcomes carried as a status and message pair; nothing here returns an
//! `Err`. Message text comes from an injected [`Translator`] so the
//! library never owns a message catalog.

use std::sync::LazyLock;

use regex::Regex;

use super::controls::DropdownOption;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?|ftp)://[^\s/$.?#][^\s]*$").expect("url pattern")
});

static MATCH_ALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(".*").expect("match-all pattern"));

/// A regex accepting any input, used wherever a pattern slot must be
/// filled but no restriction applies.
pub fn match_all_regex() -> Regex {
    MATCH_ALL_PATTERN.clone()
}

/// The closed, ordered set of validation kinds for text inputs.
///
/// Every kind except [`ValidationType::Regex`] carries a fixed pattern;
/// for `Regex` the pattern comes from the sibling regex control instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationType {
    Text,
    Email,
    Url,
    Regex,
}

impl ValidationType {
    /// The fixed pattern for this kind, absent only for `Regex`.
    pub fn pattern(&self) -> Option<&'static Regex> {
        match self {
            ValidationType::Text => Some(&MATCH_ALL_PATTERN),
            ValidationType::Email => Some(&EMAIL_PATTERN),
            ValidationType::Url => Some(&URL_PATTERN),
            ValidationType::Regex => None,
        }
    }

    /// The help-text key shown when this kind's pattern rejects a value.
    pub fn help_key(&self) -> &'static str {
        match self {
            ValidationType::Text => "",
            ValidationType::Email => "validationDesc.email",
            ValidationType::Url => "validationDesc.url",
            ValidationType::Regex => "validationDesc.regex",
        }
    }
}

impl DropdownOption for ValidationType {
    fn as_str(&self) -> &'static str {
        match self {
            ValidationType::Text => "Text",
            ValidationType::Email => "Email",
            ValidationType::Url => "URL",
            ValidationType::Regex => "Regex",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Text" => Some(ValidationType::Text),
            "Email" => Some(ValidationType::Email),
            "URL" => Some(ValidationType::Url),
            "Regex" => Some(ValidationType::Regex),
            _ => None,
        }
    }

    fn all() -> &'static [Self] {
        &[
            ValidationType::Text,
            ValidationType::Email,
            ValidationType::Url,
            ValidationType::Regex,
        ]
    }
}

/// Resolves a message key and named parameters to display text.
///
/// The host supplies its own implementation to plug in a real message
/// catalog; [`DefaultMessages`] provides plain English fallbacks.
pub trait Translator {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// English fallback messages, keyed the same way a host catalog would be.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl Translator for DefaultMessages {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        match key {
            "prop.required" => "This field is required".to_string(),
            "validationDesc.maxLength" => format!(
                "Input exceeds the maximum length: {}/{}",
                param("length"),
                param("maxLength")
            ),
            "validationDesc.minLength" => format!(
                "Input is below the minimum length: {}/{}",
                param("length"),
                param("minLength")
            ),
            "validationDesc.email" => "Please enter a valid email address".to_string(),
            "validationDesc.url" => "Please enter a valid URL".to_string(),
            "validationDesc.regex" => "Input does not match the required pattern".to_string(),
            other => other.to_string(),
        }
    }
}

/// Outcome status of one validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidateStatus {
    /// No problem found; nothing to display.
    #[default]
    None,
    Success,
    Warning,
    Error,
}

/// Status plus optional inline help text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidateResult {
    pub status: ValidateStatus,
    pub help: Option<String>,
}

impl ValidateResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn error(help: impl Into<String>) -> Self {
        Self {
            status: ValidateStatus::Error,
            help: Some(help.into()),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.status == ValidateStatus::Error
    }
}

/// A read-only snapshot of the value and its sibling rule controls.
///
/// Recomputed per check from the current control views; never stored.
#[derive(Debug, Clone)]
pub struct ValidationParams {
    pub value: String,
    pub required: bool,
    /// Lower length bound; `0` disables the check.
    pub min_length: usize,
    /// Upper length bound; `0` disables the check.
    pub max_length: usize,
    pub validation_type: ValidationType,
    /// User-supplied pattern, consulted only for [`ValidationType::Regex`].
    pub regex: Regex,
    /// A non-empty string here fails validation outright with that string
    /// as the message.
    pub custom_rule: String,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            value: String::new(),
            required: false,
            min_length: 0,
            max_length: 0,
            validation_type: ValidationType::Text,
            regex: match_all_regex(),
            custom_rule: String::new(),
        }
    }
}

/// Validates a text input snapshot.
///
/// Checks run in a fixed order and the first failure wins: custom rule,
/// required, maximum length, minimum length, then the selected kind's
/// pattern (or the user pattern for the `Regex` kind). Length bounds set
/// to `0` are disabled. Lengths count Unicode scalar values.
///
/// # Examples
///
/// ```
/// use propsheet::application::{validate_text_input, DefaultMessages, ValidationParams};
///
/// let params = ValidationParams {
///     required: true,
///     ..ValidationParams::default()
/// };
/// let result = validate_text_input(&params, &DefaultMessages);
/// assert!(result.is_invalid());
/// ```
pub fn validate_text_input(params: &ValidationParams, trans: &dyn Translator) -> ValidateResult {
    if !params.custom_rule.is_empty() {
        return ValidateResult::error(params.custom_rule.clone());
    }

    let length = params.value.chars().count();

    if params.required && length == 0 {
        return ValidateResult::error(trans.translate("prop.required", &[]));
    }

    if params.max_length > 0 && length > params.max_length {
        return ValidateResult::error(trans.translate(
            "validationDesc.maxLength",
            &[
                ("length", length.to_string()),
                ("maxLength", params.max_length.to_string()),
            ],
        ));
    }

    if params.min_length > 0 && length < params.min_length {
        return ValidateResult::error(trans.translate(
            "validationDesc.minLength",
            &[
                ("length", length.to_string()),
                ("minLength", params.min_length.to_string()),
            ],
        ));
    }

    let pattern = params
        .validation_type
        .pattern()
        .unwrap_or(&params.regex);
    if !pattern.is_match(&params.value) {
        return ValidateResult::error(trans.translate(params.validation_type.help_key(), &[]));
    }

    ValidateResult::success()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: &str) -> ValidationParams {
        ValidationParams {
            value: value.to_string(),
            ..ValidationParams::default()
        }
    }

    #[test]
    fn test_passes_by_default() {
        assert_eq!(validate_text_input(&params(""), &DefaultMessages), ValidateResult::success());
        assert_eq!(
            validate_text_input(&params("anything"), &DefaultMessages),
            ValidateResult::success()
        );
    }

    #[test]
    fn test_custom_rule_wins_over_everything() {
        let p = ValidationParams {
            custom_rule: "broken by rule".to_string(),
            required: true,
            ..params("")
        };
        let result = validate_text_input(&p, &DefaultMessages);
        assert_eq!(result.help.as_deref(), Some("broken by rule"));
    }

    #[test]
    fn test_required_before_length() {
        let p = ValidationParams {
            required: true,
            max_length: 3,
            ..params("")
        };
        let result = validate_text_input(&p, &DefaultMessages);
        assert_eq!(result.help.as_deref(), Some("This field is required"));
    }

    #[test]
    fn test_zero_disables_length_bounds() {
        let long = "x".repeat(10_000);
        let p = ValidationParams {
            max_length: 0,
            min_length: 0,
            ..params(&long)
        };
        assert_eq!(validate_text_input(&p, &DefaultMessages), ValidateResult::success());
    }

    #[test]
    fn test_max_length() {
        let p = ValidationParams {
            max_length: 3,
            ..params("abcd")
        };
        let result = validate_text_input(&p, &DefaultMessages);
        assert!(result.is_invalid());
        assert!(result.help.as_deref().unwrap().contains("4/3"));
    }

    #[test]
    fn test_min_length() {
        let p = ValidationParams {
            min_length: 5,
            ..params("abc")
        };
        assert!(validate_text_input(&p, &DefaultMessages).is_invalid());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let p = ValidationParams {
            max_length: 3,
            ..params("äöü")
        };
        assert_eq!(validate_text_input(&p, &DefaultMessages), ValidateResult::success());
    }

    #[test]
    fn test_email_validation() {
        let ok = ValidationParams {
            validation_type: ValidationType::Email,
            ..params("ann@example.com")
        };
        assert_eq!(validate_text_input(&ok, &DefaultMessages), ValidateResult::success());

        let bad = ValidationParams {
            validation_type: ValidationType::Email,
            ..params("not-an-email")
        };
        let result = validate_text_input(&bad, &DefaultMessages);
        assert!(result.is_invalid());
        assert!(result.help.as_deref().unwrap().contains("email"));
    }

    #[test]
    fn test_url_validation() {
        let ok = ValidationParams {
            validation_type: ValidationType::Url,
            ..params("https://example.com/path")
        };
        assert_eq!(validate_text_input(&ok, &DefaultMessages), ValidateResult::success());

        let bad = ValidationParams {
            validation_type: ValidationType::Url,
            ..params("example dot com")
        };
        assert!(validate_text_input(&bad, &DefaultMessages).is_invalid());
    }

    #[test]
    fn test_user_regex_only_for_regex_kind() {
        let digits = Regex::new("^[0-9]+$").unwrap();

        let checked = ValidationParams {
            validation_type: ValidationType::Regex,
            regex: digits.clone(),
            ..params("abc")
        };
        assert!(validate_text_input(&checked, &DefaultMessages).is_invalid());

        // The same pattern is ignored while the Text kind is selected.
        let ignored = ValidationParams {
            validation_type: ValidationType::Text,
            regex: digits,
            ..params("abc")
        };
        assert_eq!(validate_text_input(&ignored, &DefaultMessages), ValidateResult::success());
    }

    #[test]
    fn test_option_metadata() {
        assert_eq!(ValidationType::all().len(), 4);
        assert_eq!(ValidationType::parse("URL"), Some(ValidationType::Url));
        assert_eq!(ValidationType::parse("url"), None);
        assert!(ValidationType::Regex.pattern().is_none());
        assert!(ValidationType::Email.pattern().is_some());
    }

    #[test]
    fn test_translator_injection() {
        struct Upper;
        impl Translator for Upper {
            fn translate(&self, key: &str, _params: &[(&str, String)]) -> String {
                key.to_uppercase()
            }
        }

        let p = ValidationParams {
            required: true,
            ..params("")
        };
        let result = validate_text_input(&p, &Upper);
        assert_eq!(result.help.as_deref(), Some("PROP.REQUIRED"));
    }
}
