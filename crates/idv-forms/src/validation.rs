//! Field validation rules.
//!
//! A field's rule string is a `|`-separated list of tokens. Each recognized
//! token maps to one [`ValidatorRule`]:
//!
//! | token            | rule                 | failure           |
//! |------------------|----------------------|-------------------|
//! | `maxlength=N`    | `MaxLength(N)`       | `TooLong`         |
//! | `digits`         | `DigitsOnly`         | `NonDigits`       |
//! | `special=-`      | `DigitsWithDash`     | `InvalidFormat`   |
//! | `past-date`      | `PastDate`           | `NotPast`         |
//! | `future-date`    | `FutureDate`         | `NotFuture`       |
//! | `valid-province` | `ValidProvince`      | `InvalidProvince` |
//!
//! `special=-` anywhere in the string suppresses `digits`, so dashed values
//! are only checked by `DigitsWithDash`. Unrecognized tokens add no rule.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ErrorKind, FieldErrors};
use crate::form::FieldState;
use crate::schema::FieldSpec;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern is valid"));

static DIGITS_WITH_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(-[0-9]+)*$").expect("dashed digits pattern is valid"));

/// Province and territory codes accepted by [`ValidatorRule::ValidProvince`].
pub const PROVINCES: [&str; 10] = ["AB", "BC", "MB", "NB", "NL", "NS", "ON", "PE", "QC", "SK"];

/// A single check applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorRule {
    /// The value must not be empty.
    Required,
    /// The value must have at most this many characters.
    MaxLength(usize),
    /// The value must consist of decimal digits only.
    DigitsOnly,
    /// Digit groups separated by single dashes.
    DigitsWithDash,
    /// A date strictly before now.
    PastDate,
    /// A date strictly after now.
    FutureDate,
    /// One of [`PROVINCES`].
    ValidProvince,
}

impl ValidatorRule {
    /// Checks a value against this rule at the given moment.
    ///
    /// Every rule except `Required` accepts an empty value.
    pub fn check(&self, value: &str, now: DateTime<Utc>) -> Result<(), ErrorKind> {
        if value.is_empty() {
            return match self {
                Self::Required => Err(ErrorKind::MissingValue),
                _ => Ok(()),
            };
        }

        match self {
            Self::Required => Ok(()),
            Self::MaxLength(max) => {
                if value.chars().count() > *max {
                    Err(ErrorKind::TooLong)
                } else {
                    Ok(())
                }
            }
            Self::DigitsOnly => {
                if DIGITS.is_match(value) {
                    Ok(())
                } else {
                    Err(ErrorKind::NonDigits)
                }
            }
            Self::DigitsWithDash => {
                if DIGITS_WITH_DASH.is_match(value) {
                    Ok(())
                } else {
                    Err(ErrorKind::InvalidFormat)
                }
            }
            Self::PastDate => match parse_date(value) {
                Some(date) if date < now => Ok(()),
                Some(_) => Err(ErrorKind::NotPast),
                None => Err(ErrorKind::InvalidFormat),
            },
            Self::FutureDate => match parse_date(value) {
                Some(date) if date > now => Ok(()),
                Some(_) => Err(ErrorKind::NotFuture),
                None => Err(ErrorKind::InvalidFormat),
            },
            Self::ValidProvince => {
                if PROVINCES.contains(&value) {
                    Ok(())
                } else {
                    Err(ErrorKind::InvalidProvince)
                }
            }
        }
    }
}

/// Parses an RFC 3339 timestamp, a bare `YYYY-MM-DDTHH:MM:SS` (taken as UTC),
/// or a `YYYY-MM-DD` date (midnight UTC).
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|date| date.and_utc())
}

/// A recognized token of a rule string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleToken {
    MaxLength(usize),
    Digits,
    SpecialDash,
    PastDate,
    FutureDate,
    ValidProvince,
}

impl RuleToken {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "digits" => Some(Self::Digits),
            "special=-" => Some(Self::SpecialDash),
            "past-date" => Some(Self::PastDate),
            "future-date" => Some(Self::FutureDate),
            "valid-province" => Some(Self::ValidProvince),
            _ => {
                let limit = token.strip_prefix("maxlength=")?;
                match limit.parse() {
                    Ok(n) => Some(Self::MaxLength(n)),
                    Err(_) => {
                        warn!(token, "maxlength limit is not a non-negative integer");
                        None
                    }
                }
            }
        }
    }
}

/// Compiles rule strings and evaluates the resulting rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// Creates a new rule engine.
    pub fn new() -> Self {
        Self
    }

    /// Builds the ordered rule list for a field.
    ///
    /// `Required` comes first when the field is required; the remaining rules
    /// follow the token order of the rule string.
    pub fn parse_rules(&self, spec: &FieldSpec) -> Vec<ValidatorRule> {
        let mut rules = Vec::new();
        if spec.required {
            rules.push(ValidatorRule::Required);
        }

        let Some(validation) = spec.validation.as_deref() else {
            return rules;
        };

        let mut tokens = Vec::new();
        for raw in validation.split('|') {
            match RuleToken::parse(raw) {
                Some(token) => tokens.push(token),
                None if raw.is_empty() => {}
                None => debug!(token = raw, field = %spec.label, "ignoring unrecognized rule token"),
            }
        }

        let dash_allowed = tokens.contains(&RuleToken::SpecialDash);
        rules.extend(tokens.into_iter().filter_map(|token| match token {
            RuleToken::MaxLength(n) => Some(ValidatorRule::MaxLength(n)),
            RuleToken::Digits if dash_allowed => None,
            RuleToken::Digits => Some(ValidatorRule::DigitsOnly),
            RuleToken::SpecialDash => Some(ValidatorRule::DigitsWithDash),
            RuleToken::PastDate => Some(ValidatorRule::PastDate),
            RuleToken::FutureDate => Some(ValidatorRule::FutureDate),
            RuleToken::ValidProvince => Some(ValidatorRule::ValidProvince),
        }));
        rules
    }

    /// Evaluates every rule against the field value at the current moment.
    pub fn validate(&self, state: &FieldState, rules: &[ValidatorRule]) -> FieldErrors {
        self.validate_at(state, rules, Utc::now())
    }

    /// Evaluates every rule against the field value at `now`.
    ///
    /// All rules run; every failure is reported.
    pub fn validate_at(
        &self,
        state: &FieldState,
        rules: &[ValidatorRule],
        now: DateTime<Utc>,
    ) -> FieldErrors {
        self.validate_value_at(&state.value, rules, now)
    }

    /// Evaluates every rule against a raw value at `now`.
    pub fn validate_value_at(
        &self,
        value: &str,
        rules: &[ValidatorRule],
        now: DateTime<Utc>,
    ) -> FieldErrors {
        rules
            .iter()
            .filter_map(|rule| rule.check(value, now).err())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn spec(required: bool, validation: &str) -> FieldSpec {
        let mut spec = FieldSpec::new("Field", 1).validation(validation);
        spec.required = required;
        spec
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn errors(validation: &str, value: &str) -> Vec<ErrorKind> {
        let engine = RuleEngine::new();
        let rules = engine.parse_rules(&spec(false, validation));
        engine
            .validate_value_at(value, &rules, now())
            .into_iter()
            .collect()
    }

    #[test]
    fn test_parse_rules_order() {
        let engine = RuleEngine::new();
        let rules = engine.parse_rules(&spec(true, "maxlength=10|digits|valid-province"));
        assert_eq!(
            rules,
            vec![
                ValidatorRule::Required,
                ValidatorRule::MaxLength(10),
                ValidatorRule::DigitsOnly,
                ValidatorRule::ValidProvince,
            ]
        );
    }

    #[test]
    fn test_special_dash_suppresses_digits_in_any_position() {
        let engine = RuleEngine::new();
        let before = engine.parse_rules(&spec(false, "special=-|digits"));
        let after = engine.parse_rules(&spec(false, "digits|special=-"));
        assert_eq!(before, vec![ValidatorRule::DigitsWithDash]);
        assert_eq!(after, vec![ValidatorRule::DigitsWithDash]);
    }

    #[test]
    fn test_unrecognized_tokens_are_ignored() {
        let engine = RuleEngine::new();
        let rules = engine.parse_rules(&spec(false, "digits|uppercase||maxlength=abc|Digits"));
        assert_eq!(rules, vec![ValidatorRule::DigitsOnly]);
    }

    #[test]
    fn test_no_validation_string() {
        let engine = RuleEngine::new();
        let mut field = FieldSpec::new("Field", 1);
        assert!(engine.parse_rules(&field).is_empty());
        field.required = true;
        assert_eq!(engine.parse_rules(&field), vec![ValidatorRule::Required]);
    }

    #[test]
    fn test_all_failures_reported() {
        assert_eq!(
            errors("maxlength=9|digits", "12345678901"),
            vec![ErrorKind::TooLong]
        );
        assert_eq!(
            errors("maxlength=9|digits", "12345678a01"),
            vec![ErrorKind::TooLong, ErrorKind::NonDigits]
        );
    }

    #[test]
    fn test_dashed_digits() {
        assert!(errors("digits|special=-", "123-45").is_empty());
        assert!(errors("digits|special=-", "12345").is_empty());
        for bad in ["-123", "123-", "12--3", "12a-3", "-"] {
            assert_eq!(
                errors("digits|special=-", bad),
                vec![ErrorKind::InvalidFormat],
                "value {bad}"
            );
        }
    }

    #[test]
    fn test_digits_only() {
        assert!(errors("digits", "0123").is_empty());
        assert_eq!(errors("digits", "12 3"), vec![ErrorKind::NonDigits]);
        assert_eq!(errors("digits", "123-4"), vec![ErrorKind::NonDigits]);
        assert_eq!(errors("digits", "١٢٣"), vec![ErrorKind::NonDigits]);
    }

    #[test]
    fn test_max_length_counts_characters() {
        assert!(errors("maxlength=3", "éèê").is_empty());
        assert_eq!(errors("maxlength=3", "éèêë"), vec![ErrorKind::TooLong]);
        assert_eq!(errors("maxlength=0", "a"), vec![ErrorKind::TooLong]);
    }

    #[test]
    fn test_dates() {
        let tomorrow = (now() + Duration::days(1)).format("%Y-%m-%d").to_string();
        let yesterday = (now() - Duration::days(1)).format("%Y-%m-%d").to_string();

        assert_eq!(errors("past-date", &tomorrow), vec![ErrorKind::NotPast]);
        assert!(errors("past-date", &yesterday).is_empty());
        assert_eq!(errors("future-date", &yesterday), vec![ErrorKind::NotFuture]);
        assert!(errors("future-date", &tomorrow).is_empty());
    }

    #[test]
    fn test_date_boundaries_are_exclusive() {
        let exact = "2024-06-15T12:00:00Z";
        assert_eq!(errors("past-date", exact), vec![ErrorKind::NotPast]);
        assert_eq!(errors("future-date", exact), vec![ErrorKind::NotFuture]);
    }

    #[test]
    fn test_date_formats() {
        assert!(errors("past-date", "2024-06-15T11:59:59").is_empty());
        assert!(errors("past-date", "2024-06-15T13:00:00+02:00").is_empty());
        assert_eq!(errors("past-date", "15/06/2024"), vec![ErrorKind::InvalidFormat]);
        assert_eq!(errors("future-date", "soon"), vec![ErrorKind::InvalidFormat]);
    }

    #[test]
    fn test_province_codes() {
        for code in PROVINCES {
            assert!(errors("valid-province", code).is_empty(), "code {code}");
        }
        for code in ["YT", "NT", "NU", "XX", "on", "ZZ"] {
            assert_eq!(
                errors("valid-province", code),
                vec![ErrorKind::InvalidProvince],
                "code {code}"
            );
        }
    }

    #[test]
    fn test_optional_empty_value_always_passes() {
        for validation in [
            "maxlength=0",
            "digits",
            "special=-",
            "past-date",
            "future-date",
            "valid-province",
            "maxlength=1|digits|past-date|future-date|valid-province",
        ] {
            assert!(errors(validation, "").is_empty(), "rules {validation}");
        }
    }

    #[test]
    fn test_required_empty_value() {
        let engine = RuleEngine::new();
        let rules = engine.parse_rules(&spec(true, "digits|valid-province"));
        let result = engine.validate_value_at("", &rules, now());
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec![ErrorKind::MissingValue]);
        assert!(engine.validate_value_at(" ", &rules, now()).contains(&ErrorKind::NonDigits));
    }

    #[test]
    fn test_validate_reads_field_state() {
        let engine = RuleEngine::new();
        let rules = engine.parse_rules(&spec(true, "digits"));
        let mut state = FieldState::new();
        assert!(engine.validate(&state, &rules).contains(&ErrorKind::MissingValue));
        state.value = "42".to_string();
        assert!(engine.validate(&state, &rules).is_empty());
    }
}
