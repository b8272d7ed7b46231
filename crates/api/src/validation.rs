//! Declarative field rules for JSON request bodies.
//!
//! Every rule of every field is evaluated; failures are collected in field
//! order and reported together.

use std::str::FromStr;

use cashtrackr_core::budget::fits_amount_column;
use cashtrackr_shared::FieldError;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use validator::ValidateEmail;

/// A single check applied to a field, with the message reported on failure.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Value is present and not the empty string.
    NotEmpty(&'static str),
    /// At least this many characters.
    MinLength(usize, &'static str),
    /// Exactly this many characters.
    Length(usize, &'static str),
    /// Well-formed email address.
    Email(&'static str),
    /// Decimal number, optionally signed, that an amount column stores
    /// without rounding (at most 10 integer digits and 2 decimals).
    Numeric(&'static str),
    /// Number strictly greater than zero.
    Positive(&'static str),
}

impl Rule {
    fn message(self) -> &'static str {
        match self {
            Self::NotEmpty(msg)
            | Self::MinLength(_, msg)
            | Self::Length(_, msg)
            | Self::Email(msg)
            | Self::Numeric(msg)
            | Self::Positive(msg) => msg,
        }
    }

    fn accepts(self, text: &str) -> bool {
        match self {
            Self::NotEmpty(_) => !text.is_empty(),
            Self::MinLength(min, _) => text.chars().count() >= min,
            Self::Length(len, _) => text.chars().count() == len,
            Self::Email(_) => text.validate_email(),
            Self::Numeric(_) => is_numeric(text),
            Self::Positive(_) => parse_decimal(text).is_some_and(|d| d > Decimal::ZERO),
        }
    }
}

/// The rules declared for one body field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// JSON key.
    pub name: &'static str,
    /// Rules, evaluated in order without short-circuiting.
    pub rules: &'static [Rule],
}

/// A request body that declares its field rules.
pub trait RequestBody: Sized {
    /// Field rules for this body.
    const FIELDS: &'static [Field];

    /// Builds the body from a JSON object that passed every rule.
    fn from_body(body: &Body) -> Self;
}

/// A parsed JSON object body.
#[derive(Debug, Default)]
pub struct Body(Map<String, Value>);

impl Body {
    /// Parses raw request bytes. An empty or non-object payload is treated
    /// as an object with no fields.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }

    /// Runs `fields` and returns every failure.
    #[must_use]
    pub fn check(&self, fields: &[Field]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for field in fields {
            let value = self
                .0
                .get(field.name)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            let text = as_text(&value);
            for rule in field.rules {
                if !rule.accepts(&text) {
                    errors.push(FieldError::body(field.name, value.clone(), rule.message()));
                }
            }
        }
        errors
    }

    /// Returns a field as text; absent fields are empty.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.0.get(name).map(as_text).unwrap_or_default()
    }

    /// Returns a numeric field as a decimal; unparseable values are zero.
    #[must_use]
    pub fn decimal(&self, name: &str) -> Decimal {
        parse_decimal(&self.text(name)).unwrap_or_default()
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Splits `[+-]?([0-9]*\.)?[0-9]+` into sign, integer and fraction parts.
fn numeric_parts(text: &str) -> Option<(&str, &str, &str)> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or(("", digits));
    let valid = !frac_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    valid.then_some((sign, int_part, frac_part))
}

fn is_numeric(text: &str) -> bool {
    parse_decimal(text).is_some_and(fits_amount_column)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let (sign, int_part, frac_part) = numeric_parts(text)?;
    let normalized = match (text.contains('.'), int_part.is_empty()) {
        (true, true) => format!("{sign}0.{frac_part}"),
        (true, false) => format!("{sign}{int_part}.{frac_part}"),
        (false, _) => format!("{sign}{frac_part}"),
    };
    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    const AMOUNT: &[Field] = &[Field {
        name: "amount",
        rules: &[
            Rule::NotEmpty("empty"),
            Rule::Numeric("numeric"),
            Rule::Positive("positive"),
        ],
    }];

    fn body(value: &Value) -> Body {
        Body::parse(value.to_string().as_bytes())
    }

    fn messages(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.msg.as_str()).collect()
    }

    #[rstest]
    #[case("4000", true)]
    #[case("-3.5", true)]
    #[case("+.5", true)]
    #[case("10.", false)]
    #[case("1e3", false)]
    #[case("", false)]
    #[case("abc", false)]
    #[case("1.2.3", false)]
    #[case("0.001", false)]
    #[case("1.500", true)]
    #[case("9999999999.99", true)]
    #[case("10000000000", false)]
    #[case("-10000000000", false)]
    fn test_is_numeric(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_numeric(text), expected);
    }

    #[test]
    fn test_missing_amount_fails_every_rule() {
        let errors = Body::default().check(AMOUNT);

        assert_eq!(messages(&errors), ["empty", "numeric", "positive"]);
        assert_eq!(errors[0].value, json!(""));
    }

    #[rstest]
    #[case(json!({"amount": 4000}), &[] as &[&str])]
    #[case(json!({"amount": "250.75"}), &[])]
    #[case(json!({"amount": 0}), &["positive"])]
    #[case(json!({"amount": -10}), &["positive"])]
    #[case(json!({"amount": "abc"}), &["numeric", "positive"])]
    #[case(json!({"amount": true}), &["numeric", "positive"])]
    #[case(json!({"amount": "0.001"}), &["numeric"])]
    #[case(json!({"amount": 0.001}), &["numeric"])]
    #[case(json!({"amount": 10_000_000_000_u64}), &["numeric"])]
    fn test_amount_rules(#[case] payload: Value, #[case] expected: &[&str]) {
        assert_eq!(messages(&body(&payload).check(AMOUNT)), expected);
    }

    #[test]
    fn test_field_error_keeps_received_value() {
        let errors = body(&json!({"amount": -10})).check(AMOUNT);

        assert_eq!(errors[0].value, json!(-10));
        assert_eq!(errors[0].path, "amount");
    }

    #[rstest]
    #[case("correo@correo.com", true)]
    #[case("not_valid_email", false)]
    #[case("", false)]
    fn test_email_rule(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(Rule::Email("bad").accepts(email), valid);
    }

    #[test]
    fn test_length_rules_count_characters() {
        assert!(Rule::Length(6, "x").accepts("123456"));
        assert!(!Rule::Length(6, "x").accepts("12345"));
        assert!(Rule::MinLength(8, "x").accepts("contraseña"));
        assert!(!Rule::MinLength(8, "x").accepts("corto"));
    }

    #[rstest]
    #[case("+.5", "0.5")]
    #[case("-.25", "-0.25")]
    #[case("4000", "4000")]
    #[case("80.50", "80.50")]
    fn test_parse_decimal(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_decimal(text), Decimal::from_str(expected).ok());
    }

    #[test]
    fn test_malformed_payload_is_empty_object() {
        let body = Body::parse(b"{not json");

        assert_eq!(body.text("name"), "");
        assert_eq!(body.decimal("amount"), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn positive_integers_pass_all_amount_rules(n in 1u64..10_000_000_000) {
            let errors = body(&json!({ "amount": n })).check(AMOUNT);
            prop_assert!(errors.is_empty());
        }

        #[test]
        fn non_positive_integers_fail_only_positive(n in -9_999_999_999i64..=0) {
            let errors = body(&json!({ "amount": n })).check(AMOUNT);
            prop_assert_eq!(messages(&errors), vec!["positive"]);
        }
    }
}
