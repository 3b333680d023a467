use std::{
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
    sync::Arc,
};

use email_address::EmailAddress;
use referencing::Draft;
use serde_json::{Map, Value};
use uuid_simd::{parse_hyphenated, Out};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
};

/// A format checker. Checkers only see strings; other instance types always
/// pass `format`.
pub trait Format: Send + Sync {
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> Format for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

enum Checker {
    Builtin(fn(&str) -> bool),
    Custom(Arc<dyn Format>),
    /// Unknown format under lenient options: annotation only.
    Unknown,
}

pub(crate) struct FormatEvaluator {
    name: String,
    checker: Checker,
    assert: bool,
}

impl Evaluate for FormatEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if self.assert {
            if let Value::String(item) = instance {
                let valid = match &self.checker {
                    Checker::Builtin(checker) => checker(item),
                    Checker::Custom(checker) => checker.is_valid(item),
                    Checker::Unknown => true,
                };
                if !valid {
                    ctx.error(format!("{instance} is not a \"{}\"", self.name));
                    return Ok(());
                }
            }
        }
        ctx.annotate(Value::String(self.name.clone()));
        Ok(())
    }
}

fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let mut out = 0u32;
        for idx in range {
            if !bytes[idx].is_ascii_digit() {
                return None;
            }
            out = out * 10 + u32::from(bytes[idx] - b'0');
        }
        Some(out)
    };
    let (Some(year), Some(month), Some(day)) = (digits(0..4), digits(5..7), digits(8..10)) else {
        return false;
    };
    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return false,
    };
    day >= 1 && day <= max_day
}

fn is_valid_time(time: &str) -> bool {
    let bytes = time.as_bytes();
    if bytes.len() < 9 {
        return false;
    }
    let two = |idx: usize| -> Option<u32> {
        if bytes[idx].is_ascii_digit() && bytes[idx + 1].is_ascii_digit() {
            Some(u32::from(bytes[idx] - b'0') * 10 + u32::from(bytes[idx + 1] - b'0'))
        } else {
            None
        }
    };
    if bytes[2] != b':' || bytes[5] != b':' {
        return false;
    }
    let (Some(hour), Some(minute), Some(second)) = (two(0), two(3), two(6)) else {
        return false;
    };
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    let mut rest = &time[8..];
    if let Some(fraction) = rest.strip_prefix('.') {
        let digits = fraction.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        rest = &fraction[digits..];
    }
    match rest {
        "Z" | "z" => true,
        _ => {
            let Some(sign) = rest.strip_prefix(['+', '-']) else {
                return false;
            };
            let bytes = sign.as_bytes();
            bytes.len() == 5
                && bytes[2] == b':'
                && bytes[0].is_ascii_digit()
                && bytes[1].is_ascii_digit()
                && bytes[3].is_ascii_digit()
                && bytes[4].is_ascii_digit()
                && (u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0')) <= 23
                && (u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0')) <= 59
        }
    }
}

fn is_valid_datetime(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value).is_ok()
        || value
            .get(..10)
            .zip(value.get(11..))
            .is_some_and(|(date, time)| {
                // Leap seconds are valid RFC 3339 but not chrono.
                matches!(value.as_bytes().get(10), Some(b'T' | b't'))
                    && is_valid_date(date)
                    && is_valid_time(time)
            })
}

fn is_valid_hostname(hostname: &str) -> bool {
    !(hostname.ends_with('-')
        || hostname.starts_with('-')
        || hostname.is_empty()
        || bytecount::num_chars(hostname.as_bytes()) > 255
        || hostname
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        || hostname
            .split('.')
            .any(|part| part.is_empty() || bytecount::num_chars(part.as_bytes()) > 63))
}

fn is_valid_email(email: &str) -> bool {
    let Ok(parsed) = EmailAddress::from_str(email) else {
        return false;
    };
    let domain = parsed.domain();
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        if let Some(address) = literal.strip_prefix("IPv6:") {
            address.parse::<Ipv6Addr>().is_ok()
        } else {
            literal.parse::<Ipv4Addr>().is_ok()
        }
    } else {
        is_valid_hostname(domain)
    }
}

fn is_valid_idn_email(email: &str) -> bool {
    let Ok(parsed) = EmailAddress::from_str(email) else {
        return false;
    };
    idna::domain_to_ascii(parsed.domain()).is_ok()
}

fn is_valid_uuid(value: &str) -> bool {
    let mut out = [0_u8; 16];
    parse_hyphenated(value.as_bytes(), Out::from_mut(&mut out)).is_ok()
}

fn builtin(draft: Draft, name: &str) -> Option<fn(&str) -> bool> {
    match name {
        "date" => Some(is_valid_date),
        "date-time" => Some(is_valid_datetime),
        "time" => Some(is_valid_time),
        "email" => Some(is_valid_email),
        "idn-email" => Some(is_valid_idn_email),
        "hostname" => Some(is_valid_hostname),
        "idn-hostname" => Some(|value| idna::domain_to_ascii(value).is_ok()),
        "ipv4" => Some(|value| value.parse::<Ipv4Addr>().is_ok()),
        "ipv6" => Some(|value| value.parse::<Ipv6Addr>().is_ok()),
        "uri" => Some(|value| referencing::Uri::<&str>::parse(value).is_ok()),
        "uri-reference" => Some(|value| referencing::UriRef::<&str>::parse(value).is_ok()),
        "iri" => Some(|value| referencing::Iri::<&str>::parse(value).is_ok()),
        "iri-reference" => Some(|value| referencing::IriRef::<&str>::parse(value).is_ok()),
        "json-pointer" => Some(|value| crate::pointer::JsonPointer::parse(value).is_ok()),
        "relative-json-pointer" => {
            Some(|value| crate::pointer::RelativeJsonPointer::parse(value).is_ok())
        }
        "regex" => Some(|value| fancy_regex::Regex::new(value).is_ok()),
        "uuid" if draft >= Draft::Draft201909 => Some(is_valid_uuid),
        "duration" if draft >= Draft::Draft201909 => {
            Some(|value| iso8601::duration(value).is_ok())
        }
        _ => None,
    }
}

#[inline]
pub(crate) fn compile(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    let Some(name) = value.as_str() else {
        return Some(Err(ctx.malformed("the value of 'format' must be a string")));
    };
    let checker = if let Some(custom) = ctx.config().get_format(name) {
        Checker::Custom(Arc::clone(custom))
    } else if let Some(builtin) = builtin(ctx.draft(), name) {
        Checker::Builtin(builtin)
    } else if ctx.config().ignore_unknown_formats {
        Checker::Unknown
    } else {
        return Some(Err(EvaluationError::unknown_format(name)));
    };
    let assert = ctx.config().validate_formats.unwrap_or(match ctx.draft() {
        Draft::Draft6 | Draft::Draft7 => true,
        Draft::Draft201909 => ctx.has_vocabulary(&referencing::Vocabulary::Format),
        _ => ctx.has_vocabulary(&referencing::Vocabulary::FormatAssertion),
    });
    Some(Ok(Box::new(FormatEvaluator {
        name: name.to_string(),
        checker,
        assert,
    })))
}

#[cfg(test)]
mod tests {
    use super::{is_valid_date, is_valid_datetime, is_valid_email, is_valid_time};
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case("2023-02-28", true)]
    #[test_case("2024-02-29", true; "leap year")]
    #[test_case("2023-02-29", false; "not a leap year")]
    #[test_case("2023-13-01", false)]
    #[test_case("2023-1-01", false; "months are zero padded")]
    fn dates(value: &str, expected: bool) {
        assert_eq!(is_valid_date(value), expected);
    }

    #[test_case("12:34:56Z", true)]
    #[test_case("12:34:56.789+02:30", true)]
    #[test_case("23:59:60Z", true; "leap second")]
    #[test_case("24:00:00Z", false)]
    #[test_case("12:34:56", false; "offset is required")]
    #[test_case("12:34:56.+00:00", false; "empty fraction")]
    fn times(value: &str, expected: bool) {
        assert_eq!(is_valid_time(value), expected);
    }

    #[test_case("2023-02-28T12:34:56Z", true)]
    #[test_case("1990-12-31T23:59:60Z", true; "leap second")]
    #[test_case("2023-02-28 12:34:56Z", false; "space separator")]
    fn datetimes(value: &str, expected: bool) {
        assert_eq!(is_valid_datetime(value), expected);
    }

    #[test_case("joe.bloggs@example.com", true)]
    #[test_case("joe.bloggs@[127.0.0.1]", true; "address literal")]
    #[test_case("not-an-email", false)]
    fn emails(value: &str, expected: bool) {
        assert_eq!(is_valid_email(value), expected);
    }

    // Draft 7 asserts formats by default.
    fn draft7(format: &str) -> Value {
        json!({"$schema": "http://json-schema.org/draft-07/schema#", "format": format})
    }

    #[test_case("ipv4", "127.0.0.1")]
    #[test_case("ipv6", "::1")]
    #[test_case("uri", "https://example.com/path")]
    #[test_case("json-pointer", "/a/b")]
    #[test_case("relative-json-pointer", "1/a")]
    #[test_case("regex", "^a+$")]
    #[test_case("hostname", "example.com")]
    fn format_accepts(format: &str, instance: &str) {
        tests_util::is_valid(&draft7(format), &json!(instance));
    }

    #[test_case("ipv4", "2001:db8::1")]
    #[test_case("ipv4", "127.0.0.01"; "leading zeros")]
    #[test_case("ipv6", "12345::")]
    #[test_case("json-pointer", "a/b")]
    #[test_case("regex", "(unclosed")]
    fn format_rejects(format: &str, instance: &str) {
        tests_util::is_not_valid(&draft7(format), &json!(instance));
    }

    #[test]
    fn error_message() {
        tests_util::expect_error_message(
            &draft7("ipv4"),
            &json!("2001:0db8:85a3:0000:0000:8a2e:0370:7334"),
            r#""2001:0db8:85a3:0000:0000:8a2e:0370:7334" is not a "ipv4""#,
        );
    }

    #[test]
    fn annotates_under_2020_12_by_default() {
        // The format-annotation vocabulary records the format but asserts
        // nothing.
        let result = tests_util::evaluate(&json!({"format": "ipv4"}), &json!("not an ip"));
        assert!(result.valid());
        assert_eq!(result.root().annotation("format"), Some(&json!("ipv4")));
    }

    #[test]
    fn forced_assertion() {
        let evaluator = crate::options()
            .require_format_validation(true)
            .build(&json!({"format": "ipv4"}))
            .expect("Valid schema");
        assert!(!evaluator.evaluate(&json!("not an ip")).expect("Evaluates").valid());
    }

    #[test]
    fn unknown_formats_pass_by_default() {
        tests_util::is_valid(&draft7("unknown-format"), &json!("anything"));
    }

    #[test]
    fn strict_unknown_formats() {
        let error = crate::options()
            .only_known_formats(true)
            .build(&json!({"format": "unknown-format"}))
            .expect_err("Unknown format under strict options");
        assert!(matches!(error, crate::EvaluationError::UnknownFormat { .. }));
    }

    #[test]
    fn custom_format() {
        let evaluator = crate::options()
            .require_format_validation(true)
            .with_format("ends-with-42", |value: &str| value.ends_with("42"))
            .build(&json!({"format": "ends-with-42"}))
            .expect("Valid schema");
        assert!(evaluator.evaluate(&json!("x42")).expect("Evaluates").valid());
        assert!(!evaluator.evaluate(&json!("x43")).expect("Evaluates").valid());
    }
}
