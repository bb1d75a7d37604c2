//! Extraction and validation of the birth details sent to /generate-story
//!
//! The body is inspected as an untyped JSON value so that a wrongly-typed field yields its own
//! message rather than failing the whole decode. Every field is checked on every request and each
//! failing field contributes exactly one message.
use crate::errors::ValidationErrors;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Birth details that passed validation. Values are kept exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRequest {
    pub baby_name: String,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_city: String,
    pub approximate_time: bool,
}

const INVALID_NAME: &str = "Missing or invalid babyName";
const INVALID_DATE: &str = "Missing or invalid birthDate (expected YYYY-MM-DD)";
const INVALID_TIME: &str = "Missing or invalid birthTime (expected HH:MM)";
const INVALID_CITY: &str = "Missing or invalid birthCity";
const INVALID_APPROXIMATE: &str = "Invalid approximateTime (expected boolean)";

// Format only: `2024-13-99` and `99:99` pass. `(?-u:\d)` keeps `\d` to ASCII digits.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?-u:\d){4}-(?-u:\d){2}-(?-u:\d){2}$").expect("birthDate pattern is valid")
});
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?-u:\d){2}:(?-u:\d){2}$").expect("birthTime pattern is valid")
});

/// Validates a decoded request body.
///
/// A body that is not a JSON object is treated as an object with no fields.
pub fn validate_birth_request(body: &Value) -> Result<BirthRequest, ValidationErrors> {
    let field = |name: &str| body.as_object().and_then(|map| map.get(name));
    let mut errors = Vec::new();

    let baby_name = non_blank_string(field("babyName"));
    if baby_name.is_none() {
        errors.push(INVALID_NAME.to_string());
    }

    let birth_date = patterned_string(field("birthDate"), &DATE_PATTERN);
    if birth_date.is_none() {
        errors.push(INVALID_DATE.to_string());
    }

    let birth_time = patterned_string(field("birthTime"), &TIME_PATTERN);
    if birth_time.is_none() {
        errors.push(INVALID_TIME.to_string());
    }

    let birth_city = non_blank_string(field("birthCity"));
    if birth_city.is_none() {
        errors.push(INVALID_CITY.to_string());
    }

    let approximate_time = field("approximateTime").and_then(Value::as_bool);
    if approximate_time.is_none() {
        errors.push(INVALID_APPROXIMATE.to_string());
    }

    match (baby_name, birth_date, birth_time, birth_city, approximate_time) {
        (
            Some(baby_name),
            Some(birth_date),
            Some(birth_time),
            Some(birth_city),
            Some(approximate_time),
        ) if errors.is_empty() => Ok(BirthRequest {
            baby_name: baby_name.to_string(),
            birth_date: birth_date.to_string(),
            birth_time: birth_time.to_string(),
            birth_city: birth_city.to_string(),
            approximate_time,
        }),
        _ => Err(ValidationErrors::new(errors)),
    }
}

fn non_blank_string(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn patterned_string<'a>(value: Option<&'a Value>, pattern: &Regex) -> Option<&'a str> {
    value
        .and_then(Value::as_str)
        .filter(|s| pattern.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "babyName": "Mia",
            "birthDate": "2023-05-10",
            "birthTime": "14:30",
            "birthCity": "Austin",
            "approximateTime": false
        })
    }

    fn with_field(name: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[name] = value;
        body
    }

    fn without_field(name: &str) -> Value {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(name);
        body
    }

    #[test]
    fn test_valid_request_is_accepted_verbatim() {
        let request = validate_birth_request(&valid_body()).unwrap();
        assert_eq!(
            request,
            BirthRequest {
                baby_name: "Mia".into(),
                birth_date: "2023-05-10".into(),
                birth_time: "14:30".into(),
                birth_city: "Austin".into(),
                approximate_time: false,
            }
        );
    }

    #[test]
    fn test_accepted_values_are_not_trimmed() {
        let body = with_field("babyName", json!("  Mia "));
        let request = validate_birth_request(&body).unwrap();
        assert_eq!(request.baby_name, "  Mia ");
    }

    #[rstest]
    #[case("2024-02-29", true)]
    #[case("2024-13-99", true)]
    #[case("2024-2-29", false)]
    #[case("2024-02-29T00:00", false)]
    #[case(" 2024-02-29", false)]
    #[case("2024/02/29", false)]
    #[case("２０２４-02-29", false)]
    #[case("", false)]
    fn test_birth_date_format(#[case] date: &str, #[case] accepted: bool) {
        let result = validate_birth_request(&with_field("birthDate", json!(date)));
        assert_eq!(result.is_ok(), accepted, "birthDate {date:?}");
        if let Err(errors) = result {
            assert_eq!(errors.messages, vec![INVALID_DATE.to_string()]);
        }
    }

    #[rstest]
    #[case("08:05", true)]
    #[case("25:61", true)]
    #[case("99:99", true)]
    #[case("8:5", false)]
    #[case("08:05:00", false)]
    #[case("08-05", false)]
    fn test_birth_time_format(#[case] time: &str, #[case] accepted: bool) {
        let result = validate_birth_request(&with_field("birthTime", json!(time)));
        assert_eq!(result.is_ok(), accepted, "birthTime {time:?}");
        if let Err(errors) = result {
            assert_eq!(errors.messages, vec![INVALID_TIME.to_string()]);
        }
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!(false), true)]
    #[case(json!("true"), false)]
    #[case(json!(1), false)]
    #[case(Value::Null, false)]
    fn test_approximate_time_must_be_boolean(#[case] value: Value, #[case] accepted: bool) {
        let result = validate_birth_request(&with_field("approximateTime", value));
        assert_eq!(result.is_ok(), accepted);
    }

    #[rstest]
    #[case("babyName", INVALID_NAME)]
    #[case("birthDate", INVALID_DATE)]
    #[case("birthTime", INVALID_TIME)]
    #[case("birthCity", INVALID_CITY)]
    #[case("approximateTime", INVALID_APPROXIMATE)]
    fn test_each_missing_field_yields_exactly_one_message(
        #[case] field: &str,
        #[case] expected: &str,
    ) {
        let errors = validate_birth_request(&without_field(field)).unwrap_err();
        assert_eq!(errors.messages, vec![expected.to_string()]);
    }

    #[test]
    fn test_blank_and_non_string_names_are_rejected() {
        for value in [json!(""), json!("   \t"), json!(42), json!(["Mia"])] {
            let errors = validate_birth_request(&with_field("babyName", value)).unwrap_err();
            assert_eq!(errors.messages, vec![INVALID_NAME.to_string()]);
        }
    }

    #[test]
    fn test_all_defects_are_reported_in_field_order() {
        let body = json!({
            "babyName": " ",
            "birthDate": "10/05/2023",
            "birthTime": "14:30",
            "birthCity": 7,
            "approximateTime": "no"
        });

        let errors = validate_birth_request(&body).unwrap_err();
        assert_eq!(
            errors.messages,
            vec![
                INVALID_NAME.to_string(),
                INVALID_DATE.to_string(),
                INVALID_CITY.to_string(),
                INVALID_APPROXIMATE.to_string(),
            ]
        );
        assert_eq!(
            errors.to_string(),
            format!(
                "Validation failed: {INVALID_NAME}, {INVALID_DATE}, {INVALID_CITY}, {INVALID_APPROXIMATE}"
            )
        );
    }

    #[test]
    fn test_non_object_body_reports_every_field() {
        for body in [json!([]), json!("hello"), Value::Null, json!({})] {
            let errors = validate_birth_request(&body).unwrap_err();
            assert_eq!(errors.messages.len(), 5, "body {body}");
        }
    }
}
