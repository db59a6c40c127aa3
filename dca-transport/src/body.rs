//! Response body decoding
//!
//! The backend hands out 64-bit identifiers as bare JSON integers. Anything
//! past 2^53 - 1 cannot round-trip through an `f64`, so those literals are
//! kept as decimal strings instead.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

/// Largest integer an `f64` represents exactly, as digits.
const MAX_SAFE_INTEGER: &str = "9007199254740991";

/// A response body at some stage of decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// Raw text, not (yet) parsed.
    Text(String),
    /// Bytes that are not UTF-8 text, such as captcha images.
    Binary(Vec<u8>),
    /// Parsed JSON.
    Json(Value),
}

impl ResponseBody {
    /// Returns the parsed JSON, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the raw text, if the body was not parsed.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if there is no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Renders the body as text for error reports.
    pub fn to_text_lossy(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Parses a text body as JSON, keeping unsafe integers as strings.
///
/// Empty, binary and already-parsed bodies are returned unchanged, and so is
/// text that is not valid JSON. This never fails.
///
/// # Example
///
/// ```
/// use dca_transport::body::{parse_body, ResponseBody};
/// use serde_json::json;
///
/// let body = parse_body(ResponseBody::Text(r#"{"id": 9007199254740993}"#.into()));
/// assert_eq!(body, ResponseBody::Json(json!({"id": "9007199254740993"})));
///
/// let body = parse_body(ResponseBody::Text("not json".into()));
/// assert_eq!(body, ResponseBody::Text("not json".into()));
/// ```
pub fn parse_body(body: ResponseBody) -> ResponseBody {
    match body {
        ResponseBody::Text(text) => match parse_json_preserving(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(e) => {
                log::trace!("body is not JSON, keeping text: {}", e);
                ResponseBody::Text(text)
            }
        },
        other => other,
    }
}

/// Strictly parses `text` as JSON, keeping unsafe integers as strings.
pub fn parse_json_preserving(text: &str) -> Result<Value, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(preserve_integers(value))
}

fn preserve_integers(value: Value) -> Value {
    match value {
        Value::Number(number) => match unsafe_integer_literal(&number) {
            Some(literal) => Value::String(literal),
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(preserve_integers).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, preserve_integers(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Returns the literal of an integer whose magnitude exceeds 2^53 - 1.
fn unsafe_integer_literal(number: &Number) -> Option<String> {
    // Numbers keep their source text, so the literal is exact.
    let literal = number.to_string();
    let digits = literal.strip_prefix('-').unwrap_or(&literal);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let unsafe_magnitude = match digits.len().cmp(&MAX_SAFE_INTEGER.len()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => digits > MAX_SAFE_INTEGER,
        std::cmp::Ordering::Less => false,
    };
    unsafe_magnitude.then_some(literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordinary_json_round_trips() {
        let text = r#"{"status":0,"data":{"list":[1,2.5,-3],"name":"btc","note":null}}"#;
        let body = parse_body(ResponseBody::Text(text.to_string()));
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body, ResponseBody::Json(expected));
    }

    #[test]
    fn test_json_safe_values_round_trip() {
        let samples = [
            "42",
            "-17",
            "0",
            "3.14",
            "-2.5e-3",
            "1e3",
            "9007199254740991",
            "-9007199254740991",
            r#""plain""#,
            r#""Bitcoin \u00e9 \"quoted\" \\ back\nslash""#,
            r#""定投 🚀""#,
            "true",
            "false",
            "null",
            "{}",
            "[]",
            r#"{"a":{}, "b":[], "c":[[]]}"#,
            r#"[{"id":1,"tags":["x","y"]},{"id":2,"tags":[]},{"nested":[{"deep":{"n":-1.5}}]}]"#,
        ];

        for text in samples {
            let expected: Value = serde_json::from_str(text).unwrap();
            let body = parse_body(ResponseBody::Text(text.to_string()));
            assert_eq!(body, ResponseBody::Json(expected.clone()), "{}", text);

            let reencoded = serde_json::to_string(&expected).unwrap();
            assert_eq!(parse_json_preserving(&reencoded).unwrap(), expected, "{}", text);
        }
    }

    #[test]
    fn test_unsafe_integers_become_strings() {
        let value = parse_json_preserving(
            r#"{"id": 9007199254740993, "neg": -9007199254740993, "huge": 1234567890123456789012}"#,
        )
        .unwrap();
        assert_eq!(value["id"], json!("9007199254740993"));
        assert_eq!(value["neg"], json!("-9007199254740993"));
        assert_eq!(value["huge"], json!("1234567890123456789012"));
    }

    #[test]
    fn test_safe_integers_stay_numbers() {
        let text = r#"[9007199254740991, -9007199254740991, 42, 1.5e300, 12345678901234567.5]"#;
        let value = parse_json_preserving(text).unwrap();
        let items = value.as_array().unwrap();
        assert!(items.iter().all(Value::is_number));
        assert_eq!(items[0].as_i64(), Some(9007199254740991));
    }

    #[test]
    fn test_nested_unsafe_integers() {
        let value = parse_json_preserving(r#"{"orders":[{"id":18446744073709551615}]}"#).unwrap();
        assert_eq!(value["orders"][0]["id"], json!("18446744073709551615"));
    }

    #[test]
    fn test_non_text_bodies_unchanged() {
        assert_eq!(parse_body(ResponseBody::Empty), ResponseBody::Empty);
        let binary = ResponseBody::Binary(vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(parse_body(binary.clone()), binary);
        let json = ResponseBody::Json(json!({"id": 1}));
        assert_eq!(parse_body(json.clone()), json);
    }

    #[test]
    fn test_invalid_json_text_unchanged() {
        for text in ["not json", "", "{\"a\":", "{'a': 1}"] {
            assert_eq!(
                parse_body(ResponseBody::Text(text.to_string())),
                ResponseBody::Text(text.to_string())
            );
        }
    }

    #[test]
    fn test_to_text_lossy() {
        assert_eq!(ResponseBody::Empty.to_text_lossy(), "");
        assert_eq!(ResponseBody::Json(json!({"a": 1})).to_text_lossy(), r#"{"a":1}"#);
    }
}
