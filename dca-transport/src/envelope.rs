//! Status envelope

use serde::Serialize;
use serde::Serializer;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::body::ResponseBody;
use crate::error::Error;

/// The `{status, message?, data?}` object every API response is wrapped in.
///
/// Keys besides the three known ones are kept verbatim. A `status` of `0`
/// means success.
///
/// # Example
///
/// ```
/// use dca_transport::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::from_value(json!({"status": 0, "data": {"balance": "12.5"}})).unwrap();
/// assert!(envelope.is_success());
/// assert_eq!(envelope.data().unwrap()["balance"], "12.5");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    status: i64,
    fields: Map<String, Value>,
}

impl Envelope {
    /// Status of a successful response.
    pub const SUCCESS: i64 = 0;

    /// Wraps a parsed JSON value.
    ///
    /// Fails unless `value` is an object with an integer `status`.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => return Err(Error::malformed_envelope(other.to_string())),
        };
        match fields.get("status").and_then(Value::as_i64) {
            Some(status) => Ok(Self { status, fields }),
            None => Err(Error::malformed_envelope(Value::Object(fields).to_string())),
        }
    }

    /// Wraps a decoded response body.
    pub fn from_body(body: ResponseBody) -> Result<Self, Error> {
        match body {
            ResponseBody::Json(value) => Self::from_value(value),
            other => Err(Error::malformed_envelope(other.to_text_lossy())),
        }
    }

    /// Returns the status.
    pub fn status(&self) -> i64 {
        self.status
    }

    /// Returns `true` if the status is `0`.
    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }

    /// Returns the message, if present and a string.
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }

    /// Returns the payload, if present.
    pub fn data(&self) -> Option<&Value> {
        self.fields.get("data")
    }

    /// Returns any top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Deserializes the payload, treating a missing `data` as `null`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let data = self.data().cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Returns every top-level key.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the envelope as a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for Envelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_keeps_everything() {
        let value = json!({
            "status": 0,
            "message": "ok",
            "data": {"id": "9007199254740993"},
            "traceId": "abc"
        });
        let envelope = Envelope::from_value(value.clone()).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.message(), Some("ok"));
        assert_eq!(envelope.get("traceId"), Some(&json!("abc")));
        assert_eq!(envelope.into_value(), value);
    }

    #[test]
    fn test_rejects_non_envelopes() {
        let samples = [
            json!([1]),
            json!("ok"),
            json!({"data": 1}),
            json!({"status": "0"}),
            json!({"status": 1.5}),
        ];
        for value in samples {
            assert!(matches!(
                Envelope::from_value(value),
                Err(Error::MalformedEnvelope { .. })
            ));
        }
        assert!(Envelope::from_body(ResponseBody::Text("<html>".to_string())).is_err());
        assert!(Envelope::from_body(ResponseBody::Empty).is_err());
    }

    #[test]
    fn test_data_as() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Plan {
            id: String,
            amount: f64,
        }
        let envelope = Envelope::from_value(json!({
            "status": 0,
            "data": {"id": "18446744073709551615", "amount": 25.5}
        }))
        .unwrap();
        assert_eq!(
            envelope.data_as::<Plan>().unwrap(),
            Plan {
                id: "18446744073709551615".to_string(),
                amount: 25.5
            }
        );

        let empty = Envelope::from_value(json!({"status": 0})).unwrap();
        assert_eq!(empty.data_as::<Option<Plan>>().unwrap(), None);
    }

    #[test]
    fn test_serializes_verbatim() {
        let value = json!({"status": 40008, "message": "VIP only"});
        let envelope = Envelope::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&envelope).unwrap(), value);
    }
}
