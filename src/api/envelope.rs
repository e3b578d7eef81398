//! The uniform `{err, msg, data}` response wrapper.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{QuqiError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Status; `0` (or any falsy/absent value) means success.
    #[serde(default, deserialize_with = "falsy_code")]
    pub err: i64,
    #[serde(default, deserialize_with = "null_string")]
    pub msg: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn is_success(&self) -> bool {
        self.err == 0
    }

    /// Decode `data` into the endpoint's payload type.
    ///
    /// Ack-only endpoints decode into `serde::de::IgnoredAny`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data).map_err(|e| {
            tracing::debug!("unexpected envelope payload: {}", e);
            QuqiError::InvalidResponse
        })
    }
}

fn falsy_code<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(b),
        Value::Number(n) => n.as_i64().unwrap_or(-1),
        Value::String(s) if s.is_empty() => 0,
        Value::String(s) => s.trim().parse().unwrap_or(-1),
        _ => -1,
    })
}

fn null_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
