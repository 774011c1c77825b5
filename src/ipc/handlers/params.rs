use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ServiceError;
use crate::ipc::error::err;
use crate::model::{parse_date, Id};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// `bad_params` naming the offending parameter in `details.param`.
    pub fn bad_param(key: &str, message: impl Into<String>) -> Self {
        Self {
            details: Some(serde_json::json!({ "param": key })),
            ..Self::bad_params(message)
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ServiceError> for HandlerErr {
    fn from(e: ServiceError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

pub fn respond(id: &str, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => crate::ipc::error::ok(id, v),
        Err(e) => e.response(id),
    }
}

/// `{ key: value }` for keys only known at runtime.
pub fn keyed(key: &str, value: impl Serialize) -> Result<Value, HandlerErr> {
    let v = serde_json::to_value(value)
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))?;
    let mut m = serde_json::Map::new();
    m.insert(key.to_string(), v);
    Ok(Value::Object(m))
}

fn as_id(v: &Value) -> Option<Id> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn get_required_id(params: &Value, key: &str) -> Result<Id, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_param(key, format!("missing {}", key)))?;
    match as_id(v) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(HandlerErr::bad_param(
            key,
            format!("{} must be a positive integer", key),
        )),
    }
}

/// Missing, null and 0 all mean "not given".
pub fn get_optional_id(params: &Value, key: &str) -> Result<Option<Id>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match as_id(v) {
            Some(0) => Ok(None),
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(HandlerErr::bad_param(
                key,
                format!("{} must be a positive integer", key),
            )),
        },
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_param(key, format!("missing {}", key)))
}

pub fn get_required_f64(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_param(key, format!("missing {}", key)))?;
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| HandlerErr::bad_param(key, format!("{} must be a number", key)))
}

pub fn get_required_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_date(&raw).map_err(|e| HandlerErr::bad_param(key, e.to_string()))
}

pub fn get_optional_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_date(s)
            .map(Some)
            .map_err(|e| HandlerErr::bad_param(key, e.to_string())),
        Some(_) => Err(HandlerErr::bad_param(
            key,
            format!("{} must be YYYY-MM-DD", key),
        )),
    }
}

pub fn get_object<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_param(key, format!("missing {}", key)))?;
    serde_json::from_value(v.clone())
        .map_err(|e| HandlerErr::bad_param(key, format!("invalid {}: {}", key, e)))
}
