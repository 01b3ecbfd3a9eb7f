//! Host values and callables.

use crate::error::SandboxResult;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Result of invoking a [`NativeFunction`]
pub enum NativeCall {
    Ready(SandboxResult<NativeValue>),
    /// Settles later; dropping it abandons the call
    Pending(LocalBoxFuture<'static, SandboxResult<NativeValue>>),
}

impl NativeCall {
    pub async fn resolve(self) -> SandboxResult<NativeValue> {
        match self {
            NativeCall::Ready(result) => result,
            NativeCall::Pending(future) => future.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, NativeCall::Pending(_))
    }
}

type Callable = dyn Fn(NativeValue, Vec<NativeValue>) -> NativeCall;

/// A host function taking `this` and arguments
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    call: Rc<Callable>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(NativeValue, Vec<NativeValue>) -> SandboxResult<NativeValue> + 'static,
    {
        Self {
            name: name.into(),
            call: Rc::new(move |this, args| NativeCall::Ready(function(this, args))),
        }
    }

    pub fn new_async<F, Fut>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(NativeValue, Vec<NativeValue>) -> Fut + 'static,
        Fut: Future<Output = SandboxResult<NativeValue>> + 'static,
    {
        Self {
            name: name.into(),
            call: Rc::new(move |this, args| NativeCall::Pending(Box::pin(function(this, args)))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, this: NativeValue, args: Vec<NativeValue>) -> NativeCall {
        (self.call)(this, args)
    }

    /// Same underlying callable
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.call) as *const (),
            Rc::as_ptr(&other.call) as *const (),
        )
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function {}]", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum NativeValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<NativeValue>),
    Object(BTreeMap<String, NativeValue>),
    Function(NativeFunction),
}

impl NativeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Undefined => "undefined",
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "boolean",
            NativeValue::Number(_) => "number",
            NativeValue::String(_) => "string",
            NativeValue::Array(_) => "array",
            NativeValue::Object(_) => "object",
            NativeValue::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, NativeValue::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, NativeValue)>) -> Self {
        NativeValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// JSON form. Values JSON cannot hold (undefined, functions, non-finite numbers) become null.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            NativeValue::Undefined | NativeValue::Null | NativeValue::Function(_) => Value::Null,
            NativeValue::Bool(value) => Value::Bool(*value),
            NativeValue::Number(number) => serde_json::Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            NativeValue::String(value) => Value::String(value.clone()),
            NativeValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            NativeValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Undefined => f.write_str("undefined"),
            NativeValue::String(value) => f.write_str(value),
            NativeValue::Function(function) => write!(f, "{function:?}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for NativeValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => NativeValue::Null,
            Value::Bool(value) => NativeValue::Bool(value),
            Value::Number(number) => NativeValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => NativeValue::String(value),
            Value::Array(items) => NativeValue::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => NativeValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Number(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        NativeValue::Number(value.into())
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::String(value)
    }
}

impl From<Vec<NativeValue>> for NativeValue {
    fn from(items: Vec<NativeValue>) -> Self {
        NativeValue::Array(items)
    }
}

impl From<BTreeMap<String, NativeValue>> for NativeValue {
    fn from(entries: BTreeMap<String, NativeValue>) -> Self {
        NativeValue::Object(entries)
    }
}

impl From<NativeFunction> for NativeValue {
    fn from(function: NativeFunction) -> Self {
        NativeValue::Function(function)
    }
}

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NativeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(NativeValue::from)
    }
}
