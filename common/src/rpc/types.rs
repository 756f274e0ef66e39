use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::InternalRpcError;

pub const JSON_RPC_VERSION: &str = "2.0";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(serde_json::Number),
    String(String),
}

impl Default for Id {
    fn default() -> Self {
        Self::Number(1.into())
    }
}

// A JSON-RPC call as sent by a client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    // Leniently parse a request body.
    // A missing or unusable `id` is not an error, a missing `method` is.
    pub fn parse(body: &[u8]) -> Result<Self, InternalRpcError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| InternalRpcError::ParseBodyError)?;

        let Value::Object(mut map) = value else {
            return Err(InternalRpcError::InvalidJSONRequest);
        };

        let method = match map.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(InternalRpcError::InvalidRequestStr("method is missing")),
        };

        let jsonrpc = match map.remove("jsonrpc") {
            Some(Value::String(version)) => version,
            _ => JSON_RPC_VERSION.to_string(),
        };

        let id = map
            .remove("id")
            .and_then(|id| serde_json::from_value::<Id>(id).ok());

        let params = map.remove("params").filter(|params| !params.is_null());

        Ok(Self {
            jsonrpc,
            id,
            method,
            params,
        })
    }
}

#[derive(Serialize)]
pub struct RpcResponse<'a> {
    pub jsonrpc: &'a str,
    pub id: Cow<'a, Id>,
    pub result: Cow<'a, Value>,
}

impl<'a> RpcResponse<'a> {
    pub fn new(id: Cow<'a, Id>, result: Cow<'a, Value>) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION,
            id,
            result,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "jsonrpc".to_string(),
            Value::String(self.jsonrpc.to_string()),
        );
        obj.insert(
            "id".to_string(),
            serde_json::to_value(self.id.as_ref()).unwrap_or(Value::Null),
        );
        obj.insert("result".to_string(), self.result.as_ref().clone());
        Value::Object(obj)
    }
}
