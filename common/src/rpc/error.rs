use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InternalRpcError {
    #[error("Invalid body in request")]
    ParseBodyError,
    #[error("Invalid JSON request")]
    InvalidJSONRequest,
    #[error("Invalid request: {}", _0)]
    InvalidRequestStr(&'static str),
    // Custom errors must have a code between -3 and -31999, or in the
    // server-error range -32000 to -32099
    #[error("{}", _1)]
    Custom(i16, String),
}

impl InternalRpcError {
    pub fn get_code(&self) -> i16 {
        match self {
            // JSON RPC errors
            Self::ParseBodyError => -32700,
            Self::InvalidJSONRequest | Self::InvalidRequestStr(_) => -32600,
            // Custom errors
            Self::Custom(code, _) => *code,
        }
    }

    // Build the `{ code, message }` object carried by a JSON-RPC error
    pub fn to_error_object(&self) -> Value {
        let mut error_obj = serde_json::Map::new();
        error_obj.insert("code".to_string(), Value::Number(self.get_code().into()));
        error_obj.insert("message".to_string(), Value::String(format!("{:#}", self)));
        Value::Object(error_obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(InternalRpcError::ParseBodyError.get_code(), -32700);
        assert_eq!(InternalRpcError::InvalidJSONRequest.get_code(), -32600);
        assert_eq!(
            InternalRpcError::InvalidRequestStr("method is missing").get_code(),
            -32600
        );
        assert_eq!(
            InternalRpcError::Custom(-32000, "Insufficient gas".into()).get_code(),
            -32000
        );
    }

    #[test]
    fn test_error_object() {
        let error = InternalRpcError::Custom(-32000, "Insufficient gas".into());
        assert_eq!(
            error.to_error_object(),
            json!({ "code": -32000, "message": "Insufficient gas" })
        );
    }
}
