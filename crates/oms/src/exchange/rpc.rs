use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    pub id: u64,
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P> RpcRequest<'a, P>
where
    P: Serialize,
{
    pub fn new(method: &'a str, params: P) -> Self {
        Self {
            id: 0,
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

/// Decodes a response body into its `result`, mapping an `error` object to
/// [`Error::Rpc`].
pub fn decode<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::Parse("empty response body".into()));
    }

    let response: RpcResponse<T> = serde_json::from_slice(body)?;
    match (response.result, response.error) {
        (_, Some(RpcErrorBody { code, message })) => Err(Error::Rpc { code, message }),
        (Some(result), None) => Ok(result),
        (None, None) => Err(Error::Parse(
            "response carries neither result nor error".into(),
        )),
    }
}
