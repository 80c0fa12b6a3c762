//! KBase JSON-RPC 1.1 endpoint
//!
//! Calls arrive as `{"version": "1.1", "method": "GenomeAnnotationFileUtil.<fn>",
//! "params": [arg], "id": ...}` on `POST /`. A successful call answers
//! `{"version": "1.1", "id": ..., "result": [value]}`; a failed one answers
//! HTTP 500 with an `error` object, as KBase SDK servers do.

use crate::api::auth::CallContext;
use crate::features::genome_annotation::commands::{export, upload};
use crate::features::genome_annotation::queries::{download, status};
use crate::features::genome_annotation::GenomeAnnotationError;
use crate::features::FeatureState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

pub const SERVICE_NAME: &str = "GenomeAnnotationFileUtil";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Deserialize)]
struct RpcCall {
    method: String,
    #[serde(default)]
    params: Vec<Value>,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RpcSuccess {
    version: &'static str,
    id: Option<Value>,
    result: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct RpcFailure {
    version: &'static str,
    id: Option<Value>,
    error: RpcErrorBody,
}

#[derive(Debug, Serialize)]
pub struct RpcErrorBody {
    pub name: String,
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
enum RpcFault {
    Parse(String),
    MethodNotFound(String),
    InvalidParams(String),
    Operation(GenomeAnnotationError),
}

impl From<GenomeAnnotationError> for RpcFault {
    fn from(err: GenomeAnnotationError) -> Self {
        Self::Operation(err)
    }
}

impl RpcFault {
    fn into_body(self) -> RpcErrorBody {
        let (name, code, message, detail) = match self {
            RpcFault::Parse(message) => ("JSONRPCError", PARSE_ERROR, message, None),
            RpcFault::MethodNotFound(method) => (
                "JSONRPCError",
                METHOD_NOT_FOUND,
                format!("No such method: {}", method),
                None,
            ),
            RpcFault::InvalidParams(message) => ("JSONRPCError", INVALID_PARAMS, message, None),
            RpcFault::Operation(GenomeAnnotationError::Collaborator(e)) => {
                error!(error = ?e, "Call failed");
                ("ServerError", SERVER_ERROR, format!("{:#}", e), Some(format!("{:?}", e)))
            },
            RpcFault::Operation(e) => {
                warn!(error = %e, "Call rejected");
                ("ValueError", SERVER_ERROR, e.to_string(), None)
            },
        };

        RpcErrorBody {
            name: name.to_string(),
            code,
            message,
            error: detail,
        }
    }
}

pub fn rpc_routes() -> Router<FeatureState> {
    Router::new().route("/", post(dispatch))
}

async fn dispatch(State(state): State<FeatureState>, context: CallContext, body: Bytes) -> Response {
    let call: RpcCall = match serde_json::from_slice(&body) {
        Ok(call) => call,
        Err(e) => return failure(None, RpcFault::Parse(format!("Parse error: {}", e))),
    };

    info!(method = %call.method, "JSON-RPC call");
    match invoke(&state, context.token(), &call).await {
        Ok(result) => (
            StatusCode::OK,
            Json(RpcSuccess {
                version: "1.1",
                id: call.id,
                result: vec![result],
            }),
        )
            .into_response(),
        Err(fault) => failure(call.id, fault),
    }
}

fn failure(id: Option<Value>, fault: RpcFault) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RpcFailure {
            version: "1.1",
            id,
            error: fault.into_body(),
        }),
    )
        .into_response()
}

async fn invoke(state: &FeatureState, token: Option<&str>, call: &RpcCall) -> Result<Value, RpcFault> {
    let function = call
        .method
        .strip_prefix(SERVICE_NAME)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| RpcFault::MethodNotFound(call.method.clone()))?;

    match function {
        "genbank_to_genome_annotation" => {
            to_result(upload::handle(state, token, single_param(call)?).await?)
        },
        "genome_annotation_to_genbank" => {
            to_result(download::handle(state, token, single_param(call)?).await?)
        },
        "export_genome_annotation_as_genbank" => {
            to_result(export::handle(state, token, single_param(call)?).await?)
        },
        "status" => to_result(status::handle()),
        _ => Err(RpcFault::MethodNotFound(call.method.clone())),
    }
}

fn single_param<T: DeserializeOwned>(call: &RpcCall) -> Result<T, RpcFault> {
    let param = call.params.first().ok_or_else(|| {
        RpcFault::InvalidParams(format!("{} takes one parameter object", call.method))
    })?;
    serde_json::from_value(param.clone())
        .map_err(|e| RpcFault::InvalidParams(format!("Invalid parameters for {}: {}", call.method, e)))
}

fn to_result<T: Serialize>(value: T) -> Result<Value, RpcFault> {
    serde_json::to_value(value)
        .map_err(|e| RpcFault::Operation(GenomeAnnotationError::Collaborator(e.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_fault_is_value_error() {
        let body = RpcFault::Operation(GenomeAnnotationError::GenomeNameRequired).into_body();
        assert_eq!(body.name, "ValueError");
        assert_eq!(body.message, "genome_name field was not defined");
        assert!(body.error.is_none());
    }

    #[test]
    fn test_collaborator_fault_is_server_error() {
        let body = RpcFault::Operation(GenomeAnnotationError::Collaborator(
            anyhow::anyhow!("connection refused").context("GenBank upload failed"),
        ))
        .into_body();
        assert_eq!(body.name, "ServerError");
        assert_eq!(body.code, SERVER_ERROR);
        assert_eq!(body.message, "GenBank upload failed: connection refused");
    }

    #[test]
    fn test_single_param_requires_object() {
        let call = RpcCall {
            method: "GenomeAnnotationFileUtil.genbank_to_genome_annotation".to_string(),
            params: vec![],
            id: None,
        };
        let result: Result<Value, _> = single_param(&call);
        assert!(matches!(result, Err(RpcFault::InvalidParams(_))));
    }
}
