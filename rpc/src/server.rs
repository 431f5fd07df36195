//! HTTP routing for the binary endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use cuprate_epee_encoding::{from_bytes, to_bytes, EpeeObject};
use tracing::{debug, error};

use crate::{
    handler::{BlocksHandler, HandlerError},
    types::{GetBlocksRequest, GetBlocksResponse, SupportedVersionsResponse},
};

pub const GET_BLOCKS_URI: &str = "/fastsync.bin";
pub const VERSIONS_URI: &str = "/fastsync_versions.bin";

/// Protocol versions this server speaks, newest first.
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// The application router serving both endpoints.
pub fn router(handler: Arc<BlocksHandler>) -> Router {
    Router::new()
        .route(GET_BLOCKS_URI, post(get_blocks))
        .route(VERSIONS_URI, post(versions).get(versions))
        .with_state(handler)
}

async fn get_blocks(State(handler): State<Arc<BlocksHandler>>, body: Bytes) -> Response {
    debug!(uri = GET_BLOCKS_URI, "incoming request");

    let request: GetBlocksRequest = match from_bytes(&mut body.clone()) {
        Ok(request) => request,
        Err(e) => {
            error!("failed to parse get blocks request: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if !SUPPORTED_VERSIONS.contains(&request.version) {
        error!(version = request.version, "unsupported version");
        return StatusCode::BAD_REQUEST.into_response();
    }

    match handler.get_blocks(&request.params).await {
        Ok(result) => encode_response(
            StatusCode::OK,
            GetBlocksResponse {
                status: "ok".into(),
                result,
            },
        ),
        Err(e) => {
            error!("failed to process {GET_BLOCKS_URI} request: {e}");

            let code = match e {
                HandlerError::Request => StatusCode::BAD_REQUEST,
                HandlerError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            };
            encode_response(
                code,
                GetBlocksResponse {
                    status: e.to_string(),
                    ..Default::default()
                },
            )
        }
    }
}

async fn versions() -> Response {
    debug!(uri = VERSIONS_URI, "incoming request");

    encode_response(
        StatusCode::OK,
        SupportedVersionsResponse {
            versions: SUPPORTED_VERSIONS.to_vec(),
        },
    )
}

fn encode_response<T: EpeeObject>(code: StatusCode, body: T) -> Response {
    match to_bytes(body) {
        Ok(bytes) => (code, bytes.freeze()).into_response(),
        Err(e) => {
            error!("failed to serialize response: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
