//! Client HTTP surface.

use crate::ingress::{CommandIngress, WriteReply};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use kvdb_core::{ConsensusGateway, KeyValueStore, MAX_COMMAND_BYTES, MSGPACK_CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const NOT_FOUND_BODY: &str = "404 Not Found";

/// Content types accepted on `/insert-val`
const MSGPACK_CONTENT_TYPES: [&str; 2] = [MSGPACK_CONTENT_TYPE, "application/x-msgpack"];

/// HTTP routes
pub fn create_router<S, G>(ingress: Arc<CommandIngress<S, G>>) -> Router
where
    S: KeyValueStore + 'static,
    G: ConsensusGateway + 'static,
{
    Router::new()
        .route("/insert-val", post(insert_val::<S, G>).fallback(not_found))
        .route("/get-val", get(get_val::<S, G>).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_COMMAND_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(ingress)
}

async fn insert_val<S, G>(
    State(ingress): State<Arc<CommandIngress<S, G>>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    S: KeyValueStore + 'static,
    G: ConsensusGateway + 'static,
{
    if !is_msgpack(&headers) {
        return not_found().await.into_response();
    }

    match body {
        Ok(body) => ingress.handle_write(body).await.as_str().into_response(),
        Err(rejection) => {
            warn!("Dropping write: {}", rejection.body_text());
            WriteReply::Error.as_str().into_response()
        }
    }
}

async fn get_val<S, G>(
    State(ingress): State<Arc<CommandIngress<S, G>>>,
    Query(params): Query<HashMap<String, String>>,
) -> String
where
    S: KeyValueStore + 'static,
    G: ConsensusGateway + 'static,
{
    ingress.handle_read(params.get("key").map(String::as_str)).await
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

fn is_msgpack(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            MSGPACK_CONTENT_TYPES
                .iter()
                .any(|accepted| value.contains(accepted))
        })
        .unwrap_or(false)
}
