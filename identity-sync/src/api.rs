use axum::{
    extract::State,
    http::StatusCode,
    routing, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::client::{IdentitySyncClient, SyncState};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloudIdResponse {
    pub mid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResponse {
    pub in_flight: bool,
    pub pending: bool,
}

impl From<SyncState> for SyncResponse {
    fn from(state: SyncState) -> Self {
        match state {
            SyncState::Idle => SyncResponse {
                in_flight: false,
                pending: false,
            },
            SyncState::InFlight => SyncResponse {
                in_flight: true,
                pending: false,
            },
            SyncState::InFlightWithPending => SyncResponse {
                in_flight: true,
                pending: true,
            },
        }
    }
}

pub fn add_routes(router: Router, client: IdentitySyncClient) -> Router {
    router
        .route("/", routing::get(index))
        .route("/_liveness", routing::get(index))
        .route(
            "/sync",
            routing::post(request_sync).with_state(client.clone()),
        )
        .route("/cloud-id", routing::get(cloud_id).with_state(client))
}

pub async fn index() -> &'static str {
    "identity sync"
}

/// Trigger a sync. The request only reports what the client is doing afterwards.
pub async fn request_sync(
    State(client): State<IdentitySyncClient>,
) -> (StatusCode, Json<SyncResponse>) {
    client.request_sync();

    (StatusCode::ACCEPTED, Json(client.state().into()))
}

pub async fn cloud_id(State(client): State<IdentitySyncClient>) -> Json<CloudIdResponse> {
    Json(CloudIdResponse {
        mid: client.marketing_cloud_id(),
    })
}
