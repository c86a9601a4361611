use crate::config::Config;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use fwgate_core::{
    ApplyNodeUpdateOperationOutcome, ApplyPendingDfuOperationOutcome, ChannelName, Fleet,
    FwError, GateBlock, GateStatus, NodeUuid, PublishArtifactOperationOutcome,
    RequestDfuOperationOutcome, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct ServerState {
    pub fleet: Fleet,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Body for policy outcomes; fields not relevant to an outcome are omitted.
#[derive(Debug, Default, Serialize)]
struct OutcomeResponse {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<GateBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replaced: Option<String>,
}

#[derive(Debug, Serialize)]
struct GaugeResponse {
    battery_ma: u32,
    backlog: u32,
    blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<GateBlock>,
}

#[derive(Debug, Deserialize)]
struct ArtifactBody {
    artifact: String,
}

#[derive(Debug, Deserialize)]
struct BatteryBody {
    battery_ma: u32,
}

#[derive(Debug, Deserialize)]
struct BacklogBody {
    backlog: u32,
}

pub async fn run_server(config: Config) -> Result<()> {
    let fleet = Fleet::new(config.fleet_state()?);

    let state = Arc::new(ServerState {
        fleet,
        started_at: chrono::Utc::now(),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/nodes/:uuid", get(get_node))
        .route("/nodes/:uuid/ota", post(apply_node_update))
        .route("/endpoints/:serial", get(get_endpoint))
        .route("/endpoints/:serial/dfu", post(request_dfu))
        .route("/endpoints/:serial/dfu/retry", post(retry_dfu))
        .route("/endpoints/:serial/battery", put(set_battery))
        .route("/endpoints/:serial/backlog", put(set_backlog))
        .route("/channels/:channel", get(get_channel))
        .route("/channels/:channel/artifacts", post(publish_artifact))
        .route(
            "/channels/:channel/artifacts/:artifact",
            delete(withdraw_artifact),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(code: StatusCode, error: impl ToString) -> Response {
    let resp = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(error.to_string()),
    };
    (code, Json(resp)).into_response()
}

fn fw_error_response(error: FwError) -> Response {
    error_response(status(error.status_code()), error)
}

fn not_found(what: &str, key: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("{} not found: {}", what, key))
}

fn outcome_response(code: u16, body: OutcomeResponse) -> Response {
    let code = status(code);
    if code == StatusCode::NO_CONTENT {
        return code.into_response();
    }
    (code, Json(ApiResponse::ok(body))).into_response()
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let fleet = state.fleet.store().read().await;

    let response = serde_json::json!({
        "status": "ok",
        "nodes": fleet.registry.node_count(),
        "endpoints": fleet.registry.endpoint_count(),
        "pending_dfu": fleet.pending.len(),
        "started_at": state.started_at.to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}

async fn get_node(State(state): State<Arc<ServerState>>, Path(uuid): Path<String>) -> Response {
    match state.fleet.get_node(uuid.as_str()).await {
        Some(view) => (StatusCode::OK, Json(ApiResponse::ok(view))).into_response(),
        None => not_found("node", &uuid),
    }
}

async fn get_endpoint(
    State(state): State<Arc<ServerState>>,
    Path(serial): Path<String>,
) -> Response {
    match state.fleet.get_endpoint(serial.as_str()).await {
        Some(view) => (StatusCode::OK, Json(ApiResponse::ok(view))).into_response(),
        None => not_found("endpoint", &serial),
    }
}

async fn get_channel(
    State(state): State<Arc<ServerState>>,
    Path(channel): Path<String>,
) -> Response {
    match state.fleet.query().channel(&ChannelName::from(channel)).await {
        Ok(artifacts) => (StatusCode::OK, Json(ApiResponse::ok(artifacts))).into_response(),
        Err(error) if error.is_not_found() => error_response(StatusCode::NOT_FOUND, error),
        Err(error) => fw_error_response(error),
    }
}

async fn apply_node_update(
    State(state): State<Arc<ServerState>>,
    Path(uuid): Path<String>,
) -> Response {
    let outcome = match state.fleet.apply_node_update(NodeUuid::from(uuid)).await {
        Ok(outcome) => outcome,
        Err(error) => return fw_error_response(error),
    };

    let code = outcome.status_code();
    let body = match outcome {
        ApplyNodeUpdateOperationOutcome::Applied {
            artifact,
            previous_version,
            version,
        } => OutcomeResponse {
            outcome: "applied",
            artifact: Some(artifact),
            previous_version: Some(previous_version),
            version: Some(version),
            ..Default::default()
        },
        ApplyNodeUpdateOperationOutcome::NoOp => OutcomeResponse {
            outcome: "no_op",
            ..Default::default()
        },
        ApplyNodeUpdateOperationOutcome::AlreadyCurrent { version } => OutcomeResponse {
            outcome: "already_current",
            version: Some(version),
            ..Default::default()
        },
    };

    outcome_response(code, body)
}

async fn request_dfu(
    State(state): State<Arc<ServerState>>,
    Path(serial): Path<String>,
    Json(body): Json<ArtifactBody>,
) -> Response {
    let outcome = match state.fleet.request_dfu(serial, body.artifact.clone()).await {
        Ok(outcome) => outcome,
        Err(error) => return fw_error_response(error),
    };

    let code = outcome.status_code();
    let body = match outcome {
        RequestDfuOperationOutcome::Applied {
            previous_version,
            version,
        } => OutcomeResponse {
            outcome: "applied",
            artifact: Some(body.artifact),
            previous_version: Some(previous_version),
            version: Some(version),
            ..Default::default()
        },
        RequestDfuOperationOutcome::AlreadyCurrent { version } => OutcomeResponse {
            outcome: "already_current",
            version: Some(version),
            ..Default::default()
        },
        RequestDfuOperationOutcome::Deferred { block, replaced } => OutcomeResponse {
            outcome: "deferred",
            artifact: Some(body.artifact),
            block: Some(block),
            replaced,
            ..Default::default()
        },
    };

    outcome_response(code, body)
}

async fn retry_dfu(State(state): State<Arc<ServerState>>, Path(serial): Path<String>) -> Response {
    let outcome = match state.fleet.try_apply_pending(serial).await {
        Ok(outcome) => outcome,
        Err(error) => return fw_error_response(error),
    };

    let code = outcome.status_code();
    let body = match outcome {
        ApplyPendingDfuOperationOutcome::Applied {
            artifact,
            previous_version,
            version,
        } => OutcomeResponse {
            outcome: "applied",
            artifact: Some(artifact),
            previous_version: Some(previous_version),
            version: Some(version),
            ..Default::default()
        },
        ApplyPendingDfuOperationOutcome::StillBlocked { block, pending } => OutcomeResponse {
            outcome: "still_blocked",
            artifact: pending,
            block: Some(block),
            ..Default::default()
        },
        ApplyPendingDfuOperationOutcome::NothingPending => OutcomeResponse {
            outcome: "nothing_pending",
            ..Default::default()
        },
    };

    outcome_response(code, body)
}

async fn set_battery(
    State(state): State<Arc<ServerState>>,
    Path(serial): Path<String>,
    Json(body): Json<BatteryBody>,
) -> Response {
    match state.fleet.set_endpoint_battery(serial, body.battery_ma).await {
        Ok(result) => gauge_response(result),
        Err(error) => fw_error_response(error),
    }
}

async fn set_backlog(
    State(state): State<Arc<ServerState>>,
    Path(serial): Path<String>,
    Json(body): Json<BacklogBody>,
) -> Response {
    match state.fleet.set_endpoint_backlog(serial, body.backlog).await {
        Ok(result) => gauge_response(result),
        Err(error) => fw_error_response(error),
    }
}

fn gauge_response(result: fwgate_core::EndpointGaugeOperationResult) -> Response {
    let block = match result.gate {
        GateStatus::Open => None,
        GateStatus::Blocked(block) => Some(block),
    };
    let resp = GaugeResponse {
        battery_ma: result.battery_ma,
        backlog: result.backlog,
        blocked: block.is_some(),
        block,
    };
    (StatusCode::OK, Json(ApiResponse::ok(resp))).into_response()
}

async fn publish_artifact(
    State(state): State<Arc<ServerState>>,
    Path(channel): Path<String>,
    Json(body): Json<ArtifactBody>,
) -> Response {
    match state.fleet.publish_artifact(channel, body.artifact).await {
        Ok(outcome) => {
            let published = outcome == PublishArtifactOperationOutcome::Published;
            let resp = ApiResponse::ok(serde_json::json!({ "published": published }));
            (status(outcome.status_code()), Json(resp)).into_response()
        }
        Err(error) => fw_error_response(error),
    }
}

async fn withdraw_artifact(
    State(state): State<Arc<ServerState>>,
    Path((channel, artifact)): Path<(String, String)>,
) -> Response {
    match state.fleet.withdraw_artifact(channel, artifact).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(()))).into_response(),
        Err(error) => fw_error_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use fwgate_core::TopologyBuilder;
    use tower::ServiceExt;

    const AHN2_EP1: &str = "AHN2_ABCDEF000001_EP1_SN";

    fn app() -> Router {
        let fleet = Fleet::new(TopologyBuilder::new().sample(true).build().unwrap());
        router(Arc::new(ServerState {
            fleet,
            started_at: chrono::Utc::now(),
        }))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_node_ota_over_http() {
        let app = app();

        let (code, _) = send(
            &app,
            Method::POST,
            "/channels/OTA_MOXA_TBCDB1045001/artifacts",
            Some(serde_json::json!({ "artifact": "moxa_10.swu" })),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        send(
            &app,
            Method::POST,
            "/channels/OTA_MOXA_TBCDB1045001/artifacts",
            Some(serde_json::json!({ "artifact": "moxa_12.swu" })),
        )
        .await;

        let (code, body) = send(&app, Method::POST, "/nodes/MOXA_TBCDB1045001/ota", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["data"]["version"], "12");

        let (code, _) = send(&app, Method::POST, "/nodes/MOXA_TBCDB1045001/ota", None).await;
        assert_eq!(code, StatusCode::NO_CONTENT);

        let (code, body) = send(&app, Method::GET, "/nodes/MOXA_TBCDB1045001", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["data"]["ota_channel"], "OTA_MOXA_TBCDB1045001");
        assert_eq!(body["data"]["endpoints"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dfu_defer_and_retry_over_http() {
        let app = app();
        let base = format!("/endpoints/{}", AHN2_EP1);

        let (code, _) = send(
            &app,
            Method::PUT,
            &format!("{}/battery", base),
            Some(serde_json::json!({ "battery_ma": 2000 })),
        )
        .await;
        assert_eq!(code, StatusCode::OK);

        let (code, body) = send(
            &app,
            Method::POST,
            &format!("{}/dfu", base),
            Some(serde_json::json!({ "artifact": "ahn2_12.swu" })),
        )
        .await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["outcome"], "deferred");
        assert_eq!(body["data"]["block"]["reason"], "low_battery");

        let (code, _) = send(&app, Method::POST, &format!("{}/dfu/retry", base), None).await;
        assert_eq!(code, StatusCode::ACCEPTED);

        send(
            &app,
            Method::PUT,
            &format!("{}/battery", base),
            Some(serde_json::json!({ "battery_ma": 3000 })),
        )
        .await;

        let (code, body) = send(&app, Method::POST, &format!("{}/dfu/retry", base), None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["data"]["version"], "12");

        let (code, _) = send(&app, Method::POST, &format!("{}/dfu/retry", base), None).await;
        assert_eq!(code, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, Method::GET, &base, None).await;
        assert_eq!(body["data"]["version"], "12");
        assert_eq!(body["data"]["uuid"], "AHN2_ABCDEF000001");
    }

    #[tokio::test]
    async fn test_errors_over_http() {
        let app = app();

        let (code, body) = send(
            &app,
            Method::POST,
            &format!("/endpoints/{}/dfu", AHN2_EP1),
            Some(serde_json::json!({ "artifact": "ahn2-10.swu" })),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (code, _) = send(&app, Method::POST, "/nodes/NOPE/ota", None).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        let (code, _) = send(&app, Method::GET, "/nodes/NOPE", None).await;
        assert_eq!(code, StatusCode::NOT_FOUND);

        let (code, _) = send(
            &app,
            Method::DELETE,
            "/channels/OTA_AHN2_ABCDEF000001/artifacts/ahn2_1.swu",
            None,
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        let (code, body) = send(&app, Method::GET, "/channels/OTA_AHN2_ABCDEF000001", None).await;
        assert_eq!(code, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());

        let (code, body) = send(&app, Method::GET, "/channels/OTA_NOPE", None).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
