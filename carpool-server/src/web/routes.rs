//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Form, Request, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info_span, warn};

use crate::allocation::NewCar;
use crate::domain::{JourneyId, PoolError};
use crate::service::CarPool;
use crate::storage::MemoryStore;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// Every request gets an `x-request-id` (generated unless the client sent
/// one), recorded on its tracing span and echoed on the response.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/cars", put(put_cars))
        .route("/journey", post(post_journey))
        .route("/dropoff", post(post_dropoff))
        .route("/locate", post(post_locate))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id
    )
}

/// Run a pool operation on the blocking thread pool.
///
/// Pool operations wait on the store's writer gate, which must not park an
/// async worker.
async fn with_pool<R, Op>(state: &AppState, op: Op) -> Result<R, AppError>
where
    R: Send + 'static,
    Op: FnOnce(&CarPool<MemoryStore>) -> Result<R, PoolError> + Send + 'static,
{
    let pool = Arc::clone(&state.pool);
    let result = tokio::task::spawn_blocking(move || op(&*pool))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("pool task failed: {e}"),
        })?;
    Ok(result?)
}

/// Health check with a fleet summary.
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let status = with_pool(&state, |pool| pool.status()).await?;
    Ok(Json(status.into()))
}

/// Replace the fleet. Drops every journey.
async fn put_cars(
    State(state): State<AppState>,
    body: Result<Json<Vec<CarRequest>>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(cars) = body?;
    let fleet: Vec<NewCar> = cars.iter().map(NewCar::from).collect();
    with_pool(&state, move |pool| pool.reset_cars(&fleet)).await?;
    Ok(StatusCode::OK)
}

/// Request a car for a group.
async fn post_journey(
    State(state): State<AppState>,
    body: Result<Json<JourneyRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body?;
    with_pool(&state, move |pool| {
        pool.new_journey(JourneyId(req.id), req.passengers)
    })
    .await?;
    Ok(StatusCode::OK)
}

/// Finish a journey. 200 if a car was freed, 204 if it was still waiting.
async fn post_dropoff(
    State(state): State<AppState>,
    form: Result<Form<JourneyIdForm>, FormRejection>,
) -> Result<StatusCode, AppError> {
    let Form(req) = form?;
    let id = JourneyId(req.id);
    match with_pool(&state, move |pool| pool.dropoff(id)).await? {
        Some(_) => Ok(StatusCode::OK),
        None => Ok(StatusCode::NO_CONTENT),
    }
}

/// Find a journey's car. 200 with the car, 204 if it is still waiting.
async fn post_locate(
    State(state): State<AppState>,
    form: Result<Form<JourneyIdForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(req) = form?;
    let id = JourneyId(req.id);
    match with_pool(&state, move |pool| pool.locate(id)).await? {
        Some(car) => Ok(Json(CarView::from(&car)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    UnsupportedMediaType { message: String },
    Internal { message: String },
    /// An extractor rejection that carries its own status, such as 413.
    Rejected { status: StatusCode, message: String },
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        let message = e.to_string();
        match e {
            PoolError::NotFound { .. } => AppError::NotFound { message },
            PoolError::Conflict { .. } | PoolError::InvalidInput(_) => {
                AppError::BadRequest { message }
            }
            PoolError::StorageUnavailable(_) => AppError::Internal { message },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let message = rejection.body_text();
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType { message },
            JsonRejection::BytesRejection(_) => AppError::Rejected { status, message },
            _ => AppError::BadRequest { message },
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        let status = rejection.status();
        let message = rejection.body_text();
        match rejection {
            FormRejection::InvalidFormContentType(_) => AppError::UnsupportedMediaType { message },
            FormRejection::BytesRejection(_) => AppError::Rejected { status, message },
            _ => AppError::BadRequest { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::UnsupportedMediaType { message } => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
            }
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
            AppError::Rejected { status, message } => (status, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        } else {
            warn!(status = status.as_u16(), %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{self, Method, header};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{Car, CarId};
    use crate::storage::{EntityStore, Transaction, TransactionFactory};

    fn app() -> Router {
        create_router(AppState::new(CarPool::new(MemoryStore::new())))
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn load_fleet(app: &Router, fleet: &str) {
        let (status, _) = send(app, json_request(Method::PUT, "/cars", fleet)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reports_ok() {
        let app = app();
        load_fleet(&app, r#"[{"id":1,"seats":4},{"id":2,"seats":6}]"#).await;

        let request = http::Request::builder().uri("/status").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cars"], 2);
        assert_eq!(body["totalSeats"], 10);
    }

    #[tokio::test]
    async fn journey_locate_dropoff_flow() {
        let app = app();
        load_fleet(&app, r#"[{"id":1,"seats":4},{"id":2,"seats":6}]"#).await;

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/journey", r#"{"id":7,"passengers":4}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, form_request("/locate", "ID=7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"id": 1, "seats": 4, "availableSeats": 0})
        );

        let (status, _) = send(&app, form_request("/dropoff", "ID=7")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, form_request("/locate", "ID=7")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "journey 7 not found");
    }

    #[tokio::test]
    async fn pending_journey_locates_and_drops_with_no_content() {
        let app = app();
        load_fleet(&app, r#"[{"id":1,"seats":4}]"#).await;
        send(
            &app,
            json_request(Method::POST, "/journey", r#"{"id":1,"passengers":6}"#),
        )
        .await;

        let (status, body) = send(&app, form_request("/locate", "ID=1")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        let (status, _) = send(&app, form_request("/dropoff", "ID=1")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn invalid_fleets_are_bad_requests() {
        let app = app();
        for fleet in [
            r#"[{"id":1,"seats":3}]"#,
            r#"[{"id":1,"seats":7}]"#,
            r#"[{"id":1,"seats":4},{"id":1,"seats":5}]"#,
            r#"[{"id":1}]"#,
            r#"not json"#,
        ] {
            let (status, body) = send(&app, json_request(Method::PUT, "/cars", fleet)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{fleet}");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn duplicate_journey_is_bad_request() {
        let app = app();
        load_fleet(&app, r#"[{"id":1,"seats":4}]"#).await;
        let body = r#"{"id":1,"passengers":2}"#;

        let (status, _) = send(&app, json_request(Method::POST, "/journey", body)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, json_request(Method::POST, "/journey", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "duplicate journey id 1");
    }

    #[tokio::test]
    async fn wrong_content_type_is_unsupported() {
        let app = app();

        let (status, _) = send(&app, form_request("/journey", "id=1&passengers=2")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/dropoff", r#"{"ID":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn wrong_method_is_not_allowed() {
        let app = app();
        let request = http::Request::builder().uri("/cars").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids() {
        let app = app();

        let (status, _) = send(&app, form_request("/dropoff", "ID=99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, form_request("/locate", "id=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, form_request("/locate", "ID=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = app();
        let request = http::Request::builder().uri("/status").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let app = app();
        let body = format!("[{}]", " ".repeat(3 * 1024 * 1024));

        let (status, body) = send(&app, json_request(Method::PUT, "/cars", &body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    async fn inconsistent_store_is_internal_error() {
        let state = AppState::new(CarPool::new(MemoryStore::new()));
        {
            let mut txn = state.pool.storage().begin().unwrap();
            let mut car = Car::new(CarId(1), 4).unwrap();
            car.take_seats(2).unwrap();
            txn.cars().insert(car).unwrap();
            txn.commit().unwrap();
        }
        let app = create_router(state);

        let request = http::Request::builder().uri("/status").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["error"].as_str().unwrap().contains("invariant violated"),
            "{body}"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_journeys_are_all_served() {
        let app = app();
        load_fleet(&app, r#"[{"id":1,"seats":6},{"id":2,"seats":6}]"#).await;

        let tasks: Vec<_> = (1..=20u32)
            .map(|id| {
                let app = app.clone();
                tokio::spawn(async move {
                    let body = format!(r#"{{"id":{id},"passengers":1}}"#);
                    send(&app, json_request(Method::POST, "/journey", &body)).await.0
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        let request = http::Request::builder().uri("/status").body(Body::empty()).unwrap();
        let (_, body) = send(&app, request).await;
        assert_eq!(body["assignedJourneys"], 12);
        assert_eq!(body["pendingJourneys"], 8);
    }
}
