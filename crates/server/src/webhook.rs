use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, error};

use automarket_bot::Update;

use crate::bootstrap::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tg/webhook/{secret}", post(receive_update))
        .route("/tg", get(bot_link))
}

/// Telegram retries any non-2xx delivery, so handler failures are logged and
/// answered with 200 anyway. A wrong secret gets a plain 404 instead, so the
/// path cannot be probed apart from any other unknown route.
async fn receive_update(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    if secret != state.config.telegram.webhook_secret {
        return StatusCode::NOT_FOUND.into_response();
    }

    match serde_json::from_value::<Update>(payload) {
        Ok(update) => {
            if let Err(error) = state.bot_router.handle_update(update).await {
                error!(error = %error, "webhook update handling failed");
            }
        }
        Err(error) => {
            debug!(error = %error, "ignoring malformed webhook payload");
        }
    }

    Json(json!({ "ok": true })).into_response()
}

/// Public deep link to the bot, used from the site footer.
async fn bot_link(State(state): State<AppState>) -> Response {
    match &state.bot_username {
        Some(username) => Redirect::temporary(&format!("https://t.me/{username}")).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use automarket_core::domain::user::ChatId;

    use crate::bootstrap::tests::test_state;

    fn update_request(secret: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/tg/webhook/{secret}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request should build")
    }

    #[tokio::test]
    async fn valid_secret_routes_the_update_to_the_bot() {
        let (state, api) = test_state("sqlite::memory:?cache=shared").await;
        let app = super::router().with_state(state.clone());

        let payload = json!({
            "update_id": 1,
            "message": { "message_id": 10, "chat": { "id": 500 }, "text": "/start" }
        });
        let response = app
            .oneshot(update_request("long-random-webhook-secret", payload))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let texts = api.texts_for(ChatId(500)).await;
        assert_eq!(texts.len(), 1, "a /start command should produce one reply");

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn wrong_secret_is_a_plain_not_found() {
        let (state, api) = test_state("sqlite::memory:?cache=shared").await;
        let app = super::router().with_state(state.clone());

        let payload = json!({
            "update_id": 1,
            "message": { "message_id": 10, "chat": { "id": 500 }, "text": "/start" }
        });
        let response = app
            .oneshot(update_request("wrong-secret", payload))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(api.texts_for(ChatId(500)).await.is_empty());

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn malformed_payload_is_acknowledged_without_routing() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        let app = super::router().with_state(state.clone());

        let response = app
            .oneshot(update_request("long-random-webhook-secret", json!({ "unexpected": true })))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn bot_link_redirects_to_telegram() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        let app = super::router().with_state(state.clone());

        let response = app
            .oneshot(Request::builder().uri("/tg").body(Body::empty()).expect("request"))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert_eq!(location, "https://t.me/automarket_demo_bot");

        state.db_pool.close().await;
    }
}
