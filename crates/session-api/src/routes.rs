//! Route table

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{health, session};
use crate::middleware::session_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/", get(session::show))
        .route(
            "/attributes/{field}",
            get(session::get_attribute)
                .put(session::put_attribute)
                .delete(session::delete_attribute),
        )
        .route("/logout", post(session::logout))
        .route_layer(middleware::from_fn_with_state(state.sessions.clone(), session_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/session", session_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use session_core::{ManualClock, MemoryStore, SessionAttributes, SessionConfig, SessionManager};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const T0: i64 = 1_700_000_000;

    fn app() -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_unix(T0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let config = SessionConfig {
            cookie_name: "sid".to_string(),
            secure: false,
            session_duration: Duration::from_secs(3600),
            regenerate_after: Duration::from_secs(1800),
            rotation_lease: None,
        };
        let state = AppState {
            attributes: Arc::new(SessionAttributes::new(store.clone(), config.session_duration)),
            sessions: Arc::new(SessionManager::new(store, config).with_clock(clock.clone())),
        };
        (router(state), clock)
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(sid) = cookie {
            builder = builder.header(header::COOKIE, format!("sid={}", sid));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn issued_sid(response: &Response) -> Option<String> {
        set_cookies(response).iter().find_map(|c| {
            let pair = c.split(';').next()?;
            pair.strip_prefix("sid=").map(str::to_string)
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_does_not_touch_sessions() {
        let (app, _) = app();
        let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_first_visit_issues_cookie() {
        let (app, _) = app();
        let response = app.oneshot(request("GET", "/api/v1/session", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sid = issued_sid(&response).unwrap();
        assert_eq!(sid.len(), 64);
        assert!(set_cookies(&response)[0].contains("HttpOnly"));

        let body = json_body(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["session_id"], json!(format!("{}***", &sid[..8])));
        assert_eq!(body["data"]["attributes"], json!({}));
    }

    #[tokio::test]
    async fn test_returning_visit_keeps_cookie_and_attributes() {
        let (app, clock) = app();
        let first = app.clone().oneshot(request("GET", "/api/v1/session", None, None)).await.unwrap();
        let sid = issued_sid(&first).unwrap();

        let put = app
            .clone()
            .oneshot(request("PUT", "/api/v1/session/attributes/cart", Some(&sid), Some(json!({"items": 2}))))
            .await
            .unwrap();
        assert_eq!(put.status(), StatusCode::OK);
        assert!(issued_sid(&put).is_none());

        clock.set_unix(T0 + 600);
        let get = app
            .oneshot(request("GET", "/api/v1/session/attributes/cart", Some(&sid), None))
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);
        assert!(issued_sid(&get).is_none());
        assert_eq!(json_body(get).await["data"], json!({"items": 2}));
    }

    #[tokio::test]
    async fn test_aged_session_rotates_cookie_and_keeps_data() {
        let (app, clock) = app();
        let first = app.clone().oneshot(request("GET", "/api/v1/session", None, None)).await.unwrap();
        let old = issued_sid(&first).unwrap();
        app.clone()
            .oneshot(request("PUT", "/api/v1/session/attributes/lang", Some(&old), Some(json!("id"))))
            .await
            .unwrap();

        clock.set_unix(T0 + 1801);
        let rotated = app.clone().oneshot(request("GET", "/api/v1/session", Some(&old), None)).await.unwrap();
        let new = issued_sid(&rotated).unwrap();
        assert_ne!(new, old);
        assert_eq!(json_body(rotated).await["data"]["attributes"], json!({"lang": "id"}));

        let stale = app
            .oneshot(request("GET", "/api/v1/session/attributes/lang", Some(&old), None))
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reserved_attribute_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(request("PUT", "/api/v1/session/attributes/created_at", None, Some(json!(0))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_write_on_unknown_token_is_not_stored() {
        let (app, _) = app();
        let forged = "f".repeat(64);

        let put = app
            .clone()
            .oneshot(request("PUT", "/api/v1/session/attributes/user", Some(&forged), Some(json!("victim"))))
            .await
            .unwrap();
        assert_eq!(put.status(), StatusCode::NOT_FOUND);

        let show = app.oneshot(request("GET", "/api/v1/session", Some(&forged), None)).await.unwrap();
        assert_eq!(json_body(show).await["data"]["attributes"], json!({}));
    }

    #[tokio::test]
    async fn test_delete_attribute() {
        let (app, _) = app();
        let first = app.clone().oneshot(request("GET", "/api/v1/session", None, None)).await.unwrap();
        let sid = issued_sid(&first).unwrap();
        app.clone()
            .oneshot(request("PUT", "/api/v1/session/attributes/flag", Some(&sid), Some(json!(true))))
            .await
            .unwrap();

        let deleted = app
            .clone()
            .oneshot(request("DELETE", "/api/v1/session/attributes/flag", Some(&sid), None))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let get = app
            .oneshot(request("GET", "/api/v1/session/attributes/flag", Some(&sid), None))
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_cookie() {
        let (app, _) = app();
        let first = app.clone().oneshot(request("GET", "/api/v1/session", None, None)).await.unwrap();
        let sid = issued_sid(&first).unwrap();
        app.clone()
            .oneshot(request("PUT", "/api/v1/session/attributes/user", Some(&sid), Some(json!("ana"))))
            .await
            .unwrap();

        let logout = app
            .clone()
            .oneshot(request("POST", "/api/v1/session/logout", Some(&sid), None))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);
        let cookies = set_cookies(&logout);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("sid=;"));
        assert!(cookies[0].contains("Max-Age=0"));

        let get = app
            .oneshot(request("GET", "/api/v1/session/attributes/user", Some(&sid), None))
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
    }
}
