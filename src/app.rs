use axum::Router;
use crate::state::AppState;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

pub fn create_app(state: AppState) -> Router {
    crate::routes::configure_routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::USERS_COLLECTION_ID;
    use crate::test_support::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, headers, body }
    }

    async fn register(app: &Router, username: &str) -> (String, String) {
        let reply = send(
            app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": username, "email": format!("{}@example.com", username), "password": "secret123" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let data = &reply.body["data"];
        (
            data["token"].as_str().unwrap().to_string(),
            data["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn health_and_auth_flow() {
        let app = create_app(test_state().await);

        let health = app
            .clone()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let reply = send(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "secret123" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("transcode_auth="));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(reply.body["data"]["user"]["email"], "alice");
        assert!(reply.body["data"]["user"].get("password_hash").is_none());

        let short = send(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "bob", "password": "123" })),
        )
        .await;
        assert_eq!(short.status, StatusCode::BAD_REQUEST);

        let bad = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-one" })),
        )
        .await;
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.body["message"], "Invalid credentials");

        let login = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "secret123" })),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
        let token = login.body["data"]["token"].as_str().unwrap().to_string();

        let me = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["data"]["username"], "alice");

        // the cookie works in place of the header
        let via_cookie = app
            .clone()
            .oneshot(
                Request::get("/api/v1/auth/me")
                    .header(header::COOKIE, format!("transcode_auth={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(via_cookie.status(), StatusCode::OK);

        assert_eq!(send(&app, Method::GET, "/api/v1/auth/me", None, None).await.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            send(&app, Method::GET, "/api/v1/auth/me", Some("garbage"), None).await.status,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn records_api_enforces_ownership() {
        let app = create_app(test_state().await);
        let (alice, alice_id) = register(&app, "alice").await;
        let (bob, _) = register(&app, "bob").await;

        let created = send(
            &app,
            Method::POST,
            "/api/collections/transcodes/records",
            Some(&alice),
            Some(json!({ "file_name": "clip.mp4", "profiles": [{ "name": "720p" }], "user": alice_id, "status": "in_progress" })),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        let id = created.body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created.body["data"]["collectionName"], "transcodes");
        let uri = format!("/api/collections/transcodes/records/{}", id);

        let own = send(&app, Method::GET, "/api/collections/transcodes/records", Some(&alice), None).await;
        assert_eq!(own.body["data"]["totalItems"], 1);

        let foreign = send(&app, Method::GET, "/api/collections/transcodes/records", Some(&bob), None).await;
        assert_eq!(foreign.status, StatusCode::OK);
        assert_eq!(foreign.body["data"]["totalItems"], 0);

        let guest = send(&app, Method::GET, "/api/collections/transcodes/records", None, None).await;
        assert_eq!(guest.body["data"]["items"], json!([]));

        assert_eq!(send(&app, Method::GET, &uri, Some(&bob), None).await.status, StatusCode::NOT_FOUND);
        assert_eq!(
            send(&app, Method::PATCH, &uri, Some(&bob), Some(json!({ "status": "error" }))).await.status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(send(&app, Method::DELETE, &uri, Some(&bob), None).await.status, StatusCode::NOT_FOUND);

        let invalid = send(&app, Method::PATCH, &uri, Some(&alice), Some(json!({ "status": "queued" }))).await;
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let updated = send(&app, Method::PATCH, &uri, Some(&alice), Some(json!({ "status": "complete" }))).await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["data"]["status"], "complete");
        assert_eq!(updated.body["data"]["file_name"], "clip.mp4");

        let deleted = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(send(&app, Method::GET, &uri, Some(&alice), None).await.status, StatusCode::NOT_FOUND);

        assert_eq!(
            send(&app, Method::GET, "/api/collections/nope/records", Some(&alice), None).await.status,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn settings_and_status_hook() {
        let state = test_state().await;
        let app = create_app(state.clone());
        let (alice, alice_id) = register(&app, "alice").await;
        let (root, root_id) = register(&app, "root").await;

        let mut admin = state.store.find_record(USERS_COLLECTION_ID, &root_id).await.unwrap().unwrap();
        admin.data.insert("role".into(), json!("ADMIN"));
        state.store.update_record(&admin).await.unwrap();

        assert_eq!(send(&app, Method::GET, "/api/v1/settings", None, None).await.status, StatusCode::UNAUTHORIZED);

        let empty = send(&app, Method::GET, "/api/v1/settings", Some(&alice), None).await;
        assert_eq!(empty.status, StatusCode::OK);
        assert_eq!(empty.body["data"], Value::Null);

        let saved = send(
            &app,
            Method::PUT,
            "/api/v1/settings",
            Some(&alice),
            Some(json!({ "settings": { "profiles": ["720p"] } })),
        )
        .await;
        assert_eq!(saved.status, StatusCode::OK, "{}", saved.body);
        assert_eq!(saved.body["data"]["user"], alice_id);

        let created = send(
            &app,
            Method::POST,
            "/api/collections/transcodes/records",
            Some(&alice),
            Some(json!({ "file_name": "clip.mp4", "user": alice_id })),
        )
        .await;
        let id = created.body["data"]["id"].as_str().unwrap().to_string();
        let hook = format!("/api/v1/transcodes/{}/status", id);
        let body = json!({ "status": "complete", "status_message": "done" });

        let denied = send(&app, Method::PATCH, &hook, Some(&alice), Some(body.clone())).await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);

        let ok = send(&app, Method::PATCH, &hook, Some(&root), Some(body)).await;
        assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);

        let mine = send(&app, Method::GET, "/api/v1/transcodes", Some(&alice), None).await;
        assert_eq!(mine.body["data"][0]["status"], "complete");
        assert_eq!(mine.body["data"][0]["status_message"], "done");

        // the admin owns no transcodes of its own
        let theirs = send(&app, Method::GET, "/api/v1/transcodes", Some(&root), None).await;
        assert_eq!(theirs.body["data"], json!([]));
    }
}
