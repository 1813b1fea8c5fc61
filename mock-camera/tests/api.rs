use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_camera::{app, app_with, app_with_state, state_with, MockCamera};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn batch_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/cgi-bin/api.cgi")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- login ---

#[tokio::test]
async fn login_issues_a_token() {
    let app = app();
    let resp = app
        .oneshot(batch_request(
            r#"[{"cmd":"Login","param":{"User":{"userName":"admin","password":"camera123"}}}]"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let batch = body_json(resp).await;
    assert_eq!(batch[0]["cmd"], "Login");
    assert_eq!(batch[0]["code"], 0);
    assert!(batch[0]["value"]["Token"]["name"].is_string());
    assert_eq!(batch[0]["value"]["Token"]["leaseTime"], 3600);
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = app();
    let resp = app
        .oneshot(batch_request(
            r#"[{"cmd":"Login","param":{"User":{"userName":"admin","password":"wrong"}}}]"#,
        ))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch[0]["code"], 1);
    assert_eq!(batch[0]["error"]["rspCode"], -7);
    assert!(batch[0].get("value").is_none());
}

#[tokio::test]
async fn login_with_missing_param_fails() {
    let app = app();
    let resp = app
        .oneshot(batch_request(r#"[{"cmd":"Login"}]"#))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch[0]["error"]["rspCode"], -7);
}

// --- authentication guard ---

#[tokio::test]
async fn command_without_token_requires_login() {
    let app = app();
    let resp = app
        .oneshot(batch_request(r#"[{"cmd":"GetDevInfo"}]"#))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch[0]["cmd"], "GetDevInfo");
    assert_eq!(batch[0]["code"], 1);
    assert_eq!(batch[0]["error"]["rspCode"], -6);
    assert_eq!(batch[0]["error"]["detail"], "please login first");
}

#[tokio::test]
async fn command_with_a_stale_token_requires_login() {
    let app = app();
    let resp = app
        .oneshot(batch_request(r#"[{"cmd":"GetTime","token":"stale"}]"#))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch[0]["error"]["rspCode"], -6);
}

// --- unknown commands ---

#[tokio::test]
async fn unknown_command_is_not_supported() {
    let app = app();
    let resp = app
        .oneshot(batch_request(r#"[{"cmd":"GetMagic"}]"#))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch[0]["cmd"], "GetMagic");
    assert_eq!(batch[0]["error"]["rspCode"], -9);
}

// --- malformed batches ---

#[tokio::test]
async fn malformed_batch_returns_422() {
    let app = app();
    let resp = app
        .oneshot(batch_request(r#"{"cmd":"GetDevInfo"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- configured behaviors ---

#[tokio::test]
async fn drop_responses_returns_an_empty_array() {
    let app = app_with(MockCamera {
        drop_responses: true,
        ..MockCamera::default()
    });
    let resp = app
        .oneshot(batch_request(r#"[{"cmd":"GetDevInfo"}]"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let batch = body_json(resp).await;
    assert_eq!(batch, serde_json::json!([]));
}

#[tokio::test]
async fn every_batch_increments_the_request_counter() {
    let state = state_with(MockCamera::default());
    let app = app_with_state(state.clone());

    assert_eq!(state.read().await.requests_served, 0);
    let _ = app
        .clone()
        .oneshot(batch_request(r#"[{"cmd":"GetDevInfo"}]"#))
        .await
        .unwrap();
    let _ = app
        .oneshot(batch_request(r#"[{"cmd":"GetTime"}]"#))
        .await
        .unwrap();
    assert_eq!(state.read().await.requests_served, 2);
}

// --- batching ---

#[tokio::test]
async fn batch_answers_every_command_in_order() {
    let app = app();
    let resp = app
        .oneshot(batch_request(
            r#"[{"cmd":"GetDevInfo"},{"cmd":"GetMagic"},{"cmd":"GetTime"}]"#,
        ))
        .await
        .unwrap();

    let batch = body_json(resp).await;
    assert_eq!(batch.as_array().unwrap().len(), 3);
    assert_eq!(batch[0]["cmd"], "GetDevInfo");
    assert_eq!(batch[1]["cmd"], "GetMagic");
    assert_eq!(batch[2]["cmd"], "GetTime");
}

// --- full session lifecycle ---

#[tokio::test]
async fn session_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // login
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(
            r#"[{"cmd":"Login","param":{"User":{"userName":"admin","password":"camera123"}}}]"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let batch = body_json(resp).await;
    let token = batch[0]["value"]["Token"]["name"].as_str().unwrap().to_string();

    // device info with the issued token
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(&format!(
            r#"[{{"cmd":"GetDevInfo","token":"{token}"}}]"#
        )))
        .await
        .unwrap();
    let batch = body_json(resp).await;
    assert_eq!(batch[0]["code"], 0);
    assert_eq!(batch[0]["value"]["DevInfo"]["model"], "IPC-500");
    assert!(batch[0].get("initial").is_none());

    // device info with action 1 carries defaults and ranges
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(&format!(
            r#"[{{"cmd":"GetDevInfo","action":1,"token":"{token}"}}]"#
        )))
        .await
        .unwrap();
    let batch = body_json(resp).await;
    assert!(batch[0].get("initial").is_some());
    assert_eq!(batch[0]["range"]["DevInfo"]["name"]["maxLen"], 31);

    // logout
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(&format!(
            r#"[{{"cmd":"Logout","token":"{token}"}}]"#
        )))
        .await
        .unwrap();
    let batch = body_json(resp).await;
    assert_eq!(batch[0]["code"], 0);

    // the token no longer works
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(&format!(
            r#"[{{"cmd":"GetDevInfo","token":"{token}"}}]"#
        )))
        .await
        .unwrap();
    let batch = body_json(resp).await;
    assert_eq!(batch[0]["error"]["rspCode"], -6);
}
