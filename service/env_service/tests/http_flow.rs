use axum::{body::{to_bytes, Body}, http::{Request, StatusCode}, Router};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn grid_delivery_episode_via_http() {
    delivery_env::register_default_env();
    let app = env_service::make_app();

    // GET /envs
    let res = app.clone().oneshot(Request::builder().uri("/envs").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let arr: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert!(arr.contains(&"GridDelivery".to_string()));

    // POST /initialize ending the episode on delivery
    let init = json!({"env_type": "GridDelivery", "config": {"done_on_delivery": true}});
    let (status, body) = post(&app, "/initialize", init).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    let env_id = v["env_id"].as_str().unwrap().to_string();
    assert_eq!(v["observation"]["data"]["observation"], json!([1, 0, 0]));

    // Pick up on the right, deliver on the left.
    let step = json!({"env_id": env_id, "tool_calls": [{"tool": "interact", "args": {"actions": [0, 1, 1]}}]});
    let (status, body) = post(&app, "/step", step).await;
    assert_eq!(status, StatusCode::OK);
    let obs: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(obs["terminated"], true);
    assert_eq!(obs["data"]["reward_last"], 20.0);

    let (status, body) = post(&app, "/checkpoint", json!({"env_id": env_id})).await;
    assert_eq!(status, StatusCode::OK);
    let snap: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(snap["engine"], "grid_delivery");
    assert_eq!(snap["data"]["step_count"], 3);

    let (status, _) = post(&app, "/terminate", json!({"env_id": env_id})).await;
    assert_eq!(status, StatusCode::OK);

    // The instance is gone after terminate.
    let (status, _) = post(&app, "/checkpoint", json!({"env_id": env_id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_requests_map_to_status_codes() {
    delivery_env::register_default_env();
    let app = env_service::make_app();

    let (status, _) = post(&app, "/initialize", json!({"env_type": "Nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(&app, "/initialize", json!({"env_type": "GridDelivery"})).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    let env_id = v["env_id"].as_str().unwrap().to_string();

    let step = json!({"env_id": env_id, "tool_calls": [{"tool": "interact", "args": {"action": 5}}]});
    let (status, body) = post(&app, "/step", step).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "unknown action 5");

    let step = json!({"env_id": "env-0", "tool_calls": []});
    let (status, _) = post(&app, "/step", step).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
