//! Integration tests for the HTTP session host

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use moodloop::core::create_router;
use moodloop::Config;
use serde_json::Value;
use tower::ServiceExt;

fn create_test_router() -> Router {
    create_router(Config::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

const DEMO: &str = r#"{
    "emotion": "angry",
    "valence": -0.63,
    "arousal": 0.74,
    "intensity": 0.55,
    "aus": {"AU4": 0.78, "AU7": 0.60, "AU12": 0.10},
    "confidence": 0.9
}"#;

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], moodloop::VERSION);
    assert_eq!(json["sessions_active"], 0);
}

#[tokio::test]
async fn test_sample_creates_session() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/session/demo/sample", Some(DEMO)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], "demo");
    assert_eq!(json["cycle_index"], 1);
    assert_eq!(json["params"]["intent"], "calming");
    assert_eq!(json["params"]["decision_level"], "layer");
    assert_eq!(json["params"]["meta"]["reason"], "initial_stress");
    assert_eq!(json["params"]["timbre"], "warm");
    assert!(json["prompt"].as_str().unwrap().contains("calming loop"));
    assert!(json["explore"].is_boolean());

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 1);
}

#[tokio::test]
async fn test_session_status() {
    let app = create_test_router();
    send(&app, "POST", "/session/u1/sample", Some(DEMO)).await;
    send(&app, "POST", "/session/u1/sample", Some(DEMO)).await;

    let (status, json) = send(&app, "GET", "/session/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cycle_index"], 2);
    assert_eq!(json["last_params"]["intent"], "calming");
    assert!(json["last_prompt"].is_string());
    assert_eq!(json["window"], 2);
    assert_eq!(json["epsilon"], 0.25);
    assert!(json["created_at"].is_string());
}

#[tokio::test]
async fn test_unknown_user_not_found() {
    let app = create_test_router();
    let (status, _) = send(&app, "GET", "/session/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/session/nobody/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let like = Some(r#"{"behavior": 1}"#);
    let (status, _) = send(&app, "POST", "/session/nobody/feedback", like).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_before_sample_conflicts() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/session/fresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cycle_index"], 0);
    assert!(json["last_params"].is_null());

    let like = Some(r#"{"behavior": 1}"#);
    let (status, _) = send(&app, "POST", "/session/fresh/feedback", like).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_feedback_updates_profile() {
    let app = create_test_router();
    send(&app, "POST", "/session/fb/sample", Some(DEMO)).await;

    let body =
        r#"{"delta_valence": 0.12, "delta_arousal": -0.08, "behavior": 1, "intent": "calming"}"#;
    let (status, json) = send(&app, "POST", "/session/fb/feedback", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let reward = json["reward"].as_f64().unwrap();
    assert!((reward - 0.288).abs() < 1e-9);
    assert!((json["epsilon"].as_f64().unwrap() - 0.245).abs() < 1e-12);
    assert_eq!(json["avoid"], Value::Array(vec![]));

    let (status, profile) = send(&app, "GET", "/session/fb/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    let pad = profile["instrument_scores"]["warm_pad"].as_f64().unwrap();
    assert!((pad - 0.25 * 0.288).abs() < 1e-9);
    assert!(profile["timbre_scores"]["warm"].is_number());
}

#[tokio::test]
async fn test_malformed_sample_rejected() {
    let app = create_test_router();
    let (status, _) = send(&app, "POST", "/session/bad/sample", Some("{ nope")).await;
    assert!(status.is_client_error());

    let (status, _) = send(&app, "GET", "/session/bad", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = create_test_router();
    let (_, a) = send(&app, "POST", "/session/alice/sample", Some(DEMO)).await;
    let (_, b) = send(&app, "POST", "/session/bob/sample", Some(DEMO)).await;

    assert_eq!(a["cycle_index"], 1);
    assert_eq!(b["cycle_index"], 1);
    assert_eq!(a["params"]["intent"], b["params"]["intent"]);
    assert_ne!(a["params"]["seed"], b["params"]["seed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_samples_per_user() {
    let app = create_test_router();
    let users = ["ana", "ben", "cai", "dee"];
    let per_user = 8;

    let mut handles = Vec::new();
    for user in users {
        for _ in 0..per_user {
            let app = app.clone();
            let uri = format!("/session/{}/sample", user);
            handles.push(tokio::spawn(async move {
                let (status, _) = send(&app, "POST", &uri, Some(DEMO)).await;
                status
            }));
        }
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    for user in users {
        let (status, json) = send(&app, "GET", &format!("/session/{}", user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cycle_index"], per_user);
        assert_eq!(json["user_id"], user);
    }
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], users.len());
}
