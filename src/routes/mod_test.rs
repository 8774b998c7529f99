use axum::http::Method;

use super::test_helpers::send;
use super::*;
use crate::state::test_helpers::test_app_state;

#[tokio::test]
async fn healthz_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let res = send(&state, Method::GET, "/healthz", None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn static_files_are_served_from_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>editor</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
    let state = test_app_state(dir.path());

    let res = send(&state, Method::GET, "/app.js", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "console.log(1)");

    let res = send(&state, Method::GET, "/", None).await;
    assert_eq!(res.text(), "<h1>editor</h1>");
}

#[tokio::test]
async fn unknown_paths_fall_back_to_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>editor</h1>").unwrap();
    let state = test_app_state(dir.path());

    let res = send(&state, Method::GET, "/some/client/route", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "<h1>editor</h1>");
}

#[test]
fn api_error_body_carries_message_and_code() {
    let err = ApiError::from_err(StatusCode::NOT_FOUND, &crate::services::files::FileError::NotFound);
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.code, Some("E_NOT_FOUND"));
    assert_eq!(err.message, "File not found");
}
