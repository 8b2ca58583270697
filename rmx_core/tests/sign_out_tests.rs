use std::path::{Path, PathBuf};
use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rmx_core::signout::api::{HttpSignOutApi, SignOutApi};
use rmx_core::signout::cleanup::FileSessionCleanup;
use rmx_core::signout::task::SignOutTask;
use rmx_core::types::types::{RemoteFailure, SignOutError, SignOutParams};

const TOKEN: &str = "syt_test_token";

/// Creates a populated session directory inside `root`.
fn make_session_dir(root: &tempfile::TempDir) -> PathBuf {
    let dir = root.path().join("session");
    std::fs::create_dir_all(dir.join("crypto")).unwrap();
    std::fs::write(dir.join("crypto/olm.db"), b"keys").unwrap();
    std::fs::write(dir.join("sync_token"), b"s72594_4483_1934").unwrap();
    dir
}

fn sign_out_task(server: &MockServer, session_dir: &Path) -> SignOutTask {
    let api = HttpSignOutApi::new(&server.uri(), TOKEN).unwrap();
    SignOutTask::new(Arc::new(api), Arc::new(FileSessionCleanup::new(session_dir)))
}

fn remote() -> SignOutParams {
    SignOutParams {
        sign_out_from_homeserver: true,
    }
}

// ---------------------------------------------------------------
// HttpSignOutApi
// ---------------------------------------------------------------

#[tokio::test]
async fn test_logout_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_matrix/client/r0/logout"))
        .and(header("Authorization", "Bearer syt_test_token"))
        .and(body_json(serde_json::json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpSignOutApi::new(&server.uri(), TOKEN).unwrap();
    api.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_matrix_error_body_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errcode": "M_UNKNOWN_TOKEN",
            "error": "Invalid macaroon passed.",
            "soft_logout": true
        })))
        .mount(&server)
        .await;

    let api = HttpSignOutApi::new(&server.uri(), TOKEN).unwrap();
    let failure = api.sign_out().await.unwrap_err();

    assert_eq!(failure.http_status(), Some(401));
    assert_eq!(failure.errcode(), Some("M_UNKNOWN_TOKEN"));
    match failure {
        RemoteFailure::Server { message, .. } => {
            assert_eq!(message.as_deref(), Some("Invalid macaroon passed."))
        }
        other => panic!("unexpected failure: {other}"),
    }
}

#[tokio::test]
async fn test_non_matrix_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let api = HttpSignOutApi::new(&server.uri(), TOKEN).unwrap();
    match api.sign_out().await.unwrap_err() {
        RemoteFailure::OtherServer { http_status, body } => {
            assert_eq!(http_status, 502);
            assert!(body.contains("Bad Gateway"));
        }
        other => panic!("unexpected failure: {other}"),
    }
}

// ---------------------------------------------------------------
// SignOutTask end-to-end
// ---------------------------------------------------------------

#[tokio::test]
async fn test_sign_out_success_removes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_matrix/client/r0/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);

    sign_out_task(&server, &session_dir).execute(remote()).await.unwrap();

    assert!(!session_dir.exists());
}

#[tokio::test]
async fn test_sign_out_local_only_never_hits_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);

    sign_out_task(&server, &session_dir)
        .execute(SignOutParams {
            sign_out_from_homeserver: false,
        })
        .await
        .unwrap();

    assert!(!session_dir.exists());
}

#[tokio::test]
async fn test_sign_out_unknown_token_race_still_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errcode": "M_UNKNOWN_TOKEN",
            "error": "Unrecognised access token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);

    sign_out_task(&server, &session_dir).execute(remote()).await.unwrap();

    assert!(!session_dir.exists());
}

#[tokio::test]
async fn test_sign_out_server_error_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "errcode": "M_UNKNOWN",
            "error": "Internal server error"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);

    let err = sign_out_task(&server, &session_dir).execute(remote()).await.unwrap_err();

    match err {
        SignOutError::Remote(failure) => {
            assert_eq!(failure.http_status(), Some(500));
            assert_eq!(failure.errcode(), Some("M_UNKNOWN"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(session_dir.join("crypto/olm.db").exists(), "local data must be untouched");
}

#[tokio::test]
async fn test_sign_out_retry_after_fatal_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);
    let task = sign_out_task(&server, &session_dir);

    assert!(task.execute(remote()).await.is_err());
    assert!(session_dir.exists());

    task.execute(remote()).await.unwrap();
    assert!(!session_dir.exists());
}

#[tokio::test]
async fn test_sign_out_unreachable_homeserver_is_fatal() {
    // Grab a free port, then release it so the connection is refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let root = tempfile::tempdir().unwrap();
    let session_dir = make_session_dir(&root);
    let api = HttpSignOutApi::new(&uri, TOKEN).unwrap();
    let task = SignOutTask::new(Arc::new(api), Arc::new(FileSessionCleanup::new(&session_dir)));

    let err = task.execute(remote()).await.unwrap_err();

    assert!(matches!(err, SignOutError::Remote(RemoteFailure::Network(_))));
    assert!(session_dir.exists());
}
