use projello_client::AppError;
use projello_client::domain::project::TaskQuery;
use std::sync::atomic::Ordering;

mod common;

fn all_tasks() -> TaskQuery {
    TaskQuery { project_id: "p1".into(), ..Default::default() }
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_retried() {
    let app = common::TestApp::logged_in().await;
    app.backend.expire_access_token();

    let tasks = app.client.tasks.list(&all_tasks()).await.unwrap();

    assert_eq!(tasks.len(), 4);
    assert_eq!(app.backend.calls("GET /task"), 2);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 1);
    assert!(app.client.session.is_logged_in());
    assert_eq!(app.client.session.access_token().as_deref(), Some(app.backend.access_token.lock().unwrap().as_str()));
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried_again() {
    let app = common::TestApp::logged_in().await;
    app.backend.force_unauthorized("GET /task", 2);

    let err = app.client.tasks.list(&all_tasks()).await.unwrap_err();

    assert!(err.is_unauthorized(), "got {err:?}");
    assert_eq!(app.backend.calls("GET /task"), 2);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 1);
    assert!(!app.client.session.is_logged_in());
}

#[tokio::test]
async fn test_failed_refresh_propagates_unauthorized_and_logs_out() {
    let app = common::TestApp::logged_in().await;
    app.backend.expire_access_token();
    app.backend.refresh_fails.store(true, Ordering::SeqCst);

    let err = app.client.projects.list().await.unwrap_err();

    match err {
        AppError::Unauthorized { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Token expired");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert_eq!(app.backend.calls("GET /project"), 1);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 1);
    assert!(!app.client.session.is_logged_in());
}

#[tokio::test]
async fn test_other_failures_skip_the_refresh_path() {
    let app = common::TestApp::logged_in().await;

    let err = app.client.projects.get("missing").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(ref message) if message == "Project not found"));
    assert_eq!(app.backend.calls("GET /project/{id}"), 1);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 0);
    assert!(app.client.session.is_logged_in());
}

#[tokio::test]
async fn test_logged_out_request_fails_without_refresh_call() {
    let app = common::TestApp::spawn().await;

    let err = app.client.tasks.list(&all_tasks()).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(app.backend.calls("GET /task"), 1);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 0);
}

#[tokio::test]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let app = common::TestApp::logged_in().await;
    app.backend.refresh_delay_ms.store(100, Ordering::SeqCst);
    app.backend.expire_access_token();

    let query = all_tasks();
    let (tasks, projects, notifies) = tokio::join!(
        app.client.tasks.list(&query),
        app.client.projects.list(),
        app.client.notifications.sync(),
    );

    assert_eq!(tasks.unwrap().len(), 4);
    assert_eq!(projects.unwrap().len(), 1);
    assert_eq!(notifies.unwrap().len(), 3);
    assert_eq!(app.backend.calls("POST /auth/refresh"), 1);
    assert_eq!(app.backend.calls("GET /task"), 2);
    assert_eq!(app.backend.calls("GET /project"), 2);
    assert_eq!(app.backend.calls("GET /notify"), 2);
}

#[tokio::test]
async fn test_server_errors_pass_through_with_status() {
    let app = common::TestApp::logged_in().await;
    app.backend.move_fails.store(true, Ordering::SeqCst);

    let err = app.client.tasks.move_task("t1", "2", 0).await.unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(matches!(err, AppError::Http { ref message, .. } if message == "Phase is at its WIP limit"));
    assert_eq!(app.backend.calls("POST /auth/refresh"), 0);
}

#[tokio::test]
async fn test_logout_during_refresh_is_not_undone() {
    let app = common::TestApp::logged_in().await;
    app.backend.refresh_delay_ms.store(300, Ordering::SeqCst);
    app.backend.expire_access_token();

    let query = all_tasks();
    let logout_mid_refresh = async {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        app.client.session.logout();
    };
    let (listed, ()) = tokio::join!(app.client.tasks.list(&query), logout_mid_refresh);

    assert!(listed.unwrap_err().is_unauthorized());
    assert_eq!(app.backend.calls("POST /auth/refresh"), 1);
    assert_eq!(app.backend.calls("GET /task"), 1);
    assert!(!app.client.session.is_logged_in());
    assert!(app.client.session.current_user().is_none());
    assert!(!app.client.session.state().is_logged_in());
}
