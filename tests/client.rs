mod common;

use common::{Backend, setup_server};
use cursus::client::{
    ClientError, ContentSource, ProgressSync, ProgressUpdate, UserContext, UserRole,
};
use cursus::model::{CourseContent, parse_course_content_str};
use serde_json::json;

#[tokio::test]
async fn fetch_course_with_token_test() {
    let mut backend = Backend::default();
    backend.courses.insert(
        3,
        json!({ "course": { "id": 3, "title": "Welding", "content": { "parts": [
            { "id": "p", "modules": [{ "id": "m", "lessons": [{ "id": "l", "title": "Arc" }] }] }
        ]}}}),
    );
    let server = setup_server(backend).await;
    let client = server.client(Some("s3cret"));

    let course = client.get_course(3).await.unwrap();
    assert_eq!(course.id(), 3);
    assert_eq!(course.title(), "Welding");
    assert_eq!(course.content().unwrap().lesson_count(), 1);

    let auth = server.with(|b| b.auth.clone());
    assert_eq!(auth, [Some(String::from("Bearer s3cret"))]);
}

#[tokio::test]
async fn progress_endpoints_test() {
    let mut backend = Backend::default();
    backend.progress.insert(3, json!({ "progress": 66.6 }));
    let server = setup_server(backend).await;
    let client = server.client(None);

    assert_eq!(client.get_progress(3).await.unwrap(), Some(67));
    assert_eq!(client.get_progress(4).await.unwrap(), None);

    client
        .update_progress(&ProgressUpdate::new(3, 100))
        .await
        .unwrap();
    let update = server.updates()[0];
    assert_eq!((update.course_id, update.progress, update.completed), (3, 100, true));
}

#[tokio::test]
async fn failed_sync_reports_status_test() {
    let backend = Backend {
        fail_updates: true,
        ..Default::default()
    };
    let server = setup_server(backend).await;
    let client = server.client(None);

    let err = client
        .update_progress(&ProgressUpdate::new(3, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { .. }));
    assert_eq!(err.status_code().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.client_display(), "Backend error, try again later.");
}

#[tokio::test]
async fn save_content_as_json_string_test() {
    let server = setup_server(Backend::default()).await;
    let client = server.client(None);
    let content = CourseContent::seeded();

    let editor = UserContext::new(1, UserRole::Instructor);
    editor.require_editor().unwrap();
    client.save_course_content(8, &content).await.unwrap();

    let (id, body) = server.with(|b| b.saved[0].clone());
    assert_eq!(id, 8);
    let stored = body["content"].as_str().unwrap();
    assert_eq!(parse_course_content_str(stored), Some(content));
}

#[test]
fn students_cannot_push_test() {
    let student = UserContext::student(1);
    assert!(matches!(student.require_editor(), Err(ClientError::Forbidden(_))));
    assert!(UserContext::new(1, UserRole::from("admin")).can_edit_content());
}
