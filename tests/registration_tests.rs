//! 注册与登录集成测试

mod common;

use axum::http::StatusCode;
use common::{build_app, register_student, send, test_config};
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn test_duplicate_email_is_rejected_case_insensitively() {
    let app = build_app(&test_config()).await;
    register_student(&app, "meera@example.com", "PRIMARY_4").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "  MEERA@example.com ",
            "password": "password123",
            "name": "Another Meera",
            "role": "PARENT"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["error"], "User with this email already exists");
}

#[tokio::test]
async fn test_student_without_grade_creates_nothing() {
    let app = build_app(&test_config()).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "nograde@example.com",
            "password": "password123",
            "name": "No Grade",
            "role": "STUDENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 同一邮箱随后仍可注册
    register_student(&app, "nograde@example.com", "SECONDARY_6").await;
}

#[rstest]
#[case(json!({"email": "not-an-email", "password": "password123", "name": "X", "role": "PARENT"}))]
#[case(json!({"email": "short@example.com", "password": "short", "name": "X", "role": "PARENT"}))]
#[case(json!({"email": "role@example.com", "password": "password123", "name": "X", "role": "PRINCIPAL"}))]
#[case(json!({"email": "grade@example.com", "password": "password123", "name": "X", "role": "STUDENT", "gradeLevel": "GRADE_13"}))]
#[tokio::test]
async fn test_invalid_registration_is_400(#[case] payload: serde_json::Value) {
    let app = build_app(&test_config()).await;
    let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_teacher_profile_round_trip() {
    let app = build_app(&test_config()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "teacher@example.com",
            "password": "password123",
            "name": "Kavya Nair",
            "role": "TEACHER",
            "specialization": "Science",
            "experience": 7,
            "qualification": "M.Sc"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["initials"], "KN");

    let (status, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "Teacher@Example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = login["token"].as_str().unwrap();
    let (status, me) = send(&app, "GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["profile"]["kind"], "teacher");
    assert_eq!(me["profile"]["specialization"], "Science");
    assert_eq!(me["profile"]["experience"], 7);
}

#[tokio::test]
async fn test_raw_user_id_disabled() {
    let mut config = test_config();
    config.security.allow_raw_user_id = false;
    let app = build_app(&config).await;
    let user_id = register_student(&app, "raw@example.com", "PRIMARY_2").await;

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&user_id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
