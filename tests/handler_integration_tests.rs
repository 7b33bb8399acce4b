use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use coaching_portal::{
    AppConfig, AppState, bootstrap, create_router,
    config::{BootstrapAdmin, MIN_BCRYPT_COST},
    models::{AuthResponse, Course, DashboardStats, EnquiryList, MeResponse, MessageResponse},
    repository::{InMemoryRepository, Repository, RepositoryState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- Harness ---

struct TestApp {
    router: Router,
    repo: RepositoryState,
}

impl TestApp {
    fn new() -> Self {
        Self::with_repo(Arc::new(InMemoryRepository::new()))
    }

    fn with_repo(repo: RepositoryState) -> Self {
        let state = AppState {
            repo: repo.clone(),
            config: AppConfig::default(),
        };
        Self {
            router: create_router(state),
            repo,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn signup(&self, email: &str) -> AuthResponse {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "name": "Asha",
                    "email": email,
                    "phone": "9800000000",
                    "password": "hunter22"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body).unwrap()
    }

    async fn admin_token(&self) -> String {
        let admin = BootstrapAdmin {
            name: "Owner".to_string(),
            email: "owner@example.com".to_string(),
            phone: "000".to_string(),
            password: "owner-pass".to_string(),
        };
        bootstrap::ensure_admin(self.repo.as_ref(), &admin, MIN_BCRYPT_COST)
            .await
            .unwrap();

        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": admin.email, "password": admin.password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let auth: AuthResponse = serde_json::from_value(body).unwrap();
        auth.access_token
    }
}

fn sample_course() -> Value {
    json!({
        "title": "Class 10 Maths Foundation",
        "class_level": 10,
        "subject": "Mathematics",
        "price": 4999.0,
        "syllabus": ["Real Numbers", "Polynomials"],
        "features": ["Weekly tests"]
    })
}

fn sample_enquiry() -> Value {
    json!({
        "name": "Kiran",
        "parent_name": "Meena",
        "studentClass": "10",
        "phone": "9811111111",
        "email": "kiran@example.com",
        "course": "Class 10 Maths Foundation"
    })
}

fn message(body: &Value) -> String {
    serde_json::from_value::<MessageResponse>(body.clone())
        .unwrap()
        .message
}

// --- Auth ---

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::new();
    let (status, _) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn signup_then_me_returns_the_same_account() {
    let app = TestApp::new();
    let auth = app.signup("asha@example.com").await;

    assert!(!auth.access_token.is_empty());
    assert_eq!(auth.user.role.as_str(), "user");

    let (status, body) = app
        .send("GET", "/api/auth/me", Some(&auth.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let me: MeResponse = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(me.user.email, "asha@example.com");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = TestApp::new();
    app.signup("dup@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"name": "B", "email": "dup@example.com", "phone": "1", "password": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(message(&body), "User already exists");
}

#[tokio::test]
async fn signup_missing_field_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"name": "B", "email": "b@example.com", "phone": "1", "password": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.repo.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new();
    app.signup("asha@example.com").await;

    let (wrong_pw, body_a) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "asha@example.com", "password": "nope"})),
        )
        .await;
    let (unknown, body_b) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "nope"})),
        )
        .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body_a), "Invalid email or password");
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn guard_messages_for_missing_and_bad_tokens() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Not authorized, token missing");

    let (status, body) = app
        .send("GET", "/api/auth/me", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Not authorized, token failed");
}

#[tokio::test]
async fn token_of_deleted_account_stops_working() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.signup("gone@example.com").await;

    let (status, _) = app
        .send("DELETE", &format!("/api/auth/users/{}", user.user.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send("GET", "/api/auth/me", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Not authorized, user not found");
}

#[tokio::test]
async fn role_change_applies_to_existing_token() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.signup("promote@example.com").await;

    let (status, _) = app
        .send("GET", "/api/enquiry/all", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/api/auth/users/{}/role", user.user.id),
            Some(&admin),
            Some(json!({"role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = app
        .send("GET", "/api/enquiry/all", Some(&user.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_lists_users_without_hashes() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.signup("one@example.com").await;

    let (status, body) = app.send("GET", "/api/auth/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

// --- Enquiries ---

#[tokio::test]
async fn public_enquiry_then_admin_listing() {
    let app = TestApp::new();

    let (status, body) = app
        .send("POST", "/api/enquiry/detail", None, Some(sample_enquiry()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message(&body), "Enquiry saved successfully");

    let (status, _) = app.send("GET", "/api/enquiry/all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.admin_token().await;
    let (status, body) = app
        .send("GET", "/api/enquiry/all", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list: EnquiryList = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(list.enquiries.len(), 1);
    assert_eq!(body["enquiries"][0]["studentClass"], "10");
}

#[tokio::test]
async fn enquiry_without_required_field_is_rejected() {
    let app = TestApp::new();
    let mut enquiry = sample_enquiry();
    enquiry.as_object_mut().unwrap().remove("phone");

    let (status, _) = app
        .send("POST", "/api/enquiry/detail", None, Some(enquiry))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.repo.list_enquiries().await.unwrap().is_empty());
}

#[tokio::test]
async fn enquiries_are_listed_newest_first() {
    let app = TestApp::new();
    for name in ["first", "second", "third"] {
        let mut enquiry = sample_enquiry();
        enquiry["name"] = json!(name);
        app.send("POST", "/api/enquiry/detail", None, Some(enquiry))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let admin = app.admin_token().await;

    let (_, body) = app
        .send("GET", "/api/enquiry/all", Some(&admin), None)
        .await;
    let names: Vec<&str> = body["enquiries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn enquiry_update_and_delete() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.send("POST", "/api/enquiry/detail", None, Some(sample_enquiry()))
        .await;
    let id = app.repo.list_enquiries().await.unwrap()[0].id;

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/enquiry/{id}"),
            Some(&admin),
            Some(json!({"message": "called back"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "called back");
    assert_eq!(body["name"], "Kiran");

    let (status, body) = app
        .send("DELETE", &format!("/api/enquiry/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&body), "Enquiry deleted successfully");

    let (status, _) = app
        .send("GET", &format!("/api/enquiry/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Courses ---

#[tokio::test]
async fn course_create_then_public_read() {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(sample_course()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Course = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .send("GET", &format!("/api/enrolled/course/{}", created.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Course = serde_json::from_value(body).unwrap();
    assert_eq!(fetched, created);

    let (status, _) = app
        .send("GET", &format!("/api/enrolled/getallproduct/{}", created.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", "/api/enrolled/getallproduct", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

fn full_course() -> Value {
    json!({
        "title": "Class 12 Physics Crash Course",
        "class_level": 12,
        "subject": "Physics",
        "description": "Board and entrance revision",
        "price": 7499.5,
        "duration": "3 months",
        "teacher_name": "R. Sharma",
        "thumbnail_url": "https://cdn.example.com/physics.png",
        "video_url": "https://cdn.example.com/physics-intro.mp4",
        "syllabus": ["Electrostatics", "Optics", "Modern Physics"],
        "features": ["Doubt sessions", "Mock tests"]
    })
}

#[tokio::test]
async fn course_round_trip_keeps_every_field() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let input = full_course();

    let (status, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(input.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, fetched) = app
        .send("GET", &format!("/api/enrolled/course/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    for (key, expected) in input.as_object().unwrap() {
        assert_eq!(&fetched[key], expected, "field {key} changed");
    }
    assert!(fetched["created_at"].is_string());
    assert!(fetched["updated_at"].is_string());
}

#[tokio::test]
async fn explicit_null_clears_optional_course_fields() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(full_course()))
        .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .send(
            "PUT",
            &format!("/api/enrolled/product/{id}"),
            Some(&admin),
            Some(json!({"description": null, "video_url": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["description"].is_null());
    assert!(updated["video_url"].is_null());
    assert_eq!(updated["teacher_name"], "R. Sharma");
    assert_eq!(updated["duration"], "3 months");

    let (_, fetched) = app
        .send("GET", &format!("/api/enrolled/course/{id}"), None, None)
        .await;
    assert!(fetched["description"].is_null());
}

#[tokio::test]
async fn non_admin_cannot_touch_the_catalog() {
    let app = TestApp::new();
    let user = app.signup("student@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/enrolled/addproduct",
            Some(&user.access_token),
            Some(sample_course()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Not authorized as admin");

    let (status, _) = app
        .send("POST", "/api/enrolled/addproduct", None, Some(sample_course()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.repo.list_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_course_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let mut course = sample_course();
    course["class_level"] = json!(13);

    let (status, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(course))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "class_level must be between 1 and 12");
}

#[tokio::test]
async fn course_partial_update_keeps_other_fields() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(sample_course()))
        .await;
    let created: Course = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/enrolled/product/{}", created.id),
            Some(&admin),
            Some(json!({"price": 3999.0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Course = serde_json::from_value(body).unwrap();
    assert_eq!(updated.price, 3999.0);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.syllabus, created.syllabus);
}

#[tokio::test]
async fn missing_course_is_not_found_and_nothing_changes() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.send("POST", "/api/enrolled/addproduct", Some(&admin), Some(sample_course()))
        .await;
    let missing = Uuid::new_v4();

    let (status, body) = app
        .send("DELETE", &format!("/api/enrolled/product/{missing}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Course not found");

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/enrolled/product/{missing}"),
            Some(&admin),
            Some(json!({"title": "ghost"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("GET", "/api/enrolled/course/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.repo.list_courses().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleted_course_is_gone() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, body) = app
        .send("POST", "/api/enrolled/addproduct", Some(&admin), Some(sample_course()))
        .await;
    let created: Course = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .send("DELETE", &format!("/api/enrolled/product/{}", created.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&body), "Course deleted successfully");

    let (status, _) = app
        .send("GET", &format!("/api/enrolled/course/{}", created.id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Dashboard & failures ---

#[tokio::test]
async fn stats_count_every_collection() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    app.signup("s@example.com").await;
    app.send("POST", "/api/enrolled/addproduct", Some(&admin), Some(sample_course()))
        .await;
    app.send("POST", "/api/enquiry/detail", None, Some(sample_enquiry()))
        .await;

    let (status, body) = app.send("GET", "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats: DashboardStats = serde_json::from_value(body).unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_courses, 1);
    assert_eq!(stats.total_enquiries, 1);
    assert_eq!(stats.recent_enquiries.len(), 1);
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() {
    let app = TestApp::with_repo(Arc::new(InMemoryRepository::new_failing()));

    let (status, body) = app.send("GET", "/api/enrolled/getallproduct", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(&body), "Internal server error");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
