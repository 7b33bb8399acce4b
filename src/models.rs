use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Deserializer for clearable fields of partial updates: an absent key stays `None`,
/// an explicit `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Identity ---

/// Role
///
/// Closed set of account roles. Stored and serialized as `"user"` / `"admin"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted role string is outside the enumeration.
#[derive(Debug, thiserror::Error)]
#[error("invalid role {0:?}, expected \"user\" or \"admin\"")]
pub struct InvalidRole(pub String);

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(InvalidRole(value)),
        }
    }
}

/// User
///
/// The persisted account record from the `users` table. Carries the password hash,
/// so it is never serialized; everything leaving the server goes through [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The public projection of this account (no password hash).
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Insert payload for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}

/// UserProfile
///
/// The user as seen by API clients (GET /api/auth/me, GET /api/auth/users, login/signup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Auth Payloads ---

/// SignupRequest
///
/// Input for POST /api/auth/signup. Any `role` in the body is ignored; new accounts
/// are always `user`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// LoginRequest
///
/// Input for POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// AuthResponse
///
/// Returned by signup and login. The client keeps both parts in its session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// MeResponse
///
/// Envelope for GET /api/auth/me.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// UpdateRoleRequest
///
/// Input for PATCH /api/auth/users/{id}/role.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// MessageResponse
///
/// Generic acknowledgement body, e.g. `{"message": "Enquiry deleted successfully"}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Course Catalog ---

/// Course
///
/// A catalog entry from the `courses` table. `price` is a plain amount without a
/// currency minor unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, TS, ToSchema, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub class_level: i32,
    pub subject: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration: Option<String>,
    pub teacher_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub syllabus: Vec<String>,
    pub features: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Builds a fresh record with a new id and both timestamps set to `now`.
    pub fn new(req: CreateCourseRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: req.title,
            class_level: req.class_level,
            subject: req.subject,
            description: req.description,
            price: req.price,
            duration: req.duration,
            teacher_name: req.teacher_name,
            thumbnail_url: req.thumbnail_url,
            video_url: req.video_url,
            syllabus: req.syllabus,
            features: req.features,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every field present in `req`; absent fields are untouched and an explicit
    /// `null` clears an optional field.
    pub fn apply(&mut self, req: UpdateCourseRequest, now: DateTime<Utc>) {
        if let Some(v) = req.title {
            self.title = v;
        }
        if let Some(v) = req.class_level {
            self.class_level = v;
        }
        if let Some(v) = req.subject {
            self.subject = v;
        }
        if let Some(v) = req.description {
            self.description = v;
        }
        if let Some(v) = req.price {
            self.price = v;
        }
        if let Some(v) = req.duration {
            self.duration = v;
        }
        if let Some(v) = req.teacher_name {
            self.teacher_name = v;
        }
        if let Some(v) = req.thumbnail_url {
            self.thumbnail_url = v;
        }
        if let Some(v) = req.video_url {
            self.video_url = v;
        }
        if let Some(v) = req.syllabus {
            self.syllabus = v;
        }
        if let Some(v) = req.features {
            self.features = v;
        }
        self.updated_at = now;
    }
}

/// CreateCourseRequest
///
/// Input for POST /api/enrolled/addproduct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(range(min = 1, max = 12, message = "class_level must be between 1 and 12"))]
    pub class_level: i32,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub syllabus: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// UpdateCourseRequest
///
/// Partial update for PUT /api/enrolled/product/{id}. Only the fields present in the
/// body are written.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 12, message = "class_level must be between 1 and 12"))]
    pub class_level: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub subject: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub duration: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub teacher_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub thumbnail_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub video_url: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

// --- Enquiries ---

/// Enquiry
///
/// A lead captured by the public enquiry form (`enquiries` table). The wire name of
/// `student_class` is `studentClass`, which the browser client depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, TS, ToSchema, Default)]
#[ts(export)]
pub struct Enquiry {
    pub id: Uuid,
    pub name: String,
    pub parent_name: String,
    #[serde(rename = "studentClass")]
    pub student_class: String,
    pub phone: String,
    pub email: String,
    pub course: String,
    pub message: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Enquiry {
    pub fn new(req: CreateEnquiryRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            parent_name: req.parent_name,
            student_class: req.student_class,
            phone: req.phone,
            email: req.email,
            course: req.course,
            message: req.message,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, req: UpdateEnquiryRequest, now: DateTime<Utc>) {
        if let Some(v) = req.name {
            self.name = v;
        }
        if let Some(v) = req.parent_name {
            self.parent_name = v;
        }
        if let Some(v) = req.student_class {
            self.student_class = v;
        }
        if let Some(v) = req.phone {
            self.phone = v;
        }
        if let Some(v) = req.email {
            self.email = v;
        }
        if let Some(v) = req.course {
            self.course = v;
        }
        if let Some(v) = req.message {
            self.message = v;
        }
        self.updated_at = now;
    }
}

/// CreateEnquiryRequest
///
/// Input for POST /api/enquiry/detail. `message` is the only optional field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEnquiryRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "parent_name is required"))]
    pub parent_name: String,
    #[serde(rename = "studentClass")]
    #[validate(length(min = 1, message = "studentClass is required"))]
    pub student_class: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "course is required"))]
    pub course: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// UpdateEnquiryRequest
///
/// Partial update for PUT /api/enquiry/{id} (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEnquiryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "parent_name must not be empty"))]
    pub parent_name: Option<String>,
    #[serde(rename = "studentClass", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "studentClass must not be empty"))]
    pub student_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "email must not be empty"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "course must not be empty"))]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub message: Option<Option<String>>,
}

/// EnquiryList
///
/// Envelope for GET /api/enquiry/all.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EnquiryList {
    pub enquiries: Vec<Enquiry>,
}

// --- Dashboard ---

/// DashboardStats
///
/// Output of GET /api/admin/stats: collection counts plus the five newest enquiries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_courses: i64,
    pub total_enquiries: i64,
    pub recent_enquiries: Vec<Enquiry>,
}
