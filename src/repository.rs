use crate::models::{
    Course, CreateCourseRequest, CreateEnquiryRequest, DashboardStats, Enquiry, NewUser, Role,
    UpdateCourseRequest, UpdateEnquiryRequest, User,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Number of enquiries included in the dashboard's "recent" list.
pub const RECENT_ENQUIRIES: usize = 5;

/// RepoError
///
/// Storage failures. Unique-key violations are separated out so the boundary can
/// answer 409 instead of 500; everything else is an opaque database error.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return RepoError::Conflict(db.constraint().unwrap_or("unique").to_string());
            }
        }
        RepoError::Database(e)
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract for the three collections. Each collection is an
/// independent CRUD surface; no method touches more than one record except the
/// list/count queries.
///
/// `get`/`update`/`delete` report a missing id as `None` / `false`; the handlers
/// turn that into `NotFound`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // Newest accounts first.
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Courses ---
    async fn create_course(&self, req: CreateCourseRequest) -> RepoResult<Course>;
    // Catalog order: oldest first.
    async fn list_courses(&self) -> RepoResult<Vec<Course>>;
    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>>;
    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest)
    -> RepoResult<Option<Course>>;
    async fn delete_course(&self, id: Uuid) -> RepoResult<bool>;
    /// Removes every course, returning how many were deleted. Used by the seeder.
    async fn clear_courses(&self) -> RepoResult<u64>;

    // --- Enquiries ---
    async fn create_enquiry(&self, req: CreateEnquiryRequest) -> RepoResult<Enquiry>;
    // Newest first.
    async fn list_enquiries(&self) -> RepoResult<Vec<Enquiry>>;
    async fn get_enquiry(&self, id: Uuid) -> RepoResult<Option<Enquiry>>;
    async fn update_enquiry(
        &self,
        id: Uuid,
        req: UpdateEnquiryRequest,
    ) -> RepoResult<Option<Enquiry>>;
    async fn delete_enquiry(&self, id: Uuid) -> RepoResult<bool>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<DashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, title, class_level, subject, description, price, duration, \
     teacher_name, thumbnail_url, video_url, syllabus, features, created_at, updated_at";

const ENQUIRY_COLUMNS: &str = "id, name, parent_name, student_class, phone, email, course, \
     message, created_at, updated_at";

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL. Queries are
/// built at runtime and mapped through `FromRow`, so no database is needed at compile time.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, phone, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_course(&self, req: CreateCourseRequest) -> RepoResult<Course> {
        let course = Course::new(req, Utc::now());
        let sql = format!(
            "INSERT INTO courses ({COURSE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COURSE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Course>(&sql)
            .bind(course.id)
            .bind(&course.title)
            .bind(course.class_level)
            .bind(&course.subject)
            .bind(&course.description)
            .bind(course.price)
            .bind(&course.duration)
            .bind(&course.teacher_name)
            .bind(&course.thumbnail_url)
            .bind(&course.video_url)
            .bind(&course.syllabus)
            .bind(&course.features)
            .bind(course.created_at)
            .bind(course.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, Course>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Partial update: the row is locked, merged with `Course::apply` and written back,
    /// so absent fields keep their value and an explicit `null` clears one.
    async fn update_course(
        &self,
        id: Uuid,
        req: UpdateCourseRequest,
    ) -> RepoResult<Option<Course>> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 FOR UPDATE");
        let Some(mut course) = sqlx::query_as::<_, Course>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        course.apply(req, Utc::now());

        let sql = format!(
            "UPDATE courses SET \
                title = $2, class_level = $3, subject = $4, description = $5, price = $6, \
                duration = $7, teacher_name = $8, thumbnail_url = $9, video_url = $10, \
                syllabus = $11, features = $12, updated_at = $13 \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Course>(&sql)
            .bind(course.id)
            .bind(&course.title)
            .bind(course.class_level)
            .bind(&course.subject)
            .bind(&course.description)
            .bind(course.price)
            .bind(&course.duration)
            .bind(&course.teacher_name)
            .bind(&course.thumbnail_url)
            .bind(&course.video_url)
            .bind(&course.syllabus)
            .bind(&course.features)
            .bind(course.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_course(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_courses(&self) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM courses")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_enquiry(&self, req: CreateEnquiryRequest) -> RepoResult<Enquiry> {
        let enquiry = Enquiry::new(req, Utc::now());
        let sql = format!(
            "INSERT INTO enquiries ({ENQUIRY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ENQUIRY_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Enquiry>(&sql)
            .bind(enquiry.id)
            .bind(&enquiry.name)
            .bind(&enquiry.parent_name)
            .bind(&enquiry.student_class)
            .bind(&enquiry.phone)
            .bind(&enquiry.email)
            .bind(&enquiry.course)
            .bind(&enquiry.message)
            .bind(enquiry.created_at)
            .bind(enquiry.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_enquiries(&self) -> RepoResult<Vec<Enquiry>> {
        let sql = format!("SELECT {ENQUIRY_COLUMNS} FROM enquiries ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Enquiry>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_enquiry(&self, id: Uuid) -> RepoResult<Option<Enquiry>> {
        let sql = format!("SELECT {ENQUIRY_COLUMNS} FROM enquiries WHERE id = $1");
        Ok(sqlx::query_as::<_, Enquiry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_enquiry(
        &self,
        id: Uuid,
        req: UpdateEnquiryRequest,
    ) -> RepoResult<Option<Enquiry>> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {ENQUIRY_COLUMNS} FROM enquiries WHERE id = $1 FOR UPDATE");
        let Some(mut enquiry) = sqlx::query_as::<_, Enquiry>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        enquiry.apply(req, Utc::now());

        let sql = format!(
            "UPDATE enquiries SET \
                name = $2, parent_name = $3, student_class = $4, phone = $5, email = $6, \
                course = $7, message = $8, updated_at = $9 \
             WHERE id = $1 RETURNING {ENQUIRY_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Enquiry>(&sql)
            .bind(enquiry.id)
            .bind(&enquiry.name)
            .bind(&enquiry.parent_name)
            .bind(&enquiry.student_class)
            .bind(&enquiry.phone)
            .bind(&enquiry.email)
            .bind(&enquiry.course)
            .bind(&enquiry.message)
            .bind(enquiry.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_enquiry(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM enquiries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_stats(&self) -> RepoResult<DashboardStats> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        let total_enquiries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enquiries")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {ENQUIRY_COLUMNS} FROM enquiries ORDER BY created_at DESC LIMIT $1"
        );
        let recent_enquiries = sqlx::query_as::<_, Enquiry>(&sql)
            .bind(RECENT_ENQUIRIES as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_users,
            total_courses,
            total_enquiries,
            recent_enquiries,
        })
    }
}

/// InMemoryRepository
///
/// A process-local implementation of `Repository` used by the test-suite and for
/// running the API without a database. Enforces the same unique-email rule as the
/// Postgres schema.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    courses: RwLock<Vec<Course>>,
    enquiries: RwLock<Vec<Enquiry>>,
    /// When true, every operation fails with a simulated database error.
    should_fail: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> RepoResult<()> {
        if self.should_fail {
            return Err(RepoError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.check()?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict("users_email_key".to_string()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.check()?;
        Ok(self.users.read().await.iter().rev().cloned().collect())
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        self.check()?;
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.role = role;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn create_course(&self, req: CreateCourseRequest) -> RepoResult<Course> {
        self.check()?;
        let course = Course::new(req, Utc::now());
        self.courses.write().await.push(course.clone());
        Ok(course)
    }

    async fn list_courses(&self) -> RepoResult<Vec<Course>> {
        self.check()?;
        Ok(self.courses.read().await.clone())
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        self.check()?;
        Ok(self
            .courses
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn update_course(
        &self,
        id: Uuid,
        req: UpdateCourseRequest,
    ) -> RepoResult<Option<Course>> {
        self.check()?;
        let mut courses = self.courses.write().await;
        Ok(courses.iter_mut().find(|c| c.id == id).map(|c| {
            c.apply(req, Utc::now());
            c.clone()
        }))
    }

    async fn delete_course(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut courses = self.courses.write().await;
        let before = courses.len();
        courses.retain(|c| c.id != id);
        Ok(courses.len() < before)
    }

    async fn clear_courses(&self) -> RepoResult<u64> {
        self.check()?;
        let mut courses = self.courses.write().await;
        let removed = courses.len() as u64;
        courses.clear();
        Ok(removed)
    }

    async fn create_enquiry(&self, req: CreateEnquiryRequest) -> RepoResult<Enquiry> {
        self.check()?;
        let enquiry = Enquiry::new(req, Utc::now());
        self.enquiries.write().await.push(enquiry.clone());
        Ok(enquiry)
    }

    async fn list_enquiries(&self) -> RepoResult<Vec<Enquiry>> {
        self.check()?;
        Ok(self.enquiries.read().await.iter().rev().cloned().collect())
    }

    async fn get_enquiry(&self, id: Uuid) -> RepoResult<Option<Enquiry>> {
        self.check()?;
        Ok(self
            .enquiries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn update_enquiry(
        &self,
        id: Uuid,
        req: UpdateEnquiryRequest,
    ) -> RepoResult<Option<Enquiry>> {
        self.check()?;
        let mut enquiries = self.enquiries.write().await;
        Ok(enquiries.iter_mut().find(|e| e.id == id).map(|e| {
            e.apply(req, Utc::now());
            e.clone()
        }))
    }

    async fn delete_enquiry(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut enquiries = self.enquiries.write().await;
        let before = enquiries.len();
        enquiries.retain(|e| e.id != id);
        Ok(enquiries.len() < before)
    }

    async fn get_stats(&self) -> RepoResult<DashboardStats> {
        self.check()?;
        let enquiries = self.enquiries.read().await;
        Ok(DashboardStats {
            total_users: self.users.read().await.len() as i64,
            total_courses: self.courses.read().await.len() as i64,
            total_enquiries: enquiries.len() as i64,
            recent_enquiries: enquiries.iter().rev().take(RECENT_ENQUIRIES).cloned().collect(),
        })
    }
}
