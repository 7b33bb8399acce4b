use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// ValidatedJson
///
/// Drop-in replacement for `axum::Json` on request bodies. Deserialization failures
/// (malformed JSON, missing required fields, wrong types) and `validator` rule
/// violations are both reported as `ApiError::Validation` (400) before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(describe(&errors)))?;

        Ok(Self(value))
    }
}

/// Flattens field errors into one line, sorted by field name for stable output.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCourseRequest, SignupRequest};
    use axum::{body::Body, http::header};

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let req = json_request(r#"{"name":"A","email":"a@x.com","phone":"111","password":"p"}"#);
        let ValidatedJson(body) = ValidatedJson::<SignupRequest>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(body.email, "a@x.com");
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let req = json_request(r#"{"name":"A","email":"a@x.com","phone":"111"}"#);
        let err = ValidatedJson::<SignupRequest>::from_request(req, &())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("password"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rule_violations_are_reported_per_field() {
        let req = json_request(r#"{"title":"","class_level":13,"subject":"Maths","price":-1}"#);
        let err = ValidatedJson::<CreateCourseRequest>::from_request(req, &())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => {
                assert!(msg.contains("class_level must be between 1 and 12"));
                assert!(msg.contains("price must not be negative"));
                assert!(msg.contains("title is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
