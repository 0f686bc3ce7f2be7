use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::dtos::ErrorResponse;

/// JSON body that has passed its `validator` rules.
///
/// Malformed bodies keep axum's rejection status (400/415/422); rule
/// violations answer 422 with the offending fields listed.
pub struct ValidatedJson<T>(pub T);

fn reject(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// `email: Invalid email format; password: Password is required`
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| reject(rejection.status(), rejection.body_text()))?;
        let Json(value) = body;

        if let Err(errors) = value.validate() {
            tracing::debug!(errors = %describe(&errors), "Request body failed validation");
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Validation error: {}", describe(&errors)),
            ));
        }

        Ok(ValidatedJson(value))
    }
}
