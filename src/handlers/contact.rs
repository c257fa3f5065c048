//! Contact form endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, instrument};

use super::ApiJson;
use crate::error::AppResult;
use crate::metrics;
use crate::models::{CreateContactRequest, MessageResponse};
use crate::state::AppState;
use crate::validation::validate_contact;

/// Accept a contact form submission.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "subject": "Hello",
///   "message": "Loved the analytical engine project.",
///   "_csrf": "optional when sent as a header"
/// }
/// ```
///
/// Responds `201 {"message": "Contact form submitted successfully"}`.
#[instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let contact =
        validate_contact(request).inspect_err(|_| metrics::record_contact_submission("invalid"))?;

    let record = state
        .db
        .insert_contact(contact)
        .await
        .inspect_err(|_| metrics::record_contact_submission("error"))?;

    metrics::record_contact_submission("success");
    info!(contact_id = %record.id, "Contact form saved");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Contact form submitted successfully")),
    ))
}
