//! CSRF token issuing endpoint.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use tracing::instrument;

use crate::models::CsrfTokenResponse;
use crate::state::AppState;

/// Issue a CSRF token.
///
/// Sets the secret cookie on first use; later calls reuse it.
///
/// ```json
/// { "csrfToken": "k3Xz9QaB-5f1c...e04" }
/// ```
#[instrument(skip_all)]
pub async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfTokenResponse>) {
    let (jar, csrf_token) = state.csrf.issue_token(jar);
    (jar, Json(CsrfTokenResponse { csrf_token }))
}
