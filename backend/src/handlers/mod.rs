pub mod attractions;
pub mod dates;
pub mod transactions;
pub mod users;

pub use attractions::{get_attraction, list_attractions, upsert_attraction};
pub use dates::{get_date, propose_date, update_date};
pub use transactions::{get_balance, list_transactions, purchase_tokens, replenish_all_users};
pub use users::create_user;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use crate::db::PgUserDirectory;
use crate::error::CoreError;
use crate::services::{AttractionMatcher, DateScheduler, TokenLedger};

/// Service references shared by every handler; built once at startup and
/// cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<TokenLedger>,
    pub matcher: Arc<AttractionMatcher>,
    pub scheduler: Arc<DateScheduler>,
    pub users: Arc<PgUserDirectory>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type Rejection = (StatusCode, Json<ErrorBody>);

/// Maps a core error onto its HTTP rejection. Internal and critical errors
/// get logged here with full detail; the response body stays generic.
pub(crate) fn reject(err: CoreError) -> Rejection {
    if matches!(err, CoreError::Internal(_) | CoreError::Critical { .. }) {
        tracing::error!(error = %err, "request failed");
    }
    (
        err.status_code(),
        Json(ErrorBody {
            error: err.public_message(),
        }),
    )
}
