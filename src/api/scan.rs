use crate::api::AppState;
use crate::error::{EngineError, StoreError};
use crate::model::subject::Subject;
use crate::store::{IdentityStore, RecordStore};
use crate::utils::card_filter;
use crate::utils::identity_cache;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

/// How many times a scan reloads and reapplies after losing a version race.
const MAX_SCAN_RETRIES: u32 = 3;

/// Payload sent by the badge readers.
#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    #[serde(rename = "cardID", alias = "cardId", alias = "card_id")]
    #[schema(example = "04A1B2C3", value_type = String)]
    pub card_id: Option<String>,
}

/// Resolve a badge token to a registered subject.
pub(crate) async fn resolve_subject<S: IdentityStore>(
    store: &S,
    token: &str,
) -> Result<Option<Subject>, StoreError> {
    // Cuckoo filter — fast negative
    // if filter says not exist then the badge was never registered.
    if !card_filter::might_exist(token) {
        return Ok(None);
    }

    // Moka cache — fast positive
    if let Some(subject) = identity_cache::get(token).await {
        return Ok(Some(subject));
    }

    // Database fallback
    let subject = store.lookup(&card_filter::normalize(token)).await?;
    if let Some(ref s) = subject {
        identity_cache::remember(s).await;
    }
    Ok(subject)
}

/// Scan endpoint: toggles presence for the badge holder
#[utoipa::path(
    post,
    path = "/api/rfid",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan applied", body = Object, example = json!({
            "message": "entered",
            "subjectName": "John Doe",
            "timestamp": "2026-08-07T09:10:00Z"
        })),
        (status = 400, description = "Missing card id", body = Object, example = json!({
            "message": "Invalid request: cardID is required"
        })),
        (status = 404, description = "Unknown card", body = Object, example = json!({
            "error": "Unknown card"
        })),
        (status = 409, description = "Scan older than the open entry, or too much write contention"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Scan"
)]
pub async fn scan<S>(
    state: web::Data<AppState<S>>,
    payload: web::Json<ScanRequest>,
) -> HttpResponse
where
    S: RecordStore + IdentityStore + 'static,
{
    let Some(token) = payload
        .card_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return HttpResponse::BadRequest().json(json!({
            "message": "Invalid request: cardID is required"
        }));
    };

    let subject = match resolve_subject(&state.store, token).await {
        Ok(Some(subject)) => subject,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({
                "error": "Unknown card"
            }));
        }
        Err(e) => {
            tracing::error!(error = %e, token, "Badge lookup failed");
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }));
        }
    };

    let now = state.clock.now();
    let day = state.engine.day_key(now);

    // Read-apply-write loop. The conditional put enforces the
    // single-writer-per-(subject, day) invariant; losing the race just means
    // reloading the record and applying the same pure transition again.
    for _ in 0..MAX_SCAN_RETRIES {
        let stored = match state.store.get_record(subject.id, day).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, subject_id = subject.id, "Record load failed");
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Internal Server Error"
                }));
            }
        };
        let (expected, snapshot) = match stored {
            Some(v) => (v.version, Some(v.value)),
            None => (0, None),
        };

        let (updated, result) = match state.engine.record_scan(subject.id, snapshot.as_ref(), now) {
            Ok(applied) => applied,
            Err(e @ EngineError::TemporalOrder { .. }) => {
                return HttpResponse::Conflict().json(json!({
                    "error": e.to_string()
                }));
            }
            Err(e) => {
                tracing::error!(error = %e, subject_id = subject.id, "Scan transition failed");
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Internal Server Error"
                }));
            }
        };

        match state.store.put_record(expected, &updated).await {
            Ok(()) => {
                tracing::info!(
                    subject_id = subject.id,
                    outcome = result.message(),
                    "Scan recorded"
                );
                return HttpResponse::Ok().json(json!({
                    "message": result.message(),
                    "subjectName": subject.display_name,
                    "timestamp": result.timestamp(),
                }));
            }
            Err(StoreError::Conflict) => continue,
            Err(e) => {
                tracing::error!(error = %e, subject_id = subject.id, "Record write failed");
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Internal Server Error"
                }));
            }
        }
    }

    HttpResponse::Conflict().json(json!({
        "error": "Too many concurrent scans for this badge, retry"
    }))
}
