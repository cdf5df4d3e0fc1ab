use crate::api::AppState;
use crate::api::scan::resolve_subject;
use crate::store::{IdentityStore, RecordStore};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct PeriodReport {
    #[schema(example = "Hour1")]
    pub name: String,
    #[schema(example = 30)]
    pub duration_minutes: u32,
    pub present: bool,
}

#[derive(Serialize, ToSchema)]
pub struct DayReport {
    pub subject_id: u64,
    #[schema(example = "John Doe")]
    pub subject_name: String,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub day: NaiveDate,
    pub checked_in: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub entry_ts: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub exit_ts: Option<DateTime<Utc>>,
    pub periods: Vec<PeriodReport>,
}

/// One subject's attendance for one day, per-period minutes included
#[utoipa::path(
    get,
    path = "/api/attendance/{token}/{day}",
    params(
        ("token" = String, Path, description = "Badge card token"),
        ("day" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Day record", body = DayReport),
        (status = 404, description = "Unknown card or no record for that day"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn day_report<S>(
    state: web::Data<AppState<S>>,
    path: web::Path<(String, NaiveDate)>,
) -> HttpResponse
where
    S: RecordStore + IdentityStore + 'static,
{
    let (token, day) = path.into_inner();

    let subject = match resolve_subject(&state.store, &token).await {
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

    let record = match state.store.get_record(subject.id, day).await {
        Ok(Some(v)) => v.value,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({
                "error": "No attendance recorded for that day"
            }));
        }
        Err(e) => {
            tracing::error!(error = %e, subject_id = subject.id, "Record load failed");
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }));
        }
    };

    // Report periods in schedule order, not map order.
    let periods = state
        .engine
        .schedule()
        .all()
        .iter()
        .filter_map(|p| {
            record.periods.get(&p.name).map(|acc| PeriodReport {
                name: p.name.clone(),
                duration_minutes: acc.duration_minutes,
                present: acc.present,
            })
        })
        .collect();

    HttpResponse::Ok().json(DayReport {
        subject_id: subject.id,
        subject_name: subject.display_name,
        day: record.day,
        checked_in: record.checked_in,
        entry_ts: record.entry_ts,
        exit_ts: record.exit_ts,
        periods,
    })
}
