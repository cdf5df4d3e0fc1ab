use crate::api::attendance::{DayReport, PeriodReport};
use crate::api::scan::ScanRequest;
use crate::api::subject::{RegisterSubject, SubjectListResponse, SubjectQuery};
use crate::model::record::{AttendanceRecord, PeriodAccumulator};
use crate::model::subject::Subject;
use crate::schedule::Period;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Badgetrack API",
        version = "1.0.0",
        description = r#"
## RFID Presence Tracking

This API powers an **RFID badge attendance** service tracking physical
presence across a fixed daily schedule of named periods.

### 🔹 Key Features
- **Scan**
  - A single endpoint toggles a badge holder between present and absent
  - Every exit folds the presence interval into per-period minute totals
- **Attendance**
  - Per-day, per-period coverage with a present/absent verdict against a
    configurable fraction of each period's duration
- **Subjects**
  - Badge registration and listing

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

### 🚀 Usage
Point your badge readers at `POST /api/rfid` with `{"cardID": "..."}`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::scan::scan,
        crate::api::attendance::day_report,
        crate::api::subject::create_subject,
        crate::api::subject::list_subjects,
    ),
    components(
        schemas(
            ScanRequest,
            DayReport,
            PeriodReport,
            RegisterSubject,
            SubjectQuery,
            SubjectListResponse,
            Subject,
            Period,
            AttendanceRecord,
            PeriodAccumulator,
        )
    ),
    tags(
        (name = "Scan", description = "Badge scan ingestion"),
        (name = "Attendance", description = "Per-day attendance records"),
        (name = "Subject", description = "Badge registration APIs"),
    )
)]
pub struct ApiDoc;
