use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub employee_id: i64,

    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub attendance_date: NaiveDate,

    #[schema(example = "2024-02-01T09:00:00", value_type = Option<String>, format = "date-time")]
    pub clock_in_time: Option<NaiveDateTime>,

    #[schema(example = "2024-02-01T17:30:00", value_type = Option<String>, format = "date-time")]
    pub clock_out_time: Option<NaiveDateTime>,

    pub notes: Option<String>,
}

/// Inclusive date bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
