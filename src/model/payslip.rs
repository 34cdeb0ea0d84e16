use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, ToSchema,
)]
pub enum PayslipStatus {
    Draft,
    Finalized,
}

impl TryFrom<String> for PayslipStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "payslip_id": 7,
        "employee_id": 1,
        "pay_period_start": "2024-02-01",
        "pay_period_end": "2024-02-29",
        "days_present": 20,
        "total_days_in_month": 29,
        "gross_salary_at_time": 3000.0,
        "payable_salary": 2068.97,
        "status": "Draft",
        "generated_at": "2024-03-01T10:00:00"
    })
)]
pub struct Payslip {
    pub payslip_id: i64,
    pub employee_id: i64,

    #[schema(value_type = String, format = "date")]
    pub pay_period_start: NaiveDate,

    #[schema(value_type = String, format = "date")]
    pub pay_period_end: NaiveDate,

    pub days_present: i64,
    pub total_days_in_month: i64,
    pub gross_salary_at_time: f64,
    pub payable_salary: f64,

    #[sqlx(try_from = "String")]
    pub status: PayslipStatus,

    #[schema(value_type = String, format = "date-time")]
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct PayslipFilter {
    pub employee_id: Option<i64>,
    pub month: Option<String>,
    pub status: Option<String>,
}
