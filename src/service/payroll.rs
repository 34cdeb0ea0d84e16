//! Payroll engine: prorates each active employee's gross monthly salary by
//! the days they checked in and keeps one payslip per employee and month.

use chrono::{Months, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::*;
use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::{
    error::{AppError, AppResult},
    model::{
        employee::EmployeeSalary,
        payslip::{Payslip, PayslipFilter, PayslipStatus},
    },
    service::{attendance, directory},
    utils::tabular::render_csv,
};

/// First and last calendar day of a month, and its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
}

const MONTH_FORMAT_ERROR: &str = "Invalid month format. Use YYYY-MM";

/// Parses `YYYY-MM`.
pub fn month_bounds(month: &str) -> AppResult<MonthBounds> {
    let invalid = || AppError::invalid_input(MONTH_FORMAT_ERROR);

    let (year, month) = month.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.trim().parse().map_err(|_| invalid())?;
    let month: u32 = month.trim().parse().map_err(|_| invalid())?;
    if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    let total_days = (end - start).num_days() + 1;

    Ok(MonthBounds {
        start,
        end,
        total_days,
    })
}

const CENTS: u32 = 2;

/// `gross * present / total` in decimal, rounded half away from zero to
/// cents; zero when the month is empty.
pub fn prorate(gross: f64, days_present: i64, total_days: i64) -> f64 {
    if total_days <= 0 {
        return 0.0;
    }
    let gross = Decimal::from_f64(gross).unwrap_or_default();
    let payable = gross * Decimal::from(days_present) / Decimal::from(total_days);
    payable
        .round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Computes and upserts payslips for `month`, returning the affected ids.
///
/// Each employee's upsert stands alone: a failure is logged and skipped
/// without undoing the others. Only an unparseable month aborts, before any
/// write.
#[instrument(name = "generate_payslips", skip(pool, now))]
pub async fn generate_payslips(
    pool: &SqlitePool,
    month: &str,
    employee_id: Option<i64>,
    now: NaiveDateTime,
) -> AppResult<Vec<i64>> {
    let bounds = month_bounds(month)?;
    let employees = directory::active_employees(pool, employee_id).await?;

    let mut payslip_ids = Vec::with_capacity(employees.len());
    for employee in &employees {
        match generate_for_employee(pool, employee, &bounds, now).await {
            Ok(id) => payslip_ids.push(id),
            Err(e) => {
                error!(employee_id = employee.employee_id, error = %e, "Payslip generation failed")
            }
        }
    }

    info!(
        targeted = employees.len(),
        generated = payslip_ids.len(),
        "Payslips generated"
    );
    Ok(payslip_ids)
}

async fn generate_for_employee(
    pool: &SqlitePool,
    employee: &EmployeeSalary,
    bounds: &MonthBounds,
    now: NaiveDateTime,
) -> AppResult<i64> {
    let days_present =
        attendance::count_present_days(pool, employee.employee_id, bounds.start, bounds.end)
            .await?;
    let payable = prorate(employee.gross_monthly_salary, days_present, bounds.total_days);

    // Regeneration overwrites the figures and always falls back to Draft.
    let payslip_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO payslips
        (employee_id, pay_period_start, pay_period_end, days_present, total_days_in_month,
         gross_salary_at_time, payable_salary, status, generated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'Draft', ?)
        ON CONFLICT (employee_id, pay_period_start, pay_period_end) DO UPDATE SET
            days_present = excluded.days_present,
            total_days_in_month = excluded.total_days_in_month,
            gross_salary_at_time = excluded.gross_salary_at_time,
            payable_salary = excluded.payable_salary,
            status = 'Draft',
            generated_at = excluded.generated_at
        RETURNING payslip_id
        "#,
    )
    .bind(employee.employee_id)
    .bind(bounds.start)
    .bind(bounds.end)
    .bind(days_present)
    .bind(bounds.total_days)
    .bind(employee.gross_monthly_salary)
    .bind(payable)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(payslip_id)
}

pub fn parse_status(status: &str) -> AppResult<PayslipStatus> {
    status
        .parse()
        .map_err(|_| AppError::invalid_input("status must be 'Draft' or 'Finalized'"))
}

/// Sets the status as given; cycling between states is allowed.
pub async fn transition_status(pool: &SqlitePool, payslip_id: i64, status: &str) -> AppResult<()> {
    let status = parse_status(status)?;

    let result = sqlx::query("UPDATE payslips SET status = ? WHERE payslip_id = ?")
        .bind(status.to_string())
        .bind(payslip_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Payslip not found"));
    }

    info!(payslip_id, %status, "Payslip status updated");
    Ok(())
}

pub async fn get(pool: &SqlitePool, payslip_id: i64) -> AppResult<Payslip> {
    sqlx::query_as::<_, Payslip>("SELECT * FROM payslips WHERE payslip_id = ?")
        .bind(payslip_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Payslip not found"))
}

/// Most recently generated first.
pub async fn list(pool: &SqlitePool, filter: &PayslipFilter) -> AppResult<Vec<Payslip>> {
    let bounds = filter.month.as_deref().map(month_bounds).transpose()?;
    let status = filter.status.as_deref().map(parse_status).transpose()?;

    let start = bounds.map(|b| b.start);
    let end = bounds.map(|b| b.end);
    let status = status.map(|s| s.to_string());

    let rows = sqlx::query_as::<_, Payslip>(
        r#"
        SELECT * FROM payslips
        WHERE (? IS NULL OR employee_id = ?)
        AND (? IS NULL OR (pay_period_start = ? AND pay_period_end = ?))
        AND (? IS NULL OR status = ?)
        ORDER BY generated_at DESC, payslip_id DESC
        "#,
    )
    .bind(filter.employee_id)
    .bind(filter.employee_id)
    .bind(start)
    .bind(start)
    .bind(end)
    .bind(&status)
    .bind(&status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub const PAYSLIP_CSV_HEADERS: [&str; 10] = [
    "payslip_id",
    "employee_id",
    "pay_period_start",
    "pay_period_end",
    "days_present",
    "total_days_in_month",
    "gross_salary_at_time",
    "payable_salary",
    "status",
    "generated_at",
];

pub fn payslip_csv(p: &Payslip) -> String {
    let row = vec![
        p.payslip_id.to_string(),
        p.employee_id.to_string(),
        p.pay_period_start.to_string(),
        p.pay_period_end.to_string(),
        p.days_present.to_string(),
        p.total_days_in_month.to_string(),
        format!("{:.2}", p.gross_salary_at_time),
        format!("{:.2}", p.payable_salary),
        p.status.to_string(),
        p.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ];
    render_csv(&PAYSLIP_CSV_HEADERS, [row])
}
