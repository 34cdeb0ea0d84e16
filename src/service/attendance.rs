//! Attendance ledger: one row per employee per server-local calendar day.

use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    model::attendance::{AttendanceRecord, DateRange, Pagination},
    service::directory,
};

/// Records the first check-in of the day at `now`.
///
/// The insert-or-fill is one conditional upsert, so of two concurrent
/// check-ins exactly one sees a changed row.
pub async fn check_in(pool: &SqlitePool, employee_id: i64, now: NaiveDateTime) -> AppResult<()> {
    ensure_employee(pool, employee_id).await?;
    let today = now.date();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records (employee_id, attendance_date, clock_in_time)
        VALUES (?, ?, ?)
        ON CONFLICT (employee_id, attendance_date)
        DO UPDATE SET clock_in_time = excluded.clock_in_time
        WHERE attendance_records.clock_in_time IS NULL
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict("Already checked in today"));
    }

    info!(employee_id, %today, "Checked in");
    Ok(())
}

pub async fn check_out(pool: &SqlitePool, employee_id: i64, now: NaiveDateTime) -> AppResult<()> {
    ensure_employee(pool, employee_id).await?;
    let today = now.date();

    let result = sqlx::query(
        r#"
        UPDATE attendance_records
        SET clock_out_time = ?
        WHERE employee_id = ?
        AND attendance_date = ?
        AND clock_in_time IS NOT NULL
        AND clock_out_time IS NULL
        "#,
    )
    .bind(now)
    .bind(employee_id)
    .bind(today)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        info!(employee_id, %today, "Checked out");
        return Ok(());
    }

    // Nothing was written; work out which precondition failed.
    match find_record(pool, employee_id, today).await? {
        Some(record) if record.clock_in_time.is_some() => {
            Err(AppError::conflict("Already checked out today"))
        }
        _ => Err(AppError::InvalidState(
            "Must check in before checking out".into(),
        )),
    }
}

pub async fn find_record(
    pool: &SqlitePool,
    employee_id: i64,
    date: NaiveDate,
) -> AppResult<Option<AttendanceRecord>> {
    let record = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT employee_id, attendance_date, clock_in_time, clock_out_time, notes
        FROM attendance_records
        WHERE employee_id = ? AND attendance_date = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Days in `[start, end]` on which the employee checked in.
pub async fn count_present_days(
    pool: &SqlitePool,
    employee_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attendance_records
        WHERE employee_id = ?
        AND attendance_date BETWEEN ? AND ?
        AND clock_in_time IS NOT NULL
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Records with a check-in on `date`, across all employees.
pub async fn count_checked_in_on(pool: &SqlitePool, date: NaiveDate) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attendance_records
        WHERE attendance_date = ? AND clock_in_time IS NOT NULL
        "#,
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Newest first. Rows are pulled from the database as the stream is polled;
/// calling again starts a fresh scan.
///
/// `employee_id = None` covers every employee (used by the export).
pub fn history(
    pool: &SqlitePool,
    employee_id: Option<i64>,
    range: DateRange,
    page: Pagination,
) -> BoxStream<'_, Result<AttendanceRecord, sqlx::Error>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = page.limit.unwrap_or(-1);
    let offset = page.offset.unwrap_or(0);

    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT employee_id, attendance_date, clock_in_time, clock_out_time, notes
        FROM attendance_records
        WHERE (? IS NULL OR employee_id = ?)
        AND (? IS NULL OR attendance_date >= ?)
        AND (? IS NULL OR attendance_date <= ?)
        ORDER BY attendance_date DESC, employee_id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(employee_id)
    .bind(employee_id)
    .bind(range.from)
    .bind(range.from)
    .bind(range.to)
    .bind(range.to)
    .bind(limit)
    .bind(offset)
    .fetch(pool)
}

pub fn validate_page(page: Pagination) -> AppResult<Pagination> {
    if page.limit.is_some_and(|l| l < 0) || page.offset.is_some_and(|o| o < 0) {
        return Err(AppError::invalid_input("limit and offset must not be negative"));
    }
    Ok(page)
}

async fn ensure_employee(pool: &SqlitePool, employee_id: i64) -> AppResult<()> {
    if directory::employee_exists(pool, employee_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Employee not found"))
    }
}
