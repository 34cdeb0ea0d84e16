//! Employee directory: the reference data payroll and attendance read, plus
//! the admin CRUD that maintains it.

use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    model::{
        employee::{Employee, EmployeeSalary, EmployeeSummary, NewEmployee},
        role::Role,
    },
    utils::{
        db_utils::{SqlValue, build_update_sql, execute_update},
        email_index::EmailIndex,
        validation::{is_valid_email, normalize_email},
    },
};

const EMPLOYEE_COLUMNS: &str = r#"
    employee_id, full_name, email, password_hash, job_title, department,
    phone_number, bank_account_number, gross_monthly_salary, date_of_joining,
    role, is_active
"#;

/// Fields an administrator may change through `update`.
const UPDATABLE_FIELDS: [&str; 9] = [
    "full_name",
    "email",
    "phone_number",
    "job_title",
    "department",
    "gross_monthly_salary",
    "bank_account_number",
    "role",
    "is_active",
];

/// Active employees ordered by id, optionally narrowed to one.
/// An inactive or unknown `single_id` yields an empty list.
pub async fn active_employees(
    pool: &SqlitePool,
    single_id: Option<i64>,
) -> AppResult<Vec<EmployeeSalary>> {
    let rows = sqlx::query_as::<_, EmployeeSalary>(
        r#"
        SELECT employee_id, gross_monthly_salary
        FROM employees
        WHERE is_active = 1
        AND (? IS NULL OR employee_id = ?)
        ORDER BY employee_id
        "#,
    )
    .bind(single_id)
    .bind(single_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn employee_exists(pool: &SqlitePool, employee_id: i64) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_id = ?)",
    )
    .bind(employee_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn find_by_id(pool: &SqlitePool, employee_id: i64) -> AppResult<Option<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?");
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;

    Ok(employee)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ? COLLATE NOCASE");
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

    Ok(employee)
}

pub async fn list_active(pool: &SqlitePool) -> AppResult<Vec<EmployeeSummary>> {
    let rows = sqlx::query_as::<_, EmployeeSummary>(
        r#"
        SELECT employee_id, full_name AS name, email, job_title AS designation
        FROM employees
        WHERE is_active = 1
        ORDER BY employee_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a new employee and returns its id.
pub async fn create(pool: &SqlitePool, index: &EmailIndex, new: NewEmployee) -> AppResult<i64> {
    let email = normalize_email(&new.email);
    if !is_valid_email(&email) {
        return Err(AppError::invalid_input("Invalid email format"));
    }
    if !new.gross_monthly_salary.is_finite() || new.gross_monthly_salary < 0.0 {
        return Err(AppError::invalid_input("Invalid salary"));
    }
    if !index.is_available(pool, &email).await? {
        return Err(AppError::conflict("Email already exists"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (full_name, email, password_hash, job_title, department, phone_number,
         gross_monthly_salary, date_of_joining, role)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.full_name)
    .bind(&email)
    .bind(&new.password_hash)
    .bind(&new.job_title)
    .bind(&new.department)
    .bind(&new.phone_number)
    .bind(new.gross_monthly_salary)
    .bind(new.date_of_joining)
    .bind(new.role.to_string())
    .execute(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::conflict("Email already exists"),
        other => other,
    })?;

    index.mark_taken(&email).await;
    let employee_id = result.last_insert_rowid();
    info!(employee_id, role = %new.role, "Employee created");
    Ok(employee_id)
}

/// Applies the allow-listed fields of `payload`; other keys are ignored.
pub async fn update(
    pool: &SqlitePool,
    index: &EmailIndex,
    employee_id: i64,
    payload: &Value,
) -> AppResult<()> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::invalid_input("Payload must be a JSON object"))?;

    let assignments = employee_assignments(obj)?;
    let new_email = assignments.iter().find_map(|(column, value)| match value {
        SqlValue::Text(email) if *column == "email" => Some(email.clone()),
        _ => None,
    });

    let previous = match &new_email {
        Some(_) => find_by_id(pool, employee_id).await?.map(|e| e.email),
        None => None,
    };

    let update = build_update_sql("employees", assignments, "employee_id", employee_id)?;
    debug!(sql = %update.sql, employee_id, "Updating employee");

    let affected = execute_update(pool, update).await.map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::conflict("Email already exists"),
        other => other,
    })?;

    if affected == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    if let Some(email) = new_email {
        if let Some(old) = previous.filter(|old| !old.eq_ignore_ascii_case(&email)) {
            index.release(&old).await;
        }
        index.mark_taken(&email).await;
    }

    info!(employee_id, "Employee updated");
    Ok(())
}

fn employee_assignments(obj: &Map<String, Value>) -> AppResult<Vec<(&'static str, SqlValue)>> {
    let mut assignments = Vec::new();

    for column in UPDATABLE_FIELDS {
        let Some(value) = obj.get(column) else {
            continue;
        };

        let sql_value = match (column, value) {
            ("full_name", Value::String(s)) if !s.trim().is_empty() => {
                SqlValue::Text(s.trim().to_string())
            }
            ("email", Value::String(s)) => {
                let email = normalize_email(s);
                if !is_valid_email(&email) {
                    return Err(AppError::invalid_input("Invalid email format"));
                }
                SqlValue::Text(email)
            }
            ("gross_monthly_salary", v) => {
                let salary = v
                    .as_f64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                    .filter(|s: &f64| s.is_finite() && *s >= 0.0)
                    .ok_or_else(|| AppError::invalid_input("Invalid salary"))?;
                SqlValue::Real(salary)
            }
            ("role", Value::String(s)) => {
                let role: Role = s
                    .parse()
                    .map_err(|_| AppError::invalid_input("role must be 'Admin', 'Gate' or 'Employee'"))?;
                SqlValue::Text(role.to_string())
            }
            ("is_active", Value::Bool(b)) => SqlValue::Bool(*b),
            ("is_active", Value::Number(n)) if n.as_i64() == Some(0) || n.as_i64() == Some(1) => {
                SqlValue::Bool(n.as_i64() == Some(1))
            }
            (
                "phone_number" | "job_title" | "department" | "bank_account_number",
                Value::String(s),
            ) => SqlValue::Text(s.clone()),
            ("phone_number" | "job_title" | "department" | "bank_account_number", Value::Null) => {
                SqlValue::Null
            }
            (column, _) => {
                return Err(AppError::invalid_input(format!("Invalid value for {column}")));
            }
        };

        assignments.push((column, sql_value));
    }

    Ok(assignments)
}

/// Soft delete: history keeps referencing the row.
pub async fn deactivate(pool: &SqlitePool, employee_id: i64) -> AppResult<()> {
    let result = sqlx::query("UPDATE employees SET is_active = 0 WHERE employee_id = ?")
        .bind(employee_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    info!(employee_id, "Employee deactivated");
    Ok(())
}

/// Self-service profile change: name and/or email.
pub async fn update_profile(
    pool: &SqlitePool,
    index: &EmailIndex,
    employee_id: i64,
    full_name: Option<&str>,
    email: Option<&str>,
) -> AppResult<()> {
    let mut payload = Map::new();
    if let Some(name) = full_name.filter(|n| !n.trim().is_empty()) {
        payload.insert("full_name".into(), Value::String(name.to_string()));
    }
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        payload.insert("email".into(), Value::String(email.to_string()));
    }
    if payload.is_empty() {
        return Err(AppError::invalid_input("No valid fields provided"));
    }

    update(pool, index, employee_id, &Value::Object(payload)).await
}

pub async fn set_password_hash(
    pool: &SqlitePool,
    employee_id: i64,
    password_hash: &str,
) -> AppResult<()> {
    let result = sqlx::query("UPDATE employees SET password_hash = ? WHERE employee_id = ?")
        .bind(password_hash)
        .bind(employee_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }
    Ok(())
}

pub async fn set_password_hash_by_email(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
) -> AppResult<()> {
    let result =
        sqlx::query("UPDATE employees SET password_hash = ? WHERE email = ? COLLATE NOCASE")
            .bind(password_hash)
            .bind(normalize_email(email))
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }
    Ok(())
}

/// `(all employees, active employees)`
pub async fn headcount(pool: &SqlitePool) -> AppResult<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COALESCE(SUM(is_active = 1), 0) FROM employees",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

pub async fn has_admin(pool: &SqlitePool) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE role = 'Admin' AND is_active = 1)",
    )
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_employee, new_employee, setup_test_db};
    use serde_json::json;

    #[actix_web::test]
    async fn active_employees_skips_inactive_and_orders_by_id() {
        let pool = setup_test_db().await;
        let a = create_test_employee(&pool, "a@x.io", 1000.0, Role::Employee).await;
        let b = create_test_employee(&pool, "b@x.io", 2000.0, Role::Employee).await;
        let c = create_test_employee(&pool, "c@x.io", 3000.0, Role::Gate).await;
        deactivate(&pool, b).await.unwrap();

        let all = active_employees(&pool, None).await.unwrap();
        assert_eq!(
            all,
            vec![
                EmployeeSalary { employee_id: a, gross_monthly_salary: 1000.0 },
                EmployeeSalary { employee_id: c, gross_monthly_salary: 3000.0 },
            ]
        );

        assert!(active_employees(&pool, Some(b)).await.unwrap().is_empty());
        assert_eq!(active_employees(&pool, Some(c)).await.unwrap().len(), 1);
        assert!(active_employees(&pool, Some(999)).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn deactivated_employee_still_exists() {
        let pool = setup_test_db().await;
        let id = create_test_employee(&pool, "a@x.io", 1000.0, Role::Employee).await;
        deactivate(&pool, id).await.unwrap();

        assert!(employee_exists(&pool, id).await.unwrap());
        assert!(!employee_exists(&pool, id + 1).await.unwrap());
        assert!(matches!(
            deactivate(&pool, id + 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn create_rejects_duplicate_email_case_insensitively() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        create(&pool, &index, new_employee("Jane@X.io", 10.0)).await.unwrap();

        let err = create(&pool, &index, new_employee("jane@x.IO", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = find_by_email(&pool, "JANE@x.io").await.unwrap().unwrap();
        assert_eq!(stored.email, "jane@x.io");
    }

    #[actix_web::test]
    async fn create_validates_input() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();

        assert!(matches!(
            create(&pool, &index, new_employee("not-an-email", 10.0)).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            create(&pool, &index, new_employee("a@x.io", -1.0)).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[actix_web::test]
    async fn update_applies_allow_listed_fields_only() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        let id = create_test_employee(&pool, "a@x.io", 1000.0, Role::Employee).await;

        update(
            &pool,
            &index,
            id,
            &json!({
                "gross_monthly_salary": 4500.5,
                "role": "Gate",
                "password_hash": "sneaky",
                "employee_id": 42
            }),
        )
        .await
        .unwrap();

        let e = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(e.gross_monthly_salary, 4500.5);
        assert_eq!(e.role, Role::Gate);
        assert_ne!(e.password_hash, "sneaky");
        assert_eq!(e.employee_id, id);
    }

    #[actix_web::test]
    async fn update_errors() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        let id = create_test_employee(&pool, "a@x.io", 1000.0, Role::Employee).await;
        create_test_employee(&pool, "b@x.io", 1000.0, Role::Employee).await;

        let no_fields = update(&pool, &index, id, &json!({"unknown": 1})).await;
        assert!(matches!(no_fields, Err(AppError::InvalidInput(_))));

        let bad_role = update(&pool, &index, id, &json!({"role": "Hr"})).await;
        assert!(matches!(bad_role, Err(AppError::InvalidInput(_))));

        let negative = update(&pool, &index, id, &json!({"gross_monthly_salary": -5})).await;
        assert!(matches!(negative, Err(AppError::InvalidInput(_))));

        let missing = update(&pool, &index, 999, &json!({"full_name": "X"})).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let duplicate = update(&pool, &index, id, &json!({"email": "B@x.io"})).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[actix_web::test]
    async fn email_change_frees_the_old_address() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        let id = create(&pool, &index, new_employee("old@x.io", 10.0)).await.unwrap();

        update_profile(&pool, &index, id, None, Some("new@x.io")).await.unwrap();

        assert!(index.is_available(&pool, "old@x.io").await.unwrap());
        assert!(!index.is_available(&pool, "new@x.io").await.unwrap());
    }

    #[actix_web::test]
    async fn headcount_and_admin_presence() {
        let pool = setup_test_db().await;
        assert!(!has_admin(&pool).await.unwrap());
        assert_eq!(headcount(&pool).await.unwrap(), (0, 0));

        create_test_employee(&pool, "boss@x.io", 0.0, Role::Admin).await;
        let e = create_test_employee(&pool, "e@x.io", 0.0, Role::Employee).await;
        deactivate(&pool, e).await.unwrap();

        assert!(has_admin(&pool).await.unwrap());
        assert_eq!(headcount(&pool).await.unwrap(), (2, 1));
    }
}
