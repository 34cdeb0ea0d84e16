use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

/// Full directory row. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub employee_id: i64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub bank_account_number: Option<String>,
    pub gross_monthly_salary: f64,
    pub date_of_joining: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
}

/// What the payroll engine needs to know about an employee.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EmployeeSalary {
    pub employee_id: i64,
    pub gross_monthly_salary: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 1,
        "full_name": "Jane Doe",
        "email": "jane.doe@company.com",
        "job_title": "Engineer",
        "department": "R&D",
        "phone_number": "+8801712345678",
        "bank_account_number": null,
        "gross_monthly_salary": 3000.0,
        "date_of_joining": "2024-01-01",
        "role": "Employee",
        "is_active": true
    })
)]
pub struct EmployeeResponse {
    pub employee_id: i64,
    pub full_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub bank_account_number: Option<String>,
    pub gross_monthly_salary: f64,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_joining: Option<NaiveDate>,
    pub role: Role,
    pub is_active: bool,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        EmployeeResponse {
            employee_id: e.employee_id,
            full_name: e.full_name,
            email: e.email,
            job_title: e.job_title,
            department: e.department,
            phone_number: e.phone_number,
            bank_account_number: e.bank_account_number,
            gross_monthly_salary: e.gross_monthly_salary,
            date_of_joining: e.date_of_joining,
            role: e.role,
            is_active: e.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeSummary {
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
    #[schema(example = "Engineer", nullable = true)]
    pub designation: Option<String>,
}

/// Validated input for a new directory entry.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub gross_monthly_salary: f64,
    pub date_of_joining: NaiveDate,
}
