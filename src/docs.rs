use crate::api::admin::{AdminSummary, ResetPassword};
use crate::api::attendance::AttendanceRequest;
use crate::api::employee::{CreateEmployee, UpdateEmployee};
use crate::api::payslip::{GeneratePayslips, GeneratePayslipsResponse, PayslipQuery, UpdatePayslip};
use crate::api::system::{Health, ServerTime};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{EmployeeResponse, EmployeeSummary};
use crate::model::payslip::{Payslip, PayslipStatus};
use crate::model::role::Role;
use crate::models::{
    ChangePasswordRequest, LoginReqDto, LoginResponse, MeResponse, UpdateMeRequest, UserInfo,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Payroll API",
        version = "1.0.0",
        description = r#"
## Attendance & Payroll

Backend for daily employee attendance and attendance-based monthly pay.

### Key Features
- **Attendance**
  - One check-in and one check-out per employee per day
  - History and CSV export
- **Payroll**
  - Payslips prorated by days present, regenerated idempotently per month
  - Draft / Finalized status, CSV export
- **Employee Directory**
  - Create, update, list, view and deactivate employees

### Security
Everything except login, `/healthz` and `/api/time` needs a **JWT Bearer** token.
Roles are **Admin**, **Gate** (may record attendance for anyone) and **Employee**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::update_me,
        crate::auth::handlers::change_password,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::history,
        crate::api::attendance::export,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::payslip::generate,
        crate::api::payslip::list,
        crate::api::payslip::update_status,
        crate::api::payslip::export,

        crate::api::admin::reset_password,
        crate::api::admin::summary,

        crate::api::system::healthz,
        crate::api::system::server_time
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserInfo,
            MeResponse,
            UpdateMeRequest,
            ChangePasswordRequest,
            Role,
            AttendanceRequest,
            AttendanceRecord,
            CreateEmployee,
            UpdateEmployee,
            EmployeeResponse,
            EmployeeSummary,
            GeneratePayslips,
            GeneratePayslipsResponse,
            UpdatePayslip,
            PayslipQuery,
            Payslip,
            PayslipStatus,
            ResetPassword,
            AdminSummary,
            Health,
            ServerTime
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and self-service APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Payroll", description = "Payslip APIs"),
        (name = "Admin", description = "Administrative APIs"),
        (name = "System", description = "Health and clock"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
