pub mod admin;
pub mod attendance;
pub mod employee;
pub mod payslip;
pub mod system;
