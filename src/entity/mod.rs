//! `SeaORM` entities for the payroll schema

pub mod prelude;

pub mod attendance;
pub mod company_settings;
pub mod employee;
pub mod geo_location;
pub mod holiday;
pub mod leave_balance;
pub mod leave_request;
pub mod leave_type;
pub mod payroll;
pub mod personal_holiday;
pub mod personal_holiday_balance;
pub mod salary_component;
pub mod salary_structure;
pub mod salary_template;
pub mod sea_orm_active_enums;
pub mod wfh_request;
