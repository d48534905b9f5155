//! Narrow repository interfaces the domain operations are written against.
//!
//! [`orm`] implements every trait for a sea-orm `DatabaseConnection`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, Database, DatabaseConnection, DbErr};
use uuid::Uuid;

use crate::{
    config::Config,
    entity::{
        attendance, company_settings, employee, geo_location, leave_balance, leave_request, leave_type, payroll,
        personal_holiday, personal_holiday_balance, salary_template::{self, ComponentDraft},
        sea_orm_active_enums::{AttendanceStatus, PayrollStatus}, wfh_request,
    },
    salary::Structure,
};

mod orm;

#[cfg(test)]
pub(crate) mod memory;

pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    Database::connect(config.database_opt.clone()).await
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn active_employees(&self) -> Result<Vec<employee::Model>, DbErr>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn company_settings(&self) -> Result<Option<company_settings::Model>, DbErr>;
}

#[async_trait]
pub trait GeoLocationStore: Send + Sync {
    async fn active_locations(&self) -> Result<Vec<geo_location::Model>, DbErr>;
}

#[async_trait]
pub trait HolidayStore: Send + Sync {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, DbErr>;

    async fn is_public_holiday(&self, date: NaiveDate) -> Result<bool, DbErr> {
        Ok(!self.holidays_between(date, date).await?.is_empty())
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Records with `from <= date <= to`, oldest first
    async fn find_attendance(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<attendance::Model>, DbErr>;

    async fn find_attendance_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<attendance::Model>, DbErr>;

    /// Inserts, or overwrites every column of the row already keyed by (employee, date)
    async fn upsert_attendance(&self, record: attendance::Model) -> Result<attendance::Model, DbErr>;

    async fn approved_wfh(&self, employee_id: Uuid, date: NaiveDate) -> Result<bool, DbErr>;

    async fn find_wfh_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<wfh_request::Model>, DbErr>;

    async fn find_wfh(&self, id: Uuid) -> Result<Option<wfh_request::Model>, DbErr>;

    async fn save_wfh(&self, request: wfh_request::Model) -> Result<wfh_request::Model, DbErr>;
}

#[async_trait]
pub trait SalaryStore: Send + Sync {
    async fn get_structure(&self, employee_id: Uuid) -> Result<Option<Structure>, DbErr>;

    /// Upserts the structure and replaces all of its components, atomically
    async fn replace_structure(
        &self,
        employee_id: Uuid,
        basic_salary: Decimal,
        components: Vec<ComponentDraft>,
        now: DateTimeWithTimeZone,
    ) -> Result<Structure, DbErr>;

    /// Upserts by template name
    async fn save_template(&self, template: salary_template::Model) -> Result<salary_template::Model, DbErr>;

    async fn find_template(&self, id: Uuid) -> Result<Option<salary_template::Model>, DbErr>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Keyed by (employee, month). An existing row keeps its id, override and payment fields.
    async fn upsert_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr>;

    async fn find_payroll(&self, id: Uuid) -> Result<Option<payroll::Model>, DbErr>;

    async fn find_payrolls(&self, month: NaiveDate) -> Result<Vec<payroll::Model>, DbErr>;

    /// Most recent month first
    async fn find_employee_payrolls(
        &self,
        employee_id: Uuid,
        status: PayrollStatus,
        limit: u64,
    ) -> Result<Vec<payroll::Model>, DbErr>;

    async fn update_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr>;

    async fn mark_paid_many(&self, ids: &[Uuid], paid_by: Uuid, now: DateTimeWithTimeZone) -> Result<u64, DbErr>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_leave_type(&self, id: Uuid) -> Result<Option<leave_type::Model>, DbErr>;

    async fn find_balance(&self, employee_id: Uuid, leave_type_id: Uuid, year: i32) -> Result<Option<leave_balance::Model>, DbErr>;

    async fn balances_for_year(&self, year: i32) -> Result<Vec<leave_balance::Model>, DbErr>;

    /// Keyed by (employee, leave type, year); an existing row keeps its id
    async fn upsert_balance(&self, balance: leave_balance::Model) -> Result<leave_balance::Model, DbErr>;

    /// Any PENDING or APPROVED leave intersecting `[from, to]`
    async fn find_overlapping_leave(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Option<leave_request::Model>, DbErr>;

    async fn find_leave(&self, id: Uuid) -> Result<Option<leave_request::Model>, DbErr>;

    async fn save_leave(&self, leave: leave_request::Model) -> Result<leave_request::Model, DbErr>;
}

#[async_trait]
pub trait PersonalHolidayStore: Send + Sync {
    async fn find_holiday_balance(&self, employee_id: Uuid) -> Result<Option<personal_holiday_balance::Model>, DbErr>;

    async fn holiday_balances(&self) -> Result<Vec<personal_holiday_balance::Model>, DbErr>;

    /// Keyed by employee
    async fn upsert_holiday_balance(&self, balance: personal_holiday_balance::Model) -> Result<personal_holiday_balance::Model, DbErr>;

    async fn find_personal_holiday(&self, id: Uuid) -> Result<Option<personal_holiday::Model>, DbErr>;

    async fn save_personal_holiday(&self, holiday: personal_holiday::Model) -> Result<personal_holiday::Model, DbErr>;
}

/// Request whose approval is being committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovedRequest {
    Leave { id: Uuid, leave_type_id: Uuid, year: i32 },
    PersonalHoliday { id: Uuid },
}

/// Everything an approval changes, committed as one unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalPlan {
    pub employee_id: Uuid,
    pub request: ApprovedRequest,
    pub approved_by: Uuid,
    pub comment: Option<String>,
    pub approved_at: DateTimeWithTimeZone,
    /// Moved from `remaining` to `used`
    pub days: Decimal,
    pub attendance: Vec<(NaiveDate, AttendanceStatus)>,
}

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Applies the whole plan or nothing
    async fn commit_approval(&self, plan: ApprovalPlan) -> Result<(), DbErr>;
}
