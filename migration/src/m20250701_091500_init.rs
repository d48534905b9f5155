use sea_orm_migration::prelude::*;

use crate::util::{cascade_fk, days, default_table_statement, drop_enum_type, enum_type, money, unique_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ENUMS: [(&str, &[&str]); 7] = [
    ("role_type", &["ADMIN", "EMPLOYEE"]),
    ("employee_status", &["ACTIVE", "INACTIVE"]),
    ("attendance_status", &["PRESENT", "ABSENT", "HALF_DAY", "ON_LEAVE", "WFH", "PERSONAL_HOLIDAY", "HOLIDAY"]),
    ("component_type", &["EARNING", "DEDUCTION"]),
    ("calc_type", &["FIXED", "PERCENTAGE"]),
    ("payroll_status", &["GENERATED", "PAID"]),
    ("request_status", &["PENDING", "APPROVED", "REJECTED", "CANCELLED"]),
];

fn status(column: impl IntoIden, type_name: &str, default: &str) -> ColumnDef {
    ColumnDef::new(column)
        .custom(Alias::new(type_name))
        .not_null()
        .default(Expr::val(default).cast_as(Alias::new(type_name)))
        .take()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, values) in ENUMS {
            manager.create_type(enum_type(name, values)).await?;
        }

        manager
            .create_table(default_table_statement()
                .table(Employee::Table)
                .col(ColumnDef::new(Employee::Code)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(Employee::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Employee::Email)
                    .text()
                    .unique_key()
                    .not_null())
                .col(status(Employee::Role, "role_type", "EMPLOYEE"))
                .col(status(Employee::Status, "employee_status", "ACTIVE"))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(CompanySettings::Table)
                .col(ColumnDef::new(CompanySettings::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(CompanySettings::WorkingDaysPerMonth)
                    .integer())
                .col(ColumnDef::new(CompanySettings::GeoFenceEnabled)
                    .boolean()
                    .not_null()
                    .default(false))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(GeoLocation::Table)
                .col(ColumnDef::new(GeoLocation::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(GeoLocation::Latitude)
                    .double()
                    .not_null())
                .col(ColumnDef::new(GeoLocation::Longitude)
                    .double()
                    .not_null())
                .col(ColumnDef::new(GeoLocation::Radius)
                    .integer()) // Meters, 500 when null
                .col(ColumnDef::new(GeoLocation::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Holiday::Table)
                .col(ColumnDef::new(Holiday::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Holiday::Date)
                    .date()
                    .unique_key()
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Attendance::Table)
                .col(ColumnDef::new(Attendance::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Attendance::Date)
                    .date()
                    .not_null())
                .col(status(Attendance::Status, "attendance_status", "PRESENT"))
                .col(ColumnDef::new(Attendance::CheckIn)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Attendance::CheckOut)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Attendance::CheckInLat)
                    .double())
                .col(ColumnDef::new(Attendance::CheckInLng)
                    .double())
                .col(ColumnDef::new(Attendance::CheckOutLat)
                    .double())
                .col(ColumnDef::new(Attendance::CheckOutLng)
                    .double())
                .col(ColumnDef::new(Attendance::HoursWorked)
                    .decimal_len(5, 2))
                .col(ColumnDef::new(Attendance::IsWfh)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(Attendance::IsManualOverride)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(Attendance::OverrideReason)
                    .text())
                .col(ColumnDef::new(Attendance::OverrideBy)
                    .uuid())
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(Attendance::Table, Attendance::EmployeeId, Employee::Table)).await?;
        manager.create_index(unique_index(
            "attendance_employee_date_key",
            Attendance::Table,
            [Attendance::EmployeeId.into_iden(), Attendance::Date.into_iden()],
        )).await?;

        manager
            .create_table(default_table_statement()
                .table(WfhRequest::Table)
                .col(ColumnDef::new(WfhRequest::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(WfhRequest::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(WfhRequest::Reason)
                    .text())
                .col(status(WfhRequest::Status, "request_status", "PENDING"))
                .col(ColumnDef::new(WfhRequest::AdminComment)
                    .text())
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(WfhRequest::Table, WfhRequest::EmployeeId, Employee::Table)).await?;
        manager.create_index(unique_index(
            "wfh_request_employee_date_key",
            WfhRequest::Table,
            [WfhRequest::EmployeeId.into_iden(), WfhRequest::Date.into_iden()],
        )).await?;

        manager
            .create_table(default_table_statement()
                .table(SalaryStructure::Table)
                .col(ColumnDef::new(SalaryStructure::EmployeeId)
                    .uuid()
                    .unique_key()
                    .not_null())
                .col(money(SalaryStructure::BasicSalary))
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(SalaryStructure::Table, SalaryStructure::EmployeeId, Employee::Table)).await?;

        manager
            .create_table(default_table_statement()
                .table(SalaryComponent::Table)
                .col(ColumnDef::new(SalaryComponent::StructureId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(SalaryComponent::Name)
                    .text()
                    .not_null())
                .col(status(SalaryComponent::Type, "component_type", "EARNING"))
                .col(status(SalaryComponent::CalcType, "calc_type", "FIXED"))
                .col(money(SalaryComponent::Value))
                .col(ColumnDef::new(SalaryComponent::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .col(ColumnDef::new(SalaryComponent::Order)
                    .integer()
                    .not_null()
                    .default(0))
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(SalaryComponent::Table, SalaryComponent::StructureId, SalaryStructure::Table)).await?;

        manager
            .create_table(default_table_statement()
                .table(SalaryTemplate::Table)
                .col(ColumnDef::new(SalaryTemplate::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(SalaryTemplate::Description)
                    .text())
                .col(money(SalaryTemplate::BasicSalary))
                .col(ColumnDef::new(SalaryTemplate::Components)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'[]'::jsonb")))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Payroll::Table)
                .col(ColumnDef::new(Payroll::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payroll::Month)
                    .date()
                    .not_null()) // First day of the month
                .col(ColumnDef::new(Payroll::WorkingDays)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Payroll::PresentDays)
                    .integer()
                    .not_null())
                .col(days(Payroll::LopDays))
                .col(ColumnDef::new(Payroll::HalfDayCount)
                    .integer()
                    .not_null()
                    .default(0))
                .col(money(Payroll::BasicSalary))
                .col(money(Payroll::GrossSalary))
                .col(money(Payroll::TotalDeductions))
                .col(money(Payroll::LopAmount))
                .col(money(Payroll::HalfDayAmount))
                .col(money(Payroll::NetSalary))
                .col(ColumnDef::new(Payroll::Components)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'[]'::jsonb")))
                .col(status(Payroll::Status, "payroll_status", "GENERATED"))
                .col(ColumnDef::new(Payroll::OverrideAmount)
                    .decimal_len(14, 2))
                .col(ColumnDef::new(Payroll::OverrideReason)
                    .text())
                .col(ColumnDef::new(Payroll::PaidAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Payroll::PaidBy)
                    .uuid())
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(Payroll::Table, Payroll::EmployeeId, Employee::Table)).await?;
        manager.create_index(unique_index(
            "payroll_employee_month_key",
            Payroll::Table,
            [Payroll::EmployeeId.into_iden(), Payroll::Month.into_iden()],
        )).await?;

        manager
            .create_table(default_table_statement()
                .table(LeaveType::Table)
                .col(ColumnDef::new(LeaveType::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(LeaveType::Code)
                    .text()
                    .unique_key()
                    .not_null())
                .col(days(LeaveType::DefaultDays))
                .col(ColumnDef::new(LeaveType::IsCarryForward)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(LeaveType::MaxCarryForward)
                    .decimal_len(6, 1))
                .col(ColumnDef::new(LeaveType::IsPaid)
                    .boolean()
                    .not_null()
                    .default(true))
                .col(ColumnDef::new(LeaveType::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(LeaveBalance::Table)
                .col(ColumnDef::new(LeaveBalance::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveBalance::LeaveTypeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveBalance::Year)
                    .integer()
                    .not_null())
                .col(days(LeaveBalance::Total))
                .col(days(LeaveBalance::Used))
                .col(days(LeaveBalance::Remaining))
                .col(days(LeaveBalance::CarriedOver))
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(LeaveBalance::Table, LeaveBalance::EmployeeId, Employee::Table)).await?;
        manager.create_foreign_key(cascade_fk(LeaveBalance::Table, LeaveBalance::LeaveTypeId, LeaveType::Table)).await?;
        manager.create_index(unique_index(
            "leave_balance_employee_type_year_key",
            LeaveBalance::Table,
            [LeaveBalance::EmployeeId.into_iden(), LeaveBalance::LeaveTypeId.into_iden(), LeaveBalance::Year.into_iden()],
        )).await?;

        manager
            .create_table(default_table_statement()
                .table(LeaveRequest::Table)
                .col(ColumnDef::new(LeaveRequest::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::LeaveTypeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::FromDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::ToDate)
                    .date()
                    .not_null())
                .col(days(LeaveRequest::Days))
                .col(ColumnDef::new(LeaveRequest::IsHalfDay)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(LeaveRequest::Reason)
                    .text())
                .col(status(LeaveRequest::Status, "request_status", "PENDING"))
                .col(ColumnDef::new(LeaveRequest::AdminComment)
                    .text())
                .col(ColumnDef::new(LeaveRequest::ApprovedBy)
                    .uuid())
                .col(ColumnDef::new(LeaveRequest::ApprovedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(LeaveRequest::Table, LeaveRequest::EmployeeId, Employee::Table)).await?;
        manager.create_foreign_key(cascade_fk(LeaveRequest::Table, LeaveRequest::LeaveTypeId, LeaveType::Table)).await?;

        manager
            .create_table(default_table_statement()
                .table(PersonalHoliday::Table)
                .col(ColumnDef::new(PersonalHoliday::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PersonalHoliday::Reason)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PersonalHoliday::Description)
                    .text())
                .col(ColumnDef::new(PersonalHoliday::FromDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PersonalHoliday::ToDate)
                    .date()
                    .not_null())
                .col(days(PersonalHoliday::Days))
                .col(status(PersonalHoliday::Status, "request_status", "PENDING"))
                .col(ColumnDef::new(PersonalHoliday::AdminComment)
                    .text())
                .col(ColumnDef::new(PersonalHoliday::ApprovedBy)
                    .uuid())
                .col(ColumnDef::new(PersonalHoliday::ApprovedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(PersonalHoliday::Table, PersonalHoliday::EmployeeId, Employee::Table)).await?;

        manager
            .create_table(default_table_statement()
                .table(PersonalHolidayBalance::Table)
                .col(ColumnDef::new(PersonalHolidayBalance::EmployeeId)
                    .uuid()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(PersonalHolidayBalance::Year)
                    .integer()
                    .not_null())
                .col(days(PersonalHolidayBalance::Total))
                .col(days(PersonalHolidayBalance::Used))
                .col(days(PersonalHolidayBalance::Remaining))
                .take()
            ).await?;
        manager.create_foreign_key(cascade_fk(PersonalHolidayBalance::Table, PersonalHolidayBalance::EmployeeId, Employee::Table)).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dependents first
        let tables: [DynIden; 15] = [
            PersonalHolidayBalance::Table.into_iden(),
            PersonalHoliday::Table.into_iden(),
            LeaveRequest::Table.into_iden(),
            LeaveBalance::Table.into_iden(),
            LeaveType::Table.into_iden(),
            Payroll::Table.into_iden(),
            SalaryTemplate::Table.into_iden(),
            SalaryComponent::Table.into_iden(),
            SalaryStructure::Table.into_iden(),
            WfhRequest::Table.into_iden(),
            Attendance::Table.into_iden(),
            Holiday::Table.into_iden(),
            GeoLocation::Table.into_iden(),
            CompanySettings::Table.into_iden(),
            Employee::Table.into_iden(),
        ];

        for table in tables {
            manager
                .drop_table(TableDropStatement::new()
                    .table(table)
                    .if_exists()
                    .take()
                ).await?;
        }

        for (name, _) in ENUMS {
            manager.drop_type(drop_enum_type(name)).await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Employee {
    Table,
    Code,
    Name,
    Email,
    Role,
    Status,
}

#[derive(DeriveIden)]
pub(crate) enum CompanySettings {
    Table,
    Name,
    WorkingDaysPerMonth,
    GeoFenceEnabled,
}

#[derive(DeriveIden)]
enum GeoLocation {
    Table,
    Name,
    Latitude,
    Longitude,
    Radius,
    IsActive,
}

#[derive(DeriveIden)]
enum Holiday {
    Table,
    Name,
    Date,
}

#[derive(DeriveIden)]
enum Attendance {
    Table,
    EmployeeId,
    Date,
    Status,
    CheckIn,
    CheckOut,
    CheckInLat,
    CheckInLng,
    CheckOutLat,
    CheckOutLng,
    HoursWorked,
    IsWfh,
    IsManualOverride,
    OverrideReason,
    OverrideBy,
}

#[derive(DeriveIden)]
enum WfhRequest {
    Table,
    EmployeeId,
    Date,
    Reason,
    Status,
    AdminComment,
}

#[derive(DeriveIden)]
enum SalaryStructure {
    Table,
    EmployeeId,
    BasicSalary,
}

#[derive(DeriveIden)]
enum SalaryComponent {
    Table,
    StructureId,
    Name,
    Type,
    CalcType,
    Value,
    IsActive,
    Order,
}

#[derive(DeriveIden)]
enum SalaryTemplate {
    Table,
    Name,
    Description,
    BasicSalary,
    Components,
}

#[derive(DeriveIden)]
enum Payroll {
    Table,
    EmployeeId,
    Month,
    WorkingDays,
    PresentDays,
    LopDays,
    HalfDayCount,
    BasicSalary,
    GrossSalary,
    TotalDeductions,
    LopAmount,
    HalfDayAmount,
    NetSalary,
    Components,
    Status,
    OverrideAmount,
    OverrideReason,
    PaidAt,
    PaidBy,
}

#[derive(DeriveIden)]
pub(crate) enum LeaveType {
    Table,
    Name,
    Code,
    DefaultDays,
    IsCarryForward,
    MaxCarryForward,
    IsPaid,
    IsActive,
}

#[derive(DeriveIden)]
enum LeaveBalance {
    Table,
    EmployeeId,
    LeaveTypeId,
    Year,
    Total,
    Used,
    Remaining,
    CarriedOver,
}

#[derive(DeriveIden)]
enum LeaveRequest {
    Table,
    EmployeeId,
    LeaveTypeId,
    FromDate,
    ToDate,
    Days,
    IsHalfDay,
    Reason,
    Status,
    AdminComment,
    ApprovedBy,
    ApprovedAt,
}

#[derive(DeriveIden)]
enum PersonalHoliday {
    Table,
    EmployeeId,
    Reason,
    Description,
    FromDate,
    ToDate,
    Days,
    Status,
    AdminComment,
    ApprovedBy,
    ApprovedAt,
}

#[derive(DeriveIden)]
enum PersonalHolidayBalance {
    Table,
    EmployeeId,
    Year,
    Total,
    Used,
    Remaining,
}
