use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CalcType, ComponentType, PayrollStatus};

/// Payroll snapshot of one employee for one month
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub employee_id: Uuid,
    /// First day of the month
    pub month: Date,
    pub working_days: i32,
    pub present_days: i32,
    /// Absences plus half of the half days
    pub lop_days: Decimal,
    pub half_day_count: i32,
    pub basic_salary: Decimal,
    pub gross_salary: Decimal,
    pub total_deductions: Decimal,
    pub lop_amount: Decimal,
    pub half_day_amount: Decimal,
    pub net_salary: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub components: ComponentSnapshots,
    pub status: PayrollStatus,
    pub override_amount: Option<Decimal>,
    pub override_reason: Option<String>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub paid_by: Option<Uuid>,
}

/// Component as it was resolved at generation time, detached from the live structure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub calc_type: CalcType,
    pub value: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ComponentSnapshots(pub Vec<ComponentSnapshot>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
