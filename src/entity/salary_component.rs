use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CalcType, ComponentType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "salary_component")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub structure_id: Uuid,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub kind: ComponentType,
    pub calc_type: CalcType,
    /// Currency amount for `FIXED`, percentage points of basic for `PERCENTAGE`
    pub value: Decimal,
    pub is_active: bool,
    /// Display position only
    pub order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::salary_structure::Entity",
        from = "Column::StructureId",
        to = "super::salary_structure::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    SalaryStructure,
}

impl Related<super::salary_structure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalaryStructure.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
