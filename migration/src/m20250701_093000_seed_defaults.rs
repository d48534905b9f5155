use sea_orm_migration::prelude::*;

use crate::m20250701_091500_init::{CompanySettings, LeaveType};

#[derive(DeriveMigrationName)]
pub struct Migration;

const COMPANY_ID: u128 = 1;

// (code, name, default days, carry forward, max carry forward, paid)
const LEAVE_TYPES: [(&str, &str, i32, bool, Option<i32>, bool); 5] = [
    ("CL", "Casual Leave", 12, false, None, true),
    ("SL", "Sick Leave", 12, false, None, true),
    ("EL", "Earned Leave", 15, true, Some(30), true),
    ("ML", "Maternity Leave", 90, false, None, true),
    ("UL", "Unpaid Leave", 0, false, None, false),
];

fn seeded_id(n: u128) -> SimpleExpr {
    Expr::val(format!("{:032x}", n)).cast_as("uuid")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::insert()
                .into_table(CompanySettings::Table)
                .columns(["id", "name", "working_days_per_month", "geo_fence_enabled"])
                .values_panic([seeded_id(COMPANY_ID), "EMS Pro Demo Company".into(), 26.into(), false.into()])
                .to_owned()
            ).await?;

        for (i, (code, name, default_days, carry_forward, max_carry_forward, paid)) in LEAVE_TYPES.into_iter().enumerate() {
            manager
                .exec_stmt(Query::insert()
                    .into_table(LeaveType::Table)
                    .columns(["id", "code", "name", "default_days", "is_carry_forward", "max_carry_forward", "is_paid"])
                    .values_panic([
                        seeded_id(100 + i as u128),
                        code.into(),
                        name.into(),
                        default_days.into(),
                        carry_forward.into(),
                        max_carry_forward.into(),
                        paid.into(),
                    ])
                    .to_owned()
                ).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for i in 0..LEAVE_TYPES.len() {
            manager
                .exec_stmt(Query::delete()
                    .from_table(LeaveType::Table)
                    .and_where(Expr::col("id").eq(seeded_id(100 + i as u128)))
                    .to_owned()
                ).await?;
        }

        manager
            .exec_stmt(Query::delete()
                .from_table(CompanySettings::Table)
                .and_where(Expr::col("id").eq(seeded_id(COMPANY_ID)))
                .to_owned()
            ).await?;

        Ok(())
    }
}
