use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entity::{
        attendance, company_settings, employee, geo_location, holiday, leave_balance, leave_request, leave_type,
        payroll, personal_holiday, personal_holiday_balance, prelude::*, salary_component, salary_structure,
        salary_template::{self, ComponentDraft},
        sea_orm_active_enums::{EmployeeStatus, PayrollStatus, RequestStatus},
        wfh_request,
    },
    salary::Structure,
};

use super::{
    ApprovalPlan, ApprovalStore, ApprovedRequest, AttendanceStore, EmployeeStore, GeoLocationStore, HolidayStore,
    LeaveStore, PayrollStore, PersonalHolidayStore, SalaryStore, SettingsStore,
};

/// `ON CONFLICT (keys) DO UPDATE` every column except the keys, `id`, `created_at` and `keep`
fn overwrite_on<C: ColumnTrait>(keys: &[C], keep: &[C]) -> OnConflict {
    let untouched = |column: &C| {
        matches!(column.as_str(), "id" | "created_at")
            || keys.iter().chain(keep).any(|other| other.as_str() == column.as_str())
    };

    OnConflict::columns(keys.iter().copied())
        .update_columns(C::iter().filter(|column| !untouched(column)))
        .to_owned()
}

fn ensure_updated(rows_affected: u64) -> Result<(), DbErr> {
    match rows_affected {
        0 => Err(DbErr::RecordNotUpdated),
        _ => Ok(()),
    }
}

#[async_trait]
impl EmployeeStore for DatabaseConnection {
    async fn active_employees(&self) -> Result<Vec<employee::Model>, DbErr> {
        Employee::find()
            .filter(employee::Column::Status.eq(EmployeeStatus::Active))
            .order_by_asc(employee::Column::Name)
            .all(self).await
    }
}

#[async_trait]
impl SettingsStore for DatabaseConnection {
    async fn company_settings(&self) -> Result<Option<company_settings::Model>, DbErr> {
        CompanySettings::find()
            .order_by_asc(company_settings::Column::CreatedAt)
            .one(self).await
    }
}

#[async_trait]
impl GeoLocationStore for DatabaseConnection {
    async fn active_locations(&self) -> Result<Vec<geo_location::Model>, DbErr> {
        GeoLocation::find()
            .filter(geo_location::Column::IsActive.eq(true))
            .order_by_asc(geo_location::Column::CreatedAt)
            .all(self).await
    }
}

#[async_trait]
impl HolidayStore for DatabaseConnection {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, DbErr> {
        let holidays = Holiday::find()
            .filter(holiday::Column::Date.between(from, to))
            .order_by_asc(holiday::Column::Date)
            .all(self).await?;

        Ok(holidays.into_iter().map(|holiday| holiday.date).collect())
    }
}

#[async_trait]
impl AttendanceStore for DatabaseConnection {
    async fn find_attendance(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<attendance::Model>, DbErr> {
        Attendance::find()
            .filter(attendance::Column::EmployeeId.eq(employee_id))
            .filter(attendance::Column::Date.between(from, to))
            .order_by_asc(attendance::Column::Date)
            .all(self).await
    }

    async fn find_attendance_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<attendance::Model>, DbErr> {
        Attendance::find()
            .filter(attendance::Column::EmployeeId.eq(employee_id))
            .filter(attendance::Column::Date.eq(date))
            .one(self).await
    }

    async fn upsert_attendance(&self, record: attendance::Model) -> Result<attendance::Model, DbErr> {
        Attendance::insert(record.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[attendance::Column::EmployeeId, attendance::Column::Date], &[]))
            .exec_with_returning(self).await
    }

    async fn approved_wfh(&self, employee_id: Uuid, date: NaiveDate) -> Result<bool, DbErr> {
        let request = WfhRequest::find()
            .filter(wfh_request::Column::EmployeeId.eq(employee_id))
            .filter(wfh_request::Column::Date.eq(date))
            .filter(wfh_request::Column::Status.eq(RequestStatus::Approved))
            .one(self).await?;

        Ok(request.is_some())
    }

    async fn find_wfh_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<wfh_request::Model>, DbErr> {
        WfhRequest::find()
            .filter(wfh_request::Column::EmployeeId.eq(employee_id))
            .filter(wfh_request::Column::Date.eq(date))
            .one(self).await
    }

    async fn find_wfh(&self, id: Uuid) -> Result<Option<wfh_request::Model>, DbErr> {
        WfhRequest::find_by_id(id).one(self).await
    }

    async fn save_wfh(&self, request: wfh_request::Model) -> Result<wfh_request::Model, DbErr> {
        WfhRequest::insert(request.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[wfh_request::Column::Id], &[]))
            .exec_with_returning(self).await
    }
}

#[async_trait]
impl SalaryStore for DatabaseConnection {
    async fn get_structure(&self, employee_id: Uuid) -> Result<Option<Structure>, DbErr> {
        let Some(structure) = SalaryStructure::find()
            .filter(salary_structure::Column::EmployeeId.eq(employee_id))
            .one(self).await?
        else {
            return Ok(None)
        };

        let components = structure.find_related(SalaryComponent)
            .order_by_asc(salary_component::Column::Order)
            .all(self).await?;

        Ok(Some(Structure { structure, components }))
    }

    async fn replace_structure(
        &self,
        employee_id: Uuid,
        basic_salary: Decimal,
        components: Vec<ComponentDraft>,
        now: DateTimeWithTimeZone,
    ) -> Result<Structure, DbErr> {
        let txn = self.begin().await?;

        let structure = SalaryStructure::insert(salary_structure::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            employee_id: Set(employee_id),
            basic_salary: Set(basic_salary),
        })
            .on_conflict(overwrite_on(&[salary_structure::Column::EmployeeId], &[]))
            .exec_with_returning(&txn).await?;

        let removed = SalaryComponent::delete_many()
            .filter(salary_component::Column::StructureId.eq(structure.id))
            .exec(&txn).await?;
        debug!(removed = removed.rows_affected, "previous salary components removed");

        let components = components.into_iter().enumerate()
            .map(|(order, draft)| salary_component::Model {
                id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
                structure_id: structure.id,
                name: draft.name,
                kind: draft.kind,
                calc_type: draft.calc_type,
                value: draft.value,
                is_active: draft.is_active,
                order: order as i32,
            })
            .collect::<Vec<_>>();

        if !components.is_empty() {
            SalaryComponent::insert_many(components.iter().cloned().map(|c| c.into_active_model().reset_all()))
                .exec_without_returning(&txn).await?;
        }

        txn.commit().await?;

        Ok(Structure { structure, components })
    }

    async fn save_template(&self, template: salary_template::Model) -> Result<salary_template::Model, DbErr> {
        SalaryTemplate::insert(template.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[salary_template::Column::Name], &[]))
            .exec_with_returning(self).await
    }

    async fn find_template(&self, id: Uuid) -> Result<Option<salary_template::Model>, DbErr> {
        SalaryTemplate::find_by_id(id).one(self).await
    }
}

#[async_trait]
impl PayrollStore for DatabaseConnection {
    async fn upsert_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr> {
        Payroll::insert(payroll.into_active_model().reset_all())
            .on_conflict(overwrite_on(
                &[payroll::Column::EmployeeId, payroll::Column::Month],
                &[
                    payroll::Column::OverrideAmount,
                    payroll::Column::OverrideReason,
                    payroll::Column::PaidAt,
                    payroll::Column::PaidBy,
                ],
            ))
            .exec_with_returning(self).await
    }

    async fn find_payroll(&self, id: Uuid) -> Result<Option<payroll::Model>, DbErr> {
        Payroll::find_by_id(id).one(self).await
    }

    async fn find_payrolls(&self, month: NaiveDate) -> Result<Vec<payroll::Model>, DbErr> {
        Payroll::find()
            .filter(payroll::Column::Month.eq(month))
            .order_by_asc(payroll::Column::CreatedAt)
            .all(self).await
    }

    async fn find_employee_payrolls(
        &self,
        employee_id: Uuid,
        status: PayrollStatus,
        limit: u64,
    ) -> Result<Vec<payroll::Model>, DbErr> {
        Payroll::find()
            .filter(payroll::Column::EmployeeId.eq(employee_id))
            .filter(payroll::Column::Status.eq(status))
            .order_by_desc(payroll::Column::Month)
            .limit(limit)
            .all(self).await
    }

    async fn update_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr> {
        payroll.into_active_model().reset_all().update(self).await
    }

    async fn mark_paid_many(&self, ids: &[Uuid], paid_by: Uuid, now: DateTimeWithTimeZone) -> Result<u64, DbErr> {
        let res = Payroll::update_many()
            .set(payroll::ActiveModel {
                updated_at: Set(now),
                status: Set(PayrollStatus::Paid),
                paid_at: Set(Some(now)),
                paid_by: Set(Some(paid_by)),
                ..Default::default()
            })
            .filter(payroll::Column::Id.is_in(ids.iter().copied()))
            .exec(self).await?;

        Ok(res.rows_affected)
    }
}

#[async_trait]
impl LeaveStore for DatabaseConnection {
    async fn find_leave_type(&self, id: Uuid) -> Result<Option<leave_type::Model>, DbErr> {
        LeaveType::find_by_id(id).one(self).await
    }

    async fn find_balance(&self, employee_id: Uuid, leave_type_id: Uuid, year: i32) -> Result<Option<leave_balance::Model>, DbErr> {
        LeaveBalance::find()
            .filter(leave_balance::Column::EmployeeId.eq(employee_id))
            .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_balance::Column::Year.eq(year))
            .one(self).await
    }

    async fn balances_for_year(&self, year: i32) -> Result<Vec<leave_balance::Model>, DbErr> {
        LeaveBalance::find()
            .filter(leave_balance::Column::Year.eq(year))
            .all(self).await
    }

    async fn upsert_balance(&self, balance: leave_balance::Model) -> Result<leave_balance::Model, DbErr> {
        LeaveBalance::insert(balance.into_active_model().reset_all())
            .on_conflict(overwrite_on(
                &[leave_balance::Column::EmployeeId, leave_balance::Column::LeaveTypeId, leave_balance::Column::Year],
                &[],
            ))
            .exec_with_returning(self).await
    }

    async fn find_overlapping_leave(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Option<leave_request::Model>, DbErr> {
        LeaveRequest::find()
            .filter(leave_request::Column::EmployeeId.eq(employee_id))
            .filter(
                Condition::any()
                    .add(leave_request::Column::Status.eq(RequestStatus::Pending))
                    .add(leave_request::Column::Status.eq(RequestStatus::Approved))
            )
            .filter(leave_request::Column::FromDate.lte(to))
            .filter(leave_request::Column::ToDate.gte(from))
            .one(self).await
    }

    async fn find_leave(&self, id: Uuid) -> Result<Option<leave_request::Model>, DbErr> {
        LeaveRequest::find_by_id(id).one(self).await
    }

    async fn save_leave(&self, leave: leave_request::Model) -> Result<leave_request::Model, DbErr> {
        LeaveRequest::insert(leave.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[leave_request::Column::Id], &[]))
            .exec_with_returning(self).await
    }
}

#[async_trait]
impl PersonalHolidayStore for DatabaseConnection {
    async fn find_holiday_balance(&self, employee_id: Uuid) -> Result<Option<personal_holiday_balance::Model>, DbErr> {
        PersonalHolidayBalance::find()
            .filter(personal_holiday_balance::Column::EmployeeId.eq(employee_id))
            .one(self).await
    }

    async fn holiday_balances(&self) -> Result<Vec<personal_holiday_balance::Model>, DbErr> {
        PersonalHolidayBalance::find().all(self).await
    }

    async fn upsert_holiday_balance(&self, balance: personal_holiday_balance::Model) -> Result<personal_holiday_balance::Model, DbErr> {
        PersonalHolidayBalance::insert(balance.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[personal_holiday_balance::Column::EmployeeId], &[]))
            .exec_with_returning(self).await
    }

    async fn find_personal_holiday(&self, id: Uuid) -> Result<Option<personal_holiday::Model>, DbErr> {
        PersonalHoliday::find_by_id(id).one(self).await
    }

    async fn save_personal_holiday(&self, holiday: personal_holiday::Model) -> Result<personal_holiday::Model, DbErr> {
        PersonalHoliday::insert(holiday.into_active_model().reset_all())
            .on_conflict(overwrite_on(&[personal_holiday::Column::Id], &[]))
            .exec_with_returning(self).await
    }
}

#[async_trait]
impl ApprovalStore for DatabaseConnection {
    async fn commit_approval(&self, plan: ApprovalPlan) -> Result<(), DbErr> {
        let txn = self.begin().await?;
        let at = plan.approved_at;

        match plan.request {
            ApprovedRequest::Leave { id, leave_type_id, year } => {
                // Only a request still pending can be approved
                let res = LeaveRequest::update_many()
                    .set(leave_request::ActiveModel {
                        updated_at: Set(at),
                        status: Set(RequestStatus::Approved),
                        admin_comment: Set(plan.comment.clone()),
                        approved_by: Set(Some(plan.approved_by)),
                        approved_at: Set(Some(at)),
                        ..Default::default()
                    })
                    .filter(leave_request::Column::Id.eq(id))
                    .filter(leave_request::Column::Status.eq(RequestStatus::Pending))
                    .exec(&txn).await?;
                ensure_updated(res.rows_affected)?;

                let res = LeaveBalance::update_many()
                    .col_expr(leave_balance::Column::Used, Expr::col(leave_balance::Column::Used).add(plan.days))
                    .col_expr(leave_balance::Column::Remaining, Expr::col(leave_balance::Column::Remaining).sub(plan.days))
                    .col_expr(leave_balance::Column::UpdatedAt, Expr::value(at))
                    .filter(leave_balance::Column::EmployeeId.eq(plan.employee_id))
                    .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
                    .filter(leave_balance::Column::Year.eq(year))
                    .exec(&txn).await?;
                ensure_updated(res.rows_affected)?;
            },
            ApprovedRequest::PersonalHoliday { id } => {
                let res = PersonalHoliday::update_many()
                    .set(personal_holiday::ActiveModel {
                        updated_at: Set(at),
                        status: Set(RequestStatus::Approved),
                        admin_comment: Set(plan.comment.clone()),
                        approved_by: Set(Some(plan.approved_by)),
                        approved_at: Set(Some(at)),
                        ..Default::default()
                    })
                    .filter(personal_holiday::Column::Id.eq(id))
                    .filter(personal_holiday::Column::Status.eq(RequestStatus::Pending))
                    .exec(&txn).await?;
                ensure_updated(res.rows_affected)?;

                let res = PersonalHolidayBalance::update_many()
                    .col_expr(personal_holiday_balance::Column::Used, Expr::col(personal_holiday_balance::Column::Used).add(plan.days))
                    .col_expr(personal_holiday_balance::Column::Remaining, Expr::col(personal_holiday_balance::Column::Remaining).sub(plan.days))
                    .col_expr(personal_holiday_balance::Column::UpdatedAt, Expr::value(at))
                    .filter(personal_holiday_balance::Column::EmployeeId.eq(plan.employee_id))
                    .exec(&txn).await?;
                ensure_updated(res.rows_affected)?;
            },
        }

        for (date, status) in plan.attendance {
            let record = attendance::Model::blank(plan.employee_id, date, status, at);

            Attendance::insert(record.into_active_model().reset_all())
                .on_conflict(
                    OnConflict::columns([attendance::Column::EmployeeId, attendance::Column::Date])
                        .update_columns([attendance::Column::Status, attendance::Column::UpdatedAt])
                        .to_owned()
                )
                .exec_without_returning(&txn).await?;
        }

        txn.commit().await
    }
}
