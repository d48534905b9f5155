//! Personal holidays: a small yearly quota of paid days off, kept apart from leave types

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    consts::DEFAULT_PERSONAL_HOLIDAY_QUOTA,
    entity::{
        personal_holiday, personal_holiday_balance,
        sea_orm_active_enums::{AttendanceStatus, RequestStatus},
    },
    leave::approval_attendance,
    store::{ApprovalPlan, ApprovalStore, ApprovedRequest, EmployeeStore, PersonalHolidayStore},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalHolidayApplication {
    pub reason: String,
    #[serde(default)]
    pub description: Option<String>,
    pub from_date: NaiveDate,
    /// A single day when absent
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
}

/// The employee's balance, opened with the default quota on first use
pub async fn balance<S: PersonalHolidayStore>(
    store: &S,
    employee_id: Uuid,
    year: i32,
    now: DateTimeWithTimeZone,
) -> Result<personal_holiday_balance::Model> {
    if let Some(balance) = store.find_holiday_balance(employee_id).await? {
        return Ok(balance)
    }

    let balance = store.upsert_holiday_balance(personal_holiday_balance::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        employee_id,
        year,
        total: DEFAULT_PERSONAL_HOLIDAY_QUOTA,
        used: Decimal::ZERO,
        remaining: DEFAULT_PERSONAL_HOLIDAY_QUOTA,
    }).await?;

    Ok(balance)
}

/// Every calendar day of the range counts, weekly off included
#[tracing::instrument(skip(store, application, now), fields(from = %application.from_date))]
pub async fn apply<S: PersonalHolidayStore>(
    store: &S,
    employee_id: Uuid,
    application: PersonalHolidayApplication,
    now: DateTimeWithTimeZone,
) -> Result<personal_holiday::Model> {
    let PersonalHolidayApplication { reason, description, from_date, to_date } = application;
    let to_date = to_date.unwrap_or(from_date);

    if reason.trim().is_empty() {
        return Err(Error::Validation("a reason is required".to_string()))
    }

    if from_date > to_date {
        return Err(Error::Validation(format!("from date {from_date} is after to date {to_date}")))
    }

    let days = Decimal::from((to_date - from_date).num_days() + 1);

    let balance = balance(store, employee_id, from_date.year(), now).await?;
    if balance.remaining < days {
        return Err(Error::insufficient(days, balance.remaining))
    }

    let holiday = store.save_personal_holiday(personal_holiday::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        employee_id,
        reason,
        description,
        from_date,
        to_date,
        days,
        status: RequestStatus::Pending,
        admin_comment: None,
        approved_by: None,
        approved_at: None,
    }).await?;

    info!(%days, "personal holiday applied");

    Ok(holiday)
}

async fn find_pending<S: PersonalHolidayStore>(store: &S, holiday_id: Uuid) -> Result<personal_holiday::Model> {
    let holiday = store.find_personal_holiday(holiday_id).await?
        .ok_or(Error::NotFound("personal holiday"))?;

    if holiday.status != RequestStatus::Pending {
        return Err(Error::Validation(format!("personal holiday is {:?}, not pending", holiday.status)))
    }

    Ok(holiday)
}

/// Same unit of work as a leave approval, marking PERSONAL_HOLIDAY attendance
#[tracing::instrument(skip(store, comment, now))]
pub async fn approve<S>(
    store: &S,
    holiday_id: Uuid,
    approver: Uuid,
    comment: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<personal_holiday::Model>
where
    S: PersonalHolidayStore + ApprovalStore,
{
    let holiday = find_pending(store, holiday_id).await?;

    store.commit_approval(ApprovalPlan {
        employee_id: holiday.employee_id,
        request: ApprovedRequest::PersonalHoliday { id: holiday.id },
        approved_by: approver,
        comment,
        approved_at: now,
        days: holiday.days,
        attendance: approval_attendance(holiday.from_date, holiday.to_date, AttendanceStatus::PersonalHoliday),
    }).await?;

    info!(days = %holiday.days, "personal holiday approved");

    store.find_personal_holiday(holiday_id).await?
        .ok_or(Error::NotFound("personal holiday"))
}

#[tracing::instrument(skip(store, comment, now))]
pub async fn reject<S: PersonalHolidayStore>(
    store: &S,
    holiday_id: Uuid,
    approver: Uuid,
    comment: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<personal_holiday::Model> {
    let holiday = find_pending(store, holiday_id).await?;

    let holiday = store.save_personal_holiday(personal_holiday::Model {
        updated_at: now,
        status: RequestStatus::Rejected,
        admin_comment: comment,
        approved_by: Some(approver),
        ..holiday
    }).await?;

    Ok(holiday)
}

/// Sets the quota and resets `remaining` to it, whatever was used
#[tracing::instrument(skip(store, now))]
pub async fn set_quota<S: PersonalHolidayStore>(
    store: &S,
    employee_id: Uuid,
    quota: Decimal,
    now: DateTimeWithTimeZone,
) -> Result<personal_holiday_balance::Model> {
    if quota < Decimal::ZERO {
        return Err(Error::Validation(format!("quota cannot be negative, got {quota}")))
    }

    let existing = store.find_holiday_balance(employee_id).await?;

    let balance = store.upsert_holiday_balance(match existing {
        Some(existing) => personal_holiday_balance::Model {
            updated_at: now,
            total: quota,
            remaining: quota,
            ..existing
        },
        None => personal_holiday_balance::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            employee_id,
            year: now.year(),
            total: quota,
            used: Decimal::ZERO,
            remaining: quota,
        },
    }).await?;

    Ok(balance)
}

/// [`set_quota`] for every active employee. Returns how many balances were set.
#[tracing::instrument(skip(store, now))]
pub async fn set_quota_for_active<S>(store: &S, quota: Decimal, now: DateTimeWithTimeZone) -> Result<usize>
where
    S: EmployeeStore + PersonalHolidayStore,
{
    let employees = store.active_employees().await?;

    for employee in &employees {
        set_quota(store, employee.id, quota, now).await?;
    }

    info!(updated = employees.len(), "personal holiday quota set");

    Ok(employees.len())
}

/// Moves every balance to `next_year` with nothing used
#[tracing::instrument(skip(store, now))]
pub async fn year_end_reset<S: PersonalHolidayStore>(store: &S, next_year: i32, now: DateTimeWithTimeZone) -> Result<usize> {
    let balances = store.holiday_balances().await?;
    let processed = balances.len();

    for balance in balances {
        store.upsert_holiday_balance(personal_holiday_balance::Model {
            updated_at: now,
            year: next_year,
            used: Decimal::ZERO,
            remaining: balance.total,
            ..balance
        }).await?;
    }

    info!(processed, next_year, "personal holiday balances reset");

    Ok(processed)
}
