//! Leave requests and the yearly balance ledger

use std::collections::{HashMap, HashSet};

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    calendar::{days_excluding_weekly_off, leave_days_between},
    entity::{
        leave_balance, leave_request, leave_type,
        sea_orm_active_enums::{AttendanceStatus, RequestStatus},
    },
    store::{ApprovalPlan, ApprovalStore, ApprovedRequest, HolidayStore, LeaveStore},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub leave_type_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub is_half_day: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Attendance written by an approval: `status` on every day of the range except the weekly off
pub(crate) fn approval_attendance(from: NaiveDate, to: NaiveDate, status: AttendanceStatus) -> Vec<(NaiveDate, AttendanceStatus)> {
    days_excluding_weekly_off(from, to)
        .map(|date| (date, status))
        .collect()
}

/// Files a PENDING request after checking the balance of the year `from_date` falls in.
#[tracing::instrument(skip(store, application, now), fields(from = %application.from_date, to = %application.to_date))]
pub async fn apply<S>(
    store: &S,
    employee_id: Uuid,
    application: LeaveApplication,
    now: DateTimeWithTimeZone,
) -> Result<leave_request::Model>
where
    S: LeaveStore + HolidayStore,
{
    let LeaveApplication { leave_type_id, from_date, to_date, is_half_day, reason } = application;

    if from_date > to_date {
        return Err(Error::Validation(format!("from date {from_date} is after to date {to_date}")))
    }

    let holidays = store.holidays_between(from_date, to_date).await?
        .into_iter()
        .collect::<HashSet<_>>();
    let days = leave_days_between(from_date, to_date, is_half_day, &holidays);

    let available = store.find_balance(employee_id, leave_type_id, from_date.year()).await?
        .map_or(Decimal::ZERO, |balance| balance.remaining);

    if available < days {
        return Err(Error::insufficient(days, available))
    }

    if let Some(existing) = store.find_overlapping_leave(employee_id, from_date, to_date).await? {
        return Err(Error::Conflict(format!(
            "a {:?} leave from {} to {} already covers these dates",
            existing.status, existing.from_date, existing.to_date,
        )))
    }

    let leave = store.save_leave(leave_request::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        employee_id,
        leave_type_id,
        from_date,
        to_date,
        days,
        is_half_day,
        reason,
        status: RequestStatus::Pending,
        admin_comment: None,
        approved_by: None,
        approved_at: None,
    }).await?;

    info!(%days, "leave applied");

    Ok(leave)
}

async fn find_pending<S: LeaveStore>(store: &S, leave_id: Uuid) -> Result<leave_request::Model> {
    let leave = store.find_leave(leave_id).await?
        .ok_or(Error::NotFound("leave"))?;

    if leave.status != RequestStatus::Pending {
        return Err(Error::Validation(format!("leave is {:?}, not pending", leave.status)))
    }

    Ok(leave)
}

/// Approves a pending request, debits the balance and marks the attendance, all or nothing.
#[tracing::instrument(skip(store, comment, now))]
pub async fn approve<S>(
    store: &S,
    leave_id: Uuid,
    approver: Uuid,
    comment: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<leave_request::Model>
where
    S: LeaveStore + ApprovalStore,
{
    let leave = find_pending(store, leave_id).await?;

    let status = match leave.is_half_day {
        true => AttendanceStatus::HalfDay,
        false => AttendanceStatus::OnLeave,
    };

    let plan = ApprovalPlan {
        employee_id: leave.employee_id,
        request: ApprovedRequest::Leave {
            id: leave.id,
            leave_type_id: leave.leave_type_id,
            year: leave.from_date.year(),
        },
        approved_by: approver,
        comment,
        approved_at: now,
        days: leave.days,
        attendance: approval_attendance(leave.from_date, leave.to_date, status),
    };

    let marked = plan.attendance.len();
    store.commit_approval(plan).await?;

    info!(days = %leave.days, marked, "leave approved");

    store.find_leave(leave_id).await?
        .ok_or(Error::NotFound("leave"))
}

#[tracing::instrument(skip(store, comment, now))]
pub async fn reject<S: LeaveStore>(
    store: &S,
    leave_id: Uuid,
    approver: Uuid,
    comment: &str,
    now: DateTimeWithTimeZone,
) -> Result<leave_request::Model> {
    if comment.trim().is_empty() {
        return Err(Error::Validation("a rejection comment is required".to_string()))
    }

    let leave = find_pending(store, leave_id).await?;

    let leave = store.save_leave(leave_request::Model {
        updated_at: now,
        status: RequestStatus::Rejected,
        admin_comment: Some(comment.to_string()),
        approved_by: Some(approver),
        ..leave
    }).await?;

    Ok(leave)
}

/// Withdraws a request. Only its owner may do so, and never once approved.
#[tracing::instrument(skip(store, now))]
pub async fn cancel<S: LeaveStore>(store: &S, leave_id: Uuid, employee_id: Uuid, now: DateTimeWithTimeZone) -> Result<leave_request::Model> {
    let leave = store.find_leave(leave_id).await?
        .ok_or(Error::NotFound("leave"))?;

    if leave.employee_id != employee_id {
        return Err(Error::Validation("only the applicant can cancel a leave".to_string()))
    }

    if leave.status == RequestStatus::Approved {
        return Err(Error::Validation("an approved leave cannot be cancelled".to_string()))
    }

    let leave = store.save_leave(leave_request::Model {
        updated_at: now,
        status: RequestStatus::Cancelled,
        ..leave
    }).await?;

    Ok(leave)
}

/// What happens to unused days at year end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloverMode {
    /// Carry-forward types keep up to their `max_carry_forward`
    Carry,
    #[default]
    Lapse,
}

fn carry_over(mode: RolloverMode, leave_type: Option<&leave_type::Model>, remaining: Decimal) -> Decimal {
    match (mode, leave_type) {
        (RolloverMode::Carry, Some(t)) if t.is_carry_forward && t.is_active => {
            remaining.min(t.max_carry_forward.unwrap_or(Decimal::ZERO)).max(Decimal::ZERO)
        },
        _ => Decimal::ZERO,
    }
}

/// Opens `from_year + 1` for every balance of `from_year`. Returns how many balances were written.
///
/// Days already used in the new year are preserved, so running it again is harmless.
#[tracing::instrument(skip(store, now))]
pub async fn year_end_rollover<S: LeaveStore>(
    store: &S,
    from_year: i32,
    mode: RolloverMode,
    now: DateTimeWithTimeZone,
) -> Result<usize> {
    let next_year = from_year + 1;
    let balances = store.balances_for_year(from_year).await?;

    let mut leave_types: HashMap<Uuid, Option<leave_type::Model>> = HashMap::new();

    for balance in &balances {
        if !leave_types.contains_key(&balance.leave_type_id) {
            let leave_type = store.find_leave_type(balance.leave_type_id).await?;
            leave_types.insert(balance.leave_type_id, leave_type);
        }
        let leave_type = leave_types.get(&balance.leave_type_id).and_then(Option::as_ref);

        let total = leave_type
            .map(|t| t.default_days)
            .filter(|days| !days.is_zero())
            .unwrap_or(balance.total);
        let carried_over = carry_over(mode, leave_type, balance.remaining);

        let existing = store.find_balance(balance.employee_id, balance.leave_type_id, next_year).await?;
        let used = existing.as_ref().map_or(Decimal::ZERO, |b| b.used);

        store.upsert_balance(leave_balance::Model {
            id: existing.as_ref().map_or_else(Uuid::new_v4, |b| b.id),
            created_at: existing.as_ref().map_or(now, |b| b.created_at),
            updated_at: now,
            employee_id: balance.employee_id,
            leave_type_id: balance.leave_type_id,
            year: next_year,
            total,
            used,
            remaining: total - used + carried_over,
            carried_over,
        }).await?;

        debug!(employee = %balance.employee_id, %total, %carried_over, "balance rolled over");
    }

    info!(processed = balances.len(), next_year, "year end rollover done");

    Ok(balances.len())
}
