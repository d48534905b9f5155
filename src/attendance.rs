//! Daily check-in/check-out, admin overrides and work-from-home requests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    calendar::{AttendanceSummary, Month},
    config::Settings,
    consts::HALF_DAY_HOURS,
    entity::{
        attendance,
        sea_orm_active_enums::{AttendanceStatus, RequestStatus},
        wfh_request,
    },
    geofence::{self, Coordinates},
    salary::round_currency,
    store::{AttendanceStore, GeoLocationStore},
    Error, Result,
};

/// Fractional hours between two instants, unrounded
fn hours_between(from: DateTimeWithTimeZone, to: DateTimeWithTimeZone) -> Decimal {
    Decimal::from((to - from).num_seconds()) / dec!(3600)
}

/// Checks in for the day `now` falls on.
///
/// With an approved WFH request the day is recorded as WFH and the geo-fence is not consulted.
#[tracing::instrument(skip(store, settings, now))]
pub async fn check_in<S>(
    store: &S,
    employee_id: Uuid,
    settings: &Settings,
    now: DateTimeWithTimeZone,
    at: Option<Coordinates>,
) -> Result<attendance::Model>
where
    S: AttendanceStore + GeoLocationStore,
{
    let today = now.date_naive();

    let existing = store.find_attendance_on(employee_id, today).await?;
    if existing.as_ref().is_some_and(|record| record.check_in.is_some()) {
        return Err(Error::Conflict("already checked in today".to_string()))
    }

    let is_wfh = store.approved_wfh(employee_id, today).await?;

    if let Some(point) = at.filter(|_| !is_wfh && settings.geo_fence_enabled) {
        let locations = store.active_locations().await?;
        let check = geofence::validate(point, &locations);

        if !check.valid {
            warn!(distance = check.distance, radius = check.radius, "check-in outside the geo-fence");

            return Err(Error::Validation(format!(
                "you are {}m away from office, must be within {}m to check in",
                check.distance, check.radius,
            )))
        }
    }

    let status = match is_wfh {
        true => AttendanceStatus::Wfh,
        false => AttendanceStatus::Present,
    };

    let record = existing.unwrap_or_else(|| attendance::Model::blank(employee_id, today, status, now));

    let record = store.upsert_attendance(attendance::Model {
        updated_at: now,
        status,
        check_in: Some(now),
        check_in_lat: at.map(|p| p.latitude),
        check_in_lng: at.map(|p| p.longitude),
        is_wfh,
        ..record
    }).await?;

    info!(?status, "checked in");

    Ok(record)
}

/// Checks out of today's record. Under four hours worked turns the day into a half day.
#[tracing::instrument(skip(store, now))]
pub async fn check_out<S: AttendanceStore>(
    store: &S,
    employee_id: Uuid,
    now: DateTimeWithTimeZone,
    at: Option<Coordinates>,
) -> Result<attendance::Model> {
    let record = store.find_attendance_on(employee_id, now.date_naive()).await?;

    let Some((record, check_in)) = record.and_then(|r| r.check_in.map(|check_in| (r, check_in))) else {
        return Err(Error::Validation("you haven't checked in today".to_string()))
    };

    if record.check_out.is_some() {
        return Err(Error::Conflict("already checked out today".to_string()))
    }

    let hours = hours_between(check_in, now);
    let status = match hours < HALF_DAY_HOURS {
        true => AttendanceStatus::HalfDay,
        false => record.status,
    };

    let record = store.upsert_attendance(attendance::Model {
        updated_at: now,
        status,
        check_out: Some(now),
        check_out_lat: at.map(|p| p.latitude),
        check_out_lng: at.map(|p| p.longitude),
        hours_worked: Some(round_currency(hours)),
        ..record
    }).await?;

    info!(hours = %round_currency(hours), ?status, "checked out");

    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub check_in: Option<DateTimeWithTimeZone>,
    #[serde(default)]
    pub check_out: Option<DateTimeWithTimeZone>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Admin correction of a day, replacing status and times
#[tracing::instrument(skip(store, request, now), fields(employee_id = %request.employee_id, date = %request.date))]
pub async fn manual_override<S: AttendanceStore>(
    store: &S,
    admin: Uuid,
    request: ManualOverride,
    now: DateTimeWithTimeZone,
) -> Result<attendance::Model> {
    let ManualOverride { employee_id, date, status, check_in, check_out, reason } = request;

    let hours_worked = match (check_in, check_out) {
        (Some(check_in), Some(check_out)) if check_out < check_in => {
            return Err(Error::Validation("check-out is before check-in".to_string()))
        },
        (Some(check_in), Some(check_out)) => Some(round_currency(hours_between(check_in, check_out))),
        _ => None,
    };

    let record = store.find_attendance_on(employee_id, date).await?
        .unwrap_or_else(|| attendance::Model::blank(employee_id, date, status, now));

    let record = store.upsert_attendance(attendance::Model {
        updated_at: now,
        status,
        check_in,
        check_out,
        hours_worked,
        is_manual_override: true,
        override_reason: reason,
        override_by: Some(admin),
        ..record
    }).await?;

    info!(?status, "attendance overridden");

    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    pub records: Vec<attendance::Model>,
    pub summary: AttendanceSummary,
}

pub async fn monthly_summary<S: AttendanceStore>(store: &S, employee_id: Uuid, month: Month) -> Result<MonthlyAttendance> {
    let records = store.find_attendance(employee_id, month.first_day(), month.last_day()).await?;
    let summary = AttendanceSummary::from_records(&records);

    Ok(MonthlyAttendance { records, summary })
}

/// One request per employee per date
#[tracing::instrument(skip(store, reason, now))]
pub async fn request_wfh<S: AttendanceStore>(
    store: &S,
    employee_id: Uuid,
    date: NaiveDate,
    reason: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<wfh_request::Model> {
    if store.find_wfh_on(employee_id, date).await?.is_some() {
        return Err(Error::Conflict(format!("a WFH request for {date} was already submitted")))
    }

    let request = store.save_wfh(wfh_request::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        employee_id,
        date,
        reason,
        status: RequestStatus::Pending,
        admin_comment: None,
    }).await?;

    Ok(request)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WfhDecision {
    Approve,
    Reject,
}

/// A decision may be revised later, the last one wins
#[tracing::instrument(skip(store, comment, now))]
pub async fn decide_wfh<S: AttendanceStore>(
    store: &S,
    request_id: Uuid,
    decision: WfhDecision,
    comment: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<wfh_request::Model> {
    let request = store.find_wfh(request_id).await?
        .ok_or(Error::NotFound("wfh request"))?;

    let status = match decision {
        WfhDecision::Approve => RequestStatus::Approved,
        WfhDecision::Reject => RequestStatus::Rejected,
    };

    let request = store.save_wfh(wfh_request::Model {
        updated_at: now,
        status,
        admin_comment: comment,
        ..request
    }).await?;

    Ok(request)
}
