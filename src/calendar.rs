use std::{collections::HashSet, fmt};

use chrono::{Datelike as _, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{consts::{HALF_DAY, WEEKLY_OFF}, entity::{attendance, sea_orm_active_enums::AttendanceStatus}, Error, Result};

/// A calendar month, represented by its first day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| Error::Validation(format!("{year}-{month:02} is not a valid month")))
    }

    /// Parses `YYYY-MM`
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("`{value}` is not a month in `YYYY-MM` format"));

        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0 + Months::new(1) - Days::new(1)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        days_between(self.first_day(), self.last_day())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// First and last date of the month
pub fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let month = Month::new(year, month)?;

    Ok((month.first_day(), month.last_day()))
}

/// Every date in `[from, to]`; empty when `from > to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |day| *day <= to)
}

/// Dates in `[from, to]` that do not fall on the weekly off day
pub fn days_excluding_weekly_off(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    days_between(from, to).filter(|day| day.weekday() != WEEKLY_OFF)
}

/// An admin configured count always wins over the calendar
pub fn working_days_in_month(month: Month, configured: Option<u32>) -> u32 {
    if let Some(days) = configured.filter(|days| *days > 0) {
        return days
    }

    month.days()
        .filter(|day| day.weekday() != WEEKLY_OFF)
        .count() as u32
}

/// Chargeable leave days in `[from, to]`, skipping the weekly off day and public holidays.
///
/// A half day leave is always 0.5 whatever the range.
pub fn leave_days_between(from: NaiveDate, to: NaiveDate, is_half_day: bool, holidays: &HashSet<NaiveDate>) -> Decimal {
    if is_half_day {
        return HALF_DAY
    }

    let days = days_excluding_weekly_off(from, to)
        .filter(|day| !holidays.contains(day))
        .count();

    Decimal::from(days)
}

/// Per status tally of a month of attendance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub present: u32,
    pub absent: u32,
    pub half_days: u32,
    pub on_leave: u32,
    pub wfh: u32,
    pub personal_holiday: u32,
    pub holiday: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Days paid in full, including leave and holidays
    pub present_days: u32,
    /// Absences
    pub lop_days: u32,
    pub half_day_count: u32,
    pub breakdown: StatusBreakdown,
}

impl AttendanceSummary {
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut summary = Self::default();

        for status in statuses {
            if status.is_paid_day() {
                summary.present_days += 1;
            }

            let breakdown = &mut summary.breakdown;
            match status {
                AttendanceStatus::Present => breakdown.present += 1,
                AttendanceStatus::Absent => {
                    breakdown.absent += 1;
                    summary.lop_days += 1;
                },
                AttendanceStatus::HalfDay => {
                    breakdown.half_days += 1;
                    summary.half_day_count += 1;
                },
                AttendanceStatus::OnLeave => breakdown.on_leave += 1,
                AttendanceStatus::Wfh => breakdown.wfh += 1,
                AttendanceStatus::PersonalHoliday => breakdown.personal_holiday += 1,
                AttendanceStatus::Holiday => breakdown.holiday += 1,
            }
        }

        summary
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a attendance::Model>) -> Self {
        Self::from_statuses(records.into_iter().map(|record| record.status))
    }

    /// Deduction basis: absences plus half of every half day
    pub fn total_lop(&self) -> Decimal {
        Decimal::from(self.lop_days) + HALF_DAY * Decimal::from(self.half_day_count)
    }
}
