//! In-memory store for unit tests, with injectable failures

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, DbErr};
use uuid::Uuid;

use crate::{
    entity::{
        attendance, company_settings, employee, geo_location, leave_balance, leave_request, leave_type, payroll,
        personal_holiday, personal_holiday_balance, salary_component, salary_structure,
        salary_template::{self, ComponentDraft},
        sea_orm_active_enums::{EmployeeStatus, PayrollStatus, RequestStatus},
        wfh_request,
    },
    salary::Structure,
};

use super::*;

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub employees: Vec<employee::Model>,
    pub company: Option<company_settings::Model>,
    pub locations: Vec<geo_location::Model>,
    pub holidays: Vec<NaiveDate>,
    pub attendance: Vec<attendance::Model>,
    pub wfh: Vec<wfh_request::Model>,
    pub structures: Vec<salary_structure::Model>,
    pub components: Vec<salary_component::Model>,
    pub templates: Vec<salary_template::Model>,
    pub payrolls: Vec<payroll::Model>,
    pub leave_types: Vec<leave_type::Model>,
    pub balances: Vec<leave_balance::Model>,
    pub leaves: Vec<leave_request::Model>,
    pub personal_holidays: Vec<personal_holiday::Model>,
    pub holiday_balances: Vec<personal_holiday_balance::Model>,
}

#[derive(Debug, Default)]
struct Failures {
    attendance_on: Option<NaiveDate>,
    structure_of: Option<Uuid>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
    failures: Mutex<Failures>,
}

impl MemoryStore {
    pub fn seed(&self, f: impl FnOnce(&mut MemoryState)) {
        f(&mut self.state.lock().unwrap())
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    /// Any attendance write for `date` fails from now on
    pub fn fail_attendance_on(&self, date: NaiveDate) {
        self.failures.lock().unwrap().attendance_on = Some(date);
    }

    pub fn fail_structure_of(&self, employee_id: Uuid) {
        self.failures.lock().unwrap().structure_of = Some(employee_id);
    }

    fn check_attendance_write(&self, date: NaiveDate) -> Result<(), DbErr> {
        if self.failures.lock().unwrap().attendance_on == Some(date) {
            return Err(DbErr::Custom(format!("injected failure writing attendance on {date}")))
        }

        Ok(())
    }
}

fn upsert_by<T: Clone>(rows: &mut Vec<T>, row: T, same: impl Fn(&T) -> bool, merge: impl FnOnce(&T, T) -> T) -> T {
    match rows.iter_mut().find(|existing| same(existing)) {
        Some(existing) => {
            *existing = merge(existing, row);
            existing.clone()
        },
        None => {
            rows.push(row.clone());
            row
        },
    }
}

fn apply_approval(state: &mut MemoryState, plan: &ApprovalPlan, fail_on: Option<NaiveDate>) -> Result<(), DbErr> {
    match plan.request {
        ApprovedRequest::Leave { id, leave_type_id, year } => {
            let leave = state.leaves.iter_mut()
                .find(|leave| leave.id == id && leave.status == RequestStatus::Pending)
                .ok_or(DbErr::RecordNotUpdated)?;
            leave.status = RequestStatus::Approved;
            leave.admin_comment = plan.comment.clone();
            leave.approved_by = Some(plan.approved_by);
            leave.approved_at = Some(plan.approved_at);

            let balance = state.balances.iter_mut()
                .find(|b| b.employee_id == plan.employee_id && b.leave_type_id == leave_type_id && b.year == year)
                .ok_or(DbErr::RecordNotUpdated)?;
            balance.used += plan.days;
            balance.remaining -= plan.days;
        },
        ApprovedRequest::PersonalHoliday { id } => {
            let holiday = state.personal_holidays.iter_mut()
                .find(|holiday| holiday.id == id && holiday.status == RequestStatus::Pending)
                .ok_or(DbErr::RecordNotUpdated)?;
            holiday.status = RequestStatus::Approved;
            holiday.admin_comment = plan.comment.clone();
            holiday.approved_by = Some(plan.approved_by);
            holiday.approved_at = Some(plan.approved_at);

            let balance = state.holiday_balances.iter_mut()
                .find(|b| b.employee_id == plan.employee_id)
                .ok_or(DbErr::RecordNotUpdated)?;
            balance.used += plan.days;
            balance.remaining -= plan.days;
        },
    }

    for (date, status) in &plan.attendance {
        if fail_on == Some(*date) {
            return Err(DbErr::Custom(format!("injected failure writing attendance on {date}")))
        }

        let record = attendance::Model::blank(plan.employee_id, *date, *status, plan.approved_at);
        upsert_by(
            &mut state.attendance,
            record,
            |r| r.employee_id == plan.employee_id && r.date == *date,
            |existing, new| attendance::Model { status: new.status, updated_at: new.updated_at, ..existing.clone() },
        );
    }

    Ok(())
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn active_employees(&self) -> Result<Vec<employee::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        let mut employees = state.employees.iter()
            .filter(|e| e.status == EmployeeStatus::Active)
            .cloned()
            .collect::<Vec<_>>();
        employees.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(employees)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn company_settings(&self) -> Result<Option<company_settings::Model>, DbErr> {
        Ok(self.state.lock().unwrap().company.clone())
    }
}

#[async_trait]
impl GeoLocationStore for MemoryStore {
    async fn active_locations(&self) -> Result<Vec<geo_location::Model>, DbErr> {
        Ok(self.state.lock().unwrap().locations.iter().filter(|l| l.is_active).cloned().collect())
    }
}

#[async_trait]
impl HolidayStore for MemoryStore {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, DbErr> {
        Ok(self.state.lock().unwrap().holidays.iter().copied().filter(|d| from <= *d && *d <= to).collect())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_attendance(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<attendance::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        let mut records = state.attendance.iter()
            .filter(|r| r.employee_id == employee_id && from <= r.date && r.date <= to)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.date);

        Ok(records)
    }

    async fn find_attendance_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<attendance::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        Ok(state.attendance.iter().find(|r| r.employee_id == employee_id && r.date == date).cloned())
    }

    async fn upsert_attendance(&self, record: attendance::Model) -> Result<attendance::Model, DbErr> {
        self.check_attendance_write(record.date)?;

        let mut state = self.state.lock().unwrap();
        let (employee_id, date) = (record.employee_id, record.date);

        Ok(upsert_by(
            &mut state.attendance,
            record,
            |r| r.employee_id == employee_id && r.date == date,
            |existing, new| attendance::Model { id: existing.id, created_at: existing.created_at, ..new },
        ))
    }

    async fn approved_wfh(&self, employee_id: Uuid, date: NaiveDate) -> Result<bool, DbErr> {
        let state = self.state.lock().unwrap();

        Ok(state.wfh.iter().any(|w| w.employee_id == employee_id && w.date == date && w.status == RequestStatus::Approved))
    }

    async fn find_wfh_on(&self, employee_id: Uuid, date: NaiveDate) -> Result<Option<wfh_request::Model>, DbErr> {
        Ok(self.state.lock().unwrap().wfh.iter().find(|w| w.employee_id == employee_id && w.date == date).cloned())
    }

    async fn find_wfh(&self, id: Uuid) -> Result<Option<wfh_request::Model>, DbErr> {
        Ok(self.state.lock().unwrap().wfh.iter().find(|w| w.id == id).cloned())
    }

    async fn save_wfh(&self, request: wfh_request::Model) -> Result<wfh_request::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let id = request.id;

        Ok(upsert_by(&mut state.wfh, request, |w| w.id == id, |_, new| new))
    }
}

#[async_trait]
impl SalaryStore for MemoryStore {
    async fn get_structure(&self, employee_id: Uuid) -> Result<Option<Structure>, DbErr> {
        if self.failures.lock().unwrap().structure_of == Some(employee_id) {
            return Err(DbErr::Custom(format!("injected failure reading structure of {employee_id}")))
        }

        let state = self.state.lock().unwrap();

        let Some(structure) = state.structures.iter().find(|s| s.employee_id == employee_id).cloned() else {
            return Ok(None)
        };

        let mut components = state.components.iter()
            .filter(|c| c.structure_id == structure.id)
            .cloned()
            .collect::<Vec<_>>();
        components.sort_by_key(|c| c.order);

        Ok(Some(Structure { structure, components }))
    }

    async fn replace_structure(
        &self,
        employee_id: Uuid,
        basic_salary: Decimal,
        components: Vec<ComponentDraft>,
        now: DateTimeWithTimeZone,
    ) -> Result<Structure, DbErr> {
        let mut state = self.state.lock().unwrap();

        let structure = upsert_by(
            &mut state.structures,
            salary_structure::Model { id: Uuid::new_v4(), created_at: now, updated_at: now, employee_id, basic_salary },
            |s| s.employee_id == employee_id,
            |existing, new| salary_structure::Model { basic_salary: new.basic_salary, updated_at: now, ..existing.clone() },
        );

        state.components.retain(|c| c.structure_id != structure.id);

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
        state.components.extend(components.iter().cloned());

        Ok(Structure { structure, components })
    }

    async fn save_template(&self, template: salary_template::Model) -> Result<salary_template::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let name = template.name.clone();

        Ok(upsert_by(
            &mut state.templates,
            template,
            |t| t.name == name,
            |existing, new| salary_template::Model { id: existing.id, created_at: existing.created_at, ..new },
        ))
    }

    async fn find_template(&self, id: Uuid) -> Result<Option<salary_template::Model>, DbErr> {
        Ok(self.state.lock().unwrap().templates.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn upsert_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let (employee_id, month) = (payroll.employee_id, payroll.month);

        Ok(upsert_by(
            &mut state.payrolls,
            payroll,
            |p| p.employee_id == employee_id && p.month == month,
            |existing, new| payroll::Model {
                id: existing.id,
                created_at: existing.created_at,
                override_amount: existing.override_amount,
                override_reason: existing.override_reason.clone(),
                paid_at: existing.paid_at,
                paid_by: existing.paid_by,
                ..new
            },
        ))
    }

    async fn find_payroll(&self, id: Uuid) -> Result<Option<payroll::Model>, DbErr> {
        Ok(self.state.lock().unwrap().payrolls.iter().find(|p| p.id == id).cloned())
    }

    async fn find_payrolls(&self, month: NaiveDate) -> Result<Vec<payroll::Model>, DbErr> {
        Ok(self.state.lock().unwrap().payrolls.iter().filter(|p| p.month == month).cloned().collect())
    }

    async fn find_employee_payrolls(&self, employee_id: Uuid, status: PayrollStatus, limit: u64) -> Result<Vec<payroll::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        let mut payrolls = state.payrolls.iter()
            .filter(|p| p.employee_id == employee_id && p.status == status)
            .cloned()
            .collect::<Vec<_>>();
        payrolls.sort_by(|a, b| b.month.cmp(&a.month));
        payrolls.truncate(limit as usize);

        Ok(payrolls)
    }

    async fn update_payroll(&self, payroll: payroll::Model) -> Result<payroll::Model, DbErr> {
        let mut state = self.state.lock().unwrap();

        let existing = state.payrolls.iter_mut()
            .find(|p| p.id == payroll.id)
            .ok_or(DbErr::RecordNotUpdated)?;
        *existing = payroll.clone();

        Ok(payroll)
    }

    async fn mark_paid_many(&self, ids: &[Uuid], paid_by: Uuid, now: DateTimeWithTimeZone) -> Result<u64, DbErr> {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;

        for payroll in state.payrolls.iter_mut().filter(|p| ids.contains(&p.id)) {
            payroll.status = PayrollStatus::Paid;
            payroll.paid_at = Some(now);
            payroll.paid_by = Some(paid_by);
            updated += 1;
        }

        Ok(updated)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn find_leave_type(&self, id: Uuid) -> Result<Option<leave_type::Model>, DbErr> {
        Ok(self.state.lock().unwrap().leave_types.iter().find(|t| t.id == id).cloned())
    }

    async fn find_balance(&self, employee_id: Uuid, leave_type_id: Uuid, year: i32) -> Result<Option<leave_balance::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        Ok(state.balances.iter()
            .find(|b| b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year)
            .cloned())
    }

    async fn balances_for_year(&self, year: i32) -> Result<Vec<leave_balance::Model>, DbErr> {
        Ok(self.state.lock().unwrap().balances.iter().filter(|b| b.year == year).cloned().collect())
    }

    async fn upsert_balance(&self, balance: leave_balance::Model) -> Result<leave_balance::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let (employee_id, leave_type_id, year) = (balance.employee_id, balance.leave_type_id, balance.year);

        Ok(upsert_by(
            &mut state.balances,
            balance,
            |b| b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year,
            |existing, new| leave_balance::Model { id: existing.id, created_at: existing.created_at, ..new },
        ))
    }

    async fn find_overlapping_leave(&self, employee_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Option<leave_request::Model>, DbErr> {
        let state = self.state.lock().unwrap();

        Ok(state.leaves.iter()
            .find(|l| {
                l.employee_id == employee_id
                    && matches!(l.status, RequestStatus::Pending | RequestStatus::Approved)
                    && l.from_date <= to
                    && l.to_date >= from
            })
            .cloned())
    }

    async fn find_leave(&self, id: Uuid) -> Result<Option<leave_request::Model>, DbErr> {
        Ok(self.state.lock().unwrap().leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn save_leave(&self, leave: leave_request::Model) -> Result<leave_request::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let id = leave.id;

        Ok(upsert_by(&mut state.leaves, leave, |l| l.id == id, |_, new| new))
    }
}

#[async_trait]
impl PersonalHolidayStore for MemoryStore {
    async fn find_holiday_balance(&self, employee_id: Uuid) -> Result<Option<personal_holiday_balance::Model>, DbErr> {
        Ok(self.state.lock().unwrap().holiday_balances.iter().find(|b| b.employee_id == employee_id).cloned())
    }

    async fn holiday_balances(&self) -> Result<Vec<personal_holiday_balance::Model>, DbErr> {
        Ok(self.state.lock().unwrap().holiday_balances.clone())
    }

    async fn upsert_holiday_balance(&self, balance: personal_holiday_balance::Model) -> Result<personal_holiday_balance::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let employee_id = balance.employee_id;

        Ok(upsert_by(
            &mut state.holiday_balances,
            balance,
            |b| b.employee_id == employee_id,
            |existing, new| personal_holiday_balance::Model { id: existing.id, created_at: existing.created_at, ..new },
        ))
    }

    async fn find_personal_holiday(&self, id: Uuid) -> Result<Option<personal_holiday::Model>, DbErr> {
        Ok(self.state.lock().unwrap().personal_holidays.iter().find(|h| h.id == id).cloned())
    }

    async fn save_personal_holiday(&self, holiday: personal_holiday::Model) -> Result<personal_holiday::Model, DbErr> {
        let mut state = self.state.lock().unwrap();
        let id = holiday.id;

        Ok(upsert_by(&mut state.personal_holidays, holiday, |h| h.id == id, |_, new| new))
    }
}

#[async_trait]
impl ApprovalStore for MemoryStore {
    async fn commit_approval(&self, plan: ApprovalPlan) -> Result<(), DbErr> {
        let fail_on = self.failures.lock().unwrap().attendance_on;
        let mut state = self.state.lock().unwrap();

        // Work on a copy so a failure leaves the committed state untouched
        let mut draft = state.clone();
        apply_approval(&mut draft, &plan, fail_on)?;
        *state = draft;

        Ok(())
    }
}

/// Shared builders for tests across modules
pub(crate) mod fixtures {
    use chrono::Local;

    use crate::entity::sea_orm_active_enums::RoleType;

    use super::*;

    pub fn now() -> DateTimeWithTimeZone {
        Local::now().fixed_offset()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn employee(code: &str) -> employee::Model {
        employee::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            updated_at: now(),
            code: code.to_string(),
            name: format!("Employee {code}"),
            email: format!("{}@example.com", code.to_lowercase()),
            role: RoleType::Employee,
            status: EmployeeStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::date, *};

    #[tokio::test]
    async fn test_is_public_holiday() {
        let store = MemoryStore::default();
        store.seed(|s| s.holidays.extend([date(2025, 8, 15), date(2025, 10, 2)]));

        assert!(store.is_public_holiday(date(2025, 8, 15)).await.unwrap());
        assert!(!store.is_public_holiday(date(2025, 8, 14)).await.unwrap());
        assert_eq!(store.holidays_between(date(2025, 8, 1), date(2025, 8, 31)).await.unwrap(), vec![date(2025, 8, 15)]);
    }
}
