//! Monthly payroll generation and the GENERATED -> PAID lifecycle.
//!
//! Amounts are computed from the salary structure and the month's attendance, then frozen into a
//! [`payroll::Model`] snapshot keyed by (employee, month).

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    calendar::{working_days_in_month, AttendanceSummary, Month},
    config::Settings,
    entity::{
        employee,
        payroll::{self, ComponentSnapshot, ComponentSnapshots},
        salary_component,
        sea_orm_active_enums::PayrollStatus,
    },
    consts::HALF_DAY,
    salary::{evaluate, round_currency},
    store::{AttendanceStore, EmployeeStore, PayrollStore, SalaryStore},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollComputation {
    pub working_days: u32,
    pub present_days: u32,
    pub lop_days: Decimal,
    pub half_day_count: u32,
    pub basic_salary: Decimal,
    pub gross_salary: Decimal,
    pub total_deductions: Decimal,
    pub lop_amount: Decimal,
    pub half_day_amount: Decimal,
    pub net_salary: Decimal,
    pub components: Vec<ComponentSnapshot>,
}

impl PayrollComputation {
    pub fn into_model(self, employee_id: Uuid, month: Month, now: DateTimeWithTimeZone) -> payroll::Model {
        payroll::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            employee_id,
            month: month.first_day(),
            working_days: self.working_days as i32,
            present_days: self.present_days as i32,
            lop_days: self.lop_days,
            half_day_count: self.half_day_count as i32,
            basic_salary: self.basic_salary,
            gross_salary: self.gross_salary,
            total_deductions: self.total_deductions,
            lop_amount: self.lop_amount,
            half_day_amount: self.half_day_amount,
            net_salary: self.net_salary,
            components: ComponentSnapshots(self.components),
            status: PayrollStatus::Generated,
            override_amount: None,
            override_reason: None,
            paid_at: None,
            paid_by: None,
        }
    }
}

/// `gross / working_days * days`, rounded to cents
fn pro_rata(gross: Decimal, working_days: u32, days: Decimal) -> Decimal {
    if working_days == 0 || days.is_zero() {
        return Decimal::ZERO
    }

    round_currency(gross / Decimal::from(working_days) * days)
}

/// Pay for one employee-month.
///
/// Half days are part of `total_lop` and are also charged again as `half_day_amount`.
pub fn compute(
    basic_salary: Decimal,
    components: &[salary_component::Model],
    working_days: u32,
    attendance: &AttendanceSummary,
) -> PayrollComputation {
    let breakdown = evaluate(basic_salary, components);

    let gross_salary = basic_salary + breakdown.total_earnings;
    let lop_days = attendance.total_lop();
    let lop_amount = pro_rata(gross_salary, working_days, lop_days);
    let half_day_amount = pro_rata(gross_salary, working_days, Decimal::from(attendance.half_day_count) * HALF_DAY);

    let total_deductions = breakdown.total_deductions + lop_amount + half_day_amount;
    let net_salary = (gross_salary - total_deductions).max(Decimal::ZERO);

    PayrollComputation {
        working_days,
        present_days: attendance.present_days,
        lop_days,
        half_day_count: attendance.half_day_count,
        basic_salary,
        gross_salary,
        total_deductions,
        lop_amount,
        half_day_amount,
        net_salary,
        components: breakdown.components,
    }
}

/// An employee left out of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEmployee {
    pub employee_id: Uuid,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generated: Vec<payroll::Model>,
    pub errors: Vec<SkippedEmployee>,
}

async fn generate_for<S>(
    store: &S,
    employee: &employee::Model,
    month: Month,
    working_days: u32,
    now: DateTimeWithTimeZone,
) -> Result<Option<payroll::Model>>
where
    S: AttendanceStore + SalaryStore + PayrollStore,
{
    let Some(structure) = store.get_structure(employee.id).await? else {
        return Ok(None)
    };

    let basic_salary = structure.basic_salary();
    if basic_salary.is_zero() {
        return Ok(None)
    }

    if basic_salary < Decimal::ZERO || structure.components.iter().any(|c| c.is_active && c.value < Decimal::ZERO) {
        return Err(Error::Validation("salary structure has negative amounts".to_string()))
    }

    let records = store.find_attendance(employee.id, month.first_day(), month.last_day()).await?;
    let summary = AttendanceSummary::from_records(&records);

    let computation = compute(basic_salary, &structure.components, working_days, &summary);
    let payroll = store.upsert_payroll(computation.into_model(employee.id, month, now)).await?;

    Ok(Some(payroll))
}

/// Generates the month's payroll of every active employee.
///
/// One employee failing does not stop the run, the failure is reported in
/// [`GenerationReport::errors`]. Employees without a structure or with a zero basic salary
/// are left out silently. Regenerating a PAID month overwrites it back to GENERATED.
#[tracing::instrument(skip(store, settings, month, now), fields(%month))]
pub async fn generate<S>(store: &S, month: Month, settings: &Settings, now: DateTimeWithTimeZone) -> Result<GenerationReport>
where
    S: EmployeeStore + AttendanceStore + SalaryStore + PayrollStore,
{
    let working_days = working_days_in_month(month, settings.working_days_per_month);
    let employees = store.active_employees().await?;

    let mut report = GenerationReport::default();

    for employee in employees {
        match generate_for(store, &employee, month, working_days, now).await {
            Ok(Some(payroll)) => report.generated.push(payroll),
            Ok(None) => debug!(employee = %employee.code, "no salary to pay, skipped"),
            Err(err) => {
                warn!(employee = %employee.code, error = %err, "payroll generation failed");

                report.errors.push(SkippedEmployee {
                    employee_id: employee.id,
                    name: employee.name,
                    reason: err.to_string(),
                });
            },
        }
    }

    info!(working_days, generated = report.generated.len(), failed = report.errors.len(), "payroll generated");

    Ok(report)
}

/// Replaces the net salary by hand. The status is left alone.
#[tracing::instrument(skip(store, reason, now))]
pub async fn override_net<S: PayrollStore>(
    store: &S,
    payroll_id: Uuid,
    amount: Decimal,
    reason: Option<String>,
    now: DateTimeWithTimeZone,
) -> Result<payroll::Model> {
    if amount < Decimal::ZERO {
        return Err(Error::Validation(format!("override amount cannot be negative, got {amount}")))
    }

    let payroll = store.find_payroll(payroll_id).await?
        .ok_or(Error::NotFound("payroll"))?;

    let payroll = store.update_payroll(payroll::Model {
        updated_at: now,
        net_salary: amount,
        override_amount: Some(amount),
        override_reason: reason,
        ..payroll
    }).await?;

    Ok(payroll)
}

#[tracing::instrument(skip(store, now))]
pub async fn mark_paid<S: PayrollStore>(store: &S, payroll_id: Uuid, paid_by: Uuid, now: DateTimeWithTimeZone) -> Result<payroll::Model> {
    let payroll = store.find_payroll(payroll_id).await?
        .ok_or(Error::NotFound("payroll"))?;

    if payroll.status == PayrollStatus::Paid {
        return Err(Error::Conflict("payroll is already paid".to_string()))
    }

    let payroll = store.update_payroll(payroll::Model {
        updated_at: now,
        status: PayrollStatus::Paid,
        paid_at: Some(now),
        paid_by: Some(paid_by),
        ..payroll
    }).await?;

    Ok(payroll)
}

/// Marks every listed payroll as paid, returns how many rows changed
#[tracing::instrument(skip(store, payroll_ids, now), fields(requested = payroll_ids.len()))]
pub async fn bulk_mark_paid<S: PayrollStore>(store: &S, payroll_ids: &[Uuid], paid_by: Uuid, now: DateTimeWithTimeZone) -> Result<u64> {
    if payroll_ids.is_empty() {
        return Ok(0)
    }

    let updated = store.mark_paid_many(payroll_ids, paid_by, now).await?;

    info!(updated, "payrolls marked paid");

    Ok(updated)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollSummary {
    pub employees: usize,
    pub paid: usize,
    pub total_gross: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
}

pub fn summarize(payrolls: &[payroll::Model]) -> PayrollSummary {
    payrolls.iter().fold(PayrollSummary::default(), |mut summary, payroll| {
        summary.employees += 1;
        summary.total_gross += payroll.gross_salary;
        summary.total_deductions += payroll.total_deductions;
        summary.total_net += payroll.net_salary;

        if payroll.status == PayrollStatus::Paid {
            summary.paid += 1;
        }

        summary
    })
}

pub async fn month_summary<S: PayrollStore>(store: &S, month: Month) -> Result<PayrollSummary> {
    Ok(summarize(&store.find_payrolls(month.first_day()).await?))
}

/// The employee's paid payslips, latest month first
pub async fn paid_slips<S: PayrollStore>(store: &S, employee_id: Uuid, limit: u64) -> Result<Vec<payroll::Model>> {
    Ok(store.find_employee_payrolls(employee_id, PayrollStatus::Paid, limit).await?)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        entity::{
            attendance,
            salary_template::ComponentDraft,
            sea_orm_active_enums::{AttendanceStatus, CalcType, ComponentType, EmployeeStatus},
        },
        store::memory::{fixtures::*, MemoryStore},
    };

    use super::*;

    fn component(name: &str, kind: ComponentType, calc_type: CalcType, value: Decimal) -> salary_component::Model {
        salary_component::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            updated_at: now(),
            structure_id: Uuid::nil(),
            name: name.to_string(),
            kind,
            calc_type,
            value,
            is_active: true,
            order: 0,
        }
    }

    fn standard_components() -> Vec<salary_component::Model> {
        vec![
            component("HRA", ComponentType::Earning, CalcType::Percentage, dec!(40)),
            component("PF", ComponentType::Deduction, CalcType::Percentage, dec!(12)),
            component("Professional Tax", ComponentType::Deduction, CalcType::Fixed, dec!(200)),
        ]
    }

    fn standard_drafts() -> Vec<ComponentDraft> {
        standard_components().into_iter()
            .map(|c| ComponentDraft { name: c.name, kind: c.kind, calc_type: c.calc_type, value: c.value, is_active: true })
            .collect()
    }

    fn settings() -> Settings {
        Settings { working_days_per_month: Some(26), geo_fence_enabled: false }
    }

    fn absent(employee_id: Uuid, day: u32) -> attendance::Model {
        attendance::Model::blank(employee_id, date(2025, 1, day), AttendanceStatus::Absent, now())
    }

    #[test]
    fn test_compute_with_absences() {
        let summary = AttendanceSummary::from_statuses([AttendanceStatus::Absent, AttendanceStatus::Absent]);

        let payroll = compute(dec!(50000), &standard_components(), 26, &summary);

        assert_eq!(payroll.gross_salary, dec!(70000));
        assert_eq!(payroll.lop_days, dec!(2));
        assert_eq!(payroll.lop_amount, dec!(5384.62));
        assert_eq!(payroll.half_day_amount, dec!(0));
        assert_eq!(payroll.total_deductions, dec!(11584.62));
        assert_eq!(payroll.net_salary, dec!(58415.38));
        assert_eq!(payroll.components.len(), 3);
    }

    #[test]
    fn test_compute_charges_half_days_twice() {
        let summary = AttendanceSummary::from_statuses([AttendanceStatus::HalfDay, AttendanceStatus::HalfDay]);

        let payroll = compute(dec!(26000), &[], 26, &summary);

        assert_eq!(payroll.lop_days, dec!(1));
        assert_eq!(payroll.lop_amount, dec!(1000));
        assert_eq!(payroll.half_day_amount, dec!(1000));
        assert_eq!(payroll.total_deductions, dec!(2000));
        assert_eq!(payroll.net_salary, dec!(24000));
    }

    #[test]
    fn test_compute_without_working_days() {
        let summary = AttendanceSummary::from_statuses([AttendanceStatus::Absent, AttendanceStatus::HalfDay]);

        let payroll = compute(dec!(30000), &[], 0, &summary);

        assert_eq!(payroll.lop_amount, dec!(0));
        assert_eq!(payroll.half_day_amount, dec!(0));
        assert_eq!(payroll.net_salary, dec!(30000));
    }

    #[test]
    fn test_compute_net_never_negative() {
        let summary = AttendanceSummary::from_statuses(vec![AttendanceStatus::Absent; 26]);
        let components = [component("Loan", ComponentType::Deduction, CalcType::Fixed, dec!(10000))];

        let payroll = compute(dec!(20000), &components, 26, &summary);

        assert_eq!(payroll.lop_amount, dec!(20000));
        assert_eq!(payroll.total_deductions, dec!(30000));
        assert_eq!(payroll.net_salary, dec!(0));
    }

    #[tokio::test]
    async fn test_generate() {
        let store = MemoryStore::default();
        let month = Month::new(2025, 1).unwrap();

        let paid = employee("EMP001");
        let unstructured = employee("EMP002");
        let zero_basic = employee("EMP003");
        let mut inactive = employee("EMP004");
        inactive.status = EmployeeStatus::Inactive;

        store.seed(|state| {
            state.employees = vec![paid.clone(), unstructured.clone(), zero_basic.clone(), inactive.clone()];
            // The last one falls outside the month
            state.attendance = vec![absent(paid.id, 6), absent(paid.id, 7)];
            state.attendance.push(attendance::Model::blank(paid.id, date(2025, 2, 3), AttendanceStatus::Absent, now()));
        });
        store.replace_structure(paid.id, dec!(50000), standard_drafts(), now()).await.unwrap();
        store.replace_structure(zero_basic.id, dec!(0), Vec::new(), now()).await.unwrap();
        store.replace_structure(inactive.id, dec!(50000), Vec::new(), now()).await.unwrap();

        let report = generate(&store, month, &settings(), now()).await.unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.generated.len(), 1);

        let payroll = &report.generated[0];
        assert_eq!(payroll.employee_id, paid.id);
        assert_eq!(payroll.month, date(2025, 1, 1));
        assert_eq!(payroll.working_days, 26);
        assert_eq!(payroll.lop_days, dec!(2));
        assert_eq!(payroll.net_salary, dec!(58415.38));
        assert_eq!(payroll.status, PayrollStatus::Generated);
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let store = MemoryStore::default();
        let month = Month::new(2025, 1).unwrap();
        let emp = employee("EMP001");

        store.seed(|state| {
            state.employees = vec![emp.clone()];
            state.attendance = vec![absent(emp.id, 6)];
        });
        store.replace_structure(emp.id, dec!(50000), standard_drafts(), now()).await.unwrap();

        let first = generate(&store, month, &settings(), now()).await.unwrap().generated.remove(0);
        let paid = mark_paid(&store, first.id, Uuid::new_v4(), now()).await.unwrap();
        assert_eq!(paid.status, PayrollStatus::Paid);

        let second = generate(&store, month, &settings(), now()).await.unwrap().generated.remove(0);

        assert_eq!(second.id, first.id);
        assert_eq!(second.net_salary, first.net_salary);
        assert_eq!(second.components, first.components);
        // Regeneration puts a paid month back to GENERATED
        assert_eq!(second.status, PayrollStatus::Generated);
        assert_eq!(store.snapshot().payrolls.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_isolates_failures() {
        let store = MemoryStore::default();
        let month = Month::new(2025, 1).unwrap();
        let (broken, healthy) = (employee("EMP001"), employee("EMP002"));

        store.seed(|state| state.employees = vec![broken.clone(), healthy.clone()]);
        store.replace_structure(broken.id, dec!(50000), Vec::new(), now()).await.unwrap();
        store.replace_structure(healthy.id, dec!(40000), Vec::new(), now()).await.unwrap();
        store.fail_structure_of(broken.id);

        let report = generate(&store, month, &settings(), now()).await.unwrap();

        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].employee_id, healthy.id);
        assert_eq!(report.generated[0].net_salary, dec!(40000));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].employee_id, broken.id);
        assert_eq!(report.errors[0].name, broken.name);
    }

    #[tokio::test]
    async fn test_generate_ignores_inactive_negative_component() {
        let store = MemoryStore::default();
        let month = Month::new(2025, 1).unwrap();
        let (retired, broken) = (employee("EMP001"), employee("EMP002"));

        let negative = |is_active| ComponentDraft {
            name: "Adjustment".to_string(),
            kind: ComponentType::Earning,
            calc_type: CalcType::Fixed,
            value: dec!(-500),
            is_active,
        };

        store.seed(|state| state.employees = vec![retired.clone(), broken.clone()]);
        store.replace_structure(retired.id, dec!(30000), vec![negative(false)], now()).await.unwrap();
        store.replace_structure(broken.id, dec!(30000), vec![negative(true)], now()).await.unwrap();

        let report = generate(&store, month, &settings(), now()).await.unwrap();

        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].employee_id, retired.id);
        assert_eq!(report.generated[0].net_salary, dec!(30000));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].employee_id, broken.id);
    }

    #[tokio::test]
    async fn test_override_and_payment() {
        let store = MemoryStore::default();
        let month = Month::new(2025, 1).unwrap();
        let (first, second) = (employee("EMP001"), employee("EMP002"));
        let admin = Uuid::new_v4();

        store.seed(|state| state.employees = vec![first.clone(), second.clone()]);
        store.replace_structure(first.id, dec!(30000), Vec::new(), now()).await.unwrap();
        store.replace_structure(second.id, dec!(20000), Vec::new(), now()).await.unwrap();

        let report = generate(&store, month, &settings(), now()).await.unwrap();
        let ids = report.generated.iter().map(|p| p.id).collect::<Vec<_>>();

        let err = override_net(&store, ids[0], dec!(-1), None, now()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let overridden = override_net(&store, ids[0], dec!(31000), Some("bonus".to_string()), now()).await.unwrap();
        assert_eq!(overridden.net_salary, dec!(31000));
        assert_eq!(overridden.override_amount, Some(dec!(31000)));
        assert_eq!(overridden.status, PayrollStatus::Generated);

        assert!(matches!(
            mark_paid(&store, Uuid::new_v4(), admin, now()).await.unwrap_err(),
            Error::NotFound("payroll")
        ));

        assert_eq!(bulk_mark_paid(&store, &ids, admin, now()).await.unwrap(), 2);
        assert!(matches!(mark_paid(&store, ids[1], admin, now()).await.unwrap_err(), Error::Conflict(_)));

        let summary = month_summary(&store, month).await.unwrap();
        assert_eq!(summary, PayrollSummary {
            employees: 2,
            paid: 2,
            total_gross: dec!(50000),
            total_deductions: dec!(0),
            total_net: dec!(51000),
        });

        let slips = paid_slips(&store, first.id, 12).await.unwrap();
        assert_eq!(slips.len(), 1);
        assert_eq!(slips[0].paid_by, Some(admin));
        assert_eq!(slips[0].override_reason.as_deref(), Some("bonus"));
    }
}
