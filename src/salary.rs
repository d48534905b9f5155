use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    entity::{
        payroll::ComponentSnapshot,
        salary_component, salary_structure,
        salary_template::{self, ComponentDraft, ComponentDrafts},
        sea_orm_active_enums::{CalcType, ComponentType},
    },
    store::SalaryStore,
    Error, Result,
};

/// A salary structure with its components in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub structure: salary_structure::Model,
    pub components: Vec<salary_component::Model>,
}

impl Structure {
    pub fn basic_salary(&self) -> Decimal {
        self.structure.basic_salary
    }
}

/// Basic salary plus components as submitted for saving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDraft {
    pub basic_salary: Decimal,
    #[serde(default)]
    pub components: Vec<ComponentDraft>,
}

/// Rounds to cents, halves away from zero
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn component_amount(calc_type: CalcType, value: Decimal, basic_salary: Decimal) -> Decimal {
    match calc_type {
        CalcType::Percentage => round_currency(basic_salary * value / dec!(100)),
        CalcType::Fixed => value,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub components: Vec<ComponentSnapshot>,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
}

/// Resolves the active components against `basic_salary`
pub fn evaluate(basic_salary: Decimal, components: &[salary_component::Model]) -> ComponentBreakdown {
    let mut breakdown = ComponentBreakdown::default();

    for component in components.iter().filter(|c| c.is_active) {
        let amount = component_amount(component.calc_type, component.value, basic_salary);

        match component.kind {
            ComponentType::Earning => breakdown.total_earnings += amount,
            ComponentType::Deduction => breakdown.total_deductions += amount,
        }

        breakdown.components.push(ComponentSnapshot {
            id: component.id,
            name: component.name.clone(),
            kind: component.kind,
            calc_type: component.calc_type,
            value: component.value,
            amount,
        });
    }

    breakdown
}

pub fn validate_structure(basic_salary: Decimal, components: &[ComponentDraft]) -> Result<()> {
    if basic_salary < Decimal::ZERO {
        return Err(Error::Validation(format!("basic salary cannot be negative, got {basic_salary}")))
    }

    for component in components {
        if component.name.trim().is_empty() {
            return Err(Error::Validation("component name cannot be empty".to_string()))
        }

        if component.value < Decimal::ZERO {
            return Err(Error::Validation(format!("component `{}` has a negative value {}", component.name, component.value)))
        }
    }

    Ok(())
}

/// Replaces the employee's structure. Inactive drafts are dropped.
#[tracing::instrument(skip(store, draft))]
pub async fn save_structure<S: SalaryStore>(
    store: &S,
    employee_id: Uuid,
    draft: StructureDraft,
    now: DateTimeWithTimeZone,
) -> Result<Structure> {
    validate_structure(draft.basic_salary, &draft.components)?;

    let components = draft.components.into_iter()
        .filter(|component| component.is_active)
        .collect::<Vec<_>>();

    let structure = store.replace_structure(employee_id, draft.basic_salary, components, now).await?;

    info!(components = structure.components.len(), "salary structure saved");

    Ok(structure)
}

#[tracing::instrument(skip(store, description, draft))]
pub async fn save_template<S: SalaryStore>(
    store: &S,
    name: &str,
    description: Option<String>,
    draft: StructureDraft,
    now: DateTimeWithTimeZone,
) -> Result<salary_template::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation("template name cannot be empty".to_string()))
    }

    validate_structure(draft.basic_salary, &draft.components)?;

    let template = store.save_template(salary_template::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        name: name.trim().to_string(),
        description,
        basic_salary: draft.basic_salary,
        components: ComponentDrafts(draft.components),
    }).await?;

    Ok(template)
}

/// Copies a template onto every employee, replacing their structures. Returns how many were updated.
#[tracing::instrument(skip(store, employee_ids))]
pub async fn apply_template<S: SalaryStore>(
    store: &S,
    template_id: Uuid,
    employee_ids: &[Uuid],
    now: DateTimeWithTimeZone,
) -> Result<usize> {
    let template = store.find_template(template_id).await?
        .ok_or(Error::NotFound("salary template"))?;

    for employee_id in employee_ids {
        let draft = StructureDraft {
            basic_salary: template.basic_salary,
            components: template.components.0.clone(),
        };

        save_structure(store, *employee_id, draft, now).await?;
    }

    info!(template = %template.name, employees = employee_ids.len(), "salary template applied");

    Ok(employee_ids.len())
}
