//! Payroll, attendance and leave core of an employee-management back end.
//!
//! Every operation works against the repository traits in [`store`], which are
//! implemented for a sea-orm `DatabaseConnection`.

pub mod config;
pub mod consts;
pub mod error;
pub mod telemetry;

pub mod entity;
pub mod store;

pub mod calendar;
pub mod geofence;
pub mod salary;

pub mod attendance;
pub mod leave;
pub mod payroll;
pub mod personal_holiday;

pub use error::{Error, Result};
