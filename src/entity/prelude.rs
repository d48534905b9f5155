pub use super::attendance::Entity as Attendance;
pub use super::company_settings::Entity as CompanySettings;
pub use super::employee::Entity as Employee;
pub use super::geo_location::Entity as GeoLocation;
pub use super::holiday::Entity as Holiday;
pub use super::leave_balance::Entity as LeaveBalance;
pub use super::leave_request::Entity as LeaveRequest;
pub use super::leave_type::Entity as LeaveType;
pub use super::payroll::Entity as Payroll;
pub use super::personal_holiday::Entity as PersonalHoliday;
pub use super::personal_holiday_balance::Entity as PersonalHolidayBalance;
pub use super::salary_component::Entity as SalaryComponent;
pub use super::salary_structure::Entity as SalaryStructure;
pub use super::salary_template::Entity as SalaryTemplate;
pub use super::wfh_request::Entity as WfhRequest;
