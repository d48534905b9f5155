use chrono::Weekday;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Mean Earth radius used by the haversine distance
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const DEFAULT_GEOFENCE_RADIUS_METERS: i32 = 500;

/// The fixed non-working day of the week
pub const WEEKLY_OFF: Weekday = Weekday::Sun;

/// Check-outs under this many hours turn the day into a half day
pub const HALF_DAY_HOURS: Decimal = dec!(4);

pub const HALF_DAY: Decimal = dec!(0.5);

pub const DEFAULT_PERSONAL_HOLIDAY_QUOTA: Decimal = dec!(3);
