//! Event fixtures shared by the unit tests

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::event::{DeviceCategory, Event, EventType};

/// 2021-01-04T00:00:00Z, a Monday
pub fn base() -> DateTime<Utc> {
    DateTime::from_timestamp(1_609_718_400, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Event `secs` after [`base`], partitioned on the timestamp's date
pub fn at(user: &str, event_type: EventType, secs: i64) -> Event {
    let timestamp = base() + Duration::seconds(secs);
    Event {
        user_id: user.to_string(),
        event_type,
        timestamp,
        event_date: timestamp.date_naive(),
        device_category: DeviceCategory::Desktop,
        purchase_revenue: None,
    }
}

/// Event at noon on `event_date`
pub fn on(user: &str, event_type: EventType, event_date: NaiveDate) -> Event {
    let timestamp = event_date
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();
    Event {
        user_id: user.to_string(),
        event_type,
        timestamp,
        event_date,
        device_category: DeviceCategory::Desktop,
        purchase_revenue: None,
    }
}

pub const DAY: i64 = 86_400;

pub fn with_device(mut event: Event, device: DeviceCategory) -> Event {
    event.device_category = device;
    event
}

pub fn with_revenue(mut event: Event, revenue: f64) -> Event {
    event.purchase_revenue = Some(revenue);
    event
}
