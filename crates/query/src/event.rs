//! Raw event rows
//!
//! Backend-agnostic representation of one row of the event log, before any
//! typing or cleanup. Every field is optional because sources contain nulls.

use serde::{Deserialize, Serialize};

/// Canonical column names after projection
pub const USER_ID: &str = "user_id";
pub const EVENT_TYPE: &str = "event_type";
pub const TIMESTAMP: &str = "timestamp";
pub const EVENT_DATE: &str = "event_date";
pub const DEVICE_CATEGORY: &str = "device_category";
pub const PURCHASE_REVENUE: &str = "purchase_revenue";

/// One untyped row of the event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// User identifier (pseudo id)
    pub user_id: Option<String>,

    /// Source event name (e.g. `view_item`, `PURCHASE`)
    pub event_type: Option<String>,

    /// Event instant in microseconds since the Unix epoch
    pub timestamp_micros: Option<i64>,

    /// Partition key (`YYYYMMDD` or `YYYY-MM-DD`)
    pub event_date: Option<String>,

    /// Device category as recorded by the source
    pub device_category: Option<String>,

    /// Revenue, present on purchase events
    pub purchase_revenue: Option<f64>,
}

impl RawEvent {
    /// Create a row with the required fields set
    pub fn new(
        user_id: impl Into<String>,
        event_type: impl Into<String>,
        timestamp_micros: i64,
        event_date: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            event_type: Some(event_type.into()),
            timestamp_micros: Some(timestamp_micros),
            event_date: Some(event_date.into()),
            device_category: None,
            purchase_revenue: None,
        }
    }

    /// Set the device category
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_category = Some(device.into());
        self
    }

    /// Set the purchase revenue
    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.purchase_revenue = Some(revenue);
        self
    }
}
