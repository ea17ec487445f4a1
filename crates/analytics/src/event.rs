//! Canonical event types
//!
//! The typed form of a raw event row after normalization, plus the two
//! closed enumerations it carries: funnel stage and device category.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Funnel stage of a commerce event, in funnel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Product detail viewed (GA4 `view_item`)
    ProductView,
    /// Item added to cart
    AddToCart,
    /// Checkout started
    BeginCheckout,
    /// Order completed
    Purchase,
}

impl EventType {
    /// All stages in funnel order
    pub const ALL: [EventType; 4] = [
        Self::ProductView,
        Self::AddToCart,
        Self::BeginCheckout,
        Self::Purchase,
    ];

    /// Parse a source event name
    ///
    /// Accepts canonical names (case-insensitive) and GA4 export names.
    /// Returns `None` for anything that is not a funnel event.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "product_view" | "view_item" => Some(Self::ProductView),
            "add_to_cart" => Some(Self::AddToCart),
            "begin_checkout" => Some(Self::BeginCheckout),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductView => "PRODUCT_VIEW",
            Self::AddToCart => "ADD_TO_CART",
            Self::BeginCheckout => "BEGIN_CHECKOUT",
            Self::Purchase => "PURCHASE",
        }
    }

    /// Position in the funnel (view = 0)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The stage before this one, if any
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::ProductView => None,
            Self::AddToCart => Some(Self::ProductView),
            Self::BeginCheckout => Some(Self::AddToCart),
            Self::Purchase => Some(Self::BeginCheckout),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Device category
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Desktop,
    Mobile,
    Tablet,
    #[default]
    Unknown,
}

impl DeviceCategory {
    /// All categories
    pub const ALL: [DeviceCategory; 4] = [Self::Desktop, Self::Mobile, Self::Tablet, Self::Unknown];

    /// Parse a category name strictly (for user input)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Some(Self::Desktop),
            "mobile" => Some(Self::Mobile),
            "tablet" => Some(Self::Tablet),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Map a source value, coercing null and unrecognized values to `Unknown`
    pub fn from_source(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Self::Unknown)
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A canonical commerce event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub user_id: String,
    pub event_type: EventType,
    /// Event instant (microsecond precision)
    pub timestamp: DateTime<Utc>,
    /// Partition date; may differ from the date part of `timestamp`
    pub event_date: NaiveDate,
    pub device_category: DeviceCategory,
    pub purchase_revenue: Option<f64>,
}

/// Total order over every field of an event
///
/// Leads with (user, timestamp) so sorted output groups users and runs in
/// time order. Revenue compares by bit pattern.
pub(crate) type EventKey<'a> = (
    &'a str,
    DateTime<Utc>,
    EventType,
    NaiveDate,
    DeviceCategory,
    Option<u64>,
);

impl Event {
    pub(crate) fn key(&self) -> EventKey<'_> {
        (
            self.user_id.as_str(),
            self.timestamp,
            self.event_type,
            self.event_date,
            self.device_category,
            self.purchase_revenue.map(f64::to_bits),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse("PRODUCT_VIEW"), Some(EventType::ProductView));
        assert_eq!(EventType::parse("view_item"), Some(EventType::ProductView));
        assert_eq!(EventType::parse("add_to_cart"), Some(EventType::AddToCart));
        assert_eq!(EventType::parse("Begin_Checkout"), Some(EventType::BeginCheckout));
        assert_eq!(EventType::parse(" purchase "), Some(EventType::Purchase));
    }

    #[test]
    fn test_event_type_parse_non_funnel_events() {
        assert_eq!(EventType::parse("page_view"), None);
        assert_eq!(EventType::parse("session_start"), None);
        assert_eq!(EventType::parse(""), None);
    }

    #[test]
    fn test_event_type_order() {
        let mut stages = vec![
            EventType::Purchase,
            EventType::ProductView,
            EventType::BeginCheckout,
            EventType::AddToCart,
        ];
        stages.sort();
        assert_eq!(stages, EventType::ALL.to_vec());
        assert_eq!(EventType::Purchase.index(), 3);
        assert_eq!(EventType::Purchase.previous(), Some(EventType::BeginCheckout));
        assert_eq!(EventType::ProductView.previous(), None);
    }

    #[test]
    fn test_device_category_from_source() {
        assert_eq!(DeviceCategory::from_source(Some("mobile")), DeviceCategory::Mobile);
        assert_eq!(DeviceCategory::from_source(Some("DESKTOP")), DeviceCategory::Desktop);
        assert_eq!(DeviceCategory::from_source(None), DeviceCategory::Unknown);
        assert_eq!(DeviceCategory::from_source(Some("smart tv")), DeviceCategory::Unknown);
    }

    #[test]
    fn test_device_category_parse_strict() {
        assert_eq!(DeviceCategory::parse("tablet"), Some(DeviceCategory::Tablet));
        assert_eq!(DeviceCategory::parse("unknown"), Some(DeviceCategory::Unknown));
        assert_eq!(DeviceCategory::parse("watch"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&EventType::BeginCheckout).unwrap(),
            "\"BEGIN_CHECKOUT\""
        );
        assert_eq!(
            serde_json::to_string(&DeviceCategory::Mobile).unwrap(),
            "\"mobile\""
        );
    }
}
