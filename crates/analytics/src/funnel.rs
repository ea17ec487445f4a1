//! Funnel builder
//!
//! Derives per-user progression through the four commerce stages. Each
//! stage is validated against the previous *validated* stage (strictly
//! later) and against a single window anchored at the first view.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::event::{DeviceCategory, Event, EventType};
use crate::ratio;

/// One user's funnel progression
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunnelRecord {
    pub user_id: String,
    /// Device of the user's first qualifying event
    pub device_category: DeviceCategory,
    /// First product view
    pub view_at: DateTime<Utc>,
    pub add_at: Option<DateTime<Utc>>,
    pub checkout_at: Option<DateTime<Utc>>,
    pub purchase_at: Option<DateTime<Utc>>,
    /// Revenue of the validated purchase, when it carried one
    pub purchase_revenue: Option<f64>,
}

impl UserFunnelRecord {
    pub fn reached_view(&self) -> bool {
        true
    }

    pub fn reached_add(&self) -> bool {
        self.add_at.is_some()
    }

    pub fn reached_checkout(&self) -> bool {
        self.checkout_at.is_some()
    }

    pub fn reached_purchase(&self) -> bool {
        self.purchase_at.is_some()
    }

    /// Validated timestamp of a stage
    pub fn stage_at(&self, stage: EventType) -> Option<DateTime<Utc>> {
        match stage {
            EventType::ProductView => Some(self.view_at),
            EventType::AddToCart => self.add_at,
            EventType::BeginCheckout => self.checkout_at,
            EventType::Purchase => self.purchase_at,
        }
    }

    /// Whether the record reached `stage`
    pub fn reached(&self, stage: EventType) -> bool {
        self.stage_at(stage).is_some()
    }
}

// Flat row shape for the reporting layer, including the derived flags.
impl Serialize for UserFunnelRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("UserFunnelRecord", 11)?;
        row.serialize_field("user_id", &self.user_id)?;
        row.serialize_field("device_category", &self.device_category)?;
        row.serialize_field("view_at", &self.view_at)?;
        row.serialize_field("add_at", &self.add_at)?;
        row.serialize_field("checkout_at", &self.checkout_at)?;
        row.serialize_field("purchase_at", &self.purchase_at)?;
        row.serialize_field("reached_view", &self.reached_view())?;
        row.serialize_field("reached_add", &self.reached_add())?;
        row.serialize_field("reached_checkout", &self.reached_checkout())?;
        row.serialize_field("reached_purchase", &self.reached_purchase())?;
        row.serialize_field("purchase_revenue", &self.purchase_revenue)?;
        row.end()
    }
}

/// First occurrence of a stage for one user
#[derive(Debug, Clone, Copy)]
pub(crate) struct StageHit {
    pub at: DateTime<Utc>,
    pub event_date: NaiveDate,
    pub revenue: Option<f64>,
}

/// Per-user first hits, computed in one pass over the events
#[derive(Debug, Clone)]
pub(crate) struct UserHits {
    stages: [Option<StageHit>; 4],
    first_event: (DateTime<Utc>, EventType),
    pub device_category: DeviceCategory,
}

impl UserHits {
    fn new(event: &Event) -> Self {
        let mut hits = Self {
            stages: [None; 4],
            first_event: (event.timestamp, event.event_type),
            device_category: event.device_category,
        };
        hits.record(event);
        hits
    }

    fn record(&mut self, event: &Event) {
        let slot = &mut self.stages[event.event_type.index()];
        if slot.is_none_or(|hit| event.timestamp < hit.at) {
            *slot = Some(StageHit {
                at: event.timestamp,
                event_date: event.event_date,
                revenue: event.purchase_revenue,
            });
        }

        // Earliest event wins the device; ties go to the earlier stage
        if (event.timestamp, event.event_type) < self.first_event {
            self.first_event = (event.timestamp, event.event_type);
            self.device_category = event.device_category;
        }
    }

    pub fn stage(&self, stage: EventType) -> Option<StageHit> {
        self.stages[stage.index()]
    }
}

/// Collect first hits per user, keyed (and therefore ordered) by user id
pub(crate) fn user_hits(events: &[Event]) -> BTreeMap<&str, UserHits> {
    let mut users: BTreeMap<&str, UserHits> = BTreeMap::new();
    for event in events {
        match users.get_mut(event.user_id.as_str()) {
            Some(hits) => hits.record(event),
            None => {
                users.insert(event.user_id.as_str(), UserHits::new(event));
            }
        }
    }
    users
}

/// Build one funnel record per user with at least one product view
///
/// Output is sorted by user id.
pub fn build_funnel(events: &[Event], window: Duration) -> Vec<UserFunnelRecord> {
    let records: Vec<UserFunnelRecord> = user_hits(events)
        .into_iter()
        .filter_map(|(user_id, hits)| gate(user_id, &hits, window))
        .collect();

    tracing::debug!(
        events = events.len(),
        users = records.len(),
        window_days = window.num_days(),
        "built funnel"
    );

    records
}

fn gate(user_id: &str, hits: &UserHits, window: Duration) -> Option<UserFunnelRecord> {
    let view = hits.stage(EventType::ProductView)?;
    let deadline = view
        .at
        .checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    // A stage counts only after the previous validated stage and inside the window
    let next = |previous: Option<DateTime<Utc>>, stage: EventType| -> Option<StageHit> {
        let previous = previous?;
        hits.stage(stage)
            .filter(|hit| hit.at > previous && hit.at <= deadline)
    };

    let add = next(Some(view.at), EventType::AddToCart);
    let checkout = next(add.map(|h| h.at), EventType::BeginCheckout);
    let purchase = next(checkout.map(|h| h.at), EventType::Purchase);

    Some(UserFunnelRecord {
        user_id: user_id.to_string(),
        device_category: hits.device_category,
        view_at: view.at,
        add_at: add.map(|h| h.at),
        checkout_at: checkout.map(|h| h.at),
        purchase_at: purchase.map(|h| h.at),
        purchase_revenue: purchase.and_then(|h| h.revenue),
    })
}

/// Users reaching one stage within a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStageSummary {
    pub stage: EventType,
    pub users: u64,
    /// Share of the previous stage's users (1.0 for the view stage)
    pub step_conversion: f64,
    /// Share of viewers
    pub overall_conversion: f64,
}

/// Stage counts for one device group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelGroupSummary {
    /// `None` for the all-devices group
    pub device_category: Option<DeviceCategory>,
    pub stages: Vec<FunnelStageSummary>,
    /// Sum of validated purchase revenue
    pub purchase_revenue: f64,
}

impl FunnelGroupSummary {
    fn from_records<'a>(
        device_category: Option<DeviceCategory>,
        records: impl Iterator<Item = &'a UserFunnelRecord>,
    ) -> Self {
        let mut counts = [0u64; 4];
        let mut purchase_revenue = 0.0;
        for record in records {
            for stage in EventType::ALL {
                if record.reached(stage) {
                    counts[stage.index()] += 1;
                }
            }
            purchase_revenue += record.purchase_revenue.unwrap_or(0.0);
        }

        let viewers = counts[0];
        let stages = EventType::ALL
            .into_iter()
            .map(|stage| {
                let users = counts[stage.index()];
                let previous = stage.previous().map_or(users, |p| counts[p.index()]);
                FunnelStageSummary {
                    stage,
                    users,
                    step_conversion: ratio(users, previous),
                    overall_conversion: ratio(users, viewers),
                }
            })
            .collect();

        Self {
            device_category,
            stages,
            purchase_revenue,
        }
    }

    /// Group label for display
    pub fn label(&self) -> &'static str {
        self.device_category.map_or("all", |d| d.as_str())
    }

    /// Users reaching `stage`
    pub fn users(&self, stage: EventType) -> u64 {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map_or(0, |s| s.users)
    }
}

/// Stage counts for all users and per device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelSummary {
    /// The all-devices group first, then one group per device present
    pub groups: Vec<FunnelGroupSummary>,
}

impl FunnelSummary {
    /// The all-devices group
    pub fn overall(&self) -> Option<&FunnelGroupSummary> {
        self.groups.iter().find(|g| g.device_category.is_none())
    }

    /// The group for one device
    pub fn device(&self, device: DeviceCategory) -> Option<&FunnelGroupSummary> {
        self.groups
            .iter()
            .find(|g| g.device_category == Some(device))
    }
}

/// Summarize funnel records into stage counts and conversion rates
pub fn summarize_funnel(records: &[UserFunnelRecord]) -> FunnelSummary {
    let mut groups = vec![FunnelGroupSummary::from_records(None, records.iter())];

    let mut by_device: BTreeMap<DeviceCategory, Vec<&UserFunnelRecord>> = BTreeMap::new();
    for record in records {
        by_device.entry(record.device_category).or_default().push(record);
    }
    for (device, members) in by_device {
        groups.push(FunnelGroupSummary::from_records(
            Some(device),
            members.into_iter(),
        ));
    }

    FunnelSummary { groups }
}

#[cfg(test)]
#[path = "funnel_test.rs"]
mod funnel_test;
