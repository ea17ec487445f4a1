use super::*;
use crate::testutil::{DAY, at, base, with_device, with_revenue};

fn window() -> Duration {
    Duration::days(30)
}

fn single(events: &[Event]) -> UserFunnelRecord {
    let mut records = build_funnel(events, window());
    assert_eq!(records.len(), 1);
    records.remove(0)
}

#[test]
fn test_complete_funnel_same_day() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 1000),
        at("u1", EventType::BeginCheckout, 2000),
        at("u1", EventType::Purchase, 3000),
    ]);

    assert!(record.reached_view());
    assert!(record.reached_add());
    assert!(record.reached_checkout());
    assert!(record.reached_purchase());
    assert_eq!(record.view_at, base());
    assert_eq!(record.purchase_at, Some(base() + Duration::seconds(3000)));
}

#[test]
fn test_purchase_outside_window() {
    let record = single(&[
        at("u2", EventType::ProductView, 0),
        at("u2", EventType::AddToCart, DAY),
        at("u2", EventType::Purchase, 40 * DAY),
    ]);

    assert!(record.reached_add());
    assert!(!record.reached_checkout());
    assert!(!record.reached_purchase());
}

#[test]
fn test_tie_with_view_is_not_progression() {
    let record = single(&[
        at("u3", EventType::ProductView, 0),
        at("u3", EventType::AddToCart, 0),
        at("u3", EventType::BeginCheckout, 10),
    ]);

    assert!(!record.reached_add());
    assert!(!record.reached_checkout());
}

#[test]
fn test_tie_between_later_stages() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 10),
        at("u1", EventType::BeginCheckout, 10),
    ]);

    assert!(record.reached_add());
    assert!(!record.reached_checkout());
}

#[test]
fn test_checkout_before_add_voids_the_rest() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::BeginCheckout, 50),
        at("u1", EventType::AddToCart, 100),
        at("u1", EventType::Purchase, 200),
    ]);

    assert!(record.reached_add());
    assert_eq!(record.checkout_at, None);
    assert_eq!(record.purchase_at, None);
}

#[test]
fn test_add_outside_window_voids_valid_checkout() {
    // Checkout is inside the window relative to view but follows no valid add
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::BeginCheckout, 10 * DAY),
        at("u1", EventType::AddToCart, 31 * DAY),
        at("u1", EventType::Purchase, 32 * DAY),
    ]);

    assert!(!record.reached_add());
    assert!(!record.reached_checkout());
    assert!(!record.reached_purchase());
}

#[test]
fn test_window_boundary_is_inclusive() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 30 * DAY),
    ]);
    assert!(record.reached_add());

    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 30 * DAY + 1),
    ]);
    assert!(!record.reached_add());
}

#[test]
fn test_window_is_anchored_at_first_view() {
    // Each step is within 30 days of the previous one but not of the view
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 20 * DAY),
        at("u1", EventType::BeginCheckout, 35 * DAY),
    ]);

    assert!(record.reached_add());
    assert!(!record.reached_checkout());
}

#[test]
fn test_first_occurrence_is_used_for_each_stage() {
    // The first add precedes the view, so a later valid add does not count
    let record = single(&[
        at("u1", EventType::AddToCart, -10),
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 10),
    ]);

    assert_eq!(record.add_at, None);
}

#[test]
fn test_later_views_do_not_move_the_anchor() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::ProductView, 40 * DAY),
        at("u1", EventType::AddToCart, 41 * DAY),
    ]);

    assert_eq!(record.view_at, base());
    assert!(!record.reached_add());
}

#[test]
fn test_users_without_view_are_excluded() {
    let records = build_funnel(
        &[
            at("u1", EventType::AddToCart, 0),
            at("u1", EventType::Purchase, 10),
            at("u2", EventType::ProductView, 0),
        ],
        window(),
    );

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, "u2");
}

#[test]
fn test_device_from_first_qualifying_event() {
    let record = single(&[
        with_device(at("u1", EventType::ProductView, 0), DeviceCategory::Desktop),
        with_device(at("u1", EventType::AddToCart, -5), DeviceCategory::Mobile),
    ]);
    assert_eq!(record.device_category, DeviceCategory::Mobile);

    // Simultaneous events: the earlier stage decides
    let record = single(&[
        with_device(at("u1", EventType::AddToCart, 0), DeviceCategory::Tablet),
        with_device(at("u1", EventType::ProductView, 0), DeviceCategory::Mobile),
    ]);
    assert_eq!(record.device_category, DeviceCategory::Mobile);
}

#[test]
fn test_revenue_only_for_validated_purchase() {
    let events = [
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 10),
        at("u1", EventType::BeginCheckout, 20),
        with_revenue(at("u1", EventType::Purchase, 30), 42.5),
        with_revenue(at("u1", EventType::Purchase, 40), 10.0),
        at("u2", EventType::ProductView, 0),
        with_revenue(at("u2", EventType::Purchase, 30), 99.0),
    ];
    let records = build_funnel(&events, window());

    assert_eq!(records[0].purchase_revenue, Some(42.5));
    assert_eq!(records[1].purchase_revenue, None);
}

fn mixed_events() -> Vec<Event> {
    let mut events = Vec::new();
    for i in 0..40i64 {
        let user = format!("user-{:02}", i);
        events.push(at(&user, EventType::ProductView, i));
        if i % 2 == 0 {
            events.push(at(&user, EventType::AddToCart, i + 5 * (i % 7)));
        }
        if i % 3 == 0 {
            events.push(at(&user, EventType::BeginCheckout, i + 3 * (i % 11)));
        }
        if i % 5 == 0 {
            events.push(at(&user, EventType::Purchase, i + DAY * (i % 45)));
        }
    }
    events
}

#[test]
fn test_stage_counts_are_monotonic() {
    let records = build_funnel(&mixed_events(), window());
    let count = |stage| records.iter().filter(|r| r.reached(stage)).count();

    assert!(count(EventType::Purchase) <= count(EventType::BeginCheckout));
    assert!(count(EventType::BeginCheckout) <= count(EventType::AddToCart));
    assert!(count(EventType::AddToCart) <= count(EventType::ProductView));
}

#[test]
fn test_ordering_and_window_hold_for_every_record() {
    let records = build_funnel(&mixed_events(), window());
    for record in &records {
        let mut previous = record.view_at;
        for stage in &EventType::ALL[1..] {
            if let Some(stage_at) = record.stage_at(*stage) {
                assert!(stage_at > previous);
                assert!(stage_at <= record.view_at + window());
                previous = stage_at;
            }
        }
    }
}

#[test]
fn test_output_is_sorted_and_idempotent() {
    let mut events = mixed_events();
    let first = build_funnel(&events, window());

    events.reverse();
    let second = build_funnel(&events, window());

    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].user_id < w[1].user_id));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_record_serializes_flags() {
    let record = single(&[
        at("u1", EventType::ProductView, 0),
        at("u1", EventType::AddToCart, 10),
    ]);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["reached_view"], true);
    assert_eq!(json["reached_add"], true);
    assert_eq!(json["reached_checkout"], false);
    assert!(json["checkout_at"].is_null());
    assert_eq!(json["device_category"], "desktop");
}

#[test]
fn test_summarize_funnel() {
    let events = [
        with_device(at("a", EventType::ProductView, 0), DeviceCategory::Mobile),
        with_device(at("a", EventType::AddToCart, 10), DeviceCategory::Mobile),
        with_device(at("a", EventType::BeginCheckout, 20), DeviceCategory::Mobile),
        with_revenue(at("a", EventType::Purchase, 30), 20.0),
        with_device(at("b", EventType::ProductView, 0), DeviceCategory::Mobile),
        with_device(at("b", EventType::AddToCart, 10), DeviceCategory::Mobile),
        at("c", EventType::ProductView, 0),
        at("d", EventType::ProductView, 0),
    ];
    let summary = summarize_funnel(&build_funnel(&events, window()));

    let overall = summary.overall().unwrap();
    assert_eq!(overall.label(), "all");
    assert_eq!(overall.users(EventType::ProductView), 4);
    assert_eq!(overall.users(EventType::AddToCart), 2);
    assert_eq!(overall.users(EventType::Purchase), 1);
    assert_eq!(overall.stages[1].step_conversion, 0.5);
    assert_eq!(overall.stages[3].overall_conversion, 0.25);
    assert_eq!(overall.purchase_revenue, 20.0);

    let mobile = summary.device(DeviceCategory::Mobile).unwrap();
    assert_eq!(mobile.users(EventType::ProductView), 2);
    assert_eq!(mobile.stages[1].step_conversion, 1.0);

    let desktop = summary.device(DeviceCategory::Desktop).unwrap();
    assert_eq!(desktop.users(EventType::AddToCart), 0);
    assert_eq!(desktop.stages[1].step_conversion, 0.0);
    assert!(summary.device(DeviceCategory::Tablet).is_none());
}

#[test]
fn test_summarize_empty() {
    let summary = summarize_funnel(&[]);
    let overall = summary.overall().unwrap();
    assert_eq!(overall.users(EventType::ProductView), 0);
    assert_eq!(overall.stages[0].step_conversion, 0.0);
    assert_eq!(summary.groups.len(), 1);
}
