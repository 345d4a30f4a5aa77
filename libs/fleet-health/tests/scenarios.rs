//! Engine-level scenarios
//!
//! Exhaustive checks over every combination of the five raw signals plus the
//! reference scenarios for root-cause attribution and recurrence trends.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::{DateTime, Duration, TimeZone, Utc};
use fleet_health::{
    classify, compare_records, evaluate, EffectiveStatus, IssueCategory, RawSnapshot,
    RecurrenceAnalyzer, RecurrenceQuery, SeverityTier, TrendDirection, WindowDays,
};
use std::cmp::Ordering;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

fn snapshot(
    unit: &str,
    [gateway, host, storage, login, video]: [bool; 5],
    at: DateTime<Utc>,
) -> RawSnapshot {
    RawSnapshot {
        gateway_reachable: gateway,
        host_reachable: host,
        storage_healthy: storage,
        login_ok: login,
        video_normal: video,
        camera_count: 4,
        ..RawSnapshot::healthy(unit, at)
    }
}

/// All 32 combinations of the raw signals
fn all_signal_combinations() -> Vec<[bool; 5]> {
    (0u8..32)
        .map(|bits| {
            [
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
                bits & 16 != 0,
            ]
        })
        .collect()
}

#[test]
fn propagation_invariants_hold_for_every_input() {
    for signals in all_signal_combinations() {
        let s = snapshot("U", signals, now());
        let result = evaluate(&s);
        let st = result.status;

        if !st.gateway {
            assert_eq!(st, EffectiveStatus::DOWN, "signals {:?}", signals);
            assert_eq!(result.category, IssueCategory::Gateway);
        } else if !st.host {
            assert!(!st.storage && !st.login && !st.video, "signals {:?}", signals);
            assert_eq!(result.category, IssueCategory::Host);
        } else {
            assert_eq!(st.storage, s.storage_healthy);
            assert_eq!(st.video, s.video_normal);
            assert!(st.login);
        }

        // the category names a failed layer, and nothing above it failed
        assert_eq!(result.category, st.root_cause());
        assert_eq!(st.layer(result.category), result.category.is_healthy());
    }
}

#[test]
fn evaluation_is_idempotent() {
    for signals in all_signal_combinations() {
        let s = snapshot("U", signals, now());
        assert_eq!(evaluate(&s), evaluate(&s));
    }
}

#[test]
fn classification_is_total_and_exclusive() {
    let mut seen = Vec::new();
    for category in IssueCategory::ALL {
        let tier = classify(category);
        assert!(SeverityTier::ALL.contains(&tier));
        seen.push(tier);
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn scenario_gateway_down() {
    let result = evaluate(&snapshot("U", [false, true, true, true, true], now()));

    assert_eq!(result.category, IssueCategory::Gateway);
    assert_eq!(result.severity(), SeverityTier::Critical);
    assert_eq!(
        result.status,
        EffectiveStatus {
            gateway: false,
            host: false,
            storage: false,
            login: false,
            video: false,
        }
    );
}

#[test]
fn scenario_video_only() {
    let result = evaluate(&snapshot("U", [true, true, true, true, false], now()));
    assert_eq!(result.category, IssueCategory::Video);
    assert_eq!(result.severity(), SeverityTier::Attention);
}

#[test]
fn scenario_storage_outranks_video() {
    let result = evaluate(&snapshot("U", [true, true, false, true, false], now()));
    assert_eq!(result.category, IssueCategory::Storage);
    assert_eq!(result.severity(), SeverityTier::Critical);
}

#[test]
fn scenario_host_once_per_half_is_stable() {
    let host_down = [true, false, true, true, true];
    let snapshots = vec![
        snapshot("U1", host_down, now() - Duration::days(6)),
        snapshot("U1", host_down, now() - Duration::hours(2)),
    ];
    let query = RecurrenceQuery::new(WindowDays::Seven).until(now());

    let report = RecurrenceAnalyzer::default().analyze(&snapshots, &query);

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].unit_id, "U1");
    assert_eq!(report[0].category, IssueCategory::Host);
    assert_eq!(report[0].occurrences, 2);
    assert_eq!(report[0].trend_magnitude, 0.0);
    assert_eq!(report[0].trend_direction, TrendDirection::Stable);
}

#[test]
fn scenario_storage_only_in_later_half() {
    let storage_bad = [true, true, false, true, true];
    let snapshots: Vec<_> = (1..=4)
        .map(|h| snapshot("U2", storage_bad, now() - Duration::hours(h)))
        .collect();
    let query = RecurrenceQuery::new(WindowDays::Seven).until(now());

    let report = RecurrenceAnalyzer::default().analyze(&snapshots, &query);

    assert_eq!(report[0].occurrences, 4);
    assert_eq!(report[0].earlier_count, 0);
    assert_eq!(report[0].trend_magnitude, 400.0);
    assert_eq!(report[0].trend_direction, TrendDirection::Up);
}

#[test]
fn report_is_sorted_and_never_healthy() {
    let combos = all_signal_combinations();
    let snapshots: Vec<_> = (0..240)
        .map(|i: usize| {
            snapshot(
                &format!("U{:02}", i % 13),
                combos[(i * 7) % combos.len()],
                now() - Duration::hours((i % 70) as i64),
            )
        })
        .collect();
    let query = RecurrenceQuery::new(WindowDays::Three)
        .until(now())
        .with_top_n(1000);

    let report = RecurrenceAnalyzer::default().analyze(&snapshots, &query);

    assert!(!report.is_empty());
    assert!(report.iter().all(|r| r.category != IssueCategory::Healthy));
    assert!(report.iter().all(|r| r.occurrences > 0));
    assert!(report.iter().all(|r| r.severity == classify(r.category)));
    for pair in report.windows(2) {
        assert_ne!(compare_records(&pair[0], &pair[1]), Ordering::Greater);
        if pair[0].occurrences == pair[1].occurrences {
            assert!(pair[0].trend_magnitude.abs() >= pair[1].trend_magnitude.abs());
        }
    }
}

#[test]
fn report_is_reproducible() {
    let snapshots: Vec<_> = (0..50)
        .map(|i: i64| {
            snapshot(
                &format!("U{}", i % 5),
                [true, i % 3 != 0, i % 2 == 0, true, true],
                now() - Duration::hours(i),
            )
        })
        .collect();
    let query = RecurrenceQuery::new(WindowDays::Seven).until(now());
    let analyzer = RecurrenceAnalyzer::default();

    let mut reversed = snapshots.clone();
    reversed.reverse();

    assert_eq!(
        analyzer.analyze(&snapshots, &query),
        analyzer.analyze(&reversed, &query)
    );
}

#[test]
fn empty_feed_is_not_an_error() {
    let query = RecurrenceQuery::from_days(3).unwrap();
    assert!(RecurrenceAnalyzer::default().analyze(&[], &query).is_empty());
}

#[test]
fn window_must_be_three_or_seven() {
    for days in [0, 1, 2, 4, 5, 6, 8, 14, 30] {
        assert!(WindowDays::try_from(days).is_err(), "{} accepted", days);
    }
}

#[test]
fn records_serialize_with_lowercase_enums() {
    let snapshots = vec![snapshot("U1", [true, true, true, true, false], now())];
    let query = RecurrenceQuery::new(WindowDays::Three).until(now());
    let report = RecurrenceAnalyzer::default().analyze(&snapshots, &query);

    let json = serde_json::to_value(&report[0]).unwrap();
    assert_eq!(json["category"], "video");
    assert_eq!(json["severity"], "attention");
    assert_eq!(json["trend_direction"], "up");
    assert_eq!(json["window_days"], 3);
}
