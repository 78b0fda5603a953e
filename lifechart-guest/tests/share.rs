use std::collections::HashSet;
use std::fs;

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use lifechart_core::{ChartData, LifeChartConfig};
use lifechart_guest::{
    project_guest_submission, share_path, FormFields, GuestShareStore, ManualClock, ShareError,
    ShareState,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Note {
    title: String,
    score: i32,
}

fn note() -> Note {
    Note {
        title: "guest".into(),
        score: 7,
    }
}

fn store() -> GuestShareStore<ManualClock> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    GuestShareStore::with_clock(&LifeChartConfig::default(), ManualClock::new(start))
}

#[test]
fn resolve_right_after_create_returns_payload() {
    let store = store();
    let token = store.create(&note()).expect("Không tạo được liên kết");

    let resolved: Note = store.resolve(&token).expect("Không mở được liên kết");
    assert_eq!(resolved, note());
    assert_eq!(store.state(&token), ShareState::Active);
}

#[test]
fn link_expires_at_ttl_and_is_then_gone() {
    let store = store();
    let token = store.create(&note()).expect("Không tạo được liên kết");

    store.clock().advance(Duration::minutes(29));
    assert!(store.resolve::<Note>(&token).is_ok());

    store.clock().advance(Duration::minutes(1));
    assert!(matches!(store.resolve::<Note>(&token), Err(ShareError::Expired)));
    assert!(matches!(store.resolve::<Note>(&token), Err(ShareError::NotFound)));
    assert_eq!(store.state(&token), ShareState::Deleted);
}

#[test]
fn unknown_token_is_not_found() {
    let store = store();
    assert!(matches!(
        store.resolve::<Note>("no-such-token"),
        Err(ShareError::NotFound)
    ));
}

#[test]
fn expired_and_missing_links_report_different_messages() {
    assert_ne!(ShareError::Expired.to_string(), ShareError::NotFound.to_string());
}

#[test]
fn sweep_removes_only_entries_past_expiry() {
    let store = store();
    let first = store.create(&note()).expect("Không tạo được liên kết");
    store.clock().advance(Duration::minutes(10));
    let second = store.create(&note()).expect("Không tạo được liên kết");

    // Hạn của mục đầu đúng bằng hiện tại: đã hết hạn khi đọc, nhưng sweep chưa xoá.
    store.clock().advance(Duration::minutes(20));
    assert_eq!(store.state(&first), ShareState::Expired);
    assert_eq!(store.sweep(), 0);

    store.clock().advance(Duration::seconds(1));
    assert_eq!(store.sweep(), 1);
    assert_eq!(store.state(&first), ShareState::Deleted);
    assert_eq!(store.state(&second), ShareState::Active);
    assert_eq!(store.len(), 1);
}

#[test]
fn create_sweeps_stale_entries() {
    let store = store();
    store.create(&note()).expect("Không tạo được liên kết");
    store.clock().advance(Duration::hours(2));

    store.create(&note()).expect("Không tạo được liên kết");
    assert_eq!(store.len(), 1);
}

#[test]
fn tokens_are_distinct() {
    let store = store();
    let tokens: HashSet<String> = (0..200)
        .map(|_| store.create(&note()).expect("Không tạo được liên kết"))
        .collect();
    assert_eq!(tokens.len(), 200);
}

#[test]
fn ttl_follows_config() {
    let config = LifeChartConfig {
        share_ttl_minutes: 5,
        ..LifeChartConfig::default()
    };
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let store = GuestShareStore::with_clock(&config, ManualClock::new(start));
    let token = store.create(&note()).expect("Không tạo được liên kết");

    store.clock().set(start + Duration::minutes(5));
    assert!(matches!(store.resolve::<Note>(&token), Err(ShareError::Expired)));
}

#[test]
fn chart_payload_survives_sharing_unchanged() {
    let json = fs::read_to_string(format!(
        "{}/tests/data/guest_form.json",
        env!("CARGO_MANIFEST_DIR")
    ))
    .expect("Không đọc được biểu mẫu mẫu");
    let fields = FormFields::from_json_str(&json).expect("Biểu mẫu mẫu không hợp lệ");
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let chart = project_guest_submission(&fields, &LifeChartConfig::default(), today);

    let store = store();
    let token = store.create(&chart).expect("Không tạo được liên kết");
    let shared: ChartData = store.resolve(&token).expect("Không mở được liên kết");

    assert_eq!(shared, chart);
}

#[test]
fn share_path_embeds_token() {
    assert_eq!(share_path("abc"), "/guest/share/abc");
}

#[test]
fn concurrent_creates_never_share_a_token() {
    let store = GuestShareStore::new(&LifeChartConfig::default());

    let tokens: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..50)
                        .map(|_| store.create(&note()).expect("Không tạo được liên kết"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("Luồng tạo liên kết bị lỗi"))
            .collect()
    });

    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), 400);
    assert_eq!(store.len(), 400);
}

fn guest_dose_chart(dose: &str) -> ChartData {
    let fields = FormFields::from_pairs([
        ("visit_date", "2024-03-01"),
        ("drug_name[]", "Lithium"),
        ("dose_mg[]", dose),
        ("med_duration_text[]", "2 days"),
    ]);
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    project_guest_submission(&fields, &LifeChartConfig::default(), today)
}

#[test]
fn full_precision_doses_survive_sharing() {
    let chart = guest_dose_chart("12183.572392852633 mg");
    assert_eq!(
        chart.series_by_category.medication[0].points[0].value,
        12183.572392852633
    );

    let store = store();
    let token = store.create(&chart).expect("Không tạo được liên kết");
    let shared: ChartData = store.resolve(&token).expect("Không mở được liên kết");
    assert_eq!(shared, chart);
}

#[test]
fn shortest_float_text_round_trips_for_many_doses() {
    let store = store();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for _ in 0..2000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let value = (seed >> 11) as f64 / (1u64 << 53) as f64 * 100_000.0;
        let chart = guest_dose_chart(&format!("{value:?} mg"));

        let token = store.create(&chart).expect("Không tạo được liên kết");
        let shared: ChartData = store.resolve(&token).expect("Không mở được liên kết");
        assert_eq!(shared, chart, "liều {value:?} bị thay đổi");
    }
}

#[test]
fn expiry_is_independent_of_the_caller_offset() {
    let hanoi = FixedOffset::east_opt(7 * 3600).unwrap();
    let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
    let created_local = hanoi.with_ymd_and_hms(2024, 3, 1, 23, 50, 0).unwrap();

    let clock = ManualClock::new(created_local.with_timezone(&Utc));
    let store = GuestShareStore::with_clock(&LifeChartConfig::default(), clock);
    let token = store.create(&note()).expect("Không tạo được liên kết");

    // Cùng một thời điểm, ghi theo múi giờ khác: 29 phút sau vẫn mở được.
    let later = (created_local + Duration::minutes(29)).with_timezone(&new_york);
    store.clock().set(later.with_timezone(&Utc));
    assert!(store.resolve::<Note>(&token).is_ok());

    let deadline = (created_local + Duration::minutes(30)).with_timezone(&new_york);
    store.clock().set(deadline.with_timezone(&Utc));
    assert!(matches!(store.resolve::<Note>(&token), Err(ShareError::Expired)));
}
