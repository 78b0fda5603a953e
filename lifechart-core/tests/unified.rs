use chrono::{NaiveDate, NaiveTime};
use lifechart_core::{unify_series, NamedSeries, Phase, ProjectedPoint, UnifiedPhase};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn point(date: NaiveDate, hour: u32, value: f64, phase: Phase, visit_id: i64) -> ProjectedPoint {
    ProjectedPoint {
        at: date
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).expect("time"))
            .and_utc(),
        value,
        phase,
        visit_id,
        reported_on: date,
        detail: String::new(),
    }
}

fn series(name: &str, points: Vec<ProjectedPoint>) -> NamedSeries {
    NamedSeries {
        name: name.to_string(),
        points,
    }
}

#[test]
fn averages_points_sharing_a_date() {
    let date = day(2024, 1, 1);
    let input = vec![
        series("A", vec![point(date, 0, 4.0, Phase::Current, 1)]),
        series("B", vec![point(date, 0, 6.0, Phase::Current, 1)]),
    ];

    let unified = unify_series(&input, "Unified Symptoms (Avg)", 2).expect("unified line");

    assert_eq!(unified.label, "Unified Symptoms (Avg)");
    assert_eq!(unified.points.len(), 1);
    let only = &unified.points[0];
    assert_eq!(only.date, date);
    assert_eq!(only.average, 5.0);
    assert_eq!(
        only.breakdown
            .iter()
            .map(|item| (item.name.as_str(), item.value))
            .collect::<Vec<_>>(),
        vec![("A", 4.0), ("B", 6.0)]
    );
    assert_eq!(only.phase, UnifiedPhase::Current);
    assert_eq!(only.visit_ids, vec![1]);
}

#[test]
fn no_points_means_no_unified_line() {
    assert!(unify_series(&[], "Unified", 2).is_none());
    assert!(unify_series(&[series("Empty", Vec::new())], "Unified", 2).is_none());
}

#[test]
fn groups_by_calendar_day_and_marks_mixed_phases() {
    let first = day(2024, 2, 10);
    let second = day(2024, 2, 15);
    let input = vec![
        series(
            "Low mood",
            vec![
                point(second, 0, 3.0, Phase::Current, 2),
                point(first, 12, 7.0, Phase::Progression, 1),
            ],
        ),
        series("Anxiety", vec![point(first, 0, 2.0, Phase::Onset, 1)]),
    ];

    let unified = unify_series(&input, "Unified", 2).expect("unified line");
    let dates: Vec<_> = unified.points.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![first, second]);

    assert_eq!(unified.points[0].average, 4.5);
    assert_eq!(unified.points[0].phase, UnifiedPhase::Mixed);
    assert_eq!(unified.points[1].average, 3.0);
    assert_eq!(unified.points[1].phase, UnifiedPhase::Current);
    assert_eq!(unified.points[1].visit_ids, vec![2]);
}

#[test]
fn average_is_rounded_to_precision() {
    let date = day(2024, 5, 5);
    let input = vec![
        series("A", vec![point(date, 0, 1.0, Phase::Current, 1)]),
        series("B", vec![point(date, 0, 1.0, Phase::Current, 1)]),
        series("C", vec![point(date, 0, 2.0, Phase::Current, 3)]),
    ];

    let unified = unify_series(&input, "Unified", 2).expect("unified line");
    assert_eq!(unified.points[0].average, 1.33);
    assert_eq!(unified.points[0].visit_ids, vec![1, 3]);
}
