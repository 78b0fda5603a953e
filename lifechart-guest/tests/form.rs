use std::fs;

use chrono::NaiveDate;
use lifechart_core::{LifeChartConfig, NamedSeries, UnifiedPhase};
use lifechart_guest::{project_guest_submission, FormError, FormFields, VisitForm, GUEST_VISIT_ID};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_fields() -> FormFields {
    let json =
        fs::read_to_string(fixture_path("guest_form.json")).expect("Không đọc được biểu mẫu mẫu");
    FormFields::from_json_str(&json).expect("Biểu mẫu mẫu không hợp lệ")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Ngày không hợp lệ")
}

fn names(series: &[NamedSeries]) -> Vec<&str> {
    series.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn rows_are_zipped_and_blank_names_skipped() {
    let form = VisitForm::from_fields(&load_fields());

    assert_eq!(form.visit_date, Some(day(2024, 3, 1)));
    assert_eq!(form.symptoms.len(), 2);

    let insomnia = &form.symptoms[0];
    assert_eq!(insomnia.name, "Insomnia");
    assert_eq!(insomnia.onset, Some(2.0));
    assert_eq!(insomnia.progression, Some(5.0));
    assert_eq!(insomnia.current, Some(7.0));
    assert_eq!(insomnia.duration_text, "2 weeks");

    let irritability = &form.symptoms[1];
    assert_eq!(irritability.name, "Irritability");
    assert_eq!(irritability.onset, None);
    assert_eq!(irritability.current, None);
    assert_eq!(irritability.clone().into_entry().score_current, 0.0);

    assert_eq!(form.mse.len(), 2);
    assert_eq!(form.mse[1].category, "Thought");
    assert_eq!(form.scales[0].total_score, Some(18.0));
}

#[test]
fn consecutive_rows_for_one_drug_become_a_taper() {
    let entries = VisitForm::from_fields(&load_fields()).entries();
    let meds = &entries.medications;

    assert_eq!(meds.len(), 3);

    assert_eq!(meds[0].name, "Sertraline");
    assert!(meds[0].is_tapering);
    assert_eq!(meds[0].dose, "50mg");
    assert_eq!(meds[0].drug_type.as_deref(), Some("SSRI"));
    let steps = meds[0].taper_steps().expect("có phác đồ giảm liều");
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].dose, "25mg");
    assert_eq!(steps[1].note, "taper");

    assert_eq!(meds[1].name, "Clonazepam");
    assert!(!meds[1].is_tapering);

    // Cùng thuốc nhưng cách một dòng khác: không gộp.
    assert_eq!(meds[2].name, "Sertraline");
    assert!(!meds[2].is_tapering);
    assert_eq!(meds[2].duration_text, None);
}

#[test]
fn blank_scale_severity_is_derived_for_known_scales() {
    let entries = VisitForm::from_fields(&load_fields()).entries();

    assert_eq!(entries.scales[0].severity, "Moderate OCD");
    assert_eq!(entries.scales[1].scale_id, "PHQ-9");
    assert_eq!(entries.scales[1].severity, "");
}

#[test]
fn guest_submission_projects_a_single_first_visit() {
    let chart = project_guest_submission(
        &load_fields(),
        &LifeChartConfig::default(),
        day(2030, 1, 1),
    );

    let detail = &chart.visit_details_by_id[&GUEST_VISIT_ID];
    assert_eq!(detail.date, day(2024, 3, 1));
    assert_eq!(detail.diagnosis, "Insomnia disorder");

    let symptoms = &chart.series_by_category.symptom;
    assert_eq!(names(symptoms), vec!["Insomnia", "Irritability"]);
    let insomnia: Vec<_> = symptoms[0]
        .points
        .iter()
        .map(|p| (p.at.date_naive(), p.value))
        .collect();
    assert_eq!(
        insomnia,
        vec![
            (day(2024, 2, 16), 2.0),
            (day(2024, 2, 23), 5.0),
            (day(2024, 3, 1), 7.0),
        ]
    );

    let unified = chart
        .unified_by_category
        .symptom
        .as_ref()
        .expect("có đường hợp nhất triệu chứng");
    let averages: Vec<_> = unified
        .points
        .iter()
        .map(|p| (p.date, p.average, p.phase))
        .collect();
    assert_eq!(
        averages,
        vec![
            (day(2024, 2, 16), 2.0, UnifiedPhase::Onset),
            (day(2024, 2, 23), 5.0, UnifiedPhase::Progression),
            (day(2024, 3, 1), 3.5, UnifiedPhase::Current),
        ]
    );
}

#[test]
fn guest_taper_is_expanded_day_by_day() {
    let chart = project_guest_submission(
        &load_fields(),
        &LifeChartConfig::default(),
        day(2030, 1, 1),
    );

    let meds = &chart.series_by_category.medication;
    assert_eq!(names(meds), vec!["Sertraline", "Clonazepam"]);

    // 7 ngày liều 50, 3 ngày liều 25, cộng mục riêng một ngày.
    let sertraline = &meds[0].points;
    assert_eq!(sertraline.len(), 11);
    assert_eq!(sertraline.iter().filter(|p| p.value == 50.0).count(), 7);
    assert_eq!(sertraline.last().map(|p| p.at.date_naive()), Some(day(2024, 3, 10)));

    assert_eq!(meds[1].points.len(), 2);
    assert!(meds[1].points.iter().all(|p| p.value == 0.5));

    assert_eq!(names(&chart.series_by_category.mse), vec!["Depressed", "Thought"]);
    assert_eq!(names(&chart.series_by_category.scale), vec!["Y-BOCS", "PHQ-9"]);
}

#[test]
fn missing_visit_date_falls_back_to_today() {
    let fields = FormFields::from_pairs([
        ("symptom_name[]", "Fatigue"),
        ("symptom_current[]", "4"),
    ]);

    let chart = project_guest_submission(&fields, &LifeChartConfig::default(), day(2025, 6, 2));

    assert_eq!(chart.visit_details_by_id[&GUEST_VISIT_ID].date, day(2025, 6, 2));
    assert_eq!(chart.point_count(), 1);
}

#[test]
fn malformed_visit_date_falls_back_to_today() {
    let fields = FormFields::from_pairs([
        ("visit_date", "01/03/2024"),
        ("symptom_name[]", "Fatigue"),
        ("symptom_current[]", "4"),
    ]);

    assert_eq!(VisitForm::from_fields(&fields).visit_date, None);

    let chart = project_guest_submission(&fields, &LifeChartConfig::default(), day(2025, 6, 2));
    assert_eq!(chart.visit_details_by_id[&GUEST_VISIT_ID].date, day(2025, 6, 2));
    assert_eq!(chart.series_by_category.symptom[0].points.len(), 1);
}

#[test]
fn non_object_json_is_a_parse_error() {
    let err = FormFields::from_json_str("[1, 2, 3]").expect_err("mảng không phải biểu mẫu");
    assert!(matches!(err, FormError::Parse(_)));
}

#[test]
fn empty_form_gives_empty_chart_payload() {
    let chart = project_guest_submission(
        &FormFields::new(),
        &LifeChartConfig::default(),
        day(2025, 6, 2),
    );

    assert_eq!(chart.point_count(), 0);
    assert!(chart.unified_by_category.symptom.is_none());
    assert_eq!(chart.visit_details_by_id.len(), 1);
}
