//! Đường trung bình hợp nhất theo ngày cho một nhóm lâm sàng.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{BreakdownItem, NamedSeries, Phase, UnifiedPhase, UnifiedPoint, UnifiedSeries, VisitId};

#[derive(Default)]
struct DateGroup {
    breakdown: Vec<BreakdownItem>,
    phases: Vec<Phase>,
    visit_ids: BTreeSet<VisitId>,
}

/// Gom điểm của mọi chuỗi theo ngày lịch và lấy trung bình cộng.
///
/// Trả về `None` khi không có điểm nào mang giá trị, thay vì một đường bằng 0.
pub fn unify_series(series: &[NamedSeries], label: &str, precision: u32) -> Option<UnifiedSeries> {
    let mut groups: BTreeMap<NaiveDate, DateGroup> = BTreeMap::new();

    for named in series {
        for point in &named.points {
            if !point.value.is_finite() {
                continue;
            }
            let group = groups.entry(point.at.date_naive()).or_default();
            group.breakdown.push(BreakdownItem {
                name: named.name.clone(),
                value: point.value,
            });
            if !group.phases.contains(&point.phase) {
                group.phases.push(point.phase);
            }
            group.visit_ids.insert(point.visit_id);
        }
    }

    let points: Vec<UnifiedPoint> = groups
        .into_iter()
        .map(|(date, group)| {
            let total: f64 = group.breakdown.iter().map(|item| item.value).sum();
            let average = round_to(total / group.breakdown.len() as f64, precision);
            let phase = match group.phases.as_slice() {
                [single] => UnifiedPhase::from(*single),
                _ => UnifiedPhase::Mixed,
            };
            UnifiedPoint {
                date,
                average,
                breakdown: group.breakdown,
                phase,
                visit_ids: group.visit_ids.into_iter().collect(),
            }
        })
        .collect();

    if points.is_empty() {
        None
    } else {
        Some(UnifiedSeries {
            label: label.to_string(),
            points,
        })
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(12) as i32);
    (value * factor).round() / factor
}
