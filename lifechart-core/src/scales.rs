//! Tính điểm thang sàng lọc (CIWA-Ar, Y-BOCS).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ScaleAssessment;
use crate::LifeChartError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Scale {
    #[serde(rename = "CIWA-Ar")]
    CiwaAr,
    #[serde(rename = "Y-BOCS")]
    Ybocs,
}

impl Scale {
    pub fn id(self) -> &'static str {
        match self {
            Scale::CiwaAr => "CIWA-Ar",
            Scale::Ybocs => "Y-BOCS",
        }
    }

    /// Nhãn mức độ theo tổng điểm.
    pub fn severity(self, total: i64) -> &'static str {
        match self {
            Scale::CiwaAr => match total {
                i64::MIN..=9 => "Absent or minimal withdrawal",
                10..=19 => "Mild to moderate withdrawal",
                _ => "Severe withdrawal",
            },
            Scale::Ybocs => match total {
                i64::MIN..=7 => "Subclinical",
                8..=15 => "Mild OCD",
                16..=23 => "Moderate OCD",
                24..=31 => "Severe OCD",
                _ => "Extreme OCD",
            },
        }
    }
}

impl FromStr for Scale {
    type Err = LifeChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CIWA-Ar" => Ok(Scale::CiwaAr),
            "Y-BOCS" => Ok(Scale::Ybocs),
            other => Err(LifeChartError::UnknownScale(other.to_string())),
        }
    }
}

/// Tổng điểm và nhãn mức độ từ các câu trả lời.
pub fn score_scale(scale_id: &str, responses: &[i64]) -> Result<(i64, &'static str), LifeChartError> {
    let scale: Scale = scale_id.parse()?;
    if responses.is_empty() {
        return Err(LifeChartError::MissingData);
    }
    let total = responses.iter().sum();
    Ok((total, scale.severity(total)))
}

impl ScaleAssessment {
    pub fn from_responses(scale_id: &str, responses: &[i64]) -> Result<Self, LifeChartError> {
        let (total, severity) = score_scale(scale_id, responses)?;
        Ok(Self {
            scale_id: scale_id.trim().to_string(),
            total_score: total as f64,
            severity: severity.to_string(),
        })
    }
}
