//! Đọc thời lượng dạng văn bản tự do ("2 weeks", "10 days").
//!
//! Tháng tính 30 ngày, năm tính 365 ngày. Đây là quy ước xấp xỉ, không theo lịch.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*(day|week|month|year)s?").unwrap()
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DurationUnit {
    pub fn days(self) -> i64 {
        match self {
            DurationUnit::Day => 1,
            DurationUnit::Week => 7,
            DurationUnit::Month => 30,
            DurationUnit::Year => 365,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "day" => Some(DurationUnit::Day),
            "week" => Some(DurationUnit::Week),
            "month" => Some(DurationUnit::Month),
            "year" => Some(DurationUnit::Year),
            _ => None,
        }
    }
}

/// Thời lượng đã đọc được.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDuration {
    pub amount: i64,
    pub unit: DurationUnit,
    span: Duration,
}

impl ParsedDuration {
    /// Tổng số ngày.
    pub fn days(&self) -> i64 {
        self.span.num_days()
    }

    pub fn span(&self) -> Duration {
        self.span
    }
}

/// Tìm cặp `<số> <đơn vị>` đầu tiên trong chuỗi.
///
/// Trả về `None` khi chuỗi rỗng, không khớp, hoặc số quá lớn để biểu diễn.
pub fn parse_duration(text: &str) -> Option<ParsedDuration> {
    let captures = DURATION_PATTERN.captures(text)?;
    let amount: i64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = DurationUnit::from_word(captures.get(2)?.as_str())?;
    let span = Duration::try_days(amount.checked_mul(unit.days())?)?;
    Some(ParsedDuration { amount, unit, span })
}

/// Dạng tiện cho trường có thể vắng mặt.
pub fn parse_optional_duration(text: Option<&str>) -> Option<ParsedDuration> {
    text.and_then(parse_duration)
}
