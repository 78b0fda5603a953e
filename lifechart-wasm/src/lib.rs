//! Bridge WASM <-> JavaScript cho life chart, không phụ thuộc framework UI.

use std::fmt::Display;

use lifechart_core::{prepare_chart_data, LifeChartConfig, MemoryRecordStore, PatientId, Visit};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsLifeChartConfig {
    #[serde(default)]
    share_ttl_minutes: Option<u32>,
    #[serde(default)]
    min_medication_days: Option<u32>,
    #[serde(default)]
    max_schedule_days: Option<u32>,
    #[serde(default)]
    unified_precision: Option<u32>,
}

impl From<JsLifeChartConfig> for LifeChartConfig {
    fn from(cfg: JsLifeChartConfig) -> Self {
        let mut base = LifeChartConfig::default();
        if let Some(minutes) = cfg.share_ttl_minutes {
            base.share_ttl_minutes = minutes;
        }
        if let Some(days) = cfg.min_medication_days {
            base.min_medication_days = days;
        }
        if let Some(days) = cfg.max_schedule_days {
            base.max_schedule_days = days;
        }
        if let Some(precision) = cfg.unified_precision {
            base.unified_precision = precision;
        }
        base
    }
}

/// Dựng life chart cho một bệnh nhân từ danh sách lượt khám.
#[wasm_bindgen]
pub fn prepare_chart(
    visits: JsValue,
    patient_id: f64,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let visits: Vec<Visit> = from_value(visits)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách lượt khám: {err}")))?;
    let cfg = read_config(config)?;

    let mut store = MemoryRecordStore::new();
    for visit in visits {
        store.save_visit(visit);
    }

    let chart = prepare_chart_data(&store, patient_id as PatientId, &cfg)
        .map_err(|err| JsValue::from_str(&format_error(err)))?;

    to_value(&chart).map_err(|err| JsValue::from_str(&format!("Không serialize chart: {err}")))
}

/// Chiếu biểu mẫu của khách thành dữ liệu chart, không lưu gì.
#[wasm_bindgen]
pub fn project_guest_submission(
    form: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let form_value = from_value::<serde_json::Value>(form)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được biểu mẫu: {err}")))?;
    let cfg = read_config(config)?;

    let chart = lifechart_guest::project_guest_submission_value(&form_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_error(err)))?;

    to_value(&chart).map_err(|err| JsValue::from_str(&format!("Không serialize chart: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<LifeChartConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsLifeChartConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(LifeChartConfig::from(cfg))
        }
        None => Ok(LifeChartConfig::default()),
    }
}

fn format_error(err: impl Display) -> String {
    format!("Life chart error: {err}")
}
