use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use lifechart_core::{prepare_chart_data, ChartData, LifeChartConfig, MemoryRecordStore};
use lifechart_guest::{project_guest_submission, share_path, FormFields, GuestShareStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lifechart-cli",
    about = "Dựng life chart từ lịch sử khám hoặc biểu mẫu của khách."
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Thời gian sống (phút) của liên kết chia sẻ.
    #[arg(long, global = true)]
    share_ttl_minutes: Option<u32>,

    /// Số chữ số thập phân của đường trung bình hợp nhất.
    #[arg(long, global = true)]
    unified_precision: Option<u32>,
}

impl ConfigArgs {
    fn to_config(&self) -> LifeChartConfig {
        let mut config = LifeChartConfig::default();
        if let Some(minutes) = self.share_ttl_minutes {
            config.share_ttl_minutes = minutes;
        }
        if let Some(precision) = self.unified_precision {
            config.unified_precision = precision;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Life chart của một bệnh nhân từ file JSON danh sách lượt khám.
    Chart {
        /// Đường dẫn tới file JSON lượt khám.
        #[arg(short, long)]
        input: PathBuf,

        /// Mã bệnh nhân.
        #[arg(short, long)]
        patient: i64,

        /// In toàn bộ dữ liệu chart dạng JSON.
        #[arg(long)]
        json: bool,
    },
    /// Life chart từ biểu mẫu của khách (JSON field -> giá trị).
    Guest {
        /// Đường dẫn tới file JSON biểu mẫu.
        #[arg(short, long)]
        input: PathBuf,

        /// Ngày khám mặc định khi biểu mẫu không có `visit_date` (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Tự kiểm tra chia sẻ: tạo liên kết tạm trong bộ nhớ rồi mở lại ngay.
        #[arg(long)]
        share: bool,

        /// In toàn bộ dữ liệu chart dạng JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.to_config();

    match cli.command {
        Command::Chart {
            input,
            patient,
            json,
        } => {
            let data = read_input(&input)?;
            let store = MemoryRecordStore::from_json_str(&data)
                .with_context(|| format!("File lượt khám không hợp lệ: {input:?}"))?;
            tracing::info!(patient, visits = store.len(), "loaded visit history");
            let chart = prepare_chart_data(&store, patient, &config)?;
            print_chart(&chart, json)?;
        }
        Command::Guest {
            input,
            date,
            share,
            json,
        } => {
            let data = read_input(&input)?;
            let fields = FormFields::from_json_str(&data)
                .with_context(|| format!("File biểu mẫu không hợp lệ: {input:?}"))?;
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let chart = project_guest_submission(&fields, &config, today);
            print_chart(&chart, json)?;

            if share {
                // Kho chia sẻ chỉ sống trong tiến trình này: tạo rồi mở lại ngay để tự kiểm tra.
                let store = GuestShareStore::new(&config);
                let token = store.create(&chart)?;
                let shared: ChartData = store.resolve(&token)?;
                println!(
                    "Share self-check: {} -> {}/{} points, valid {} minutes in this process",
                    share_path(&token),
                    shared.point_count(),
                    chart.point_count(),
                    store.ttl().num_minutes()
                );
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Không đọc được file {path:?}"))
}

fn print_chart(chart: &ChartData, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(chart).context("Không serialize được dữ liệu chart")?;
        println!("{rendered}");
        return Ok(());
    }

    let series = &chart.series_by_category;
    println!(
        "Visits: {}\nPoints: {}\nSymptoms: {}\nMedications: {}\nSide effects: {}\nMSE: {}\nScales: {}",
        chart.visit_details_by_id.len(),
        chart.point_count(),
        series.symptom.len(),
        series.medication.len(),
        series.side_effect.len(),
        series.mse.len(),
        series.scale.len(),
    );
    Ok(())
}
