use crate::chart;
use crate::config::Config;
use crate::constants::MSG_NO_DATA;
use crate::error::Result;
use crate::segments::{self, SegmentCounts};
use log::{info, warn};
use std::time::Instant;

/// 报表运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 图表已保存
    Rendered(std::path::PathBuf),
    /// 没有取到分群数据，未渲染
    NoData,
}

/// 在已统计好的分群数据上完成渲染步骤
pub fn render_report(counts: &SegmentCounts, cfg: &Config) -> Result<RunOutcome> {
    if counts.is_empty() {
        warn!("No segment data, skipping chart");
        println!("{MSG_NO_DATA}");
        return Ok(RunOutcome::NoData);
    }

    let path = chart::plot_segments(counts, &cfg.chart)?;
    println!("Bar chart saved as '{}'", path.display());
    Ok(RunOutcome::Rendered(path))
}

/// 运行分群报表：统计 -> 渲染 -> 展示
pub fn handle_run(cfg: &Config) -> Result<RunOutcome> {
    let total_start = Instant::now();

    info!("Starting customer segmentation report");
    if let Some(as_of) = cfg.report.as_of {
        info!("Trailing windows anchored at {as_of}");
    }

    // 第一步：统计五个分群（数据库错误在此被吸收为空结果）
    let counts = segments::collect_segment_counts(cfg);

    // 第二步：渲染并展示
    let outcome = render_report(&counts, cfg)?;

    let total_elapsed = total_start.elapsed().as_secs_f64();

    if let RunOutcome::Rendered(path) = &outcome {
        eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("✓ Customer Segmentation Report Completed");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (label, count) in counts.iter() {
            eprintln!("  {label:<26} {count:>8}");
        }
        eprintln!("  Chart:     {}", path.display());
        eprintln!("  Elapsed:   {total_elapsed:.3} seconds");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        info!("✓ Segmentation report completed!");
    }

    Ok(outcome)
}
