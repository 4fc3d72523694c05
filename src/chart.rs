//! Chart feature
//!
//! - `top_segments` picks the five largest segments (stable on ties).
//! - `render_chart` draws a vertical bar chart to PNG using plotters.
//! - `show_chart` hands the PNG to the platform image viewer.

use crate::chart_error;
use crate::config::ChartConfig;
use crate::constants::{
    BAR_COLOR_RGB, CHART_TITLE, FONT_SEARCH_PATHS, TOP_SEGMENTS, X_AXIS_LABEL, Y_AXIS_LABEL,
};
use crate::error::Result;
use crate::segments::SegmentCounts;
use log::{debug, info};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use std::ops::Range;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

const FONT_FAMILY: &str = "sans-serif";
const TICK_FONT_SIZE: u32 = 14;
const TICK_LENGTH: i32 = 5;
const BAR_HALF_WIDTH: f64 = 0.4;

static REGISTERED_FONT: OnceLock<PathBuf> = OnceLock::new();

/// 取客户数最多的前 5 个分群
pub fn top_segments(counts: &SegmentCounts) -> Vec<(String, i64)> {
    counts.top(TOP_SEGMENTS)
}

/// 定位可用的 TrueType 字体
pub fn find_font(configured: Option<&str>) -> Option<PathBuf> {
    match configured {
        Some(path) => {
            let path = PathBuf::from(path);
            path.is_file().then_some(path)
        }
        None => FONT_SEARCH_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file()),
    }
}

/// 注册 plotters 使用的 sans-serif 字体（进程内只注册一次）
fn ensure_font(configured: Option<&str>) -> Result<()> {
    // 配置的字体必须存在，即使进程内已注册过其他字体
    let path = find_font(configured).ok_or_else(|| {
        chart_error!(FontUnavailable {
            reason: match configured {
                Some(p) => format!("chart.font '{p}' does not exist"),
                None => "no system font found; set chart.font".to_string(),
            },
        })
    })?;

    if REGISTERED_FONT.get().is_some() {
        return Ok(());
    }

    let bytes = std::fs::read(&path).map_err(|e| {
        chart_error!(FontUnavailable {
            reason: format!("{}: {e}", path.display()),
        })
    })?;

    // plotters 要求 'static 字体数据
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes).map_err(|_| {
        chart_error!(FontUnavailable {
            reason: format!("{} is not a valid TrueType font", path.display()),
        })
    })?;

    debug!("Registered chart font: {}", path.display());
    let _ = REGISTERED_FONT.set(path);
    Ok(())
}

/// x 轴分类坐标：`n` 个宽度为 1 的槽位，第 i 根柱子居中于 `i`
pub fn category_range(n: usize) -> Range<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = n.max(1) as f64;
    -0.5..n - 0.5
}

/// 斜向标签中每个字形的左下角位置
///
/// `edges[i]` 是前 i 个字符的宽度（`edges[0] == 0`，末项为全长）。
/// 每个字形相对上一个字形向右、向上各移动一个字宽，末字右上角落在 `anchor`。
pub fn diagonal_glyph_positions(
    edges: &[i32],
    line_height: i32,
    anchor: (i32, i32),
) -> Vec<(i32, i32)> {
    let total = edges.last().copied().unwrap_or(0);
    edges
        .windows(2)
        .map(|w| {
            let before = total - w[0];
            let after = total - w[1];
            (anchor.0 - before, anchor.1 + line_height + after)
        })
        .collect()
}

/// 以 45° 方向逐字绘制标签
fn draw_diagonal_label<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    label: &str,
    anchor: (i32, i32),
    style: &TextStyle<'_>,
) -> std::result::Result<(), Box<dyn StdError>>
where
    DB::ErrorType: 'static,
{
    let style = style.pos(Pos::new(HPos::Left, VPos::Bottom));
    let (_, line_height) = root.estimate_text_size(label, &style)?;

    // 按前缀测宽，保留字距调整
    let mut edges = vec![0];
    for (idx, ch) in label.char_indices() {
        let (w, _) = root.estimate_text_size(&label[..idx + ch.len_utf8()], &style)?;
        edges.push(i32::try_from(w)?);
    }

    let positions = diagonal_glyph_positions(&edges, i32::try_from(line_height)?, anchor);
    for (ch, pos) in label.chars().zip(positions) {
        root.draw(&Text::new(ch.to_string(), pos, style.clone()))?;
    }
    Ok(())
}

fn draw_bars(
    entries: &[(String, i64)],
    cfg: &ChartConfig,
    path: &Path,
) -> std::result::Result<(), Box<dyn StdError>> {
    let root = BitMapBackend::new(path, (cfg.width, cfg.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let tick_style = (FONT_FAMILY, TICK_FONT_SIZE).into_font().color(&BLACK);

    // x 轴标签区：最长标签的斜向高度 + 轴标题
    let mut longest = 0u32;
    for (label, _) in entries {
        let (w, _) = root.estimate_text_size(label, &tick_style)?;
        longest = longest.max(w);
    }
    let x_label_area = longest + 3 * TICK_FONT_SIZE + 20;

    let max_count = entries.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let y_top = max_count + max_count / 10 + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, (FONT_FAMILY, 26).into_font())
        .margin(20)
        .x_label_area_size(x_label_area)
        .y_label_area_size(70)
        .build_cartesian_2d(category_range(entries.len()), 0i64..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_label_formatter(&|v| v.to_string())
        .x_desc(X_AXIS_LABEL)
        .y_desc(Y_AXIS_LABEL)
        .axis_desc_style((FONT_FAMILY, 18))
        .label_style((FONT_FAMILY, TICK_FONT_SIZE))
        .draw()?;

    let (r, g, b) = BAR_COLOR_RGB;
    let bar_color = RGBColor(r, g, b);
    chart.draw_series(entries.iter().enumerate().map(|(i, (_, count))| {
        #[allow(clippy::cast_precision_loss)]
        let center = i as f64;
        Rectangle::new(
            [(center - BAR_HALF_WIDTH, 0), (center + BAR_HALF_WIDTH, *count)],
            bar_color.filled(),
        )
    }))?;

    for (i, (label, _)) in entries.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let (x, y) = chart.backend_coord(&(i as f64, 0i64));
        root.draw(&PathElement::new(vec![(x, y), (x, y + TICK_LENGTH)], BLACK))?;
        draw_diagonal_label(&root, label, (x, y + TICK_LENGTH + 2), &tick_style)?;
    }

    root.present()?;
    Ok(())
}

/// 绘制前 5 个分群的柱状图并保存为 PNG（覆盖已有文件）
pub fn render_chart(counts: &SegmentCounts, cfg: &ChartConfig) -> Result<PathBuf> {
    let path = PathBuf::from(cfg.file());
    let entries = top_segments(counts);
    info!(
        "Rendering {} segment(s) to {}",
        entries.len(),
        path.display()
    );

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            crate::error::Error::File(crate::error::FileError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    ensure_font(cfg.font.as_deref())?;

    draw_bars(&entries, cfg, &path).map_err(|e| {
        chart_error!(DrawFailed {
            path: path.clone(),
            reason: e.to_string(),
        })
    })?;

    info!("Chart written: {}", path.display());
    Ok(path)
}

fn viewer_command(path: &Path) -> Command {
    #[cfg(target_os = "macos")]
    {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    }
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// 用系统默认查看器打开图片（不等待查看器退出）
pub fn show_chart(path: &Path) -> Result<()> {
    let mut cmd = viewer_command(path);
    debug!("Launching image viewer: {cmd:?}");
    cmd.spawn().map_err(|e| {
        chart_error!(ViewerFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    })?;
    Ok(())
}

/// 渲染并（按配置）展示
pub fn plot_segments(counts: &SegmentCounts, cfg: &ChartConfig) -> Result<PathBuf> {
    let path = render_chart(counts, cfg)?;
    if cfg.show {
        show_chart(&path)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_font_rejects_missing_configured_path() {
        assert!(find_font(Some("/definitely/not/here.ttf")).is_none());
    }

    #[test]
    fn test_category_axis_has_one_slot_per_bar() {
        let (width, height) = (1000u32, 600u32);
        let mut buf = vec![0u8; (width * height * 3) as usize];
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        let chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(category_range(5), 0i64..10)
            .unwrap();

        let (x_range, _) = chart.plotting_area().get_pixel_range();
        let slot = f64::from(x_range.end - x_range.start) / 5.0;

        let (first, _) = chart.backend_coord(&(0.0, 0));
        let (last, _) = chart.backend_coord(&(4.0, 0));
        // 首尾柱子与绘图区边缘都相距半个槽位
        assert!((f64::from(first - x_range.start) - slot / 2.0).abs() <= 1.5);
        assert!((f64::from(x_range.end - last) - slot / 2.0).abs() <= 1.5);
    }

    #[test]
    fn test_diagonal_glyphs_do_not_overlap() {
        // 四个字符，宽度 8/10/6/12
        let edges = [0, 8, 18, 24, 36];
        let positions = diagonal_glyph_positions(&edges, 16, (500, 400));
        assert_eq!(positions.len(), 4);

        for (i, pair) in positions.windows(2).enumerate() {
            let width = edges[i + 1] - edges[i];
            // 下一个字形紧接在上一个字形右侧
            assert_eq!(pair[1].0 - pair[0].0, width);
            // 并且更靠上
            assert!(pair[1].1 < pair[0].1);
        }

        // 末字右上角落在锚点
        let last = positions[3];
        assert_eq!(last.0 + 12, 500);
        assert_eq!(last.1 - 16, 400);
    }

    #[test]
    fn test_diagonal_glyphs_empty_label() {
        assert!(diagonal_glyph_positions(&[0], 16, (10, 10)).is_empty());
    }

    #[test]
    fn test_category_range_single_bar() {
        assert_eq!(category_range(1), -0.5..0.5);
        assert_eq!(category_range(0), -0.5..0.5);
    }

    #[test]
    fn test_top_segments_caps_at_five() {
        let counts: SegmentCounts = (0..8).map(|i| (format!("s{i}"), i64::from(i))).collect();
        let top = top_segments(&counts);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].0, "s7");
        assert_eq!(top[4].0, "s3");
    }
}
