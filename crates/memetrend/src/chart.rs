//! PNG bar chart of mean virality per category.
//!
//! One bar per [`CategorySummary`], heights scaled to the largest mean.
//! The file is overwritten on every call. No text is drawn; the category
//! order matches [`memetrend_core::virality::summarize`] (Hot Topics first).

use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use memetrend_core::virality::{Category, CategorySummary};
use memetrend_core::MemeError;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const HOT: Rgb<u8> = Rgb([221, 94, 62]);
const GENERAL: Rgb<u8> = Rgb([76, 114, 176]);

fn color_for(category: Category) -> Rgb<u8> {
    match category {
        Category::HotTopics => HOT,
        Category::General => GENERAL,
    }
}

/// Render `summaries` to `path` as a `width`×`height` PNG.
///
/// Returns `Ok(None)` without touching the filesystem when there is
/// nothing to plot.
pub fn render_chart(
    summaries: &[CategorySummary],
    path: &Path,
    width: u32,
    height: u32,
) -> Result<Option<PathBuf>, MemeError> {
    if summaries.is_empty() {
        return Ok(None);
    }
    if width < 40 || height < 40 {
        return Err(MemeError::ChartingFailed(format!(
            "chart size {}x{} is too small",
            width, height
        )));
    }

    let img = draw_bars(summaries, width, height);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemeError::ChartingFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| MemeError::ChartingFailed(format!("cannot write {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), bars = summaries.len(), "rendered virality chart");
    Ok(Some(path.to_path_buf()))
}

fn draw_bars(summaries: &[CategorySummary], width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let margin_x = width / 10;
    let margin_y = height / 10;
    let left = margin_x;
    let right = width - margin_x;
    let top = margin_y;
    let baseline = height - margin_y;
    let plot_height = baseline - top;

    // horizontal gridlines at quarters
    for q in 1..=4 {
        let y = baseline - plot_height * q / 4;
        fill_rect(&mut img, left, y, right, y + 1, GRID);
    }

    let max_mean = summaries
        .iter()
        .map(|s| s.mean_score)
        .fold(0.0_f64, f64::max);

    let slot = (right - left) / summaries.len() as u32;
    let bar_width = (slot * 3 / 5).max(1);
    for (i, summary) in summaries.iter().enumerate() {
        let ratio = if max_mean > 0.0 {
            (summary.mean_score / max_mean).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bar_height = (ratio * plot_height as f64).round() as u32;
        let x0 = left + slot * i as u32 + (slot - bar_width) / 2;
        fill_rect(
            &mut img,
            x0,
            baseline - bar_height,
            x0 + bar_width,
            baseline,
            color_for(summary.category),
        );
    }

    // axes
    fill_rect(&mut img, left, baseline, right, baseline + 2, AXIS);
    fill_rect(&mut img, left, top, left + 2, baseline + 2, AXIS);

    img
}

/// Fill `[x0, x1) × [y0, y1)`, clipped to the image.
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(img.width());
    let y1 = y1.min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}
