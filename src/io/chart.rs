//! Bar chart of outstanding tasks per category, rendered as a PNG.
//!
//! Bars are drawn left to right in [`Category::ALL`](crate::model::Category::ALL)
//! order. Each bar carries its count above it and the category's ASCII label
//! below the axis; grid lines mark one task each when there is room.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use super::glyphs::{GLYPH_HEIGHT, draw_text, text_width};
use crate::error::Result;
use crate::reconcile::Report;

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 400;
pub const CHART_TITLE: &str = "OUTSTANDING BY CATEGORY";
const MARGIN: u32 = 40;
const TEXT_SCALE: u32 = 2;
const LABEL_GAP: u32 = 6;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const BAR_COLORS: [Rgb<u8>; 3] = [
    Rgb([66, 133, 244]),
    Rgb([52, 168, 83]),
    Rgb([154, 160, 166]),
];

/// Renders outstanding counts per category.
pub fn render_outstanding_chart(report: &Report) -> RgbImage {
    let bars: Vec<(&str, usize)> = report
        .categories
        .iter()
        .map(|summary| (summary.category.chart_label(), summary.outstanding))
        .collect();
    render_bars(&bars)
}

/// Renders and saves the chart as PNG.
pub fn write_outstanding_chart(path: &Path, report: &Report) -> Result<()> {
    let image = render_outstanding_chart(report);
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn render_bars(bars: &[(&str, usize)]) -> RgbImage {
    let mut image = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);

    let plot_left = MARGIN;
    let plot_right = CHART_WIDTH - MARGIN;
    let plot_top = MARGIN;
    let baseline = CHART_HEIGHT - MARGIN;
    let plot_height = baseline - plot_top;
    let text_height = GLYPH_HEIGHT * TEXT_SCALE;

    let title_width = text_width(CHART_TITLE, TEXT_SCALE);
    draw_text(
        &mut image,
        (CHART_WIDTH.saturating_sub(title_width)) / 2,
        LABEL_GAP,
        CHART_TITLE,
        TEXT_SCALE,
        AXIS,
    );

    let max = bars.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1) as u32;
    let unit = plot_height / max;

    if unit >= 4 {
        for step in 1..=max {
            let y = baseline - step * unit;
            fill_rect(&mut image, plot_left, y, plot_right, y + 1, GRID);
        }
    }

    if !bars.is_empty() {
        let slot = (plot_right - plot_left) / bars.len() as u32;
        let bar_width = slot * 3 / 5;
        for (idx, (label, count)) in bars.iter().enumerate() {
            let height = *count as u32 * plot_height / max;
            let slot_left = plot_left + idx as u32 * slot;
            let center = slot_left + slot / 2;
            let left = slot_left + (slot - bar_width) / 2;
            let top = baseline - height;
            let color = BAR_COLORS[idx % BAR_COLORS.len()];
            fill_rect(&mut image, left, top, left + bar_width, baseline, color);

            let count_text = count.to_string();
            draw_text(
                &mut image,
                center.saturating_sub(text_width(&count_text, TEXT_SCALE) / 2),
                top.saturating_sub(text_height + LABEL_GAP / 2),
                &count_text,
                TEXT_SCALE,
                AXIS,
            );
            draw_text(
                &mut image,
                center.saturating_sub(text_width(label, TEXT_SCALE) / 2),
                baseline + LABEL_GAP,
                label,
                TEXT_SCALE,
                AXIS,
            );
        }
    }

    fill_rect(&mut image, plot_left, plot_top, plot_left + 2, baseline + 2, AXIS);
    fill_rect(&mut image, plot_left, baseline, plot_right, baseline + 2, AXIS);

    image
}

fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(image.height()) {
        for x in x0..x1.min(image.width()) {
            image.put_pixel(x, y, color);
        }
    }
}
