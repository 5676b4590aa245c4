//! SVG rendering with plotters.
//!
//! SVG keeps text as `<text>` elements, so no font files are needed and the
//! output is identical across machines for identical input.

use anyhow::{Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

use super::backend::{BarData, BoxPlotData, ChartBackend, DashboardData, HeatmapData, HistogramData, ScatterData};

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const POSITIVE: RGBColor = RGBColor(211, 47, 47);
const NEGATIVE: RGBColor = RGBColor(41, 121, 255);
const UNDEFINED: RGBColor = RGBColor(224, 224, 224);
const BAR: RGBColor = RGBColor(102, 126, 234);
const POINT: RGBColor = RGBColor(118, 75, 162);
const BOX_FILL: RGBColor = RGBColor(79, 172, 254);
const FONT: &str = "sans-serif";
const LABEL_CHARS: usize = 24;

pub struct SvgChartBackend {
    size: (u32, u32),
    dashboard_size: (u32, u32),
}

impl Default for SvgChartBackend {
    fn default() -> Self {
        Self {
            size: (900, 560),
            dashboard_size: (1400, 1000),
        }
    }
}

impl SvgChartBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn draw_to(
    path: &Path,
    size: (u32, u32),
    draw: impl FnOnce(&Area<'_>) -> Result<()>,
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    Ok(())
}

impl ChartBackend for SvgChartBackend {
    fn heatmap(&self, data: &HeatmapData, path: &Path) -> Result<()> {
        let side = self.size.0.max(self.size.1);
        draw_to(path, (side, side), |root| draw_heatmap(root, data))
    }

    fn scatter(&self, data: &ScatterData, path: &Path) -> Result<()> {
        draw_to(path, self.size, |root| draw_scatter(root, data))
    }

    fn histogram(&self, data: &HistogramData, path: &Path) -> Result<()> {
        draw_to(path, self.size, |root| draw_histogram(root, data))
    }

    fn box_plot(&self, data: &BoxPlotData, path: &Path) -> Result<()> {
        draw_to(path, self.size, |root| draw_box_plot(root, data))
    }

    fn bar(&self, data: &BarData, path: &Path) -> Result<()> {
        draw_to(path, self.size, |root| draw_bars(root, data))
    }

    fn dashboard(&self, data: &DashboardData, path: &Path) -> Result<()> {
        draw_to(path, self.dashboard_size, |root| {
            let body = root.titled("Dataset overview", (FONT, 28))?;
            let panels = body.split_evenly((2, 2));
            let mut panels = panels.iter();

            if let Some(panel) = panels.next() {
                match &data.heatmap {
                    Some(h) => draw_heatmap(panel, h)?,
                    None => draw_placeholder(panel, "Fewer than two numeric columns")?,
                }
            }
            for i in 0..2 {
                if let Some(panel) = panels.next() {
                    match data.distributions.get(i) {
                        Some(d) => draw_histogram(panel, d)?,
                        None => draw_placeholder(panel, "No numeric column")?,
                    }
                }
            }
            if let Some(panel) = panels.next() {
                match &data.categorical {
                    Some(b) => draw_bars(panel, b)?,
                    None => draw_placeholder(panel, "No categorical column")?,
                }
            }
            Ok(())
        })
    }
}

fn short(label: &str) -> String {
    let mut out: String = label.chars().take(LABEL_CHARS).collect();
    if label.chars().count() > LABEL_CHARS {
        out.push('…');
    }
    out
}

/// Linear blend from white to `base` by `t` in `[0, 1]`.
fn blend(base: RGBColor, t: f64) -> RGBColor {
    let mix = |c: u8| (255.0 + (f64::from(c) - 255.0) * t.clamp(0.0, 1.0)).round() as u8;
    RGBColor(mix(base.0), mix(base.1), mix(base.2))
}

/// -1 is blue, 0 is white, +1 is red; undefined is grey.
fn correlation_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        UNDEFINED
    } else if r >= 0.0 {
        blend(POSITIVE, r)
    } else {
        blend(NEGATIVE, -r)
    }
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn draw_placeholder(area: &Area<'_>, message: &str) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let style = TextStyle::from((FONT, 18).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(message.to_owned(), (w as i32 / 2, h as i32 / 2), style))?;
    Ok(())
}

fn draw_heatmap(area: &Area<'_>, data: &HeatmapData) -> Result<()> {
    let n = data.columns.len();
    if n == 0 {
        bail!("Correlation matrix is empty");
    }
    let body = area.titled("Correlation matrix", (FONT, 22))?;
    let (w, h) = body.dim_in_pixel();

    let label_w = 150i32;
    let header_h = 30i32;
    let cell = ((w as i32 - label_w - 10).min(h as i32 - header_h - 10) / n as i32).max(4);
    let font_px = (cell / 4).clamp(8, 14);

    let left = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Right, VPos::Center));
    let top = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    let centered =
        TextStyle::from((FONT, font_px).into_font()).pos(Pos::new(HPos::Center, VPos::Center));

    for (j, name) in data.columns.iter().enumerate() {
        let x = label_w + j as i32 * cell + cell / 2;
        body.draw(&Text::new(short(name), (x, header_h - 4), top.clone()))?;
    }

    for (i, (name, row)) in data.columns.iter().zip(&data.values).enumerate() {
        let y0 = header_h + i as i32 * cell;
        body.draw(&Text::new(short(name), (label_w - 6, y0 + cell / 2), left.clone()))?;

        for (j, &r) in row.iter().enumerate() {
            let x0 = label_w + j as i32 * cell;
            body.draw(&Rectangle::new(
                [(x0, y0), (x0 + cell - 1, y0 + cell - 1)],
                correlation_color(r).filled(),
            ))?;
            if cell >= 24 {
                let text = if r.is_finite() {
                    format!("{r:.2}")
                } else {
                    "n/a".to_owned()
                };
                body.draw(&Text::new(text, (x0 + cell / 2, y0 + cell / 2), centered.clone()))?;
            }
        }
    }
    Ok(())
}

fn draw_scatter(area: &Area<'_>, data: &ScatterData) -> Result<()> {
    let (mut x_lo, mut x_hi, mut y_lo, mut y_hi) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in &data.points {
        x_lo = x_lo.min(x);
        x_hi = x_hi.max(x);
        y_lo = y_lo.min(y);
        y_hi = y_hi.max(y);
    }

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("{} vs {}", short(&data.x_label), short(&data.y_label)),
            (FONT, 22),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(x_lo, x_hi), padded(y_lo, y_hi))?;
    chart
        .configure_mesh()
        .x_desc(data.x_label.as_str())
        .y_desc(data.y_label.as_str())
        .draw()?;

    chart.draw_series(
        data.points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, POINT.mix(0.45).filled())),
    )?;
    Ok(())
}

fn draw_histogram(area: &Area<'_>, data: &HistogramData) -> Result<()> {
    let (Some(first), Some(last)) = (data.bins.first(), data.bins.last()) else {
        bail!("Histogram for '{}' has no bins", data.column);
    };
    let x_range = first.0..(last.0 + data.bin_width);
    let y_max = data.bins.iter().map(|b| b.1).max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Distribution: {}", short(&data.column)), (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(data.column.as_str())
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(data.bins.iter().map(|&(left, count)| {
        Rectangle::new(
            [(left, 0.0), (left + data.bin_width, count as f64)],
            BAR.filled(),
        )
    }))?;
    chart.draw_series(data.bins.iter().map(|&(left, count)| {
        Rectangle::new(
            [(left, 0.0), (left + data.bin_width, count as f64)],
            WHITE.stroke_width(1),
        )
    }))?;
    Ok(())
}

fn draw_box_plot(area: &Area<'_>, data: &BoxPlotData) -> Result<()> {
    let lo = data
        .outliers
        .iter()
        .copied()
        .fold(data.lower_whisker, f64::min);
    let hi = data
        .outliers
        .iter()
        .copied()
        .fold(data.upper_whisker, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Box plot: {}", short(&data.column)), (FONT, 22))
        .margin(10)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..2f64, padded(lo, hi))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc(data.column.as_str())
        .draw()?;

    let plot = chart.plotting_area();
    plot.draw(&Rectangle::new(
        [(0.6, data.q1), (1.4, data.q3)],
        BOX_FILL.mix(0.7).filled(),
    ))?;
    plot.draw(&Rectangle::new(
        [(0.6, data.q1), (1.4, data.q3)],
        BLACK.stroke_width(1),
    ))?;
    plot.draw(&PathElement::new(
        vec![(0.6, data.median), (1.4, data.median)],
        BLACK.stroke_width(2),
    ))?;
    for (from, to) in [(data.q3, data.upper_whisker), (data.q1, data.lower_whisker)] {
        plot.draw(&PathElement::new(vec![(1.0, from), (1.0, to)], BLACK.stroke_width(1)))?;
        plot.draw(&PathElement::new(vec![(0.8, to), (1.2, to)], BLACK.stroke_width(1)))?;
    }
    for &v in &data.outliers {
        plot.draw(&Circle::new((1.0, v), 3, BLACK.stroke_width(1)))?;
    }
    Ok(())
}

fn draw_bars(area: &Area<'_>, data: &BarData) -> Result<()> {
    let n = data.bars.len();
    if n == 0 {
        bail!("No bars to draw for '{}'", data.title);
    }
    let x_max = data.bars.iter().map(|b| b.1).max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(short(&data.title), (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(0f64..x_max, 0f64..n as f64)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&|_| String::new())
        .x_desc("Count")
        .draw()?;

    let label = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    let plot = chart.plotting_area();
    for (i, (name, count)) in data.bars.iter().enumerate() {
        // First bar on top
        let top = (n - i) as f64 - 0.15;
        let bottom = (n - i - 1) as f64 + 0.15;
        plot.draw(&Rectangle::new(
            [(0.0, bottom), (*count as f64, top)],
            BAR.mix(0.85).filled(),
        ))?;
        plot.draw(&Text::new(
            format!("{} ({count})", short(name)),
            (x_max * 0.01, (top + bottom) / 2.0),
            label.clone(),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_color_scale() {
        assert_eq!(correlation_color(1.0), POSITIVE);
        assert_eq!(correlation_color(-1.0), NEGATIVE);
        assert_eq!(correlation_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(correlation_color(f64::NAN), UNDEFINED);
    }

    #[test]
    fn test_padded_range_never_degenerate() {
        let r = padded(3.0, 3.0);
        assert!(r.end > r.start);
        let r = padded(0.0, 10.0);
        assert!(r.start < 0.0 && r.end > 10.0);
        assert_eq!(padded(f64::NAN, 1.0), 0.0..1.0);
    }

    #[test]
    fn test_short_labels() {
        assert_eq!(short("price"), "price");
        let long = "x".repeat(40);
        assert_eq!(short(&long).chars().count(), LABEL_CHARS + 1);
    }

    #[test]
    fn test_svg_output_is_stable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = SvgChartBackend::new();
        let data = HistogramData {
            column: "value".to_owned(),
            bin_width: 2.0,
            bins: vec![(0.0, 3), (2.0, 5), (4.0, 1), (6.0, 0), (8.0, 2)],
        };

        let a = dir.path().join("a.svg");
        let b = dir.path().join("b.svg");
        backend.histogram(&data, &a)?;
        backend.histogram(&data, &b)?;

        let first = std::fs::read_to_string(&a)?;
        assert!(first.contains("<svg"), "SVG root element");
        assert!(first.contains("Distribution: value"));
        assert_eq!(first, std::fs::read_to_string(&b)?);
        Ok(())
    }

    #[test]
    fn test_dashboard_with_placeholders() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dashboard.svg");
        let data = DashboardData {
            heatmap: None,
            distributions: Vec::new(),
            categorical: Some(BarData {
                title: "Most frequent: city".to_owned(),
                bars: vec![("Ankara".to_owned(), 2), ("Izmir".to_owned(), 1)],
            }),
        };
        SvgChartBackend::new().dashboard(&data, &path)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("No numeric column"));
        assert!(text.contains("Ankara"));
        Ok(())
    }
}
