use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::{Result, TrackerError};
use crate::reconcile::MemberTotal;

#[derive(Clone, Debug)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Volunteer Hours".to_string(),
            x_label: "Member".to_string(),
            y_label: "Hours".to_string(),
            width: 1024,
            height: 640,
        }
    }
}

fn chart_err<E: std::fmt::Display>(err: E) -> TrackerError {
    TrackerError::Chart(err.to_string())
}

/// Draws one bar per member, in the order given.
///
/// The output format follows the file extension (`.png` for the metrics
/// screen).
pub fn save_bar_chart(totals: &[MemberTotal], options: &ChartOptions, path: &Path) -> Result<()> {
    if totals.is_empty() {
        return Err(TrackerError::NothingToChart);
    }
    if let Some(bad) = totals.iter().find(|t| !t.hours.is_finite()) {
        return Err(TrackerError::Chart(format!(
            "hours for {} are not a finite number",
            bad.member
        )));
    }

    let root = BitMapBackend::new(path, (options.width, options.height))
        .into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let max_hours = totals.iter().map(|t| t.hours).fold(0.0_f64, f64::max);
    let y_top = if max_hours > 0.0 { max_hours * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0..totals.len()).into_segmented(), 0.0..y_top)
        .map_err(chart_err)?;

    let member_label = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            totals.get(*i).map(|t| t.member.clone()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(totals.len())
        .x_label_formatter(&member_label)
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(10)
                .data(totals.iter().enumerate().map(|(i, t)| (i, t.hours))),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), members = totals.len(), "rendered hours chart");
    Ok(())
}

/// Renders the chart to PNG bytes through a scratch file
pub fn bar_chart_png(totals: &[MemberTotal], options: &ChartOptions) -> Result<Vec<u8>> {
    let scratch = tempfile::Builder::new()
        .prefix("voluntracker-chart")
        .suffix(".png")
        .tempfile()?;
    save_bar_chart(totals, options, scratch.path())?;
    Ok(std::fs::read(scratch.path())?)
}
