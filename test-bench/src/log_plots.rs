//! PNG charts of a recorded sensor log.
//!
//! Heights (LIDAR, both ultrasonics and the dashed average) share one chart;
//! tilt gets its own. The x axis is the sample number within the log.

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use emi_protocol::Channel;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use shared::LogReplay;
use tracing::info;

pub const HEIGHTS_FILE: &str = "heights.png";
pub const TILT_FILE: &str = "tilt.png";

const HEIGHTS_SIZE: (u32, u32) = (1200, 600);
const TILT_SIZE: (u32, u32) = (1200, 400);

/// Channels drawn on the heights chart, in legend order.
pub const HEIGHT_CHANNELS: [Channel; 4] = [
    Channel::Lidar,
    Channel::Ultrasonic1,
    Channel::Ultrasonic2,
    Channel::Average,
];

fn channel_color(channel: Channel) -> RGBColor {
    match channel {
        Channel::Lidar => BLUE,
        Channel::Ultrasonic1 => GREEN,
        Channel::Ultrasonic2 => RED,
        Channel::Average => BLACK,
        Channel::Tilt => RGBColor(255, 165, 0),
    }
}

/// Y range covering `bounds` with a 5% margin on each side.
///
/// Flat data gets a unit margin. Missing data, and bounds whose span or
/// margin is not finite, fall back to `0..1`, so the chart always has a
/// finite, non-empty range.
pub fn padded_range(bounds: Option<(f64, f64)>) -> Range<f64> {
    const FALLBACK: Range<f64> = 0.0..1.0;

    let Some((lo, hi)) = bounds else {
        return FALLBACK;
    };
    let span = hi - lo;
    if !span.is_finite() {
        return FALLBACK;
    }

    let range = if span < f64::EPSILON {
        (lo - 1.0)..(hi + 1.0)
    } else {
        let margin = span * 0.05;
        (lo - margin)..(hi + margin)
    };

    if range.start.is_finite() && range.end.is_finite() {
        range
    } else {
        FALLBACK
    }
}

/// X range spanning sample numbers `0..len-1`; at least one unit wide.
pub fn sample_range(len: usize) -> Range<f64> {
    0.0..(len.saturating_sub(1).max(1) as f64)
}

/// `(sample number, value)` points for one channel.
pub fn sample_points(replay: &LogReplay, channel: Channel) -> Vec<(f64, f64)> {
    replay
        .series(channel)
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

/// Draw the heights chart to `path`.
pub fn plot_heights(replay: &LogReplay, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, HEIGHTS_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_range = padded_range(replay.value_range(&HEIGHT_CHANNELS));
    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Sensor Heights Over Samples",
            ("sans-serif", 28).into_font().color(&BLACK),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(sample_range(replay.len()), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Sample Number")
        .y_desc("Height (inches)")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 14))
        .draw()?;

    for channel in HEIGHT_CHANNELS {
        let color = channel_color(channel);
        let points = sample_points(replay, channel);

        if channel == Channel::Average {
            chart
                .draw_series(DashedLineSeries::new(
                    points,
                    8,
                    6,
                    color.stroke_width(2),
                ))?
                .label(channel.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        } else {
            chart
                .draw_series(LineSeries::new(points, color))?
                .label(channel.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .label_font(("sans-serif", 16))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Draw the tilt chart to `path`.
pub fn plot_tilt(replay: &LogReplay, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, TILT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_range = padded_range(replay.value_range(&[Channel::Tilt]));
    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Tilt Angle Over Samples",
            ("sans-serif", 28).into_font().color(&BLACK),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(sample_range(replay.len()), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Sample Number")
        .y_desc("Tilt (°)")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(LineSeries::new(
        sample_points(replay, Channel::Tilt),
        channel_color(Channel::Tilt).stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

/// Render both charts into `output_dir`, creating it if needed.
///
/// Returns the paths written, heights first.
pub fn render_log_plots(replay: &LogReplay, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let heights = output_dir.join(HEIGHTS_FILE);
    plot_heights(replay, &heights)
        .with_context(|| format!("Failed to draw {}", heights.display()))?;
    info!("Saved heights plot to {}", heights.display());

    let tilt = output_dir.join(TILT_FILE);
    plot_tilt(replay, &tilt).with_context(|| format!("Failed to draw {}", tilt.display()))?;
    info!("Saved tilt plot to {}", tilt.display());

    Ok(vec![heights, tilt])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shared::read_log_from;

    const LOG: &str = "\
Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
2025-03-26 11:23:06.100,10.00,11.00,12.00,11.00,0.50
2025-03-26 11:23:06.200,oops,11.00,12.00,11.00,0.50
2025-03-26 11:23:06.300,20.00,21.00,22.00,21.00,-0.50
";

    #[test]
    fn test_padded_range_adds_margin() {
        let range = padded_range(Some((10.0, 20.0)));
        assert_relative_eq!(range.start, 9.5);
        assert_relative_eq!(range.end, 20.5);
    }

    #[test]
    fn test_padded_range_flat_and_empty() {
        assert_eq!(padded_range(Some((3.0, 3.0))), 2.0..4.0);
        assert_eq!(padded_range(None), 0.0..1.0);
    }

    #[test]
    fn test_padded_range_rejects_non_finite_bounds() {
        assert_eq!(padded_range(Some((f64::NEG_INFINITY, 2.0))), 0.0..1.0);
        assert_eq!(padded_range(Some((1.0, f64::NAN))), 0.0..1.0);
        assert_eq!(padded_range(Some((-1e308, 1e308))), 0.0..1.0);
    }

    #[test]
    fn test_corrupt_values_never_reach_the_chart_range() {
        let log = "\
Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
t0,inf,1,1,1,NaN
t1,2,2,2,2,inf
t2,4,4,4,4,1
";
        let replay = read_log_from(log.as_bytes()).unwrap();
        assert_eq!(replay.skipped_count(), 2);

        let heights = padded_range(replay.value_range(&HEIGHT_CHANNELS));
        assert!(heights.start.is_finite() && heights.end.is_finite());
        assert!(heights.start < heights.end);

        let tilt = padded_range(replay.value_range(&[Channel::Tilt]));
        assert_eq!(tilt, 0.0..2.0);
    }

    #[test]
    fn test_sample_range_never_empty() {
        assert_eq!(sample_range(0), 0.0..1.0);
        assert_eq!(sample_range(1), 0.0..1.0);
        assert_eq!(sample_range(50), 0.0..49.0);
    }

    #[test]
    fn test_sample_points_use_index_of_accepted_rows() {
        let replay = read_log_from(LOG.as_bytes()).unwrap();
        assert_eq!(replay.skipped_count(), 1);

        let points = sample_points(&replay, Channel::Lidar);
        assert_eq!(points, vec![(0.0, 10.0), (1.0, 20.0)]);

        let tilt = sample_points(&replay, Channel::Tilt);
        assert_eq!(tilt, vec![(0.0, 0.5), (1.0, -0.5)]);
    }

    #[test]
    fn test_height_range_excludes_tilt() {
        let replay = read_log_from(LOG.as_bytes()).unwrap();
        let range = padded_range(replay.value_range(&HEIGHT_CHANNELS));
        assert!(range.start > 0.0);
        assert_relative_eq!(range.start, 9.4, epsilon = 1e-9);
        assert_relative_eq!(range.end, 22.6, epsilon = 1e-9);
    }
}
