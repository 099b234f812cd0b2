use crate::error::{drawing, PlotError};
use plotters::{
    chart::ChartBuilder,
    prelude::{Circle, IntoDrawingArea, PathElement, Rectangle, SVGBackend},
    series::{LineSeries, PointSeries},
    style::{Color, IntoFont, ShapeStyle, BLACK, BLUE, RED, WHITE},
};
use quickeda_core::{BarChart, ScatterChart};
use std::ops::Range;
use tracing::instrument;

/// Share of the data span added on each side of an axis
const AXIS_PADDING: f64 = 0.05;

/// Axis range covering `values`, padded so points do not sit on the frame
fn axis_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    if max == min {
        return Some(min - 1.0..max + 1.0);
    }
    let pad = (max - min) * AXIS_PADDING;
    Some(min - pad..max + pad)
}

/// Scatter of the observations with the least-squares line
#[instrument(skip_all, level = "debug")]
pub(crate) fn scatter_svg(
    chart: &ScatterChart,
    (width, height): (u32, u32),
) -> Result<String, PlotError> {
    let points: Vec<(f64, f64)> = chart
        .x
        .iter()
        .zip(&chart.y)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let x_range = axis_range(points.iter().map(|p| p.0))
        .ok_or_else(|| PlotError::EmptyChart(chart.title()))?;
    let y_range = axis_range(points.iter().map(|p| p.1))
        .ok_or_else(|| PlotError::EmptyChart(chart.title()))?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let mut ctx = ChartBuilder::on(&root)
            .x_label_area_size(35)
            .y_label_area_size(40)
            .margin(5)
            .caption(chart.title(), ("sans-serif", 30.0).into_font())
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc(chart.feature.as_str())
            .y_desc(chart.label.as_str())
            .draw()
            .map_err(drawing)?;

        let ps: PointSeries<_, _, Circle<_, _>, _> =
            PointSeries::new(points.iter().copied(), 3, ShapeStyle::from(&BLUE).filled());
        ctx.draw_series(ps)
            .map_err(drawing)?
            .label("observed")
            .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

        if let Some((from, to)) = chart.fitted_line() {
            let stats = &chart.regression;
            ctx.draw_series(LineSeries::new(vec![from, to], &RED))
                .map_err(drawing)?
                .label(format!(
                    "y = {:.3} + {:.3}x (R² = {:.3}, p = {:.3})",
                    stats.intercept, stats.slope, stats.r_squared, stats.p_value
                ))
                .legend(|(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], RED));
        }

        ctx.configure_series_labels()
            .background_style(WHITE)
            .border_style(BLACK)
            .draw()
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
    }

    Ok(svg)
}

/// Bars of the label mean per group, captioned with the ANOVA result
#[instrument(skip_all, level = "debug")]
pub(crate) fn bar_svg(chart: &BarChart, (width, height): (u32, u32)) -> Result<String, PlotError> {
    let groups = &chart.stats.groups;
    if groups.is_empty() {
        return Err(PlotError::EmptyChart(chart.title()));
    }

    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let x_range = -0.5..groups.len() as f64 - 0.5;
    // Bars start at zero, so zero is always on the axis
    let y_range = axis_range(groups.iter().map(|g| g.mean).chain(std::iter::once(0.0)))
        .ok_or_else(|| PlotError::EmptyChart(chart.title()))?;

    let anova = &chart.stats.anova;
    let caption = format!(
        "{} (F = {:.3}, p = {:.3})",
        chart.title(),
        anova.f_statistic,
        anova.p_value
    );

    let label_of = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 {
            names.get(i as usize).map(|s| s.to_string()).unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let mut ctx = ChartBuilder::on(&root)
            .x_label_area_size(35)
            .y_label_area_size(40)
            .margin(5)
            .caption(caption, ("sans-serif", 24.0).into_font())
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len())
            .x_label_formatter(&label_of)
            .x_desc(chart.feature.as_str())
            .y_desc(format!("mean {}", chart.label))
            .draw()
            .map_err(drawing)?;

        ctx.draw_series(groups.iter().enumerate().map(|(i, g)| {
            let center = i as f64;
            Rectangle::new(
                [(center - 0.4, 0.0), (center + 0.4, g.mean)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(drawing)?;

        root.present().map_err(drawing)?;
    }

    Ok(svg)
}
