//! Interactive HTML charts rendered with plotly.
//!
//! The candlestick and indicator layouts mirror the usual A-share
//! conventions: volume bars are red on up days and green on down days,
//! RSI carries 70/30 guides and KDJ 80/20 guides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotly::common::{DashType, Line, Marker, Mode, Title};
use plotly::layout::{Axis, GridPattern, LayoutGrid, RangeSlider};
use plotly::{Bar, Candlestick, HeatMap, Layout, Plot, Scatter};
use tracing::info;

use crate::analysis::{normalized_performance, CorrelationMatrix};
use crate::config::AppConfig;
use crate::indicators::IndicatorFrame;
use crate::models::DailyBar;
use crate::utils::display_date;

const UP_COLOR: &str = "red";
const DOWN_COLOR: &str = "green";
const GUIDE_HIGH_COLOR: &str = "red";
const GUIDE_LOW_COLOR: &str = "green";
const NEUTRAL_COLOR: &str = "gray";

const MA_COLORS: [(&str, &str); 4] = [
    ("MA5", "orange"),
    ("MA10", "royalblue"),
    ("MA20", "purple"),
    ("MA60", "brown"),
];

/// Builds charts sized per the configuration and writes them under the
/// charts directory.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    charts_dir: PathBuf,
    width: usize,
    height: usize,
}

impl ChartBuilder {
    pub fn new(charts_dir: impl Into<PathBuf>, width: usize, height: usize) -> Self {
        ChartBuilder {
            charts_dir: charts_dir.into(),
            width,
            height,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        ChartBuilder::new(&config.charts_dir, config.chart_width, config.chart_height)
    }

    /// Candlestick chart with moving-average overlays and a volume
    /// subpanel.
    pub fn kline_chart(&self, title: &str, bars: &[DailyBar], frame: &IndicatorFrame) -> Plot {
        let dates = chart_dates(bars);
        let mut plot = Plot::new();

        // Traces without an axis assignment land on the first grid cell.
        let candles = Candlestick::new(
            dates.clone(),
            bars.iter().map(|b| b.open).collect(),
            bars.iter().map(|b| b.high).collect(),
            bars.iter().map(|b| b.low).collect(),
            bars.iter().map(|b| b.close).collect(),
        )
        .name("price");
        plot.add_trace(Box::new(candles));

        let ma_series = [&frame.ma5, &frame.ma10, &frame.ma20, &frame.ma60];
        for ((name, color), series) in MA_COLORS.iter().zip(ma_series) {
            if let Some(trace) = opt_line(&dates, series, name, color, None) {
                plot.add_trace(trace);
            }
        }

        let volume_colors: Vec<&str> = bars
            .iter()
            .map(|b| if b.is_up() { UP_COLOR } else { DOWN_COLOR })
            .collect();
        let volume = Bar::new(dates, bars.iter().map(|b| b.vol).collect())
            .name("volume")
            .marker(Marker::new().color_array(volume_colors))
            .x_axis("x2")
            .y_axis("y2");
        plot.add_trace(volume);

        let layout = self
            .base_layout(title)
            .grid(
                LayoutGrid::new()
                    .rows(2)
                    .columns(1)
                    .pattern(GridPattern::Independent),
            )
            .x_axis(Axis::new().range_slider(RangeSlider::new().visible(false)))
            .y_axis(Axis::new().title(Title::new("price")))
            .y_axis2(Axis::new().title(Title::new("volume")));
        plot.set_layout(layout);
        plot
    }

    /// Four stacked indicator panels: MACD, RSI, KDJ and the close with
    /// its Bollinger bands.
    pub fn indicator_panel(&self, title: &str, bars: &[DailyBar], frame: &IndicatorFrame) -> Plot {
        let dates = chart_dates(bars);
        let n = dates.len();
        let mut plot = Plot::new();

        // MACD: histogram bars under the two lines.
        let histogram = Bar::new(dates.clone(), frame.macd.histogram.clone())
            .name("histogram")
            .x_axis("x1")
            .y_axis("y1");
        plot.add_trace(histogram);
        plot.add_trace(
            line(&dates, &frame.macd.macd, "MACD", "royalblue")
                .x_axis("x1")
                .y_axis("y1"),
        );
        plot.add_trace(
            line(&dates, &frame.macd.signal, "signal", "orange")
                .x_axis("x1")
                .y_axis("y1"),
        );

        // RSI with its overbought/oversold guides.
        if let Some(trace) = opt_line(&dates, &frame.rsi14, "RSI", "purple", None) {
            plot.add_trace(trace.x_axis("x2").y_axis("y2"));
        }
        for (level, color, dash) in [
            (70.0, GUIDE_HIGH_COLOR, DashType::Dash),
            (30.0, GUIDE_LOW_COLOR, DashType::Dash),
            (50.0, NEUTRAL_COLOR, DashType::Dot),
        ] {
            plot.add_trace(guide_line(&dates, level, n, color, dash).x_axis("x2").y_axis("y2"));
        }

        // KDJ with 80/20 guides.
        for (series, name, color) in [
            (&frame.kdj.k, "K", "royalblue"),
            (&frame.kdj.d, "D", "orange"),
            (&frame.kdj.j, "J", "purple"),
        ] {
            if let Some(trace) = opt_line(&dates, series, name, color, None) {
                plot.add_trace(trace.x_axis("x3").y_axis("y3"));
            }
        }
        for (level, color) in [(80.0, GUIDE_HIGH_COLOR), (20.0, GUIDE_LOW_COLOR)] {
            plot.add_trace(
                guide_line(&dates, level, n, color, DashType::Dash)
                    .x_axis("x3")
                    .y_axis("y3"),
            );
        }

        // Close price inside the Bollinger bands.
        plot.add_trace(
            line(
                &dates,
                &bars.iter().map(|b| b.close).collect::<Vec<f64>>(),
                "close",
                "black",
            )
            .x_axis("x4")
            .y_axis("y4"),
        );
        for (series, name) in [
            (&frame.boll.upper, "upper band"),
            (&frame.boll.middle, "middle band"),
            (&frame.boll.lower, "lower band"),
        ] {
            if let Some(trace) = opt_line(&dates, series, name, NEUTRAL_COLOR, Some(DashType::Dash))
            {
                plot.add_trace(trace.x_axis("x4").y_axis("y4"));
            }
        }

        let layout = self
            .base_layout(title)
            .grid(
                LayoutGrid::new()
                    .rows(4)
                    .columns(1)
                    .pattern(GridPattern::Independent),
            )
            .y_axis(Axis::new().title(Title::new("MACD")))
            .y_axis2(Axis::new().title(Title::new("RSI")).range(vec![0.0, 100.0]))
            .y_axis3(Axis::new().title(Title::new("KDJ")))
            .y_axis4(Axis::new().title(Title::new("price")));
        plot.set_layout(layout);
        plot
    }

    /// Normalized close performance of several codes on one canvas.
    pub fn comparison_chart(&self, title: &str, series: &[(String, Vec<DailyBar>)]) -> Plot {
        let mut plot = Plot::new();

        for (code, bars) in series {
            let dates = chart_dates(bars);
            let normalized = normalized_performance(bars);
            plot.add_trace(
                Scatter::new(dates, normalized)
                    .mode(Mode::Lines)
                    .name(code)
                    .line(Line::new().width(2.0)),
            );
        }

        let layout = self
            .base_layout(title)
            .y_axis(Axis::new().title(Title::new("change (%)")));
        plot.set_layout(layout);
        plot
    }

    /// Correlation heatmap over the close prices of the compared codes.
    pub fn correlation_heatmap(&self, title: &str, matrix: &CorrelationMatrix) -> Plot {
        let z: Vec<Vec<f64>> = matrix
            .values
            .iter()
            .map(|row| row.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();

        let mut plot = Plot::new();
        plot.add_trace(HeatMap::new(matrix.codes.clone(), matrix.codes.clone(), z));
        plot.set_layout(self.base_layout(title));
        plot
    }

    /// Write a chart as a standalone HTML file under the charts
    /// directory, returning the full path.
    pub fn save(&self, plot: &Plot, filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.charts_dir).with_context(|| {
            format!("creating charts directory {}", self.charts_dir.display())
        })?;
        let path = self.charts_dir.join(filename);
        plot.write_html(&path);
        info!(path = %path.display(), "chart written");
        Ok(path)
    }

    pub fn chart_path(&self, filename: &str) -> PathBuf {
        self.charts_dir.join(filename)
    }

    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }

    fn base_layout(&self, title: &str) -> Layout {
        Layout::new()
            .title(Title::new(title))
            .width(self.width)
            .height(self.height)
    }
}

fn chart_dates(bars: &[DailyBar]) -> Vec<String> {
    bars.iter().map(|b| display_date(&b.trade_date)).collect()
}

fn line(
    dates: &[String],
    values: &[f64],
    name: &str,
    color: &'static str,
) -> Box<Scatter<String, f64>> {
    Scatter::new(dates.to_vec(), values.to_vec())
        .mode(Mode::Lines)
        .name(name)
        .line(Line::new().color(color).width(1.5))
}

/// Line over only the defined slots of a gappy series. Returns `None`
/// when nothing is defined yet.
fn opt_line(
    dates: &[String],
    series: &[Option<f64>],
    name: &str,
    color: &'static str,
    dash: Option<DashType>,
) -> Option<Box<Scatter<String, f64>>> {
    let (x, y): (Vec<String>, Vec<f64>) = dates
        .iter()
        .zip(series)
        .filter_map(|(date, value)| value.map(|v| (date.clone(), v)))
        .unzip();
    if y.is_empty() {
        return None;
    }

    let mut style = Line::new().color(color).width(1.5);
    if let Some(dash) = dash {
        style = style.dash(dash);
    }
    Some(Scatter::new(x, y).mode(Mode::Lines).name(name).line(style))
}

fn guide_line(
    dates: &[String],
    level: f64,
    n: usize,
    color: &'static str,
    dash: DashType,
) -> Box<Scatter<String, f64>> {
    Scatter::new(dates.to_vec(), vec![level; n])
        .mode(Mode::Lines)
        .line(Line::new().color(color).width(1.0).dash(dash))
        .show_legend(false)
}
