//! Oscilloscope-style sweep chart.
//!
//! The chart has a fixed time base: the x axis always spans one window of
//! `window_seconds`, and the live cursor walks left to right across it. Each
//! row shows two traces. The current-cycle trace runs from the left edge up to
//! the cursor; the previous-cycle trace fills the rest of the row with what was
//! drawn during the last pass. An opaque wiper band at the cursor hides the
//! seam between them.
//!
//! Geometry lives in small plain structs (`RowLayout`, `SweepWindow`,
//! `PlotTransform`) so the sample partitioning can be checked without a GPU.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Response, Rounding, Sense, Shape, Stroke};

use crate::display::{ChannelRef, FrameParams, palette_color};
use crate::error::PipelineError;
use crate::ring::RingBuffer;

pub const PREFERRED_ROW_PX: f32 = 64.0;
pub const MIN_ROW_PX: f32 = 14.0;
pub const TOP_PAD_PX: f32 = 8.0;
pub const LABEL_MARGIN_PX: f32 = 56.0;
pub const WIPER_WIDTH_PX: f32 = 6.0;

const MIN_WINDOW_SECONDS: f64 = 1e-3;
const WIPER_FALLBACK: Color32 = Color32::from_rgb(16, 16, 16);
const TRACE_WIDTH: f32 = 1.0;

/// Vertical layout of channel rows in plot space (y grows upwards, 1 unit = 1 px).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowLayout {
    pub rows: usize,
    pub row_height: f32,
    available_height: f32,
    top_pad: f32,
}

impl RowLayout {
    pub fn new(available_height: f32, top_pad: f32, visible_count: usize) -> Self {
        let rows = visible_count.max(1);
        let available_height = available_height.max(0.0);
        let usable = (available_height - top_pad).max(0.0);
        let row_height = (usable / rows as f32).max(MIN_ROW_PX).min(PREFERRED_ROW_PX);
        Self {
            rows,
            row_height,
            available_height,
            top_pad,
        }
    }

    /// Plot-space y of the centre line of `row`, counting rows from the top.
    pub fn baseline(&self, row: usize) -> f32 {
        self.available_height - self.top_pad - self.row_height * (row as f32 + 0.5)
    }
}

/// Where a sample lands relative to the sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Older than the previous cycle.
    Before,
    /// Previous cycle, not yet overtaken by the cursor; carries the in-window position.
    Previous(f64),
    /// Current cycle, behind the cursor; carries the in-window position.
    Current(f64),
    /// Overwritten part of the previous cycle, or current-cycle data ahead of the cursor.
    Hidden,
    /// Newer than the current cycle.
    After,
}

/// Cycle arithmetic for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepWindow {
    pub window_seconds: f64,
    pub cycle_index: i64,
    pub cursor_x: f64,
    pub epsilon: f64,
}

impl SweepWindow {
    pub fn new(params: &FrameParams) -> Result<Self, PipelineError> {
        if params.sample_rate_hz == 0 {
            return Err(PipelineError::InvalidSampleRate(params.sample_rate_hz));
        }
        let window_seconds = params.window_seconds.max(MIN_WINDOW_SECONDS);
        let cycle_index = (params.playhead_seconds / window_seconds).floor() as i64;
        Ok(Self {
            window_seconds,
            cycle_index,
            cursor_x: params.playhead_seconds - cycle_index as f64 * window_seconds,
            epsilon: 0.5 / f64::from(params.sample_rate_hz),
        })
    }

    pub fn cycle_start(&self, cycle: i64) -> f64 {
        cycle as f64 * self.window_seconds
    }

    fn cycle_of(&self, timestamp: f64) -> i64 {
        ((timestamp + self.epsilon) / self.window_seconds).floor() as i64
    }

    /// Earliest timestamp that can land in the previous cycle.
    pub fn scan_start(&self) -> f64 {
        self.cycle_start(self.cycle_index - 1) - self.epsilon
    }

    pub fn place(&self, timestamp: f64) -> Placement {
        let cycle = self.cycle_of(timestamp);
        let position = timestamp - self.cycle_start(cycle);
        let edge = self.cursor_x - self.epsilon;
        if cycle < self.cycle_index - 1 {
            Placement::Before
        } else if cycle > self.cycle_index {
            Placement::After
        } else if cycle == self.cycle_index {
            if position < edge {
                Placement::Current(position)
            } else {
                Placement::Hidden
            }
        } else if position >= edge {
            Placement::Previous(position)
        } else {
            Placement::Hidden
        }
    }
}

/// Maps (seconds-within-window, plot-space y) onto screen pixels.
#[derive(Clone, Copy, Debug)]
pub struct PlotTransform {
    rect: Rect,
    left_pad_time: f64,
    px_per_second: f64,
}

impl PlotTransform {
    pub fn new(rect: Rect, window_seconds: f64) -> Self {
        let width = f64::from(rect.width().max(1.0));
        let usable = (width - f64::from(LABEL_MARGIN_PX)).max(1.0);
        let window_seconds = window_seconds.max(MIN_WINDOW_SECONDS);
        let left_pad_time = window_seconds * f64::from(LABEL_MARGIN_PX) / usable;
        Self {
            rect,
            left_pad_time,
            px_per_second: width / (window_seconds + left_pad_time),
        }
    }

    pub fn left_pad_time(&self) -> f64 {
        self.left_pad_time
    }

    pub fn x(&self, seconds: f64) -> f32 {
        self.rect.left() + ((seconds + self.left_pad_time) * self.px_per_second) as f32
    }

    pub fn y(&self, plot_y: f32) -> f32 {
        self.rect.bottom() - plot_y
    }
}

/// Ring-buffer channel drawn on `row`.
///
/// A selected channel's hardware index wins when the buffer has that channel.
/// Otherwise the row index itself is used, and a row past the buffer's channel
/// count has no trace at all.
pub fn resolve_channel(row: usize, selected: &[ChannelRef], channel_count: usize) -> Option<usize> {
    let mapped = selected
        .get(row)
        .and_then(|channel| channel.hardware_index)
        .filter(|index| *index < channel_count);
    match mapped {
        Some(index) => Some(index),
        None if row < channel_count => Some(row),
        None => None,
    }
}

pub fn row_label(row: usize, selected: &[ChannelRef], channel: Option<usize>) -> String {
    match selected.get(row) {
        Some(channel_ref) if !channel_ref.display_name.trim().is_empty() => {
            channel_ref.display_name.clone()
        }
        _ => format!("Ch {}", channel.unwrap_or(row) + 1),
    }
}

/// Splits one channel's buffered samples into previous- and current-cycle points.
///
/// Points are `(seconds within window, value)` in acquisition order.
pub fn partition_row(
    ring: &RingBuffer,
    channel: usize,
    sweep: &SweepWindow,
    previous: &mut Vec<(f64, f32)>,
    current: &mut Vec<(f64, f32)>,
) {
    previous.clear();
    current.clear();
    for offset in ring.lower_bound(sweep.scan_start())..ring.len() {
        let timestamp = ring.timestamp_at(offset);
        match sweep.place(timestamp) {
            Placement::Before | Placement::Hidden => {}
            Placement::After => break,
            Placement::Previous(x) => previous.push((x, ring.value_at(channel, offset))),
            Placement::Current(x) => current.push((x, ring.value_at(channel, offset))),
        }
    }
}

/// Reusable sweep renderer; keeps its scratch buffers between frames.
#[derive(Default)]
pub struct SweepChart {
    previous: Vec<(f64, f32)>,
    current: Vec<(f64, f32)>,
}

impl SweepChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        ring: &RingBuffer,
        frame: &FrameParams,
        selected: &[ChannelRef],
    ) -> Response {
        let desired = egui::vec2(
            ui.available_width().max(LABEL_MARGIN_PX + 100.0),
            ui.available_height().max(PREFERRED_ROW_PX + TOP_PAD_PX),
        );
        let (rect, response) = ui.allocate_exact_size(desired, Sense::hover());
        let painter = ui.painter_at(rect);
        let visuals = ui.visuals();
        let background = visuals.extreme_bg_color;
        let wiper = if background.a() == 0 {
            WIPER_FALLBACK
        } else {
            background
        };
        let style = ChartStyle {
            background,
            wiper,
            grid: visuals.faint_bg_color,
            text: visuals.text_color(),
        };
        self.paint(&painter, rect, &style, ring, frame, selected);
        response
    }

    fn paint(
        &mut self,
        painter: &Painter,
        rect: Rect,
        style: &ChartStyle,
        ring: &RingBuffer,
        frame: &FrameParams,
        selected: &[ChannelRef],
    ) {
        painter.rect_filled(rect, Rounding::same(4.0), style.background);

        let sweep = match SweepWindow::new(frame) {
            Ok(sweep) => sweep,
            Err(err) => {
                log::error!("sweep chart disabled: {err}");
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    err.to_string(),
                    FontId::proportional(14.0),
                    Color32::RED,
                );
                return;
            }
        };
        let transform = PlotTransform::new(rect, sweep.window_seconds);
        let visible = if selected.is_empty() {
            ring.channel_count()
        } else {
            selected.len()
        };
        let layout = RowLayout::new(rect.height(), TOP_PAD_PX, visible);
        let plot_left = transform.x(0.0);

        painter.vline(
            plot_left,
            rect.y_range(),
            Stroke::new(1.0, style.grid),
        );

        for row in 0..layout.rows {
            let baseline = layout.baseline(row);
            let screen_baseline = transform.y(baseline);
            painter.hline(
                plot_left..=rect.right(),
                screen_baseline,
                Stroke::new(1.0, style.grid),
            );

            let Some(channel) = resolve_channel(row, selected, ring.channel_count()) else {
                continue;
            };
            let color = selected
                .get(row)
                .map(|channel_ref| channel_ref.resolved_color(row))
                .unwrap_or_else(|| palette_color(row));

            partition_row(ring, channel, &sweep, &mut self.previous, &mut self.current);
            for points in [&self.previous, &self.current] {
                if points.len() < 2 {
                    continue;
                }
                let line: Vec<Pos2> = points
                    .iter()
                    .map(|(x, value)| {
                        Pos2::new(
                            transform.x(*x),
                            transform.y(baseline + frame.gain * value),
                        )
                    })
                    .collect();
                painter.add(Shape::line(line, Stroke::new(TRACE_WIDTH, color)));
            }
        }

        let cursor = transform.x(sweep.cursor_x);
        painter.rect_filled(
            Rect::from_min_max(
                Pos2::new(cursor, rect.top()),
                Pos2::new(cursor + WIPER_WIDTH_PX, rect.bottom()),
            ),
            Rounding::ZERO,
            style.wiper,
        );

        for row in 0..layout.rows {
            let channel = resolve_channel(row, selected, ring.channel_count());
            painter.text(
                Pos2::new(plot_left - 6.0, transform.y(layout.baseline(row))),
                Align2::RIGHT_CENTER,
                row_label(row, selected, channel),
                FontId::monospace(12.0),
                style.text,
            );
        }
    }
}

struct ChartStyle {
    background: Color32,
    wiper: Color32,
    grid: Color32,
    text: Color32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(window_seconds: f64, sample_rate_hz: u32, playhead_seconds: f64) -> FrameParams {
        FrameParams {
            window_seconds,
            gain: 1.0,
            playhead_seconds,
            sample_rate_hz,
        }
    }

    fn filled_ring(sample_rate_hz: u32, buffer_seconds: f64, samples: usize) -> RingBuffer {
        let mut ring = RingBuffer::new(sample_rate_hz, buffer_seconds, 2).unwrap();
        for n in 0..samples {
            ring.push(&[n as f32, -(n as f32)]);
        }
        ring
    }

    fn sample_times(points: &[(f64, f32)], cycle_start: f64) -> Vec<f64> {
        points.iter().map(|(x, _)| cycle_start + x).collect()
    }

    #[test]
    fn single_row_keeps_preferred_height() {
        let layout = RowLayout::new(600.0, TOP_PAD_PX, 1);
        assert_eq!(layout.row_height, PREFERRED_ROW_PX);
    }

    #[test]
    fn many_rows_hit_the_legibility_floor() {
        let layout = RowLayout::new(120.0, 8.0, 100);
        assert_eq!(layout.row_height, MIN_ROW_PX);
    }

    #[test]
    fn rows_shrink_between_floor_and_preference() {
        let layout = RowLayout::new(408.0, 8.0, 10);
        assert_eq!(layout.row_height, 40.0);
        assert_eq!(layout.baseline(0), 408.0 - 8.0 - 20.0);
        assert_eq!(layout.baseline(1), 408.0 - 8.0 - 60.0);
    }

    #[test]
    fn zero_rows_still_lays_out_one() {
        let layout = RowLayout::new(0.0, 8.0, 0);
        assert_eq!(layout.rows, 1);
        assert!(layout.row_height.is_finite());
    }

    #[test]
    fn cycle_math_matches_playhead() {
        let sweep = SweepWindow::new(&frame(10.0, 20, 23.5)).unwrap();
        assert_eq!(sweep.cycle_index, 2);
        assert!((sweep.cursor_x - 3.5).abs() < 1e-12);
        assert!((sweep.epsilon - 0.025).abs() < 1e-12);
    }

    #[test]
    fn zero_sample_rate_is_an_error() {
        assert_eq!(
            SweepWindow::new(&frame(10.0, 0, 1.0)).unwrap_err(),
            PipelineError::InvalidSampleRate(0)
        );
    }

    #[test]
    fn zero_window_is_floored() {
        let sweep = SweepWindow::new(&frame(0.0, 100, 5.0)).unwrap();
        assert!(sweep.window_seconds > 0.0);
        assert!(sweep.cursor_x.is_finite());
    }

    #[test]
    fn sweep_partition_splits_at_cursor() {
        // 470 samples at 20 Hz: timestamps 0.00 ..= 23.45, playhead 23.5
        let ring = filled_ring(20, 30.0, 470);
        assert!((ring.clock_now() - 23.5).abs() < 1e-9);
        let sweep = SweepWindow::new(&frame(10.0, 20, ring.clock_now())).unwrap();
        let (mut previous, mut current) = (Vec::new(), Vec::new());
        partition_row(&ring, 0, &sweep, &mut previous, &mut current);

        let current_times = sample_times(&current, 20.0);
        assert_eq!(current_times.len(), 70);
        assert!((current_times[0] - 20.0).abs() < 1e-9);
        assert!((current_times[69] - 23.45).abs() < 1e-9);
        assert_eq!(current[0].1, 400.0);

        let previous_times = sample_times(&previous, 10.0);
        assert_eq!(previous_times.len(), 130);
        assert!((previous_times[0] - 13.5).abs() < 1e-9);
        assert!((previous_times[129] - 19.95).abs() < 1e-9);
        assert_eq!(previous[0].1, 270.0);
        assert!(previous.iter().all(|(x, _)| *x >= 3.5 - 1e-9));
    }

    #[test]
    fn sweep_partition_survives_buffer_wrap() {
        // 15 s buffer only holds 8.5 ..= 23.45
        let ring = filled_ring(20, 15.0, 470);
        assert!(ring.is_filled());
        let sweep = SweepWindow::new(&frame(10.0, 20, ring.clock_now())).unwrap();
        let (mut previous, mut current) = (Vec::new(), Vec::new());
        partition_row(&ring, 1, &sweep, &mut previous, &mut current);
        assert_eq!(current.len(), 70);
        assert_eq!(previous.len(), 130);
        assert_eq!(current[0].1, -400.0);
    }

    #[test]
    fn cursor_at_cycle_start_shows_whole_previous_cycle() {
        let ring = filled_ring(20, 30.0, 400);
        let sweep = SweepWindow::new(&frame(10.0, 20, ring.clock_now())).unwrap();
        let (mut previous, mut current) = (Vec::new(), Vec::new());
        partition_row(&ring, 0, &sweep, &mut previous, &mut current);
        assert!(current.is_empty());
        assert_eq!(previous.len(), 200);
    }

    #[test]
    fn first_cycle_has_no_previous_trace() {
        let ring = filled_ring(20, 30.0, 60);
        let sweep = SweepWindow::new(&frame(10.0, 20, ring.clock_now())).unwrap();
        let (mut previous, mut current) = (Vec::new(), Vec::new());
        partition_row(&ring, 0, &sweep, &mut previous, &mut current);
        assert!(previous.is_empty());
        assert_eq!(current.len(), 60);
    }

    #[test]
    fn frozen_playhead_hides_samples_ahead_of_cursor() {
        let ring = filled_ring(20, 30.0, 300);
        let sweep = SweepWindow::new(&frame(10.0, 20, 12.0)).unwrap();
        let (mut previous, mut current) = (Vec::new(), Vec::new());
        partition_row(&ring, 0, &sweep, &mut previous, &mut current);
        assert_eq!(current.len(), 40);
        assert_eq!(previous.len(), 160);
    }

    #[test]
    fn empty_ring_yields_no_points() {
        let ring = RingBuffer::new(20, 10.0, 2).unwrap();
        let sweep = SweepWindow::new(&frame(10.0, 20, 0.0)).unwrap();
        let (mut previous, mut current) = (vec![(1.0, 1.0)], vec![(1.0, 1.0)]);
        partition_row(&ring, 0, &sweep, &mut previous, &mut current);
        assert!(previous.is_empty());
        assert!(current.is_empty());
    }

    #[test]
    fn transform_reserves_label_margin() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 0.0), egui::vec2(556.0, 200.0));
        let transform = PlotTransform::new(rect, 10.0);
        assert!((transform.x(0.0) - (10.0 + LABEL_MARGIN_PX)).abs() < 1e-3);
        assert!((transform.x(10.0) - rect.right()).abs() < 1e-3);
        assert!((transform.x(-transform.left_pad_time()) - rect.left()).abs() < 1e-3);
        assert_eq!(transform.y(0.0), rect.bottom());
        assert_eq!(transform.y(50.0), rect.bottom() - 50.0);
    }

    #[test]
    fn channel_resolution_falls_back_to_row() {
        let selected = vec![
            ChannelRef::new("Fp1", 3),
            ChannelRef::new("Bad", 42),
            ChannelRef {
                display_name: "Unmapped".into(),
                color: None,
                hardware_index: None,
            },
            ChannelRef::new("Extra", 99),
        ];
        assert_eq!(resolve_channel(0, &selected, 4), Some(3));
        assert_eq!(resolve_channel(1, &selected, 4), Some(1));
        assert_eq!(resolve_channel(2, &selected, 4), Some(2));
        assert_eq!(resolve_channel(3, &selected, 3), None);
        assert_eq!(resolve_channel(2, &[], 4), Some(2));
        assert_eq!(resolve_channel(5, &[], 4), None);
    }

    #[test]
    fn labels_use_name_or_fallback() {
        let selected = vec![
            ChannelRef::new("O1", 8),
            ChannelRef::new("  ", 2),
        ];
        assert_eq!(row_label(0, &selected, Some(8)), "O1");
        assert_eq!(row_label(1, &selected, Some(2)), "Ch 3");
        assert_eq!(row_label(4, &[], None), "Ch 5");
    }

    fn render(ring: &RingBuffer, params: FrameParams, selected: &[ChannelRef]) -> Vec<Shape> {
        render_with(ring, params, selected, |_| {}).0
    }

    fn render_with(
        ring: &RingBuffer,
        params: FrameParams,
        selected: &[ChannelRef],
        tweak: impl FnOnce(&mut egui::Visuals),
    ) -> (Vec<Shape>, Rect) {
        let ctx = egui::Context::default();
        let mut style = (*ctx.style()).clone();
        tweak(&mut style.visuals);
        ctx.set_style(style);

        let mut chart = SweepChart::new();
        let mut chart_rect = Rect::NOTHING;
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0))),
            ..Default::default()
        };
        let output = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                chart_rect = chart.show(ui, ring, &params, selected).rect;
            });
        });
        let shapes = output.shapes.into_iter().map(|clipped| clipped.shape).collect();
        (shapes, chart_rect)
    }

    fn wiper(shapes: &[Shape]) -> (usize, &egui::epaint::RectShape) {
        shapes
            .iter()
            .enumerate()
            .find_map(|(index, shape)| match shape {
                Shape::Rect(rect) if (rect.rect.width() - WIPER_WIDTH_PX).abs() < 1e-3 => {
                    Some((index, rect))
                }
                _ => None,
            })
            .expect("wiper band is painted")
    }

    fn trace_count(shapes: &[Shape]) -> usize {
        shapes
            .iter()
            .filter(|shape| matches!(shape, Shape::Path(_)))
            .count()
    }

    #[test]
    fn empty_buffer_renders_without_traces() {
        let ring = RingBuffer::new(250, 10.0, 4).unwrap();
        let shapes = render(&ring, frame(10.0, 250, 0.0), &[]);
        assert_eq!(trace_count(&shapes), 0);
        assert!(shapes.iter().any(|shape| matches!(shape, Shape::Rect(_))));
    }

    #[test]
    fn populated_buffer_renders_both_traces_per_row() {
        let ring = filled_ring(20, 30.0, 470);
        let selected = vec![ChannelRef::new("A", 0), ChannelRef::new("B", 1)];
        let shapes = render(&ring, frame(10.0, 20, ring.clock_now()), &selected);
        assert_eq!(trace_count(&shapes), 4);
    }

    #[test]
    fn wiper_sits_at_cursor_between_traces_and_labels() {
        let ring = filled_ring(20, 30.0, 470);
        let selected = vec![ChannelRef::new("A", 0), ChannelRef::new("B", 1)];
        let params = frame(10.0, 20, ring.clock_now());
        let (shapes, chart_rect) = render_with(&ring, params, &selected, |_| {});

        let (index, band) = wiper(&shapes);
        let sweep = SweepWindow::new(&params).unwrap();
        let cursor = PlotTransform::new(chart_rect, sweep.window_seconds).x(sweep.cursor_x);
        assert!((band.rect.min.x - cursor).abs() < 1e-3);
        assert!((band.rect.height() - chart_rect.height()).abs() < 1e-3);
        assert_eq!(band.fill.a(), 255);

        let last_trace = shapes
            .iter()
            .rposition(|shape| matches!(shape, Shape::Path(_)))
            .unwrap();
        let first_label = shapes
            .iter()
            .position(|shape| matches!(shape, Shape::Text(_)))
            .unwrap();
        assert!(last_trace < index, "wiper must cover the traces");
        assert!(index < first_label, "labels must stay above the wiper");
    }

    #[test]
    fn transparent_background_uses_fallback_wiper() {
        let ring = filled_ring(20, 30.0, 470);
        let (shapes, _) = render_with(&ring, frame(10.0, 20, ring.clock_now()), &[], |visuals| {
            visuals.extreme_bg_color = Color32::TRANSPARENT;
        });
        let (_, band) = wiper(&shapes);
        assert_eq!(band.fill, WIPER_FALLBACK);
    }
}
