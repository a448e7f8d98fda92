use std::path::PathBuf;
use std::time::Instant;

use egui::{self, Color32, ComboBox, Layout, Rounding, Stroke};

use crate::chart::SweepChart;
use crate::display::{ChannelRef, GAIN_RANGE, WINDOW_CHOICES, default_montage};
use crate::monitor::{Monitor, RunState};
use crate::settings::{AppSettings, ThemeKind};

const ACCENT: Color32 = Color32::from_rgb(80, 200, 160);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Start,
    Pause,
    Stop,
}

pub struct MonitorApp {
    monitor: Monitor,
    chart: SweepChart,
    montage: Vec<ChannelRef>,
    visible: Vec<bool>,
    settings_path: PathBuf,
    settings: AppSettings,
}

impl MonitorApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        monitor: Monitor,
        settings_path: PathBuf,
        settings: AppSettings,
    ) -> Self {
        apply_theme(&cc.egui_ctx, settings.theme);
        let montage = default_montage(monitor.ring().channel_count());
        let visible = vec![true; montage.len()];
        Self {
            monitor,
            chart: SweepChart::new(),
            montage,
            visible,
            settings_path,
            settings,
        }
    }

    fn selected_channels(&self) -> Vec<ChannelRef> {
        self.montage
            .iter()
            .zip(&self.visible)
            .filter(|(_, shown)| **shown)
            .map(|(channel, _)| channel.clone())
            .collect()
    }

    fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::Start => self.monitor.start(now),
            Command::Pause => self.monitor.pause(),
            Command::Stop => self.monitor.stop(),
        }
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();
        let before = self.settings.clone();
        let mut commands = Vec::new();

        if ctx.input(|input| input.key_pressed(egui::Key::Space)) {
            commands.push(match self.monitor.state() {
                RunState::Running => Command::Pause,
                _ => Command::Start,
            });
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.strong("EEG Monitor");
                ui.separator();
                theme_selector(ui, ctx, &mut self.settings);
                ui.separator();
                transport_controls(ui, self.monitor.state(), &mut commands);
                ui.separator();
                sweep_controls(ui, &mut self.settings);
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!(
                        "{} · {:.1}s · {} Hz",
                        self.monitor.state().label(),
                        self.monitor.playhead_seconds(),
                        self.monitor.ring().sample_rate_hz(),
                    ));
                });
            });
            ui.add_space(2.0);
            channel_toggles(ui, &self.montage, &mut self.visible);
            ui.add_space(4.0);
        });

        let now = Instant::now();
        for command in commands {
            self.apply(command, now);
        }
        self.monitor.tick(now);

        let params = self.monitor.frame_params(&self.settings.display);
        let selected = self.selected_channels();
        egui::CentralPanel::default().show(ctx, |ui| {
            card(ui, "Sweep", |ui| {
                self.chart.show(ui, self.monitor.ring(), &params, &selected);
            });
        });

        if self.settings != before {
            self.settings.save(&self.settings_path);
        }
    }
}

fn transport_controls(ui: &mut egui::Ui, state: RunState, commands: &mut Vec<Command>) {
    let start_label = if state == RunState::Paused {
        "Resume"
    } else {
        "Start"
    };
    if ui
        .add_enabled(state != RunState::Running, egui::Button::new(start_label))
        .clicked()
    {
        commands.push(Command::Start);
    }
    if ui
        .add_enabled(state == RunState::Running, egui::Button::new("Pause"))
        .clicked()
    {
        commands.push(Command::Pause);
    }
    if ui
        .add_enabled(state != RunState::Stopped, egui::Button::new("Stop"))
        .clicked()
    {
        commands.push(Command::Stop);
    }
}

fn sweep_controls(ui: &mut egui::Ui, settings: &mut AppSettings) {
    ui.label("Window");
    ComboBox::from_id_source("window_selector")
        .selected_text(format!("{} s", settings.display.window_seconds))
        .show_ui(ui, |ui| {
            for seconds in WINDOW_CHOICES {
                ui.selectable_value(
                    &mut settings.display.window_seconds,
                    seconds,
                    format!("{seconds} s"),
                );
            }
        });
    ui.add(
        egui::Slider::new(&mut settings.display.gain, GAIN_RANGE)
            .logarithmic(true)
            .text("Gain (px/µV)"),
    );
}

fn channel_toggles(ui: &mut egui::Ui, montage: &[ChannelRef], visible: &mut [bool]) {
    ui.horizontal_wrapped(|ui| {
        ui.label("Channels");
        let shown = visible.iter().filter(|v| **v).count();
        for (row, (channel, flag)) in montage.iter().zip(visible.iter_mut()).enumerate() {
            let text = egui::RichText::new(&channel.display_name).color(channel.resolved_color(row));
            let response = ui.selectable_label(*flag, text);
            // the last visible channel stays on; an empty selection means "all channels"
            if response.clicked() && !(*flag && shown == 1) {
                *flag = !*flag;
            }
        }
    });
}

fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().panel_fill)
        .stroke(Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
        .rounding(Rounding::same(8.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(ACCENT, title);
                ui.add_space(6.0);
                ui.separator();
            });
            ui.add_space(4.0);
            add_contents(ui);
        });
}

fn theme_selector(ui: &mut egui::Ui, ctx: &egui::Context, settings: &mut AppSettings) {
    let mut selected = settings.theme;
    ComboBox::from_id_source("theme_selector")
        .selected_text(selected.label())
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut selected, ThemeKind::Dark, ThemeKind::Dark.label());
            ui.selectable_value(&mut selected, ThemeKind::Light, ThemeKind::Light.label());
        });

    if selected != settings.theme {
        settings.theme = selected;
        apply_theme(ctx, selected);
    }
}

fn apply_theme(ctx: &egui::Context, theme: ThemeKind) {
    match theme {
        ThemeKind::Dark => apply_dark_theme(ctx),
        ThemeKind::Light => apply_light_theme(ctx),
    }
}

fn apply_dark_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();
    style.visuals.override_text_color = Some(Color32::from_rgb(225, 230, 228));
    style.visuals.extreme_bg_color = Color32::from_rgb(10, 12, 12);
    style.visuals.faint_bg_color = Color32::from_rgb(34, 38, 38);
    style.visuals.widgets.inactive.bg_fill = Color32::from_rgb(30, 30, 30);
    style.visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(60, 60, 60));
    style.visuals.selection.bg_fill = ACCENT;
    style.visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(12, 12, 12));
    ctx.set_style(style);
}

fn apply_light_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::light();
    style.visuals.extreme_bg_color = Color32::from_rgb(252, 252, 250);
    style.visuals.faint_bg_color = Color32::from_rgb(225, 228, 226);
    style.visuals.selection.bg_fill = Color32::from_rgb(150, 220, 200);
    style.visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(20, 70, 55));
    ctx.set_style(style);
}
