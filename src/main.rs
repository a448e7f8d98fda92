use std::time::Instant;

use eeg_sweep_monitor::monitor::Monitor;
use eeg_sweep_monitor::settings::{AppSettings, default_settings_path};
use eeg_sweep_monitor::ui::MonitorApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let settings_path = default_settings_path();
    let mut settings = AppSettings::load(&settings_path);

    let monitor = match Monitor::new(&settings.session, Instant::now()) {
        Ok(monitor) => monitor,
        Err(err) => {
            log::error!("invalid session configuration: {err}; falling back to defaults");
            settings.session = AppSettings::default().session;
            Monitor::new(&settings.session, Instant::now())
                .expect("default session configuration is valid")
        }
    };
    log::info!(
        "session: {} channels at {} Hz, {} s buffer",
        settings.session.channel_count,
        settings.session.sample_rate_hz,
        settings.session.buffer_seconds,
    );

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "EEG Monitor",
        options,
        Box::new(move |cc| {
            Box::new(MonitorApp::new(cc, monitor, settings_path, settings))
        }),
    )
}
