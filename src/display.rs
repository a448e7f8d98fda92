use egui::Color32;

/// Sweep widths offered to the user, in seconds.
pub const WINDOW_CHOICES: [f64; 6] = [1.0, 2.0, 5.0, 10.0, 20.0, 30.0];

pub const DEFAULT_WINDOW_SECONDS: f64 = 10.0;
pub const DEFAULT_GAIN: f32 = 0.5;
pub const GAIN_RANGE: std::ops::RangeInclusive<f32> = 0.05..=5.0;

const CHANNEL_PALETTE: [Color32; 8] = [
    Color32::from_rgb(255, 200, 50),
    Color32::from_rgb(50, 200, 255),
    Color32::from_rgb(50, 255, 100),
    Color32::from_rgb(255, 100, 100),
    Color32::from_rgb(200, 100, 255),
    Color32::from_rgb(255, 150, 50),
    Color32::from_rgb(100, 255, 255),
    Color32::from_rgb(255, 100, 200),
];

/// A channel as the surrounding application describes it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelRef {
    pub display_name: String,
    pub color: Option<String>,
    pub hardware_index: Option<usize>,
}

impl ChannelRef {
    pub fn new(display_name: impl Into<String>, hardware_index: usize) -> Self {
        Self {
            display_name: display_name.into(),
            color: None,
            hardware_index: Some(hardware_index),
        }
    }

    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color = Some(hex.into());
        self
    }

    /// Parsed colour, or the palette entry for `row` when absent or malformed.
    pub fn resolved_color(&self, row: usize) -> Color32 {
        self.color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or_else(|| palette_color(row))
    }
}

/// User-adjustable view settings; owned by the UI and mutated between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySettings {
    pub window_seconds: f64,
    pub gain: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            gain: DEFAULT_GAIN,
        }
    }
}

/// Immutable per-frame view of everything the chart needs besides the buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub window_seconds: f64,
    pub gain: f32,
    pub playhead_seconds: f64,
    pub sample_rate_hz: u32,
}

pub fn palette_color(row: usize) -> Color32 {
    CHANNEL_PALETTE[row % CHANNEL_PALETTE.len()]
}

pub fn is_allowed_window(seconds: f64) -> bool {
    WINDOW_CHOICES.iter().any(|choice| (choice - seconds).abs() < 1e-9)
}

pub fn parse_hex_color(raw: &str) -> Option<Color32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Standard 10-20 labels used when no montage is configured, coloured by
/// scalp region. Channels past the labelled set use numbered names and the
/// row palette.
pub fn default_montage(channel_count: usize) -> Vec<ChannelRef> {
    const LABELS: [&str; 16] = [
        "Fp1", "Fp2", "F3", "F4", "C3", "C4", "P3", "P4", "O1", "O2", "F7", "F8", "T7", "T8",
        "P7", "P8",
    ];
    (0..channel_count)
        .map(|index| match LABELS.get(index) {
            Some(label) => ChannelRef::new(*label, index).with_color(region_color(label)),
            None => ChannelRef::new(format!("Ch {}", index + 1), index),
        })
        .collect()
}

fn region_color(label: &str) -> &'static str {
    match label.trim_end_matches(|c: char| c.is_ascii_digit()) {
        "Fp" | "F" => "#ffc832",
        "C" => "#32ff64",
        "T" => "#ff6464",
        "P" => "#32c8ff",
        "O" => "#c864ff",
        _ => "#c8c8c8",
    }
}
