use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    Classic,
    Paper,
    Minimal,
}

impl BuiltinTheme {
    /// Case-insensitive lookup; unknown names fall back to `classic`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Self::Classic,
            "paper" => Self::Paper,
            "minimal" => Self::Minimal,
            other => {
                tracing::warn!(theme = other, "unknown theme, using 'classic'");
                Self::Classic
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Paper => "paper",
            Self::Minimal => "minimal",
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Classic => classic(),
            Self::Paper => paper(),
            Self::Minimal => minimal(),
        }
    }
}

fn classic() -> VizConfig {
    VizConfig {
        theme: "classic".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        colors: ColorsConfig::default(),
        palette: "deep".into(),
        boxplot: BoxplotConfig::default(),
        legend: LegendConfig::default(),
    }
}

fn paper() -> VizConfig {
    VizConfig {
        theme: "paper".into(),
        figure: FigureConfig { width: 504.0, height: 360.0 },
        font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0 },
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        palette: "wong".into(),
        ..classic()
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        grid: GridConfig { show: false, ..GridConfig::default() },
        colors: ColorsConfig { reference: Color::hex("#999999"), ..ColorsConfig::default() },
        palette: "tableau10".into(),
        legend: LegendConfig { show: true, frame: false },
        ..classic()
    }
}
