use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub colors: ColorsConfig,
    pub palette: String,
    pub boxplot: BoxplotConfig,
    pub legend: LegendConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Classic.base_config()
    }
}

impl VizConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 648.0,  // 9" * 72
            height: 432.0, // 6" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, label_size: 11.0, tick_size: 8.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// True-effect reference line.
    pub reference: Color,
    pub median: Color,
    pub whisker: Color,
    pub outlier: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            reference: Color::hex("#808080"),
            median: Color::hex("#3d3d3d"),
            whisker: Color::hex("#3d3d3d"),
            outlier: Color::hex("#3d3d3d"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxplotConfig {
    /// Fraction of each category slot covered by its boxes.
    pub group_width: f64,
    /// Whisker cap width relative to the box width.
    pub cap_fraction: f64,
    pub outlier_size: f64,
    pub reference_opacity: f64,
    pub reference_width: f64,
    pub show_means: bool,
}

impl Default for BoxplotConfig {
    fn default() -> Self {
        Self {
            group_width: 0.8,
            cap_fraction: 0.5,
            outlier_size: 2.0,
            reference_opacity: 0.5,
            reference_width: 1.2,
            show_means: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub show: bool,
    pub frame: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { show: true, frame: true }
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Resolve a VizConfig from an optional theme name and optional YAML string.
/// Priority: user YAML overrides, then the theme (`theme` argument, else the
/// YAML `theme` key), then the default theme.
pub fn resolve_config(theme: Option<&str>, user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let overlay: Option<Value> = user_yaml
        .map(serde_yaml_ng::from_str::<Value>)
        .transpose()
        .map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let theme_name = theme
        .map(str::to_string)
        .or_else(|| overlay.as_ref().and_then(|v| v.get("theme")).and_then(Value::as_str).map(str::to_string));
    let base = match theme_name.as_deref() {
        Some(name) => BuiltinTheme::parse(name).base_config(),
        None => VizConfig::default(),
    };
    let Some(mut overlay) = overlay else {
        return Ok(base);
    };
    if let (Some(name), Value::Mapping(m)) = (theme, &mut overlay) {
        m.insert(Value::String("theme".into()), Value::String(name.to_string()));
    }
    let mut merged =
        serde_yaml_ng::to_value(&base).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    merge(&mut merged, overlay);
    let config: VizConfig =
        serde_yaml_ng::from_value(merged).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &VizConfig) -> crate::Result<()> {
    let b = &config.boxplot;
    if !(b.group_width > 0.0 && b.group_width <= 1.0) {
        return Err(crate::RenderError::Config(format!(
            "boxplot.group_width must be in (0, 1], got {}",
            b.group_width
        )));
    }
    if !(0.0..=1.0).contains(&b.reference_opacity) {
        return Err(crate::RenderError::Config(format!(
            "boxplot.reference_opacity must be in [0, 1], got {}",
            b.reference_opacity
        )));
    }
    Ok(())
}
