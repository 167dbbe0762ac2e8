//! Layout metrics and orchestration timings, optionally read from the environment.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CHAR_WIDTH: f64 = 7.0;
pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_MARGIN: f64 = 10.0;
pub const DEFAULT_CANCEL_DELAY_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Advance width of one label character. Text is measured, not shaped.
    pub char_width: f64,
    pub font_size: f64,
    pub line_height: f64,
    /// Space kept around the final drawing on every side.
    pub margin: f64,
    /// How long a new render waits after cancelling the active one.
    pub cancel_delay: Duration,
    pub sequence_padding: f64,
    pub alternation_padding: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::with_font(DEFAULT_CHAR_WIDTH, DEFAULT_FONT_SIZE)
    }
}

impl RenderConfig {
    fn with_font(char_width: f64, font_size: f64) -> Self {
        Self {
            char_width,
            font_size,
            line_height: font_size * 7.0 / 6.0,
            margin: DEFAULT_MARGIN,
            cancel_delay: Duration::from_millis(DEFAULT_CANCEL_DELAY_MS),
            sequence_padding: 10.0,
            alternation_padding: 5.0,
        }
    }

    /// Build config from environment variables, defaulting anything unset.
    ///
    /// Optional:
    /// - `RAILROAD_CHAR_WIDTH`: default 7
    /// - `RAILROAD_FONT_SIZE`: default 12 (line height follows it)
    /// - `RAILROAD_MARGIN`: default 10
    /// - `RAILROAD_CANCEL_DELAY_MS`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        let char_width = env_parse_f64("RAILROAD_CHAR_WIDTH", DEFAULT_CHAR_WIDTH)?;
        let font_size = env_parse_f64("RAILROAD_FONT_SIZE", DEFAULT_FONT_SIZE)?;
        let mut config = Self::with_font(char_width, font_size);
        config.margin = env_parse_f64("RAILROAD_MARGIN", DEFAULT_MARGIN)?;
        let delay = env_parse_u64("RAILROAD_CANCEL_DELAY_MS", DEFAULT_CANCEL_DELAY_MS)?;
        config.cancel_delay = Duration::from_millis(delay);
        Ok(config)
    }

    /// Measured size of a single line of label text.
    pub fn text_size(&self, text: &str) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let width = text.chars().count() as f64 * self.char_width;
        (width, self.line_height)
    }
}

fn env_parse_f64(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(default);
    };
    let parsed = raw.trim().parse::<f64>();
    match parsed {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}

fn env_parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(default);
    };
    let parsed = raw.trim().parse::<u64>();
    parsed.map_err(|_| ConfigError::Invalid { var, value: raw })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
