//! Subtitle styling for burn-in through the encoder's `subtitles` filter.
//!
//! [`SubtitleStyle`] is rendered to an ASS `force_style` override, so colours use the ASS
//! `&HAABBGGRR` notation where alpha 00 is opaque.

use std::path::{Path, PathBuf};

use crate::foundation::error::{ComposeError, ComposeResult};

/// RGBA colour with straight, opaque-is-255 alpha. Serialized as `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl AssColor {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// ASS notation: `&HAABBGGRR` with inverted alpha.
    pub fn to_ass(self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            255 - self.a,
            self.b,
            self.g,
            self.r
        )
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA`, `&HBBGGRR` or `&HAABBGGRR` (trailing `&` allowed).
    pub fn parse(s: &str) -> ComposeResult<Self> {
        let s = s.trim();
        let bad = || ComposeError::validation(format!("invalid colour '{s}'"));
        let hex_byte = |h: &str, i: usize| -> ComposeResult<u8> {
            h.get(i..i + 2)
                .and_then(|b| u8::from_str_radix(b, 16).ok())
                .ok_or_else(bad)
        };

        if let Some(hex) = s.strip_prefix('#') {
            return match hex.len() {
                6 => Ok(Self::rgb(
                    hex_byte(hex, 0)?,
                    hex_byte(hex, 2)?,
                    hex_byte(hex, 4)?,
                )),
                8 => Ok(Self::rgba(
                    hex_byte(hex, 0)?,
                    hex_byte(hex, 2)?,
                    hex_byte(hex, 4)?,
                    hex_byte(hex, 6)?,
                )),
                _ => Err(bad()),
            };
        }

        let hex = s
            .strip_prefix("&H")
            .or_else(|| s.strip_prefix("&h"))
            .ok_or_else(bad)?;
        let hex = hex.strip_suffix('&').unwrap_or(hex);
        match hex.len() {
            6 => Ok(Self::rgb(
                hex_byte(hex, 4)?,
                hex_byte(hex, 2)?,
                hex_byte(hex, 0)?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(hex, 6)?,
                hex_byte(hex, 4)?,
                hex_byte(hex, 2)?,
                255 - hex_byte(hex, 0)?,
            )),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for AssColor {
    type Error = ComposeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AssColor> for String {
    fn from(c: AssColor) -> Self {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row {
    Bottom,
    Middle,
    Top,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Left,
    Center,
    Right,
}

/// Numpad-style ASS alignment: 1–3 bottom row, 4–6 middle, 7–9 top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Alignment(u8);

impl Alignment {
    pub const BOTTOM_CENTER: Self = Self(2);

    pub fn new(value: u8) -> ComposeResult<Self> {
        if !(1..=9).contains(&value) {
            return Err(ComposeError::validation(format!(
                "subtitle alignment must be in 1..=9 (got {value})"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn row(self) -> Row {
        match self.0 {
            1..=3 => Row::Bottom,
            4..=6 => Row::Middle,
            _ => Row::Top,
        }
    }

    pub fn column(self) -> Column {
        match (self.0.saturating_sub(1)) % 3 {
            0 => Column::Left,
            1 => Column::Center,
            _ => Column::Right,
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::BOTTOM_CENTER
    }
}

impl TryFrom<u8> for Alignment {
    type Error = ComposeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<Alignment> for u8 {
    fn from(a: Alignment) -> Self {
        a.0
    }
}

/// Subtitle appearance record.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubtitleStyle {
    pub font_family: String,
    pub font_size: u32,
    pub primary_color: AssColor,
    pub outline_color: AssColor,
    pub back_color: AssColor,
    pub bold: bool,
    pub outline_width: f32,
    pub shadow: f32,
    pub alignment: Alignment,
    /// Left and right margin in pixels.
    pub margin_h: u32,
    pub margin_v: u32,
    /// Character encoding of the subtitle file.
    pub encoding: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: "Microsoft YaHei".to_owned(),
            font_size: 12,
            primary_color: AssColor::WHITE,
            outline_color: AssColor::BLACK,
            back_color: AssColor::rgba(0, 0, 0, 0),
            bold: false,
            outline_width: 1.0,
            shadow: 0.0,
            alignment: Alignment::BOTTOM_CENTER,
            margin_h: 10,
            margin_v: 20,
            encoding: "UTF-8".to_owned(),
        }
    }
}

impl SubtitleStyle {
    pub fn validate(&self) -> ComposeResult<()> {
        let family = self.font_family.trim();
        if family.is_empty() {
            return Err(ComposeError::validation("subtitle font_family must not be empty"));
        }
        if family.contains([',', '\'', ':', '=', '\\']) {
            return Err(ComposeError::validation(format!(
                "subtitle font_family '{family}' contains characters reserved by the filter syntax"
            )));
        }
        if self.font_size == 0 {
            return Err(ComposeError::validation("subtitle font_size must be > 0"));
        }
        for (name, v) in [("outline_width", self.outline_width), ("shadow", self.shadow)] {
            if !v.is_finite() || v < 0.0 {
                return Err(ComposeError::validation(format!(
                    "subtitle {name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        Alignment::new(self.alignment.value())?;
        if self.encoding.is_empty()
            || !self
                .encoding
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ComposeError::validation(format!(
                "invalid subtitle encoding '{}'",
                self.encoding
            )));
        }
        Ok(())
    }

    /// ASS style override for the `force_style` filter option.
    pub fn force_style(&self) -> String {
        [
            format!("Fontname={}", self.font_family.trim()),
            format!("Fontsize={}", self.font_size),
            format!("PrimaryColour={}", self.primary_color.to_ass()),
            format!("OutlineColour={}", self.outline_color.to_ass()),
            format!("BackColour={}", self.back_color.to_ass()),
            format!("Bold={}", if self.bold { -1 } else { 0 }),
            format!("Outline={}", self.outline_width),
            format!("Shadow={}", self.shadow),
            format!("Alignment={}", self.alignment.value()),
            format!("MarginL={}", self.margin_h),
            format!("MarginR={}", self.margin_h),
            format!("MarginV={}", self.margin_v),
        ]
        .join(",")
    }
}

/// A subtitle file to burn into the output, with its style.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleTrack {
    pub path: PathBuf,
    pub style: SubtitleStyle,
}

impl SubtitleTrack {
    pub fn new(path: impl Into<PathBuf>, style: SubtitleStyle) -> ComposeResult<Self> {
        let path = path.into();
        style.validate()?;
        if path.to_string_lossy().contains('\'') {
            return Err(ComposeError::validation(format!(
                "subtitle path '{}' must not contain single quotes",
                path.display()
            )));
        }
        Ok(Self { path, style })
    }

    /// Look for `<stem><suffix>.srt` next to `video`, e.g. `clip_en.srt` for `clip.mp4`.
    pub fn find_sibling(video: &Path, suffix: &str) -> Option<PathBuf> {
        let stem = video.file_stem()?.to_string_lossy();
        let candidate = video.with_file_name(format!("{stem}{suffix}.srt"));
        candidate.is_file().then_some(candidate)
    }

    /// Value for ffmpeg's `-vf`.
    pub fn filter_arg(&self) -> String {
        format!(
            "subtitles='{}':charenc={}:force_style='{}'",
            escape_filter_path(&self.path),
            self.style.encoding,
            self.style.force_style()
        )
    }
}

/// Filter-graph path escaping: forward slashes, escaped drive colons.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
}

#[cfg(test)]
#[path = "../tests/unit/subtitle.rs"]
mod tests;
