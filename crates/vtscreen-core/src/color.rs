//! Color types for cell attributes and dynamic (OSC) colors.
//!
//! Cells carry a [`Color`] per layer (foreground, background, underline);
//! resolution to concrete RGB happens at render time in the embedder, except
//! for the 256-color palette which uses the fixed xterm values.

use std::fmt;

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RgbColor {
    /// Red component.
    pub red: u8,
    /// Green component.
    pub green: u8,
    /// Blue component.
    pub blue: u8,
}

impl RgbColor {
    /// Create a new RGB color.
    #[must_use]
    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parse an X11-style color specification.
    ///
    /// Accepts `rgb:R/G/B` with 1 to 4 hex digits per component (scaled to
    /// 8 bits from the most significant digits) and `#RRGGBB`.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        if let Some(rest) = spec.strip_prefix("rgb:") {
            let mut parts = rest.splitn(3, '/');
            let red = parse_scaled_component(parts.next()?)?;
            let green = parse_scaled_component(parts.next()?)?;
            let blue = parse_scaled_component(parts.next()?)?;
            return Some(Self::new(red, green, blue));
        }
        if let Some(hex) = spec.strip_prefix('#') {
            if hex.len() == 6 {
                let value = u32::from_str_radix(hex, 16).ok()?;
                return Some(Self::new(
                    ((value >> 16) & 0xFF) as u8,
                    ((value >> 8) & 0xFF) as u8,
                    (value & 0xFF) as u8,
                ));
            }
        }
        None
    }

    /// Format as the 16-bit-per-component reply form `rgb:RRRR/GGGG/BBBB`.
    #[must_use]
    pub fn to_x11_spec(self) -> String {
        // 8-bit components scale to 16 bits by repetition (0xAB -> 0xABAB).
        format!(
            "rgb:{0:02x}{0:02x}/{1:02x}{1:02x}/{2:02x}{2:02x}",
            self.red, self.green, self.blue
        )
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Parse one `rgb:` component of 1-4 hex digits, scaling to 8 bits.
fn parse_scaled_component(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    let value = u16::from_str_radix(digits, 16).ok()?;
    let scaled = match digits.len() {
        1 => u32::from(value) * 17,           // 0xF -> 0xFF
        2 => u32::from(value),                // already 8 bits
        3 => u32::from(value) >> 4,           // 12 -> 8 bits
        _ => u32::from(value) >> 8,           // 16 -> 8 bits
    };
    Some(scaled.min(255) as u8)
}

/// A cell color: terminal default, palette index, or direct RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// The terminal's configured default for this layer.
    #[default]
    Default,
    /// An index into the 256-color palette.
    Indexed(u8),
    /// A direct 24-bit color.
    Rgb(RgbColor),
}

impl Color {
    /// Check if this is the default color.
    #[must_use]
    #[inline]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// Resolve to RGB using the fixed xterm palette for indexed colors.
    ///
    /// `Default` resolves to `None`; the embedder owns the default colors.
    #[must_use]
    pub fn to_rgb(self) -> Option<RgbColor> {
        match self {
            Self::Default => None,
            Self::Indexed(index) => Some(ansi_256_to_rgb(index)),
            Self::Rgb(rgb) => Some(rgb),
        }
    }
}

/// Map an ANSI 256-color index to RGB (xterm values).
///
/// - 0-15: standard and bright colors
/// - 16-231: 6×6×6 color cube
/// - 232-255: grayscale ramp
#[must_use]
pub const fn ansi_256_to_rgb(index: u8) -> RgbColor {
    const ANSI_16: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (205, 0, 0),
        (0, 205, 0),
        (205, 205, 0),
        (0, 0, 238),
        (205, 0, 205),
        (0, 205, 205),
        (229, 229, 229),
        (127, 127, 127),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (92, 92, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];

    if index < 16 {
        let (r, g, b) = ANSI_16[index as usize];
        RgbColor::new(r, g, b)
    } else if index < 232 {
        let idx = index - 16;
        let r = if idx / 36 == 0 { 0 } else { 55 + (idx / 36) * 40 };
        let g = if (idx % 36) / 6 == 0 {
            0
        } else {
            55 + ((idx % 36) / 6) * 40
        };
        let b = if idx % 6 == 0 { 0 } else { 55 + (idx % 6) * 40 };
        RgbColor::new(r, g, b)
    } else {
        let gray = 8 + (index - 232) * 10;
        RgbColor::new(gray, gray, gray)
    }
}

/// Dynamic colors addressable through OSC 10/11/12/17/19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicColorName {
    /// OSC 10: default text foreground.
    DefaultForegroundColor,
    /// OSC 11: default text background.
    DefaultBackgroundColor,
    /// OSC 12: text cursor color.
    TextCursorColor,
    /// OSC 17: selection (highlight) background.
    HighlightBackgroundColor,
    /// OSC 19: selection (highlight) foreground.
    HighlightForegroundColor,
}

impl DynamicColorName {
    /// The OSC code that sets or queries this color.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::DefaultForegroundColor => 10,
            Self::DefaultBackgroundColor => 11,
            Self::TextCursorColor => 12,
            Self::HighlightBackgroundColor => 17,
            Self::HighlightForegroundColor => 19,
        }
    }

    /// Map an OSC set/query code (10..19) to a color name.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::DefaultForegroundColor),
            11 => Some(Self::DefaultBackgroundColor),
            12 => Some(Self::TextCursorColor),
            17 => Some(Self::HighlightBackgroundColor),
            19 => Some(Self::HighlightForegroundColor),
            _ => None,
        }
    }

    /// Map an OSC reset code (110..119) to a color name.
    #[must_use]
    pub const fn from_reset_code(code: u16) -> Option<Self> {
        if code >= 100 {
            Self::from_code(code - 100)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hash_spec() {
        assert_eq!(
            RgbColor::parse("#ff8000"),
            Some(RgbColor::new(0xFF, 0x80, 0x00))
        );
        assert_eq!(RgbColor::parse("#ff80"), None);
    }

    #[test]
    fn parse_x11_spec() {
        assert_eq!(
            RgbColor::parse("rgb:ff/80/00"),
            Some(RgbColor::new(0xFF, 0x80, 0x00))
        );
        assert_eq!(
            RgbColor::parse("rgb:ffff/8080/0000"),
            Some(RgbColor::new(0xFF, 0x80, 0x00))
        );
        assert_eq!(RgbColor::parse("rgb:f/8/0"), Some(RgbColor::new(255, 136, 0)));
        assert_eq!(RgbColor::parse("rgb:ff/80"), None);
        assert_eq!(RgbColor::parse("bogus"), None);
    }

    #[test]
    fn x11_spec_roundtrip() {
        let color = RgbColor::new(0x12, 0x34, 0x56);
        assert_eq!(color.to_x11_spec(), "rgb:1212/3434/5656");
        assert_eq!(RgbColor::parse(&color.to_x11_spec()), Some(color));
    }

    #[test]
    fn palette_cube_corners() {
        assert_eq!(ansi_256_to_rgb(16), RgbColor::new(0, 0, 0));
        assert_eq!(ansi_256_to_rgb(231), RgbColor::new(255, 255, 255));
        assert_eq!(ansi_256_to_rgb(196), RgbColor::new(255, 0, 0));
    }

    #[test]
    fn palette_grayscale() {
        assert_eq!(ansi_256_to_rgb(232), RgbColor::new(8, 8, 8));
        assert_eq!(ansi_256_to_rgb(255), RgbColor::new(238, 238, 238));
    }

    #[test]
    fn dynamic_color_codes() {
        assert_eq!(
            DynamicColorName::from_code(11),
            Some(DynamicColorName::DefaultBackgroundColor)
        );
        assert_eq!(
            DynamicColorName::from_reset_code(112),
            Some(DynamicColorName::TextCursorColor)
        );
        assert_eq!(DynamicColorName::from_code(13), None);
        assert_eq!(DynamicColorName::DefaultForegroundColor.code(), 10);
    }
}
