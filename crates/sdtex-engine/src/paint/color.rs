use std::fmt;
use std::str::FromStr;

/// Straight-alpha sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Error returned when a color string is neither hex nor a known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color `{}`", self.0)
    }
}

impl std::error::Error for ColorParseError {}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::from_srgb_u8(0, 0, 0, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or one of a few CSS names.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let s = s.trim();
        let err = || ColorParseError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err());
            }
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            return match hex.len() {
                3 => Ok(Color::rgb(
                    nibble(0).map_err(|_| err())?,
                    nibble(1).map_err(|_| err())?,
                    nibble(2).map_err(|_| err())?,
                )),
                6 | 8 => {
                    let a = if hex.len() == 8 { byte(6).map_err(|_| err())? } else { 255 };
                    Ok(Color::from_srgb_u8(
                        byte(0).map_err(|_| err())?,
                        byte(2).map_err(|_| err())?,
                        byte(4).map_err(|_| err())?,
                        a,
                    ))
                }
                _ => Err(err()),
            };
        }

        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            "red" => Ok(Color::rgb(255, 0, 0)),
            "green" => Ok(Color::rgb(0, 128, 0)),
            "blue" => Ok(Color::rgb(0, 0, 255)),
            "gray" | "grey" => Ok(Color::rgb(128, 128, 128)),
            "transparent" => Ok(Color::TRANSPARENT),
            _ => Err(err()),
        }
    }

    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb` form; alpha is dropped.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Composites `self` over `dst` with extra `coverage` in `[0, 1]`
    /// (glyph antialiasing). The result is opaque when `dst` is.
    pub fn blend_over(self, dst: [u8; 4], coverage: f32) -> [u8; 4] {
        let alpha = (self.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        let mix = |src: u8, dst: u8| -> u8 {
            (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8
        };
        let out_a = alpha + (dst[3] as f32 / 255.0) * (1.0 - alpha);
        [
            mix(self.r, dst[0]),
            mix(self.g, dst[1]),
            mix(self.b, dst[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_hex() {
        assert_eq!(Color::parse("#f80").unwrap(), Color::rgb(255, 136, 0));
        assert_eq!(Color::parse("#0000ff").unwrap(), Color::rgb(0, 0, 255));
        assert_eq!(Color::parse(" #11223344 ").unwrap(), Color::from_srgb_u8(0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!("Red".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Color::parse("#12").is_err());
        assert!(Color::parse("#gggggg").is_err());
        assert!(Color::parse("#ééé").is_err());
        assert!(Color::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(Color::rgb(0x20, 0x20, 0x40).to_hex(), "#202040");
    }

    #[test]
    fn blend_full_and_none() {
        let white = Color::WHITE.to_rgba();
        assert_eq!(Color::BLACK.blend_over(white, 1.0), [0, 0, 0, 255]);
        assert_eq!(Color::BLACK.blend_over(white, 0.0), white);
    }
}
