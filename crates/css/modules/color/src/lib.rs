//! CSS Color Module Level 4: Color values and their textual formats.
//! Reference: <https://www.w3.org/TR/css-color-4/>
//!
//! Parsing goes through `csscolorparser`; serialization keeps the format the
//! author wrote so an edited swatch writes back text in the same notation.

#![forbid(unsafe_code)]

use csscolorparser::Color;

/// 8-bit RGBA channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba8 {
    /// Whether the color is fully opaque.
    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.alpha == u8::MAX
    }
}

/// Notation a color literal was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// A named color such as `red`.
    Nickname,
    /// `#rgb` / `#rgba`.
    ShortHex,
    /// `#rrggbb` / `#rrggbbaa`.
    Hex,
    /// `rgb()` / `rgba()`.
    Rgb,
    /// `hsl()` / `hsla()`.
    Hsl,
}

/// A parsed color together with the notation it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedColor {
    /// Channel values.
    pub rgba: Rgba8,
    /// Detected notation.
    pub format: ColorFormat,
    /// The text as written.
    pub original: String,
}

/// Named colors that can be produced when cycling formats back to a name.
const NICKNAMES: &[(&str, [u8; 4])] = &[
    ("transparent", [0, 0, 0, 0]),
    ("black", [0, 0, 0, 255]),
    ("silver", [192, 192, 192, 255]),
    ("gray", [128, 128, 128, 255]),
    ("white", [255, 255, 255, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("red", [255, 0, 0, 255]),
    ("purple", [128, 0, 128, 255]),
    ("fuchsia", [255, 0, 255, 255]),
    ("green", [0, 128, 0, 255]),
    ("lime", [0, 255, 0, 255]),
    ("olive", [128, 128, 0, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("navy", [0, 0, 128, 255]),
    ("blue", [0, 0, 255, 255]),
    ("teal", [0, 128, 128, 255]),
    ("aqua", [0, 255, 255, 255]),
    ("orange", [255, 165, 0, 255]),
    ("rebeccapurple", [102, 51, 153, 255]),
];

/// Parse a CSS <color> into 8-bit RGBA channels.
///
/// Supports named colors, hex forms (`#rgb`/`#rgba`/`#rrggbb`/`#rrggbbaa`),
/// and functional notations like `rgb()/rgba()`.
///
/// See <https://www.w3.org/TR/css-color-4/#typedef-color>
#[inline]
pub fn parse_css_color(input: &str) -> Option<Rgba8> {
    let parsed: Color = input.trim().parse().ok()?;
    let [red, green, blue, alpha] = parsed.to_rgba8();
    Some(Rgba8 {
        red,
        green,
        blue,
        alpha,
    })
}

/// Detect the notation of a color literal without validating channels.
pub fn detect_format(text: &str) -> Option<ColorFormat> {
    let lower = text.trim().to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix('#') {
        return match digits.len() {
            3 | 4 => Some(ColorFormat::ShortHex),
            6 | 8 => Some(ColorFormat::Hex),
            _ => None,
        };
    }
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return Some(ColorFormat::Rgb);
    }
    if lower.starts_with("hsl(") || lower.starts_with("hsla(") {
        return Some(ColorFormat::Hsl);
    }
    lower
        .chars()
        .all(|character| character.is_ascii_alphabetic())
        .then_some(ColorFormat::Nickname)
}

/// Parse a color literal keeping track of its format.
///
/// Returns `None` for text that is not a color in one of the known formats
/// (keywords such as `inherit` or `currentcolor` are not colors here).
pub fn parse_color_literal(text: &str) -> Option<ParsedColor> {
    let format = detect_format(text)?;
    let rgba = parse_css_color(text)?;
    Some(ParsedColor {
        rgba,
        format,
        original: text.trim().to_owned(),
    })
}

/// Look up the name of a color, if it has one in the nickname table.
pub fn nickname_of(rgba: Rgba8) -> Option<&'static str> {
    NICKNAMES
        .iter()
        .find(|(_, channels)| *channels == [rgba.red, rgba.green, rgba.blue, rgba.alpha])
        .map(|(name, _)| *name)
}

/// Serialize a color in the requested format.
///
/// Falls back to `rgb()` when the format cannot express the color (no
/// nickname, or a short hex form would lose precision).
pub fn format_color(rgba: Rgba8, format: ColorFormat) -> String {
    match format {
        ColorFormat::Nickname => {
            nickname_of(rgba).map_or_else(|| format_rgb(rgba), ToOwned::to_owned)
        }
        ColorFormat::ShortHex => format_short_hex(rgba).unwrap_or_else(|| format_hex(rgba)),
        ColorFormat::Hex => format_hex(rgba),
        ColorFormat::Rgb => format_rgb(rgba),
        ColorFormat::Hsl => format_hsl(rgba),
    }
}

/// The format following `current` when the user cycles notations.
///
/// Formats that cannot represent `rgba` exactly are skipped.
pub fn next_format(current: ColorFormat, rgba: Rgba8) -> ColorFormat {
    let order = [
        ColorFormat::Nickname,
        ColorFormat::ShortHex,
        ColorFormat::Hex,
        ColorFormat::Rgb,
        ColorFormat::Hsl,
    ];
    let start = order
        .iter()
        .position(|format| *format == current)
        .unwrap_or(0);
    for step in 1..=order.len() {
        let candidate = order[(start + step) % order.len()];
        let usable = match candidate {
            ColorFormat::Nickname => nickname_of(rgba).is_some(),
            ColorFormat::ShortHex => format_short_hex(rgba).is_some(),
            ColorFormat::Hex | ColorFormat::Rgb | ColorFormat::Hsl => true,
        };
        if usable {
            return candidate;
        }
    }
    current
}

fn format_hex(rgba: Rgba8) -> String {
    if rgba.is_opaque() {
        format!("#{:02x}{:02x}{:02x}", rgba.red, rgba.green, rgba.blue)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            rgba.red, rgba.green, rgba.blue, rgba.alpha
        )
    }
}

fn format_short_hex(rgba: Rgba8) -> Option<String> {
    let channels = [rgba.red, rgba.green, rgba.blue, rgba.alpha];
    if channels.iter().any(|channel| channel % 17 != 0) {
        return None;
    }
    let digits: Vec<String> = channels
        .iter()
        .take(if rgba.is_opaque() { 3 } else { 4 })
        .map(|channel| format!("{:x}", channel / 17))
        .collect();
    Some(format!("#{}", digits.concat()))
}

fn format_alpha(alpha: u8) -> String {
    let value = f32::from(alpha) / 255.0;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn format_rgb(rgba: Rgba8) -> String {
    if rgba.is_opaque() {
        format!("rgb({} {} {})", rgba.red, rgba.green, rgba.blue)
    } else {
        format!(
            "rgb({} {} {} / {})",
            rgba.red,
            rgba.green,
            rgba.blue,
            format_alpha(rgba.alpha)
        )
    }
}

fn format_hsl(rgba: Rgba8) -> String {
    let red = f32::from(rgba.red) / 255.0;
    let green = f32::from(rgba.green) / 255.0;
    let blue = f32::from(rgba.blue) / 255.0;
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    let lightness = (max + min) / 2.0;
    let delta = max - min;
    let (hue, saturation) = if delta <= f32::EPSILON {
        (0.0, 0.0)
    } else {
        let saturation = delta / (1.0 - (2.0 * lightness - 1.0).abs());
        let sector = if (max - red).abs() <= f32::EPSILON {
            ((green - blue) / delta).rem_euclid(6.0)
        } else if (max - green).abs() <= f32::EPSILON {
            (blue - red) / delta + 2.0
        } else {
            (red - green) / delta + 4.0
        };
        (sector * 60.0, saturation)
    };
    let hue = hue.round();
    let saturation = (saturation * 100.0).round();
    let lightness = (lightness * 100.0).round();
    if rgba.is_opaque() {
        format!("hsl({hue}deg {saturation}% {lightness}%)")
    } else {
        format!(
            "hsl({hue}deg {saturation}% {lightness}% / {})",
            format_alpha(rgba.alpha)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_keeps_format() {
        let parsed = parse_color_literal("#F00");
        assert_eq!(parsed.as_ref().map(|color| color.format), Some(ColorFormat::ShortHex));
        assert!(parse_color_literal("inherit").is_none());
    }

    #[test]
    fn cycling_skips_unrepresentable_formats() {
        let odd = Rgba8 {
            red: 18,
            green: 52,
            blue: 86,
            alpha: 255,
        };
        assert_eq!(next_format(ColorFormat::Hsl, odd), ColorFormat::Hex);
        let red = Rgba8 {
            red: 255,
            green: 0,
            blue: 0,
            alpha: 255,
        };
        assert_eq!(next_format(ColorFormat::Hsl, red), ColorFormat::Nickname);
        assert_eq!(format_color(red, ColorFormat::ShortHex), "#f00");
        assert_eq!(format_color(red, ColorFormat::Hsl), "hsl(0deg 100% 50%)");
    }
}
