//! Stream button colours.
//!
//! Every stream button gets a colour picked from a fixed palette by a
//! checksum of its label, so a station keeps its colour across restarts and
//! across both front ends. The button text is shortened to the label's
//! initial.

use anyhow::Result;
use ratatui::style::Color;

/// Catppuccin Mocha accent colours, in palette order
pub const CATPPUCCIN: [&str; 14] = [
    "#f5e0dc", // rosewater
    "#f2cdcd", // flamingo
    "#f5c2e7", // pink
    "#cba6f7", // mauve
    "#f38ba8", // red
    "#eba0ac", // maroon
    "#fab387", // peach
    "#f9e2af", // yellow
    "#a6e3a1", // green
    "#94e2d5", // teal
    "#89dceb", // sky
    "#74c7ec", // sapphire
    "#89b4fa", // blue
    "#b4befe", // lavender
];

/// Ordered, non-empty list of colour tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: CATPPUCCIN.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Palette {
    /// Build a palette from `#RRGGBB` / `#RGB` tokens
    pub fn new(colors: Vec<String>) -> Result<Self> {
        if colors.is_empty() {
            anyhow::bail!("Palette needs at least one colour");
        }

        if let Some(bad) = colors.iter().find(|c| parse_hex_color(c).is_none()) {
            anyhow::bail!("Invalid palette colour: {}", bad);
        }

        Ok(Self { colors })
    }

    /// Palette from the config file, or the default one if it is missing or broken
    pub fn from_config(colors: Option<&[String]>) -> Self {
        match colors {
            None => Self::default(),
            Some(colors) => Self::new(colors.to_vec()).unwrap_or_else(|e| {
                tracing::warn!("Ignoring configured palette: {}", e);
                Self::default()
            }),
        }
    }

    /// Palette slot for a label
    pub fn index_for(&self, label: &str) -> usize {
        (checksum(label) % self.colors.len() as u64) as usize
    }

    pub fn color_for(&self, label: &str) -> &str {
        &self.colors[self.index_for(label)]
    }
}

/// Sum of the UTF-16 code units of a label (JavaScript `charCodeAt` values)
pub fn checksum(label: &str) -> u64 {
    label.encode_utf16().map(u64::from).sum()
}

/// First character (Unicode scalar) of a label, upper-cased
pub fn initial(label: &str) -> String {
    label
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

/// Something with a visible label and a settable colour, i.e. a stream button
pub trait Labeled {
    fn label(&self) -> &str;
    fn set_label(&mut self, label: String);
    fn set_color(&mut self, color: &str);
}

/// Colour every element from its label, then shorten the label to its initial.
///
/// Each element is handled on its own; the result for one element never
/// depends on the others or on iteration order. Labels must be non-empty.
pub fn colorize<'a, T, I>(elements: I, palette: &Palette)
where
    T: Labeled + 'a,
    I: IntoIterator<Item = &'a mut T>,
{
    for element in elements {
        debug_assert!(!element.label().is_empty(), "stream buttons need a label");

        let color = palette.color_for(element.label());
        element.set_color(color);

        let short = initial(element.label());
        element.set_label(short);
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().strip_prefix('#')?;

    if !s.is_ascii() {
        return None;
    }

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

/// Colours for the terminal UI chrome (Catppuccin Mocha)
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, key hints (peach)
    pub danger: Color,      // Errors, delete prompts (red)
    pub success: Color,     // Now playing (green)
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Secondary text (overlay2)
    pub bg_selected: Color, // Selected row (surface1)
    pub inactive: Color,    // Inactive borders (surface2)
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 227, 161),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}
