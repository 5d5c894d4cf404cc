//! Dark color scheme for the tester window

use iced::theme::Palette;
use iced::{Color, Theme};

/// Named colors used by the widgets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colors {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub button_bg: Color,
    pub entry_bg: Color,
    pub pressed: Color,
    pub success: Color,
    pub error: Color,
    pub timing: Color,
    pub info: Color,
}

const COLORS: Colors = Colors {
    bg: Color::from_rgb(0x2b as f32 / 255.0, 0x2b as f32 / 255.0, 0x2b as f32 / 255.0),
    fg: Color::from_rgb(0xff as f32 / 255.0, 0xff as f32 / 255.0, 0xff as f32 / 255.0),
    accent: Color::from_rgb(0x4a as f32 / 255.0, 0x9e as f32 / 255.0, 0xff as f32 / 255.0),
    button_bg: Color::from_rgb(0x40 as f32 / 255.0, 0x40 as f32 / 255.0, 0x40 as f32 / 255.0),
    entry_bg: Color::from_rgb(0x3c as f32 / 255.0, 0x3c as f32 / 255.0, 0x3c as f32 / 255.0),
    pressed: Color::from_rgb(0x3a as f32 / 255.0, 0x7b as f32 / 255.0, 0xd5 as f32 / 255.0),
    success: Color::from_rgb(0x4a as f32 / 255.0, 0xde as f32 / 255.0, 0x80 as f32 / 255.0),
    error: Color::from_rgb(0xf8 as f32 / 255.0, 0x71 as f32 / 255.0, 0x71 as f32 / 255.0),
    timing: Color::from_rgb(0xfb as f32 / 255.0, 0xbf as f32 / 255.0, 0x24 as f32 / 255.0),
    info: Color::from_rgb(0x60 as f32 / 255.0, 0xa5 as f32 / 255.0, 0xfa as f32 / 255.0),
};

/// A copy of the color table
pub fn colors() -> Colors {
    COLORS
}

pub fn dark_theme() -> Theme {
    Theme::custom(
        "TTS Tester Dark".to_string(),
        Palette {
            background: COLORS.bg,
            text: COLORS.fg,
            primary: COLORS.accent,
            success: COLORS.success,
            danger: COLORS.error,
        },
    )
}

/// Parse `#rrggbb` tag colors, falling back to gray
pub fn parse_hex(color: &str) -> Color {
    let hex = color.trim().trim_start_matches('#');
    // byte slicing below needs plain ASCII hex digits
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Color::from_rgb8(0x80, 0x80, 0x80);
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::from_rgb8(r, g, b),
        _ => Color::from_rgb8(0x80, 0x80, 0x80),
    }
}
