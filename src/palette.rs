//! Named lineup colors and tile fill resolution

use image::Rgb;

/// Shade applied to alternate tiles of a single-color screen.
pub const TILE_SHADE: f64 = 0.75;

/// Color used when a color name cannot be resolved.
pub const FALLBACK_COLOR: &str = "Blue";

/// Fixed palette, in display order.
pub const PALETTE: &[(&str, Rgb<u8>)] = &[
    ("Red", Rgb([255, 0, 0])),
    ("Green", Rgb([0, 255, 0])),
    ("Blue", Rgb([0, 0, 255])),
    ("Cyan", Rgb([0, 200, 200])),
    ("Magenta", Rgb([200, 0, 200])),
    ("Yellow", Rgb([220, 200, 40])),
    ("Orange", Rgb([255, 140, 0])),
    ("Teal", Rgb([0, 150, 150])),
    ("Gray", Rgb([150, 150, 150])),
    ("Purple", Rgb([120, 60, 200])),
    ("Pink", Rgb([255, 105, 180])),
    ("Lime", Rgb([140, 220, 60])),
    ("Navy", Rgb([20, 40, 120])),
    ("Sky", Rgb([90, 170, 255])),
    ("Olive", Rgb([120, 130, 40])),
    ("Maroon", Rgb([140, 20, 20])),
    ("Brown", Rgb([140, 90, 50])),
    ("Gold", Rgb([220, 170, 20])),
    ("Indigo", Rgb([75, 0, 130])),
    ("Slate", Rgb([110, 120, 140])),
    ("Turquoise", Rgb([0, 180, 170])),
    ("Mint", Rgb([60, 200, 120])),
    ("Seafoam", Rgb([70, 160, 130])),
    ("Forest", Rgb([20, 110, 40])),
    ("Emerald", Rgb([0, 150, 80])),
    ("Chartreuse", Rgb([150, 200, 0])),
    ("Amber", Rgb([230, 150, 20])),
    ("Coral", Rgb([235, 100, 80])),
    ("Salmon", Rgb([210, 90, 70])),
    ("Peach", Rgb([220, 130, 90])),
    ("Sand", Rgb([190, 160, 90])),
    ("Khaki", Rgb([150, 140, 80])),
    ("Tan", Rgb([170, 120, 70])),
    ("Bronze", Rgb([140, 95, 45])),
    ("Crimson", Rgb([180, 30, 45])),
    ("Violet", Rgb([140, 70, 210])),
    ("Lavender", Rgb([150, 110, 210])),
    ("Plum", Rgb([90, 40, 120])),
    ("Steel", Rgb([80, 110, 140])),
    ("Charcoal", Rgb([50, 55, 70])),
];

/// Exact (case-sensitive) palette lookup.
pub fn lookup(name: &str) -> Option<Rgb<u8>> {
    PALETTE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, rgb)| *rgb)
}

/// Multiply each channel by `factor`, truncating and clamping to `[0, 255]`.
pub fn darken(rgb: Rgb<u8>, factor: f64) -> Rgb<u8> {
    let Rgb([r, g, b]) = rgb;
    let scale = |c: u8| (c as f64 * factor).clamp(0.0, 255.0) as u8;
    Rgb([scale(r), scale(g), scale(b)])
}

/// Parse `#RRGGBB` (the `#` is optional).
pub fn parse_hex(value: &str) -> Option<Rgb<u8>> {
    let raw = value.trim();
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    if raw.len() != 6 || !raw.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&raw[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Resolve a hex string or palette key, falling back to [`FALLBACK_COLOR`].
pub fn resolve_color(name: &str) -> Rgb<u8> {
    parse_hex(name)
        .or_else(|| lookup(name))
        .or_else(|| lookup(FALLBACK_COLOR))
        .unwrap_or(Rgb([0, 0, 0]))
}

/// Parse exactly two comma-separated palette keys.
pub fn parse_dual(name: &str) -> Option<(Rgb<u8>, Rgb<u8>)> {
    if !name.contains(',') {
        return None;
    }
    let parts: Vec<&str> = name.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [first, second] => Some((lookup(first)?, lookup(second)?)),
        _ => None,
    }
}

/// Checkerboard fill for the RGB tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFill {
    /// Two literal palette colors
    Dual(Rgb<u8>, Rgb<u8>),
    /// One color alternating with its darkened variant
    Shaded(Rgb<u8>),
}

impl TileFill {
    pub fn from_color_name(name: &str) -> Self {
        match parse_dual(name) {
            Some((a, b)) => TileFill::Dual(a, b),
            None => TileFill::Shaded(resolve_color(name)),
        }
    }

    /// Fill for the tile at `(row, col)`; parity of `row + col` picks the color.
    pub fn color_at(&self, row: u32, col: u32) -> Rgb<u8> {
        let even = (row + col) % 2 == 0;
        match *self {
            TileFill::Dual(a, b) => {
                if even {
                    a
                } else {
                    b
                }
            }
            TileFill::Shaded(base) => {
                if even {
                    darken(base, TILE_SHADE)
                } else {
                    base
                }
            }
        }
    }
}
