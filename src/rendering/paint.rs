/// Paint command lists for each diagram style and the overlay

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbaImage};

use super::font::{fit_size, Face};
use super::layout::{
    grid_lines, target_radius, Band, CanvasPlan, Diagram, Rect, TileCell, GRID_LINE_WIDTH,
    GRID_SPACING, TARGET_LINE_WIDTH,
};
use crate::palette::TileFill;
use crate::{LineupType, RenderOptions, ScreenSpec};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Smallest tile label / tile number size.
const MIN_TILE_TEXT: u32 = 10;
const MIN_TITLE: u32 = 20;
const MIN_SUBTITLE: u32 = 16;
/// Overlay lines may use this share of the canvas width.
const OVERLAY_WIDTH_FRAC: f32 = 0.85;
const OVERLAY_LINE_SPACING: f32 = 0.25;
/// Vertical anchors of the tile label and tile number within a tile.
const LABEL_ANCHOR: f32 = 0.22;
const NUMBER_ANCHOR: f32 = 0.62;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outline {
    pub width: u32,
    pub rgb: Rgb<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        rgb: Rgb<u8>,
    },
    /// Axis-aligned frame drawn inside `rect`
    StrokeRect {
        rect: Rect,
        width: u32,
        rgb: Rgb<u8>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: u32,
        rgb: Rgb<u8>,
    },
    /// Circle outline whose stroke grows inward from `radius`
    Ring {
        center: (f32, f32),
        radius: f32,
        width: u32,
        rgb: Rgb<u8>,
    },
    /// Text whose bounding box (outline included) starts at `(x, y)`
    Text {
        x: i32,
        y: i32,
        text: String,
        size: u32,
        rgb: Rgb<u8>,
        outline: Option<Outline>,
    },
    /// Alpha-composite an image with its top-left corner at `(x, y)`
    Composite {
        x: i64,
        y: i64,
        image: RgbaImage,
    },
}

/// Diagram commands for a planned canvas.
pub fn paint_diagram(
    plan: &CanvasPlan,
    screen: &ScreenSpec,
    opts: &RenderOptions,
    face: &Face,
) -> Vec<PaintCommand> {
    match &plan.diagram {
        Diagram::Tiles(cells) => paint_tiles(cells, screen, opts, face),
        Diagram::Greyscale(bands) => paint_greyscale(bands),
        Diagram::CircleX { background } => paint_circle_x(plan.width, plan.height, *background),
    }
}

/// Label and number sizes for tiles of width `tile_w`.
pub fn tile_text_sizes(label: &str, tile_w: u32, opts: &RenderOptions, face: &Face) -> (u32, u32) {
    let max_label_w = tile_w as f32 * opts.tile_label_width_frac;
    let label_size = fit_size(face, label, max_label_w, tile_w, MIN_TILE_TEXT);
    let number_size = if opts.show_overlay {
        ((label_size as f32 * 0.8) as u32).max(MIN_TILE_TEXT)
    } else {
        label_size
    };
    (label_size, number_size)
}

fn centered_text(face: &Face, text: &str, size: u32, cx: f32, cy: f32, rgb: Rgb<u8>) -> PaintCommand {
    let (w, h) = face.measure(text, size);
    PaintCommand::Text {
        x: (cx - w as f32 / 2.0) as i32,
        y: (cy - h as f32 / 2.0) as i32,
        text: text.to_string(),
        size,
        rgb,
        outline: None,
    }
}

/// Checkerboard tiles, each with its label near the top and its
/// two-digit number below the middle.
pub fn paint_tiles(
    cells: &[TileCell],
    screen: &ScreenSpec,
    opts: &RenderOptions,
    face: &Face,
) -> Vec<PaintCommand> {
    let fill = TileFill::from_color_name(&screen.base_color_name);
    let text_rgb = Rgb(opts.tile_text_rgb);
    let mut sizes: HashMap<u32, (u32, u32)> = HashMap::new();
    let mut commands = Vec::with_capacity(cells.len() * 3);

    for cell in cells {
        let rect = cell.rect;
        let (label_size, number_size) = *sizes
            .entry(rect.width)
            .or_insert_with(|| tile_text_sizes(&screen.tile_label, rect.width, opts, face));

        commands.push(PaintCommand::FillRect {
            rect,
            rgb: fill.color_at(cell.row, cell.col),
        });

        let cx = rect.center_x();
        let label_y = rect.y as f32 + rect.height as f32 * LABEL_ANCHOR;
        let number_y = rect.y as f32 + rect.height as f32 * NUMBER_ANCHOR;
        if !screen.tile_label.is_empty() {
            commands.push(centered_text(face, &screen.tile_label, label_size, cx, label_y, text_rgb));
        }
        let number = format!("{:02}", cell.index);
        commands.push(centered_text(face, &number, number_size, cx, number_y, text_rgb));
    }
    commands
}

pub fn paint_greyscale(bands: &[Band]) -> Vec<PaintCommand> {
    bands
        .iter()
        .filter(|band| band.rect.height > 0)
        .map(|band| PaintCommand::FillRect {
            rect: band.rect,
            rgb: Rgb([band.value; 3]),
        })
        .collect()
}

/// Background, 100px grid, border, and the circle + diagonals target.
pub fn paint_circle_x(width: u32, height: u32, background: Rgb<u8>) -> Vec<PaintCommand> {
    let full = Rect::new(0, 0, width, height);
    let (w, h) = (width as f32, height as f32);
    let mut commands = vec![PaintCommand::FillRect {
        rect: full,
        rgb: background,
    }];

    let grid = grid_lines(width, height, GRID_SPACING);
    for x in grid.verticals {
        commands.push(PaintCommand::Line {
            from: (x as f32, 0.0),
            to: (x as f32, h),
            width: GRID_LINE_WIDTH,
            rgb: WHITE,
        });
    }
    for y in grid.horizontals {
        commands.push(PaintCommand::Line {
            from: (0.0, y as f32),
            to: (w, y as f32),
            width: GRID_LINE_WIDTH,
            rgb: WHITE,
        });
    }
    commands.push(PaintCommand::StrokeRect {
        rect: full,
        width: GRID_LINE_WIDTH,
        rgb: WHITE,
    });

    commands.push(PaintCommand::Ring {
        center: (w / 2.0, h / 2.0),
        radius: target_radius(width, height) as f32,
        width: TARGET_LINE_WIDTH,
        rgb: WHITE,
    });
    commands.push(PaintCommand::Line {
        from: (0.0, 0.0),
        to: (w, h),
        width: TARGET_LINE_WIDTH,
        rgb: WHITE,
    });
    commands.push(PaintCommand::Line {
        from: (0.0, h),
        to: (w, 0.0),
        width: TARGET_LINE_WIDTH,
        rgb: WHITE,
    });
    commands
}

/// Scale `image` down (never up) to fit the canvas, keeping its aspect
/// ratio.
pub fn fit_branding(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_w && h <= max_h {
        return image.clone();
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let new_w = ((w as f64 * scale).round() as u32).max(1);
    let new_h = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
}

/// Branding composited against the bottom-left corner.
pub fn paint_branding(image: &RgbaImage, width: u32, height: u32) -> PaintCommand {
    let fitted = fit_branding(image, width, height);
    PaintCommand::Composite {
        x: 0,
        y: height as i64 - fitted.height() as i64,
        image: fitted,
    }
}

/// Centered screen name and `WxH` resolution.
///
/// Circle-X splits the two lines around the center so the target stays
/// visible; the other styles stack them as one centered block.
pub fn paint_overlay(
    screen: &ScreenSpec,
    width: u32,
    height: u32,
    opts: &RenderOptions,
    face: &Face,
) -> Vec<PaintCommand> {
    let title = screen.screen_name.as_str();
    let subtitle = format!("{}x{}", width, height);
    let short_side = width.min(height) as f32;
    let max_w = width as f32 * OVERLAY_WIDTH_FRAC;

    let title_size = fit_size(
        face,
        title,
        max_w,
        ((short_side * opts.overlay_title_frac) as u32).max(MIN_TITLE),
        MIN_TITLE,
    );
    let sub_size = fit_size(
        face,
        &subtitle,
        max_w,
        ((short_side * opts.overlay_sub_frac) as u32).max(MIN_SUBTITLE),
        MIN_SUBTITLE,
    );
    let outline = Outline {
        width: ((short_side * opts.outline_frac) as u32).max(1),
        rgb: Rgb(opts.outline_rgb),
    };
    let rgb = Rgb(opts.overlay_text_rgb);

    // Measured with the outline on both sides.
    let measure = |text: &str, size: u32| {
        let (w, h) = face.measure(text, size);
        (w + 2 * outline.width, h + 2 * outline.width)
    };
    let text_at = |text: &str, size: u32, x: f32, y: f32| PaintCommand::Text {
        x: x as i32,
        y: y as i32,
        text: text.to_string(),
        size,
        rgb,
        outline: Some(outline),
    };

    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (title_w, title_h) = measure(title, title_size);
    let (sub_w, sub_h) = measure(&subtitle, sub_size);

    if opts.lineup_type == LineupType::CircleXGrid {
        let gap = ((short_side * 0.08) as u32).max((title_size as f32 * 1.2) as u32) as f32;
        return vec![
            text_at(title, title_size, cx - title_w as f32 / 2.0, cy - gap / 2.0 - title_h as f32),
            text_at(&subtitle, sub_size, cx - sub_w as f32 / 2.0, cy + gap / 2.0),
        ];
    }

    let spacing = (title_h as f32 * OVERLAY_LINE_SPACING) as u32;
    let block_h = title_h + sub_h + spacing;
    let title_y = cy - block_h as f32 / 2.0;
    let sub_y = title_y + (title_h + spacing) as f32;
    vec![
        text_at(title, title_size, cx - title_w as f32 / 2.0, title_y),
        text_at(&subtitle, sub_size, cx - sub_w as f32 / 2.0, sub_y),
    ]
}
