/// Canvas sizing and diagram geometry

use image::Rgb;
use log::debug;

use crate::model::{row_tile_type, ScreenSpec, TileCatalog};
use crate::palette::resolve_color;
use crate::{screen_resolution, Error, LineupType, RenderOptions, Result};

/// Number of bands in a greyscale lineup.
pub const GREYSCALE_STEPS: u32 = 11;
/// Circle-X grid pitch in pixels.
pub const GRID_SPACING: u32 = 100;
pub const GRID_LINE_WIDTH: u32 = 2;
/// Stroke of the circle and diagonals.
pub const TARGET_LINE_WIDTH: u32 = 10;
/// Circle radius relative to the shorter canvas side.
pub const TARGET_RADIUS_FRAC: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }
}

/// One tile of the RGB grid, numbered row-major from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCell {
    pub rect: Rect,
    pub row: u32,
    pub col: u32,
    pub index: u32,
}

/// One horizontal greyscale band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub rect: Rect,
    pub value: u8,
}

/// What to draw, with everything the mode needs already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagram {
    Tiles(Vec<TileCell>),
    Greyscale(Vec<Band>),
    CircleX { background: Rgb<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasPlan {
    pub width: u32,
    pub height: u32,
    pub diagram: Diagram,
}

/// Size the canvas for `opts.lineup_type` and lay out its diagram.
///
/// - RGB uses the tile geometry.
/// - Greyscale prefers the declared resolution and falls back to tiles.
/// - Circle-X requires the declared resolution.
pub fn plan_canvas(
    screen: &ScreenSpec,
    catalog: &TileCatalog,
    opts: &RenderOptions,
) -> Result<CanvasPlan> {
    let (width, height) = match opts.lineup_type {
        LineupType::Rgb => screen_resolution(screen, catalog)?,
        LineupType::GreyscaleSteps => match screen.expected_size() {
            Some(size) => size,
            None => screen_resolution(screen, catalog)?,
        },
        LineupType::CircleXGrid => screen
            .expected_size()
            .ok_or_else(|| Error::MissingExpectedSize(screen.screen_name.clone()))?,
    };
    if width == 0 || height == 0 {
        return Err(Error::EmptyCanvas { width, height });
    }
    debug!(
        "{}: {} canvas {}x{}",
        screen.screen_name, opts.lineup_type, width, height
    );

    let diagram = match opts.lineup_type {
        LineupType::Rgb => Diagram::Tiles(layout_tiles(screen, catalog)?),
        LineupType::GreyscaleSteps => Diagram::Greyscale(greyscale_bands(width, height)),
        LineupType::CircleXGrid => Diagram::CircleX {
            background: if opts.circlex_grid_black_bg {
                Rgb([0, 0, 0])
            } else {
                resolve_color(&screen.base_color_name)
            },
        },
    };
    Ok(CanvasPlan {
        width,
        height,
        diagram,
    })
}

/// Tile rectangles top-to-bottom, left-to-right. Each row takes its height
/// (and tile width) from the tile type governing that row.
pub fn layout_tiles(screen: &ScreenSpec, catalog: &TileCatalog) -> Result<Vec<TileCell>> {
    let mut cells = Vec::with_capacity((screen.rows as usize) * (screen.cols as usize));
    let mut index = 1u32;
    let mut y = 0i32;
    for row in 0..screen.rows {
        let tile = catalog.lookup(row_tile_type(screen, row))?;
        let mut x = 0i32;
        for col in 0..screen.cols {
            cells.push(TileCell {
                rect: Rect::new(x, y, tile.w_px, tile.h_px),
                row,
                col,
                index,
            });
            index += 1;
            x = x.saturating_add(tile.w_px as i32);
        }
        y = y.saturating_add(tile.h_px as i32);
    }
    Ok(cells)
}

/// Split `total` into `steps` heights differing by at most one pixel; the
/// remainder goes to the first bands.
pub fn step_heights(total: u32, steps: u32) -> Vec<u32> {
    if steps == 0 {
        return Vec::new();
    }
    let base = total / steps;
    let remainder = total % steps;
    (0..steps)
        .map(|i| base + u32::from(i < remainder))
        .collect()
}

/// Grey level of band `step` out of `steps`, from 0 (top) to 255 (bottom).
/// Halves round to even.
pub fn greyscale_value(step: u32, steps: u32) -> u8 {
    if steps <= 1 {
        return 0;
    }
    (255.0 * step as f64 / (steps - 1) as f64).round_ties_even() as u8
}

pub fn greyscale_bands(width: u32, height: u32) -> Vec<Band> {
    let mut y = 0i32;
    step_heights(height, GREYSCALE_STEPS)
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let band = Band {
                rect: Rect::new(0, y, width, h),
                value: greyscale_value(i as u32, GREYSCALE_STEPS),
            };
            y += h as i32;
            band
        })
        .collect()
}

/// Line positions of the calibration grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLines {
    /// x of each vertical line, starting flush at 0
    pub verticals: Vec<i32>,
    /// y of each horizontal line, shifted up by half the leftover height
    pub horizontals: Vec<i32>,
}

pub fn grid_lines(width: u32, height: u32, spacing: u32) -> GridLines {
    if spacing == 0 {
        return GridLines {
            verticals: Vec::new(),
            horizontals: Vec::new(),
        };
    }
    let step = spacing as usize;
    let verticals = (0..=width as i32).step_by(step).collect();
    let y_offset = ((height % spacing) / 2) as i32;
    let horizontals = (-y_offset..=height as i32).step_by(step).collect();
    GridLines {
        verticals,
        horizontals,
    }
}

/// Radius of the calibration circle.
pub fn target_radius(width: u32, height: u32) -> u32 {
    (width.min(height) as f64 * TARGET_RADIUS_FRAC).round_ties_even() as u32
}
