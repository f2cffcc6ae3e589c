//! Advisory consistency checks for a screen against the tile catalog.

use thiserror::Error;

use crate::model::{screen_resolution, ScreenSpec, TileCatalog};
use crate::LineupType;

/// A human-readable consistency warning. Warnings never block a render on
/// their own; `Display` yields the message shown to the operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("Default tile type '{0}' not found in tile definitions")]
    MissingDefaultTile(String),

    #[error("Secondary tile type '{0}' not found in tile definitions")]
    MissingSecondaryTile(String),

    #[error("secondary_rows cannot be negative")]
    NegativeSecondaryRows,

    #[error("secondary_rows exceeds total rows")]
    SecondaryRowsExceedRows,

    #[error(
        "Tile widths differ: default={default_w}px secondary={secondary_w}px. This may create row width mismatches."
    )]
    TileWidthMismatch { default_w: u32, secondary_w: u32 },

    #[error("Expected width {expected}px but computed {computed}px")]
    WidthMismatch { expected: u32, computed: u32 },

    #[error("Expected height {expected}px but computed {computed}px")]
    HeightMismatch { expected: u32, computed: u32 },

    #[error("Delivery label is required for {0} lineups")]
    MissingTileLabel(LineupType),

    #[error("Expected pixel width/height are required for {0} lineups")]
    MissingExpectedSize(LineupType),
}

/// Cross-check `screen` against `catalog`.
///
/// Checks run in a fixed order and accumulate; only a missing default tile
/// type stops early since nothing else can be computed without it.
pub fn validate(screen: &ScreenSpec, catalog: &TileCatalog) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let default_tile = match catalog.get(&screen.default_tile_type_id) {
        Some(tile) => tile,
        None => {
            warnings.push(Warning::MissingDefaultTile(
                screen.default_tile_type_id.clone(),
            ));
            return warnings;
        }
    };

    let secondary_tile = match &screen.secondary {
        Some(band) => {
            let tile = catalog.get(&band.tile_type_id);
            if tile.is_none() {
                warnings.push(Warning::MissingSecondaryTile(band.tile_type_id.clone()));
            }
            tile
        }
        None => None,
    };

    let secondary_rows = screen.secondary_rows;
    if secondary_rows < 0 {
        warnings.push(Warning::NegativeSecondaryRows);
    }
    if secondary_rows > 0 && secondary_rows as u32 > screen.rows {
        warnings.push(Warning::SecondaryRowsExceedRows);
    }

    if let Some(secondary_tile) = secondary_tile {
        if secondary_tile.w_px != default_tile.w_px {
            warnings.push(Warning::TileWidthMismatch {
                default_w: default_tile.w_px,
                secondary_w: secondary_tile.w_px,
            });
        }
    }

    // A missing secondary type was already reported above.
    if let Ok((computed_w, computed_h)) = screen_resolution(screen, catalog) {
        if let Some(expected) = screen.expected_w_px {
            if expected != computed_w {
                warnings.push(Warning::WidthMismatch {
                    expected,
                    computed: computed_w,
                });
            }
        }
        if let Some(expected) = screen.expected_h_px {
            if expected != computed_h {
                warnings.push(Warning::HeightMismatch {
                    expected,
                    computed: computed_h,
                });
            }
        }
    }

    warnings
}

/// Caller-side policy: which screens may be rendered in `lineup` mode.
///
/// RGB grids are always renderable. Greyscale and Circle-X lineups are
/// delivered by label at a declared resolution, so both must be present.
/// An empty result means the screen is ready.
pub fn render_blockers(screen: &ScreenSpec, lineup: LineupType) -> Vec<Warning> {
    let mut blockers = Vec::new();
    if lineup == LineupType::Rgb {
        return blockers;
    }
    if screen.tile_label.trim().is_empty() {
        blockers.push(Warning::MissingTileLabel(lineup));
    }
    if screen.expected_size().is_none() {
        blockers.push(Warning::MissingExpectedSize(lineup));
    }
    blockers
}
