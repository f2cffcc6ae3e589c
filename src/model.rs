//! Screen geometry: tile types, screen specs, and the resolution math.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::palette::FALLBACK_COLOR;
use crate::{Error, Result};

/// One physical LED tile type with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileType {
    pub tile_type_id: String,
    pub w_px: u32,
    pub h_px: u32,
}

impl TileType {
    pub fn new(tile_type_id: impl Into<String>, w_px: u32, h_px: u32) -> Self {
        Self {
            tile_type_id: tile_type_id.into(),
            w_px,
            h_px,
        }
    }
}

/// Where the secondary band of rows sits on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Placement::Top),
            "bottom" => Ok(Placement::Bottom),
            other => Err(Error::Other(format!("unknown placement '{}'", other))),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Top => f.write_str("top"),
            Placement::Bottom => f.write_str("bottom"),
        }
    }
}

/// A contiguous run of rows at the top or bottom of a screen that uses a
/// different tile type (typically half-height tiles).
///
/// Tile type and placement always travel together; the row count lives on
/// [`ScreenSpec::secondary_rows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryBand {
    pub tile_type_id: String,
    pub placement: Placement,
}

/// Declarative description of one physical screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSpec {
    /// Display name, used for selection and as the overlay title
    pub screen_name: String,
    /// Delivery label printed on every tile
    pub tile_label: String,
    pub rows: u32,
    pub cols: u32,
    pub default_tile_type_id: String,
    pub secondary: Option<SecondaryBand>,
    /// Rows in the secondary band. Signed and kept even without a band so
    /// malformed counts reach the validator; non-positive means inactive.
    #[serde(default)]
    pub secondary_rows: i32,
    /// Palette key, `#RRGGBB`, or two comma-separated palette keys
    pub base_color_name: String,
    pub expected_w_px: Option<u32>,
    pub expected_h_px: Option<u32>,
}

impl ScreenSpec {
    pub fn new(
        screen_name: impl Into<String>,
        tile_label: impl Into<String>,
        rows: u32,
        cols: u32,
        default_tile_type_id: impl Into<String>,
    ) -> Self {
        Self {
            screen_name: screen_name.into(),
            tile_label: tile_label.into(),
            rows,
            cols,
            default_tile_type_id: default_tile_type_id.into(),
            secondary: None,
            secondary_rows: 0,
            base_color_name: FALLBACK_COLOR.to_string(),
            expected_w_px: None,
            expected_h_px: None,
        }
    }

    pub fn with_secondary(
        mut self,
        tile_type_id: impl Into<String>,
        placement: Placement,
        rows: i32,
    ) -> Self {
        self.secondary = Some(SecondaryBand {
            tile_type_id: tile_type_id.into(),
            placement,
        });
        self.secondary_rows = rows;
        self
    }

    pub fn with_color(mut self, base_color_name: impl Into<String>) -> Self {
        self.base_color_name = base_color_name.into();
        self
    }

    pub fn with_expected_size(mut self, w_px: u32, h_px: u32) -> Self {
        self.expected_w_px = Some(w_px);
        self.expected_h_px = Some(h_px);
        self
    }

    /// The declared resolution, when both axes are present and positive.
    pub fn expected_size(&self) -> Option<(u32, u32)> {
        match (self.expected_w_px, self.expected_h_px) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Tile types keyed by id. Screens refer into it by string key only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCatalog {
    tiles: BTreeMap<String, TileType>,
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tile type, replacing any previous entry with the same id.
    pub fn insert(&mut self, tile: TileType) {
        self.tiles.insert(tile.tile_type_id.clone(), tile);
    }

    pub fn get(&self, tile_type_id: &str) -> Option<&TileType> {
        self.tiles.get(tile_type_id)
    }

    /// Like [`TileCatalog::get`] but fails with [`Error::UnknownTileType`].
    pub fn lookup(&self, tile_type_id: &str) -> Result<&TileType> {
        self.get(tile_type_id)
            .ok_or_else(|| Error::UnknownTileType(tile_type_id.to_string()))
    }

    pub fn contains(&self, tile_type_id: &str) -> bool {
        self.tiles.contains_key(tile_type_id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileType> {
        self.tiles.values()
    }
}

impl FromIterator<TileType> for TileCatalog {
    fn from_iter<I: IntoIterator<Item = TileType>>(iter: I) -> Self {
        let mut catalog = TileCatalog::new();
        for tile in iter {
            catalog.insert(tile);
        }
        catalog
    }
}

/// Tile type id governing the 0-indexed `row`.
pub fn row_tile_type(screen: &ScreenSpec, row: u32) -> &str {
    let band = match &screen.secondary {
        Some(band) if screen.secondary_rows > 0 => band,
        _ => return &screen.default_tile_type_id,
    };
    let band_rows = screen.secondary_rows as u32;
    let in_band = match band.placement {
        Placement::Top => row < band_rows,
        Placement::Bottom => row >= screen.rows.saturating_sub(band_rows),
    };
    if in_band {
        &band.tile_type_id
    } else {
        &screen.default_tile_type_id
    }
}

/// Total `(width, height)` of the screen in pixels.
///
/// Width always comes from the default tile type; a mismatched secondary
/// width is reported by the validator, not here.
pub fn screen_resolution(screen: &ScreenSpec, catalog: &TileCatalog) -> Result<(u32, u32)> {
    let default_tile = catalog.lookup(&screen.default_tile_type_id)?;
    let width = screen.cols.saturating_mul(default_tile.w_px);

    let mut height = 0u32;
    for row in 0..screen.rows {
        let tile = catalog.lookup(row_tile_type(screen, row))?;
        height = height.saturating_add(tile.h_px);
    }
    Ok((width, height))
}
