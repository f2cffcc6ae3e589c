//! Normalization of already-parsed tabular rows into tile catalogs and screens.
//!
//! Two row shapes are accepted. Keyed rows name their fields (`tile_type_id`,
//! `rows`, `cols`, ...). Positional "screen notes" rows follow the column
//! layout of the production screen notes sheet, where tile types are derived
//! from the tile pixel size and a fractional row count marks a half-height
//! row.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use crate::model::{Placement, ScreenSpec, TileCatalog, TileType};
use crate::palette::FALLBACK_COLOR;
use crate::{Error, RenderOptions, Result};

/// One spreadsheet cell as it arrives from the parser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Trimmed text, or `None` when blank.
    pub fn text(&self) -> Option<String> {
        let raw = match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        };
        (!raw.is_empty()).then_some(raw)
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

fn clean(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().and_then(Cell::text)
}

/// Parse an integral cell. Decimal text is accepted only when it has no
/// fractional part.
fn integer(cell: &Option<Cell>, label: &str, row: usize) -> Result<Option<i64>> {
    let Some(cell) = cell.as_ref().filter(|c| c.text().is_some()) else {
        return Ok(None);
    };
    let value = match cell {
        Cell::Int(v) => Some(*v),
        _ => cell
            .number()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64),
    };
    match value {
        Some(v) => Ok(Some(v)),
        None => Err(Error::invalid_row(
            row,
            format!("invalid {} '{}'", label, cell.text().unwrap_or_default()),
        )),
    }
}

fn required_integer(cell: &Option<Cell>, label: &str, row: usize) -> Result<i64> {
    integer(cell, label, row)?
        .ok_or_else(|| Error::invalid_row(row, format!("missing {}", label)))
}

fn to_u32(value: i64, label: &str, row: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::invalid_row(row, format!("{} out of range: {}", label, value)))
}

fn positive(value: i64, label: &str, row: usize) -> Result<u32> {
    if value <= 0 {
        return Err(Error::invalid_row(
            row,
            format!("{} must be positive, got {}", label, value),
        ));
    }
    to_u32(value, label, row)
}

/// A keyed tile type row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TileRow {
    pub tile_type_id: Option<Cell>,
    pub tile_type: Option<Cell>,
    pub id: Option<Cell>,
    pub w_px: Option<Cell>,
    pub h_px: Option<Cell>,
}

/// A keyed screen row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScreenRow {
    pub screen_name: Option<Cell>,
    pub tile_label: Option<Cell>,
    pub rows: Option<Cell>,
    pub cols: Option<Cell>,
    pub default_tile_type_id: Option<Cell>,
    pub secondary_tile_type_id: Option<Cell>,
    pub secondary_placement: Option<Cell>,
    pub secondary_rows: Option<Cell>,
    pub base_color_name: Option<Cell>,
    pub expected_w_px: Option<Cell>,
    pub expected_h_px: Option<Cell>,
}

/// Build a catalog from keyed tile rows. Row numbers in errors are 1-based.
pub fn load_tiles(rows: &[TileRow]) -> Result<TileCatalog> {
    let mut catalog = TileCatalog::new();
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let tile_type_id = clean(&row.tile_type_id)
            .or_else(|| clean(&row.tile_type))
            .or_else(|| clean(&row.id))
            .ok_or_else(|| Error::invalid_row(row_num, "missing tile_type_id"))?;
        let w_px = positive(required_integer(&row.w_px, "w_px", row_num)?, "w_px", row_num)?;
        let h_px = positive(required_integer(&row.h_px, "h_px", row_num)?, "h_px", row_num)?;
        catalog.insert(TileType::new(tile_type_id, w_px, h_px));
    }
    Ok(catalog)
}

/// Normalize keyed screen rows: trim text, default the name, label, and
/// color, and pair the secondary tile type with its placement.
pub fn load_screens(rows: &[ScreenRow]) -> Result<Vec<ScreenSpec>> {
    let mut screens = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let screen_name = clean(&row.screen_name);
        let tile_label = clean(&row.tile_label)
            .or_else(|| screen_name.clone())
            .unwrap_or_default();
        let screen_name = screen_name.unwrap_or_else(|| "SCREEN".to_string());

        let rows_count = to_u32(required_integer(&row.rows, "rows", row_num)?, "rows", row_num)?;
        let cols = to_u32(required_integer(&row.cols, "cols", row_num)?, "cols", row_num)?;
        let default_tile_type_id = clean(&row.default_tile_type_id).unwrap_or_default();

        let mut screen =
            ScreenSpec::new(screen_name, tile_label, rows_count, cols, default_tile_type_id)
                .with_color(clean(&row.base_color_name).unwrap_or_else(|| FALLBACK_COLOR.to_string()));

        let secondary_rows = integer(&row.secondary_rows, "secondary_rows", row_num)?.unwrap_or(0);
        screen.secondary_rows = i32::try_from(secondary_rows).map_err(|_| {
            Error::invalid_row(row_num, format!("secondary_rows out of range: {}", secondary_rows))
        })?;
        let secondary_id = clean(&row.secondary_tile_type_id);
        let placement = clean(&row.secondary_placement)
            .map(|p| p.parse::<Placement>())
            .transpose()
            .map_err(|e| Error::invalid_row(row_num, e.to_string()))?;
        match (secondary_id, placement) {
            (Some(id), Some(placement)) => {
                let band_rows = screen.secondary_rows;
                screen = screen.with_secondary(id, placement, band_rows);
            }
            (None, None) => {
                if screen.secondary_rows != 0 {
                    warn!(
                        "row {}: secondary_rows={} set without a secondary tile type",
                        row_num, screen.secondary_rows
                    );
                }
            }
            (Some(_), None) => {
                return Err(Error::invalid_row(
                    row_num,
                    "secondary_placement is required when secondary_tile_type_id is set",
                ))
            }
            (None, Some(_)) => {
                return Err(Error::invalid_row(
                    row_num,
                    "secondary_tile_type_id is required when secondary_placement is set",
                ))
            }
        }

        let expected_w = integer(&row.expected_w_px, "expected_w_px", row_num)?;
        let expected_h = integer(&row.expected_h_px, "expected_h_px", row_num)?;
        screen.expected_w_px = expected_w
            .map(|v| to_u32(v, "expected_w_px", row_num))
            .transpose()?;
        screen.expected_h_px = expected_h
            .map(|v| to_u32(v, "expected_h_px", row_num))
            .transpose()?;

        screens.push(screen);
    }
    Ok(screens)
}

// Screen notes sheet columns (0-based)
pub const COL_SCREEN_COUNT: usize = 1;
pub const COL_SCREEN_NAME: usize = 2;
pub const COL_TILE_LABEL: usize = 3;
pub const COL_BASE_COLOR: usize = 4;
pub const COL_EXPECTED_W: usize = 5;
pub const COL_EXPECTED_H: usize = 6;
pub const COL_COLS: usize = 13;
pub const COL_ROWS: usize = 14;
pub const COL_SECONDARY_PLACEMENT: usize = 16;
pub const COL_TILE_W: usize = 36;
pub const COL_TILE_H: usize = 37;

fn cell_at(row: &[Option<Cell>], idx: usize) -> Option<String> {
    row.get(idx).and_then(clean)
}

fn number_at(row: &[Option<Cell>], idx: usize) -> Option<f64> {
    row.get(idx)
        .and_then(|c| c.as_ref())
        .filter(|c| c.text().is_some())
        .and_then(Cell::number)
        .filter(|v| v.is_finite())
}

fn sheet_int(row: &[Option<Cell>], idx: usize, label: &str, row_num: usize) -> Result<Option<u32>> {
    if cell_at(row, idx).is_none() {
        return Ok(None);
    }
    let value = number_at(row, idx).ok_or_else(|| {
        Error::invalid_row(
            row_num,
            format!("invalid {} '{}'", label, cell_at(row, idx).unwrap_or_default()),
        )
    })?;
    // Sheet values are truncated toward zero, as the sheet displays them.
    to_u32(value.trunc() as i64, label, row_num).map(Some)
}

/// Normalize positional screen notes rows.
///
/// Rows without a delivery label, or whose layout or tile size cells are not
/// numeric, are header or note rows and are skipped. Tile types are keyed by
/// `"{w}x{h}"`; a fractional row count adds one half-height row.
pub fn load_sheet(rows: &[Vec<Option<Cell>>]) -> Result<(TileCatalog, Vec<ScreenSpec>)> {
    let mut catalog = TileCatalog::new();
    let mut screens = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        let Some(tile_label) = cell_at(row, COL_TILE_LABEL) else {
            continue;
        };
        let (Some(cols_raw), Some(rows_raw), Some(w_raw), Some(h_raw)) = (
            number_at(row, COL_COLS),
            number_at(row, COL_ROWS),
            number_at(row, COL_TILE_W),
            number_at(row, COL_TILE_H),
        ) else {
            debug!("sheet row {} skipped: layout or tile size is not numeric", row_num);
            continue;
        };

        let cols = to_u32(cols_raw.trunc() as i64, "cols", row_num)?;
        let w_px = positive(w_raw.trunc() as i64, "tile w_px", row_num)?;
        let h_px = positive(h_raw.trunc() as i64, "tile h_px", row_num)?;

        let screen_name = cell_at(row, COL_SCREEN_NAME).unwrap_or_else(|| "SCREEN".to_string());
        let base_color = cell_at(row, COL_BASE_COLOR).unwrap_or_else(|| FALLBACK_COLOR.to_string());

        let default_id = format!("{}x{}", w_px, h_px);
        if !catalog.contains(&default_id) {
            catalog.insert(TileType::new(default_id.clone(), w_px, h_px));
        }

        let full_rows = to_u32(rows_raw.trunc() as i64, "rows", row_num)?;
        let has_half_row = rows_raw.fract() != 0.0;
        let total_rows = if has_half_row {
            full_rows.checked_add(1).ok_or_else(|| {
                Error::invalid_row(row_num, format!("rows out of range: {}", rows_raw))
            })?
        } else {
            full_rows
        };

        let mut screen = ScreenSpec::new(screen_name, tile_label, total_rows, cols, default_id)
            .with_color(base_color);

        if has_half_row {
            let placement = cell_at(row, COL_SECONDARY_PLACEMENT)
                .and_then(|p| p.parse::<Placement>().ok())
                .unwrap_or(Placement::Bottom);
            let half_h = h_px / 2;
            if half_h == 0 {
                return Err(Error::invalid_row(
                    row_num,
                    format!("invalid half-height for tile h_px {}", h_px),
                ));
            }
            let half_id = format!("{}x{}", w_px, half_h);
            if !catalog.contains(&half_id) {
                catalog.insert(TileType::new(half_id.clone(), w_px, half_h));
            }
            screen = screen.with_secondary(half_id, placement, 1);
        }

        screen.expected_w_px = sheet_int(row, COL_EXPECTED_W, "expected_w_px", row_num)?;
        screen.expected_h_px = sheet_int(row, COL_EXPECTED_H, "expected_h_px", row_num)?;
        screens.push(screen);
    }

    if screens.is_empty() {
        return Err(Error::NoScreens);
    }
    Ok((catalog, screens))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobFile {
    tiles: Vec<TileRow>,
    screens: Vec<ScreenRow>,
    sheet: Option<Vec<Vec<Option<Cell>>>>,
    options: Option<RenderOptions>,
}

/// A normalized render job: catalog, screens, and render options.
#[derive(Debug, Clone)]
pub struct Job {
    pub catalog: TileCatalog,
    pub screens: Vec<ScreenSpec>,
    pub options: RenderOptions,
}

impl Job {
    /// Parse a JSON job document.
    ///
    /// When a `sheet` array is present it takes precedence over keyed
    /// `tiles`/`screens` rows.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: JobFile = serde_json::from_str(text)?;
        let (catalog, screens) = match &file.sheet {
            Some(rows) => load_sheet(rows)?,
            None => (load_tiles(&file.tiles)?, load_screens(&file.screens)?),
        };
        debug!(
            "job loaded: {} tile types, {} screens",
            catalog.len(),
            screens.len()
        );
        Ok(Self {
            catalog,
            screens,
            options: file.options.unwrap_or_default(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn screen(&self, screen_name: &str) -> Option<&ScreenSpec> {
        self.screens.iter().find(|s| s.screen_name == screen_name)
    }
}
