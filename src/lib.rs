//! Lineup guide rasterizer
//!
//! Turns a declarative description of an LED video-wall screen (tile grid,
//! tile types, optional half-height band, color) into a lineup guide image:
//! a diagram installers use to check tile order, numbering, and alignment.
//!
//! # Features
//!
//! - **Three diagram styles**: checkerboard RGB tile grid, 11-step greyscale
//!   ramp, and a circle/X calibration grid
//! - **Validation**: advisory warnings for catalog and resolution mismatches
//! - **Auto-fit text**: tile labels, tile numbers, and the centered overlay
//!   are sized to fit, with a font fallback chain ending in a built-in face
//!
//! # Example
//!
//! ```no_run
//! use lineup::{Placement, RenderOptions, ScreenSpec, TileCatalog, TileType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog: TileCatalog = [TileType::new("FULL", 216, 216), TileType::new("HALF", 216, 108)]
//!     .into_iter()
//!     .collect();
//! let screen = ScreenSpec::new("SCA", "SCA/E", 6, 13, "FULL")
//!     .with_secondary("HALF", Placement::Bottom, 1)
//!     .with_color("Red");
//!
//! for warning in lineup::validate(&screen, &catalog) {
//!     eprintln!("warning: {}", warning);
//! }
//!
//! let image = lineup::render_lineup(&screen, &catalog, &RenderOptions::default())?;
//! assert_eq!((image.width(), image.height()), (2808, 1188));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod model;
pub use model::{
    row_tile_type, screen_resolution, Placement, ScreenSpec, SecondaryBand, TileCatalog,
    TileType,
};

pub mod palette;

pub mod validate;
pub use validate::{render_blockers, validate, Warning};

// Tabular row normalization and job files
pub mod sheet;
pub use sheet::Job;

pub mod rendering;
pub use rendering::render as render_lineup;

/// Diagram style of a lineup guide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum LineupType {
    /// Checkerboard tile grid with labels and tile numbers
    #[default]
    #[serde(rename = "RGB")]
    #[value(name = "rgb")]
    Rgb,
    /// Eleven horizontal grey bands from black to white
    #[serde(rename = "GreyscaleSteps")]
    #[value(name = "greyscale")]
    GreyscaleSteps,
    /// Grid, circle, and diagonals for alignment
    #[serde(rename = "CircleXGrid")]
    #[value(name = "circle-x")]
    CircleXGrid,
}

impl LineupType {
    pub fn label(&self) -> &'static str {
        match self {
            LineupType::Rgb => "RGB",
            LineupType::GreyscaleSteps => "GreyscaleSteps",
            LineupType::CircleXGrid => "CircleXGrid",
        }
    }
}

impl fmt::Display for LineupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LineupType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "RGB" => Ok(LineupType::Rgb),
            "GreyscaleSteps" => Ok(LineupType::GreyscaleSteps),
            "CircleXGrid" => Ok(LineupType::CircleXGrid),
            other => Err(Error::Other(format!("unknown lineup type '{}'", other))),
        }
    }
}

/// Options for a single render call
///
/// The defaults match what installers expect from an exported guide:
/// white tile text, white overlay text with a black outline, and the
/// overlay enabled. Fractions are relative to the dimension named in each
/// field's doc.
///
/// # Examples
///
/// ```
/// let opts = lineup::RenderOptions::default();
/// assert!(opts.show_overlay);
/// assert_eq!(opts.lineup_type, lineup::LineupType::Rgb);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Tile label and tile number color
    pub tile_text_rgb: [u8; 3],
    /// Overlay text fill
    pub overlay_text_rgb: [u8; 3],
    /// Overlay text outline
    pub outline_rgb: [u8; 3],
    /// Outline thickness, relative to the shorter canvas side
    pub outline_frac: f32,
    /// Maximum tile label width, relative to the tile width
    pub tile_label_width_frac: f32,
    /// Overlay title size cap, relative to the shorter canvas side
    pub overlay_title_frac: f32,
    /// Overlay resolution line size cap, relative to the shorter canvas side
    pub overlay_sub_frac: f32,
    /// Preferred font file; see [`rendering::font`] for the fallback chain
    pub font_name: String,
    /// Draw the centered screen name and resolution
    pub show_overlay: bool,
    /// Use a black background instead of the screen color for Circle-X
    pub circlex_grid_black_bg: bool,
    /// Optional branding image, composited at the bottom-left corner
    #[serde(skip)]
    pub branding_image: Option<RgbaImage>,
    pub lineup_type: LineupType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tile_text_rgb: [255, 255, 255],
            overlay_text_rgb: [255, 255, 255],
            outline_rgb: [0, 0, 0],
            outline_frac: 0.0035,
            tile_label_width_frac: 0.70,
            overlay_title_frac: 0.18,
            overlay_sub_frac: 0.085,
            font_name: "arial.ttf".to_string(),
            show_overlay: true,
            circlex_grid_black_bg: false,
            branding_image: None,
            lineup_type: LineupType::Rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.tile_text_rgb, [255, 255, 255]);
        assert_eq!(opts.outline_rgb, [0, 0, 0]);
        assert_eq!(opts.font_name, "arial.ttf");
        assert!(opts.branding_image.is_none());
        assert!(!opts.circlex_grid_black_bg);
    }

    #[test]
    fn test_options_from_partial_json() {
        let opts: RenderOptions =
            serde_json::from_str(r#"{"show_overlay": false, "lineup_type": "CircleXGrid"}"#)
                .unwrap();
        assert!(!opts.show_overlay);
        assert_eq!(opts.lineup_type, LineupType::CircleXGrid);
        assert_eq!(opts.tile_label_width_frac, 0.70);
    }

    #[test]
    fn test_lineup_type_labels() {
        for t in [
            LineupType::Rgb,
            LineupType::GreyscaleSteps,
            LineupType::CircleXGrid,
        ] {
            assert_eq!(t.label().parse::<LineupType>().unwrap(), t);
        }
        assert!("Plaid".parse::<LineupType>().is_err());
    }
}
