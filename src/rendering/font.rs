//! Font resolution, measurement, and size fitting.
//!
//! Fonts are located by file name through a fixed, ordered candidate chain:
//! the preferred name from the options, then `arial.ttf`, `Arial.ttf`,
//! `calibri.ttf`, `Calibri.ttf`, and `DejaVuSans.ttf`. Each candidate is
//! tried as a path first and then looked up in the working directory and
//! the platform font directories. When nothing loads, text falls back to a
//! built-in bitmap face so rendering never fails for lack of fonts.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use ab_glyph::{FontVec, PxScale};
use embedded_graphics::mono_font::iso_8859_1::FONT_10X20;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use log::{debug, warn};

/// Fallback candidates tried after the preferred font.
pub const FALLBACK_FONTS: [&str; 5] = [
    "arial.ttf",
    "Arial.ttf",
    "calibri.ttf",
    "Calibri.ttf",
    "DejaVuSans.ttf",
];

/// How deep font directories are searched.
const MAX_SEARCH_DEPTH: usize = 4;

const BUILTIN_FONT: &MonoFont<'static> = &FONT_10X20;

/// A loaded text face.
#[derive(Clone)]
pub enum Face {
    /// Scalable outline font loaded from disk
    Outline(Arc<FontVec>),
    /// Built-in 10x20 bitmap font, scaled by whole pixels
    Builtin,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline(_) => f.write_str("Face::Outline"),
            Face::Builtin => f.write_str("Face::Builtin"),
        }
    }
}

fn face_cache() -> &'static Mutex<HashMap<String, Face>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Face>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

impl Face {
    /// Resolve the face for `preferred`, consulting the process-wide cache.
    pub fn resolve(preferred: &str) -> Face {
        let mut cache = face_cache()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(face) = cache.get(preferred) {
            return face.clone();
        }
        let face = load_face(preferred, &search_dirs());
        cache.insert(preferred.to_string(), face.clone());
        face
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin)
    }

    /// Rendered `(width, height)` of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        match self {
            Face::Outline(font) => text_size(PxScale::from(size as f32), font.as_ref(), text),
            Face::Builtin => {
                let scale = builtin_scale(size);
                let advance = BUILTIN_FONT.character_size.width + BUILTIN_FONT.character_spacing;
                let chars = text.chars().count() as u32;
                if chars == 0 {
                    return (0, 0);
                }
                (
                    chars * advance * scale,
                    BUILTIN_FONT.character_size.height * scale,
                )
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, size: u32, rgb: Rgb<u8>) {
        match self {
            Face::Outline(font) => {
                draw_text_mut(canvas, rgb, x, y, PxScale::from(size as f32), font.as_ref(), text)
            }
            Face::Builtin => {
                let mut target = ScaledTarget {
                    canvas,
                    origin: (x, y),
                    scale: builtin_scale(size) as i32,
                };
                let Rgb([r, g, b]) = rgb;
                let style = MonoTextStyle::new(BUILTIN_FONT, Rgb888::new(r, g, b));
                Text::with_baseline(text, Point::zero(), style, Baseline::Top)
                    .draw(&mut target)
                    .ok();
            }
        }
    }
}

fn builtin_scale(size: u32) -> u32 {
    let glyph_h = BUILTIN_FONT.character_size.height as f32;
    ((size as f32 / glyph_h).round() as u32).max(1)
}

/// Draw target that blows each font pixel up into a `scale`-sized block.
struct ScaledTarget<'a> {
    canvas: &'a mut RgbImage,
    origin: (i32, i32),
    scale: i32,
}

impl OriginDimensions for ScaledTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawTarget for ScaledTarget<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = (self.canvas.width() as i32, self.canvas.height() as i32);
        for Pixel(Point { x, y }, color) in pixels {
            let left = self.origin.0 + x * self.scale;
            let top = self.origin.1 + y * self.scale;
            let rgb = Rgb([color.r(), color.g(), color.b()]);
            for py in top.max(0)..(top + self.scale).min(h) {
                for px in left.max(0)..(left + self.scale).min(w) {
                    self.canvas.put_pixel(px as u32, py as u32, rgb);
                }
            }
        }
        Ok(())
    }
}

/// Candidate names in probe order, without repeats.
pub fn candidate_names(preferred: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(FALLBACK_FONTS.len() + 1);
    for name in std::iter::once(preferred).chain(FALLBACK_FONTS) {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Directories searched for font files, most specific first.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(windir) = env::var_os("WINDIR") {
        dirs.push(Path::new(&windir).join("Fonts"));
    }
    if let Some(local) = env::var_os("LOCALAPPDATA") {
        dirs.push(Path::new(&local).join("Microsoft").join("Windows").join("Fonts"));
    }
    let home = env::var_os("HOME").map(PathBuf::from);
    if let Some(home) = &home {
        dirs.push(home.join("Library").join("Fonts"));
    }
    dirs.push(PathBuf::from("/Library/Fonts"));
    dirs.push(PathBuf::from("/System/Library/Fonts"));

    match env::var_os("XDG_DATA_HOME") {
        Some(data_home) => dirs.push(Path::new(&data_home).join("fonts")),
        None => {
            if let Some(home) = &home {
                dirs.push(home.join(".local").join("share").join("fonts"));
            }
        }
    }
    if let Some(home) = &home {
        dirs.push(home.join(".fonts"));
    }
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        dirs.push(Path::new(dir).join("fonts"));
    }
    dirs
}

fn find_file(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let candidate = dir.join(name);
    if candidate.is_file() {
        return Some(candidate);
    }
    if depth == 0 {
        return None;
    }
    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    // Sorted so the same host always resolves the same file.
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_file(sub, name, depth - 1))
}

fn locate(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    // Bare file names only; paths that don't exist are not searched for.
    if direct.components().count() != 1 {
        return None;
    }
    dirs.iter()
        .find_map(|dir| find_file(dir, name, MAX_SEARCH_DEPTH))
}

/// Walk the candidate chain over `dirs`, returning the first face that loads.
pub fn load_face(preferred: &str, dirs: &[PathBuf]) -> Face {
    let names = candidate_names(preferred);
    for name in &names {
        let Some(path) = locate(name, dirs) else {
            continue;
        };
        let loaded = fs::read(&path)
            .ok()
            .and_then(|bytes| FontVec::try_from_vec(bytes).ok());
        match loaded {
            Some(font) => {
                debug!("using font {}", path.display());
                return Face::Outline(Arc::new(font));
            }
            None => debug!("font {} could not be loaded", path.display()),
        }
    }
    warn!(
        "none of {:?} could be loaded; using the built-in bitmap font",
        names
    );
    Face::Builtin
}

/// Largest size in `[min_size, max(min_size, max_size)]` whose rendered
/// width fits in `max_width`, or `min_size` when nothing fits.
pub fn fit_size(face: &Face, text: &str, max_width: f32, max_size: u32, min_size: u32) -> u32 {
    let mut lo = min_size as i64;
    let mut hi = min_size.max(max_size) as i64;
    let mut best = min_size;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let (width, _) = face.measure(text, mid as u32);
        if width as f32 <= max_width {
            best = mid as u32;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_keep_order_and_drop_repeats() {
        assert_eq!(
            candidate_names("Helvetica.ttf"),
            vec![
                "Helvetica.ttf",
                "arial.ttf",
                "Arial.ttf",
                "calibri.ttf",
                "Calibri.ttf",
                "DejaVuSans.ttf"
            ]
        );
        assert_eq!(candidate_names("arial.ttf").len(), 5);
        assert_eq!(candidate_names("  ")[0], "arial.ttf");
    }

    #[test]
    fn empty_search_path_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let face = load_face("no-such-font.ttf", &[dir.path().to_path_buf()]);
        assert!(face.is_builtin());
    }

    #[test]
    fn unreadable_font_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("arial.ttf"), b"not a font").unwrap();
        let face = load_face("arial.ttf", &[dir.path().to_path_buf()]);
        assert!(face.is_builtin());
    }

    #[test]
    fn nested_directories_are_searched() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("truetype").join("vendor");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("custom.ttf"), b"x").unwrap();
        assert_eq!(
            locate("custom.ttf", &[dir.path().to_path_buf()]),
            Some(nested.join("custom.ttf"))
        );
        assert_eq!(locate("missing.ttf", &[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn builtin_measure_scales_with_size() {
        let face = Face::Builtin;
        assert_eq!(face.measure("", 40), (0, 0));
        assert_eq!(face.measure("AB", 10), (20, 20));
        assert_eq!(face.measure("AB", 20), (20, 20));
        assert_eq!(face.measure("AB", 40), (40, 40));
        assert_eq!(face.measure("AB", 61), (60, 60));
    }

    #[test]
    fn fit_picks_largest_fitting_size() {
        let face = Face::Builtin;
        // "ABCD" is 40px wide per scale step; scale 3 (size 50..=69) fits 120px.
        assert_eq!(fit_size(&face, "ABCD", 120.0, 200, 10), 69);
        // Nothing fits: the floor is returned.
        assert_eq!(fit_size(&face, "ABCD", 5.0, 200, 10), 10);
        // max below min collapses to min.
        assert_eq!(fit_size(&face, "A", 1000.0, 4, 16), 16);
    }

    #[test]
    fn outline_face_measures_fits_and_draws() {
        let face = load_face("DejaVuSans.ttf", &search_dirs());
        if face.is_builtin() {
            println!("No outline font installed on this host; skipping.");
            return;
        }

        let (w20, h20) = face.measure("Lineup", 20);
        let (w40, h40) = face.measure("Lineup", 40);
        assert!(w20 > 0 && h20 > 0);
        assert!(w40 > w20 && h40 > h20);

        let size = fit_size(&face, "SCA/E", 151.2, 216, 10);
        assert!(face.measure("SCA/E", size).0 as f32 <= 151.2);
        if size < 216 {
            assert!(face.measure("SCA/E", size + 1).0 as f32 > 151.2);
        }

        let mut canvas = RgbImage::new(200, 60);
        face.draw(&mut canvas, 0, 0, "Lineup", 32, Rgb([255, 255, 255]));
        assert!(canvas.pixels().any(|p| p.0.iter().any(|c| *c > 0)));
    }

    #[test]
    fn builtin_draw_is_clipped_to_canvas() {
        let mut canvas = RgbImage::new(30, 30);
        Face::Builtin.draw(&mut canvas, -500, -500, "WWW", 40, Rgb([255, 255, 255]));
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
        Face::Builtin.draw(&mut canvas, 25, 25, "WWW", 40, Rgb([255, 255, 255]));
        Face::Builtin.draw(&mut canvas, 0, 0, "WWW", 40, Rgb([255, 255, 255]));
        assert!(canvas.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }
}
