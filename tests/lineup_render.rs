//! End-to-end renders through the public API

use image::{Rgb, Rgba, RgbaImage};
use lineup::palette::{darken, lookup, TILE_SHADE};
use lineup::rendering::raster::{encode_png, fingerprint};
use lineup::{
    render_blockers, render_lineup, validate, Error, LineupType, Placement, RenderOptions,
    ScreenSpec, TileCatalog, TileType,
};

fn catalog() -> TileCatalog {
    [TileType::new("FULL", 216, 216), TileType::new("HALF", 216, 108)]
        .into_iter()
        .collect()
}

fn sca() -> ScreenSpec {
    ScreenSpec::new("SCA", "SCA/E", 6, 13, "FULL").with_secondary("HALF", Placement::Bottom, 1)
}

fn options(lineup_type: LineupType) -> RenderOptions {
    RenderOptions {
        lineup_type,
        show_overlay: false,
        ..Default::default()
    }
}

/// Top-left corner pixel (inset by 2) of every tile, row-major.
fn tile_corners(screen: &ScreenSpec) -> Vec<(u32, u32, u32, u32)> {
    let mut corners = Vec::new();
    let mut y = 0;
    for row in 0..screen.rows {
        let h = if row == screen.rows - 1 { 108 } else { 216 };
        for col in 0..screen.cols {
            corners.push((row, col, col * 216 + 2, y + 2));
        }
        y += h;
    }
    corners
}

#[test]
fn rgb_render_matches_tile_geometry() {
    let screen = sca().with_expected_size(2808, 1188);
    assert!(validate(&screen, &catalog()).is_empty());

    let image = render_lineup(&screen, &catalog(), &RenderOptions::default()).unwrap();
    assert_eq!((image.width(), image.height()), (2808, 1188));
}

#[test]
fn dual_color_checkerboard_uses_literal_colors() {
    let screen = sca().with_color("Red,Blue");
    let image = render_lineup(&screen, &catalog(), &options(LineupType::Rgb)).unwrap();

    let red = lookup("Red").unwrap();
    let blue = lookup("Blue").unwrap();
    for (row, col, x, y) in tile_corners(&screen) {
        let expected = if (row + col) % 2 == 0 { red } else { blue };
        assert_eq!(*image.get_pixel(x, y), expected, "tile ({}, {})", row, col);
    }
}

#[test]
fn single_color_checkerboard_darkens_even_tiles() {
    let screen = sca().with_color("#408000");
    let image = render_lineup(&screen, &catalog(), &options(LineupType::Rgb)).unwrap();

    let base = Rgb([0x40, 0x80, 0x00]);
    assert_eq!(*image.get_pixel(2, 2), darken(base, TILE_SHADE));
    assert_eq!(*image.get_pixel(218, 2), base);
    assert_eq!(*image.get_pixel(2, 218), base);
}

#[test]
fn greyscale_bands_cover_the_canvas() {
    let screen = sca().with_expected_size(64, 1100);
    let image = render_lineup(&screen, &catalog(), &options(LineupType::GreyscaleSteps)).unwrap();
    assert_eq!((image.width(), image.height()), (64, 1100));

    // 1100 / 11 = 100 rows per band
    assert_eq!(*image.get_pixel(10, 0), Rgb([0, 0, 0]));
    assert_eq!(*image.get_pixel(10, 150), Rgb([26, 26, 26]));
    assert_eq!(*image.get_pixel(63, 599), Rgb([128, 128, 128]));
    assert_eq!(*image.get_pixel(0, 1099), Rgb([255, 255, 255]));
}

#[test]
fn greyscale_falls_back_to_tile_geometry() {
    let image = render_lineup(&sca(), &catalog(), &options(LineupType::GreyscaleSteps)).unwrap();
    assert_eq!((image.width(), image.height()), (2808, 1188));
}

#[test]
fn circle_x_uses_declared_size_only() {
    let err = render_lineup(&sca(), &catalog(), &options(LineupType::CircleXGrid)).unwrap_err();
    assert!(matches!(err, Error::MissingExpectedSize(_)));

    let screen = ScreenSpec::new("LED", "LED", 2, 2, "UNKNOWN")
        .with_color("Red")
        .with_expected_size(640, 360);
    let image = render_lineup(&screen, &catalog(), &options(LineupType::CircleXGrid)).unwrap();
    assert_eq!((image.width(), image.height()), (640, 360));
    assert_eq!(*image.get_pixel(50, 50), Rgb([255, 0, 0]));
    // diagonals cross at the center
    assert_eq!(*image.get_pixel(320, 180), Rgb([255, 255, 255]));
    // border
    assert_eq!(*image.get_pixel(639, 200), Rgb([255, 255, 255]));

    let black = RenderOptions {
        circlex_grid_black_bg: true,
        ..options(LineupType::CircleXGrid)
    };
    let image = render_lineup(&screen, &catalog(), &black).unwrap();
    assert_eq!(*image.get_pixel(50, 50), Rgb([0, 0, 0]));
}

#[test]
fn circle_x_needs_both_axes_positive() {
    let opts = options(LineupType::CircleXGrid);

    let mut width_only = ScreenSpec::new("A", "A", 2, 2, "FULL");
    width_only.expected_w_px = Some(640);
    let err = render_lineup(&width_only, &catalog(), &opts).unwrap_err();
    assert!(matches!(err, Error::MissingExpectedSize(name) if name == "A"));

    let mut height_only = ScreenSpec::new("B", "B", 2, 2, "FULL");
    height_only.expected_h_px = Some(360);
    let err = render_lineup(&height_only, &catalog(), &opts).unwrap_err();
    assert!(matches!(err, Error::MissingExpectedSize(name) if name == "B"));

    let zero_height = ScreenSpec::new("C", "C", 2, 2, "FULL").with_expected_size(640, 0);
    let err = render_lineup(&zero_height, &catalog(), &opts).unwrap_err();
    assert!(matches!(err, Error::MissingExpectedSize(name) if name == "C"));
}

#[test]
fn unknown_tile_type_is_fatal() {
    let screen = ScreenSpec::new("X", "X", 2, 2, "MISSING");
    let err = render_lineup(&screen, &catalog(), &options(LineupType::Rgb)).unwrap_err();
    assert!(matches!(err, Error::UnknownTileType(id) if id == "MISSING"));
}

#[test]
fn branding_is_composited_bottom_left() {
    let mut branding = RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 255]));
    branding.put_pixel(0, 0, Rgba([0, 255, 0, 0]));

    let screen = sca().with_expected_size(110, 110);
    let opts = RenderOptions {
        branding_image: Some(branding),
        ..options(LineupType::GreyscaleSteps)
    };
    let image = render_lineup(&screen, &catalog(), &opts).unwrap();

    assert_eq!(*image.get_pixel(0, 109), Rgb([255, 0, 0]));
    assert_eq!(*image.get_pixel(19, 100), Rgb([255, 0, 0]));
    assert_eq!(*image.get_pixel(20, 109), Rgb([255, 255, 255]));
    // fully transparent pixel leaves the band underneath
    assert_eq!(*image.get_pixel(0, 100), Rgb([255, 255, 255]));
}

#[test]
fn oversized_branding_is_scaled_down() {
    let branding = RgbaImage::from_pixel(400, 40, Rgba([0, 0, 255, 255]));
    let screen = sca().with_expected_size(100, 110);
    let opts = RenderOptions {
        branding_image: Some(branding),
        ..options(LineupType::GreyscaleSteps)
    };
    let image = render_lineup(&screen, &catalog(), &opts).unwrap();

    // 400x40 scaled by 0.25 → 100x10 along the bottom edge
    assert_eq!(*image.get_pixel(50, 105), Rgb([0, 0, 255]));
    assert_eq!(*image.get_pixel(50, 95), Rgb([230, 230, 230]));
}

#[test]
fn overlay_changes_the_raster() {
    let screen = sca().with_expected_size(400, 220);
    let plain = render_lineup(&screen, &catalog(), &options(LineupType::GreyscaleSteps)).unwrap();
    let overlay = render_lineup(
        &screen,
        &catalog(),
        &RenderOptions {
            show_overlay: true,
            ..options(LineupType::GreyscaleSteps)
        },
    )
    .unwrap();
    assert_eq!(plain.dimensions(), overlay.dimensions());
    assert_ne!(fingerprint(&plain), fingerprint(&overlay));
    // the edges stay untouched
    assert_eq!(plain.get_pixel(0, 0), overlay.get_pixel(0, 0));
}

#[test]
fn renders_are_deterministic() {
    let opts = RenderOptions::default();
    let a = render_lineup(&sca(), &catalog(), &opts).unwrap();
    let b = render_lineup(&sca(), &catalog(), &opts).unwrap();
    assert_eq!(fingerprint(&a), fingerprint(&b));
    assert!(!encode_png(&a).unwrap().is_empty());
}

#[test]
fn readiness_gates_non_rgb_modes() {
    let bare = ScreenSpec::new("S", "", 2, 2, "FULL");
    assert!(render_blockers(&bare, LineupType::Rgb).is_empty());
    assert_eq!(render_blockers(&bare, LineupType::CircleXGrid).len(), 2);

    let ready = ScreenSpec::new("S", "S", 2, 2, "FULL").with_expected_size(100, 100);
    assert!(render_blockers(&ready, LineupType::GreyscaleSteps).is_empty());
}
