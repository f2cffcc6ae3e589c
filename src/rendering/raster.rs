/// Rasterizer: executes paint commands on an RGB canvas

use std::io::Cursor;

use image::{ImageFormat, Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use sha2::{Digest, Sha256};

use super::font::Face;
use super::layout::Rect;
use super::paint::PaintCommand;
use crate::Result;

/// Run `commands` in order on a black `width` x `height` canvas.
pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand], face: &Face) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    for command in commands {
        match command {
            PaintCommand::FillRect { rect, rgb } => fill_rect(&mut canvas, *rect, *rgb),
            PaintCommand::StrokeRect { rect, width, rgb } => {
                stroke_rect(&mut canvas, *rect, *width, *rgb)
            }
            PaintCommand::Line {
                from,
                to,
                width,
                rgb,
            } => draw_line(&mut canvas, *from, *to, *width, *rgb),
            PaintCommand::Ring {
                center,
                radius,
                width,
                rgb,
            } => draw_ring(&mut canvas, *center, *radius, *width, *rgb),
            PaintCommand::Text {
                x,
                y,
                text,
                size,
                rgb,
                outline,
            } => {
                let (mut x, mut y) = (*x, *y);
                if let Some(outline) = outline {
                    let r = outline.width as i32;
                    x += r;
                    y += r;
                    for dy in -r..=r {
                        for dx in -r..=r {
                            if (dx != 0 || dy != 0) && dx * dx + dy * dy <= r * r {
                                face.draw(&mut canvas, x + dx, y + dy, text, *size, outline.rgb);
                            }
                        }
                    }
                }
                face.draw(&mut canvas, x, y, text, *size, *rgb);
            }
            PaintCommand::Composite { x, y, image } => composite(&mut canvas, image, *x, *y),
        }
    }
    canvas
}

fn to_imageproc_rect(rect: Rect) -> Option<imageproc::rect::Rect> {
    (rect.width > 0 && rect.height > 0)
        .then(|| imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width, rect.height))
}

fn fill_rect(canvas: &mut RgbImage, rect: Rect, rgb: Rgb<u8>) {
    if let Some(r) = to_imageproc_rect(rect) {
        draw_filled_rect_mut(canvas, r, rgb);
    }
}

fn stroke_rect(canvas: &mut RgbImage, rect: Rect, width: u32, rgb: Rgb<u8>) {
    let w = width.min(rect.width).min(rect.height);
    let right = rect.x + rect.width as i32 - w as i32;
    let bottom = rect.y + rect.height as i32 - w as i32;
    fill_rect(canvas, Rect::new(rect.x, rect.y, rect.width, w), rgb);
    fill_rect(canvas, Rect::new(rect.x, bottom, rect.width, w), rgb);
    fill_rect(canvas, Rect::new(rect.x, rect.y, w, rect.height), rgb);
    fill_rect(canvas, Rect::new(right, rect.y, w, rect.height), rgb);
}

/// Thick line centered on the segment. Axis-aligned lines become exact
/// rectangles; anything else is filled as a quad.
fn draw_line(canvas: &mut RgbImage, from: (f32, f32), to: (f32, f32), width: u32, rgb: Rgb<u8>) {
    let half = width as f32 / 2.0;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if dx == 0.0 || dy == 0.0 {
        let left = from.0.min(to.0) - if dx == 0.0 { half } else { 0.0 };
        let top = from.1.min(to.1) - if dy == 0.0 { half } else { 0.0 };
        let w = if dx == 0.0 { width as f32 } else { dx.abs() };
        let h = if dy == 0.0 { width as f32 } else { dy.abs() };
        fill_rect(
            canvas,
            Rect::new(left.floor() as i32, top.floor() as i32, w.ceil() as u32, h.ceil() as u32),
            rgb,
        );
        return;
    }
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = (-dy / len * half, dx / len * half);
    let corner = |x: f32, y: f32| Point::new(x.round() as i32, y.round() as i32);
    let quad = [
        corner(from.0 + nx, from.1 + ny),
        corner(to.0 + nx, to.1 + ny),
        corner(to.0 - nx, to.1 - ny),
        corner(from.0 - nx, from.1 - ny),
    ];
    if quad[0] != quad[3] {
        draw_polygon_mut(canvas, &quad, rgb);
    }
}

/// Pixels whose centers lie within `width` inside the circle's edge.
fn draw_ring(canvas: &mut RgbImage, center: (f32, f32), radius: f32, width: u32, rgb: Rgb<u8>) {
    let outer = radius;
    let inner = (radius - width as f32).max(0.0);
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = ((center.0 - outer).floor() as i64).max(0);
    let x1 = ((center.0 + outer).ceil() as i64).min(cw);
    let y0 = ((center.1 - outer).floor() as i64).max(0);
    let y1 = ((center.1 + outer).ceil() as i64).min(ch);
    for y in y0..y1 {
        for x in x0..x1 {
            let px = x as f32 + 0.5 - center.0;
            let py = y as f32 + 0.5 - center.1;
            let d2 = px * px + py * py;
            if d2 <= outer * outer && d2 > inner * inner {
                canvas.put_pixel(x as u32, y as u32, rgb);
            }
        }
    }
}

/// Alpha-blend `image` onto the canvas with its top-left at `(x, y)`.
fn composite(canvas: &mut RgbImage, image: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for (ix, iy, src) in image.enumerate_pixels() {
        let (tx, ty) = (x + ix as i64, y + iy as i64);
        if tx < 0 || ty < 0 || tx >= cw || ty >= ch {
            continue;
        }
        let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
        let mut blended: Rgba<u8> = dst.to_rgba();
        blended.blend(src);
        *dst = blended.to_rgb();
    }
}

/// Hex SHA-256 over the dimensions and raw pixels.
pub fn fingerprint(image: &RgbImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_be_bytes());
    hasher.update(image.height().to_be_bytes());
    hasher.update(image.as_raw());
    hex::encode(hasher.finalize())
}

/// Encode as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_is_clipped() {
        let commands = vec![PaintCommand::FillRect {
            rect: Rect::new(-2, 3, 5, 100),
            rgb: Rgb([9, 8, 7]),
        }];
        let img = rasterize(4, 6, &commands, &Face::Builtin);
        assert_eq!(*img.get_pixel(2, 3), Rgb([9, 8, 7]));
        assert_eq!(*img.get_pixel(3, 3), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(0, 2), Rgb([0, 0, 0]));
    }

    #[test]
    fn stroke_rect_leaves_interior() {
        let commands = vec![PaintCommand::StrokeRect {
            rect: Rect::new(0, 0, 10, 10),
            width: 2,
            rgb: Rgb([255, 255, 255]),
        }];
        let img = rasterize(10, 10, &commands, &Face::Builtin);
        assert_eq!(*img.get_pixel(1, 5), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(8, 9), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn lines_are_centered() {
        let commands = vec![
            PaintCommand::Line {
                from: (5.0, 0.0),
                to: (5.0, 10.0),
                width: 2,
                rgb: Rgb([255, 0, 0]),
            },
            PaintCommand::Line {
                from: (0.0, 0.0),
                to: (10.0, 10.0),
                width: 4,
                rgb: Rgb([0, 255, 0]),
            },
        ];
        let img = rasterize(10, 10, &commands, &Face::Builtin);
        assert_eq!(*img.get_pixel(4, 9), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(5, 9), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(3, 9), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(2, 2), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(8, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn ring_grows_inward() {
        let commands = vec![PaintCommand::Ring {
            center: (50.0, 50.0),
            radius: 40.0,
            width: 10,
            rgb: Rgb([255, 255, 255]),
        }];
        let img = rasterize(100, 100, &commands, &Face::Builtin);
        assert_eq!(*img.get_pixel(50, 12), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(50, 25), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(50, 50), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(50, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn composite_blends_alpha() {
        let mut brand = RgbaImage::new(2, 1);
        brand.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        brand.put_pixel(1, 0, Rgba([255, 255, 255, 0]));
        let commands = vec![
            PaintCommand::FillRect {
                rect: Rect::new(0, 0, 4, 4),
                rgb: Rgb([0, 0, 200]),
            },
            PaintCommand::Composite {
                x: 0,
                y: 3,
                image: brand,
            },
        ];
        let img = rasterize(4, 4, &commands, &Face::Builtin);
        assert_eq!(*img.get_pixel(0, 3), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(1, 3), Rgb([0, 0, 200]));
    }

    #[test]
    fn outlined_text_uses_both_colors() {
        let commands = vec![PaintCommand::Text {
            x: 0,
            y: 0,
            text: "H".into(),
            size: 20,
            rgb: Rgb([255, 255, 255]),
            outline: Some(crate::rendering::paint::Outline {
                width: 1,
                rgb: Rgb([255, 0, 0]),
            }),
        }];
        let img = rasterize(16, 24, &commands, &Face::Builtin);
        assert!(img.pixels().any(|p| *p == Rgb([255, 255, 255])));
        assert!(img.pixels().any(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn fingerprint_tracks_dimensions_and_pixels() {
        let a = RgbImage::new(2, 3);
        let b = RgbImage::new(3, 2);
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn encode_png_has_signature() {
        let png = encode_png(&RgbImage::new(3, 3)).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
