//! Rendering pipeline
//!
//! A render runs in three stages, each usable on its own:
//!
//! 1. [`layout::plan_canvas`] sizes the canvas and lays out the diagram
//! 2. [`paint`] turns the plan, branding, and overlay into a display list
//! 3. [`raster::rasterize`] executes the display list on a black RGB canvas

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;

use image::RgbImage;
use log::debug;

use crate::{RenderOptions, Result, ScreenSpec, TileCatalog};

/// Render one screen's lineup guide in the style named by
/// `opts.lineup_type`.
pub fn render(screen: &ScreenSpec, catalog: &TileCatalog, opts: &RenderOptions) -> Result<RgbImage> {
    let plan = layout::plan_canvas(screen, catalog, opts)?;
    let face = font::Face::resolve(&opts.font_name);

    let mut commands = paint::paint_diagram(&plan, screen, opts, &face);
    if let Some(branding) = &opts.branding_image {
        commands.push(paint::paint_branding(branding, plan.width, plan.height));
    }
    if opts.show_overlay {
        commands.extend(paint::paint_overlay(
            screen,
            plan.width,
            plan.height,
            opts,
            &face,
        ));
    }
    debug!(
        "{}: {} paint commands",
        screen.screen_name,
        commands.len()
    );

    Ok(raster::rasterize(plan.width, plan.height, &commands, &face))
}
