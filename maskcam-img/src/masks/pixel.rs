use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::geometry::contour_bounds;
use crate::landmarks::{FACE_OVAL, LandmarkSet};
use tracing::trace;

const PADDING: f32 = 10.;

/// Block-averaged pixelation of the face oval.
pub struct PixelFace;

impl MaskRenderer for PixelFace {
    fn kind(&self) -> RendererKind {
        RendererKind::PixelFace
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.pixel();
        let block = s.pixel_size.max(2);

        let Some(oval) = super::common::face_oval(landmarks, width, height) else {
            return;
        };
        let Some(bounds) = contour_bounds(landmarks, &FACE_OVAL, width, height)
            .filter(|b| !b.is_degenerate())
        else {
            return;
        };
        let region = bounds.pad(PADDING).clamp(width as f32, height as f32);
        if region.is_degenerate() || region.w < 1. || region.h < 1. {
            trace!("Pixelation region {region:?} is empty");
            return;
        }

        let surface = &mut *ctx.surface;
        surface.save();
        surface.reset_transform();
        surface.clip(&oval.to_path(true));
        surface.set_alpha(s.opacity);

        let (x0, y0) = (region.x as u32, region.y as u32);
        let (x1, y1) = (region.right().ceil() as u32, region.bottom().ceil() as u32);
        // sample every block before painting any
        let mut blocks = Vec::new();
        for y in (y0..y1).step_by(block as usize) {
            for x in (x0..x1).step_by(block as usize) {
                let bw = block.min(x1 - x);
                let bh = block.min(y1 - y);
                if let Some(avg) = surface.block_average(x, y, bw, bh) {
                    blocks.push((x, y, bw, bh, avg));
                }
            }
        }
        for (x, y, bw, bh, avg) in blocks {
            surface.fill_block(x, y, bw, bh, avg);
        }

        surface.restore();
    }
}
