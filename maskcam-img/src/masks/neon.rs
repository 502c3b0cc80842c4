use super::{MaskRenderer, MaskSettings, RenderContext, RendererKind};
use crate::landmarks::{
    FACE_OVAL, LEFT_BROW, LEFT_EYE, LIPS_OUTER, LandmarkSet, NOSE_BRIDGE, RIGHT_BROW, RIGHT_EYE,
};

const NOSE_RIDGE: [usize; 5] = [6, 197, 195, 5, 1];
const GLOW_RADIUS: f32 = 10.;

/// Glowing outline of the face, eyes, lips, brows and nose.
pub struct NeonWireframe;

impl MaskRenderer for NeonWireframe {
    fn kind(&self) -> RendererKind {
        RendererKind::NeonWireframe
    }

    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    ) {
        let s = settings.neon();
        let (w, h) = (width as f32, height as f32);
        let surface = &mut *ctx.surface;

        surface.save();
        if s.glow {
            surface.set_glow(s.color, GLOW_RADIUS);
        }
        surface.set_alpha(s.opacity);

        let closed: [&[usize]; 4] = [&FACE_OVAL, &LEFT_EYE, &RIGHT_EYE, &LIPS_OUTER];
        for idxs in closed {
            surface.stroke_polyline(&landmarks.contour(idxs, w, h), true, s.color, s.line_width);
        }

        let open: [&[usize]; 4] = [&RIGHT_BROW, &LEFT_BROW, &NOSE_BRIDGE, &NOSE_RIDGE];
        for idxs in open {
            surface.stroke_polyline(&landmarks.contour(idxs, w, h), false, s.color, s.line_width);
        }

        surface.restore();
    }
}
