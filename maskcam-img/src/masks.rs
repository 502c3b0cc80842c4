//! Face mask renderers and the catalog that names them.
//!
//! A renderer is a stateless draw function bound to one [`RendererKind`];
//! several catalog ids may share a kind (`cat_morph` and `animal_morph`).
//! Renderers only read the landmarks they are given and draw onto the
//! compositor's surface. Time-based animation comes from
//! [`RenderContext::time`], never from per-renderer state.

use crate::assets::AssetCache;
use crate::landmarks::LandmarkSet;
use crate::surface::Surface;

mod animal;
mod anime;
mod catalog;
mod cheetara;
pub mod common;
mod emoji;
mod freddie_mercury;
mod he_man;
mod jaspion;
mod jem;
mod knight_rider;
mod madonna;
mod neon;
mod optimus_prime;
mod pixel;
mod registry;
mod she_ra;
mod wonder_woman;

pub use catalog::{
    Animal, AnimalSettings, AnimeSettings, Category, EmojiPosition, EmojiSettings, EmojiSize,
    LegendSettings, MaskDescriptor, MaskSettings, NeonSettings, PixelSettings, RendererKind, Tier,
    catalog,
};
pub use emoji::{Expression, classify_expression};
pub use registry::{MaskRegistry, renderer_for};

pub struct RenderContext<'a> {
    pub surface: &'a mut Surface,
    pub assets: &'a AssetCache,
    /// Wall clock seconds, for animation.
    pub time: f64,
}

pub trait MaskRenderer: Sync {
    fn kind(&self) -> RendererKind;

    /// Draw one frame of the mask. Settings of another renderer's variant
    /// are ignored in favor of this renderer's defaults.
    fn render(
        &self,
        ctx: &mut RenderContext<'_>,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        settings: &MaskSettings,
    );
}
