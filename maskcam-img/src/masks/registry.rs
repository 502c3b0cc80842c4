use super::catalog::{MaskDescriptor, RendererKind, catalog};
use super::{
    MaskRenderer, animal, anime, cheetara, emoji, freddie_mercury, he_man, jaspion, jem,
    knight_rider, madonna, neon, optimus_prime, pixel, she_ra, wonder_woman,
};

// alias -> canonical id
const ALIASES: [(&str, &str); 1] = [("animal_morph", "cat_morph")];

/// Resolves mask ids. Unknown ids are `None`, never an error.
pub struct MaskRegistry;

impl MaskRegistry {
    pub fn lookup(id: &str) -> Option<&'static MaskDescriptor> {
        let id = ALIASES
            .iter()
            .find(|(alias, _)| *alias == id)
            .map_or(id, |(_, canonical)| canonical);
        catalog().iter().find(|m| m.id == id)
    }

    pub fn renderer(id: &str) -> Option<&'static dyn MaskRenderer> {
        Self::lookup(id).map(|m| renderer_for(m.kind))
    }

    /// Logical paths of every hybrid overlay, for preloading.
    pub fn overlays() -> impl Iterator<Item = &'static str> {
        catalog().iter().filter_map(|m| m.kind.overlay())
    }
}

pub fn renderer_for(kind: RendererKind) -> &'static dyn MaskRenderer {
    match kind {
        RendererKind::NeonWireframe => &neon::NeonWireframe,
        RendererKind::PixelFace => &pixel::PixelFace,
        RendererKind::EmojiTracker => &emoji::EmojiTracker,
        RendererKind::AnimalMorph => &animal::AnimalMorph,
        RendererKind::AnimeStyle => &anime::AnimeStyle,
        RendererKind::HeMan => &he_man::HeMan,
        RendererKind::FreddieMercury => &freddie_mercury::FreddieMercury,
        RendererKind::KnightRider => &knight_rider::KnightRider,
        RendererKind::SheRa => &she_ra::SheRa,
        RendererKind::WonderWoman => &wonder_woman::WonderWoman,
        RendererKind::Madonna => &madonna::Madonna,
        RendererKind::OptimusPrime => &optimus_prime::OptimusPrime,
        RendererKind::Jem => &jem::Jem,
        RendererKind::Cheetara => &cheetara::Cheetara,
        RendererKind::Jaspion => &jaspion::Jaspion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use crate::landmarks::LandmarkSet;
    use crate::masks::{MaskSettings, PixelSettings, RenderContext};
    use crate::shapes::Rect;
    use crate::surface::{Surface, rgb};
    use image::RgbaImage;

    #[test]
    fn test_unknown_id() {
        assert!(MaskRegistry::lookup("batman").is_none());
        assert!(MaskRegistry::renderer("").is_none());
    }

    #[test]
    fn test_alias() {
        let m = MaskRegistry::lookup("animal_morph").unwrap();
        assert_eq!(m.id, "cat_morph");
        assert_eq!(
            MaskRegistry::renderer("animal_morph").unwrap().kind(),
            RendererKind::AnimalMorph
        );
    }

    #[test]
    fn test_renderers_match_kind() {
        for m in catalog() {
            assert_eq!(renderer_for(m.kind).kind(), m.kind, "{}", m.id);
        }
    }

    #[test]
    fn test_overlays() {
        assert_eq!(MaskRegistry::overlays().count(), 4);
    }

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(160, 120, |x, y| rgb(x as u8, (y * 2) as u8, 100))
    }

    fn render_all(landmarks: &LandmarkSet, settings: Option<MaskSettings>) {
        let assets = AssetCache::new("/nonexistent");
        for m in catalog() {
            let mut surface = Surface::from_image(gradient());
            let mut ctx = RenderContext {
                surface: &mut surface,
                assets: &assets,
                time: 12.5,
            };
            renderer_for(m.kind).render(
                &mut ctx,
                landmarks,
                160,
                120,
                &settings.unwrap_or(m.settings),
            );
        }
    }

    #[test]
    fn test_every_mask_draws_on_box_face() {
        render_all(&LandmarkSet::from_box(&Rect::new(30., 20., 40., 60.)), None);
    }

    #[test]
    fn test_every_mask_tolerates_empty_landmarks() {
        render_all(&LandmarkSet::empty(), None);
    }

    #[test]
    fn test_every_mask_tolerates_foreign_settings() {
        let settings = MaskSettings::Pixel(PixelSettings {
            pixel_size: 0,
            opacity: 1.,
        });
        render_all(
            &LandmarkSet::from_box(&Rect::new(-20., -20., 140., 140.)),
            Some(settings),
        );
    }

    #[test]
    fn test_procedural_masks_draw_something() {
        let landmarks = LandmarkSet::from_box(&Rect::new(30., 20., 40., 60.));
        let assets = AssetCache::new("/nonexistent");
        let base = gradient();
        for m in catalog() {
            let mut surface = Surface::from_image(base.clone());
            let mut ctx = RenderContext {
                surface: &mut surface,
                assets: &assets,
                time: 1.,
            };
            renderer_for(m.kind).render(&mut ctx, &landmarks, 160, 120, &m.settings);
            assert_ne!(surface.image(), &base, "{} drew nothing", m.id);
        }
    }
}
