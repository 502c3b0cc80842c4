use crate::surface::{Color, rgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    NeonWireframe,
    PixelFace,
    EmojiTracker,
    AnimalMorph,
    AnimeStyle,
    HeMan,
    FreddieMercury,
    KnightRider,
    SheRa,
    WonderWoman,
    Madonna,
    OptimusPrime,
    Jem,
    Cheetara,
    Jaspion,
}

impl RendererKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RendererKind::NeonWireframe => "neon_wireframe",
            RendererKind::PixelFace => "pixel_face",
            RendererKind::EmojiTracker => "emoji_tracker",
            RendererKind::AnimalMorph => "animal_morph",
            RendererKind::AnimeStyle => "anime_style",
            RendererKind::HeMan => "he_man",
            RendererKind::FreddieMercury => "freddie_mercury",
            RendererKind::KnightRider => "knight_rider",
            RendererKind::SheRa => "she_ra",
            RendererKind::WonderWoman => "wonder_woman",
            RendererKind::Madonna => "madonna",
            RendererKind::OptimusPrime => "optimus_prime",
            RendererKind::Jem => "jem",
            RendererKind::Cheetara => "cheetara",
            RendererKind::Jaspion => "jaspion",
        }
    }

    /// Logical path of the raster overlay hybrid renderers draw.
    pub fn overlay(&self) -> Option<&'static str> {
        match self {
            RendererKind::OptimusPrime => Some("/masks/optimus-helmet.png"),
            RendererKind::Jem => Some("/masks/jem-stars.png"),
            RendererKind::Cheetara => Some("/masks/cheetara-ears.png"),
            RendererKind::Jaspion => Some("/masks/jaspion-helmet.png"),
            _ => None,
        }
    }

    pub fn is_hybrid(&self) -> bool {
        self.overlay().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Free,
    Basic,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Artistic,
    Privacy,
    Fun,
    Animal,
    Legends,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeonSettings {
    pub color: Color,
    pub line_width: f32,
    pub glow: bool,
    pub opacity: f32,
}

impl NeonSettings {
    pub const DEFAULT: NeonSettings = NeonSettings {
        color: rgb(0, 255, 255),
        line_width: 2.,
        glow: true,
        opacity: 0.8,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSettings {
    /// Block edge in pixels.
    pub pixel_size: u32,
    pub opacity: f32,
}

impl PixelSettings {
    pub const DEFAULT: PixelSettings = PixelSettings {
        pixel_size: 12,
        opacity: 0.8,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiSize {
    Small,
    Medium,
    Large,
}

impl EmojiSize {
    /// Emoji diameter as a share of frame width.
    pub fn fraction(&self) -> f32 {
        match self {
            EmojiSize::Small => 0.08,
            EmojiSize::Medium => 0.12,
            EmojiSize::Large => 0.16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiPosition {
    Forehead,
    AboveEyes,
    Nose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmojiSettings {
    pub size: EmojiSize,
    pub position: EmojiPosition,
    pub background: bool,
    pub opacity: f32,
}

impl EmojiSettings {
    pub const DEFAULT: EmojiSettings = EmojiSettings {
        size: EmojiSize::Large,
        position: EmojiPosition::Forehead,
        background: true,
        opacity: 1.,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animal {
    Cat,
    Dog,
    Fox,
    Owl,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimalSettings {
    pub animal: Animal,
    pub intensity: f32,
    pub whiskers: bool,
    pub ears: bool,
    pub nose: bool,
}

impl AnimalSettings {
    pub const DEFAULT: AnimalSettings = AnimalSettings::of(Animal::Cat);

    pub const fn of(animal: Animal) -> AnimalSettings {
        AnimalSettings {
            animal,
            intensity: 0.8,
            whiskers: true,
            ears: true,
            nose: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimeSettings {
    /// Eye scale relative to the detected eye.
    pub eye_size: f32,
    /// Strength of skin smoothing inside the face oval, 0 disables it.
    pub skin_smooth: f32,
    pub intensity: f32,
}

impl AnimeSettings {
    pub const DEFAULT: AnimeSettings = AnimeSettings {
        eye_size: 1.5,
        skin_smooth: 0.8,
        intensity: 0.7,
    };
}

/// Knobs shared by the legends renderers. `glow` and `detail` scale one
/// signature element each:
///
/// | mask | glow | detail |
/// |---|---|---|
/// | he_man | aura | crown size |
/// | freddie_mercury | crown glow | mustache size |
/// | knight_rider | collar shine | scanner speed |
/// | she_ra | power shimmer | sparkles |
/// | wonder_woman | lasso glow | heroic aura |
/// | madonna | neon frame | lip boldness |
/// | optimus_prime | eye glow | energy orbs |
/// | jem | hologram | glitter density |
/// | cheetara | cat eyes | sparkles |
/// | jaspion | visor glow | hero aura |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendSettings {
    pub intensity: f32,
    pub glow: f32,
    pub detail: f32,
}

impl LegendSettings {
    pub const fn new(glow: f32, detail: f32) -> LegendSettings {
        LegendSettings {
            intensity: 0.8,
            glow,
            detail,
        }
    }
}

/// Per-renderer settings. A renderer handed another renderer's variant
/// draws with its own defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskSettings {
    Neon(NeonSettings),
    Pixel(PixelSettings),
    Emoji(EmojiSettings),
    Animal(AnimalSettings),
    Anime(AnimeSettings),
    Legend(LegendSettings),
}

impl MaskSettings {
    pub fn neon(&self) -> NeonSettings {
        match self {
            MaskSettings::Neon(s) => *s,
            _ => NeonSettings::DEFAULT,
        }
    }

    pub fn pixel(&self) -> PixelSettings {
        match self {
            MaskSettings::Pixel(s) => *s,
            _ => PixelSettings::DEFAULT,
        }
    }

    pub fn emoji(&self) -> EmojiSettings {
        match self {
            MaskSettings::Emoji(s) => *s,
            _ => EmojiSettings::DEFAULT,
        }
    }

    pub fn animal(&self) -> AnimalSettings {
        match self {
            MaskSettings::Animal(s) => *s,
            _ => AnimalSettings::DEFAULT,
        }
    }

    pub fn anime(&self) -> AnimeSettings {
        match self {
            MaskSettings::Anime(s) => *s,
            _ => AnimeSettings::DEFAULT,
        }
    }

    pub fn legend_or(&self, default: LegendSettings) -> LegendSettings {
        match self {
            MaskSettings::Legend(s) => *s,
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: RendererKind,
    pub tier: Tier,
    pub category: Category,
    pub settings: MaskSettings,
}

const fn mask(
    id: &'static str,
    name: &'static str,
    kind: RendererKind,
    tier: Tier,
    category: Category,
    settings: MaskSettings,
) -> MaskDescriptor {
    MaskDescriptor {
        id,
        name,
        kind,
        tier,
        category,
        settings,
    }
}

const fn legend(
    id: &'static str,
    name: &'static str,
    kind: RendererKind,
    glow: f32,
    detail: f32,
) -> MaskDescriptor {
    mask(
        id,
        name,
        kind,
        Tier::Premium,
        Category::Legends,
        MaskSettings::Legend(LegendSettings::new(glow, detail)),
    )
}

pub(super) const HE_MAN: LegendSettings = LegendSettings::new(1.0, 1.2);
pub(super) const FREDDIE_MERCURY: LegendSettings = LegendSettings::new(1.2, 1.0);
pub(super) const KNIGHT_RIDER: LegendSettings = LegendSettings::new(0.9, 1.0);
pub(super) const SHE_RA: LegendSettings = LegendSettings::new(0.9, 1.0);
pub(super) const WONDER_WOMAN: LegendSettings = LegendSettings::new(1.2, 0.9);
pub(super) const MADONNA: LegendSettings = LegendSettings::new(1.2, 1.0);
pub(super) const OPTIMUS_PRIME: LegendSettings = LegendSettings::new(1.2, 1.0);
pub(super) const JEM: LegendSettings = LegendSettings::new(1.2, 1.0);
pub(super) const CHEETARA: LegendSettings = LegendSettings::new(1.2, 1.0);
pub(super) const JASPION: LegendSettings = LegendSettings::new(1.2, 0.8);

static CATALOG: [MaskDescriptor; 18] = [
    mask(
        "neon_wireframe",
        "Neon Wireframe",
        RendererKind::NeonWireframe,
        Tier::Free,
        Category::Artistic,
        MaskSettings::Neon(NeonSettings::DEFAULT),
    ),
    mask(
        "pixel_face",
        "Pixel Anonymizer",
        RendererKind::PixelFace,
        Tier::Free,
        Category::Privacy,
        MaskSettings::Pixel(PixelSettings::DEFAULT),
    ),
    mask(
        "emoji_tracker",
        "Emotion Emoji",
        RendererKind::EmojiTracker,
        Tier::Basic,
        Category::Fun,
        MaskSettings::Emoji(EmojiSettings::DEFAULT),
    ),
    mask(
        "cat_morph",
        "Cat Face",
        RendererKind::AnimalMorph,
        Tier::Basic,
        Category::Animal,
        MaskSettings::Animal(AnimalSettings::of(Animal::Cat)),
    ),
    mask(
        "dog_morph",
        "Dog Face",
        RendererKind::AnimalMorph,
        Tier::Basic,
        Category::Animal,
        MaskSettings::Animal(AnimalSettings::of(Animal::Dog)),
    ),
    mask(
        "fox_morph",
        "Fox Face",
        RendererKind::AnimalMorph,
        Tier::Basic,
        Category::Animal,
        MaskSettings::Animal(AnimalSettings::of(Animal::Fox)),
    ),
    mask(
        "owl_morph",
        "Owl Face",
        RendererKind::AnimalMorph,
        Tier::Basic,
        Category::Animal,
        MaskSettings::Animal(AnimalSettings::of(Animal::Owl)),
    ),
    mask(
        "anime_style",
        "Anime Style",
        RendererKind::AnimeStyle,
        Tier::Premium,
        Category::Artistic,
        MaskSettings::Anime(AnimeSettings::DEFAULT),
    ),
    legend("he_man", "He-Man", RendererKind::HeMan, HE_MAN.glow, HE_MAN.detail),
    legend(
        "optimus_prime",
        "Optimus Prime",
        RendererKind::OptimusPrime,
        OPTIMUS_PRIME.glow,
        OPTIMUS_PRIME.detail,
    ),
    legend(
        "freddie_mercury",
        "Freddie Mercury",
        RendererKind::FreddieMercury,
        FREDDIE_MERCURY.glow,
        FREDDIE_MERCURY.detail,
    ),
    legend(
        "knight_rider",
        "Knight Rider",
        RendererKind::KnightRider,
        KNIGHT_RIDER.glow,
        KNIGHT_RIDER.detail,
    ),
    legend("jaspion", "Jaspion", RendererKind::Jaspion, JASPION.glow, JASPION.detail),
    legend("she_ra", "She-Ra", RendererKind::SheRa, SHE_RA.glow, SHE_RA.detail),
    legend("jem", "Jem", RendererKind::Jem, JEM.glow, JEM.detail),
    legend(
        "wonder_woman",
        "Wonder Woman",
        RendererKind::WonderWoman,
        WONDER_WOMAN.glow,
        WONDER_WOMAN.detail,
    ),
    legend("madonna", "Madonna", RendererKind::Madonna, MADONNA.glow, MADONNA.detail),
    legend("cheetara", "Cheetara", RendererKind::Cheetara, CHEETARA.glow, CHEETARA.detail),
];

/// Every selectable mask, in display order.
pub fn catalog() -> &'static [MaskDescriptor] {
    &CATALOG
}
