//! Block payload types: the resources that fall from the bag and the flowers they bloom into.

/// Flower kinds, one per shape family. Flowers are terminal: they never come out of the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowerKind {
    Daisy,
    Rose,
    Tulip,
    Sunflower,
    Orchid,
    Lily,
    Peony,
}

impl FlowerKind {
    pub const ALL: [Self; 7] = [
        Self::Daisy,
        Self::Rose,
        Self::Tulip,
        Self::Sunflower,
        Self::Orchid,
        Self::Lily,
        Self::Peony,
    ];
}

/// What a block is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Seed,
    Soil,
    Water,
    Sun,
    Rock,
    Flower(FlowerKind),
}

impl ResourceKind {
    /// Kinds the bag may hand out.
    pub const BAG_KINDS: [Self; 5] = [Self::Seed, Self::Soil, Self::Water, Self::Sun, Self::Rock];

    #[inline]
    pub fn is_flower(self) -> bool {
        matches!(self, Self::Flower(_))
    }

    /// Seed, soil, water, sun or rock.
    #[inline]
    pub fn is_resource(self) -> bool {
        !self.is_flower()
    }

    /// Sprite key used by render sinks ("seed", "flower_daisy", ...).
    pub fn sprite_name(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Soil => "soil",
            Self::Water => "water",
            Self::Sun => "sun",
            Self::Rock => "rock",
            Self::Flower(FlowerKind::Daisy) => "flower_daisy",
            Self::Flower(FlowerKind::Rose) => "flower_rose",
            Self::Flower(FlowerKind::Tulip) => "flower_tulip",
            Self::Flower(FlowerKind::Sunflower) => "flower_sunflower",
            Self::Flower(FlowerKind::Orchid) => "flower_orchid",
            Self::Flower(FlowerKind::Lily) => "flower_lily",
            Self::Flower(FlowerKind::Peony) => "flower_peony",
        }
    }
}
