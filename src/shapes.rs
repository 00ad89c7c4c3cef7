//! Shape table: every polyomino orientation and the block kinds it needs, built once at start.

use crate::error::ConfigError;
use crate::resource::{FlowerKind, ResourceKind};
use std::collections::HashSet;

/// Geometric families. Each blooms into its own flower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeFamily {
    O,
    J,
    L,
    T,
    I,
    S,
    Z,
}

const O_CELLS: &[&[(i32, i32)]] = &[&[(0, 0), (1, 0), (0, 1), (1, 1)]];
const J_CELLS: &[&[(i32, i32)]] = &[
    &[(0, 0), (0, 1), (0, 2), (1, 2)],
    &[(0, 1), (1, 1), (2, 1), (2, 0)],
    &[(0, 0), (1, 0), (1, 1), (1, 2)],
    &[(0, 0), (0, 1), (1, 0), (2, 0)],
];
const L_CELLS: &[&[(i32, i32)]] = &[
    &[(1, 0), (1, 1), (1, 2), (0, 2)],
    &[(0, 0), (0, 1), (1, 1), (2, 1)],
    &[(0, 0), (0, 1), (0, 2), (1, 0)],
    &[(0, 0), (1, 0), (2, 0), (2, 1)],
];
const T_CELLS: &[&[(i32, i32)]] = &[
    &[(0, 1), (1, 0), (1, 1), (2, 1)],
    &[(1, 0), (1, 1), (1, 2), (0, 1)],
    &[(0, 0), (1, 0), (2, 0), (1, 1)],
    &[(0, 0), (0, 1), (0, 2), (1, 1)],
];
const I_CELLS: &[&[(i32, i32)]] = &[
    &[(0, 0), (0, 1), (0, 2), (0, 3)],
    &[(0, 0), (1, 0), (2, 0), (3, 0)],
];
const S_CELLS: &[&[(i32, i32)]] = &[
    &[(1, 0), (2, 0), (0, 1), (1, 1)],
    &[(0, 0), (0, 1), (1, 1), (1, 2)],
];
const Z_CELLS: &[&[(i32, i32)]] = &[
    &[(0, 0), (1, 0), (1, 1), (2, 1)],
    &[(1, 0), (0, 1), (1, 1), (0, 2)],
];

impl ShapeFamily {
    pub const ALL: [Self; 7] = [Self::O, Self::J, Self::L, Self::T, Self::I, Self::S, Self::Z];

    /// Every orientation as (dx, dy) offsets from the origin.
    pub fn orientations(self) -> &'static [&'static [(i32, i32)]] {
        match self {
            Self::O => O_CELLS,
            Self::J => J_CELLS,
            Self::L => L_CELLS,
            Self::T => T_CELLS,
            Self::I => I_CELLS,
            Self::S => S_CELLS,
            Self::Z => Z_CELLS,
        }
    }

    pub fn flower(self) -> FlowerKind {
        match self {
            Self::O => FlowerKind::Daisy,
            Self::J => FlowerKind::Rose,
            Self::L => FlowerKind::Tulip,
            Self::T => FlowerKind::Sunflower,
            Self::I => FlowerKind::Orchid,
            Self::S => FlowerKind::Lily,
            Self::Z => FlowerKind::Peony,
        }
    }
}

/// What a pending clear is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    /// One of each resource arranged as the family's shape; blooms into a flower.
    Resource(ShapeFamily),
    /// Four of one flower kind arranged as the family's shape; clears with nearby rocks.
    Flowers(ShapeFamily),
    /// Resources stuck under a flower.
    Trapped,
}

impl ShapeId {
    /// Flower placed where the shape cleared, if any.
    pub fn bloom(self) -> Option<FlowerKind> {
        match self {
            Self::Resource(family) => Some(family.flower()),
            Self::Flowers(_) | Self::Trapped => None,
        }
    }

    pub fn is_flower_family(self) -> bool {
        matches!(self, Self::Flowers(_))
    }
}

/// How the occupied cells of a template must be typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Sorted cell kinds equal the sorted expected kinds.
    ExactMultiset(Vec<ResourceKind>),
    /// Each `consumed` kind takes one distinct cell. Each `wildcard` kind only has to be present
    /// and is never taken, so one wildcard block can serve several matches. Every cell must end
    /// up either consumed or holding a wildcard kind.
    ConsumeExceptWildcard {
        consumed: Vec<ResourceKind>,
        wildcards: Vec<ResourceKind>,
    },
}

/// Outcome of testing a rule against the kinds found under a template: which cell positions are
/// consumed and which only served as wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleMatch {
    pub consumed: Vec<usize>,
    pub wildcards: Vec<usize>,
}

impl MatchRule {
    /// Number of cells the rule accounts for.
    fn arity(&self) -> usize {
        match self {
            Self::ExactMultiset(kinds) => kinds.len(),
            Self::ConsumeExceptWildcard {
                consumed,
                wildcards,
            } => consumed.len() + wildcards.len(),
        }
    }

    /// Test cell kinds (in template order) against the rule.
    pub fn check(&self, kinds: &[ResourceKind]) -> Option<RuleMatch> {
        match self {
            Self::ExactMultiset(expected) => {
                if expected.len() != kinds.len() {
                    return None;
                }
                let mut actual = kinds.to_vec();
                let mut expected = expected.clone();
                actual.sort_unstable();
                expected.sort_unstable();
                (actual == expected).then(|| RuleMatch {
                    consumed: (0..kinds.len()).collect(),
                    wildcards: Vec::new(),
                })
            }
            Self::ConsumeExceptWildcard {
                consumed,
                wildcards,
            } => {
                let mut taken = vec![false; kinds.len()];
                for want in consumed {
                    let slot = (0..kinds.len()).find(|&i| !taken[i] && kinds[i] == *want)?;
                    taken[slot] = true;
                }
                if !wildcards.iter().all(|w| kinds.contains(w)) {
                    return None;
                }
                let mut result = RuleMatch::default();
                for (i, kind) in kinds.iter().enumerate() {
                    if taken[i] {
                        result.consumed.push(i);
                    } else if wildcards.contains(kind) {
                        result.wildcards.push(i);
                    } else {
                        return None;
                    }
                }
                Some(result)
            }
        }
    }
}

/// One orientation of one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeTemplate {
    pub shape: ShapeId,
    pub coords: Vec<(i32, i32)>,
    pub rule: MatchRule,
}

impl ShapeTemplate {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coords.is_empty() {
            return Err(ConfigError::EmptyTemplate(self.shape));
        }
        if self.rule.arity() != self.coords.len() {
            return Err(ConfigError::LengthMismatch {
                shape: self.shape,
                coords: self.coords.len(),
                types: self.rule.arity(),
            });
        }
        let mut seen = HashSet::new();
        for &(dx, dy) in &self.coords {
            if !seen.insert((dx, dy)) {
                return Err(ConfigError::DuplicateOffset {
                    shape: self.shape,
                    dx,
                    dy,
                });
            }
        }
        Ok(())
    }
}

/// Immutable lookup of every template the matcher scans for.
#[derive(Debug, Clone)]
pub struct ShapeTable {
    templates: Vec<ShapeTemplate>,
}

impl ShapeTable {
    /// Validate and wrap a template list.
    pub fn new(templates: Vec<ShapeTemplate>) -> Result<Self, ConfigError> {
        for template in &templates {
            template.validate()?;
        }
        Ok(Self { templates })
    }

    /// The garden's rules: every family needs seed, soil and water plus a sun that is not used
    /// up; four same-kind flowers in any family shape form a flower cluster.
    pub fn standard() -> Result<Self, ConfigError> {
        let mut templates = Vec::new();
        for family in ShapeFamily::ALL {
            for cells in family.orientations() {
                templates.push(ShapeTemplate {
                    shape: ShapeId::Resource(family),
                    coords: cells.to_vec(),
                    rule: MatchRule::ConsumeExceptWildcard {
                        consumed: vec![ResourceKind::Seed, ResourceKind::Soil, ResourceKind::Water],
                        wildcards: vec![ResourceKind::Sun],
                    },
                });
            }
        }
        for family in ShapeFamily::ALL {
            for cells in family.orientations() {
                for flower in FlowerKind::ALL {
                    templates.push(ShapeTemplate {
                        shape: ShapeId::Flowers(family),
                        coords: cells.to_vec(),
                        rule: MatchRule::ExactMultiset(vec![
                            ResourceKind::Flower(flower);
                            cells.len()
                        ]),
                    });
                }
            }
        }
        Self::new(templates)
    }

    pub fn templates(&self) -> &[ShapeTemplate] {
        &self.templates
    }
}
