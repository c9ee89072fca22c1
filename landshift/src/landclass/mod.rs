//! Land-cover classes and change categories.
//!
//! A grid cell carries one of nine raw cover classes. Comparing the dominant
//! class of a cell before and after an analysis year yields a change
//! category: five "gained" transitions into built-up land, five "lost"
//! transitions out of it, and a catch-all ignore bucket for everything else.
//! The mapping is a fixed 9×9 table built once at compile time; downstream
//! consumers (the area report and the inference table) depend on the exact
//! eleven-category scheme, so the table is not meant to grow.

/// Sentinel value used on the wire for cells with no valid observations.
pub const NO_DATA_VALUE: i16 = -1;

/// Raw land-cover classes, in stable index order (0–8).
///
/// The indices match the class-probability band order of the land-cover
/// dataset and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LandClass {
    Water = 0,
    Trees = 1,
    Grass = 2,
    FloodedVegetation = 3,
    Crops = 4,
    ShrubAndScrub = 5,
    Built = 6,
    Bare = 7,
    SnowAndIce = 8,
}

impl LandClass {
    /// Number of land-cover classes.
    pub const COUNT: usize = 9;

    /// All classes in index order.
    pub const ALL: [LandClass; LandClass::COUNT] = [
        LandClass::Water,
        LandClass::Trees,
        LandClass::Grass,
        LandClass::FloodedVegetation,
        LandClass::Crops,
        LandClass::ShrubAndScrub,
        LandClass::Built,
        LandClass::Bare,
        LandClass::SnowAndIce,
    ];

    /// Returns the class with the given stable index, if it is in range.
    pub fn from_index(index: i16) -> Option<LandClass> {
        match index {
            0..=8 => Some(LandClass::ALL[index as usize]),
            _ => None,
        }
    }

    /// Stable index of this class (0–8).
    pub fn index(self) -> usize {
        self as usize
    }

    /// The class-probability band name used by the land-cover dataset.
    pub fn band_name(self) -> &'static str {
        match self {
            LandClass::Water => "water",
            LandClass::Trees => "trees",
            LandClass::Grass => "grass",
            LandClass::FloodedVegetation => "flooded_vegetation",
            LandClass::Crops => "crops",
            LandClass::ShrubAndScrub => "shrub_and_scrub",
            LandClass::Built => "built",
            LandClass::Bare => "bare",
            LandClass::SnowAndIce => "snow_and_ice",
        }
    }
}

/// A before/after land-cover transition label.
///
/// Categories 1–5 are vegetation that turned into built-up land ("gained"
/// built); 6–10 are built-up land that turned back into vegetation ("lost").
/// `Ignore` (0) marks transitions the analysis does not track; cells mapped
/// to it are masked out of every downstream computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChangeCategory {
    Ignore = 0,
    TreesGained = 1,
    GrassGained = 2,
    FloodedVegetationGained = 3,
    CropsGained = 4,
    ShrubAndScrubGained = 5,
    TreesLost = 6,
    GrassLost = 7,
    FloodedVegetationLost = 8,
    CropsLost = 9,
    ShrubAndScrubLost = 10,
}

impl ChangeCategory {
    /// All tracked (non-ignore) categories, in code order.
    pub const TRACKED: [ChangeCategory; 10] = [
        ChangeCategory::TreesGained,
        ChangeCategory::GrassGained,
        ChangeCategory::FloodedVegetationGained,
        ChangeCategory::CropsGained,
        ChangeCategory::ShrubAndScrubGained,
        ChangeCategory::TreesLost,
        ChangeCategory::GrassLost,
        ChangeCategory::FloodedVegetationLost,
        ChangeCategory::CropsLost,
        ChangeCategory::ShrubAndScrubLost,
    ];

    /// Returns the category with the given numeric code (0–10).
    pub fn from_code(code: u8) -> Option<ChangeCategory> {
        match code {
            0 => Some(ChangeCategory::Ignore),
            1..=10 => Some(ChangeCategory::TRACKED[(code - 1) as usize]),
            _ => None,
        }
    }

    /// Numeric code of this category (0–10).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True for every category except `Ignore`.
    pub fn is_tracked(self) -> bool {
        self != ChangeCategory::Ignore
    }

    /// Human-readable label, as used in the area report and CSV output.
    pub fn label(self) -> &'static str {
        match self {
            ChangeCategory::Ignore => "other",
            ChangeCategory::TreesGained => "trees_gained",
            ChangeCategory::GrassGained => "grass_gained",
            ChangeCategory::FloodedVegetationGained => "flooded_vegetation_gained",
            ChangeCategory::CropsGained => "crops_gained",
            ChangeCategory::ShrubAndScrubGained => "shrub_and_scrub_gained",
            ChangeCategory::TreesLost => "trees_lost",
            ChangeCategory::GrassLost => "grass_lost",
            ChangeCategory::FloodedVegetationLost => "flooded_vegetation_lost",
            ChangeCategory::CropsLost => "crops_lost",
            ChangeCategory::ShrubAndScrubLost => "shrub_and_scrub_lost",
        }
    }
}

impl std::fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<ChangeCategory> for u8 {
    fn from(category: ChangeCategory) -> u8 {
        category.code()
    }
}

impl TryFrom<u8> for ChangeCategory {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ChangeCategory::from_code(code).ok_or(code)
    }
}

/// The 9×9 transition table, indexed `[before][after]`.
///
/// Only transitions into and out of `Built` from the five vegetation classes
/// are tracked; every other pair (water↔built, trees↔grass, identity pairs,
/// …) maps to `Ignore`. This is a deliberate simplification of the category
/// scheme and is relied upon by every consumer of the category codes.
static CHANGE_TABLE: [[ChangeCategory; LandClass::COUNT]; LandClass::COUNT] = build_change_table();

const fn build_change_table() -> [[ChangeCategory; LandClass::COUNT]; LandClass::COUNT] {
    let mut table = [[ChangeCategory::Ignore; LandClass::COUNT]; LandClass::COUNT];

    // Vegetation that became built-up land.
    table[LandClass::Trees as usize][LandClass::Built as usize] = ChangeCategory::TreesGained;
    table[LandClass::Grass as usize][LandClass::Built as usize] = ChangeCategory::GrassGained;
    table[LandClass::FloodedVegetation as usize][LandClass::Built as usize] =
        ChangeCategory::FloodedVegetationGained;
    table[LandClass::Crops as usize][LandClass::Built as usize] = ChangeCategory::CropsGained;
    table[LandClass::ShrubAndScrub as usize][LandClass::Built as usize] =
        ChangeCategory::ShrubAndScrubGained;

    // Built-up land that became vegetation.
    table[LandClass::Built as usize][LandClass::Trees as usize] = ChangeCategory::TreesLost;
    table[LandClass::Built as usize][LandClass::Grass as usize] = ChangeCategory::GrassLost;
    table[LandClass::Built as usize][LandClass::FloodedVegetation as usize] =
        ChangeCategory::FloodedVegetationLost;
    table[LandClass::Built as usize][LandClass::Crops as usize] = ChangeCategory::CropsLost;
    table[LandClass::Built as usize][LandClass::ShrubAndScrub as usize] =
        ChangeCategory::ShrubAndScrubLost;

    table
}

/// Maps a before/after class pair to its change category.
///
/// Total over all 81 pairs; untracked pairs return [`ChangeCategory::Ignore`].
pub fn remap(before: LandClass, after: LandClass) -> ChangeCategory {
    CHANGE_TABLE[before.index()][after.index()]
}

/// Maps a composite wire key (`before * 100 + after`) to its change category.
///
/// Returns `None` when either component is outside the valid class range,
/// which covers the no-data sentinel as well as malformed keys.
pub fn remap_composite(key: i32) -> Option<ChangeCategory> {
    if key < 0 {
        return None;
    }
    let before = LandClass::from_index((key / 100) as i16)?;
    let after = LandClass::from_index((key % 100) as i16)?;
    Some(remap(before, after))
}
