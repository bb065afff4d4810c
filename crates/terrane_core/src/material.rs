//! Opaque terrain material identifiers.
//!
//! The core attaches no meaning to a material beyond the reserved
//! [`MaterialId::EMPTY`] sentinel. Everything else belongs to the host.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A terrain material code.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct MaterialId(pub u16);

impl MaterialId {
    /// Empty cell (air).
    pub const EMPTY: Self = Self(0);

    /// Creates a material identifier from its raw code.
    #[inline]
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Returns true for the empty sentinel.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sample palette used by the bundled default configuration, demos and tests.
///
/// Hosts map their own registries onto codes; nothing in the generator
/// depends on these particular values.
pub mod palette {
    use super::MaterialId;

    /// Solid rock.
    pub const STONE: MaterialId = MaterialId::new(1);
    /// Grass-covered soil.
    pub const GRASS: MaterialId = MaterialId::new(2);
    /// Soil.
    pub const DIRT: MaterialId = MaterialId::new(3);
    /// Sand.
    pub const SAND: MaterialId = MaterialId::new(4);
    /// Water.
    pub const WATER: MaterialId = MaterialId::new(5);
    /// Tree trunk.
    pub const LOG: MaterialId = MaterialId::new(6);
    /// Tree canopy.
    pub const LEAVES: MaterialId = MaterialId::new(7);
    /// Snow.
    pub const SNOW: MaterialId = MaterialId::new(8);
    /// Gravel (river beds).
    pub const GRAVEL: MaterialId = MaterialId::new(9);
    /// Unbreakable floor.
    pub const BEDROCK: MaterialId = MaterialId::new(10);
    /// Ground plant.
    pub const FLOWER: MaterialId = MaterialId::new(11);
    /// Ore deposit.
    pub const ORE: MaterialId = MaterialId::new(12);
    /// Rubble (boulders, ruins).
    pub const COBBLE: MaterialId = MaterialId::new(13);
    /// Dry shrub.
    pub const SHRUB: MaterialId = MaterialId::new(14);
    /// Cactus.
    pub const CACTUS: MaterialId = MaterialId::new(15);
}
