//! # Biome Resolution
//!
//! Maps climate samples to registry biomes and blends heights and surfaces
//! across biome boundaries.
//!
//! ## Resolution
//!
//! Nearest target climate by squared Euclidean distance. The scan keeps
//! the first-inserted biome on ties. Samples that match nothing (no biome
//! declares a climate, or the sample is NaN) resolve to the default biome.
//!
//! ## Blending
//!
//! For a column whose nearest differently-resolved column lies at distance
//! `d`, with `R = max(radius_self, radius_other)`:
//!
//! ```text
//! w = 0.5 * (1 - d / (R + 1))      if d <= R
//! h = (1 - w) * h_self + w * h_other
//! ```
//!
//! Both sides of a boundary approach the midpoint, so the height step
//! between adjacent columns is at most `|h_a - h_b| / (R + 1)`.

use std::sync::Arc;

use terrane_core::{BiomeId, BiomeRegistry, ClimateSample, ConfigError, WorldSeed};

use crate::height::HeightField;
use crate::noise::purpose;

/// Climate → biome lookup over a shared registry.
pub struct BiomeResolver {
    registry: Arc<BiomeRegistry>,
    candidates: Vec<(BiomeId, ClimateSample)>,
}

impl BiomeResolver {
    /// Creates a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyRegistry`] for an empty registry.
    pub fn new(registry: Arc<BiomeRegistry>) -> Result<Self, ConfigError> {
        if registry.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        let candidates = registry
            .iter()
            .filter_map(|(id, descriptor)| descriptor.climate.map(|climate| (id, climate)))
            .collect();
        Ok(Self {
            registry,
            candidates,
        })
    }

    /// The registry this resolver reads.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &BiomeRegistry {
        &self.registry
    }

    /// Nearest biome for a climate sample.
    #[must_use]
    pub fn resolve(&self, sample: &ClimateSample) -> BiomeId {
        let mut best: Option<(BiomeId, f64)> = None;
        for (id, target) in &self.candidates {
            let distance = sample.distance_sq(target);
            // Strict comparison: earlier insertion wins ties, NaN never wins
            if best.map_or(!distance.is_nan(), |(_, current)| distance < current) {
                best = Some((*id, distance));
            }
        }
        best.map_or(self.registry.default_id(), |(id, _)| id)
    }
}

/// Resolved biome ids over a height field's extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiomeMap {
    width: u32,
    depth: u32,
    margin: u32,
    ids: Vec<BiomeId>,
}

impl BiomeMap {
    /// Builds a map from a function of extent coordinates.
    pub fn from_fn(width: u32, depth: u32, margin: u32, mut f: impl FnMut(u32, u32) -> BiomeId) -> Self {
        let mut ids = Vec::with_capacity(width as usize * depth as usize);
        for ez in 0..depth {
            for ex in 0..width {
                ids.push(f(ex, ez));
            }
        }
        Self {
            width,
            depth,
            margin,
            ids,
        }
    }

    /// Resolves every column of a height field.
    #[must_use]
    pub fn resolve(field: &HeightField, resolver: &BiomeResolver) -> Self {
        let default = resolver.registry().default_id();
        Self::from_fn(field.width(), field.depth(), field.margin(), |ex, ez| {
            field
                .get(ex, ez)
                .map_or(default, |sample| resolver.resolve(&sample.climate))
        })
    }

    /// Biome at extent coordinates, `None` outside the extent.
    #[inline]
    #[must_use]
    pub fn get(&self, ex: u32, ez: u32) -> Option<BiomeId> {
        if ex < self.width && ez < self.depth {
            self.ids.get(ez as usize * self.width as usize + ex as usize).copied()
        } else {
            None
        }
    }

    /// Biome of an inner column.
    #[inline]
    #[must_use]
    pub fn inner(&self, lx: u32, lz: u32) -> Option<BiomeId> {
        self.get(lx + self.margin, lz + self.margin)
    }

    /// Border ring width.
    #[inline]
    #[must_use]
    pub const fn margin(&self) -> u32 {
        self.margin
    }

    /// Biomes present among the inner columns, in registry order.
    #[must_use]
    pub fn inner_biomes(&self) -> Vec<BiomeId> {
        let mut present: Vec<BiomeId> = Vec::new();
        for ez in self.margin..self.depth - self.margin {
            for ex in self.margin..self.width - self.margin {
                if let Some(id) = self.get(ex, ez) {
                    if !present.contains(&id) {
                        present.push(id);
                    }
                }
            }
        }
        present.sort_unstable();
        present
    }
}

/// Height and surface decision for one inner column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendedColumn {
    /// Biome resolved at the column.
    pub biome: BiomeId,
    /// Neighbouring biome and its weight, when blending applies.
    pub blend: Option<(BiomeId, f64)>,
    /// Interpolated height.
    pub height: f64,
    /// Biome whose surface rules the column uses.
    pub surface: BiomeId,
}

/// Boundary blending over a biome map.
pub struct Blender {
    /// Offsets within the max radius, sorted by distance then scan order.
    offsets: Vec<(i32, i32, f64)>,
    seed: WorldSeed,
}

impl Blender {
    /// Precomputes the search pattern for a registry.
    #[must_use]
    pub fn new(registry: &BiomeRegistry, seed: WorldSeed) -> Self {
        let radius = registry.max_blending_radius() as i32;
        let mut offsets = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let distance = f64::from(dx * dx + dz * dz).sqrt();
                if (dx, dz) != (0, 0) && distance <= f64::from(radius) {
                    offsets.push((dx, dz, distance));
                }
            }
        }
        offsets.sort_by(|a, b| a.2.total_cmp(&b.2));
        Self { offsets, seed }
    }

    /// Blends inner column `(lx, lz)` of a chunk whose origin is at world
    /// `(origin_x, origin_z)`.
    ///
    /// `terrain` is the column's terrain noise.
    #[must_use]
    pub fn blend(
        &self,
        registry: &BiomeRegistry,
        map: &BiomeMap,
        lx: u32,
        lz: u32,
        terrain: f64,
        world: (i64, i64),
    ) -> BlendedColumn {
        let biome = map.inner(lx, lz).unwrap_or(registry.default_id());
        let own = registry.descriptor(biome);
        let own_height = own.height.apply(terrain);
        let unblended = BlendedColumn {
            biome,
            blend: None,
            height: own_height,
            surface: biome,
        };

        let ex = i64::from(lx + map.margin());
        let ez = i64::from(lz + map.margin());
        let nearest = self.offsets.iter().find_map(|&(dx, dz, distance)| {
            let (nx, nz) = (ex + i64::from(dx), ez + i64::from(dz));
            if nx < 0 || nz < 0 {
                return None;
            }
            map.get(nx as u32, nz as u32)
                .filter(|&other| other != biome)
                .map(|other| (other, distance))
        });

        let Some((other, distance)) = nearest else {
            return unblended;
        };
        let other_descriptor = registry.descriptor(other);
        let radius = f64::from(own.blending_radius.max(other_descriptor.blending_radius));
        if radius == 0.0 || distance > radius {
            return unblended;
        }

        let weight = 0.5 * (1.0 - distance / (radius + 1.0));
        let height = (1.0 - weight) * own_height + weight * other_descriptor.height.apply(terrain);
        let dither = self.seed.unit_column(purpose::BLEND_DITHER, world.0, world.1);
        BlendedColumn {
            biome,
            blend: Some((other, weight)),
            height,
            surface: if dither < weight { other } else { biome },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_core::{BiomeDescriptor, HeightModifier, MaterialId, SurfaceRules};

    fn descriptor(name: &str, climate: Option<ClimateSample>, height: f64, radius: u32) -> BiomeDescriptor {
        BiomeDescriptor {
            name: name.into(),
            climate,
            surface: SurfaceRules::uniform(MaterialId::new(2)),
            height: HeightModifier::flat(height),
            features: Vec::new(),
            blending_radius: radius,
        }
    }

    fn registry(biomes: Vec<BiomeDescriptor>) -> Arc<BiomeRegistry> {
        let default = biomes[0].name.clone();
        Arc::new(BiomeRegistry::new(&default, biomes).unwrap())
    }

    #[test]
    fn test_resolves_nearest() {
        let reg = registry(vec![
            descriptor("plains", None, 64.0, 0),
            descriptor("desert", Some(ClimateSample::new(0.8, -0.8, 0.0)), 66.0, 0),
            descriptor("tundra", Some(ClimateSample::new(-0.8, 0.0, 0.0)), 62.0, 0),
        ]);
        let resolver = BiomeResolver::new(Arc::clone(&reg)).unwrap();
        assert_eq!(resolver.resolve(&ClimateSample::new(0.7, -0.5, 0.1)), reg.id_of("desert").unwrap());
        assert_eq!(resolver.resolve(&ClimateSample::new(-0.9, 0.1, 0.0)), reg.id_of("tundra").unwrap());
    }

    #[test]
    fn test_tie_keeps_first_inserted() {
        let reg = registry(vec![
            descriptor("a", Some(ClimateSample::new(1.0, 0.0, 0.0)), 64.0, 0),
            descriptor("b", Some(ClimateSample::new(-1.0, 0.0, 0.0)), 64.0, 0),
        ]);
        let resolver = BiomeResolver::new(Arc::clone(&reg)).unwrap();
        assert_eq!(resolver.resolve(&ClimateSample::default()), reg.id_of("a").unwrap());
    }

    #[test]
    fn test_fallback_to_default() {
        let reg = registry(vec![descriptor("plains", None, 64.0, 0), descriptor("void", None, 10.0, 0)]);
        let resolver = BiomeResolver::new(Arc::clone(&reg)).unwrap();
        assert_eq!(resolver.resolve(&ClimateSample::new(0.3, 0.2, 0.1)), reg.default_id());

        let reg = registry(vec![
            descriptor("plains", None, 64.0, 0),
            descriptor("desert", Some(ClimateSample::new(0.8, -0.8, 0.0)), 66.0, 0),
        ]);
        let resolver = BiomeResolver::new(Arc::clone(&reg)).unwrap();
        assert_eq!(resolver.resolve(&ClimateSample::new(f64::NAN, 0.0, 0.0)), reg.default_id());
    }

    #[test]
    fn test_boundary_blend_is_monotonic() {
        let reg = registry(vec![descriptor("a", None, 60.0, 4), descriptor("b", None, 80.0, 4)]);
        let a = reg.id_of("a").unwrap();
        let b = reg.id_of("b").unwrap();
        let blender = Blender::new(&reg, WorldSeed::new(1));

        // 10 inner columns, boundary between lx = 4 and lx = 5, margin 4
        let margin = 4;
        let map = BiomeMap::from_fn(10 + 2 * margin, 1 + 2 * margin, margin, |ex, _| {
            if ex < margin + 5 { a } else { b }
        });

        let heights: Vec<f64> = (0..10)
            .map(|lx| blender.blend(&reg, &map, lx, 0, 0.0, (i64::from(lx), 0)).height)
            .collect();
        let expected = [60.0, 62.0, 64.0, 66.0, 68.0, 72.0, 74.0, 76.0, 78.0, 80.0];
        for (got, want) in heights.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {heights:?}");
        }

        let bound = 20.0 / 5.0;
        for pair in heights.windows(2) {
            assert!(pair[1] >= pair[0], "not monotonic: {heights:?}");
            assert!(pair[1] - pair[0] <= bound + 1e-9, "step too large: {heights:?}");
        }
    }

    #[test]
    fn test_no_blend_without_radius() {
        let reg = registry(vec![descriptor("a", None, 60.0, 0), descriptor("b", None, 80.0, 0)]);
        let a = reg.id_of("a").unwrap();
        let b = reg.id_of("b").unwrap();
        let blender = Blender::new(&reg, WorldSeed::new(1));
        let map = BiomeMap::from_fn(4, 1, 0, |ex, _| if ex < 2 { a } else { b });

        let col = blender.blend(&reg, &map, 1, 0, 0.0, (1, 0));
        assert_eq!(col.height, 60.0);
        assert_eq!(col.blend, None);
        assert_eq!(col.surface, a);
    }

    #[test]
    fn test_inner_biomes_in_registry_order() {
        let reg = registry(vec![descriptor("a", None, 60.0, 0), descriptor("b", None, 80.0, 0)]);
        let a = reg.id_of("a").unwrap();
        let b = reg.id_of("b").unwrap();
        let map = BiomeMap::from_fn(6, 6, 1, |ex, _| if ex < 3 { b } else { a });
        assert_eq!(map.inner_biomes(), vec![a, b]);

        let ring_only = BiomeMap::from_fn(6, 6, 1, |ex, _| if ex == 0 { b } else { a });
        assert_eq!(ring_only.inner_biomes(), vec![a]);
    }
}
