//! # Surface Decoration
//!
//! Per-biome features placed after carving: trees, scattered plants,
//! boulders and ore veins.
//!
//! Every (chunk, biome, feature) triple draws from its own ChaCha8 stream,
//! so adding a feature to one biome never shifts another biome's output.
//! Writes outside the chunk are clipped.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terrane_core::{
    BiomeId, BiomeRegistry, ChunkBuffer, ChunkCoord, DecorationFeature, MaterialId, WorldSeed,
};

use crate::generator::ColumnPlan;
use crate::noise::purpose;

/// Inputs shared by every feature of one chunk.
pub struct DecorationContext<'a> {
    /// World seed.
    pub seed: WorldSeed,
    /// Chunk being decorated.
    pub coord: ChunkCoord,
    /// Biome registry.
    pub registry: &'a BiomeRegistry,
    /// Inner column plans, `[lz][lx]`.
    pub columns: &'a [ColumnPlan],
}

impl DecorationContext<'_> {
    /// Deterministic RNG for one feature of one biome in this chunk.
    #[must_use]
    pub fn feature_rng(&self, biome: BiomeId, feature_index: usize) -> ChaCha8Rng {
        let stream = purpose::DECORATION ^ ((biome.index() as u64) << 32) ^ feature_index as u64;
        let seed = self
            .seed
            .hash_column(stream, i64::from(self.coord.x), i64::from(self.coord.z));
        ChaCha8Rng::seed_from_u64(seed)
    }
}

/// Places every single-chunk feature of every biome present, in registry
/// order, each biome's features in declared order.
pub fn decorate(ctx: &DecorationContext<'_>, present: &[BiomeId], buffer: &mut ChunkBuffer) {
    for &biome in present {
        let descriptor = ctx.registry.descriptor(biome);
        for (index, feature) in descriptor.features.iter().enumerate() {
            let mut rng = ctx.feature_rng(biome, index);
            match *feature {
                DecorationFeature::Tree {
                    trunk,
                    leaves,
                    min_height,
                    max_height,
                    canopy_radius,
                    chance,
                } => {
                    let tree = Tree {
                        trunk,
                        leaves,
                        canopy_radius: i64::from(canopy_radius),
                    };
                    for_each_column(ctx, buffer, biome, |buffer, lx, lz, column| {
                        if !rng.gen_bool(chance) {
                            return;
                        }
                        let height = rng.gen_range(min_height..=max_height);
                        let top = buffer.get_clipped(lx, i64::from(column.height), lz);
                        let above = buffer.get_clipped(lx, i64::from(column.height) + 1, lz);
                        if top.is_some_and(|m| !m.is_empty()) && above == Some(MaterialId::EMPTY) {
                            tree.place(buffer, lx, i64::from(column.height) + 1, lz, i64::from(height));
                        }
                    });
                }
                DecorationFeature::Scatter { material, chance, on } => {
                    for_each_column(ctx, buffer, biome, |buffer, lx, lz, column| {
                        if !rng.gen_bool(chance) {
                            return;
                        }
                        let y = i64::from(column.height);
                        let top = buffer.get_clipped(lx, y, lz);
                        let fits = on.map_or(top.is_some_and(|m| !m.is_empty()), |on| top == Some(on));
                        if fits && buffer.get_clipped(lx, y + 1, lz) == Some(MaterialId::EMPTY) {
                            buffer.set_clipped(lx, y + 1, lz, material);
                        }
                    });
                }
                DecorationFeature::Boulder {
                    material,
                    radius,
                    chance,
                } => {
                    let r = i64::from(radius);
                    for_each_column(ctx, buffer, biome, |buffer, lx, lz, column| {
                        if !rng.gen_bool(chance) {
                            return;
                        }
                        let cy = i64::from(column.height);
                        for dy in -r..=r {
                            for dz in -r..=r {
                                for dx in -r..=r {
                                    if dx * dx + dy * dy + dz * dz <= r * r {
                                        buffer.set_clipped(lx + dx, cy + dy, lz + dz, material);
                                    }
                                }
                            }
                        }
                    });
                }
                DecorationFeature::Vein {
                    material,
                    replace,
                    min_y,
                    max_y,
                    size,
                    count,
                } => {
                    let dims = buffer.dims();
                    for _ in 0..count {
                        let start_x = rng.gen_range(0..dims.width);
                        let start_z = rng.gen_range(0..dims.depth);
                        let start_y = rng.gen_range(min_y..max_y);
                        let owned = column_at(ctx, buffer, start_x, start_z).is_some_and(|c| c.biome == biome);

                        let (mut x, mut y, mut z) = (i64::from(start_x), i64::from(start_y), i64::from(start_z));
                        for _ in 0..size {
                            if owned && buffer.get_clipped(x, y, z) == Some(replace) {
                                buffer.set_clipped(x, y, z, material);
                            }
                            x += rng.gen_range(-1..=1);
                            y += rng.gen_range(-1..=1);
                            z += rng.gen_range(-1..=1);
                        }
                    }
                }
                // Placed from region anchors by the structure pass
                DecorationFeature::Structure { .. } => {}
            }
        }
    }
}

/// Calls `f` for every inner column owned by `biome`, in `[lz][lx]` order.
fn for_each_column(
    ctx: &DecorationContext<'_>,
    buffer: &mut ChunkBuffer,
    biome: BiomeId,
    mut f: impl FnMut(&mut ChunkBuffer, i64, i64, ColumnPlan),
) {
    let dims = buffer.dims();
    for lz in 0..dims.depth {
        for lx in 0..dims.width {
            if let Some(column) = column_at(ctx, buffer, lx, lz) {
                if column.biome == biome {
                    f(buffer, i64::from(lx), i64::from(lz), column);
                }
            }
        }
    }
}

fn column_at(ctx: &DecorationContext<'_>, buffer: &ChunkBuffer, lx: u32, lz: u32) -> Option<ColumnPlan> {
    let width = buffer.dims().width as usize;
    ctx.columns.get(lz as usize * width + lx as usize).copied()
}

/// Trunk with a rounded canopy.
struct Tree {
    trunk: MaterialId,
    leaves: MaterialId,
    canopy_radius: i64,
}

impl Tree {
    /// Grows a tree with its trunk base at `(x, base_y, z)`.
    ///
    /// Skipped if it would not fit under the world ceiling or the trunk is
    /// blocked. Leaves only replace empty cells.
    fn place(&self, buffer: &mut ChunkBuffer, x: i64, base_y: i64, z: i64, trunk_height: i64) {
        let ceiling = i64::from(buffer.dims().height);
        if base_y + trunk_height + 2 >= ceiling {
            return;
        }

        let trunk_top = base_y + trunk_height;
        if (base_y..trunk_top).any(|y| buffer.get_clipped(x, y, z) != Some(MaterialId::EMPTY)) {
            return;
        }
        for y in base_y..trunk_top {
            buffer.set_clipped(x, y, z, self.trunk);
        }

        let leaf_base = (trunk_top - 2).max(base_y);
        let leaf_top = trunk_top + 2;
        let r = self.canopy_radius;
        for y in leaf_base..leaf_top {
            // Narrower crown on the top layer
            let radius = if y == leaf_top - 1 { (r - 1).max(0) } else { r };
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    // Skip corners for more natural shape
                    if dx * dx + dz * dz > radius * radius + 1 {
                        continue;
                    }
                    if buffer.get_clipped(x + dx, y, z + dz) == Some(MaterialId::EMPTY) {
                        buffer.set_clipped(x + dx, y, z + dz, self.leaves);
                    }
                }
            }
        }
    }
}
