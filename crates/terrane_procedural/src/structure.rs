//! # Multi-Chunk Structures
//!
//! The world is divided into square regions of `spacing` columns. Each
//! region holds at most one structure, anchored at a position derived
//! from the seed and region alone. Whether it spawns, and at what height,
//! depends only on the unblended terrain at the anchor, so every chunk the
//! footprint touches reaches the same decision independently and writes
//! its own clipped share.

use terrane_core::{BiomeId, ChunkBuffer, ChunkCoord, MaterialId, WorldSeed};

use crate::noise::purpose;

/// A structure feature of one biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureSpec {
    /// Owning biome.
    pub biome: BiomeId,
    /// Index in the biome's feature list.
    pub feature_index: usize,
    /// Wall material.
    pub wall: MaterialId,
    /// Floor material.
    pub floor: MaterialId,
    /// Footprint edge length.
    pub size: u32,
    /// Wall height.
    pub height: u32,
    /// Region edge length.
    pub spacing: u32,
    /// Per-region probability.
    pub chance: f64,
}

impl StructureSpec {
    fn stream(&self, salt: u64) -> u64 {
        purpose::STRUCTURE ^ ((self.biome.index() as u64) << 32) ^ ((self.feature_index as u64) << 8) ^ salt
    }

    /// Regions whose area overlaps the columns `[x0, x0 + width) x [z0, z0 + depth)`.
    pub fn regions(&self, x0: i64, z0: i64, width: u32, depth: u32) -> impl Iterator<Item = (i64, i64)> {
        let spacing = i64::from(self.spacing);
        let (rx0, rx1) = (x0.div_euclid(spacing), (x0 + i64::from(width) - 1).div_euclid(spacing));
        let (rz0, rz1) = (z0.div_euclid(spacing), (z0 + i64::from(depth) - 1).div_euclid(spacing));
        (rz0..=rz1).flat_map(move |rz| (rx0..=rx1).map(move |rx| (rx, rz)))
    }

    /// North-west corner of the region's structure, if the region rolls one.
    #[must_use]
    pub fn anchor(&self, seed: WorldSeed, region: (i64, i64)) -> Option<(i64, i64)> {
        let (rx, rz) = region;
        if seed.unit_column(self.stream(0), rx, rz) >= self.chance {
            return None;
        }
        let slack = u64::from(self.spacing - self.size) + 1;
        let dx = seed.hash_column(self.stream(1), rx, rz) % slack;
        let dz = seed.hash_column(self.stream(2), rx, rz) % slack;
        let spacing = i64::from(self.spacing);
        Some((rx * spacing + dx as i64, rz * spacing + dz as i64))
    }

    /// Column whose biome and height decide the structure.
    #[must_use]
    pub fn center(&self, anchor: (i64, i64)) -> (i64, i64) {
        let half = i64::from(self.size / 2);
        (anchor.0 + half, anchor.1 + half)
    }

    /// Writes the part of the structure that falls inside `buffer`.
    ///
    /// The floor sits at `base`; walls and a cleared interior rise
    /// `height` cells above it, with a two-cell doorway in the north wall.
    /// Returns the number of cells written.
    pub fn stamp(&self, buffer: &mut ChunkBuffer, coord: ChunkCoord, anchor: (i64, i64), base: i64) -> usize {
        let dims = buffer.dims();
        let (ox, oz) = (coord.origin_x(dims), coord.origin_z(dims));
        let size = i64::from(self.size);
        let top = base + i64::from(self.height);
        let door = size / 2;
        let mut written = 0;

        for dz in 0..size {
            for dx in 0..size {
                let lx = anchor.0 + dx - ox;
                let lz = anchor.1 + dz - oz;
                if !dims.contains(lx, 0, lz) {
                    continue;
                }
                let edge = dx == 0 || dz == 0 || dx == size - 1 || dz == size - 1;
                written += usize::from(buffer.set_clipped(lx, base, lz, self.floor));
                for y in base + 1..=top {
                    let doorway = dz == 0 && dx == door && y <= base + 2;
                    let material = if edge && !doorway { self.wall } else { MaterialId::EMPTY };
                    written += usize::from(buffer.set_clipped(lx, y, lz, material));
                }
            }
        }
        written
    }
}
