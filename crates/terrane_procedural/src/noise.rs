//! # Noise
//!
//! Seeded 2D/3D simplex noise and the fractal layers built from it.
//!
//! Every layer is a pure function of `(seed, purpose, position)`: no
//! floating-point state is carried between samples, so a value computed on
//! one worker equals the value computed on any other. Lattice indices are
//! `i64` with wrapping arithmetic, which keeps chunk coordinates at the
//! ends of the `i32` range well-defined.

use terrane_core::{NoiseLayerConfig, WorldSeed};

/// Seed purposes. Every independent stream derives from its own purpose.
pub mod purpose {
    /// Terrain shape.
    pub const TERRAIN: u64 = 1;
    /// Temperature axis.
    pub const TEMPERATURE: u64 = 2;
    /// Humidity axis.
    pub const HUMIDITY: u64 = 3;
    /// Continentalness axis.
    pub const CONTINENTALNESS: u64 = 4;
    /// Cave density.
    pub const CAVES: u64 = 5;
    /// River course.
    pub const RIVERS: u64 = 6;
    /// Surface dither at biome boundaries.
    pub const BLEND_DITHER: u64 = 7;
    /// Per-chunk decoration RNG.
    pub const DECORATION: u64 = 8;
    /// Structure region anchors.
    pub const STRUCTURE: u64 = 9;
}

/// Seed-shuffled lattice hash.
struct PermutationTable {
    /// 256 shuffled entries, stored twice so `a + perm[b]` never wraps.
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient vectors for 2D simplex.
    const GRAD2: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    /// 12 cube-edge gradients for 3D simplex.
    const GRAD3: [[i8; 3]; 12] = [
        [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
        [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
        [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
    ];

    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle with xorshift64; zero state would never move
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        perm.copy_within(0..256, 256);

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> usize {
        self.perm[index & 511] as usize
    }
}

/// 2D/3D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Performance
///
/// - O(1) per sample
/// - No allocations
/// - Immutable after construction, safe to share across threads
pub struct SimplexNoise {
    /// The permutation table.
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_438_6; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6
    /// Skewing factor for 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = (i as f64 + j as f64) * Self::G2;
        let x0 = x - (i as f64 - unskew);
        let y0 = y - (j as f64 - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj));
        let gi1 = p.get(ii + i1 as usize + p.get(jj + j1 as usize));
        let gi2 = p.get(ii + 1 + p.get(jj + 1));

        let n0 = Self::contribution2(x0, y0, gi0);
        let n1 = Self::contribution2(x1, y1, gi1);
        let n2 = Self::contribution2(x2, y2, gi2);

        // Scale to roughly [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Samples 3D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = (i as f64 + j as f64 + k as f64) * Self::G3;
        let x0 = x - (i as f64 - unskew);
        let y0 = y - (j as f64 - unskew);
        let z0 = z - (k as f64 - unskew);

        // Which of the six tetrahedra we are in
        let ((i1, j1, k1), (i2, j2, k2)) = if x0 >= y0 {
            if y0 >= z0 {
                ((1, 0, 0), (1, 1, 0))
            } else if x0 >= z0 {
                ((1, 0, 0), (1, 0, 1))
            } else {
                ((0, 0, 1), (1, 0, 1))
            }
        } else if y0 < z0 {
            ((0, 0, 1), (0, 1, 1))
        } else if x0 < z0 {
            ((0, 1, 0), (0, 1, 1))
        } else {
            ((0, 1, 0), (1, 1, 0))
        };

        let x1 = x0 - f64::from(i1) + Self::G3;
        let y1 = y0 - f64::from(j1) + Self::G3;
        let z1 = z0 - f64::from(k1) + Self::G3;
        let x2 = x0 - f64::from(i2) + 2.0 * Self::G3;
        let y2 = y0 - f64::from(j2) + 2.0 * Self::G3;
        let z2 = z0 - f64::from(k2) + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let p = &self.perm_table;
        let corner = |di: usize, dj: usize, dk: usize| p.get(ii + di + p.get(jj + dj + p.get(kk + dk)));

        let gi0 = corner(0, 0, 0);
        let gi1 = corner(i1 as usize, j1 as usize, k1 as usize);
        let gi2 = corner(i2 as usize, j2 as usize, k2 as usize);
        let gi3 = corner(1, 1, 1);

        let n0 = Self::contribution3(x0, y0, z0, gi0);
        let n1 = Self::contribution3(x1, y1, z1, gi1);
        let n2 = Self::contribution3(x2, y2, z2, gi2);
        let n3 = Self::contribution3(x3, y3, z3, gi3);

        (32.0 * (n0 + n1 + n2 + n3)).clamp(-1.0, 1.0)
    }

    /// Calculates the contribution from one corner of a 2D simplex.
    #[inline]
    fn contribution2(x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::GRAD2[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }

    /// Calculates the contribution from one corner of a 3D simplex.
    #[inline]
    fn contribution3(x: f64, y: f64, z: f64, hash: usize) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::GRAD3[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]) + z * f64::from(grad[2]))
        }
    }
}

/// One octave of a [`LayeredNoise`].
struct Octave {
    noise: SimplexNoise,
    frequency: f64,
    amplitude: f64,
}

/// Layered (fractal) noise built from a [`NoiseLayerConfig`].
///
/// Octaves are summed with weights normalised by the total amplitude, so
/// the result stays in [-1, 1].
pub struct LayeredNoise {
    octaves: Vec<Octave>,
    total_amplitude: f64,
}

impl LayeredNoise {
    /// Builds the layer. Each octave gets its own generator derived from
    /// `seed.derive(purpose).derive(seed_offset)`.
    ///
    /// The config must already be validated; an empty layer samples 0.
    #[must_use]
    pub fn new(seed: WorldSeed, purpose: u64, config: &NoiseLayerConfig) -> Self {
        let stream = seed.derive(purpose);
        let octaves: Vec<Octave> = config
            .octaves
            .iter()
            .map(|octave| Octave {
                noise: SimplexNoise::new(stream.derive(octave.seed_offset)),
                frequency: octave.frequency,
                amplitude: octave.amplitude,
            })
            .collect();
        let total_amplitude = octaves.iter().map(|o| o.amplitude).sum();

        Self {
            octaves,
            total_amplitude,
        }
    }

    /// Samples the 2D layer.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        if self.octaves.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .octaves
            .iter()
            .map(|o| o.noise.sample(x * o.frequency, z * o.frequency) * o.amplitude)
            .sum();
        total / self.total_amplitude
    }

    /// Samples the 3D layer.
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        if self.octaves.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .octaves
            .iter()
            .map(|o| o.noise.sample3(x * o.frequency, y * o.frequency, z * o.frequency) * o.amplitude)
            .sum();
        total / self.total_amplitude
    }

    /// Samples the 2D layer at a world column.
    #[inline]
    #[must_use]
    pub fn sample_column(&self, x: i64, z: i64) -> f64 {
        self.sample(x as f64, z as f64)
    }
}

/// Fast floor function.
///
/// Saturates for values outside the `i64` range; NaN maps to 0.
#[inline]
fn fast_floor(x: f64) -> i64 {
    let xi = x as i64;
    if x < xi as f64 { xi.wrapping_sub(1) } else { xi }
}
