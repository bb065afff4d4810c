//! # Chunk Dimensions
//!
//! Width x depth x height of every chunk buffer, fixed at engine load.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, OutOfBoundsError};

/// Fixed chunk dimensions agreed with the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDimensions {
    /// Cells along X.
    pub width: u32,
    /// Cells along Z.
    pub depth: u32,
    /// Cells along Y (world height).
    pub height: u32,
}

impl ChunkDimensions {
    /// 16x16x256, the common block-world layout.
    pub const STANDARD: Self = Self {
        width: 16,
        depth: 16,
        height: 256,
    };

    /// Largest accepted width/depth.
    pub const MAX_HORIZONTAL: u32 = 512;

    /// Largest accepted world height.
    pub const MAX_HEIGHT: u32 = 4096;

    /// Creates new dimensions (unvalidated).
    #[inline]
    #[must_use]
    pub const fn new(width: u32, depth: u32, height: u32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Validates the dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDimensions`] for zero or oversized axes.
    pub fn validate(self) -> Result<(), ConfigError> {
        let horizontal_ok = (1..=Self::MAX_HORIZONTAL).contains(&self.width)
            && (1..=Self::MAX_HORIZONTAL).contains(&self.depth);
        let vertical_ok = (1..=Self::MAX_HEIGHT).contains(&self.height);

        if horizontal_ok && vertical_ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidDimensions {
                width: self.width,
                depth: self.depth,
                height: self.height,
            })
        }
    }

    /// Total number of cells in one chunk.
    #[inline]
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width as usize * self.depth as usize * self.height as usize
    }

    /// Number of columns in one chunk.
    #[inline]
    #[must_use]
    pub const fn column_count(self) -> usize {
        self.width as usize * self.depth as usize
    }

    /// Returns true if the local position lies inside the chunk.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < self.width as i64
            && y < self.height as i64
            && z < self.depth as i64
    }

    /// Linear cell index (`[y][z][x]` order).
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] if any axis is outside the chunk.
    #[inline]
    pub fn index(self, x: u32, y: u32, z: u32) -> Result<usize, OutOfBoundsError> {
        if x < self.width && y < self.height && z < self.depth {
            Ok((y as usize * self.depth as usize + z as usize) * self.width as usize + x as usize)
        } else {
            Err(OutOfBoundsError {
                x: i64::from(x),
                y: i64::from(y),
                z: i64::from(z),
                dims: self,
            })
        }
    }
}

impl Default for ChunkDimensions {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_valid() {
        assert!(ChunkDimensions::STANDARD.validate().is_ok());
        assert_eq!(ChunkDimensions::STANDARD.cell_count(), 16 * 16 * 256);
    }

    #[test]
    fn test_zero_axis_rejected() {
        let err = ChunkDimensions::new(16, 0, 256).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDimensions { depth: 0, .. }));
        assert!(ChunkDimensions::new(16, 16, 0).validate().is_err());
        assert!(ChunkDimensions::new(1024, 16, 256).validate().is_err());
    }

    #[test]
    fn test_index_layout() {
        let dims = ChunkDimensions::new(4, 3, 2);
        assert_eq!(dims.index(0, 0, 0), Ok(0));
        assert_eq!(dims.index(1, 0, 0), Ok(1));
        assert_eq!(dims.index(0, 0, 1), Ok(4));
        assert_eq!(dims.index(0, 1, 0), Ok(12));
        assert_eq!(dims.index(3, 1, 2), Ok(23));
        assert!(dims.index(4, 0, 0).is_err());
        assert!(dims.index(0, 2, 0).is_err());
        assert!(dims.index(0, 0, 3).is_err());
    }
}
