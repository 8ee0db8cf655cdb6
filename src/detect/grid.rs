//! Row-major 2D grids used by the detection stages.

/// A 2D grid of scalar values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Creates a zero-filled grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }

    /// Largest value in the grid, or zero for an empty grid.
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Number of nonzero cells.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }

    /// Raw row-major values.
    pub fn values(&self) -> &[f64] {
        &self.data
    }
}

/// An RGB pixel grid, the detector's input. Row-major, one `[r, g, b]`
/// triplet per pixel.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 3]>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixels[y * self.width + x]
    }
}

/// Reflects an out-of-range index back into `0..len`, mirroring about the
/// boundary cell (`d c b a | a b c d`). Used by the convolution stages so
/// border pixels see a full neighborhood.
#[inline]
pub fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let reflected = if index < 0 {
        -index - 1
    } else if index >= len {
        2 * len - index - 1
    } else {
        index
    };
    reflected.clamp(0, len - 1) as usize
}
