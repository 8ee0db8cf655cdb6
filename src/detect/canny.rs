//! The six-stage Canny edge detector.
//!
//! Every stage is a re-entrant, side-effect-free function over grids. Border
//! handling is explicit per stage: greyscale leaves the outer border at zero,
//! the convolutions reflect at the boundary, and non-maximum suppression and
//! hysteresis skip pixels with an incomplete neighborhood rather than zeroing
//! them.

use super::grid::{reflect, Grid, PixelGrid};

/// Configurable Canny edge detector.
///
/// Thresholds are ratios of the observed maximum gradient magnitude, never
/// absolute values, so the detector adapts to the dynamic range of each image.
#[derive(Debug, Clone)]
pub struct CannyEdgeDetector {
    /// Side length of the Gaussian smoothing kernel.
    pub kernel_size: usize,
    /// Standard deviation of the Gaussian smoothing kernel.
    pub sigma: f64,
    /// Value assigned to weak edge candidates by the double threshold.
    pub weak: f64,
    /// Value assigned to strong edges.
    pub strong: f64,
    /// Low threshold as a fraction of the high threshold.
    pub low_ratio: f64,
    /// High threshold as a fraction of the maximum gradient magnitude.
    pub high_ratio: f64,
}

impl Default for CannyEdgeDetector {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 1.0,
            weak: 75.0,
            strong: 255.0,
            low_ratio: 0.04,
            high_ratio: 0.13,
        }
    }
}

impl CannyEdgeDetector {
    /// Runs all six stages and returns the edge map, valued in
    /// {0, weak, strong}.
    pub fn detect(&self, rgb: &PixelGrid) -> Grid {
        let grey = self.greyscale(rgb);
        let smoothed = convolve(&grey, &gaussian_kernel(self.kernel_size, self.sigma));
        let (magnitude, direction) = self.gradient(&smoothed);
        let suppressed = self.non_max_suppression(&magnitude, &direction);
        let thresholded = self.threshold(&suppressed);
        self.hysteresis(thresholded)
    }

    /// Stage 1: per-pixel luminance. The outer border is left at zero: it is
    /// not computed, by policy, so the later neighborhood stages see a
    /// consistent frame.
    pub fn greyscale(&self, rgb: &PixelGrid) -> Grid {
        let (w, h) = (rgb.width(), rgb.height());
        let mut grey = Grid::new(w, h);

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let [r, g, b] = rgb.get(x, y);
                let luminance = 0.2989 * r as f64 + 0.5870 * g as f64 + 0.1140 * b as f64;
                grey.set(x, y, luminance);
            }
        }

        grey
    }

    /// Stage 3: Sobel gradient.
    ///
    /// Returns the magnitude, linearly rescaled so the observed maximum maps
    /// to 255, and the direction (`atan2(Iy, Ix)`). A flat image (zero
    /// maximum) yields an all-zero magnitude.
    pub fn gradient(&self, img: &Grid) -> (Grid, Grid) {
        let kx = sobel_kernel(&[[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]);
        let ky = sobel_kernel(&[[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]]);

        let ix = convolve(img, &kx);
        let iy = convolve(img, &ky);

        let (w, h) = (img.width(), img.height());
        let mut magnitude = Grid::new(w, h);
        let mut direction = Grid::new(w, h);

        for y in 0..h {
            for x in 0..w {
                magnitude.set(x, y, ix.get(x, y).hypot(iy.get(x, y)));
                direction.set(x, y, iy.get(x, y).atan2(ix.get(x, y)));
            }
        }

        let max = magnitude.max_value();
        if max > 0.0 {
            for y in 0..h {
                for x in 0..w {
                    magnitude.set(x, y, magnitude.get(x, y) / max * 255.0);
                }
            }
        }

        (magnitude, direction)
    }

    /// Stage 4: non-maximum suppression.
    ///
    /// Thins the magnitude to local maxima along the quantized gradient
    /// direction. A pixel survives only if it is at least as large as both
    /// neighbors along its direction bucket's axis. Border pixels have an
    /// incomplete neighborhood and pass through unsuppressed.
    pub fn non_max_suppression(&self, magnitude: &Grid, direction: &Grid) -> Grid {
        let (w, h) = (magnitude.width(), magnitude.height());
        let mut out = magnitude.clone();

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let mut angle = direction.get(x, y).to_degrees();
                if angle < 0.0 {
                    angle += 180.0;
                }

                // Neighbors along the quantized gradient axis
                let (a, b) = if !(22.5..157.5).contains(&angle) {
                    (magnitude.get(x + 1, y), magnitude.get(x - 1, y))
                } else if angle < 67.5 {
                    (magnitude.get(x - 1, y + 1), magnitude.get(x + 1, y - 1))
                } else if angle < 112.5 {
                    (magnitude.get(x, y + 1), magnitude.get(x, y - 1))
                } else {
                    (magnitude.get(x - 1, y - 1), magnitude.get(x + 1, y + 1))
                };

                let value = magnitude.get(x, y);
                out.set(x, y, if value >= a && value >= b { value } else { 0.0 });
            }
        }

        out
    }

    /// Stage 5: double threshold.
    ///
    /// The high threshold is a fraction of the observed maximum magnitude and
    /// the low threshold a fraction of the high one. Values at or above high
    /// become strong, values in `[low, high)` become weak, the rest zero.
    pub fn threshold(&self, img: &Grid) -> Grid {
        let high = img.max_value() * self.high_ratio;
        let low = high * self.low_ratio;

        let (w, h) = (img.width(), img.height());
        let mut out = Grid::new(w, h);

        for y in 0..h {
            for x in 0..w {
                let value = img.get(x, y);
                if value >= high {
                    out.set(x, y, self.strong);
                } else if value >= low {
                    out.set(x, y, self.weak);
                }
            }
        }

        out
    }

    /// Stage 6: hysteresis.
    ///
    /// Weak pixels 8-adjacent to a strong pixel are promoted to strong; the
    /// remaining interior weak pixels are suppressed to zero. Border pixels
    /// with an incomplete neighborhood are skipped. Applying the stage to its
    /// own output changes nothing.
    pub fn hysteresis(&self, mut img: Grid) -> Grid {
        let (w, h) = (img.width(), img.height());

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                if img.get(x, y) != self.weak {
                    continue;
                }

                let mut promoted = false;
                'neighbors: for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = (x as isize + dx) as usize;
                        let ny = (y as isize + dy) as usize;
                        if img.get(nx, ny) == self.strong {
                            promoted = true;
                            break 'neighbors;
                        }
                    }
                }

                img.set(x, y, if promoted { self.strong } else { 0.0 });
            }
        }

        img
    }
}

/// Stage 2's kernel: a 2D Gaussian over the symmetric index range of the
/// requested size, `exp(-(x² + y²) / (2σ²)) / (2πσ²)`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Grid {
    let half = (size / 2) as isize;
    let side = (2 * half + 1) as usize;
    let normal = 1.0 / (2.0 * std::f64::consts::PI * sigma * sigma);

    let mut kernel = Grid::new(side, side);
    for j in -half..=half {
        for i in -half..=half {
            let value = (-((i * i + j * j) as f64) / (2.0 * sigma * sigma)).exp() * normal;
            kernel.set((i + half) as usize, (j + half) as usize, value);
        }
    }
    kernel
}

/// 2D convolution with reflected borders.
pub fn convolve(img: &Grid, kernel: &Grid) -> Grid {
    let (w, h) = (img.width(), img.height());
    let half_x = (kernel.width() / 2) as isize;
    let half_y = (kernel.height() / 2) as isize;

    let mut out = Grid::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for kj in -half_y..=half_y {
                for ki in -half_x..=half_x {
                    let sx = reflect(x as isize + ki, w);
                    let sy = reflect(y as isize + kj, h);
                    acc += img.get(sx, sy)
                        * kernel.get((ki + half_x) as usize, (kj + half_y) as usize);
                }
            }
            out.set(x, y, acc);
        }
    }
    out
}

fn sobel_kernel(rows: &[[f64; 3]; 3]) -> Grid {
    let mut kernel = Grid::new(3, 3);
    for (j, row) in rows.iter().enumerate() {
        for (i, &value) in row.iter().enumerate() {
            kernel.set(i, j, value);
        }
    }
    kernel
}
