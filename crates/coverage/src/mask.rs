//! Boolean validity masks over a layer's grid.

use std::collections::VecDeque;

use grib_common::DecodedLayer;

/// Row-major boolean mask, `true` where the layer holds a valid value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl ValidityMask {
    /// Mask of cells whose value lies in the layer's valid range.
    pub fn from_layer(layer: &DecodedLayer) -> Self {
        let cells = layer.values.iter().map(|&v| layer.is_valid(v)).collect();
        Self {
            width: layer.nx,
            height: layer.ny,
            cells,
        }
    }

    /// Build a mask from a predicate over grid indices `(i, j)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                cells.push(f(i, j));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `(i, j)` is valid; out-of-range indices are invalid.
    pub fn get(&self, i: isize, j: isize) -> bool {
        if i < 0 || j < 0 || i as usize >= self.width || j as usize >= self.height {
            return false;
        }
        self.cells[j as usize * self.width + i as usize]
    }

    pub fn count_valid(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count_valid() == 0
    }

    /// Mark every invalid region not 4-connected to the grid border as valid.
    pub fn fill_holes(&mut self) {
        let (w, h) = (self.width, self.height);
        let mut outside = vec![false; w * h];
        let mut queue = VecDeque::new();

        for j in 0..h {
            for i in 0..w {
                let on_border = i == 0 || j == 0 || i + 1 == w || j + 1 == h;
                let idx = j * w + i;
                if on_border && !self.cells[idx] {
                    outside[idx] = true;
                    queue.push_back((i, j));
                }
            }
        }

        while let Some((i, j)) = queue.pop_front() {
            let neighbours = [
                (i.wrapping_sub(1), j),
                (i + 1, j),
                (i, j.wrapping_sub(1)),
                (i, j + 1),
            ];
            for (ni, nj) in neighbours {
                if ni >= w || nj >= h {
                    continue;
                }
                let idx = nj * w + ni;
                if !self.cells[idx] && !outside[idx] {
                    outside[idx] = true;
                    queue.push_back((ni, nj));
                }
            }
        }

        for (cell, out) in self.cells.iter_mut().zip(outside) {
            if !out {
                *cell = true;
            }
        }
    }

    /// A copy surrounded by a one-cell invalid border.
    pub fn padded(&self) -> Self {
        let (w, h) = (self.width + 2, self.height + 2);
        Self::from_fn(w, h, |i, j| self.get(i as isize - 1, j as isize - 1))
    }
}
