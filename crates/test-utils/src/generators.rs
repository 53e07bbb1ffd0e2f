//! Test data generators for creating synthetic weather-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major
//! (row 0 first), matching `DecodedLayer::values`.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    create_grid(width, height, |col, row| (col * 1000 + row) as f64)
}

/// Creates a grid from a function of `(col, row)`.
pub fn create_grid(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(f(col, row));
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from 250K to 310K along a gradient from the top-left
/// to the bottom-right corner.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    create_grid(width, height, |col, row| {
        let x_factor = col as f64 / width.max(1) as f64;
        let y_factor = row as f64 / height.max(1) as f64;
        250.0 + x_factor * 30.0 + y_factor * 30.0
    })
}

/// Creates a U-component wind grid (west-east component), varying by row.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f64> {
    create_grid(width, height, |_, row| {
        let lat_factor = (row as f64 / height as f64 - 0.5) * 2.0; // -1 to 1
        lat_factor * 20.0
    })
}

/// Creates a V-component wind grid (south-north component), varying by column.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f64> {
    create_grid(width, height, |col, _| {
        let lon_factor = (col as f64 / width as f64 - 0.5) * 2.0; // -1 to 1
        lon_factor * 15.0
    })
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates a grid where only the square block `lo..=hi` (in both axes) holds
/// `value`; every other cell is NaN.
///
/// # Example
///
/// ```
/// use test_utils::create_block_grid;
///
/// let grid = create_block_grid(10, 10, 1, 3, 5.0);
/// assert_eq!(grid.iter().filter(|v| !v.is_nan()).count(), 9);
/// ```
pub fn create_block_grid(width: usize, height: usize, lo: usize, hi: usize, value: f64) -> Vec<f64> {
    create_grid(width, height, |col, row| {
        if (lo..=hi).contains(&col) && (lo..=hi).contains(&row) {
            value
        } else {
            f64::NAN
        }
    })
}

/// Creates a grid of `base` values with NaN at the given `(col, row)` positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    base: f64,
    nan_positions: &[(usize, usize)],
) -> Vec<f64> {
    let mut data = create_constant_grid(width, height, base);
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f64::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(3, 2);
        assert_eq!(grid, vec![0.0, 1000.0, 2000.0, 1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn test_temperature_range() {
        let grid = create_temperature_grid(10, 10);
        assert!(grid.iter().all(|&t| (250.0..=310.0).contains(&t)));
    }

    #[test]
    fn test_grid_with_nans() {
        let grid = create_grid_with_nans(3, 3, 1.0, &[(1, 1), (5, 5)]);
        assert!(grid[4].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }
}
