//! Point interpolation on a row-major grid in index space.

/// Bilinear interpolation.
///
/// Smoothly interpolates between the four nearest grid points. Returns NaN
/// outside the grid or when any corner is NaN.
pub fn bilinear_interpolate(data: &[f64], width: usize, height: usize, x: f64, y: f64) -> f64 {
    if width == 0 || height == 0 || x < 0.0 || y < 0.0 {
        return f64::NAN;
    }
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    if x0 >= width || y0 >= height {
        return f64::NAN;
    }
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Bicubic interpolation.
///
/// Uses the 16 surrounding points, clamped at the grid edges. Falls back to
/// bilinear when any of them is NaN.
pub fn cubic_interpolate(data: &[f64], width: usize, height: usize, x: f64, y: f64) -> f64 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return f64::NAN;
    }
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;

    let xf = x - xi as f64;
    let yf = y - yi as f64;

    let mut values = [[0.0f64; 4]; 4];
    for (j, row) in values.iter_mut().enumerate() {
        for (i, value) in row.iter_mut().enumerate() {
            let px = (xi + i as i64 - 1).clamp(0, width as i64 - 1) as usize;
            let py = (yi + j as i64 - 1).clamp(0, height as i64 - 1) as usize;
            *value = data[py * width + px];

            if value.is_nan() {
                return bilinear_interpolate(data, width, height, x, y);
            }
        }
    }

    // Along x for each row, then along y
    let mut row_values = [0.0f64; 4];
    for (out, row) in row_values.iter_mut().zip(values.iter()) {
        *out = cubic_1d(row[0], row[1], row[2], row[3], xf);
    }
    cubic_1d(row_values[0], row_values[1], row_values[2], row_values[3], yf)
}

/// 1D cubic interpolation using Catmull-Rom spline.
fn cubic_1d(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}

/// Linear interpolation in time between two samples.
///
/// Equal sample times return `v0` directly.
pub fn interpolate_time(t0: i64, v0: f64, t1: i64, v1: f64, t: i64) -> f64 {
    if t0 == t1 {
        return v0;
    }
    let w = (t - t0) as f64 / (t1 - t0) as f64;
    v0 + (v1 - v0) * w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bilinear_interpolate() {
        let data = vec![
            1.0, 2.0,
            3.0, 4.0,
        ];

        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 0.0), 2.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 1.0), 3.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 1.0), 4.0);

        let center = bilinear_interpolate(&data, 2, 2, 0.5, 0.5);
        assert!((center - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_bilinear_with_nan() {
        let data = vec![
            1.0, f64::NAN,
            3.0, 4.0,
        ];
        assert!(bilinear_interpolate(&data, 2, 2, 0.5, 0.5).is_nan());
    }

    #[test]
    fn test_cubic_hits_nodes() {
        let data: Vec<f64> = (0..16).map(|v| (v * v) as f64).collect();
        for j in 0..4 {
            for i in 0..4 {
                let v = cubic_interpolate(&data, 4, 4, i as f64, j as f64);
                assert!((v - data[j * 4 + i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_cubic_reproduces_linear_field() {
        // f(x, y) = 2x + 3y is reproduced exactly away from the edges
        let data: Vec<f64> = (0..25).map(|k| 2.0 * (k % 5) as f64 + 3.0 * (k / 5) as f64).collect();
        let v = cubic_interpolate(&data, 5, 5, 1.25, 2.5);
        assert!((v - (2.5 + 7.5)).abs() < 1e-9, "got {}", v);
    }

    #[test]
    fn test_cubic_nan_falls_back_to_bilinear() {
        let mut data = vec![1.0; 16];
        data[0] = f64::NAN;
        let v = cubic_interpolate(&data, 4, 4, 2.5, 2.5);
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_time() {
        assert_eq!(interpolate_time(0, 10.0, 100, 20.0, 0), 10.0);
        assert_eq!(interpolate_time(0, 10.0, 100, 20.0, 100), 20.0);
        assert!((interpolate_time(0, 10.0, 100, 20.0, 25) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_time_degenerate() {
        assert_eq!(interpolate_time(50, 7.0, 50, 9.0, 50), 7.0);
    }
}
