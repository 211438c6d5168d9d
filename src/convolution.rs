//! 2D convolution with a circular Gaussian kernel
//!
//! The convolved image has the same size as the input image, pixels beyond the
//! image edges count as zeros. NaN pixels are ignored: they contribute to
//! neither the weighted sum nor the kernel normalization, so they are filled
//! with the kernel-weighted mean of their valid neighbors.

use nalgebra::DMatrix;

/// Normalized circular Gaussian kernel of standard deviation `sigma` in pixels
///
/// The kernel is sampled at pixel centers on a square of side `ceil(8 sigma)`
/// rounded up to the next odd integer.
pub fn gaussian_kernel(sigma: f64) -> DMatrix<f64> {
    let size = (8. * sigma).ceil().max(1.) as usize;
    let size = if size % 2 == 0 { size + 1 } else { size };
    let center = (size / 2) as f64;
    let kernel = DMatrix::from_fn(size, size, |i, j| {
        let (x, y) = (j as f64 - center, i as f64 - center);
        (-(x * x + y * y) / (2. * sigma * sigma)).exp()
    });
    let sum = kernel.sum();
    kernel / sum
}

/// Convolves `image` with `kernel`
pub fn convolve(image: &DMatrix<f64>, kernel: &DMatrix<f64>) -> DMatrix<f64> {
    let (img_rows, img_cols) = image.shape();
    let (ker_rows, ker_cols) = kernel.shape();
    let pad_rows = (ker_rows / 2) as isize;
    let pad_cols = (ker_cols / 2) as isize;

    DMatrix::from_fn(img_rows, img_cols, |i, j| {
        let mut sum = 0f64;
        let mut norm = 0f64;
        for ki in 0..ker_rows {
            for kj in 0..ker_cols {
                let k = kernel[(ker_rows - 1 - ki, ker_cols - 1 - kj)];
                let img_row = i as isize + ki as isize - pad_rows;
                let img_col = j as isize + kj as isize - pad_cols;
                if img_row >= 0
                    && img_row < img_rows as isize
                    && img_col >= 0
                    && img_col < img_cols as isize
                {
                    let value = image[(img_row as usize, img_col as usize)];
                    if value.is_nan() {
                        continue;
                    }
                    sum += value * k;
                }
                norm += k;
            }
        }
        if norm > 0. {
            sum / norm
        } else {
            f64::NAN
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // (row, column) of the largest value
    fn argmax(m: &DMatrix<f64>) -> (usize, usize) {
        let (k, _) = m
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        (k % m.nrows(), k / m.nrows())
    }

    #[test]
    fn kernel_shape_and_norm() {
        let kernel = gaussian_kernel(1.);
        assert_eq!(kernel.shape(), (9, 9));
        assert!((kernel.sum() - 1.).abs() < 1e-12);
        assert_eq!(argmax(&kernel), (4, 4));
        let kernel = gaussian_kernel(0.6);
        assert_eq!(kernel.shape(), (5, 5));
    }

    #[test]
    fn flux_preserved_away_from_edges() {
        let mut image = DMatrix::<f64>::zeros(21, 21);
        image[(10, 10)] = 1.;
        let smoothed = convolve(&image, &gaussian_kernel(1.));
        assert!((smoothed.sum() - 1.).abs() < 1e-12);
        assert_eq!(argmax(&smoothed), (10, 10));
        assert!((smoothed[(10, 9)] - smoothed[(9, 10)]).abs() < 1e-15);
    }

    #[test]
    fn nan_is_filled() {
        let mut image = DMatrix::from_element(7, 7, 2.);
        image[(3, 3)] = f64::NAN;
        let smoothed = convolve(&image, &gaussian_kernel(0.5));
        assert!((smoothed[(3, 3)] - 2.).abs() < 1e-12);
    }
}
