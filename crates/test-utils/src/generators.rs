//! Test data generators for creating verifiable dataset values.
//!
//! Values encode their own position so that a read can be checked against
//! the index it came from.

/// Creates a `(time, row, col)` cube with predictable values.
///
/// Each cell value is calculated as: `time * 1_000_000 + row * 1000 + col`
///
/// # Returns
///
/// A `Vec<f64>` in row-major order (time slowest, column fastest).
///
/// # Example
///
/// ```
/// use test_utils::create_test_cube;
///
/// let cube = create_test_cube(2, 3, 4);
/// assert_eq!(cube.len(), 24);
/// assert_eq!(cube[0], 0.0);
/// assert_eq!(cube[5], 1001.0);        // time=0, row=1, col=1
/// assert_eq!(cube[12], 1_000_000.0);  // time=1, row=0, col=0
/// ```
pub fn create_test_cube(times: usize, rows: usize, cols: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(times * rows * cols);
    for t in 0..times {
        for row in 0..rows {
            for col in 0..cols {
                data.push(cube_value(t, row, col));
            }
        }
    }
    data
}

/// Value stored at `(time, row, col)` by [`create_test_cube`].
pub fn cube_value(time: usize, row: usize, col: usize) -> f64 {
    (time * 1_000_000 + row * 1000 + col) as f64
}

/// Creates a 2-D grid where every `nth` cell is NaN (missing data).
pub fn create_grid_with_missing(rows: usize, cols: usize, nth: usize) -> Vec<f64> {
    (0..rows * cols)
        .map(|i| {
            if nth > 0 && i % nth == 0 {
                f64::NAN
            } else {
                i as f64
            }
        })
        .collect()
}
