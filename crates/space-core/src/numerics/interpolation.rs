#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("interpolation requires at least 1 grid point")]
    EmptyGrid,
    #[error("interpolation input length mismatch: grid={grid}, values={values}")]
    LengthMismatch { grid: usize, values: usize },
    #[error("grid entry must be finite at index {index}, got {value}")]
    NonFiniteGrid { index: usize, value: f64 },
    #[error("grid must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingGrid {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("value must be finite at index {index}, got {value}")]
    NonFiniteValue { index: usize, value: f64 },
    #[error("interpolation query must be finite, got {value}")]
    NonFiniteQuery { value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedValue {
    pub value: f64,
    /// True when the query fell outside the grid and the edge value was used.
    pub clamped: bool,
}

/// Piecewise-linear interpolation over a validated, strictly increasing grid.
///
/// Queries outside the grid clamp to the first/last value.
#[derive(Debug, Clone, Copy)]
pub struct LinearInterpolator<'a> {
    grid: &'a [f64],
    values: &'a [f64],
}

impl<'a> LinearInterpolator<'a> {
    pub fn new(grid: &'a [f64], values: &'a [f64]) -> Result<Self, InterpolationError> {
        validate_grid_and_values(grid, values)?;
        Ok(Self { grid, values })
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn evaluate(&self, query: f64) -> Result<InterpolatedValue, InterpolationError> {
        if !query.is_finite() {
            return Err(InterpolationError::NonFiniteQuery { value: query });
        }

        let last = self.grid.len() - 1;
        if query < self.grid[0] {
            return Ok(clamped(self.values[0]));
        }
        if query > self.grid[last] {
            return Ok(clamped(self.values[last]));
        }

        match self.grid.binary_search_by(|point| point.total_cmp(&query)) {
            Ok(index) => Ok(exact(self.values[index])),
            Err(upper) => {
                let lower = upper - 1;
                let x0 = self.grid[lower];
                let x1 = self.grid[upper];
                let y0 = self.values[lower];
                let y1 = self.values[upper];
                let fraction = (query - x0) / (x1 - x0);
                Ok(exact(y0 + (y1 - y0) * fraction))
            }
        }
    }
}

pub fn interpolate_linear(
    query: f64,
    grid: &[f64],
    values: &[f64],
) -> Result<InterpolatedValue, InterpolationError> {
    LinearInterpolator::new(grid, values)?.evaluate(query)
}

const fn exact(value: f64) -> InterpolatedValue {
    InterpolatedValue {
        value,
        clamped: false,
    }
}

const fn clamped(value: f64) -> InterpolatedValue {
    InterpolatedValue {
        value,
        clamped: true,
    }
}

fn validate_grid_and_values(grid: &[f64], values: &[f64]) -> Result<(), InterpolationError> {
    if grid.is_empty() {
        return Err(InterpolationError::EmptyGrid);
    }
    if grid.len() != values.len() {
        return Err(InterpolationError::LengthMismatch {
            grid: grid.len(),
            values: values.len(),
        });
    }

    for (index, value) in grid.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(InterpolationError::NonFiniteGrid { index, value });
        }

        if index > 0 {
            let previous = grid[index - 1];
            if value <= previous {
                return Err(InterpolationError::NonIncreasingGrid {
                    index,
                    previous,
                    current: value,
                });
            }
        }
    }

    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(InterpolationError::NonFiniteValue { index, value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{InterpolationError, LinearInterpolator, interpolate_linear};

    #[test]
    fn interpolation_hits_grid_points_exactly_and_blends_between() {
        let grid = [1.0, 2.0, 4.0];
        let values = [10.0, 20.0, 0.0];
        let interpolator = LinearInterpolator::new(&grid, &values).expect("valid grid");

        let on_grid = interpolator.evaluate(2.0).expect("grid point");
        assert_eq!(on_grid.value, 20.0);
        assert!(!on_grid.clamped);

        let between = interpolator.evaluate(3.0).expect("interior");
        assert!((between.value - 10.0).abs() <= 1.0e-12);
        assert!(!between.clamped);

        let quarter = interpolator.evaluate(1.25).expect("interior");
        assert!((quarter.value - 12.5).abs() <= 1.0e-12);
    }

    #[test]
    fn interpolation_clamps_outside_the_grid() {
        let grid = [1.0, 2.0];
        let values = [3.0, 5.0];

        let below = interpolate_linear(0.5, &grid, &values).expect("lower clamp");
        let above = interpolate_linear(2.5, &grid, &values).expect("upper clamp");
        assert_eq!(below.value, 3.0);
        assert!(below.clamped);
        assert_eq!(above.value, 5.0);
        assert!(above.clamped);

        let single = interpolate_linear(7.0, &[4.0], &[9.0]).expect("single point");
        assert_eq!(single.value, 9.0);
        assert!(single.clamped);
    }

    #[test]
    fn interpolation_rejects_invalid_inputs() {
        assert_eq!(
            LinearInterpolator::new(&[], &[]).expect_err("empty grid"),
            InterpolationError::EmptyGrid
        );
        assert_eq!(
            LinearInterpolator::new(&[0.0, 1.0, 0.5], &[1.0, 2.0, 3.0])
                .expect_err("non-increasing grid"),
            InterpolationError::NonIncreasingGrid {
                index: 2,
                previous: 1.0,
                current: 0.5,
            }
        );
        assert_eq!(
            LinearInterpolator::new(&[0.0, 1.0], &[1.0]).expect_err("length mismatch"),
            InterpolationError::LengthMismatch { grid: 2, values: 1 }
        );

        match interpolate_linear(f64::NAN, &[0.0, 1.0], &[0.0, 1.0])
            .expect_err("NaN query should fail")
        {
            InterpolationError::NonFiniteQuery { value } => assert!(value.is_nan()),
            other => panic!("expected NonFiniteQuery, got {other:?}"),
        }
    }
}
