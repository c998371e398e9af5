pub mod interpolation;

pub use interpolation::{
    InterpolatedValue, InterpolationError, LinearInterpolator, interpolate_linear,
};

use faer::Mat;

pub type DenseMatrix = Mat<f64>;
