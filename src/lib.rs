//! Least squares fitting of quadratic curves.
//!
//! ```
//! use quadfit::QuadraticCurve;
//!
//! let curve = QuadraticCurve::lsm(&[-1.0, 0.0, 1.0], &[1.0, 0.0, 1.0]).unwrap();
//! assert!((curve.y_at(2.0) - 4.0).abs() < 1e-9);
//! ```

pub mod linear_algebra;
pub mod scientific_computing;

pub use linear_algebra::matrix::{Matrix3, MatrixError};
pub use scientific_computing::quadratic::{
    evaluate, fit, linspace, r_squared, random_curve, FitError, QuadraticCurve, ScaleSpec,
};
