//! Quadratic curves `y = a·x² + b·x + c` fitted by least squares.
//!
//! Fitting builds the 3*3 normal equations from power sums of the samples
//! and solves them by inverting the matrix:
//!
//! ```text
//! | Σx⁴ Σx³ Σx² |   | a |   | Σx²y |
//! | Σx³ Σx² Σx  | * | b | = | Σxy  |
//! | Σx² Σx  n   |   | c |   | Σy   |
//! ```

use std::fmt::Display;

use lazy_static::lazy_static;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::linear_algebra::matrix::{Matrix3, MatrixError, SINGULAR_EPS};
use crate::scientific_computing::statistics::{self, PowerSums};

// a quadratic has three unknowns
pub const MIN_FIT_SAMPLES:usize = 3;
pub const MIN_R2_SAMPLES:usize = 2;

/// Scale of the coefficients of a randomly generated curve.
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum ScaleSpec {
    /// Same scale for a, b and c.
    Uniform(f64),
    /// Separate scales for a, b and c.
    PerCoefficient(f64,f64,f64)
}

impl ScaleSpec {
    pub fn factors(&self) -> [f64;3] {
        match *self {
            ScaleSpec::Uniform(s) => [s;3],
            ScaleSpec::PerCoefficient(sa, sb, sc) => [sa,sb,sc]
        }
    }
}

impl From<f64> for ScaleSpec {
    fn from(scale:f64) -> Self {
        ScaleSpec::Uniform(scale)
    }
}

impl From<(f64,f64,f64)> for ScaleSpec {
    fn from((sa,sb,sc):(f64,f64,f64)) -> Self {
        ScaleSpec::PerCoefficient(sa, sb, sc)
    }
}

impl From<[f64;3]> for ScaleSpec {
    fn from([sa,sb,sc]:[f64;3]) -> Self {
        ScaleSpec::PerCoefficient(sa, sb, sc)
    }
}

lazy_static! {
    pub static ref DEFAULT_SCALE:ScaleSpec = ScaleSpec::Uniform(100.0);
}

impl Default for ScaleSpec {
    fn default() -> Self {
        *DEFAULT_SCALE
    }
}

#[derive(Error,Debug,Clone,PartialEq)]
pub enum FitError {
    #[error("x has {x_len} samples but y has {y_len}")]
    LengthMismatch{x_len:usize,y_len:usize},
    #[error("at least {required} samples are required, got {actual}")]
    InsufficientSamples{required:usize,actual:usize},
    #[error("sample at {index} is not a finite number")]
    NonFiniteInput{index:usize},
    #[error("normal equations are singular (determinant {determinant}), x values may not be distinct enough")]
    SingularSystem{determinant:f64},
    #[error("observed y values have no variance, R² is undefined")]
    DegenerateData,
    #[error("sums of squares overflow f64, R² cannot be computed")]
    Overflow
}

impl FitError {
    // mismatched, short or non-finite input
    pub fn is_input_shape(&self) -> bool {
        matches!(self,
            FitError::LengthMismatch{..} | FitError::InsufficientSamples{..} | FitError::NonFiniteInput{..})
    }
}

impl From<MatrixError> for FitError {
    fn from(e:MatrixError) -> Self {
        match e {
            MatrixError::SingularError { determinant } => FitError::SingularSystem { determinant }
        }
    }
}

type Result<T> = std::result::Result<T,FitError>;

fn check_samples(xs:&[f64],ys:&[f64],required:usize) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(FitError::LengthMismatch { x_len: xs.len(), y_len: ys.len() })
    }
    if xs.len() < required {
        return Err(FitError::InsufficientSamples { required, actual: xs.len() })
    }
    let non_finite = xs.iter().zip(ys.iter()).position(|(x,y)| !x.is_finite() || !y.is_finite());
    if let Some(index) = non_finite {
        return Err(FitError::NonFiniteInput { index })
    }
    Ok(())
}

/// A curve described by `y = a·x² + b·x + c`.
///
/// Curves are plain values; every operation returns a new one.
#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct QuadraticCurve {
    pub a:f64,
    pub b:f64,
    pub c:f64
}

impl Display for QuadraticCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f,"y = {}·x² + {}·x + {}",self.a,self.b,self.c)
    }
}

impl From<[f64;3]> for QuadraticCurve {
    fn from([a,b,c]:[f64;3]) -> Self {
        Self {a,b,c}
    }
}

impl QuadraticCurve {
    pub fn new(a:f64,b:f64,c:f64) -> Self {
        Self {a,b,c}
    }

    pub fn coefficients(&self) -> [f64;3] {
        [self.a,self.b,self.c]
    }

    /// Fit a curve to the points `(xs[i], ys[i])` with the least squares method.
    ///
    /// Needs at least three samples of matching length and at least three
    /// distinct x values, otherwise the normal equations cannot be inverted.
    ///
    /// The normal matrix loses conditioning quickly when the x values sit far
    /// from zero relative to their spread (e.g. `[100, 101, 102]`), and such
    /// systems are reported as [`FitError::SingularSystem`] even though they
    /// are invertible. Center the x values first, or loosen the check with
    /// [`QuadraticCurve::lsm_with_tolerance`].
    pub fn lsm(xs:&[f64],ys:&[f64]) -> Result<Self> {
        Self::lsm_with_tolerance(xs, ys, SINGULAR_EPS)
    }

    /// [`QuadraticCurve::lsm`] with a custom singularity tolerance, relative to
    /// the product of the row norms of the normal matrix.
    pub fn lsm_with_tolerance(xs:&[f64],ys:&[f64],eps:f64) -> Result<Self> {
        check_samples(xs, ys, MIN_FIT_SAMPLES)?;

        let PowerSums { sums_x, sums_yx } = PowerSums::accumulate(xs, ys);
        let matrix = Matrix3::new([
            [sums_x[4], sums_x[3], sums_x[2]],
            [sums_x[3], sums_x[2], sums_x[1]],
            [sums_x[2], sums_x[1], sums_x[0]],
        ]);
        let vector = [sums_yx[2],sums_yx[1],sums_yx[0]];

        let inverse = match matrix.inverse_with_tolerance(eps) {
            Ok(inverse) => inverse,
            Err(e) => {
                debug!(samples = xs.len(), error = %e, "least squares fit failed");
                return Err(e.into())
            }
        };
        let curve = Self::from(inverse.mul_vector(&vector));
        debug!(samples = xs.len(), determinant = matrix.determinant(), %curve, "fitted quadratic");
        Ok(curve)
    }

    /// Random curve with [`DEFAULT_SCALE`].
    pub fn random_default() -> Self {
        Self::random(ScaleSpec::default())
    }

    /// Random curve, each coefficient uniform in `[-scale/2, scale/2)`.
    pub fn random<S:Into<ScaleSpec>>(scale:S) -> Self {
        Self::random_with(scale, &mut rand::rng())
    }

    pub fn random_with<S:Into<ScaleSpec>,R:Rng>(scale:S,rng:&mut R) -> Self {
        let scale:ScaleSpec = scale.into();
        let [a,b,c] = scale.factors().map(|s| (rng.random::<f64>() - 0.5)*s);
        Self {a,b,c}
    }

    pub fn y_at(&self,x:f64) -> f64 {
        self.a*x*x + self.b*x + self.c
    }

    /// Evaluate the curve at every x.
    pub fn y(&self,xs:&[f64]) -> Vec<f64> {
        xs.iter().map(|x| self.y_at(*x)).collect()
    }

    /// Coefficient of determination `1 - SSE/SST` against observed samples.
    pub fn r2(&self,xs:&[f64],ys:&[f64]) -> Result<f64> {
        check_samples(xs, ys, MIN_R2_SAMPLES)?;
        if statistics::is_constant(ys) {
            debug!(samples = ys.len(), "observed y values are constant");
            return Err(FitError::DegenerateData)
        }
        let predicted = self.y(xs);
        let r2 = statistics::r_squared(ys, &predicted);
        trace!(sse = statistics::sse(ys, &predicted), sst = statistics::sst(ys), ?r2, "r squared");
        r2.ok_or(FitError::Overflow)
    }

    /// Residual standard error `sqrt(SSE/(n-3))`, needs more than three samples.
    pub fn rmse(&self,xs:&[f64],ys:&[f64]) -> Result<f64> {
        check_samples(xs, ys, MIN_FIT_SAMPLES + 1)?;
        let predicted = self.y(xs);
        statistics::rmse(ys, &predicted, MIN_FIT_SAMPLES)
            .ok_or(FitError::InsufficientSamples { required: MIN_FIT_SAMPLES + 1, actual: xs.len() })
    }
}

pub fn fit(xs:&[f64],ys:&[f64]) -> Result<QuadraticCurve> {
    QuadraticCurve::lsm(xs, ys)
}

pub fn evaluate(curve:&QuadraticCurve,xs:&[f64]) -> Vec<f64> {
    curve.y(xs)
}

pub fn r_squared(curve:&QuadraticCurve,xs:&[f64],ys:&[f64]) -> Result<f64> {
    curve.r2(xs, ys)
}

pub fn random_curve<S:Into<ScaleSpec>>(scale:S) -> QuadraticCurve {
    QuadraticCurve::random(scale)
}

// `num` evenly spaced values over [start, end], both ends included
pub fn linspace(start:f64,end:f64,num:usize) -> Vec<f64> {
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start)/(num - 1) as f64;
            let mut v:Vec<f64> = (0..num).map(|i| start + step*i as f64).collect();
            v[num - 1] = end;
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::{linspace, FitError, QuadraticCurve, ScaleSpec, DEFAULT_SCALE};

    #[test]
    fn test_fit_parabola() {
        let xs = [-1.0,0.0,1.0];
        let ys = [1.0,0.0,1.0];
        let curve = QuadraticCurve::lsm(&xs, &ys).unwrap();
        assert_abs_diff_eq!(curve.a,1.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.b,0.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.c,0.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.y(&[2.0])[0],4.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.r2(&xs, &ys).unwrap(),1.0,epsilon = 1e-9);
    }
    #[test]
    fn test_fit_recovers_random_curves() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let reference = QuadraticCurve::random_with(*DEFAULT_SCALE, &mut rng);
            let len = rng.random_range(3..200);
            let offset = rng.random_range(-5.0..5.0);
            let xs:Vec<f64> = linspace(-10.0, 10.0, len).into_iter().map(|x| x + offset).collect();
            let ys = reference.y(&xs);
            let fitted = QuadraticCurve::lsm(&xs, &ys).unwrap();
            for (got,want) in fitted.coefficients().iter().zip(reference.coefficients()) {
                assert_abs_diff_eq!(*got,want,epsilon = 1e-6*want.abs().max(1.0));
            }
            assert_abs_diff_eq!(fitted.r2(&xs, &ys).unwrap(),1.0,epsilon = 1e-9);
        }
    }
    #[test]
    fn test_fit_noisy_r2_below_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let reference = QuadraticCurve::new(0.5,-2.0,3.0);
        let xs = linspace(-5.0, 5.0, 40);
        let ys:Vec<f64> = reference.y(&xs).into_iter()
            .map(|y| y + rng.random_range(-1.0..1.0))
            .collect();
        let fitted = QuadraticCurve::lsm(&xs, &ys).unwrap();
        let r2 = fitted.r2(&xs, &ys).unwrap();
        assert!(r2 < 1.0 && r2 > 0.9,"r2 = {r2}");
        assert!(fitted.rmse(&xs, &ys).unwrap() > 0.0);
        // the least squares curve can't do worse than the true one
        assert!(r2 >= reference.r2(&xs, &ys).unwrap());
    }
    #[test]
    fn test_fit_shape_errors() {
        assert_eq!(QuadraticCurve::lsm(&[1.0,2.0], &[1.0]),
            Err(FitError::LengthMismatch { x_len: 2, y_len: 1 }));
        let short = QuadraticCurve::lsm(&[0.0,50.0], &[15.0,13015.0]).unwrap_err();
        assert_eq!(short,FitError::InsufficientSamples { required: 3, actual: 2 });
        assert!(short.is_input_shape());
        assert_eq!(QuadraticCurve::lsm(&[0.0,1.0,f64::NAN], &[0.0,1.0,2.0]),
            Err(FitError::NonFiniteInput { index: 2 }));
    }
    #[test]
    fn test_fit_singular() {
        for x in [0.0,1.0,2.0,-7.5,1e3] {
            let err = QuadraticCurve::lsm(&[x;5], &[1.0,2.0,3.0,4.0,5.0]).unwrap_err();
            assert!(matches!(err,FitError::SingularSystem{..}),"x = {x}: {err:?}");
            assert!(!err.is_input_shape());
        }
        // only two distinct x values
        let err = QuadraticCurve::lsm(&[0.0,50.0,0.0,50.0], &[1.0,2.0,1.0,2.0]).unwrap_err();
        assert!(matches!(err,FitError::SingularSystem{..}));
    }
    #[test]
    fn test_constant_samples() {
        let xs = [0.0,1.0,2.0,3.0];
        let ys = [1.0;4];
        let curve = QuadraticCurve::lsm(&xs, &ys).unwrap();
        assert_abs_diff_eq!(curve.a,0.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.b,0.0,epsilon = 1e-9);
        assert_abs_diff_eq!(curve.c,1.0,epsilon = 1e-9);
        assert_eq!(curve.r2(&xs, &ys),Err(FitError::DegenerateData));
    }
    #[test]
    fn test_constant_inexact_samples() {
        for v in [0.1,0.3,0.7,1.1,3.3,1e-3,123.456] {
            for n in 2..12 {
                let xs:Vec<f64> = (0..n).map(|i| i as f64).collect();
                let ys = vec![v;n];
                let flat = QuadraticCurve::new(0.0,0.0,v);
                assert_eq!(flat.r2(&xs, &ys),Err(FitError::DegenerateData),"v = {v}, n = {n}");
            }
        }
        let xs = [0.0,1.0,2.0,3.0,4.0,5.0,6.0];
        let ys = [1.1;7];
        let refit = QuadraticCurve::lsm(&xs, &ys).unwrap();
        assert_eq!(refit.r2(&xs, &ys),Err(FitError::DegenerateData));
    }
    #[test]
    fn test_r2_overflow() {
        let curve = QuadraticCurve::new(0.0,0.0,0.0);
        let err = curve.r2(&[0.0,1.0], &[1e200,-1e200]).unwrap_err();
        assert_eq!(err,FitError::Overflow);
        assert!(!err.to_string().contains("no variance"));
    }
    #[test]
    fn test_offset_x_needs_looser_tolerance() {
        let reference = QuadraticCurve::new(0.5,-2.0,3.0);
        let xs = [100.0,101.0,102.0];
        let ys = reference.y(&xs);
        assert!(matches!(QuadraticCurve::lsm(&xs, &ys),Err(FitError::SingularSystem{..})));
        let fitted = QuadraticCurve::lsm_with_tolerance(&xs, &ys, 0.0).unwrap();
        for (got,want) in fitted.coefficients().iter().zip(reference.coefficients()) {
            assert_abs_diff_eq!(*got,want,epsilon = 1e-6);
        }
        // centered x values fit with the default tolerance
        let centered:Vec<f64> = xs.iter().map(|x| x - 101.0).collect();
        let shifted = QuadraticCurve::lsm(&centered, &ys).unwrap();
        assert_abs_diff_eq!(shifted.y_at(1.0),reference.y_at(102.0),epsilon = 1e-9);
    }
    #[test]
    fn test_r2_shape() {
        let curve = QuadraticCurve::new(1.0,0.0,0.0);
        assert_eq!(curve.r2(&[1.0], &[1.0]),Err(FitError::InsufficientSamples { required: 2, actual: 1 }));
        assert_eq!(curve.r2(&[1.0,2.0], &[1.0]),Err(FitError::LengthMismatch { x_len: 2, y_len: 1 }));
        assert!(curve.r2(&[1.0,2.0], &[1.0,4.0]).is_ok());
        // worse than the mean
        let r2 = QuadraticCurve::new(0.0,0.0,100.0).r2(&[1.0,2.0], &[1.0,4.0]).unwrap();
        assert!(r2 < 0.0);
    }
    #[test]
    fn test_evaluate() {
        let curve = QuadraticCurve::new(5.0,10.0,15.0);
        let xs = [-2.0,0.0,0.5,50.0];
        let ys = curve.y(&xs);
        assert_eq!(ys.len(),xs.len());
        for (x,y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(*y,5.0*x*x + 10.0*x + 15.0);
        }
        assert!(curve.y(&[]).is_empty());
        assert_eq!(curve.y_at(0.0),15.0);
    }
    #[test]
    fn test_random_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let scale = ScaleSpec::PerCoefficient(1.0,50.0,200.0);
        for _ in 0..1000 {
            let curve = QuadraticCurve::random_with(scale, &mut rng);
            for (coefficient,s) in curve.coefficients().iter().zip(scale.factors()) {
                assert!(coefficient.abs() <= s/2.0);
            }
        }
        assert_eq!(ScaleSpec::default(),ScaleSpec::Uniform(100.0));
        for _ in 0..100 {
            let curve = QuadraticCurve::random_default();
            assert!(curve.coefficients().iter().all(|c| c.abs() <= 50.0));
        }
        let flat = QuadraticCurve::random(0.0);
        assert_eq!(flat.coefficients().map(f64::abs),[0.0;3]);
        assert_eq!(ScaleSpec::from((1.0,2.0,3.0)),ScaleSpec::from([1.0,2.0,3.0]));
        assert_eq!(ScaleSpec::from(4.0).factors(),[4.0;3]);
    }
    #[test]
    fn test_linspace() {
        assert_eq!(linspace(-100.0, 100.0, 3),vec![-100.0,0.0,100.0]);
        assert_eq!(linspace(1.0, 2.0, 1),vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
        let v = linspace(0.0, 1.0, 500);
        assert_eq!(v.len(),500);
        assert_eq!(*v.last().unwrap(),1.0);
    }
    #[test]
    fn test_display() {
        assert_eq!(QuadraticCurve::new(1.0,-2.0,0.5).to_string(),"y = 1·x² + -2·x + 0.5");
    }
}
