// fits a random curve sampled over a fixed range and prints how close the fit is
// usage: quadfit [points]

use std::process::ExitCode;

use lazy_static::lazy_static;
use quadfit::{linspace, FitError, QuadraticCurve, ScaleSpec};

const DEFAULT_POINTS:usize = 3;
const PREVIEW_POINTS:usize = 500;

lazy_static! {
    static ref demo_scale:ScaleSpec = ScaleSpec::PerCoefficient(1.0,50.0,200.0);
    static ref x_range:(f64,f64) = (-100.0,100.0);
}

fn run(points:usize) -> Result<(),FitError> {
    let (start,end) = *x_range;
    let curve = QuadraticCurve::random(*demo_scale);
    let x = linspace(start, end, points);
    let y = curve.y(&x);

    let fit_curve = QuadraticCurve::lsm(&x, &y)?;
    let fit_y = fit_curve.y(&linspace(start, end, PREVIEW_POINTS));
    let (min_y,max_y) = fit_y.iter().fold((f64::INFINITY,f64::NEG_INFINITY),|(lo,hi),y| (lo.min(*y),hi.max(*y)));

    println!("reference: {curve}");
    println!("fitted:    {fit_curve}");
    println!("R2: {}",fit_curve.r2(&x, &y)?);
    println!("fitted y over [{start}, {end}] spans [{min_y:.3}, {max_y:.3}]");
    Ok(())
}

fn main() -> ExitCode {
    let points = match std::env::args().nth(1).map(|arg| arg.parse::<usize>()) {
        None => DEFAULT_POINTS,
        Some(Ok(points)) => points,
        Some(Err(e)) => {
            eprintln!("invalid point count: {e}");
            return ExitCode::from(2)
        }
    };
    match run(points) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
