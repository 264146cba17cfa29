// sums_x[i] = Σx^i, sums_yx[i] = Σ(x^i * y), for i in 0..=4
#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct PowerSums {
    pub sums_x:[f64;5],
    pub sums_yx:[f64;5]
}

impl PowerSums {
    pub fn accumulate(xs:&[f64],ys:&[f64]) -> Self {
        debug_assert_eq!(xs.len(),ys.len());
        let mut sums = Self::default();
        for (&xi,&yi) in xs.iter().zip(ys.iter()) {
            let mut x_power = 1.0;
            for power in 0..5 {
                sums.sums_x[power] += x_power;
                sums.sums_yx[power] += x_power*yi;
                x_power *= xi;
            }
        }
        sums
    }
}

pub fn mean(values:&[f64]) -> Option<f64> {
    if values.is_empty() {return None}
    Some(values.iter().sum::<f64>()/values.len() as f64)
}

// Σ(y - ŷ)²
pub fn sse(observed:&[f64],predicted:&[f64]) -> f64 {
    debug_assert_eq!(observed.len(),predicted.len());
    observed.iter().zip(predicted.iter()).map(|(y,y_hat)| (y - y_hat).powi(2)).sum()
}

// Σ(y - mean(y))²
pub fn sst(observed:&[f64]) -> f64 {
    let Some(y_mean) = mean(observed) else {return 0.0};
    observed.iter().map(|y| (y - y_mean).powi(2)).sum()
}

// compared exactly, a rounded mean leaves sst a few ulps above zero for values like 0.1
pub fn is_constant(values:&[f64]) -> bool {
    values.first().is_none_or(|first| values.iter().all(|v| v == first))
}

// None when the observed values are constant or the sums overflow
pub fn r_squared(observed:&[f64],predicted:&[f64]) -> Option<f64> {
    if is_constant(observed) {
        return None
    }
    let rss = sse(observed, predicted);
    let tss = sst(observed);
    if !rss.is_finite() || !tss.is_finite() || tss == 0.0 {
        return None
    }
    Some(1.0 - rss/tss)
}

// residual standard error of a model with `params` fitted parameters
pub fn rmse(observed:&[f64],predicted:&[f64],params:usize) -> Option<f64> {
    let n = observed.len();
    if n <= params {return None}
    Some((sse(observed, predicted)/(n - params) as f64).sqrt())
}
