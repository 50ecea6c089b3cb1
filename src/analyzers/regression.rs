use serde::Serialize;

/// Ordinary least-squares fit of y against x
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    /// Slope in y-units per x-unit
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

/// Fit a trend line over (x, y) pairs.
///
/// A degenerate series (fewer than two points, or zero variance in x) has
/// no defined slope and yields `None` rather than a spurious value.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    for (x, y) in points {
        covariance += (x - x_mean) * (y - y_mean);
        x_variance += (x - x_mean).powi(2);
    }

    if x_variance == 0.0 {
        return None;
    }

    let slope = covariance / x_variance;
    Some(TrendLine {
        slope,
        intercept: y_mean - slope * x_mean,
        points: points.len(),
    })
}
