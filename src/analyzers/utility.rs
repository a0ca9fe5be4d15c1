/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// An ordinary least-squares line over `(year, score)` points.
///
/// Years are shifted by `origin` (the first year in the fit) so the
/// regression works on small offsets instead of four-digit years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub origin: i32,
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

impl LinearFit {
    /// Fits `y = slope * (year - origin) + intercept`.
    ///
    /// Returns `None` when `points` is empty. A single point, or points that
    /// all share one year, yield a flat line through the mean score.
    pub fn fit(points: &[(i32, f64)]) -> Option<Self> {
        let origin = points.iter().map(|(year, _)| *year).min()?;
        let n = points.len() as f64;

        let x_mean = points
            .iter()
            .map(|(year, _)| offset(*year, origin))
            .sum::<f64>()
            / n;
        let y_mean = points.iter().map(|(_, score)| *score).sum::<f64>() / n;

        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (year, score) in points {
            let dx = offset(*year, origin) - x_mean;
            covariance += dx * (score - y_mean);
            variance += dx * dx;
        }

        let slope = if variance == 0.0 {
            0.0
        } else {
            covariance / variance
        };

        Some(Self {
            origin,
            slope,
            intercept: y_mean - slope * x_mean,
            points: points.len(),
        })
    }

    /// Evaluates the line at `year`.
    pub fn predict(&self, year: i32) -> f64 {
        self.slope * offset(year, self.origin) + self.intercept
    }
}

/// Distance between two years, computed in floating point so extreme years
/// cannot overflow.
fn offset(year: i32, origin: i32) -> f64 {
    f64::from(year) - f64::from(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[32.0, 64.0]), Some(48.0));
    }

    #[test]
    fn test_fit_three_points() {
        let fit = LinearFit::fit(&[(2021, 70.0), (2022, 74.0), (2023, 78.0)]).unwrap();

        assert_eq!(fit.origin, 2021);
        assert_eq!(fit.slope, 4.0);
        assert_eq!(fit.intercept, 70.0);
        assert_eq!(fit.predict(2025), 86.0);
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = LinearFit::fit(&[(2023, 78.0), (2021, 70.0), (2022, 74.0)]).unwrap();
        let b = LinearFit::fit(&[(2021, 70.0), (2022, 74.0), (2023, 78.0)]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_single_point_is_flat() {
        let fit = LinearFit::fit(&[(2021, 32.0)]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.predict(2030), 32.0);
    }

    #[test]
    fn test_fit_with_gap_year() {
        // 2022 missing: slope still follows the real year spacing
        let fit = LinearFit::fit(&[(2021, 60.0), (2023, 70.0)]).unwrap();
        assert_eq!(fit.slope, 5.0);
        assert_eq!(fit.predict(2024), 75.0);
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let fit = LinearFit::fit(&[(i32::MIN, 10.0), (i32::MAX, 20.0)]).unwrap();
        assert!(fit.slope > 0.0);
        assert!(fit.predict(i32::MAX).is_finite());

        let fit = LinearFit::fit(&[(2021, 60.0), (2022, 65.0)]).unwrap();
        assert!(fit.predict(i32::MIN).is_finite());
        assert!(fit.predict(i32::MAX).is_finite());
    }

    #[test]
    fn test_fit_empty() {
        assert!(LinearFit::fit(&[]).is_none());
    }
}
