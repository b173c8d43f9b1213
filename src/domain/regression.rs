//! Ordinary least-squares line fitting.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope*x + intercept` through `points`.
///
/// Returns `None` for fewer than two points, zero variance in x, or any
/// non-finite result.
pub fn fit(points: &[(f64, f64)]) -> Option<Line> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let (sx, sy, sxy, sxx) = points
        .iter()
        .fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxy, sxx), &(x, y)| {
            (sx + x, sy + y, sxy + x * y, sxx + x * x)
        });

    let denom = n * sxx - sx * sx;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;

    if slope.is_finite() && intercept.is_finite() {
        Some(Line { slope, intercept })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_line() {
        let line = fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert_relative_eq!(line.slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(line.intercept, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.at(10.0), 21.0, epsilon = 1e-9);
    }

    #[test]
    fn least_squares_through_noisy_points() {
        // sx=6 sy=6 sxy=12 sxx=14 → slope 12/20, intercept (6-3.6)/4
        let line = fit(&[(0.0, 1.0), (1.0, 0.0), (2.0, 3.0), (3.0, 2.0)]).unwrap();
        assert_relative_eq!(line.slope, 0.6, epsilon = 1e-12);
        assert_relative_eq!(line.intercept, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn flat_line() {
        let line = fit(&[(3.0, 7.0), (9.0, 7.0)]).unwrap();
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.intercept, 7.0);
    }

    #[test]
    fn zero_x_variance_has_no_line() {
        assert!(fit(&[(4.0, 1.0), (4.0, 2.0), (4.0, 3.0)]).is_none());
    }

    #[test]
    fn single_point_has_no_line() {
        assert!(fit(&[(1.0, 1.0)]).is_none());
        assert!(fit(&[]).is_none());
    }

    #[test]
    fn nan_input_has_no_line() {
        assert!(fit(&[(0.0, f64::NAN), (1.0, 2.0)]).is_none());
    }
}
