use serde::{Deserialize, Serialize};

/// Absolute/relative tolerance pair shared by one column group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Tolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
}

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance {
        abs_tol: 0.0,
        rel_tol: 0.0,
    };

    pub const fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self { abs_tol, rel_tol }
    }

    /// Largest absolute difference accepted against `expected`.
    pub fn allowance(&self, expected: f64) -> f64 {
        self.abs_tol + self.rel_tol * expected.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub abs_diff: f64,
    pub rel_diff: f64,
    pub passes: bool,
}

/// Compares `actual` against `expected`: `|actual - expected| <= abs_tol + rel_tol * |expected|`.
///
/// The bound is inclusive. Non-finite values only pass when both sides are
/// the same non-finite value (`NaN` matches `NaN`, `inf` matches `inf`).
pub fn compare_with_tolerance(
    expected: f64,
    actual: f64,
    tolerance: Tolerance,
) -> ToleranceComparison {
    if !expected.is_finite() || !actual.is_finite() {
        let passes = non_finite_values_match(expected, actual);
        return ToleranceComparison {
            abs_diff: if passes { 0.0 } else { f64::INFINITY },
            rel_diff: if passes { 0.0 } else { f64::INFINITY },
            passes,
        };
    }

    let abs_diff = (actual - expected).abs();
    let rel_diff = if expected == 0.0 {
        if abs_diff == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        abs_diff / expected.abs()
    };

    ToleranceComparison {
        abs_diff,
        rel_diff,
        passes: abs_diff <= tolerance.allowance(expected),
    }
}

pub fn within_tolerance(expected: f64, actual: f64, tolerance: Tolerance) -> bool {
    compare_with_tolerance(expected, actual, tolerance).passes
}

pub fn format_numeric(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }

    if value == f64::INFINITY {
        return "inf".to_string();
    }

    if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }

    format!("{value}")
}

fn non_finite_values_match(left: f64, right: f64) -> bool {
    if left.is_nan() || right.is_nan() {
        return left.is_nan() && right.is_nan();
    }

    if left.is_infinite() || right.is_infinite() {
        return left.is_infinite() && right.is_infinite() && left.signum() == right.signum();
    }

    true
}

#[cfg(test)]
mod tests {
    use super::{Tolerance, compare_with_tolerance, format_numeric, within_tolerance};

    #[test]
    fn boundary_difference_is_accepted() {
        // 0.5 and 0.25 are exact in binary, so the bound is hit exactly.
        let tolerance = Tolerance::new(0.25, 0.0);
        assert!(within_tolerance(1.0, 1.25, tolerance));
        assert!(within_tolerance(1.0, 0.75, tolerance));
        assert!(!within_tolerance(1.0, 1.5, tolerance));

        let relative = Tolerance::new(0.0, 0.5);
        assert!(within_tolerance(2.0, 3.0, relative));
        assert!(!within_tolerance(2.0, 3.5, relative));
    }

    #[test]
    fn relative_tolerance_uses_expected_value_as_reference() {
        let tolerance = Tolerance::new(0.0, 0.1);
        // |10 - 11| = 1 <= 0.1 * 10
        assert!(within_tolerance(10.0, 11.0, tolerance));
        // |11 - 10| = 1 > 0.1 * 9.5
        assert!(!within_tolerance(9.5, 10.6, tolerance));
    }

    #[test]
    fn exact_tolerance_requires_identical_values() {
        assert!(within_tolerance(3.5, 3.5, Tolerance::EXACT));
        assert!(!within_tolerance(3.5, 3.5000001, Tolerance::EXACT));
    }

    #[test]
    fn non_finite_values_only_match_themselves() {
        assert!(within_tolerance(f64::NAN, f64::NAN, Tolerance::EXACT));
        assert!(within_tolerance(f64::INFINITY, f64::INFINITY, Tolerance::EXACT));
        assert!(!within_tolerance(f64::INFINITY, f64::NEG_INFINITY, Tolerance::new(1.0, 1.0)));
        assert!(!within_tolerance(f64::NAN, 1.0, Tolerance::new(10.0, 10.0)));
    }

    #[test]
    fn comparison_reports_differences() {
        let comparison = compare_with_tolerance(2.0, 2.5, Tolerance::new(0.1, 0.0));
        assert!(!comparison.passes);
        assert_eq!(comparison.abs_diff, 0.5);
        assert_eq!(comparison.rel_diff, 0.25);
    }

    #[test]
    fn formats_non_finite_values() {
        assert_eq!(format_numeric(f64::NAN), "NaN");
        assert_eq!(format_numeric(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_numeric(1.5), "1.5");
    }
}
