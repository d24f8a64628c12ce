//! Output comparison
//!
//! Decides whether a program's output matches the expected text. Pure: no
//! I/O, deterministic for its inputs.

/// Comparison mode for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareMode {
    /// Byte equality after newline normalization and trailing-whitespace trim
    Exact,
    /// Line-wise floating point comparison within `10^(-places)`
    Tolerant { places: f64 },
}

impl CompareMode {
    /// Tolerant comparison is strictly opt-in; no precision means exact
    pub fn from_precision(places: Option<f64>) -> Self {
        match places {
            Some(p) => CompareMode::Tolerant { places: p },
            None => CompareMode::Exact,
        }
    }
}

/// Compare expected and actual program output under the given mode
pub fn outputs_match(expected: &str, actual: &str, mode: CompareMode) -> bool {
    match mode {
        CompareMode::Exact => exact_match(expected, actual),
        CompareMode::Tolerant { places } => {
            // Identical text always passes, numeric or not
            exact_match(expected, actual) || floats_match(expected, actual, places)
        }
    }
}

fn exact_match(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}

/// Line-wise comparison of single floating point values.
///
/// Line counts must agree, and every line pair must parse as numbers whose
/// absolute difference is within `10^(-places)`. A parse failure on either
/// side fails the whole comparison.
fn floats_match(expected: &str, actual: &str, places: f64) -> bool {
    let expected_lines: Vec<&str> = expected.trim().lines().collect();
    let actual_lines: Vec<&str> = actual.trim().lines().collect();
    if expected_lines.len() != actual_lines.len() {
        return false;
    }
    let bound = 10f64.powf(-places);
    expected_lines
        .iter()
        .zip(&actual_lines)
        .all(|(e, a)| match (e.trim().parse::<f64>(), a.trim().parse::<f64>()) {
            (Ok(e), Ok(a)) => (e - a).abs() <= bound,
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(outputs_match("hello\nworld\n", "hello\nworld\n", CompareMode::Exact));
    }

    #[test]
    fn test_exact_trailing_whitespace_ignored() {
        assert!(outputs_match("hello\nworld", "hello\nworld\n\n", CompareMode::Exact));
    }

    #[test]
    fn test_exact_crlf_normalized() {
        assert!(outputs_match("a\r\nb\r\n", "a\nb\n", CompareMode::Exact));
    }

    #[test]
    fn test_exact_different() {
        assert!(!outputs_match("hello\nworld\n", "hello\nearth\n", CompareMode::Exact));
    }

    #[test]
    fn test_exact_interior_whitespace_significant() {
        assert!(!outputs_match("a b\n", "a  b\n", CompareMode::Exact));
    }

    #[test]
    fn test_tolerant_within_bound() {
        let mode = CompareMode::Tolerant { places: 3.0 };
        assert!(outputs_match("1.5555\n2.1111\n", "1.5556\n2.1115\n", mode));
    }

    #[test]
    fn test_tolerant_tighter_precision_fails() {
        let mode = CompareMode::Tolerant { places: 4.0 };
        assert!(!outputs_match("1.5555\n2.1111\n", "1.5556\n2.1115\n", mode));
    }

    #[test]
    fn test_tolerant_is_reflexive() {
        for places in [0.0, 3.0, 9.0] {
            assert!(outputs_match("1.25\n", "1.25\n", CompareMode::Tolerant { places }));
        }
    }

    #[test]
    fn test_tolerant_line_count_mismatch() {
        let mode = CompareMode::Tolerant { places: 3.0 };
        assert!(!outputs_match("1.0\n2.0\n", "1.0\n", mode));
    }

    #[test]
    fn test_tolerant_non_numeric_line_fails() {
        let mode = CompareMode::Tolerant { places: 3.0 };
        assert!(!outputs_match("1.0\n", "one\n", mode));
    }

    #[test]
    fn test_tolerant_identical_non_numeric_passes_via_exact() {
        let mode = CompareMode::Tolerant { places: 3.0 };
        assert!(outputs_match("possible\n", "possible\n", mode));
    }

    #[test]
    fn test_from_precision_defaults_to_exact() {
        assert_eq!(CompareMode::from_precision(None), CompareMode::Exact);
    }
}
