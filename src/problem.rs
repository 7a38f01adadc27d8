use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::{Error, Result};
use crate::stroke::Stroke;

/// immutable target image. width and height are both non-zero.
#[derive(Clone, Debug)]
pub struct Problem {
    target: Canvas,
}

impl Problem {
    pub fn new(target: Canvas) -> Result<Self> {
        if target.width == 0 || target.height == 0 {
            return Err(Error::InvalidProblem { width: target.width, height: target.height });
        }
        Ok(Self { target })
    }

    /// decode an image file into a problem
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Canvas::load(path)?)
    }

    #[inline]
    pub fn target(&self) -> &Canvas {
        &self.target
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.target.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.target.height
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.target.width > 0 && self.target.height > 0
    }
}

/// ordered strokes (paint order, later occludes earlier) plus the cached error.
/// `error` is infinite until evaluated and must be refreshed whenever a kept
/// mutation changes `strokes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub strokes: Vec<Stroke>,
    // json has no infinity, so an unevaluated error is written as null
    #[serde(default = "unevaluated", deserialize_with = "nullable_error")]
    pub error: f64,
}

fn unevaluated() -> f64 {
    f64::INFINITY
}

fn nullable_error<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(unevaluated))
}

impl Default for Solution {
    fn default() -> Self {
        Self { strokes: Vec::new(), error: unevaluated() }
    }
}

impl Solution {
    #[inline]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.error.is_finite()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_rejects_zero_area() {
        assert!(matches!(
            Problem::new(Canvas::new(0, 4)),
            Err(Error::InvalidProblem { width: 0, height: 4 })
        ));
        assert!(Problem::new(Canvas::new(5, 0)).is_err());
        let p = Problem::new(Canvas::new(5, 4)).unwrap();
        assert!(p.is_valid());
        assert_eq!((p.width(), p.height()), (5, 4));
    }

    #[test]
    fn test_solution_defaults_to_unevaluated() {
        let s = Solution::default();
        assert!(s.is_empty());
        assert!(!s.is_evaluated());
        assert_eq!(s.error, f64::INFINITY);
    }

    #[test]
    fn test_solution_json_file() {
        let sol = Solution {
            strokes: vec![Stroke { brush: 2, color: [1, 2, 3], ..Stroke::default() }],
            error: 42.5,
        };
        let path = std::env::temp_dir().join(format!("brushtrace-solution-{}.json", std::process::id()));
        sol.save_json(&path).unwrap();
        let back = Solution::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, sol);
    }

    #[test]
    fn test_missing_error_field_is_unevaluated() {
        let s: Solution = serde_json::from_str(r#"{"strokes": []}"#).unwrap();
        assert!(!s.is_evaluated());
    }

    #[test]
    fn test_unevaluated_error_survives_json() {
        let json = Solution::default().to_json().unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert!(!back.is_evaluated());
    }
}
