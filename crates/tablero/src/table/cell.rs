//! Cell values produced by column accessors.

use std::cmp::Ordering;
use std::fmt;

/// The value of one table cell, as seen by sorting and formatting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// Missing value. Sorts after every other value in both directions.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl CellValue {
    /// Whether the cell is missing.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The value as a float, for numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(i) => Some(i as f64),
            Self::Float(f) => Some(f),
            _ => None,
        }
    }

    /// The value as text, for text cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
            Self::Null => 3,
        }
    }

    /// Total order used for sorting in ascending direction.
    ///
    /// Integers and floats compare numerically with each other. Values of
    /// different kinds order by kind (booleans, numbers, text, null).
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Float(_) | Self::Int(_), Self::Float(_) | Self::Int(_)) => {
                let (a, b) = (self.as_f64().unwrap_or(0.0), other.as_f64().unwrap_or(0.0));
                a.total_cmp(&b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(true) => f.write_str("Sí"),
            Self::Bool(false) => f.write_str("No"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for CellValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison_across_kinds() {
        assert_eq!(CellValue::Int(2).compare(&CellValue::Float(1.5)), Ordering::Greater);
        assert_eq!(CellValue::Float(2.0).compare(&CellValue::Int(2)), Ordering::Equal);
        assert_eq!(
            CellValue::Float(f64::NAN).compare(&CellValue::Float(1.0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_mixed_kinds_order_by_rank() {
        assert_eq!(CellValue::from(true).compare(&CellValue::Int(0)), Ordering::Less);
        assert_eq!(CellValue::Int(9).compare(&CellValue::from("a")), Ordering::Less);
        assert_eq!(CellValue::from("z").compare(&CellValue::Null), Ordering::Less);
    }

    #[test]
    fn test_option_conversion_and_display() {
        assert!(CellValue::from(None::<f64>).is_null());
        assert_eq!(CellValue::from(Some("PIM")).to_string(), "PIM");
        assert_eq!(CellValue::from(false).to_string(), "No");
        assert_eq!(CellValue::Null.to_string(), "");
    }
}
