use std::fmt;

use anyhow::{bail, Result};

/// Literal used for unavailable cells in the persisted tables.
pub const NA_TOKEN: &str = "NA";

/// One feature cell: either a finite number or the explicit
/// "not available" marker. Cells are never absent and never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Na,
}

impl Value {
    pub const ZERO: Value = Value::Num(0.0);

    pub fn is_na(self) -> bool {
        matches!(self, Value::Na)
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Value::Num(x) => Some(x),
            Value::Na => None,
        }
    }

    /// Addition with absorbing NA: an aggregate over an unavailable member
    /// is itself unavailable, never a silently smaller sum.
    pub fn add(self, other: Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a + b),
            _ => Value::Na,
        }
    }

    /// Division by a member count, NA absorbing.
    pub fn div(self, denominator: f64) -> Value {
        match self {
            Value::Num(x) => Value::Num(x / denominator),
            Value::Na => Value::Na,
        }
    }

    pub fn parse(cell: &str) -> Result<Value> {
        if cell == NA_TOKEN {
            return Ok(Value::Na);
        }
        match cell.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Value::Num(x)),
            _ => bail!("malformed numeric cell `{cell}`"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(x) => write!(f, "{x}"),
            Value::Na => f.write_str(NA_TOKEN),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn na_absorbs_sum() {
        assert_eq!(Value::Num(1.0).add(Value::Num(2.0)), Value::Num(3.0));
        assert_eq!(Value::Num(1.0).add(Value::Na), Value::Na);
        assert_eq!(Value::Na.add(Value::Num(2.0)), Value::Na);
    }

    #[test]
    fn na_absorbs_mean_division() {
        assert_eq!(Value::Num(6.0).div(3.0), Value::Num(2.0));
        assert_eq!(Value::Na.div(3.0), Value::Na);
    }

    #[test]
    fn renders_and_parses_back() {
        assert_eq!(Value::Num(50.0).to_string(), "50");
        assert_eq!(Value::Num(0.25).to_string(), "0.25");
        assert_eq!(Value::Na.to_string(), "NA");

        assert_eq!(Value::parse("50").unwrap(), Value::Num(50.0));
        assert_eq!(Value::parse("NA").unwrap(), Value::Na);
        assert!(Value::parse("abc").is_err());
        assert!(Value::parse("NaN").is_err());
    }
}
