//! Relational predicates applied by the result filter

use super::value::{Scalar, Tolerance};
use serde::{Deserialize, Serialize};

/// Comparison applied between the current value and the filter operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonType {
    /// Maps a boundary selector; anything unrecognised means `Equal`
    pub fn from_selector(selector: i32) -> Self {
        match selector {
            1 => ComparisonType::NotEqual,
            2 => ComparisonType::Greater,
            3 => ComparisonType::Less,
            4 => ComparisonType::GreaterOrEqual,
            5 => ComparisonType::LessOrEqual,
            _ => ComparisonType::Equal,
        }
    }

    pub fn selector(&self) -> i32 {
        match self {
            ComparisonType::Equal => 0,
            ComparisonType::NotEqual => 1,
            ComparisonType::Greater => 2,
            ComparisonType::Less => 3,
            ComparisonType::GreaterOrEqual => 4,
            ComparisonType::LessOrEqual => 5,
        }
    }

    /// Evaluates `current <op> operand`.
    ///
    /// Equality and inequality go through [`Scalar::approx_eq`] and
    /// [`Scalar::differs`], so floats use their tolerance band and a NaN
    /// satisfies neither; ordering comparisons are exact.
    pub fn evaluate<T: Scalar>(&self, current: T, operand: T, tolerance: &Tolerance) -> bool {
        match self {
            ComparisonType::Equal => current.approx_eq(operand, tolerance),
            ComparisonType::NotEqual => current.differs(operand, tolerance),
            ComparisonType::Greater => current > operand,
            ComparisonType::Less => current < operand,
            ComparisonType::GreaterOrEqual => current >= operand,
            ComparisonType::LessOrEqual => current <= operand,
        }
    }
}

impl std::str::FromStr for ComparisonType {
    type Err = super::MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "eq" | "==" => Ok(ComparisonType::Equal),
            "ne" | "!=" => Ok(ComparisonType::NotEqual),
            "gt" | ">" => Ok(ComparisonType::Greater),
            "lt" | "<" => Ok(ComparisonType::Less),
            "ge" | ">=" => Ok(ComparisonType::GreaterOrEqual),
            "le" | "<=" => Ok(ComparisonType::LessOrEqual),
            other => Err(super::MemoryError::Unknown(format!(
                "unknown comparison '{}'",
                other
            ))),
        }
    }
}
