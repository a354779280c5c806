use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::Deserialize;

/// Precedence relation between a predecessor and a successor task.
///
/// The variant decides which edge of each bar the constraint links:
///
/// - `FS`: successor.start >= predecessor.end + lag
/// - `SS`: successor.start >= predecessor.start + lag
/// - `FF`: successor.end >= predecessor.end + lag
/// - `SF`: successor.end >= predecessor.start + lag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum DependencyType {
    #[default]
    #[serde(rename = "FS", alias = "fs")]
    FinishToStart,
    #[serde(rename = "SS", alias = "ss")]
    StartToStart,
    #[serde(rename = "FF", alias = "ff")]
    FinishToFinish,
    #[serde(rename = "SF", alias = "sf")]
    StartToFinish,
}

impl DependencyType {
    /// Short code used in config files and log output.
    pub fn code(self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }

    /// Whether the constraint bounds the successor's start (FS/SS) rather
    /// than its end (FF/SF).
    pub fn constrains_start(self) -> bool {
        matches!(
            self,
            DependencyType::FinishToStart | DependencyType::StartToStart
        )
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fs" | "finish-to-start" => Ok(DependencyType::FinishToStart),
            "ss" | "start-to-start" => Ok(DependencyType::StartToStart),
            "ff" | "finish-to-finish" => Ok(DependencyType::FinishToFinish),
            "sf" | "start-to-finish" => Ok(DependencyType::StartToFinish),
            other => Err(format!(
                "invalid dependency type: {other} (expected FS, SS, FF or SF)"
            )),
        }
    }
}

/// Unit a [`Lag`] amount is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LagUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl LagUnit {
    fn suffix(self) -> &'static str {
        match self {
            LagUnit::Minutes => "m",
            LagUnit::Hours => "h",
            LagUnit::Days => "d",
            LagUnit::Weeks => "w",
        }
    }

    fn minutes_per_unit(self) -> i64 {
        match self {
            LagUnit::Minutes => 1,
            LagUnit::Hours => 60,
            LagUnit::Days => 60 * 24,
            LagUnit::Weeks => 60 * 24 * 7,
        }
    }
}

/// Largest accepted lag magnitude, in minutes (roughly one century).
const MAX_LAG_MINUTES: i64 = 100 * 366 * 24 * 60;

/// Signed offset applied to a dependency constraint.
///
/// Negative values are lead time: the successor may overlap the predecessor.
/// Written in config files as `"<n><unit>"`, e.g. `"2d"`, `"-4h"`, `"30m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Lag {
    amount: i64,
    unit: LagUnit,
}

impl Lag {
    pub fn new(amount: i64, unit: LagUnit) -> Result<Self, String> {
        amount
            .checked_mul(unit.minutes_per_unit())
            .filter(|m| m.abs() <= MAX_LAG_MINUTES)
            .ok_or_else(|| format!("lag {amount}{} is out of range", unit.suffix()))?;
        Ok(Self { amount, unit })
    }

    pub fn zero() -> Self {
        Self {
            amount: 0,
            unit: LagUnit::Hours,
        }
    }

    /// Same range check as [`Lag::new`].
    pub fn hours(amount: i64) -> Result<Self, String> {
        Self::new(amount, LagUnit::Hours)
    }

    pub fn days(amount: i64) -> Result<Self, String> {
        Self::new(amount, LagUnit::Days)
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn unit(&self) -> LagUnit {
        self.unit
    }

    /// The lag as a signed chrono duration.
    pub fn to_duration(&self) -> Duration {
        Duration::minutes(self.amount * self.unit.minutes_per_unit())
    }
}

impl Default for Lag {
    fn default() -> Self {
        Lag::zero()
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for Lag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty lag string".to_string());
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        // Find the boundary between digits and suffix.
        let idx = digits
            .chars()
            .position(|c| !c.is_ascii_digit())
            .ok_or_else(|| format!("lag '{s}' is missing a unit suffix"))?;

        let (num_part, unit_part) = digits.split_at(idx);
        let value: i64 = num_part
            .parse()
            .map_err(|e| format!("invalid lag number '{}': {}", num_part, e))?;
        let value = if negative { -value } else { value };

        let unit = match unit_part.trim().to_lowercase().as_str() {
            "m" | "min" => LagUnit::Minutes,
            "h" => LagUnit::Hours,
            "d" => LagUnit::Days,
            "w" => LagUnit::Weeks,
            other => {
                return Err(format!(
                    "unsupported lag unit '{}'; expected m, h, d or w",
                    other
                ));
            }
        };

        Lag::new(value, unit)
    }
}

impl TryFrom<String> for Lag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the session does when impact analysis recommends `review`.
///
/// - `Refuse`: return a threshold error and leave every task untouched.
/// - `Proceed`: log the warning and run the cascade anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    #[default]
    Refuse,
    Proceed,
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refuse" => Ok(ReviewAction::Refuse),
            "proceed" => Ok(ReviewAction::Proceed),
            other => Err(format!(
                "invalid on_review: {other} (expected \"refuse\" or \"proceed\")"
            )),
        }
    }
}
