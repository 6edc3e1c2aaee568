//! 12-hour clock input as produced by the hour/minute/AM-PM dropdowns.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        })
    }
}

impl FromStr for Meridiem {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AM" | "am" => Ok(Meridiem::Am),
            "PM" | "pm" => Ok(Meridiem::Pm),
            other => Err(ClockError::InvalidInput(format!(
                "meridiem must be AM or PM, got `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A wall-clock reading on a 12-hour dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime12 {
    pub hour: u8,
    pub minute: u8,
    pub meridiem: Meridiem,
}

impl ClockTime12 {
    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Self {
        Self {
            hour,
            minute,
            meridiem,
        }
    }

    pub fn to_time(self) -> Result<Time, ClockError> {
        to_24_hour(self.hour, self.minute, self.meridiem)
    }
}

/// Minutes offered by the form: 00, 05, ..., 55.
pub fn is_offered_minute(minute: u8) -> bool {
    minute < 60 && minute % 5 == 0
}

/// Converts an hour in `1..=12`, a minute on the 5-minute grid and a meridiem
/// into a 24-hour time of day.
pub fn to_24_hour(hour: u8, minute: u8, meridiem: Meridiem) -> Result<Time, ClockError> {
    if !(1..=12).contains(&hour) {
        return Err(ClockError::InvalidInput(format!(
            "hour must be within 1..=12, got {}",
            hour
        )));
    }
    if !is_offered_minute(minute) {
        return Err(ClockError::InvalidInput(format!(
            "minute must be one of 00, 05, ..., 55, got {}",
            minute
        )));
    }

    let hour24 = match (meridiem, hour) {
        (Meridiem::Pm, h) if h != 12 => h + 12,
        (Meridiem::Am, 12) => 0,
        (_, h) => h,
    };

    Time::from_hms(hour24, minute, 0)
        .map_err(|e| ClockError::InvalidInput(e.to_string()))
}

/// Inverse of [`to_24_hour`] for display and form defaults.
pub fn to_12_hour(t: Time) -> ClockTime12 {
    let (meridiem, hour) = match t.hour() {
        0 => (Meridiem::Am, 12),
        h @ 1..=11 => (Meridiem::Am, h),
        12 => (Meridiem::Pm, 12),
        h => (Meridiem::Pm, h - 12),
    };
    ClockTime12 {
        hour,
        minute: t.minute(),
        meridiem,
    }
}
