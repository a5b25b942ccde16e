use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::DecisionError;

pub(crate) const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day, stored as minutes since midnight (0..=1439).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    /// Parses `HH:MM` (24-hour). The hour may use one or two digits; the minute always uses two.
    pub fn parse(raw: &str) -> Result<Self, DecisionError> {
        let invalid = || DecisionError::InvalidTimeFormat(raw.to_string());

        let (hour, minute) = raw.split_once(':').ok_or_else(invalid)?;
        if !(1..=2).contains(&hour.len()) || minute.len() != 2 {
            return Err(invalid());
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = DecisionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_single_digit_hours() {
        assert_eq!(ClockTime::parse("09:05").unwrap().minutes_since_midnight(), 545);
        assert_eq!(ClockTime::parse("9:05").unwrap().minutes_since_midnight(), 545);
        assert_eq!(ClockTime::parse("00:00").unwrap().minutes_since_midnight(), 0);
        assert_eq!(ClockTime::parse("23:59").unwrap().minutes_since_midnight(), 1439);
    }

    #[test]
    fn rejects_malformed_values() {
        for raw in [
            "", "25:00", "24:00", "9:5", "12:60", "1200", "12:000", " 12:00", "ab:cd", "+1:00",
        ] {
            assert_eq!(
                ClockTime::parse(raw),
                Err(DecisionError::InvalidTimeFormat(raw.to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn displays_zero_padded() {
        let time = ClockTime::from_hm(7, 3).expect("valid time");
        assert_eq!(time.to_string(), "07:03");
        assert_eq!(time.to_naive_time(), NaiveTime::from_hms_opt(7, 3, 0).unwrap());
    }
}
