use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::error::ValidationError;

/// A wall-clock time of day an alarm rings at.
/// Always displayed in its canonical `HH:MM` form, which is also how it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(ValidationError::MinuteOutOfRange(minute));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// The minute a wall-clock reading falls in, seconds dropped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn parse_part(part: &str) -> Result<u32, ValidationError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric(part.to_string()));
    }
    part.parse()
        .map_err(|_| ValidationError::NotNumeric(part.to_string()))
}

impl FromStr for AlarmTime {
    type Err = ValidationError;

    /// Accepts `H:M` with one or two digit parts (`8:5` becomes `08:05`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split(':');
        let (Some(hour), Some(minute), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ValidationError::Separator(s.to_string()));
        };
        Self::new(parse_part(hour)?, parse_part(minute)?)
    }
}

/// A calendar minute: the unit the scheduler refuses to fire twice in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteStamp {
    pub date: NaiveDate,
    pub time: AlarmTime,
}

impl MinuteStamp {
    #[must_use]
    pub fn of(now: &NaiveDateTime) -> Self {
        Self {
            date: now.date(),
            time: AlarmTime::of(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_valid_time() {
        for hour in 0..24 {
            for minute in 0..60 {
                let text = format!("{hour:02}:{minute:02}");
                let time: AlarmTime = text.parse().unwrap();
                assert_eq!(time.to_string(), text);
            }
        }
    }

    #[test]
    fn canonicalizes_short_parts() {
        assert_eq!("8:5".parse::<AlarmTime>().unwrap().to_string(), "08:05");
        assert_eq!(" 09:40 ".parse::<AlarmTime>().unwrap().to_string(), "09:40");
    }

    #[test]
    fn rejects_bad_separators() {
        for text in ["0800", "08:00:00", "08-00", "", ":"] {
            assert!(text.parse::<AlarmTime>().is_err(), "{text:?} accepted");
        }
        assert!(matches!(
            "08:00:00".parse::<AlarmTime>(),
            Err(ValidationError::Separator(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_parts() {
        for text in ["ab:cd", "08:x0", "-1:00", "+8:00", "08:", ":30", "8 :30"] {
            assert!(
                matches!(
                    text.parse::<AlarmTime>(),
                    Err(ValidationError::NotNumeric(_))
                ),
                "{text:?} accepted"
            );
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            "24:00".parse::<AlarmTime>(),
            Err(ValidationError::HourOutOfRange(24))
        );
        assert_eq!(
            "12:60".parse::<AlarmTime>(),
            Err(ValidationError::MinuteOutOfRange(60))
        );
        assert!("99999999999:00".parse::<AlarmTime>().is_err());
    }

    #[test]
    fn orders_by_time_of_day() {
        let mut times: Vec<AlarmTime> = ["13:05", "08:00", "09:40", "08:30"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        times.sort();
        let rendered: Vec<String> = times.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["08:00", "08:30", "09:40", "13:05"]);
    }

    #[test]
    fn stamp_ignores_seconds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let a = MinuteStamp::of(&date.and_hms_opt(8, 0, 0).unwrap());
        let b = MinuteStamp::of(&date.and_hms_opt(8, 0, 59).unwrap());
        let c = MinuteStamp::of(&date.succ_opt().unwrap().and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.time.to_string(), "08:00");
    }
}
