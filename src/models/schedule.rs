//! Schedule times
//!
//! Every platform encodes the same two parameters for a job: a time of day,
//! and for the weekly job a day of the week.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

use crate::error::BackupError;

/// Time of day in 24-hour `HH:MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, BackupError> {
        if hour > 23 || minute > 59 {
            return Err(BackupError::Config(format!(
                "schedule time out of range: {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ScheduleTime {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BackupError::Config(format!("schedule time must be HH:MM, got '{}'", s));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// When one job fires: every day, or on one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    pub time: ScheduleTime,
    pub weekday: Option<Weekday>,
}

/// Parse a weekday name (`Sunday`, `sun`, ...)
pub fn parse_weekday(s: &str) -> Result<Weekday, BackupError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| BackupError::Config(format!("unknown weekday: {}", s)))
}

/// Three-letter English abbreviation (`Sun`, `Mon`, ...)
pub fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Full English name, as written to the settings file
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(
            "12:30".parse::<ScheduleTime>().unwrap(),
            ScheduleTime { hour: 12, minute: 30 }
        );
        assert_eq!(
            "2:05".parse::<ScheduleTime>().unwrap(),
            ScheduleTime { hour: 2, minute: 5 }
        );
        assert_eq!("02:00".parse::<ScheduleTime>().unwrap().to_string(), "02:00");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!("24:00".parse::<ScheduleTime>().is_err());
        assert!("12:60".parse::<ScheduleTime>().is_err());
        assert!("1230".parse::<ScheduleTime>().is_err());
        assert!("12:3".parse::<ScheduleTime>().is_err());
        assert!("ab:cd".parse::<ScheduleTime>().is_err());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Sunday").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("fri").unwrap(), Weekday::Fri);
        assert!(parse_weekday("Someday").is_err());
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_abbrev(Weekday::Wed), "Wed");
        assert_eq!(weekday_name(Weekday::Sat), "Saturday");
    }
}
