use crate::errors::AppError;
use crate::models::{EnergyEntry, EnergyQuery};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Accepts a bare date (midnight) or a date with a time of day, years 1 to 9999.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .filter(|ts| YEARS.contains(&ts.year()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    All,
    Between(NaiveDate, NaiveDate),
}

impl DateWindow {
    pub fn from_query(query: &EnergyQuery, today: NaiveDate) -> Result<Self, AppError> {
        let range = query
            .range
            .as_deref()
            .map(str::trim)
            .filter(|range| !range.is_empty())
            .unwrap_or("all");

        let days_back = match range {
            "all" => None,
            "today" => Some(0),
            "week" => Some(6),
            "month" => Some(29),
            "year" => Some(364),
            other => return Err(AppError::bad_request(format!("unknown range '{other}'"))),
        };

        if let Some(days) = days_back {
            return Ok(Self::Between(today - Duration::days(days), today));
        }

        let from = non_empty(query.from_date.as_deref());
        let to = non_empty(query.to_date.as_deref());
        match (from, to) {
            (Some(from), Some(to)) => {
                let from = parse_day(from)?;
                let to = parse_day(to)?;
                if from > to {
                    return Err(AppError::bad_request("from_date must not be after to_date"));
                }
                Ok(Self::Between(from, to))
            }
            _ => Ok(Self::All),
        }
    }

    pub fn contains(&self, entry: &EnergyEntry) -> bool {
        match self {
            Self::All => true,
            Self::Between(from, to) => parse_timestamp(&entry.date)
                .map(|ts| {
                    let day = ts.date();
                    day >= *from && day <= *to
                })
                .unwrap_or(false),
        }
    }
}

/// Entries inside the window, oldest first.
pub fn select_entries<'a>(entries: Vec<&'a EnergyEntry>, window: DateWindow) -> Vec<&'a EnergyEntry> {
    let mut selected: Vec<&EnergyEntry> = entries
        .into_iter()
        .filter(|entry| window.contains(entry))
        .collect();
    sort_chronologically(&mut selected);
    selected
}

pub fn sort_chronologically(entries: &mut [&EnergyEntry]) {
    entries.sort_by(|a, b| {
        parse_timestamp(&a.date)
            .cmp(&parse_timestamp(&b.date))
            .then(a.id.cmp(&b.id))
    });
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_day(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .filter(|day| YEARS.contains(&day.year()))
        .ok_or_else(|| AppError::bad_request(format!("invalid date '{value}', expected YYYY-MM-DD")))
}
