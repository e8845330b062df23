use crate::filter::parse_timestamp;
use crate::models::EnergyEntry;
use chrono::{Datelike, Duration, Local, NaiveDate};

pub fn totals(entries: &[&EnergyEntry]) -> (f64, f64) {
    entries.iter().fold((0.0, 0.0), |(solar, electric), entry| {
        (solar + entry.solar_energy, electric + entry.electric_energy)
    })
}

/// Grid spend avoided by the solar production recorded so far.
pub fn savings(entries: &[&EnergyEntry], rate_per_kwh: f64) -> f64 {
    totals(entries).0 * rate_per_kwh
}

pub fn energy_tips(entries: &[&EnergyEntry]) -> Vec<String> {
    energy_tips_at(Local::now().date_naive(), entries)
}

pub fn energy_tips_at(today: NaiveDate, entries: &[&EnergyEntry]) -> Vec<String> {
    let this_week_start = week_start(today);
    let last_week_start = this_week_start - Duration::weeks(1);
    let last_week_end = this_week_start - Duration::days(1);

    let last_week = grid_between(entries, last_week_start, last_week_end);
    let this_week = grid_between(entries, this_week_start, today);

    let mut tips = vec![weekly_message(last_week, this_week)];

    let (solar, electric) = totals(entries);
    let total = solar + electric;
    if total > 0.0 && solar / total < 0.3 {
        tips.push("Run heavy appliances like washing machines during daylight hours to use more of your solar output.".to_string());
    }
    if electric > 0.0 {
        tips.push("Avoid peak hours (9AM-12PM and 5PM-9PM) for energy-intensive tasks to cut costs.".to_string());
    }
    tips.push("Switch to LED lighting and unplug idle chargers to trim standby consumption.".to_string());
    tips
}

fn weekly_message(last_week: f64, this_week: f64) -> String {
    if last_week == 0.0 {
        return "Start tracking your electricity usage to get personalized tips!".to_string();
    }

    let change = (this_week - last_week) / last_week * 100.0;
    if change > 10.0 {
        format!(
            "You used {change:.1}% more grid power than last week. Try reducing usage by turning off appliances when not needed."
        )
    } else if change < -10.0 {
        format!(
            "Great job! You reduced your grid power usage by {:.1}% compared to last week.",
            change.abs()
        )
    } else {
        "Your electricity usage is consistent with last week. Keep monitoring for better savings."
            .to_string()
    }
}

fn grid_between(entries: &[&EnergyEntry], from: NaiveDate, to: NaiveDate) -> f64 {
    entries
        .iter()
        .filter(|entry| {
            parse_timestamp(&entry.date)
                .map(|ts| ts.date() >= from && ts.date() <= to)
                .unwrap_or(false)
        })
        .map(|entry| entry.electric_energy)
        .sum()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
