use crate::aggregate::top_species;
use crate::models::{CalendarCell, CalendarMonth, DailyAggregate, Season};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// First-of-month dates from `start`'s month through `end`'s month. Cloning
/// restarts the walk.
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for MonthIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_months(Months::new(1))
            .filter(|next| *next <= self.last);
        Some(current)
    }
}

pub fn enumerate_months(start: NaiveDate, end: NaiveDate) -> MonthIter {
    let first = first_of_month(start);
    let last = first_of_month(end);
    MonthIter {
        next: (start <= end).then_some(first),
        last,
    }
}

/// Day cells for `month0` (0 = January) of `year`, Sunday first. `None` is a
/// padding cell; the length is always a multiple of 7.
pub fn month_grid(year: i32, month0: u32) -> Vec<Option<NaiveDate>> {
    let Some(first) = month0
        .checked_add(1)
        .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
    else {
        return Vec::new();
    };
    let lead = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(first);

    let mut cells = Vec::with_capacity((lead + days as usize).div_ceil(7) * 7);
    cells.resize(lead, None);
    cells.extend((1..=days).filter_map(|day| first.with_day(day)).map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    cells
}

pub fn build_calendar(
    season: &Season,
    days: &BTreeMap<NaiveDate, DailyAggregate>,
) -> Vec<CalendarMonth> {
    enumerate_months(season.start, season.end)
        .map(|first_day| CalendarMonth {
            label: month_label(first_day),
            first_day,
            cells: month_grid(first_day.year(), first_day.month0())
                .into_iter()
                .map(|cell| match cell {
                    None => CalendarCell::Placeholder,
                    Some(date) => {
                        let aggregate = days.get(&date);
                        CalendarCell::Day {
                            date,
                            day: date.day(),
                            total: aggregate.map(|a| a.total),
                            top_species: aggregate
                                .and_then(top_species)
                                .map(str::to_string),
                        }
                    }
                })
                .collect(),
        })
        .collect()
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_in_month(first: NaiveDate) -> u32 {
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}
