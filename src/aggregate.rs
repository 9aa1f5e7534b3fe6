use crate::models::{
    clamp_count, DailyAggregate, HuntRecord, Season, SeasonTotals, SpeciesTally, MIXED_SPECIES,
};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Per-day totals keyed by date. Species keep the order in which they were
/// first seen while walking `records`.
pub fn aggregate_by_date(records: &[HuntRecord]) -> BTreeMap<NaiveDate, DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.date).or_default();
        for_each_species(&record.tally, |name, count| add(day, name, count));
    }
    days
}

/// Species with the highest count; the earliest inserted wins a tie.
pub fn top_species(aggregate: &DailyAggregate) -> Option<&str> {
    top_of(&aggregate.species)
}

pub fn season_totals(records: &[HuntRecord]) -> SeasonTotals {
    let mut tally = DailyAggregate::default();
    for record in records {
        for_each_species(&record.tally, |name, count| add(&mut tally, name, count));
    }
    SeasonTotals {
        total_birds: tally.total,
        hunts: records.len(),
        top_species: top_of(&tally.species).map(str::to_string),
    }
}

/// [`season_totals`] over the records dated inside `season`.
pub fn season_totals_within(records: &[HuntRecord], season: &Season) -> SeasonTotals {
    let in_window: Vec<HuntRecord> = records
        .iter()
        .filter(|record| season.contains(record.date))
        .cloned()
        .collect();
    season_totals(&in_window)
}

fn for_each_species(tally: &SpeciesTally, mut visit: impl FnMut(&str, u64)) {
    match tally {
        SpeciesTally::PerSpecies(counts) if !counts.is_empty() => {
            for (name, count) in counts {
                visit(name, clamp_count(*count));
            }
        }
        SpeciesTally::PerSpecies(_) => visit(MIXED_SPECIES, 0),
        SpeciesTally::Legacy { species, count } => {
            visit(species.as_deref().unwrap_or(MIXED_SPECIES), clamp_count(*count));
        }
    }
}

fn add(day: &mut DailyAggregate, name: &str, count: u64) {
    let slot = day.species.entry(name.to_string()).or_insert(0);
    *slot = slot.saturating_add(count);
    day.total = day.total.saturating_add(count);
}

fn top_of(species: &IndexMap<String, u64>) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (name, count) in species {
        match best {
            Some((_, top)) if *count <= top => {}
            _ => best = Some((name.as_str(), *count)),
        }
    }
    best.map(|(name, _)| name)
}
