use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FLYWAYS: [&str; 4] = ["Pacific", "Central", "Mississippi", "Atlantic"];

pub const STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

pub const SPECIES_OPTIONS: [&str; 12] = [
    "Mallard",
    "Gadwall",
    "Blue-winged Teal",
    "Green-winged Teal",
    "Wood Duck",
    "Northern Pintail",
    "American Wigeon",
    "Northern Shoveler",
    "Canvasback",
    "Redhead",
    "Snow Goose",
    "Canada Goose",
];

/// Label used for legacy records that never named a species.
pub const MIXED_SPECIES: &str = "Mixed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    #[serde(alias = "incognito")]
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "private" | "incognito" => Some(Visibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Birds taken on one outing. A record carries exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTally", into = "StoredTally")]
pub enum SpeciesTally {
    /// Ordered species → count, in the order the hunter entered them.
    PerSpecies(IndexMap<String, i64>),
    /// Older single species/count entry; `None` aggregates as [`MIXED_SPECIES`].
    Legacy { species: Option<String>, count: i64 },
}

impl SpeciesTally {
    /// Sum of all counts, with negative counts contributing nothing.
    pub fn total(&self) -> u64 {
        match self {
            SpeciesTally::PerSpecies(counts) => counts
                .values()
                .map(|n| clamp_count(*n))
                .fold(0u64, u64::saturating_add),
            SpeciesTally::Legacy { count, .. } => clamp_count(*count),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SpeciesTally::PerSpecies(counts) if !counts.is_empty() => counts
                .iter()
                .map(|(name, n)| format!("{name} {n}"))
                .collect::<Vec<_>>()
                .join(", "),
            SpeciesTally::PerSpecies(_) => format!("{MIXED_SPECIES} 0"),
            SpeciesTally::Legacy { species, count } => {
                format!("{} {count}", species.as_deref().unwrap_or(MIXED_SPECIES))
            }
        }
    }
}

pub(crate) fn clamp_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Persisted shape of [`SpeciesTally`], flattened into the record object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTally {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    species_counts: Option<IndexMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
}

impl From<StoredTally> for SpeciesTally {
    fn from(stored: StoredTally) -> Self {
        match stored.species_counts {
            Some(counts) if !counts.is_empty() => SpeciesTally::PerSpecies(counts),
            _ => SpeciesTally::Legacy {
                species: stored.species.filter(|name| !name.trim().is_empty()),
                count: stored.count.unwrap_or(0),
            },
        }
    }
}

impl From<SpeciesTally> for StoredTally {
    fn from(tally: SpeciesTally) -> Self {
        match tally {
            SpeciesTally::PerSpecies(counts) => StoredTally {
                species_counts: Some(counts),
                ..StoredTally::default()
            },
            SpeciesTally::Legacy { species, count } => StoredTally {
                species_counts: None,
                species,
                count: Some(count),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(alias = "flyway")]
    pub region: String,
    #[serde(alias = "state")]
    pub subregion: String,
    #[serde(alias = "weather")]
    pub weather_summary: String,
    #[serde(flatten)]
    pub tally: SpeciesTally,
    #[serde(alias = "hunters", default = "default_hunter_count")]
    pub hunter_count: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub visibility: Visibility,
    /// Written as a nested `coordinates` object; records saved with a bare
    /// top-level `lat`/`lng` pair are read into the same field.
    #[serde(flatten, with = "stored_location")]
    pub coordinates: Option<Coordinates>,
    #[serde(alias = "spot", default, skip_serializing_if = "Option::is_none")]
    pub spot_label: Option<String>,
}

fn default_hunter_count() -> u32 {
    1
}

mod stored_location {
    use super::Coordinates;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Default, Serialize, Deserialize)]
    struct StoredLocation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Coordinates>,
        #[serde(default, skip_serializing)]
        lat: Option<f64>,
        #[serde(default, alias = "lon", skip_serializing)]
        lng: Option<f64>,
    }

    pub fn serialize<S: Serializer>(
        coordinates: &Option<Coordinates>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        StoredLocation {
            coordinates: *coordinates,
            ..StoredLocation::default()
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Coordinates>, D::Error> {
        let stored = StoredLocation::deserialize(deserializer)?;
        Ok(stored.coordinates.or(match (stored.lat, stored.lng) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }))
    }
}

impl HuntRecord {
    pub fn total(&self) -> u64 {
        self.tally.total()
    }
}

/// Season window. `start <= end` is not enforced; an inverted window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Season {
    /// November 1 of `today`'s year through January 31 of the following year.
    pub fn default_for(today: NaiveDate) -> Self {
        let year = today.year();
        Self {
            start: NaiveDate::from_ymd_opt(year, 11, 1).unwrap_or(today),
            end: NaiveDate::from_ymd_opt(year + 1, 1, 31).unwrap_or(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub total: u64,
    pub species: IndexMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonTotals {
    pub total_birds: u64,
    pub hunts: usize,
    pub top_species: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    Placeholder,
    Day {
        date: NaiveDate,
        day: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        top_species: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub label: String,
    pub first_day: NaiveDate,
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarResponse {
    pub season: Season,
    pub months: Vec<CalendarMonth>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SummaryQuery {
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub scope: &'static str,
    pub totals: SeasonTotals,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IncognitoState {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_with_top_level_pin_load_coordinates() {
        let record: HuntRecord = serde_json::from_value(json!({
            "id": "6f1c1d8e-2f4a-4b7e-9a51-0c3d2e1f4a5b",
            "date": "2024-12-14",
            "flyway": "Central",
            "state": "KS",
            "weather": "N/A",
            "speciesCounts": { "Mallard": 3 },
            "hunters": 2,
            "notes": "",
            "visibility": "public",
            "lat": 38.1,
            "lng": -98.6,
            "spot": "Back slough"
        }))
        .unwrap();

        assert_eq!(record.region, "Central");
        assert_eq!(record.subregion, "KS");
        assert_eq!(record.hunter_count, 2);
        assert_eq!(record.spot_label.as_deref(), Some("Back slough"));
        assert_eq!(
            record.tally,
            SpeciesTally::PerSpecies(IndexMap::from([("Mallard".to_string(), 3)]))
        );
        assert_eq!(
            record.coordinates,
            Some(Coordinates {
                latitude: 38.1,
                longitude: -98.6
            })
        );

        let saved = serde_json::to_value(&record).unwrap();
        assert_eq!(saved["coordinates"]["latitude"], 38.1);
        assert!(saved.get("lat").is_none());
    }

    #[test]
    fn half_a_pin_is_no_pin() {
        let record: HuntRecord = serde_json::from_value(json!({
            "id": "6f1c1d8e-2f4a-4b7e-9a51-0c3d2e1f4a5b",
            "date": "2024-12-14",
            "region": "Central",
            "subregion": "KS",
            "weatherSummary": "N/A",
            "count": 2,
            "lat": 38.1
        }))
        .unwrap();
        assert!(record.coordinates.is_none());
    }

    #[test]
    fn legacy_tally_survives_persistence() {
        let record = HuntRecord {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            region: "Mississippi".to_string(),
            subregion: "AR".to_string(),
            weather_summary: "N/A".to_string(),
            tally: SpeciesTally::Legacy {
                species: None,
                count: 4,
            },
            hunter_count: 1,
            notes: String::new(),
            visibility: Visibility::Private,
            coordinates: None,
            spot_label: None,
        };

        let saved = serde_json::to_value(&record).unwrap();
        assert!(saved.get("speciesCounts").is_none());
        assert!(saved.get("species").is_none());
        assert_eq!(saved["count"], 4);

        let loaded: HuntRecord = serde_json::from_value(saved).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let tally = SpeciesTally::PerSpecies(IndexMap::from([
            ("Mallard".to_string(), i64::MAX),
            ("Gadwall".to_string(), i64::MAX),
            ("Wigeon".to_string(), i64::MAX),
        ]));
        assert_eq!(tally.total(), u64::MAX);
    }
}
