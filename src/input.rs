//! Typed hunt submission.
//!
//! Both the HTML form and the JSON API end up as a [`HuntInput`]; the store
//! only ever sees this type, never raw form fields. Neither path rejects a
//! submission over a malformed field.

use crate::models::{Coordinates, HuntRecord, SpeciesTally, Visibility};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Prefix of the per-species count fields in the hunt form (`sc_Mallard=3`).
pub const SPECIES_FIELD_PREFIX: &str = "sc_";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HuntInput {
    pub date: Option<NaiveDate>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub weather_summary: Option<String>,
    pub species_counts: IndexMap<String, i64>,
    pub species: Option<String>,
    pub count: Option<i64>,
    pub hunter_count: Option<u32>,
    pub notes: Option<String>,
    pub visibility: Option<Visibility>,
    pub coordinates: Option<Coordinates>,
    pub spot_label: Option<String>,
}

impl HuntInput {
    /// Builds an input from urlencoded form pairs, coercing anything malformed
    /// to its default instead of rejecting the submission.
    pub fn from_form(pairs: &[(String, String)]) -> Self {
        let mut input = HuntInput::default();
        let mut latitude = None;
        let mut longitude = None;
        let mut custom_names = Vec::new();
        let mut custom_counts = Vec::new();

        for (key, value) in pairs {
            if let Some(name) = key.strip_prefix(SPECIES_FIELD_PREFIX) {
                add_species(&mut input.species_counts, name, parse_count(value));
                continue;
            }
            match key.as_str() {
                "date" => input.date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok(),
                "region" | "flyway" => input.region = non_blank(value),
                "subregion" | "state" => input.subregion = non_blank(value),
                "weather" => input.weather_summary = non_blank(value),
                "species" => input.species = Some(value.clone()),
                "count" => input.count = Some(parse_count(value)),
                "hunters" => input.hunter_count = u32::try_from(parse_count(value)).ok(),
                "notes" => input.notes = non_blank(value),
                "visibility" => input.visibility = Visibility::parse(value),
                "lat" => latitude = value.trim().parse::<f64>().ok(),
                "lng" | "lon" => longitude = value.trim().parse::<f64>().ok(),
                "spot" => input.spot_label = non_blank(value),
                "custom_species" => custom_names.push(value.as_str()),
                "custom_count" => custom_counts.push(parse_count(value)),
                _ => {}
            }
        }

        // Custom rows pair up by position: the n-th name takes the n-th count.
        for (index, name) in custom_names.into_iter().enumerate() {
            let count = custom_counts.get(index).copied().unwrap_or(0);
            add_species(&mut input.species_counts, name, count.max(1));
        }
        if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
            input.coordinates = Some(Coordinates {
                latitude,
                longitude,
            });
        }
        input
    }

    /// Builds an input from a JSON body with the record's camelCase field
    /// names. Values of the wrong type are coerced the same way form fields
    /// are; a body that is not an object yields an all-default input.
    pub fn from_json(body: &Value) -> Self {
        let Some(object) = body.as_object() else {
            return HuntInput::default();
        };

        let mut pairs = Vec::new();
        for (key, value) in object {
            match key.as_str() {
                "speciesCounts" => {
                    for (name, count) in value.as_object().into_iter().flatten() {
                        if let Some(count) = scalar_text(count) {
                            pairs.push((format!("{SPECIES_FIELD_PREFIX}{name}"), count));
                        }
                    }
                }
                "coordinates" => {
                    for (field, alias) in [("latitude", "lat"), ("longitude", "lng")] {
                        if let Some(text) = value.get(field).and_then(scalar_text) {
                            pairs.push((alias.to_string(), text));
                        }
                    }
                }
                _ => {
                    let field = match key.as_str() {
                        "weatherSummary" => "weather",
                        "hunterCount" => "hunters",
                        "spotLabel" => "spot",
                        other => other,
                    };
                    if let Some(text) = scalar_text(value) {
                        pairs.push((field.to_string(), text));
                    }
                }
            }
        }
        Self::from_form(&pairs)
    }

    /// Drops coordinates and spot label from private entries. Producers call
    /// this before handing the input to the store.
    pub fn redacted(mut self) -> Self {
        if self.visibility == Some(Visibility::Private) {
            self.coordinates = None;
            self.spot_label = None;
        }
        self
    }

    pub fn into_record(self, today: NaiveDate) -> HuntRecord {
        let tally = self.tally();
        HuntRecord {
            id: Uuid::new_v4(),
            date: self.date.unwrap_or(today),
            region: self.region.unwrap_or_else(|| "Unknown".to_string()),
            subregion: self.subregion.unwrap_or_else(|| "Unknown".to_string()),
            weather_summary: self.weather_summary.unwrap_or_else(|| "N/A".to_string()),
            tally,
            hunter_count: self.hunter_count.filter(|n| *n > 0).unwrap_or(1),
            notes: self.notes.unwrap_or_default(),
            visibility: self.visibility.unwrap_or_default(),
            coordinates: self.coordinates,
            spot_label: self.spot_label,
        }
    }

    fn tally(&self) -> SpeciesTally {
        let counts: IndexMap<String, i64> = self
            .species_counts
            .iter()
            .filter_map(|(name, n)| {
                let name = name.trim();
                (!name.is_empty() && *n > 0).then(|| (name.to_string(), *n))
            })
            .collect();
        if !counts.is_empty() {
            return SpeciesTally::PerSpecies(counts);
        }

        let count = self.count.unwrap_or(0);
        match self.species.as_deref().map(str::trim) {
            // A named species with no count logs one bird.
            Some(name) if !name.is_empty() => SpeciesTally::Legacy {
                species: Some(name.to_string()),
                count: if count > 0 { count } else { 1 },
            },
            Some(_) if count != 0 => {
                warn!(count, "blank species name; counting birds as mixed");
                SpeciesTally::Legacy {
                    species: None,
                    count,
                }
            }
            _ => SpeciesTally::Legacy {
                species: None,
                count,
            },
        }
    }
}

fn add_species(counts: &mut IndexMap<String, i64>, name: &str, count: i64) {
    let name = name.trim();
    if name.is_empty() || count <= 0 {
        return;
    }
    let slot = counts.entry(name.to_string()).or_insert(0);
    *slot = slot.saturating_add(count);
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn parse_count(value: &str) -> i64 {
    let value = value.trim();
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|n| n as i64))
        .unwrap_or(0)
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 7).unwrap()
    }

    #[test]
    fn form_species_fields_keep_entry_order() {
        let input = HuntInput::from_form(&pairs(&[
            ("date", "2024-11-30"),
            ("sc_Wood Duck", "2"),
            ("sc_Mallard", "3"),
            ("sc_Gadwall", "0"),
        ]));
        let record = input.into_record(today());

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 11, 30).unwrap());
        let SpeciesTally::PerSpecies(counts) = &record.tally else {
            panic!("expected per-species tally");
        };
        let names: Vec<_> = counts.keys().map(String::as_str).collect();
        assert_eq!(names, ["Wood Duck", "Mallard"]);
        assert_eq!(record.total(), 5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let record = HuntInput::from_form(&pairs(&[
            ("date", "not a date"),
            ("hunters", "zero"),
            ("count", "abc"),
        ]))
        .into_record(today());

        assert_eq!(record.date, today());
        assert_eq!(record.hunter_count, 1);
        assert_eq!(record.region, "Unknown");
        assert_eq!(record.subregion, "Unknown");
        assert_eq!(record.weather_summary, "N/A");
        assert_eq!(record.visibility, Visibility::Public);
        assert_eq!(
            record.tally,
            SpeciesTally::Legacy {
                species: None,
                count: 0
            }
        );
    }

    #[test]
    fn legacy_species_without_count_logs_one_bird() {
        let record = HuntInput::from_form(&pairs(&[("species", "Redhead")])).into_record(today());
        assert_eq!(
            record.tally,
            SpeciesTally::Legacy {
                species: Some("Redhead".to_string()),
                count: 1
            }
        );
    }

    #[test]
    fn blank_species_name_counts_as_mixed() {
        let record =
            HuntInput::from_form(&pairs(&[("species", "   "), ("count", "4")])).into_record(today());
        assert_eq!(
            record.tally,
            SpeciesTally::Legacy {
                species: None,
                count: 4
            }
        );
    }

    #[test]
    fn custom_species_is_appended() {
        let input = HuntInput::from_form(&pairs(&[
            ("sc_Mallard", "1"),
            ("custom_species", "Bufflehead"),
            ("custom_count", "2"),
        ]));
        assert_eq!(input.species_counts.get("Bufflehead"), Some(&2));
        assert_eq!(input.species_counts.len(), 2);
    }

    #[test]
    fn repeated_custom_species_pair_by_position() {
        let input = HuntInput::from_form(&pairs(&[
            ("custom_species", "Bufflehead"),
            ("custom_count", "2"),
            ("custom_species", ""),
            ("custom_count", "9"),
            ("custom_species", "Scaup"),
            ("custom_count", ""),
        ]));
        let names: Vec<_> = input.species_counts.keys().map(String::as_str).collect();
        assert_eq!(names, ["Bufflehead", "Scaup"]);
        assert_eq!(input.species_counts["Scaup"], 1);
    }

    #[test]
    fn repeated_species_counts_saturate() {
        let max = i64::MAX.to_string();
        let input = HuntInput::from_form(&pairs(&[
            ("sc_Mallard", max.as_str()),
            ("sc_Mallard", "5"),
        ]));
        assert_eq!(input.species_counts["Mallard"], i64::MAX);
    }

    #[test]
    fn json_body_with_malformed_fields_is_coerced() {
        let record = HuntInput::from_json(&json!({
            "date": "12/01/2024",
            "species": "Gadwall",
            "count": "3",
            "hunterCount": 0.5,
            "visibility": 7,
            "weatherSummary": "41°F, Overcast",
            "coordinates": { "latitude": "34.1", "longitude": -91.2 }
        }))
        .into_record(today());

        assert_eq!(record.date, today());
        assert_eq!(record.hunter_count, 1);
        assert_eq!(record.visibility, Visibility::Public);
        assert_eq!(record.weather_summary, "41°F, Overcast");
        assert_eq!(
            record.tally,
            SpeciesTally::Legacy {
                species: Some("Gadwall".to_string()),
                count: 3
            }
        );
        assert_eq!(
            record.coordinates,
            Some(Coordinates {
                latitude: 34.1,
                longitude: -91.2
            })
        );
    }

    #[test]
    fn json_species_counts_keep_order() {
        let input = HuntInput::from_json(&json!({
            "date": "2024-11-30",
            "speciesCounts": { "Wood Duck": 2, "Mallard": "3", "Teal": null },
            "hunterCount": 3
        }));
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2024, 11, 30));
        assert_eq!(input.hunter_count, Some(3));
        let names: Vec<_> = input.species_counts.keys().map(String::as_str).collect();
        assert_eq!(names, ["Wood Duck", "Mallard"]);
    }

    #[test]
    fn non_object_json_body_is_all_defaults() {
        assert_eq!(HuntInput::from_json(&json!([1, 2, 3])), HuntInput::default());
    }

    #[test]
    fn private_entries_lose_location() {
        let input = HuntInput::from_form(&pairs(&[
            ("visibility", "incognito"),
            ("lat", "34.1"),
            ("lng", "-91.2"),
            ("spot", "North hole"),
        ]))
        .redacted();

        assert_eq!(input.visibility, Some(Visibility::Private));
        assert!(input.coordinates.is_none());
        assert!(input.spot_label.is_none());
    }

    #[test]
    fn public_entries_keep_location() {
        let input = HuntInput::from_form(&pairs(&[
            ("visibility", "public"),
            ("lat", "34.1"),
            ("lng", "-91.2"),
        ]))
        .redacted();

        assert_eq!(
            input.coordinates,
            Some(Coordinates {
                latitude: 34.1,
                longitude: -91.2
            })
        );
    }
}
