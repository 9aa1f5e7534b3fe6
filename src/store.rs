use crate::input::HuntInput;
use crate::models::{HuntRecord, Season};
use crate::storage::{LocalStorage, HUNTS_KEY, INCOGNITO_KEY, SEASON_KEY};
use chrono::{Local, NaiveDate};
use tracing::info;
use uuid::Uuid;

/// Hunt log, season window and incognito flag, mirrored to [`LocalStorage`]
/// after every change.
#[derive(Debug)]
pub struct RecordStore {
    storage: LocalStorage,
    hunts: Vec<HuntRecord>,
    season: Season,
    incognito: bool,
}

impl RecordStore {
    pub async fn open(storage: LocalStorage) -> Self {
        Self::open_at(storage, Local::now().date_naive()).await
    }

    pub async fn open_at(storage: LocalStorage, today: NaiveDate) -> Self {
        let hunts = storage.load_or(HUNTS_KEY, Vec::new()).await;
        let season = storage.load_or(SEASON_KEY, Season::default_for(today)).await;
        let incognito = storage.load_or(INCOGNITO_KEY, false).await;
        info!(hunts = hunts.len(), "loaded hunt log");
        Self {
            storage,
            hunts,
            season,
            incognito,
        }
    }

    /// Newest first.
    pub fn hunts(&self) -> &[HuntRecord] {
        &self.hunts
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn incognito(&self) -> bool {
        self.incognito
    }

    pub async fn add_record(&mut self, input: HuntInput) -> HuntRecord {
        self.add_record_at(input, Local::now().date_naive()).await
    }

    pub async fn add_record_at(&mut self, input: HuntInput, today: NaiveDate) -> HuntRecord {
        let record = input.into_record(today);
        info!(id = %record.id, date = %record.date, total = record.total(), "hunt logged");
        self.hunts.insert(0, record.clone());
        self.storage.save(HUNTS_KEY, &self.hunts).await;
        record
    }

    /// Removes the record with `id`; returns whether one was found. The list
    /// is persisted either way.
    pub async fn remove_record(&mut self, id: Uuid) -> bool {
        let before = self.hunts.len();
        self.hunts.retain(|hunt| hunt.id != id);
        let removed = self.hunts.len() != before;
        if removed {
            info!(%id, "hunt removed");
        }
        self.storage.save(HUNTS_KEY, &self.hunts).await;
        removed
    }

    /// Re-reads the season from storage, falling back to the default window.
    pub async fn load_season(&mut self) -> Season {
        self.load_season_at(Local::now().date_naive()).await
    }

    pub async fn load_season_at(&mut self, today: NaiveDate) -> Season {
        self.season = self
            .storage
            .load_or(SEASON_KEY, Season::default_for(today))
            .await;
        self.season
    }

    pub async fn save_season(&mut self, season: Season) {
        info!(start = %season.start, end = %season.end, "season updated");
        self.season = season;
        self.storage.save(SEASON_KEY, &self.season).await;
    }

    pub async fn set_incognito(&mut self, enabled: bool) {
        self.incognito = enabled;
        self.storage.save(INCOGNITO_KEY, &enabled).await;
    }
}
