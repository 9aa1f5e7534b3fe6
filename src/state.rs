use crate::store::RecordStore;
use crate::weather::WeatherClient;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<RecordStore>>,
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(store: RecordStore, weather: WeatherClient) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            weather,
        }
    }
}
