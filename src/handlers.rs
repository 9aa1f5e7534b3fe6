use crate::aggregate::{aggregate_by_date, season_totals, season_totals_within};
use crate::calendar::build_calendar;
use crate::errors::AppError;
use crate::input::HuntInput;
use crate::models::{
    CalendarResponse, Coordinates, HuntRecord, IncognitoState, Season, SummaryQuery,
    SummaryResponse, WeatherQuery, WeatherResponse,
};
use crate::state::AppState;
use crate::ui::{render_page, Tab, ViewContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct IncognitoForm {
    pub enabled: Option<String>,
    pub tab: Option<String>,
}

pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let store = state.store.lock().await;
    let view = ViewContext {
        tab: Tab::parse(query.tab.as_deref()),
        today: today(),
        incognito: store.incognito(),
        hunts: store.hunts(),
        season: store.season(),
    };
    Html(render_page(&view))
}

pub async fn submit_hunt(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Redirect {
    let input = HuntInput::from_form(&pairs).redacted();
    state.store.lock().await.add_record(input).await;
    redirect_to(Tab::Hunts)
}

pub async fn delete_hunt(State(state): State<AppState>, Path(id): Path<Uuid>) -> Redirect {
    state.store.lock().await.remove_record(id).await;
    redirect_to(Tab::Hunts)
}

/// Dates that do not parse keep their current value.
pub async fn update_season(
    State(state): State<AppState>,
    Form(form): Form<SeasonForm>,
) -> Redirect {
    let mut store = state.store.lock().await;
    let current = store.season();
    let season = Season {
        start: parse_date(&form.start).unwrap_or(current.start),
        end: parse_date(&form.end).unwrap_or(current.end),
    };
    store.save_season(season).await;
    redirect_to(Tab::Season)
}

pub async fn update_incognito(
    State(state): State<AppState>,
    Form(form): Form<IncognitoForm>,
) -> Redirect {
    let enabled = form.enabled.is_some_and(|value| !value.is_empty());
    state.store.lock().await.set_incognito(enabled).await;
    redirect_to(Tab::parse(form.tab.as_deref()))
}

pub async fn list_hunts(State(state): State<AppState>) -> Json<Vec<HuntRecord>> {
    Json(state.store.lock().await.hunts().to_vec())
}

pub async fn create_hunt(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<HuntRecord>) {
    let input = HuntInput::from_json(&body).redacted();
    let record = state.store.lock().await.add_record(input).await;
    (StatusCode::CREATED, Json(record))
}

pub async fn remove_hunt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.store.lock().await.remove_record(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no hunt with id {id}")))
    }
}

pub async fn get_season(State(state): State<AppState>) -> Json<Season> {
    Json(state.store.lock().await.load_season().await)
}

pub async fn put_season(State(state): State<AppState>, Json(season): Json<Season>) -> Json<Season> {
    state.store.lock().await.save_season(season).await;
    Json(season)
}

pub async fn get_incognito(State(state): State<AppState>) -> Json<IncognitoState> {
    Json(IncognitoState {
        enabled: state.store.lock().await.incognito(),
    })
}

pub async fn put_incognito(
    State(state): State<AppState>,
    Json(payload): Json<IncognitoState>,
) -> Json<IncognitoState> {
    state.store.lock().await.set_incognito(payload.enabled).await;
    Json(payload)
}

pub async fn get_calendar(State(state): State<AppState>) -> Json<CalendarResponse> {
    let store = state.store.lock().await;
    let season = store.season();
    let days = aggregate_by_date(store.hunts());
    Json(CalendarResponse {
        season,
        months: build_calendar(&season, &days),
    })
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let store = state.store.lock().await;
    let response = match query.scope.as_deref().map(str::trim) {
        None | Some("") | Some("all") => SummaryResponse {
            scope: "all",
            totals: season_totals(store.hunts()),
        },
        Some("season") => SummaryResponse {
            scope: "season",
            totals: season_totals_within(store.hunts(), &store.season()),
        },
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "scope must be 'all' or 'season', got '{other}'"
            )))
        }
    };
    Ok(Json(response))
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(AppError::bad_request("coordinates out of range"));
    }
    let summary = state
        .weather
        .current_summary(Coordinates {
            latitude: query.lat,
            longitude: query.lon,
        })
        .await;
    Ok(Json(WeatherResponse { summary }))
}

fn redirect_to(tab: Tab) -> Redirect {
    Redirect::to(&format!("/?tab={}", tab.key()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
