use crate::aggregate::{aggregate_by_date, season_totals, season_totals_within};
use crate::calendar::{build_calendar, month_label, WEEKDAY_LABELS};
use crate::input::SPECIES_FIELD_PREFIX;
use crate::models::{
    CalendarCell, HuntRecord, Season, SeasonTotals, Visibility, FLYWAYS, SPECIES_OPTIONS, STATES,
};
use chrono::{Datelike, NaiveDate};

const CUSTOM_SPECIES_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Hunts,
    Season,
    Summary,
    About,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Hunts, Tab::Season, Tab::Summary, Tab::About];

    /// Unknown or missing values select the hunt log.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("season") => Tab::Season,
            Some("summary") => Tab::Summary,
            Some("about") => Tab::About,
            _ => Tab::Hunts,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Tab::Hunts => "hunts",
            Tab::Season => "season",
            Tab::Summary => "summary",
            Tab::About => "about",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Hunts => "Hunt Log",
            Tab::Season => "Season Calendar",
            Tab::Summary => "Summary",
            Tab::About => "About",
        }
    }
}

/// Everything a page render needs, handed over explicitly by the handler.
pub struct ViewContext<'a> {
    pub tab: Tab,
    pub today: NaiveDate,
    pub incognito: bool,
    pub hunts: &'a [HuntRecord],
    pub season: Season,
}

pub fn render_page(view: &ViewContext<'_>) -> String {
    let content = match view.tab {
        Tab::Hunts => render_hunts_tab(view),
        Tab::Season => render_season_tab(view),
        Tab::Summary => render_summary_tab(view),
        Tab::About => render_about_tab(),
    };
    PAGE_HTML
        .replace("{{TAB}}", view.tab.key())
        .replace("{{INCOGNITO_CHECKED}}", checked(view.incognito))
        .replace(
            "{{INCOGNITO_BADGE}}",
            if view.incognito {
                r#"<span class="badge private">Incognito on</span>"#
            } else {
                ""
            },
        )
        .replace("{{NAV}}", &render_nav(view.tab))
        .replace("{{YEAR}}", &view.today.year().to_string())
        .replace("{{CONTENT}}", &content)
}

fn render_nav(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let class = if *tab == active { "tab active" } else { "tab" };
            format!(
                r#"<a class="{class}" href="/?tab={key}" role="tab" aria-selected="{selected}">{label}</a>"#,
                key = tab.key(),
                selected = *tab == active,
                label = tab.label(),
            )
        })
        .collect()
}

fn render_hunts_tab(view: &ViewContext<'_>) -> String {
    let flyways = options(&FLYWAYS, "Mississippi");
    let states = options(&STATES, "AR");
    let species_inputs: String = SPECIES_OPTIONS
        .iter()
        .map(|name| {
            format!(
                r#"<label class="chip"><span>{label}</span><input type="number" name="{prefix}{field}" min="0" step="1" placeholder="0" /></label>"#,
                label = escape(name),
                prefix = SPECIES_FIELD_PREFIX,
                field = escape(name),
            )
        })
        .collect();
    let custom_rows: String = (0..CUSTOM_SPECIES_ROWS)
        .map(|_| {
            r#"<div class="row">
          <input name="custom_species" placeholder="Add custom species" />
          <input name="custom_count" type="number" min="0" step="1" placeholder="Count" />
        </div>"#
        })
        .collect();
    let (public_checked, private_checked) = if view.incognito {
        ("", "checked")
    } else {
        ("checked", "")
    };

    let list = if view.hunts.is_empty() {
        r#"<p class="hint">No hunts logged yet.</p>"#.to_string()
    } else {
        view.hunts.iter().map(render_hunt).collect()
    };

    format!(
        r##"<section class="columns">
  <div class="card">
    <h2>Log a Hunt</h2>
    <p class="subtitle">Flyway, state, weather (auto), species counts, hunters, optional pin.</p>
    <form class="hunt-form" method="post" action="/hunts">
      <input name="date" type="date" value="{today}" required />
      <div class="row">
        <select name="flyway">{flyways}</select>
        <select name="state">{states}</select>
      </div>
      <div class="row">
        <input name="weather" id="weather-field" placeholder="Weather (e.g., 42°F, overcast, 12 mph N)" />
        <button type="button" class="secondary" id="weather-btn">Auto-fill</button>
      </div>
      <div class="inline-error" id="weather-error"></div>
      <fieldset>
        <legend>Species &amp; counts</legend>
        <div class="chips">{species_inputs}</div>
        {custom_rows}
        <div class="row">
          <input name="species" placeholder="Species (legacy)" />
          <input name="count" type="number" min="0" step="1" placeholder="Total birds" />
        </div>
      </fieldset>
      <div class="row">
        <input name="hunters" type="number" min="1" step="1" value="1" placeholder="# of hunters" />
        <input name="spot" placeholder="Spot name (optional)" />
      </div>
      <div class="row">
        <input name="lat" id="lat" placeholder="Latitude (optional)" />
        <input name="lng" id="lng" placeholder="Longitude (optional)" />
      </div>
      <button type="button" class="secondary" id="gps-btn">Use GPS</button>
      <div class="row radios">
        <label><input type="radio" name="visibility" value="public" {public_checked} /> Public</label>
        <label><input type="radio" name="visibility" value="private" {private_checked} /> Incognito</label>
      </div>
      <textarea name="notes" rows="3" placeholder="Notes (spread, water, pressure, fronts)"></textarea>
      <button type="submit" class="primary">Save Hunt</button>
    </form>
  </div>
  <div class="card">
    <h2>My Hunts</h2>
    <p class="subtitle">{count} logged</p>
    <div class="hunt-list">{list}</div>
  </div>
</section>
{script}"##,
        today = view.today,
        count = view.hunts.len(),
        script = HUNT_FORM_SCRIPT,
    )
}

fn render_hunt(hunt: &HuntRecord) -> String {
    let spot = hunt
        .spot_label
        .as_deref()
        .map(|spot| format!(r#"<span>📍 {}</span>"#, escape(spot)))
        .unwrap_or_default();
    let notes = if hunt.notes.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="notes">{}</p>"#, escape(&hunt.notes))
    };
    let badge_class = match hunt.visibility {
        Visibility::Public => "badge",
        Visibility::Private => "badge private",
    };
    format!(
        r#"<article class="hunt">
  <div class="hunt-head"><strong>{date} · {state} • {flyway}</strong><span class="{badge_class}">{visibility}</span></div>
  <div class="hunt-meta"><span>🌡 {weather}</span>{spot}<span>🦆 {species} • Hunters: {hunters} • Total: {total}</span></div>
  {notes}
  <form method="post" action="/hunts/{id}/delete"><button type="submit" class="danger">Remove</button></form>
</article>"#,
        date = hunt.date,
        state = escape(&hunt.subregion),
        flyway = escape(&hunt.region),
        visibility = hunt.visibility.as_str(),
        weather = escape(&hunt.weather_summary),
        species = escape(&hunt.tally.describe()),
        hunters = hunt.hunter_count,
        total = hunt.total(),
        id = hunt.id,
    )
}

fn render_season_tab(view: &ViewContext<'_>) -> String {
    let days = aggregate_by_date(view.hunts);
    let months = build_calendar(&view.season, &days);

    let calendar = if months.is_empty() {
        r#"<p class="hint">The season ends before it starts; nothing to show.</p>"#.to_string()
    } else {
        months
            .iter()
            .map(|month| {
                let header: String = WEEKDAY_LABELS
                    .iter()
                    .map(|day| format!(r#"<div class="weekday">{day}</div>"#))
                    .collect();
                let cells: String = month.cells.iter().map(render_cell).collect();
                format!(
                    r#"<div class="month"><h3>{label}</h3><div class="grid">{header}{cells}</div></div>"#,
                    label = month.label,
                )
            })
            .collect()
    };

    format!(
        r#"<section class="columns">
  <div class="card">
    <h2>Season Dates</h2>
    <p class="subtitle">Choose your duck season range.</p>
    <form class="row" method="post" action="/season">
      <label>Start <input type="date" name="start" value="{start}" /></label>
      <label>End <input type="date" name="end" value="{end}" /></label>
      <button type="submit" class="secondary">Save</button>
    </form>
    <p class="hint">Days with hunts are highlighted with totals and top species.</p>
  </div>
  <div class="card wide">
    <h2>Calendar</h2>
    <p class="subtitle">{first} — {last}</p>
    {calendar}
  </div>
</section>"#,
        start = view.season.start,
        end = view.season.end,
        first = month_label(view.season.start),
        last = month_label(view.season.end),
    )
}

fn render_cell(cell: &CalendarCell) -> String {
    match cell {
        CalendarCell::Placeholder => r#"<div class="cell empty"></div>"#.to_string(),
        CalendarCell::Day {
            day,
            total: Some(total),
            top_species,
            ..
        } => format!(
            r#"<div class="cell hunted"><span class="day">{day}</span><strong>{total} birds</strong><span class="top">{top}</span></div>"#,
            top = escape(top_species.as_deref().unwrap_or_default()),
        ),
        CalendarCell::Day { day, .. } => {
            format!(r#"<div class="cell"><span class="day">{day}</span></div>"#)
        }
    }
}

fn render_summary_tab(view: &ViewContext<'_>) -> String {
    if view.hunts.is_empty() {
        return r#"<section class="card"><h2>Season Summary</h2><p class="hint">Log hunts to see stats.</p></section>"#
            .to_string();
    }
    let all = season_totals(view.hunts);
    let in_season = season_totals_within(view.hunts, &view.season);
    format!(
        r#"<section class="card">
  <h2>Season Summary</h2>
  <p class="subtitle">Local rollups from your logs.</p>
  <h3>All hunts</h3>
  {all}
  <h3>{start} to {end}</h3>
  {in_season}
</section>"#,
        all = render_totals(&all),
        in_season = render_totals(&in_season),
        start = view.season.start,
        end = view.season.end,
    )
}

fn render_totals(totals: &SeasonTotals) -> String {
    format!(
        r#"<div class="panel">
    <div class="stat"><span class="label">Total Birds</span><span class="value">{birds}</span></div>
    <div class="stat"><span class="label">Hunts Logged</span><span class="value">{hunts}</span></div>
    <div class="stat"><span class="label">Top Species</span><span class="value">{top}</span></div>
  </div>"#,
        birds = totals.total_birds,
        hunts = totals.hunts,
        top = escape(totals.top_species.as_deref().unwrap_or("—")),
    )
}

fn render_about_tab() -> String {
    r#"<section class="card">
  <h2>About Incognito Mode</h2>
  <p class="subtitle">Your spots stay quiet; signals roll up to flyway/state bins only.</p>
  <ul>
    <li>Incognito entries never store coordinates or spot names.</li>
    <li>Weather auto-fill uses browser geolocation and Open-Meteo.</li>
    <li>The calendar shows daily totals and top species for your chosen season window.</li>
  </ul>
</section>"#
        .to_string()
}

fn options(values: &[&str], selected: &str) -> String {
    values
        .iter()
        .map(|value| {
            let attr = if *value == selected { " selected" } else { "" };
            format!(r#"<option value="{value}"{attr}>{value}</option>"#)
        })
        .collect()
}

fn checked(on: bool) -> &'static str {
    if on {
        "checked"
    } else {
        ""
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const HUNT_FORM_SCRIPT: &str = r#"<script>
    const weatherBtn = document.getElementById('weather-btn');
    const weatherField = document.getElementById('weather-field');
    const weatherError = document.getElementById('weather-error');
    const gpsBtn = document.getElementById('gps-btn');
    const latEl = document.getElementById('lat');
    const lngEl = document.getElementById('lng');
    const geoOptions = { enableHighAccuracy: true, timeout: 12000 };

    const locate = () => new Promise((resolve, reject) => {
      if (!navigator.geolocation) {
        reject(new Error('Geolocation not supported'));
        return;
      }
      navigator.geolocation.getCurrentPosition(resolve, reject, geoOptions);
    });

    const fetchWeather = async () => {
      try {
        const pos = await locate();
        const params = new URLSearchParams({
          lat: pos.coords.latitude.toFixed(4),
          lon: pos.coords.longitude.toFixed(4)
        });
        const res = await fetch(`/api/weather?${params}`);
        if (!res.ok) {
          return '';
        }
        return (await res.json()).summary || '';
      } catch (err) {
        return '';
      }
    };

    weatherBtn.addEventListener('click', async () => {
      weatherBtn.disabled = true;
      weatherBtn.textContent = 'Fetching...';
      weatherError.textContent = '';
      const summary = await fetchWeather();
      weatherBtn.disabled = false;
      weatherBtn.textContent = 'Auto-fill';
      if (!summary) {
        weatherError.textContent = "Couldn't fetch weather. Enter it manually.";
        return;
      }
      weatherField.value = summary;
    });

    gpsBtn.addEventListener('click', () => {
      if (!navigator.geolocation) {
        alert('Geolocation not supported');
        return;
      }
      navigator.geolocation.getCurrentPosition((pos) => {
        latEl.value = pos.coords.latitude.toFixed(6);
        lngEl.value = pos.coords.longitude.toFixed(6);
      }, () => alert('Could not get location'), geoOptions);
    });
  </script>"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Migration Tracker</title>
  <style>
    :root {
      --bg: #f4f2ec;
      --ink: #1f2a24;
      --muted: #68736c;
      --accent: #3c6e47;
      --accent-soft: #e3efe4;
      --danger: #b3412f;
      --card: #ffffff;
      --line: rgba(31, 42, 36, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    header.top {
      position: sticky;
      top: 0;
      display: flex;
      align-items: center;
      gap: 12px;
      padding: 12px 24px;
      background: rgba(255, 255, 255, 0.9);
      border-bottom: 1px solid var(--line);
    }

    header.top h1 {
      margin: 0;
      font-size: 1.2rem;
    }

    header.top form {
      margin-left: auto;
      display: flex;
      align-items: center;
      gap: 8px;
    }

    main {
      width: min(1100px, 100%);
      margin: 24px auto 72px;
      padding: 0 16px;
      display: grid;
      gap: 16px;
    }

    nav.tabs {
      display: grid;
      grid-template-columns: repeat(4, 1fr);
      gap: 6px;
      padding: 6px;
      background: rgba(31, 42, 36, 0.06);
      border-radius: 12px;
    }

    .tab {
      text-align: center;
      padding: 8px 12px;
      border-radius: 8px;
      color: var(--muted);
      font-weight: 600;
      text-decoration: none;
    }

    .tab.active {
      background: white;
      color: var(--ink);
    }

    .columns {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 16px;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 20px;
    }

    .card h2 {
      margin: 0;
    }

    .subtitle,
    .hint {
      margin: 4px 0 12px;
      color: var(--muted);
      font-size: 0.9rem;
    }

    .hunt-form {
      display: grid;
      gap: 10px;
    }

    .row {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    .row > * {
      flex: 1;
    }

    input,
    select,
    textarea {
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 8px 10px;
      font: inherit;
    }

    fieldset {
      border: 1px solid var(--line);
      border-radius: 12px;
      display: grid;
      gap: 8px;
    }

    .chips {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(150px, 1fr));
      gap: 6px;
    }

    .chip {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 6px;
      font-size: 0.85rem;
    }

    .chip input {
      width: 64px;
    }

    button {
      border: none;
      border-radius: 8px;
      padding: 10px 14px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
    }

    button.primary {
      background: var(--accent);
      color: white;
    }

    button.secondary {
      background: var(--accent-soft);
      color: var(--accent);
      flex: 0 0 auto;
    }

    button.danger {
      background: var(--danger);
      color: white;
      padding: 6px 10px;
      font-size: 0.85rem;
    }

    button:disabled {
      opacity: 0.6;
    }

    .inline-error {
      color: var(--danger);
      font-size: 0.8rem;
      min-height: 1em;
    }

    .hunt-list {
      display: grid;
      gap: 10px;
      max-height: 560px;
      overflow: auto;
    }

    .hunt {
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 12px;
      display: grid;
      gap: 6px;
    }

    .hunt-head {
      display: flex;
      justify-content: space-between;
    }

    .hunt-meta {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      font-size: 0.9rem;
      color: var(--muted);
    }

    .notes {
      margin: 0;
      font-size: 0.9rem;
    }

    .badge {
      font-size: 0.75rem;
      padding: 2px 8px;
      border-radius: 999px;
      background: var(--accent-soft);
      color: var(--accent);
    }

    .badge.private {
      background: #2f3a34;
      color: white;
    }

    .month h3 {
      margin: 16px 0 8px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 4px;
      font-size: 0.75rem;
    }

    .weekday {
      color: var(--muted);
      padding-bottom: 4px;
    }

    .cell {
      min-height: 72px;
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 4px;
      display: flex;
      flex-direction: column;
      gap: 2px;
    }

    .cell.empty {
      background: rgba(31, 42, 36, 0.03);
    }

    .cell.hunted {
      background: var(--accent-soft);
      border-color: rgba(60, 110, 71, 0.35);
    }

    .cell .top {
      overflow: hidden;
      text-overflow: ellipsis;
      white-space: nowrap;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 12px;
    }

    .stat {
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 12px;
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 800;
    }

    footer {
      border-top: 1px solid var(--line);
      padding: 20px;
      text-align: center;
      color: var(--muted);
      font-size: 0.85rem;
    }
  </style>
</head>
<body>
  <header class="top">
    <h1>Migration Tracker</h1>
    {{INCOGNITO_BADGE}}
    <form method="post" action="/incognito">
      <input type="hidden" name="tab" value="{{TAB}}" />
      <label for="incognito">Incognito Mode</label>
      <input type="checkbox" id="incognito" name="enabled" value="on" {{INCOGNITO_CHECKED}} onchange="this.form.submit()" />
    </form>
  </header>
  <main>
    <nav class="tabs" role="tablist">{{NAV}}</nav>
    {{CONTENT}}
  </main>
  <footer>© {{YEAR}} Migration Tracker</footer>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HuntInput;
    use indexmap::IndexMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 7).unwrap()
    }

    fn view<'a>(tab: Tab, hunts: &'a [HuntRecord]) -> ViewContext<'a> {
        ViewContext {
            tab,
            today: today(),
            incognito: false,
            hunts,
            season: Season::default_for(today()),
        }
    }

    fn hunt(notes: &str) -> HuntRecord {
        HuntInput {
            species_counts: IndexMap::from([("Mallard".to_string(), 3)]),
            notes: Some(notes.to_string()),
            ..HuntInput::default()
        }
        .into_record(today())
    }

    #[test]
    fn unknown_tab_falls_back_to_hunt_log() {
        assert_eq!(Tab::parse(Some("bogus")), Tab::Hunts);
        assert_eq!(Tab::parse(None), Tab::Hunts);
        assert_eq!(Tab::parse(Some("summary")), Tab::Summary);
    }

    #[test]
    fn hunt_notes_are_escaped() {
        let hunts = [hunt("<script>alert(1)</script>")];
        let html = render_page(&view(Tab::Hunts, &hunts));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("1 logged"));
    }

    #[test]
    fn season_tab_marks_hunted_days() {
        let hunts = [hunt("")];
        let html = render_page(&view(Tab::Season, &hunts));
        assert!(html.contains("November 2024"));
        assert!(html.contains("January 2025"));
        assert!(html.contains("3 birds"));
    }

    #[test]
    fn hunt_form_renders_every_field() {
        let html = render_page(&view(Tab::Hunts, &[]));
        assert!(html.contains(r##"placeholder="# of hunters""##));
        assert!(html.contains(r#"name="sc_Wood Duck""#));
        assert_eq!(html.matches(r#"name="custom_species""#).count(), 3);
        assert!(html.contains("Save Hunt"));
        assert!(html.contains("No hunts logged yet."));
    }

    #[test]
    fn summary_tab_without_hunts_prompts_for_logs() {
        let html = render_page(&view(Tab::Summary, &[]));
        assert!(html.contains("Log hunts to see stats."));
    }

    #[test]
    fn incognito_preselects_private_visibility() {
        let mut context = view(Tab::Hunts, &[]);
        context.incognito = true;
        let html = render_page(&context);
        assert!(html.contains(r#"value="private" checked"#));
        assert!(html.contains("Incognito on"));
    }
}
