// Web front end
// One page: GET renders, POST runs one cycle. `?id=` switches to the confirmation screen.

use crate::form::{parse_age, parse_guest_age, YesNo, MAX_AGE, MAX_GUEST_AGE, MIN_AGE, PHONE_LENGTH};
use crate::labels;
use crate::session::{Event, Notice, Session};
use crate::submission::Registrar;
use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_FIELD: &str = "oturum";
pub const ACTION_FIELD: &str = "action";

/// Upper bound on live sessions; least recently used ones go first
pub const MAX_SESSIONS: u64 = 10_000;

type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    sessions: Cache<Uuid, SessionHandle>,
    registrar: Arc<Registrar>,
}

impl AppState {
    /// Sessions untouched for `session_idle` are dropped
    pub fn new(registrar: Registrar, session_idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(session_idle)
            .build();

        Self {
            sessions,
            registrar: Arc::new(registrar),
        }
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }

    /// Session for a posted id; unknown, expired or malformed ids get a fresh session
    fn checkout(&self, posted: Option<&str>) -> (Uuid, SessionHandle) {
        let id = posted
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        let handle = self.sessions.get_with(id, || {
            debug!(session = %id, "new session");
            Arc::new(tokio::sync::Mutex::new(Session::new()))
        });

        (id, handle)
    }

    fn forget(&self, id: &Uuid) {
        self.sessions.invalidate(id);
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_page).post(run_cycle))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET / - Empty form, or the confirmation screen when `id` is present
async fn show_page(Query(query): Query<PageQuery>) -> Html<String> {
    match query.id {
        Some(id) => Html(render_confirmation(&id)),
        None => Html(render_form(&Uuid::new_v4(), &Session::new())),
    }
}

/// POST / - One render cycle
async fn run_cycle(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let (id, handle) = state.checkout(fields.get(SESSION_FIELD).map(String::as_str));

    let mut session = handle.lock().await;
    let current = std::mem::take(&mut *session);
    *session = state
        .registrar
        .dispatch_all(current, cycle_events(&fields))
        .await;

    let target = session
        .confirmation_id()
        .map(|confirmation| format!("/?id={}", urlencoding::encode(confirmation)));

    match target {
        Some(target) => {
            drop(session);
            state.forget(&id);
            Redirect::to(&target).into_response()
        }
        None => Html(render_form(&id, &session)).into_response(),
    }
}

// ============================================================================
// Form decoding
// ============================================================================

#[derive(Default)]
struct GuestInput<'a> {
    name: Option<&'a str>,
    age: Option<&'a str>,
}

/// Translate one posted form into the events of a cycle.
///
/// Order matters: the has-guests answer is applied before any guest row so a
/// yes-to-no switch purges rows first, and the button action comes last.
fn cycle_events(fields: &HashMap<String, String>) -> Vec<Event> {
    let mut events = Vec::new();

    if let Some(name) = fields.get("isim_soyisim") {
        events.push(Event::FullName(name.clone()));
    }
    if let Some(age) = fields.get("yas") {
        events.push(Event::Age(parse_age(age)));
    }
    if let Some(code) = fields.get("ulke_kodu") {
        events.push(Event::CountryCode(code.clone()));
    }
    if let Some(phone) = fields.get("telefon_numarasi") {
        events.push(Event::Phone(phone.clone()));
    }

    events.push(Event::ClubMember(choice(fields, "darka_uyesi")));
    events.push(Event::HasGuests(choice(fields, "misafir_durumu")));

    let mut guests: BTreeMap<usize, GuestInput<'_>> = BTreeMap::new();
    for (key, value) in fields {
        match parse_guest_key(key) {
            Some((index, "isim")) => guests.entry(index).or_default().name = Some(value.as_str()),
            Some((index, "yas")) => guests.entry(index).or_default().age = Some(value.as_str()),
            _ => {}
        }
    }
    for (index, input) in guests {
        if let Some(name) = input.name {
            events.push(Event::GuestName(index, name.to_string()));
        }
        if let Some(age) = input.age {
            events.push(Event::GuestAge(index, parse_guest_age(age)));
        }
    }

    match fields.get(ACTION_FIELD).map(String::as_str) {
        Some("add") => events.push(Event::AddGuest),
        Some("remove") => events.push(Event::RemoveGuest),
        Some("submit") => events.push(Event::Submit),
        _ => {}
    }

    events
}

fn choice(fields: &HashMap<String, String>, key: &str) -> YesNo {
    fields
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

/// `guest_3_isim` -> (3, "isim")
fn parse_guest_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("guest_")?;
    let (index, suffix) = rest.split_once('_')?;
    Some((index.parse().ok()?, suffix))
}

// ============================================================================
// Rendering
// ============================================================================

const STYLE: &str = "
body { font-family: system-ui, sans-serif; background: #f7f7f9; margin: 0; }
main { max-width: 720px; margin: 2rem auto; padding: 0 1rem; }
label, fieldset { display: block; margin: 1rem 0; }
input[type=text], input[type=number] { display: block; width: 100%; padding: .5rem; box-sizing: border-box; }
fieldset { border: none; padding: 0; }
.phone { display: grid; grid-template-columns: 20% 80%; gap: .5rem; }
.guest { display: grid; grid-template-columns: 60% 40%; gap: .5rem; }
.notice { padding: .75rem 1rem; border-radius: .5rem; }
.notice.error { background: #fde8e8; color: #9b1c1c; }
.notice.success { background: #e6f6ec; color: #1d6b3a; }
.default-action { position: absolute; left: -9999px; }
.confirmation { text-align: center; margin-top: 20vh; }
.confirmation .number { font-size: 8rem; font-weight: 700; margin: 1rem 0; }
";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"tr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape(labels::PAGE_TITLE),
    )
}

pub fn render_confirmation(id: &str) -> String {
    page(&format!(
        "<main class=\"confirmation\">\n<p class=\"heading\">{heading}</p>\n\
         <p class=\"number\">{id}</p>\n<p>{instructions}</p>\n</main>\n",
        heading = escape(labels::CONFIRMATION_HEADING),
        id = escape(id),
        instructions = escape(labels::CONFIRMATION_INSTRUCTIONS),
    ))
}

pub fn render_form(session_id: &Uuid, session: &Session) -> String {
    let registrant = &session.registrant;
    let mut html = String::new();

    html.push_str("<main>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(labels::FORM_TITLE)));

    match session.notice() {
        Some(Notice::Error(message)) => html.push_str(&format!(
            "<p class=\"notice error\">{}</p>\n",
            escape(message)
        )),
        Some(Notice::Success(message)) => html.push_str(&format!(
            "<p class=\"notice success\">{}</p>\n",
            escape(message)
        )),
        None => {}
    }

    html.push_str("<form method=\"post\" action=\"/\">\n");
    html.push_str(&format!(
        "<input type=\"hidden\" name=\"{SESSION_FIELD}\" value=\"{session_id}\">\n"
    ));
    // Enter in a text box re-renders instead of pressing the first visible button
    html.push_str(&format!(
        "<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"refresh\" class=\"default-action\" tabindex=\"-1\" aria-hidden=\"true\"></button>\n"
    ));

    html.push_str(&format!(
        "<label>{}<input type=\"text\" name=\"isim_soyisim\" value=\"{}\"></label>\n",
        escape(labels::FULL_NAME),
        escape(&registrant.full_name)
    ));
    html.push_str(&format!(
        "<label>{}<input type=\"number\" name=\"yas\" min=\"{MIN_AGE}\" max=\"{MAX_AGE}\" step=\"1\" value=\"{}\"></label>\n",
        escape(labels::AGE),
        registrant.age.map(|age| age.to_string()).unwrap_or_default()
    ));
    html.push_str(&format!(
        "<fieldset><legend>{}</legend><div class=\"phone\">\
         <input type=\"text\" name=\"ulke_kodu\" aria-label=\"{}\" value=\"{}\">\
         <input type=\"text\" name=\"telefon_numarasi\" maxlength=\"{PHONE_LENGTH}\" placeholder=\"{}\" value=\"{}\">\
         </div></fieldset>\n",
        escape(labels::PHONE),
        escape(labels::COUNTRY_CODE),
        escape(&registrant.country_code),
        escape(labels::PHONE_PLACEHOLDER),
        escape(&registrant.phone)
    ));

    html.push_str(&radio_pair(labels::CLUB_MEMBER, "darka_uyesi", registrant.club_member));
    html.push_str(&radio_pair(labels::HAS_GUESTS, "misafir_durumu", registrant.has_guests));

    if registrant.has_guests.is_yes() {
        html.push_str(&render_guest_section(session));
    }

    html.push_str(&format!(
        "<hr>\n<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"submit\">{}</button>\n",
        escape(labels::SUBMIT)
    ));
    html.push_str("</form>\n</main>\n");

    page(&html)
}

fn render_guest_section(session: &Session) -> String {
    let mut html = String::new();

    html.push_str(&format!("<h2>{}</h2>\n<div>", escape(labels::GUEST_SECTION)));
    html.push_str(&format!(
        "<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"add\">{}</button> ",
        escape(labels::ADD_GUEST)
    ));
    let disabled = if session.guests.is_empty() { " disabled" } else { "" };
    html.push_str(&format!(
        "<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"remove\"{disabled}>{}</button>",
        escape(labels::REMOVE_GUEST)
    ));
    html.push_str("</div>\n");

    for (index, slot) in session.guests.slots().iter().enumerate() {
        html.push_str(&format!(
            "<div class=\"guest\">\
             <label>{}<input type=\"text\" name=\"guest_{index}_isim\" value=\"{}\"></label>\
             <label>{}<input type=\"number\" name=\"guest_{index}_yas\" min=\"0\" max=\"{MAX_GUEST_AGE}\" step=\"1\" value=\"{}\"></label>\
             </div>\n",
            escape(&labels::guest_name(index)),
            escape(&slot.name),
            escape(&labels::guest_age(index)),
            slot.age
        ));
    }

    html
}

/// Radios re-render the page on change so the guest section can appear
fn radio_pair(legend: &str, name: &str, selected: YesNo) -> String {
    let option = |choice: YesNo| {
        let checked = if choice == selected { " checked" } else { "" };
        format!(
            "<label style=\"display:inline\"><input type=\"radio\" name=\"{name}\" value=\"{label}\" onchange=\"this.form.submit()\"{checked}> {label}</label> ",
            label = choice.label()
        )
    };

    format!(
        "<fieldset><legend>{}</legend>{}{}</fieldset>\n",
        escape(legend),
        option(YesNo::Yes),
        option(YesNo::No)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
