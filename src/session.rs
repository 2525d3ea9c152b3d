// Session state machine
// One browsing session: entered values, guest rows, current view.
// `handle_event` is the whole render-cycle logic; renderers only read the result.

use crate::form::{Registrant, YesNo};
use crate::guests::GuestList;
use crate::record::{build_record, RegistrationRecord};
use crate::store::StoreError;
use crate::submission::SubmissionError;
use crate::validation::validate_registrant;
use tracing::{debug, info, warn};

pub const SUCCESS_MESSAGE: &str = "Kaydınız başarıyla kaydedildi!";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Form,
    /// Terminal for the session; only external navigation leaves it
    Confirmation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

#[derive(Debug)]
pub enum Event {
    FullName(String),
    Age(Option<u8>),
    CountryCode(String),
    Phone(String),
    ClubMember(YesNo),
    HasGuests(YesNo),
    GuestName(usize, String),
    GuestAge(usize, u8),
    AddGuest,
    RemoveGuest,
    Submit,
    /// Outcome of a store write: the extracted identifier, if any
    WriteFinished(Result<Option<String>, StoreError>),
    /// The addressable `id` parameter as the page currently sees it
    Navigate(Option<String>),
}

/// Work the driver has to do outside the pure transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist(RegistrationRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub registrant: Registrant,
    pub guests: GuestList,
    previous_has_guests: YesNo,
    view: View,
    notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session opened through a link that already carries an identifier
    pub fn with_identifier(id: Option<String>) -> Self {
        handle_event(Self::new(), Event::Navigate(id)).0
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn confirmation_id(&self) -> Option<&str> {
        match &self.view {
            View::Confirmation(id) => Some(id),
            View::Form => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmation_id().is_some()
    }

    fn set_has_guests(&mut self, current: YesNo) {
        // Purge before any slot values of this cycle are applied
        if self.guests.reset_on_flag_change(self.previous_has_guests, current) {
            debug!("guest answer switched to no, guest rows cleared");
        }
        self.previous_has_guests = current;
        self.registrant.has_guests = current;
    }

    fn fail(&mut self, error: SubmissionError) {
        warn!(%error, "submission failed");
        self.notice = Some(Notice::Error(error.to_string()));
    }
}

/// Apply one user interaction (or a store outcome) to the session.
pub fn handle_event(mut session: Session, event: Event) -> (Session, Option<Effect>) {
    if let Event::Navigate(id) = event {
        session.view = match id {
            Some(id) => View::Confirmation(id),
            None => View::Form,
        };
        return (session, None);
    }

    // The confirmation screen takes no further input
    if session.is_confirmed() {
        return (session, None);
    }

    if !matches!(event, Event::WriteFinished(_)) {
        session.notice = None;
    }

    let guests_shown = session.registrant.has_guests.is_yes();

    match event {
        Event::FullName(name) => session.registrant.full_name = name,
        Event::Age(age) => session.registrant.age = age,
        Event::CountryCode(code) => session.registrant.country_code = code,
        Event::Phone(phone) => session.registrant.phone = phone,
        Event::ClubMember(choice) => session.registrant.club_member = choice,
        Event::HasGuests(choice) => session.set_has_guests(choice),
        Event::GuestName(index, name) if guests_shown => {
            session.guests.set_name(index, name);
        }
        Event::GuestAge(index, age) if guests_shown => {
            session.guests.set_age(index, age);
        }
        Event::AddGuest if guests_shown => session.guests.add(),
        Event::RemoveGuest if guests_shown => {
            session.guests.remove();
        }
        Event::GuestName(..) | Event::GuestAge(..) | Event::AddGuest | Event::RemoveGuest => {}
        Event::Submit => return submit(session),
        Event::WriteFinished(Ok(Some(id))) => {
            info!(confirmation = %id, "registration stored");
            session.notice = Some(Notice::Success(SUCCESS_MESSAGE.to_string()));
            session.view = View::Confirmation(id);
        }
        Event::WriteFinished(Ok(None)) => session.fail(SubmissionError::MissingIdentifier),
        Event::WriteFinished(Err(e)) => session.fail(SubmissionError::Store(e)),
        Event::Navigate(_) => {}
    }

    (session, None)
}

fn submit(mut session: Session) -> (Session, Option<Effect>) {
    let record = match validate_registrant(&session.registrant) {
        Ok(valid) => build_record(&valid, &session.guests).map_err(SubmissionError::from),
        Err(e) => Err(SubmissionError::from(e)),
    };

    match record {
        Ok(record) => (session, Some(Effect::Persist(record))),
        Err(e) => {
            session.fail(e);
            (session, None)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
