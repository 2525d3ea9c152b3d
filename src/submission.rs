// Submission flow
// Runs session transitions and carries out their store writes

use crate::session::{handle_event, Effect, Event, Session};
use crate::store::{RecordStore, StoreError};
use crate::validation::ValidationError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Kayıt verisi hazırlanamadı: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Kayıt sırasında hata oluştu: {0}")]
    Store(#[from] StoreError),

    #[error("Kayıt oluşturuldu ancak kayıt numarası alınamadı.")]
    MissingIdentifier,
}

/// Drives one session against a record store.
///
/// Each call is one cycle: the event is applied, and a submit blocks on the
/// store write before the outcome is fed back. No retry.
pub struct Registrar {
    store: Arc<dyn RecordStore>,
    confirmation_field: String,
}

impl Registrar {
    pub fn new(store: Arc<dyn RecordStore>, confirmation_field: impl Into<String>) -> Self {
        Self {
            store,
            confirmation_field: confirmation_field.into(),
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub async fn dispatch(&self, session: Session, event: Event) -> Session {
        let (session, effect) = handle_event(session, event);

        match effect {
            None => session,
            Some(Effect::Persist(record)) => {
                info!(store = self.store.name(), "writing registration");

                let outcome = match self.store.create(&record).await {
                    Ok(created) => Ok(created.identifier(&self.confirmation_field)),
                    Err(e) => {
                        error!(store = self.store.name(), error = %e, "store write failed");
                        Err(e)
                    }
                };

                handle_event(session, Event::WriteFinished(outcome)).0
            }
        }
    }

    pub async fn dispatch_all(&self, session: Session, events: Vec<Event>) -> Session {
        let mut session = session;
        for event in events {
            session = self.dispatch(session, event).await;
        }
        session
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::YesNo;
    use crate::session::{Notice, View};
    use crate::store::testing::RecordingStore;
    use crate::store::{CreatedRecord, SqliteStore};

    fn participant_events(phone: &str) -> Vec<Event> {
        vec![
            Event::FullName("Ali Veli".to_string()),
            Event::Age(Some(30)),
            Event::CountryCode("+90".to_string()),
            Event::Phone(phone.to_string()),
            Event::ClubMember(YesNo::Yes),
        ]
    }

    #[tokio::test]
    async fn test_scenario_no_guests() {
        let store = Arc::new(RecordingStore::returning_id("rec1"));
        let registrar = Registrar::new(store.clone(), "id");

        let mut events = participant_events("5551234567");
        events.push(Event::HasGuests(YesNo::No));
        events.push(Event::Submit);
        let session = registrar.dispatch_all(Session::new(), events).await;

        let record = store.last_record().unwrap();
        assert_eq!(record.phone, "+905551234567");
        assert_eq!(record.guests, "[]");
        assert_eq!(record.club_member, YesNo::Yes);
        assert_eq!(session.confirmation_id(), Some("rec1"));
    }

    #[tokio::test]
    async fn test_scenario_one_named_guest() {
        let store = Arc::new(RecordingStore::returning_id("rec2"));
        let registrar = Registrar::new(store.clone(), "id");

        let mut events = participant_events("5551234567");
        events.extend([
            Event::HasGuests(YesNo::Yes),
            Event::AddGuest,
            Event::AddGuest,
            Event::GuestName(0, "Ayşe".to_string()),
            Event::GuestAge(0, 5),
            Event::GuestName(1, String::new()),
            Event::Submit,
        ]);
        registrar.dispatch_all(Session::new(), events).await;

        let entries = store.last_record().unwrap().guest_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].isim, "ayşe");
        assert_eq!(entries[0].yas, 5);
    }

    #[tokio::test]
    async fn test_scenario_bad_phone_never_reaches_store() {
        let store = Arc::new(RecordingStore::returning_id("rec3"));
        let registrar = Registrar::new(store.clone(), "id");

        let mut events = participant_events("123");
        events.push(Event::Submit);
        let session = registrar.dispatch_all(Session::new(), events).await;

        assert_eq!(store.calls(), 0);
        assert_eq!(
            session.notice(),
            Some(&Notice::Error(ValidationError::InvalidPhoneFormat.to_string()))
        );
    }

    #[tokio::test]
    async fn test_scenario_confirmation_number() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        for _ in 0..41 {
            store
                .insert(&crate::record::RegistrationRecord {
                    full_name: "Önceki".to_string(),
                    age: 40,
                    phone: "+905550000000".to_string(),
                    club_member: YesNo::No,
                    has_guests: YesNo::No,
                    guests: "[]".to_string(),
                })
                .unwrap();
        }
        let registrar = Registrar::new(store.clone(), "id");

        let mut events = participant_events("5551234567");
        events.push(Event::Submit);
        let session = registrar.dispatch_all(Session::new(), events).await;

        assert_eq!(session.view(), &View::Confirmation("42".to_string()));
        assert_eq!(store.count().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_message() {
        let store = Arc::new(RecordingStore::failing("INVALID_PERMISSIONS"));
        let registrar = Registrar::new(store.clone(), "id");

        let mut events = participant_events("5551234567");
        events.push(Event::Submit);
        let session = registrar.dispatch_all(Session::new(), events).await;

        assert_eq!(store.calls(), 1);
        assert_eq!(session.view(), &View::Form);
        match session.notice() {
            Some(Notice::Error(message)) => {
                assert!(message.starts_with("Kayıt sırasında hata oluştu"));
                assert!(message.contains("INVALID_PERMISSIONS"));
            }
            other => panic!("unexpected notice: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_configured_field_reports_missing_identifier() {
        let store = Arc::new(RecordingStore::with_reply(Ok(CreatedRecord {
            id: "rec9".to_string(),
            ..CreatedRecord::default()
        })));
        let registrar = Registrar::new(store, "Kayit No");

        let mut events = participant_events("5551234567");
        events.push(Event::Submit);
        let session = registrar.dispatch_all(Session::new(), events).await;

        assert!(!session.is_confirmed());
        assert_eq!(
            session.notice(),
            Some(&Notice::Error(SubmissionError::MissingIdentifier.to_string()))
        );
    }
}
