// Event Registration - Core Library
// Exposes the form logic for the terminal form, the web server, and tests

pub mod config;
pub mod form;
pub mod guests;
pub mod labels;
pub mod logging;
pub mod record;
pub mod session;
pub mod store;
pub mod submission;
pub mod validation;

// Only compile the web front end when the server feature is enabled
#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::{Backend, Config};
pub use form::{parse_age, parse_guest_age, Registrant, YesNo};
pub use guests::{GuestList, GuestSlot};
pub use record::{build_record, collect_guests, GuestEntry, RegistrationRecord};
pub use session::{handle_event, Effect, Event, Notice, Session, View};
pub use store::{AirtableStore, CreatedRecord, RecordStore, SqliteStore, StoreError};
pub use submission::{Registrar, SubmissionError};
pub use validation::{validate_registrant, ValidRegistrant, ValidationError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
