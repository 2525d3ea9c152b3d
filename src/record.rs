// Record Builder
// Flattens a validated registrant plus guest rows into one store record

use crate::form::YesNo;
use crate::guests::GuestList;
use crate::validation::ValidRegistrant;
use serde::{Deserialize, Serialize};

/// Guest as persisted inside the `misafirler` text column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestEntry {
    pub isim: String,
    pub yas: u8,
}

/// One row in the registrations table. Field names are the store's column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    #[serde(rename = "isim_soyisim")]
    pub full_name: String,

    #[serde(rename = "yas")]
    pub age: u8,

    /// Country code and number, no separator
    #[serde(rename = "telefon_numarasi")]
    pub phone: String,

    #[serde(rename = "darka_uyesi")]
    pub club_member: YesNo,

    #[serde(rename = "misafir_durumu")]
    pub has_guests: YesNo,

    /// Compact JSON array of [`GuestEntry`], `[]` when there are none
    #[serde(rename = "misafirler")]
    pub guests: String,
}

impl RegistrationRecord {
    pub fn guest_entries(&self) -> serde_json::Result<Vec<GuestEntry>> {
        serde_json::from_str(&self.guests)
    }
}

/// Named guest rows, lower-cased. Rows whose trimmed name is empty are skipped.
pub fn collect_guests(guests: &GuestList) -> Vec<GuestEntry> {
    guests
        .slots()
        .iter()
        .filter_map(|slot| {
            let name = slot.name.trim();
            if name.is_empty() {
                None
            } else {
                Some(GuestEntry {
                    isim: name.to_lowercase(),
                    yas: slot.age,
                })
            }
        })
        .collect()
}

pub fn build_record(
    valid: &ValidRegistrant<'_>,
    guests: &GuestList,
) -> serde_json::Result<RegistrationRecord> {
    let registrant = valid.registrant;

    // Rows only count while the guest section is shown
    let entries = if registrant.has_guests.is_yes() {
        collect_guests(guests)
    } else {
        Vec::new()
    };

    Ok(RegistrationRecord {
        full_name: registrant.full_name.clone(),
        age: valid.age,
        phone: format!("{}{}", registrant.country_code, registrant.phone),
        club_member: registrant.club_member,
        has_guests: registrant.has_guests,
        guests: serde_json::to_string(&entries)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Registrant;
    use crate::validation::validate_registrant;

    fn create_test_registrant(has_guests: YesNo) -> Registrant {
        Registrant {
            full_name: "Ali Veli".to_string(),
            age: Some(30),
            country_code: "+90".to_string(),
            phone: "5551234567".to_string(),
            club_member: YesNo::Yes,
            has_guests,
        }
    }

    #[test]
    fn test_guest_name_trimmed_and_lowercased() {
        let mut guests = GuestList::new();
        guests.add();
        guests.set_name(0, "  Ayşe Yılmaz ");
        guests.set_age(0, 7);

        let entries = collect_guests(&guests);
        assert_eq!(
            entries,
            vec![GuestEntry {
                isim: "ayşe yılmaz".to_string(),
                yas: 7
            }]
        );
    }

    #[test]
    fn test_whitespace_only_guest_omitted() {
        let mut guests = GuestList::new();
        guests.add();
        guests.set_name(0, "   ");
        guests.add();
        guests.set_name(1, "Can");

        let entries = collect_guests(&guests);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].isim, "can");
        assert_eq!(entries[0].yas, 0);
    }

    #[test]
    fn test_record_without_guests() {
        let registrant = create_test_registrant(YesNo::No);
        let valid = validate_registrant(&registrant).unwrap();

        let record = build_record(&valid, &GuestList::new()).unwrap();

        assert_eq!(record.phone, "+905551234567");
        assert_eq!(record.guests, "[]");
        assert_eq!(record.age, 30);
        assert_eq!(record.club_member, YesNo::Yes);
    }

    #[test]
    fn test_guest_json_keeps_non_ascii() {
        let registrant = create_test_registrant(YesNo::Yes);
        let valid = validate_registrant(&registrant).unwrap();
        let mut guests = GuestList::new();
        guests.add();
        guests.set_name(0, "Ayşe");
        guests.set_age(0, 5);

        let record = build_record(&valid, &guests).unwrap();

        assert_eq!(record.guests, r#"[{"isim":"ayşe","yas":5}]"#);
        assert_eq!(record.guest_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_record_serializes_with_store_columns() {
        let registrant = create_test_registrant(YesNo::No);
        let valid = validate_registrant(&registrant).unwrap();
        let record = build_record(&valid, &GuestList::new()).unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["isim_soyisim"], "Ali Veli");
        assert_eq!(value["yas"], 30);
        assert_eq!(value["telefon_numarasi"], "+905551234567");
        assert_eq!(value["darka_uyesi"], "Evet");
        assert_eq!(value["misafir_durumu"], "Hayır");
        assert_eq!(value["misafirler"], "[]");
    }
}
