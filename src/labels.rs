// Page text shared by the web and terminal renderers

pub const PAGE_TITLE: &str = "Event Kayıt";
pub const FORM_TITLE: &str = "Event Kayıt Formu";

pub const FULL_NAME: &str = "İsim Soyisim *";
pub const AGE: &str = "Yaşınız *";
pub const PHONE: &str = "Telefon Numarası *";
pub const COUNTRY_CODE: &str = "Ülke Kodu";
pub const PHONE_PLACEHOLDER: &str = "5XX XXX XX XX";
pub const CLUB_MEMBER: &str = "Darka Spor Kulübü Üyesi misiniz? *";
pub const HAS_GUESTS: &str = "Misafir/Çocuklarınızla mı katılıyorsunuz? *";

pub const GUEST_SECTION: &str = "Misafir/Çocuk Bilgileri";
pub const ADD_GUEST: &str = "➕ Ekle";
pub const REMOVE_GUEST: &str = "➖ Sil";
pub const SUBMIT: &str = "Kaydı Tamamla";

pub const CONFIRMATION_HEADING: &str = "Kayıt Numaranız";
pub const CONFIRMATION_INSTRUCTIONS: &str =
    "Lütfen bu numarayı not alın ve etkinlik girişinde görevliye gösterin.";

pub fn guest_name(index: usize) -> String {
    format!("Misafir {} İsim Soyisim", index + 1)
}

pub fn guest_age(index: usize) -> String {
    format!("Misafir {} Yaş", index + 1)
}
