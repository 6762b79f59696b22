//! Assistant phrasebook and gender synonym tables, keyed by language.
//!
//! Prompts and input matching read from the same tables so the words a
//! prompt suggests are always words the matcher accepts.

use hospital_gateway_cell::HospitalInfo;

use crate::models::{Gender, Language, MenuOption};

/// Shown before a language is chosen, so it carries all three.
pub const LANGUAGE_PROMPT: &str =
    "Please choose your language. / कृपया अपनी भाषा चुनें। / कृपया तुमची भाषा निवडा.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Welcome,
    MenuPrompt,
    PhonePrompt,
    InvalidPhone,
    PatientsFound,
    NamePrompt,
    DobPrompt,
    InvalidDob,
    GenderPrompt,
    InvalidGender,
    RegistrationFailed,
    DoctorPrompt,
    NoDoctors,
    DatePrompt,
    SlotPrompt,
    NoSlots,
    BookingFailed,
    BookingConfirmed,
    AlreadyBooked,
    ServiceUnavailable,
    NotUnderstood,
    ContactUnavailable,
    AddressLabel,
    PhoneLabel,
    EmailLabel,
    NewPatientLabel,
    BestMatchLabel,
    RetryLabel,
    MenuBookLabel,
    MenuHospitalInfoLabel,
    MenuContactLabel,
}

pub fn text(language: Language, key: MessageKey) -> &'static str {
    match language {
        Language::English => english(key),
        Language::Hindi => hindi(key),
        Language::Marathi => marathi(key),
    }
}

fn english(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Welcome => "Welcome! I can help you book an appointment or answer questions about the hospital.",
        MenuPrompt => "How can I help you today?",
        PhonePrompt => "Please enter your 10-digit mobile number.",
        InvalidPhone => "That doesn't look like a valid number. Please enter exactly 10 digits.",
        PatientsFound => "I found these patients registered with this number. Who is the appointment for?",
        NamePrompt => "Please tell me the patient's full name.",
        DobPrompt => "Please enter the date of birth (YYYY-MM-DD).",
        InvalidDob => "Please use the format YYYY-MM-DD, for example 1990-05-20.",
        GenderPrompt => "Please enter the gender (Male / Female / Other).",
        InvalidGender => "Sorry, I didn't get that. Please type Male, Female or Other.",
        RegistrationFailed => "Sorry, we couldn't complete the registration right now.",
        DoctorPrompt => "Please choose a doctor.",
        NoDoctors => "Sorry, no doctors are available for booking right now.",
        DatePrompt => "Please choose a date.",
        SlotPrompt => "Please choose a time slot.",
        NoSlots => "Sorry, there are no free slots on that date. You can choose another doctor or date.",
        BookingFailed => "Sorry, we couldn't book that slot. Please try another one.",
        BookingConfirmed => "Your appointment is confirmed!",
        AlreadyBooked => "You already have an appointment on this date.",
        ServiceUnavailable => "Sorry, something went wrong. Please try again in a moment.",
        NotUnderstood => "Sorry, I didn't understand that.",
        ContactUnavailable => "Contact details are not available right now.",
        AddressLabel => "Address",
        PhoneLabel => "Phone",
        EmailLabel => "Email",
        NewPatientLabel => "New patient",
        BestMatchLabel => "Any available doctor",
        RetryLabel => "Choose another doctor",
        MenuBookLabel => "Book an appointment",
        MenuHospitalInfoLabel => "Hospital information",
        MenuContactLabel => "Contact details",
    }
}

fn hindi(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Welcome => "स्वागत है! मैं अपॉइंटमेंट बुक करने या अस्पताल के बारे में जानकारी देने में आपकी मदद कर सकता हूँ।",
        MenuPrompt => "आज मैं आपकी क्या मदद कर सकता हूँ?",
        PhonePrompt => "कृपया अपना 10 अंकों का मोबाइल नंबर दर्ज करें।",
        InvalidPhone => "यह नंबर सही नहीं लगता। कृपया ठीक 10 अंक दर्ज करें।",
        PatientsFound => "इस नंबर पर ये मरीज़ पंजीकृत हैं। अपॉइंटमेंट किसके लिए है?",
        NamePrompt => "कृपया मरीज़ का पूरा नाम बताएं।",
        DobPrompt => "कृपया जन्म तिथि दर्ज करें (YYYY-MM-DD)।",
        InvalidDob => "कृपया YYYY-MM-DD प्रारूप का उपयोग करें, जैसे 1990-05-20।",
        GenderPrompt => "कृपया लिंग दर्ज करें (पुरुष / महिला / अन्य)।",
        InvalidGender => "माफ़ कीजिए, समझ नहीं आया। कृपया पुरुष, महिला या अन्य लिखें।",
        RegistrationFailed => "माफ़ कीजिए, अभी पंजीकरण पूरा नहीं हो सका।",
        DoctorPrompt => "कृपया डॉक्टर चुनें।",
        NoDoctors => "माफ़ कीजिए, अभी बुकिंग के लिए कोई डॉक्टर उपलब्ध नहीं है।",
        DatePrompt => "कृपया तारीख चुनें।",
        SlotPrompt => "कृपया समय चुनें।",
        NoSlots => "माफ़ कीजिए, उस तारीख पर कोई समय खाली नहीं है। आप दूसरा डॉक्टर या तारीख चुन सकते हैं।",
        BookingFailed => "माफ़ कीजिए, यह समय बुक नहीं हो सका। कृपया दूसरा समय चुनें।",
        BookingConfirmed => "आपका अपॉइंटमेंट पक्का हो गया है!",
        AlreadyBooked => "इस तारीख पर आपका अपॉइंटमेंट पहले से है।",
        ServiceUnavailable => "माफ़ कीजिए, कुछ गड़बड़ हो गई। कृपया थोड़ी देर बाद फिर कोशिश करें।",
        NotUnderstood => "माफ़ कीजिए, मैं समझ नहीं पाया।",
        ContactUnavailable => "संपर्क जानकारी अभी उपलब्ध नहीं है।",
        AddressLabel => "पता",
        PhoneLabel => "फ़ोन",
        EmailLabel => "ईमेल",
        NewPatientLabel => "नया मरीज़",
        BestMatchLabel => "कोई भी उपलब्ध डॉक्टर",
        RetryLabel => "दूसरा डॉक्टर चुनें",
        MenuBookLabel => "अपॉइंटमेंट बुक करें",
        MenuHospitalInfoLabel => "अस्पताल की जानकारी",
        MenuContactLabel => "संपर्क जानकारी",
    }
}

fn marathi(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Welcome => "स्वागत आहे! मी तुम्हाला अपॉइंटमेंट बुक करण्यात किंवा रुग्णालयाविषयी माहिती देण्यात मदत करू शकतो.",
        MenuPrompt => "आज मी तुमची काय मदत करू?",
        PhonePrompt => "कृपया तुमचा 10 अंकी मोबाइल नंबर टाका.",
        InvalidPhone => "हा नंबर बरोबर वाटत नाही. कृपया बरोबर 10 अंक टाका.",
        PatientsFound => "या नंबरवर हे रुग्ण नोंदणीकृत आहेत. अपॉइंटमेंट कोणासाठी आहे?",
        NamePrompt => "कृपया रुग्णाचे पूर्ण नाव सांगा.",
        DobPrompt => "कृपया जन्मतारीख टाका (YYYY-MM-DD).",
        InvalidDob => "कृपया YYYY-MM-DD स्वरूप वापरा, उदा. 1990-05-20.",
        GenderPrompt => "कृपया लिंग टाका (पुरुष / स्त्री / इतर).",
        InvalidGender => "माफ करा, समजले नाही. कृपया पुरुष, स्त्री किंवा इतर लिहा.",
        RegistrationFailed => "माफ करा, सध्या नोंदणी पूर्ण होऊ शकली नाही.",
        DoctorPrompt => "कृपया डॉक्टर निवडा.",
        NoDoctors => "माफ करा, सध्या बुकिंगसाठी कोणतेही डॉक्टर उपलब्ध नाहीत.",
        DatePrompt => "कृपया तारीख निवडा.",
        SlotPrompt => "कृपया वेळ निवडा.",
        NoSlots => "माफ करा, त्या तारखेला एकही वेळ रिकामी नाही. तुम्ही दुसरे डॉक्टर किंवा तारीख निवडू शकता.",
        BookingFailed => "माफ करा, ही वेळ बुक होऊ शकली नाही. कृपया दुसरी वेळ निवडा.",
        BookingConfirmed => "तुमची अपॉइंटमेंट निश्चित झाली आहे!",
        AlreadyBooked => "या तारखेला तुमची अपॉइंटमेंट आधीच आहे.",
        ServiceUnavailable => "माफ करा, काहीतरी चुकले. कृपया थोड्या वेळाने पुन्हा प्रयत्न करा.",
        NotUnderstood => "माफ करा, मला समजले नाही.",
        ContactUnavailable => "संपर्क माहिती सध्या उपलब्ध नाही.",
        AddressLabel => "पत्ता",
        PhoneLabel => "फोन",
        EmailLabel => "ईमेल",
        NewPatientLabel => "नवीन रुग्ण",
        BestMatchLabel => "कोणतेही उपलब्ध डॉक्टर",
        RetryLabel => "दुसरे डॉक्टर निवडा",
        MenuBookLabel => "अपॉइंटमेंट बुक करा",
        MenuHospitalInfoLabel => "रुग्णालयाची माहिती",
        MenuContactLabel => "संपर्क माहिती",
    }
}

pub fn menu_label(language: Language, option: MenuOption) -> &'static str {
    let key = match option {
        MenuOption::BookAppointment => MessageKey::MenuBookLabel,
        MenuOption::HospitalInfo => MessageKey::MenuHospitalInfoLabel,
        MenuOption::ContactInfo => MessageKey::MenuContactLabel,
    };
    text(language, key)
}

type SynonymTable = &'static [(Gender, &'static [&'static str])];

const ENGLISH_GENDERS: SynonymTable = &[
    (Gender::Male, &["male", "m", "man", "boy"]),
    (Gender::Female, &["female", "f", "woman", "girl"]),
    (Gender::Other, &["other", "o", "others"]),
];

const HINDI_GENDERS: SynonymTable = &[
    (Gender::Male, &["पुरुष", "पुरूष", "आदमी", "purush", "aadmi", "mard"]),
    (Gender::Female, &["महिला", "स्त्री", "औरत", "mahila", "aurat"]),
    (Gender::Other, &["अन्य", "anya"]),
];

const MARATHI_GENDERS: SynonymTable = &[
    (Gender::Male, &["पुरुष", "पुरूष", "purush"]),
    (Gender::Female, &["स्त्री", "महिला", "stri", "mahila"]),
    (Gender::Other, &["इतर", "itar"]),
];

pub fn gender_synonyms(language: Language) -> SynonymTable {
    match language {
        Language::English => ENGLISH_GENDERS,
        Language::Hindi => HINDI_GENDERS,
        Language::Marathi => MARATHI_GENDERS,
    }
}

/// Case-insensitive whole-word match against the session language, then English.
pub fn match_gender(language: Language, input: &str) -> Option<Gender> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let lookup = |table: SynonymTable| {
        table
            .iter()
            .find(|(_, words)| words.iter().any(|word| *word == input))
            .map(|(gender, _)| *gender)
    };

    lookup(gender_synonyms(language)).or_else(|| lookup(ENGLISH_GENDERS))
}

pub fn hospital_summary(language: Language, info: &HospitalInfo) -> String {
    let mut lines = vec![match &info.short_name {
        Some(short) if !short.is_empty() && short != &info.name => format!("{} ({})", info.name, short),
        _ => info.name.clone(),
    }];
    if let Some(address) = info.address.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("{}: {}", text(language, MessageKey::AddressLabel), address));
    }
    lines.join("\n")
}

pub fn contact_summary(language: Language, info: &HospitalInfo) -> String {
    let mut lines = vec![info.name.clone()];
    if let Some(phone) = info.phone.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("{}: {}", text(language, MessageKey::PhoneLabel), phone));
    }
    if let Some(email) = info.email.as_deref().filter(|e| !e.is_empty()) {
        lines.push(format!("{}: {}", text(language, MessageKey::EmailLabel), email));
    }
    if lines.len() == 1 {
        lines.push(text(language, MessageKey::ContactUnavailable).to_string());
    }
    lines.join("\n")
}
