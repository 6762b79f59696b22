use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

// The hospital API is inconsistent about id types; numbers and strings both occur.
fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_from_value))
}

/// A hospital record read field by field. Different API versions name the
/// same field differently and some send several names at once, so each field
/// is looked up under a list of keys and the first usable one wins.
struct WireRecord(Map<String, Value>);

impl WireRecord {
    fn read<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(de::Error::invalid_type(unexpected(&other), &"a JSON object")),
        }
    }

    fn values<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = &'a Value> + 'a {
        keys.iter().filter_map(|key| self.0.get(*key))
    }

    fn id(&self, keys: &[&str]) -> Option<String> {
        self.values(keys).find_map(|value| id_from_value(value.clone()))
    }

    fn required_id<E: de::Error>(&self, keys: &[&'static str]) -> Result<String, E> {
        self.id(keys).ok_or_else(|| de::Error::missing_field(keys[0]))
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.values(keys).find_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    fn parsed<T: DeserializeOwned>(&self, keys: &[&str]) -> Option<T> {
        self.values(keys)
            .filter(|value| !value.is_null())
            .find_map(|value| serde_json::from_value(value.clone()).ok())
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(b) => de::Unexpected::Bool(*b),
        Value::Number(_) => de::Unexpected::Other("number"),
        Value::String(s) => de::Unexpected::Str(s),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
}

impl<'de> Deserialize<'de> for PatientRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            id: record.required_id(&["id", "patient_id", "_id"])?,
            name: record.text(&["name", "patient_name", "full_name"]).unwrap_or_default(),
            phone: record.text(&["phone"]),
            gender: record.text(&["gender"]),
            date_of_birth: record.text(&["date_of_birth", "dob"]),
        })
    }
}

/// `checkPatient` reply. Older API versions answer with a single `patient`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckPatientResponse {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
    #[serde(default)]
    pub patient: Option<PatientRecord>,
}

impl CheckPatientResponse {
    pub fn into_patients(self) -> Vec<PatientRecord> {
        if !self.exists {
            return Vec::new();
        }
        if !self.patients.is_empty() {
            return self.patients;
        }
        self.patient.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub dob: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterPatientResponse {
    pub success: bool,
    pub patient_id: Option<String>,
    pub message: Option<String>,
}

impl<'de> Deserialize<'de> for RegisterPatientResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            success: record.parsed(&["success"]).unwrap_or_default(),
            patient_id: record.id(&["patient_id", "id"]),
            message: record.text(&["message"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialization: Option<String>,
}

impl<'de> Deserialize<'de> for Doctor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            id: record.required_id(&["id", "doctor_id", "_id"])?,
            name: record.text(&["name", "doctor_name", "full_name"]).unwrap_or_default(),
            specialization: record.text(&["specialization", "specialty", "department"]),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DoctorListResponse {
    Bare(Vec<Doctor>),
    Wrapped { doctors: Vec<Doctor> },
}

impl DoctorListResponse {
    pub fn into_doctors(self) -> Vec<Doctor> {
        match self {
            DoctorListResponse::Bare(doctors) => doctors,
            DoctorListResponse::Wrapped { doctors } => doctors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Morning, DayPeriod::Afternoon, DayPeriod::Evening];

    pub fn for_time(time: NaiveTime) -> Self {
        match time.hour() {
            0..=11 => DayPeriod::Morning,
            12..=16 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub id: String,
    pub label: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub period: Option<DayPeriod>,
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            id: record.required_id(&["id", "slot_id"])?,
            label: record.text(&["label", "time", "time_label"]),
            start_time: record.text(&["start_time"]),
            end_time: record.text(&["end_time"]),
            // Unknown periods fall back to the start time.
            period: record.parsed(&["period"]),
        })
    }
}

impl Slot {
    /// Server-supplied period, else derived from the start time.
    pub fn resolved_period(&self) -> Option<DayPeriod> {
        self.period.or_else(|| {
            self.start_time
                .as_deref()
                .and_then(parse_clock)
                .map(DayPeriod::for_time)
        })
    }

    pub fn display_label(&self) -> String {
        if let Some(range) = format_time_range(self.start_time.as_deref(), self.end_time.as_deref()) {
            return range;
        }
        self.label.clone().unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotQuery {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub phone: Option<String>,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub booked: bool,
    #[serde(default)]
    pub appointment: Option<AppointmentRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot_id: String,
    pub patient_name: String,
    pub phone: String,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub appointment_uid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentRef {
    Uid(String),
    Id(String),
}

impl BookingResponse {
    pub fn reference(&self) -> Option<AppointmentRef> {
        self.appointment_uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .map(AppointmentRef::Uid)
            .or_else(|| self.appointment_id.clone().map(AppointmentRef::Id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentRecord {
    pub appointment_uid: Option<String>,
    pub appointment_id: Option<String>,
    pub patient_name: Option<String>,
    pub hospital_name: Option<String>,
    pub doctor_name: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_label: Option<String>,
    pub token_number: Option<String>,
}

impl<'de> Deserialize<'de> for AppointmentRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            appointment_uid: record.text(&["appointment_uid", "uid"]),
            appointment_id: record.id(&["appointment_id", "id"]),
            patient_name: record.text(&["patient_name"]),
            hospital_name: record.text(&["hospital_name"]),
            doctor_name: record.text(&["doctor_name"]),
            date: record.text(&["date", "appointment_date"]),
            start_time: record.text(&["start_time"]),
            end_time: record.text(&["end_time"]),
            time_label: record.text(&["time_label", "time", "slot"]),
            token_number: record.id(&["token_number", "token"]),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HospitalInfo {
    pub name: String,
    pub short_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub appointment_day_limit: Option<u32>,
}

impl<'de> Deserialize<'de> for HospitalInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WireRecord::read(deserializer)?;
        Ok(Self {
            name: record.text(&["name", "hospital_name"]).unwrap_or_default(),
            short_name: record.text(&["short_name"]),
            address: record.text(&["address"]),
            phone: record.text(&["phone", "contact_number"]),
            email: record.text(&["email"]),
            appointment_day_limit: record.parsed(&["appointment_day_limit"]),
        })
    }
}

pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// `"09:00", "09:15"` becomes `"09:00 AM - 09:15 AM"`.
pub fn format_time_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = parse_clock(start?)?;
    let end = parse_clock(end?)?;
    Some(format!("{} - {}", start.format("%I:%M %p"), end.format("%I:%M %p")))
}
