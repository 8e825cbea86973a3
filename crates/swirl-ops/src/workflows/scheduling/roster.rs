//! Staff roster import from the HR system's CSV export.
//!
//! The export carries one row per staff member with their home unit,
//! cover-eligibility flag, preferred notification channel, and the optional
//! reliability/distance metrics the cascade ranks on.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::cover::domain::{EligibleStaffMember, EmployeeId, NotificationChannel, UnitId};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidChannel { employee_id: String, value: String },
    InvalidFlag { employee_id: String, value: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidChannel { employee_id, value } => write!(
                f,
                "unknown notification channel '{}' for employee {}",
                value, employee_id
            ),
            RosterImportError::InvalidFlag { employee_id, value } => write!(
                f,
                "unreadable yes/no value '{}' for employee {}",
                value, employee_id
            ),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidChannel { .. } | RosterImportError::InvalidFlag { .. } => {
                None
            }
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Parsed roster, grouped by unit.
#[derive(Debug, Clone, Default)]
pub struct StaffRoster {
    by_unit: HashMap<UnitId, Vec<EligibleStaffMember>>,
}

impl StaffRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_unit: HashMap<UnitId, Vec<EligibleStaffMember>> = HashMap::new();

        for record in csv_reader.deserialize::<RosterRow>() {
            let row = record?;
            let member = row.into_member()?;
            by_unit.entry(member.0).or_default().push(member.1);
        }

        Ok(Self { by_unit })
    }

    pub fn members_for(&self, unit_id: &UnitId) -> &[EligibleStaffMember] {
        self.by_unit
            .get(unit_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.by_unit.keys()
    }

    pub fn len(&self) -> usize {
        self.by_unit.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Employee ID")]
    employee_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Unit")]
    unit: String,
    #[serde(rename = "Eligible For Cover")]
    eligible: String,
    #[serde(rename = "Channel")]
    channel: String,
    #[serde(rename = "Reliability", default, deserialize_with = "empty_string_as_none")]
    reliability: Option<String>,
    #[serde(rename = "Distance", default, deserialize_with = "empty_string_as_none")]
    distance: Option<String>,
    #[serde(rename = "Wants More Hours")]
    wants_more_hours: String,
    #[serde(rename = "Has Required Skills")]
    has_required_skills: String,
    #[serde(rename = "Speaks Required Languages")]
    speaks_required_languages: String,
    #[serde(rename = "Currently Available")]
    currently_available: String,
}

impl RosterRow {
    fn into_member(self) -> Result<(UnitId, EligibleStaffMember), RosterImportError> {
        let channel = parse_channel(&self.channel).ok_or_else(|| {
            RosterImportError::InvalidChannel {
                employee_id: self.employee_id.clone(),
                value: self.channel.clone(),
            }
        })?;

        let eligible = parse_flag(&self.eligible, &self.employee_id)?;
        let wants_more_hours = parse_flag(&self.wants_more_hours, &self.employee_id)?;
        let has_required_skills = parse_flag(&self.has_required_skills, &self.employee_id)?;
        let speaks_required_languages =
            parse_flag(&self.speaks_required_languages, &self.employee_id)?;
        let currently_available = parse_flag(&self.currently_available, &self.employee_id)?;

        let member = EligibleStaffMember {
            employee_id: EmployeeId(self.employee_id),
            display_name: self.name,
            eligible,
            channel_preference: channel,
            reliability: self.reliability.as_deref().and_then(parse_metric),
            travel_distance: self.distance.as_deref().and_then(parse_metric),
            wants_more_hours,
            has_required_skills,
            speaks_required_languages,
            currently_available,
        };

        Ok((UnitId(self.unit), member))
    }
}

fn parse_channel(value: &str) -> Option<NotificationChannel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "push" => Some(NotificationChannel::Push),
        "sms" => Some(NotificationChannel::Sms),
        "email" => Some(NotificationChannel::Email),
        _ => None,
    }
}

fn parse_flag(value: &str, employee_id: &str) -> Result<bool, RosterImportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" | "" => Ok(false),
        _ => Err(RosterImportError::InvalidFlag {
            employee_id: employee_id.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Metric cells come from a spreadsheet export; anything unreadable is
/// treated as absent and repaired to worst case downstream.
fn parse_metric(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().filter(|metric| metric.is_finite())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
