use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::TransitionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo: String,
    #[serde(default, deserialize_with = "tags_from_wire")]
    pub tags: Vec<String>,
    #[serde(rename = "careersUrl", default, deserialize_with = "null_as_default")]
    pub careers_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralEvent {
    pub id: i64,
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo: String,
    pub job_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applicants: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_applicants: u32,
    pub expiry_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posted_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_url: String,
    #[serde(default, deserialize_with = "tags_from_wire")]
    pub tags: Vec<String>,
}

impl ReferralEvent {
    pub fn is_full(&self) -> bool {
        self.applicants >= self.max_applicants
    }
}

/// Body of `POST /referral-events`. The server assigns `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewReferralEvent {
    pub company: String,
    pub logo: String,
    pub job_title: String,
    pub location: String,
    pub applicants: u32,
    pub max_applicants: u32,
    pub expiry_date: String,
    pub posted_by: String,
    pub requirements: String,
    pub job_url: String,
    pub tags: Vec<String>,
}

impl NewReferralEvent {
    /// Formats a calendar date the way the create form submits it
    /// (UTC midnight, millisecond precision, `Z` suffix).
    pub fn expiry_from_date(date: NaiveDate) -> String {
        date.and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedReferral {
    pub id: i64,
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo: String,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expiry_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReferralStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posted_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Body of `POST /applied-referrals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppliedReferral {
    pub company: String,
    pub logo: String,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    pub location: String,
    pub created_at: String,
    pub expiry_date: String,
    pub status: ReferralStatus,
    pub posted_by: String,
    pub notes: String,
}

impl NewAppliedReferral {
    /// Snapshots the event fields an application record carries.
    pub fn for_event(event: &ReferralEvent, now: DateTime<Utc>, notes: &str) -> Self {
        Self {
            company: event.company.clone(),
            logo: event.logo.clone(),
            job_title: event.job_title.clone(),
            location: event.location.clone(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            expiry_date: event.expiry_date.clone(),
            status: ReferralStatus::Pending,
            posted_by: event.posted_by.clone(),
            notes: notes.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub job_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posted_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
}

/// What a candidate fills in when applying to a referral event.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub linkedin: String,
    pub job_url: String,
    pub experience: String,
    pub skills: Vec<String>,
    pub message: String,
    pub resume_file_path: String,
}

/// Body of `POST /referral-events/{id}/apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralApplication {
    pub name: String,
    pub email: String,
    pub linkedin: String,
    #[serde(rename = "jobUrl")]
    pub job_url: String,
    pub experience: String,
    pub yoe: String,
    pub skills: Vec<String>,
    pub message: String,
    pub resume_file_path: String,
    pub additional_message: String,
}

impl From<ApplicationForm> for ReferralApplication {
    fn from(form: ApplicationForm) -> Self {
        Self {
            yoe: form.experience.clone(),
            additional_message: form.message.clone(),
            name: form.name,
            email: form.email,
            linkedin: form.linkedin,
            job_url: form.job_url,
            experience: form.experience,
            skills: form.skills,
            message: form.message,
            resume_file_path: form.resume_file_path,
        }
    }
}

/// An application as the referrer triages it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub linkedin: String,
    /// Free text such as "5 years".
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applied_role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReferralStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applied_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resume_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Bug,
    Feature,
    General,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
}

// --- Applied referral status ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferralStatus {
    #[default]
    Pending,
    ResumeShortlisted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Shortlist,
    Reject,
    Reconsider,
}

/// Badge tone for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Warning,
    Success,
    Danger,
}

impl ReferralStatus {
    pub const ALL: [ReferralStatus; 3] = [
        ReferralStatus::Pending,
        ReferralStatus::ResumeShortlisted,
        ReferralStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::ResumeShortlisted => "resume shortlisted",
            ReferralStatus::Rejected => "rejected",
        }
    }

    /// Unknown values fall back to `Pending`.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "resume shortlisted" | "shortlisted" => ReferralStatus::ResumeShortlisted,
            "rejected" => ReferralStatus::Rejected,
            _ => ReferralStatus::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "Pending",
            ReferralStatus::ResumeShortlisted => "Resume shortlisted",
            ReferralStatus::Rejected => "Rejected",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            ReferralStatus::Pending => StatusTone::Warning,
            ReferralStatus::ResumeShortlisted => StatusTone::Success,
            ReferralStatus::Rejected => StatusTone::Danger,
        }
    }

    pub fn apply(self, action: StatusAction) -> Result<ReferralStatus, TransitionError> {
        use ReferralStatus::*;
        use StatusAction::*;

        match (self, action) {
            (Pending, Shortlist) => Ok(ResumeShortlisted),
            (Pending, Reject) | (ResumeShortlisted, Reject) => Ok(Rejected),
            (Rejected, Reconsider) => Ok(ResumeShortlisted),
            (from, action) => Err(TransitionError::NotAllowed { from, action }),
        }
    }

    /// Actions a referrer may take from this status.
    pub fn available_actions(&self) -> &'static [StatusAction] {
        match self {
            ReferralStatus::Pending => &[StatusAction::Shortlist, StatusAction::Reject],
            ReferralStatus::ResumeShortlisted => &[StatusAction::Reject],
            ReferralStatus::Rejected => &[StatusAction::Reconsider],
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusAction::Shortlist => "shortlist",
            StatusAction::Reject => "reject",
            StatusAction::Reconsider => "reconsider",
        })
    }
}

impl Serialize for ReferralStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReferralStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::from_wire(&s)).unwrap_or_default())
    }
}

// --- Tags ---

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    List(Vec<String>),
    Csv(String),
}

// Backends send explicit nulls for empty columns.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// The create form has sent tags as a single comma separated string.
fn tags_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<TagsRepr>::deserialize(deserializer)? {
        Some(TagsRepr::List(tags)) => tags,
        Some(TagsRepr::Csv(raw)) => parse_tags(&raw),
        None => Vec::new(),
    })
}
