//! Derived views over fetched data: filtering, counting, expiry badges and
//! applicant aggregation. Everything here is pure and synchronous.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::api::ALL_TAGS;
use crate::models::{Applicant, AppliedReferral, Company, Job, ReferralEvent, ReferralStatus};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Days left at or below which an event counts as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

/// Share of applicants assumed shortlisted when only totals are known.
pub const SHORTLIST_ESTIMATE_RATE: f64 = 0.3;

// --- Text search ---

pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Company {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Searchable for ReferralEvent {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.job_title.as_str(), self.company.as_str(), self.location.as_str()]
    }
}

impl Searchable for AppliedReferral {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.job_title.as_str(), self.company.as_str(), self.location.as_str()]
    }
}

impl Searchable for Job {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.company.as_str(), self.location.as_str()]
    }
}

impl Searchable for Applicant {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.applied_role.as_str()]
    }
}

/// Case-insensitive substring match on any search field. Blank matches all.
pub fn matches_search<T: Searchable + ?Sized>(item: &T, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

pub fn filter_by_search<'a, T: Searchable + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    query: &str,
) -> Vec<&'a T> {
    items
        .into_iter()
        .filter(|item| matches_search(*item, query))
        .collect()
}

// --- Category / tag ---

pub trait Tagged {
    fn tags(&self) -> &[String];
}

impl Tagged for Company {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for ReferralEvent {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Tag(String),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ALL_TAGS {
            CategoryFilter::All
        } else {
            CategoryFilter::Tag(raw.to_string())
        }
    }

    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Tag(tag) => tags.iter().any(|t| t == tag),
        }
    }
}

pub fn filter_by_category<'a, T: Tagged + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    filter: &CategoryFilter,
) -> Vec<&'a T> {
    items
        .into_iter()
        .filter(|item| filter.matches(item.tags()))
        .collect()
}

/// Distinct tags in first-seen order, for building a category picker.
pub fn distinct_tags<'a, T: Tagged + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        for tag in item.tags() {
            if !seen.contains(tag) {
                seen.push(tag.clone());
            }
        }
    }
    seen
}

// --- Company picker (events) ---

/// Picker value meaning "every company".
pub const ALL_COMPANIES: &str = "All Companies";

/// Distinct event companies in first-seen order.
pub fn distinct_companies<'a>(events: impl IntoIterator<Item = &'a ReferralEvent>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for event in events {
        if !seen.contains(&event.company) {
            seen.push(event.company.clone());
        }
    }
    seen
}

/// Exact company match; `None` keeps everything.
pub fn filter_by_company<'a>(
    events: impl IntoIterator<Item = &'a ReferralEvent>,
    company: Option<&str>,
) -> Vec<&'a ReferralEvent> {
    events
        .into_iter()
        .filter(|event| company.is_none_or(|c| event.company == c))
        .collect()
}

// --- Status partition ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusTab {
    #[default]
    All,
    Only(ReferralStatus),
}

impl StatusTab {
    pub fn matches(&self, status: ReferralStatus) -> bool {
        match self {
            StatusTab::All => true,
            StatusTab::Only(wanted) => *wanted == status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub shortlisted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = ReferralStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                ReferralStatus::Pending => counts.pending += 1,
                ReferralStatus::ResumeShortlisted => counts.shortlisted += 1,
                ReferralStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.shortlisted + self.rejected
    }

    pub fn get(&self, status: ReferralStatus) -> usize {
        match status {
            ReferralStatus::Pending => self.pending,
            ReferralStatus::ResumeShortlisted => self.shortlisted,
            ReferralStatus::Rejected => self.rejected,
        }
    }

    /// Badge count for a tab.
    pub fn count(&self, tab: StatusTab) -> usize {
        match tab {
            StatusTab::All => self.total(),
            StatusTab::Only(status) => self.get(status),
        }
    }

    pub fn share(&self, status: ReferralStatus) -> u32 {
        percentage(self.get(status) as u64, self.total() as u64)
    }
}

/// Rounded percentage; 0 when `total` is 0.
pub fn percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn occupancy(event: &ReferralEvent) -> u32 {
    percentage(event.applicants as u64, event.max_applicants as u64)
}

// --- Expiry ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryClass {
    Expired,
    ExpiringSoon,
    Normal,
}

impl ExpiryClass {
    pub fn classify(days: i64) -> Self {
        if days < 0 {
            ExpiryClass::Expired
        } else if days <= EXPIRING_SOON_DAYS {
            ExpiryClass::ExpiringSoon
        } else {
            ExpiryClass::Normal
        }
    }

    /// Unparseable dates are treated as `Normal`.
    pub fn of<Tz: TimeZone>(expiry_date: &str, now: DateTime<Tz>) -> Self {
        days_until_expiry(expiry_date, now)
            .map(Self::classify)
            .unwrap_or(ExpiryClass::Normal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpiryClass::Expired => "expired",
            ExpiryClass::ExpiringSoon => "expiring soon",
            ExpiryClass::Normal => "open",
        }
    }
}

/// Accepts RFC 3339, bare dates (UTC midnight) and offset-less date-times
/// (local time).
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole days until `expiry_date`, rounded up. Negative once it has passed.
pub fn days_until_expiry<Tz: TimeZone>(expiry_date: &str, now: DateTime<Tz>) -> Option<i64> {
    let expiry = parse_expiry(expiry_date)?;
    let diff_ms = expiry.timestamp_millis() - now.timestamp_millis();
    Some(ceil_div(diff_ms, MS_PER_DAY))
}

fn ceil_div(a: i64, b: i64) -> i64 {
    a.div_euclid(b) + i64::from(a.rem_euclid(b) != 0)
}

/// Apply is offered while the event is open and has room.
pub fn can_apply<Tz: TimeZone>(event: &ReferralEvent, now: DateTime<Tz>) -> bool {
    ExpiryClass::of(&event.expiry_date, now) != ExpiryClass::Expired && !event.is_full()
}

// --- Event analytics ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventAnalytics {
    pub total_events: usize,
    pub total_applicants: u64,
    pub shortlisted: u64,
    pub pending: u64,
}

impl EventAnalytics {
    pub fn compute<'a>(events: impl IntoIterator<Item = &'a ReferralEvent>) -> Self {
        let mut analytics = Self::default();
        for event in events {
            analytics.total_events += 1;
            analytics.total_applicants += event.applicants as u64;
        }
        analytics.shortlisted = estimated_shortlisted(analytics.total_applicants);
        analytics.pending = analytics
            .total_applicants
            .saturating_sub(analytics.shortlisted);
        analytics
    }
}

pub fn estimated_shortlisted(applicants: u64) -> u64 {
    (applicants as f64 * SHORTLIST_ESTIMATE_RATE).round() as u64
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventSort {
    /// Server order.
    #[default]
    Newest,
    ExpiryDate,
    MostApplicants,
    LeastApplicants,
}

pub fn sort_events(events: &mut [&ReferralEvent], sort: EventSort) {
    match sort {
        EventSort::Newest => {}
        EventSort::ExpiryDate => events.sort_by(|a, b| {
            match (parse_expiry(&a.expiry_date), parse_expiry(&b.expiry_date)) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        EventSort::MostApplicants => events.sort_by(|a, b| b.applicants.cmp(&a.applicants)),
        EventSort::LeastApplicants => events.sort_by(|a, b| a.applicants.cmp(&b.applicants)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanySort {
    #[default]
    NameAsc,
    NameDesc,
}

pub fn sort_companies(companies: &mut [&Company], sort: CompanySort) {
    companies.sort_by(|a, b| {
        let ord = a.name.to_lowercase().cmp(&b.name.to_lowercase());
        match sort {
            CompanySort::NameAsc => ord,
            CompanySort::NameDesc => ord.reverse(),
        }
    });
}

// --- Skills and experience ---

/// Most frequent skills, descending, ties broken alphabetically.
pub fn top_skills<'a>(
    applicants: impl IntoIterator<Item = &'a Applicant>,
    limit: usize,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for applicant in applicants {
        for skill in &applicant.skills {
            let skill = skill.trim();
            if !skill.is_empty() {
                *counts.entry(skill).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(skill, n)| (skill.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Leading integer of a free-text experience value ("5 years" -> 5).
pub fn parse_years(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperienceBand {
    ZeroToTwo,
    ThreeToFive,
    SixToEight,
    NinePlus,
}

impl ExperienceBand {
    pub const ALL: [ExperienceBand; 4] = [
        ExperienceBand::ZeroToTwo,
        ExperienceBand::ThreeToFive,
        ExperienceBand::SixToEight,
        ExperienceBand::NinePlus,
    ];

    pub fn of(years: i64) -> Self {
        match years {
            i64::MIN..=2 => ExperienceBand::ZeroToTwo,
            3..=5 => ExperienceBand::ThreeToFive,
            6..=8 => ExperienceBand::SixToEight,
            _ => ExperienceBand::NinePlus,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceBand::ZeroToTwo => "0-2 years",
            ExperienceBand::ThreeToFive => "3-5 years",
            ExperienceBand::SixToEight => "6-8 years",
            ExperienceBand::NinePlus => "9+ years",
        }
    }

    /// Accepts "3-5 years" or the short form "3-5".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|band| band.label() == raw || band.label().trim_end_matches(" years") == raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExperienceFilter {
    #[default]
    All,
    Band(ExperienceBand),
}

impl ExperienceFilter {
    pub const ALL_LABEL: &'static str = "All Experience";

    pub fn parse(raw: &str) -> Self {
        ExperienceBand::parse(raw)
            .map(ExperienceFilter::Band)
            .unwrap_or(ExperienceFilter::All)
    }

    /// Experience text without a leading number only passes `All`.
    pub fn matches(&self, experience: &str) -> bool {
        match self {
            ExperienceFilter::All => true,
            ExperienceFilter::Band(band) => {
                parse_years(experience).is_some_and(|years| ExperienceBand::of(years) == *band)
            }
        }
    }
}

/// Applicant counts per experience band; unparseable experience is skipped.
pub fn experience_histogram<'a>(
    applicants: impl IntoIterator<Item = &'a Applicant>,
) -> Vec<(ExperienceBand, usize)> {
    let mut counts: HashMap<ExperienceBand, usize> = HashMap::new();
    for applicant in applicants {
        if let Some(years) = parse_years(&applicant.experience) {
            *counts.entry(ExperienceBand::of(years)).or_insert(0) += 1;
        }
    }
    ExperienceBand::ALL
        .into_iter()
        .map(|band| (band, counts.get(&band).copied().unwrap_or(0)))
        .collect()
}

/// Maps a picker value to `None` when it is the "everything" choice.
pub fn choice(raw: &str, all_label: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty() && raw != all_label).then(|| raw.to_string())
}

/// Referrer-side applicant triage filter; every criterion must hold.
#[derive(Debug, Clone, Default)]
pub struct ApplicantFilter {
    pub search: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<ReferralStatus>,
    pub experience: ExperienceFilter,
    pub tab: StatusTab,
}

impl ApplicantFilter {
    pub fn matches(&self, applicant: &Applicant) -> bool {
        matches_search(applicant, &self.search)
            && self.company.as_ref().is_none_or(|c| *c == applicant.company)
            && self.role.as_ref().is_none_or(|r| *r == applicant.applied_role)
            && self.status.is_none_or(|s| s == applicant.status)
            && self.tab.matches(applicant.status)
            && self.experience.matches(&applicant.experience)
    }

    pub fn apply<'a>(&self, applicants: impl IntoIterator<Item = &'a Applicant>) -> Vec<&'a Applicant> {
        applicants.into_iter().filter(|a| self.matches(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(id: i64, title: &str, applicants: u32, max: u32, expiry: &str) -> ReferralEvent {
        ReferralEvent {
            id,
            company: "Acme".into(),
            logo: String::new(),
            job_title: title.into(),
            location: "Berlin".into(),
            applicants,
            max_applicants: max,
            expiry_date: expiry.into(),
            posted_by: "sarah@example.com".into(),
            requirements: String::new(),
            job_url: String::new(),
            tags: vec!["Tech".into()],
        }
    }

    fn company(name: &str, tags: &[&str]) -> Company {
        Company {
            id: 1,
            name: name.into(),
            logo: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            careers_url: String::new(),
            description: None,
            industry: None,
            size: None,
            location: None,
        }
    }

    fn applicant(name: &str, experience: &str, skills: &[&str], status: ReferralStatus) -> Applicant {
        Applicant {
            id: 1,
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            linkedin: String::new(),
            experience: experience.into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            company: "Acme".into(),
            applied_role: "Engineer".into(),
            status,
            applied_date: String::new(),
            message: String::new(),
            resume_url: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-10-18T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let events = vec![event(1, "Backend Engineer", 0, 5, "2026-11-01"), event(2, "Designer", 0, 5, "2026-11-01")];
        assert_eq!(filter_by_search(&events, "BACKEND").len(), 1);
        assert_eq!(filter_by_search(&events, "berlin").len(), 2);
        assert_eq!(filter_by_search(&events, "").len(), 2);
        assert!(filter_by_search(&events, "tokyo").is_empty());
    }

    #[test]
    fn test_category_filter() {
        let companies = vec![company("Acme", &["Tech", "Finance"]), company("Globex", &["Media"])];
        assert_eq!(filter_by_category(&companies, &CategoryFilter::parse("All")).len(), 2);
        assert_eq!(filter_by_category(&companies, &CategoryFilter::parse("")).len(), 2);
        let finance = filter_by_category(&companies, &CategoryFilter::parse("Finance"));
        assert_eq!(finance.len(), 1);
        assert_eq!(finance[0].name, "Acme");
        assert_eq!(distinct_tags(&companies), vec!["Tech", "Finance", "Media"]);
    }

    #[test]
    fn test_search_then_category_compose() {
        let companies = vec![company("Acme", &["Tech"]), company("Acme Media", &["Media"])];
        let found = filter_by_search(&companies, "acme");
        let found = filter_by_category(found, &CategoryFilter::Tag("Media".into()));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_status_counts() {
        use ReferralStatus::*;
        let counts = StatusCounts::tally([Pending, Pending, Rejected, ResumeShortlisted]);
        assert_eq!(counts.count(StatusTab::All), 4);
        assert_eq!(counts.count(StatusTab::Only(Pending)), 2);
        assert_eq!(counts.share(Rejected), 25);
    }

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(StatusCounts::default().share(ReferralStatus::Pending), 0);
        assert_eq!(occupancy(&event(1, "x", 0, 0, "2026-11-01")), 0);
        assert_eq!(occupancy(&event(1, "x", 3, 8, "2026-11-01")), 38);
    }

    #[test]
    fn test_expiry_boundaries() {
        assert_eq!(ExpiryClass::classify(3), ExpiryClass::ExpiringSoon);
        assert_eq!(ExpiryClass::classify(4), ExpiryClass::Normal);
        assert_eq!(ExpiryClass::classify(-1), ExpiryClass::Expired);
        assert_eq!(ExpiryClass::classify(0), ExpiryClass::ExpiringSoon);
    }

    #[test]
    fn test_days_until_expiry_rounds_up() {
        let now = now();
        let in_hours = (now + Duration::hours(5)).to_rfc3339();
        assert_eq!(days_until_expiry(&in_hours, now), Some(1));

        let ago_hours = (now - Duration::hours(5)).to_rfc3339();
        assert_eq!(days_until_expiry(&ago_hours, now), Some(0));

        let ago_day = (now - Duration::hours(30)).to_rfc3339();
        assert_eq!(days_until_expiry(&ago_day, now), Some(-1));

        assert_eq!(days_until_expiry(&now.to_rfc3339(), now), Some(0));
    }

    #[test]
    fn test_days_until_expiry_date_only_is_utc_midnight() {
        // 2026-10-21T00:00Z is 2.5 days after now.
        assert_eq!(days_until_expiry("2026-10-21", now()), Some(3));
        assert_eq!(days_until_expiry("2026-10-22", now()), Some(4));
        assert_eq!(days_until_expiry("not a date", now()), None);
    }

    #[test]
    fn test_offset_less_datetimes_parse_as_local() {
        let with_seconds = parse_expiry("2026-11-01T10:00:00").unwrap();
        let without_seconds = parse_expiry("2026-11-01T10:00").unwrap();
        assert_eq!(with_seconds, without_seconds);
        let expected = Local
            .with_ymd_and_hms(2026, 11, 1, 10, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(without_seconds, expected);
    }

    #[test]
    fn test_company_filter_over_events() {
        let mut globex = event(3, "Analyst", 0, 5, "2026-11-01");
        globex.company = "Globex".into();
        let events = vec![event(1, "Engineer", 0, 5, "2026-11-01"), globex, event(2, "SRE", 0, 5, "2026-11-01")];

        assert_eq!(distinct_companies(&events), vec!["Acme", "Globex"]);
        let all = choice(ALL_COMPANIES, ALL_COMPANIES);
        assert_eq!(filter_by_company(&events, all.as_deref()).len(), 3);
        let acme = choice("Acme", ALL_COMPANIES);
        let found = filter_by_company(&events, acme.as_deref());
        assert_eq!(found.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(filter_by_company(&events, Some("Initech")).is_empty());
    }

    #[test]
    fn test_can_apply() {
        let now = now();
        assert!(can_apply(&event(1, "x", 2, 10, "2026-11-30"), now));
        assert!(!can_apply(&event(1, "x", 10, 10, "2026-11-30"), now));
        assert!(!can_apply(&event(1, "x", 0, 10, "2026-10-01"), now));
        // Unknown dates never block.
        assert!(can_apply(&event(1, "x", 0, 10, "soon"), now));
    }

    #[test]
    fn test_event_analytics() {
        let events = vec![
            event(1, "a", 7, 10, "2026-11-01"),
            event(2, "b", 3, 10, "2026-11-01"),
        ];
        let analytics = EventAnalytics::compute(&events);
        assert_eq!(analytics.total_events, 2);
        assert_eq!(analytics.total_applicants, 10);
        assert_eq!(analytics.shortlisted, 3);
        assert_eq!(analytics.pending, 7);

        assert_eq!(EventAnalytics::compute(&[]), EventAnalytics::default());
    }

    #[test]
    fn test_sort_events() {
        let events = vec![
            event(1, "a", 5, 10, "2026-12-01"),
            event(2, "b", 9, 10, "2026-11-01"),
            event(3, "c", 1, 10, "garbage"),
        ];
        let mut view: Vec<&ReferralEvent> = events.iter().collect();

        sort_events(&mut view, EventSort::ExpiryDate);
        assert_eq!(view.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        sort_events(&mut view, EventSort::MostApplicants);
        assert_eq!(view.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        sort_events(&mut view, EventSort::LeastApplicants);
        assert_eq!(view.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_companies() {
        let companies = vec![company("globex", &[]), company("Acme", &[])];
        let mut view: Vec<&Company> = companies.iter().collect();
        sort_companies(&mut view, CompanySort::NameAsc);
        assert_eq!(view[0].name, "Acme");
        sort_companies(&mut view, CompanySort::NameDesc);
        assert_eq!(view[0].name, "globex");
    }

    #[test]
    fn test_top_skills() {
        use ReferralStatus::Pending;
        let applicants = vec![
            applicant("Ada", "5 years", &["Rust", "SQL"], Pending),
            applicant("Bob", "2 years", &["Rust", "Go"], Pending),
            applicant("Cy", "9 years", &["SQL", "Rust", " "], Pending),
        ];
        let top = top_skills(&applicants, 2);
        assert_eq!(top, vec![("Rust".to_string(), 3), ("SQL".to_string(), 2)]);
        assert_eq!(top_skills(&applicants, 10).len(), 3);
    }

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_years("5 years"), Some(5));
        assert_eq!(parse_years(" 12+"), Some(12));
        assert_eq!(parse_years("-1"), Some(-1));
        assert_eq!(parse_years("years: 5"), None);
        assert_eq!(parse_years(""), None);
    }

    #[test]
    fn test_experience_bands() {
        assert_eq!(ExperienceBand::of(0), ExperienceBand::ZeroToTwo);
        assert_eq!(ExperienceBand::of(2), ExperienceBand::ZeroToTwo);
        assert_eq!(ExperienceBand::of(3), ExperienceBand::ThreeToFive);
        assert_eq!(ExperienceBand::of(8), ExperienceBand::SixToEight);
        assert_eq!(ExperienceBand::of(9), ExperienceBand::NinePlus);

        assert_eq!(ExperienceFilter::parse("All Experience"), ExperienceFilter::All);
        assert_eq!(
            ExperienceFilter::parse("6-8"),
            ExperienceFilter::Band(ExperienceBand::SixToEight)
        );
        assert!(!ExperienceFilter::Band(ExperienceBand::ZeroToTwo).matches("lots"));
        assert!(ExperienceFilter::All.matches("lots"));
    }

    #[test]
    fn test_experience_histogram() {
        use ReferralStatus::Pending;
        let applicants = vec![
            applicant("Ada", "5 years", &[], Pending),
            applicant("Bob", "4 years", &[], Pending),
            applicant("Cy", "unknown", &[], Pending),
            applicant("Di", "10 years", &[], Pending),
        ];
        let histogram = experience_histogram(&applicants);
        assert_eq!(
            histogram,
            vec![
                (ExperienceBand::ZeroToTwo, 0),
                (ExperienceBand::ThreeToFive, 2),
                (ExperienceBand::SixToEight, 0),
                (ExperienceBand::NinePlus, 1),
            ]
        );
    }

    #[test]
    fn test_applicant_filter_combines_criteria() {
        use ReferralStatus::*;
        let applicants = vec![
            applicant("Ada", "5 years", &["Rust"], Pending),
            applicant("Bob", "4 years", &["Go"], ResumeShortlisted),
            applicant("Cy", "1 year", &["Rust"], Pending),
        ];

        let filter = ApplicantFilter {
            experience: ExperienceFilter::Band(ExperienceBand::ThreeToFive),
            tab: StatusTab::Only(Pending),
            company: choice("All Companies", "All Companies"),
            ..Default::default()
        };
        let found = filter.apply(&applicants);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ada");

        let filter = ApplicantFilter {
            search: "BOB@".into(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&applicants).len(), 1);

        let filter = ApplicantFilter {
            company: choice("Globex", "All Companies"),
            ..Default::default()
        };
        assert!(filter.apply(&applicants).is_empty());
    }
}
