use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use referhub::api::ApiClient;
use referhub::config::{ApiConfig, default_session_path};
use referhub::controller::{
    AppliedReferralsController, CompaniesController, ReferralEventsController, ResourceState,
};
use referhub::models::{
    ApplicationForm, Feedback, FeedbackKind, NewReferralEvent, ReferralEvent,
    ReferralStatus, parse_tags,
};
use referhub::session::{FileSessionStore, Role, Session, SessionStore, SignUp};
use referhub::transport::HttpTransport;
use referhub::views::{
    self, CategoryFilter, CompanySort, EventAnalytics, EventSort, ExpiryClass, StatusCounts,
    StatusTab,
};

#[derive(Parser)]
#[command(name = "referhub")]
#[command(about = "Browse referral events, apply, and track your referrals")]
struct Cli {
    /// API base URL (overrides REFERHUB_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List companies
    Companies {
        /// Search by company name
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by tag ("All" shows everything)
        #[arg(short, long)]
        tag: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value = "name-asc")]
        sort: CompanySortArg,
    },

    /// List open jobs
    Jobs {
        /// Search by title, company or location
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List referral events (your own when signed in as a referrer)
    Events {
        /// Search by title, company or location
        #[arg(short, long)]
        search: Option<String>,

        /// Only events from this company ("All Companies" shows everything)
        #[arg(short, long)]
        company: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value = "newest")]
        sort: EventSortArg,
    },

    /// Show a referral event
    Event {
        /// Event ID
        id: i64,
    },

    /// Post a new referral event
    CreateEvent {
        #[arg(long)]
        company: String,

        /// Job title
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        location: String,

        /// Job posting URL
        #[arg(long, default_value = "")]
        url: String,

        #[arg(long)]
        max_applicants: u32,

        /// Expiry date (YYYY-MM-DD)
        #[arg(long)]
        expiry: String,

        #[arg(long, default_value = "")]
        requirements: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Apply to a referral event
    Apply {
        /// Event ID
        event_id: i64,

        /// Your full name (defaults to your account name)
        #[arg(long)]
        name: Option<String>,

        /// Contact email (defaults to your account email)
        #[arg(long)]
        email: Option<String>,

        /// LinkedIn profile URL
        #[arg(long, default_value = "")]
        linkedin: String,

        /// URL of the job you want to be referred for
        #[arg(long, default_value = "")]
        job_url: String,

        /// Years of experience, e.g. "5 years"
        #[arg(long, default_value = "")]
        experience: String,

        /// A skill (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,

        /// Note to the referrer
        #[arg(short, long, default_value = "")]
        message: String,

        /// Path to your resume
        #[arg(long, default_value = "")]
        resume: String,
    },

    /// List referrals you applied to
    Applied {
        /// Only show one status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Summarize your posted events
    Analytics,

    /// Send feedback
    Feedback {
        #[arg(short, long, value_enum)]
        kind: FeedbackKindArg,

        #[arg(short, long)]
        message: String,
    },

    /// Sign in and remember the session
    Login {
        email: String,
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, value_enum, default_value = "candidate")]
        role: RoleArg,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompanySortArg {
    NameAsc,
    NameDesc,
}

impl From<CompanySortArg> for CompanySort {
    fn from(arg: CompanySortArg) -> Self {
        match arg {
            CompanySortArg::NameAsc => CompanySort::NameAsc,
            CompanySortArg::NameDesc => CompanySort::NameDesc,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EventSortArg {
    Newest,
    Expiry,
    Most,
    Least,
}

impl From<EventSortArg> for EventSort {
    fn from(arg: EventSortArg) -> Self {
        match arg {
            EventSortArg::Newest => EventSort::Newest,
            EventSortArg::Expiry => EventSort::ExpiryDate,
            EventSortArg::Most => EventSort::MostApplicants,
            EventSortArg::Least => EventSort::LeastApplicants,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Shortlisted,
    Rejected,
}

impl From<StatusArg> for ReferralStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => ReferralStatus::Pending,
            StatusArg::Shortlisted => ReferralStatus::ResumeShortlisted,
            StatusArg::Rejected => ReferralStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedbackKindArg {
    Bug,
    Feature,
    General,
    Other,
}

impl From<FeedbackKindArg> for FeedbackKind {
    fn from(arg: FeedbackKindArg) -> Self {
        match arg {
            FeedbackKindArg::Bug => FeedbackKind::Bug,
            FeedbackKindArg::Feature => FeedbackKind::Feature,
            FeedbackKindArg::General => FeedbackKind::General,
            FeedbackKindArg::Other => FeedbackKind::Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Candidate,
    Referrer,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Candidate => Role::Candidate,
            RoleArg::Referrer => Role::Referrer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ApiConfig::from_env();
    if let Some(url) = &cli.base_url {
        config = ApiConfig::new(url.as_str()).with_timeout(config.timeout);
    }

    let store = FileSessionStore::new(default_session_path());
    let session = store
        .load()
        .with_context(|| format!("Failed to read session from {}", store.path().display()))?;
    let token = session.as_ref().and_then(|s| s.token.clone());
    let client = ApiClient::with_token(Arc::new(HttpTransport::new(config)), token);

    match cli.command {
        Commands::Companies { search, tag, sort } => {
            let controller = CompaniesController::companies(client.companies.clone());
            match (&search, &tag) {
                (Some(query), _) => controller.search(query).await,
                (None, Some(tag)) => controller.filter_by_tag(tag).await,
                (None, None) => controller.activate(None).await,
            }
            let state = loaded(controller.state())?;

            let category = CategoryFilter::parse(tag.as_deref().unwrap_or_default());
            let matching = views::filter_by_search(&state.data, search.as_deref().unwrap_or_default());
            let mut companies = views::filter_by_category(matching, &category);
            views::sort_companies(&mut companies, sort.into());

            if companies.is_empty() {
                println!("No companies found.");
            } else {
                println!("{:<6} {:<25} {:<30} {:<30}", "ID", "NAME", "TAGS", "CAREERS");
                println!("{}", "-".repeat(94));
                for company in companies {
                    println!(
                        "{:<6} {:<25} {:<30} {:<30}",
                        company.id,
                        truncate(&company.name, 23),
                        truncate(&company.tags.join(", "), 28),
                        truncate(&company.careers_url, 28)
                    );
                }
            }
        }

        Commands::Jobs { search } => {
            let jobs = client
                .jobs
                .search(search.as_deref().unwrap_or_default())
                .await
                .into_result()
                .context("Failed to fetch jobs")?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<6} {:<30} {:<20} {:<18} {:<12}", "ID", "TITLE", "COMPANY", "LOCATION", "TYPE");
                println!("{}", "-".repeat(90));
                for job in jobs {
                    println!(
                        "{:<6} {:<30} {:<20} {:<18} {:<12}",
                        job.id,
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        truncate(&job.location, 16),
                        truncate(&job.job_type, 10)
                    );
                }
            }
        }

        Commands::Events {
            search,
            company,
            sort,
        } => {
            let session = require_session(session)?;
            let controller = ReferralEventsController::referral_events(client.referral_events.clone());
            controller.activate(Some(session.identity())).await;
            let state = loaded(controller.state())?;

            let company = views::choice(company.as_deref().unwrap_or_default(), views::ALL_COMPANIES);
            let matching = views::filter_by_search(&state.data, search.as_deref().unwrap_or_default());
            let mut events = views::filter_by_company(matching, company.as_deref());
            views::sort_events(&mut events, sort.into());

            if events.is_empty() {
                println!("No referral events found.");
            } else {
                let now = Utc::now();
                println!(
                    "{:<6} {:<18} {:<28} {:<10} {:<16}",
                    "ID", "COMPANY", "TITLE", "SLOTS", "EXPIRY"
                );
                println!("{}", "-".repeat(82));
                for event in events {
                    println!(
                        "{:<6} {:<18} {:<28} {:<10} {:<16}",
                        event.id,
                        truncate(&event.company, 16),
                        truncate(&event.job_title, 26),
                        format!("{}/{}", event.applicants, event.max_applicants),
                        expiry_badge(event, now)
                    );
                }
            }
        }

        Commands::Event { id } => {
            let event = match client.referral_events.get_by_id(id).await.into_result() {
                Ok(event) => event,
                Err(e) if e.is_not_found() => {
                    println!("Referral event #{} not found.", id);
                    return Ok(());
                }
                Err(e) => return Err(anyhow::Error::new(e).context("Failed to fetch referral event")),
            };
            let now = Utc::now();

            println!("Referral event #{}", event.id);
            println!("Title: {}", event.job_title);
            println!("Company: {}", event.company);
            if !event.location.is_empty() {
                println!("Location: {}", event.location);
            }
            println!(
                "Applicants: {}/{} ({}% full)",
                event.applicants,
                event.max_applicants,
                views::occupancy(&event)
            );
            println!("Expires: {} ({})", event.expiry_date, expiry_badge(&event, now));
            if !event.posted_by.is_empty() {
                println!("Posted by: {}", event.posted_by);
            }
            if !event.job_url.is_empty() {
                println!("URL: {}", event.job_url);
            }
            if !event.tags.is_empty() {
                println!("Tags: {}", event.tags.join(", "));
            }
            if !event.requirements.is_empty() {
                println!("\n--- Requirements ---\n{}", textwrap::fill(&event.requirements, 78));
            }
            if views::can_apply(&event, now) {
                println!("\nApply with: referhub apply {}", event.id);
            } else if event.is_full() {
                println!("\nThis event is full.");
            } else {
                println!("\nThis event has expired.");
            }
        }

        Commands::CreateEvent {
            company,
            title,
            location,
            url,
            max_applicants,
            expiry,
            requirements,
            tags,
        } => {
            let session = require_session(session)?;
            if session.user.role != Role::Referrer {
                bail!("Only referrers can post referral events.");
            }
            let date = NaiveDate::parse_from_str(expiry.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid expiry date '{}', expected YYYY-MM-DD", expiry))?;

            let new_event = NewReferralEvent {
                company,
                job_title: title,
                location,
                max_applicants,
                expiry_date: NewReferralEvent::expiry_from_date(date),
                posted_by: session.user.email.clone(),
                requirements,
                job_url: url,
                tags: parse_tags(&tags),
                ..Default::default()
            };
            let created = client
                .referral_events
                .create(&new_event)
                .await
                .into_result()
                .context("Failed to create referral event")?;
            println!("Created referral event #{} ({})", created.id, created.job_title);
        }

        Commands::Apply {
            event_id,
            name,
            email,
            linkedin,
            job_url,
            experience,
            skills,
            message,
            resume,
        } => {
            let session = require_session(session)?;
            let event = client
                .referral_events
                .get_by_id(event_id)
                .await
                .into_result()
                .with_context(|| format!("Failed to fetch referral event #{}", event_id))?;
            let now = Utc::now();
            if !views::can_apply(&event, now) {
                bail!(
                    "Referral event #{} is not accepting applications ({}).",
                    event_id,
                    expiry_badge(&event, now)
                );
            }

            let form = ApplicationForm {
                name: name.unwrap_or_else(|| session.user.display_name()),
                email: email.unwrap_or_else(|| session.user.email.clone()),
                linkedin,
                job_url,
                experience,
                skills: skills.iter().flat_map(|s| parse_tags(s)).collect(),
                message: message.clone(),
                resume_file_path: resume,
            };
            let recorded = client
                .apply_and_record(&event, &form.into(), now, &message)
                .await
                .into_result()
                .context("Failed to submit application")?;
            if recorded.is_none() {
                println!("Note: the application was sent but is not yet listed under `referhub applied`.");
            }
            println!("Applied to {} at {}.", event.job_title, event.company);
        }

        Commands::Applied { status } => {
            let session = require_session(session)?;
            let controller =
                AppliedReferralsController::applied_referrals(client.applied_referrals.clone());
            controller.activate(Some(session.identity())).await;
            let state = loaded(controller.state())?;

            let counts = StatusCounts::tally(state.data.iter().map(|r| r.status));
            let tab = status.map_or(StatusTab::All, |s| StatusTab::Only(s.into()));
            let referrals: Vec<_> = state.data.iter().filter(|r| tab.matches(r.status)).collect();

            println!(
                "All: {}  Pending: {}  Shortlisted: {}  Rejected: {}",
                counts.total(),
                counts.pending,
                counts.shortlisted,
                counts.rejected
            );
            if referrals.is_empty() {
                println!("No referrals found.");
            } else {
                println!("{:<6} {:<18} {:<28} {:<20} {:<12}", "ID", "COMPANY", "TITLE", "STATUS", "APPLIED");
                println!("{}", "-".repeat(88));
                for referral in referrals {
                    println!(
                        "{:<6} {:<18} {:<28} {:<20} {:<12}",
                        referral.id,
                        truncate(&referral.company, 16),
                        truncate(&referral.job_title, 26),
                        referral.status.label(),
                        truncate(&referral.created_at, 10)
                    );
                }
            }
        }

        Commands::Analytics => {
            let session = require_session(session)?;
            if session.user.role != Role::Referrer {
                bail!("Analytics are available to referrers only.");
            }
            let controller = ReferralEventsController::referral_events(client.referral_events.clone());
            controller.activate(Some(session.identity())).await;
            let state = loaded(controller.state())?;
            let analytics = EventAnalytics::compute(&state.data);

            println!("Events posted:     {}", analytics.total_events);
            println!("Total applicants:  {}", analytics.total_applicants);
            println!("Shortlisted (est): {}", analytics.shortlisted);
            println!("Pending (est):     {}", analytics.pending);

            if !state.data.is_empty() {
                println!("\n{:<6} {:<28} {:<10} {:>6}", "ID", "TITLE", "SLOTS", "FULL");
                println!("{}", "-".repeat(53));
                for event in &state.data {
                    println!(
                        "{:<6} {:<28} {:<10} {:>5}%",
                        event.id,
                        truncate(&event.job_title, 26),
                        format!("{}/{}", event.applicants, event.max_applicants),
                        views::occupancy(event)
                    );
                }
            }
        }

        Commands::Feedback { kind, message } => {
            if message.trim().is_empty() {
                bail!("Feedback message cannot be empty.");
            }
            let feedback = Feedback {
                kind: kind.into(),
                message,
            };
            client
                .feedback
                .submit(&feedback)
                .await
                .into_result()
                .context("Failed to send feedback")?;
            println!("Thanks for the feedback!");
        }

        Commands::Login { email, password } => {
            let auth = client
                .auth
                .login(&email, &password)
                .await
                .into_result()
                .context("Login failed")?;
            let session = Session::from(auth);
            store.save(&session).context("Failed to save session")?;
            println!("Signed in as {} ({}).", session.user.email, session.user.role);
        }

        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            role,
        } => {
            let sign_up = SignUp {
                first_name,
                last_name,
                email,
                password,
                role: role.into(),
            };
            let auth = client
                .auth
                .register(&sign_up)
                .await
                .into_result()
                .context("Registration failed")?;
            let session = Session::from(auth);
            store.save(&session).context("Failed to save session")?;
            println!("Welcome, {}! Signed in as {}.", session.user.display_name(), session.user.role);
        }

        Commands::Logout => {
            store.clear().context("Failed to clear session")?;
            println!("Signed out.");
        }

        Commands::Whoami => match session {
            Some(session) => {
                println!("{} <{}>", session.user.display_name(), session.user.email);
                println!("Role: {}", session.user.role);
            }
            None => println!("Not signed in."),
        },
    }

    Ok(())
}

fn require_session(session: Option<Session>) -> Result<Session> {
    session.ok_or_else(|| anyhow!("Not signed in. Run `referhub login <email> <password>` first."))
}

/// Turns a failed controller state into an error for the CLI.
fn loaded<T>(state: ResourceState<T>) -> Result<ResourceState<T>> {
    match &state.error {
        Some(error) => Err(anyhow!("{}", error)),
        None => Ok(state),
    }
}

fn expiry_badge(event: &ReferralEvent, now: chrono::DateTime<Utc>) -> String {
    match views::days_until_expiry(&event.expiry_date, now) {
        Some(days) => match ExpiryClass::classify(days) {
            ExpiryClass::Expired => ExpiryClass::Expired.label().to_string(),
            class => format!("{}, {}d left", class.label(), days),
        },
        None => ExpiryClass::Normal.label().to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
