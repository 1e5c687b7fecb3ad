//! Stateful list controllers: one per resource, each owning
//! loading/error/data state for a consumer.
//!
//! A controller moves `Idle -> Loading -> Ready | Failed`. Loading is entered
//! before the first await of a fetch; the result is applied only if no newer
//! fetch has been issued since (each fetch carries a generation number) and the
//! controller has not been detached. Failures never escape as errors; they are
//! recorded in [`ResourceState::error`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use tracing::{debug, warn};

use crate::api::{AppliedReferralsApi, CompaniesApi, ReferralEventsApi};
use crate::error::ApiError;
use crate::models::{AppliedReferral, Company, ReferralEvent};
use crate::session::{Identity, Role};
use crate::transport::Envelope;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: FetchPhase,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            is_loading: false,
            error: None,
            phase: FetchPhase::Idle,
        }
    }
}

impl<T> ResourceState<T> {
    /// Fetched successfully but nothing came back.
    pub fn is_empty_success(&self) -> bool {
        self.phase == FetchPhase::Ready && self.data.is_empty()
    }
}

/// Where a controller's list comes from.
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Clone + Send + Sync;

    /// Short name used in logs and fallback error text.
    fn label(&self) -> &'static str;

    /// Sources that scope by user never fetch without an identity.
    fn requires_identity(&self) -> bool {
        false
    }

    async fn fetch(&self, identity: Option<&Identity>) -> Envelope<Vec<Self::Item>>;
}

struct Slot<T> {
    state: ResourceState<T>,
    generation: u64,
    identity: Option<Identity>,
    alive: bool,
}

pub struct ListController<S: ListSource> {
    source: S,
    slot: Mutex<Slot<S::Item>>,
}

impl<S: ListSource> ListController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slot: Mutex::new(Slot {
                state: ResourceState::default(),
                generation: 0,
                identity: None,
                alive: true,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> ResourceState<S::Item> {
        self.slot.lock().state.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.slot.lock().identity.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.slot.lock().alive
    }

    /// First activation with whatever identity is known.
    pub async fn activate(&self, identity: Option<Identity>) {
        self.slot.lock().identity = identity;
        self.refetch().await;
    }

    /// Re-fetches when the identity actually changes. Results still in flight
    /// for the previous identity are discarded.
    pub async fn set_identity(&self, identity: Option<Identity>) {
        {
            let mut slot = self.slot.lock();
            if slot.identity == identity {
                return;
            }
            debug!(resource = self.source.label(), "identity changed");
            slot.identity = identity;
        }
        self.refetch().await;
    }

    /// Runs the source's fetch again. Overlapping calls are allowed; only the
    /// most recently issued one may update state.
    pub async fn refetch(&self) {
        self.run_with(|identity| async move { self.source.fetch(identity.as_ref()).await })
            .await;
    }

    /// Drives an arbitrary fetch through the same state transitions.
    pub async fn run_with<F, Fut>(&self, fetch: F)
    where
        F: FnOnce(Option<Identity>) -> Fut,
        Fut: Future<Output = Envelope<Vec<S::Item>>>,
    {
        let label = self.source.label();
        let (generation, identity) = {
            let mut slot = self.slot.lock();
            if !slot.alive {
                return;
            }
            slot.generation += 1;

            if self.source.requires_identity() && slot.identity.is_none() {
                debug!(resource = label, "no identity, staying idle");
                slot.state = ResourceState::default();
                return;
            }

            slot.state.is_loading = true;
            slot.state.error = None;
            slot.state.phase = FetchPhase::Loading;
            (slot.generation, slot.identity.clone())
        };

        debug!(resource = label, generation, "fetch started");
        let envelope = fetch(identity).await;

        let mut slot = self.slot.lock();
        if !slot.alive {
            debug!(resource = label, generation, "controller detached, dropping result");
            return;
        }
        if slot.generation != generation {
            debug!(
                resource = label,
                generation,
                current = slot.generation,
                "discarding stale result"
            );
            return;
        }

        slot.state = match envelope {
            Envelope::Success(data) => ResourceState {
                data,
                is_loading: false,
                error: None,
                phase: FetchPhase::Ready,
            },
            Envelope::Failure(err) => {
                warn!(resource = label, error = %err, "fetch failed");
                ResourceState {
                    data: Vec::new(),
                    is_loading: false,
                    error: Some(failure_message(&err, label)),
                    phase: FetchPhase::Failed,
                }
            }
        };
    }

    /// The consumer is gone; later completions are ignored.
    pub fn detach(&self) {
        self.slot.lock().alive = false;
    }
}

fn failure_message(err: &ApiError, label: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        format!("Failed to fetch {}", label)
    } else {
        message
    }
}

// --- Sources ---

pub struct CompaniesSource {
    api: CompaniesApi,
}

impl CompaniesSource {
    pub fn new(api: CompaniesApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for CompaniesSource {
    type Item = Company;

    fn label(&self) -> &'static str {
        "companies"
    }

    async fn fetch(&self, _identity: Option<&Identity>) -> Envelope<Vec<Company>> {
        self.api.list().await
    }
}

pub type CompaniesController = ListController<CompaniesSource>;

impl ListController<CompaniesSource> {
    pub fn companies(api: CompaniesApi) -> Self {
        Self::new(CompaniesSource::new(api))
    }

    /// Server-side search; a blank query reloads everything.
    pub async fn search(&self, query: &str) {
        self.run_with(|_| self.source.api.search(query)).await;
    }

    /// Server-side tag filter; `"All"` reloads everything.
    pub async fn filter_by_tag(&self, tag: &str) {
        self.run_with(|_| self.source.api.filter_by_tag(tag)).await;
    }
}

/// Candidates see every event; referrers see the events they posted.
pub struct ReferralEventsSource {
    api: ReferralEventsApi,
}

impl ReferralEventsSource {
    pub fn new(api: ReferralEventsApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for ReferralEventsSource {
    type Item = ReferralEvent;

    fn label(&self) -> &'static str {
        "referral events"
    }

    fn requires_identity(&self) -> bool {
        true
    }

    async fn fetch(&self, identity: Option<&Identity>) -> Envelope<Vec<ReferralEvent>> {
        match identity {
            None => Envelope::Failure(ApiError::MissingIdentity),
            Some(Identity {
                role: Role::Candidate,
                ..
            }) => self.api.list().await,
            Some(Identity {
                role: Role::Referrer,
                email,
            }) => self.api.list_for_referrer(email).await,
        }
    }
}

pub type ReferralEventsController = ListController<ReferralEventsSource>;

impl ListController<ReferralEventsSource> {
    pub fn referral_events(api: ReferralEventsApi) -> Self {
        Self::new(ReferralEventsSource::new(api))
    }
}

pub struct AppliedReferralsSource {
    api: AppliedReferralsApi,
}

impl AppliedReferralsSource {
    pub fn new(api: AppliedReferralsApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for AppliedReferralsSource {
    type Item = AppliedReferral;

    fn label(&self) -> &'static str {
        "applied referrals"
    }

    fn requires_identity(&self) -> bool {
        true
    }

    async fn fetch(&self, identity: Option<&Identity>) -> Envelope<Vec<AppliedReferral>> {
        match identity {
            Some(identity) => self.api.list_for(&identity.email).await,
            None => Envelope::Failure(ApiError::MissingIdentity),
        }
    }
}

pub type AppliedReferralsController = ListController<AppliedReferralsSource>;

impl ListController<AppliedReferralsSource> {
    pub fn applied_referrals(api: AppliedReferralsApi) -> Self {
        Self::new(AppliedReferralsSource::new(api))
    }
}
