//! Typed clients for each REST resource.
//!
//! Each client is a thin layer over [`RestApi`]; all of them return
//! [`Envelope`]s and parse payloads into entity types at this boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::models::{
    AppliedReferral, Company, Feedback, Job, NewAppliedReferral, NewReferralEvent,
    ReferralApplication, ReferralEvent,
};
use crate::session::{AuthResponse, SignUp};
use crate::transport::{ApiRequest, Envelope, Transport};

pub type SharedTransport = Arc<dyn Transport>;

/// Category value that means "no tag filter".
pub const ALL_TAGS: &str = "All";

const JOBS: &str = "/jobs";
const REFERRAL_EVENTS: &str = "/referral-events";
const APPLIED_REFERRALS: &str = "/applied-referrals";
const FEEDBACK: &str = "/feedback";
const AUTH_LOGIN: &str = "/api/auth/login";
const AUTH_REGISTER: &str = "/api/auth/register";

/// Generic JSON calls, optionally authenticated with a bearer token.
#[derive(Clone)]
pub struct RestApi {
    transport: SharedTransport,
    token: Option<String>,
}

impl RestApi {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            transport,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub async fn send(&self, request: ApiRequest) -> Envelope<Value> {
        self.transport
            .send(request.with_bearer(self.token.as_deref()))
            .await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Envelope<T> {
        self.send(ApiRequest::get(endpoint)).await.decode()
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Envelope<T> {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(e) => return Envelope::Failure(ApiError::Shape(format!("request body: {}", e))),
        };
        self.send(ApiRequest::post(endpoint, body)).await.decode()
    }

    /// GET a list endpoint; the payload must be a JSON array.
    pub async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Envelope<Vec<T>> {
        let request = query
            .iter()
            .fold(ApiRequest::get(endpoint), |req, (k, v)| req.with_query(k, v));
        self.send(request).await.decode_list()
    }
}

/// Companies are served from the `/jobs` listing.
#[derive(Clone)]
pub struct CompaniesApi {
    rest: RestApi,
}

impl CompaniesApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    pub async fn list(&self) -> Envelope<Vec<Company>> {
        self.rest.list(JOBS, &[]).await
    }

    pub async fn get_by_id(&self, id: i64) -> Envelope<Company> {
        self.rest.get(&format!("{}/{}", JOBS, id)).await
    }

    /// Blank queries fall back to the full listing.
    pub async fn search(&self, query: &str) -> Envelope<Vec<Company>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }
        self.rest.list(JOBS, &[("search", query)]).await
    }

    /// A blank tag or [`ALL_TAGS`] falls back to the full listing.
    pub async fn filter_by_tag(&self, tag: &str) -> Envelope<Vec<Company>> {
        let tag = tag.trim();
        if tag.is_empty() || tag == ALL_TAGS {
            return self.list().await;
        }
        self.rest.list(JOBS, &[("tag", tag)]).await
    }
}

#[derive(Clone)]
pub struct ReferralEventsApi {
    rest: RestApi,
}

impl ReferralEventsApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    pub async fn list(&self) -> Envelope<Vec<ReferralEvent>> {
        self.rest.list(REFERRAL_EVENTS, &[]).await
    }

    /// Events posted by one referrer.
    pub async fn list_for_referrer(&self, email: &str) -> Envelope<Vec<ReferralEvent>> {
        let email = email.trim();
        if email.is_empty() {
            return Envelope::Failure(ApiError::MissingIdentity);
        }
        self.rest.list(REFERRAL_EVENTS, &[("referrer", email)]).await
    }

    pub async fn get_by_id(&self, id: i64) -> Envelope<ReferralEvent> {
        self.rest.get(&format!("{}/{}", REFERRAL_EVENTS, id)).await
    }

    pub async fn create(&self, event: &NewReferralEvent) -> Envelope<ReferralEvent> {
        self.rest.post(REFERRAL_EVENTS, event).await
    }

    /// Submits a candidate's application. The response body is not interpreted.
    pub async fn apply(&self, event_id: i64, application: &ReferralApplication) -> Envelope<Value> {
        self.rest
            .post(&format!("{}/{}/apply", REFERRAL_EVENTS, event_id), application)
            .await
    }
}

#[derive(Clone)]
pub struct AppliedReferralsApi {
    rest: RestApi,
}

impl AppliedReferralsApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    /// A candidate's applications.
    pub async fn list_for(&self, email: &str) -> Envelope<Vec<AppliedReferral>> {
        let email = email.trim();
        if email.is_empty() {
            return Envelope::Failure(ApiError::MissingIdentity);
        }
        self.rest.list(APPLIED_REFERRALS, &[("email", email)]).await
    }

    pub async fn get_by_id(&self, id: i64) -> Envelope<AppliedReferral> {
        self.rest.get(&format!("{}/{}", APPLIED_REFERRALS, id)).await
    }

    pub async fn create(&self, referral: &NewAppliedReferral) -> Envelope<AppliedReferral> {
        self.rest.post(APPLIED_REFERRALS, referral).await
    }
}

#[derive(Clone)]
pub struct JobsApi {
    rest: RestApi,
}

impl JobsApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    pub async fn list(&self) -> Envelope<Vec<Job>> {
        self.rest.list(JOBS, &[]).await
    }

    pub async fn get_by_id(&self, id: i64) -> Envelope<Job> {
        self.rest.get(&format!("{}/{}", JOBS, id)).await
    }

    pub async fn search(&self, query: &str) -> Envelope<Vec<Job>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }
        self.rest.list(JOBS, &[("search", query)]).await
    }
}

#[derive(Clone)]
pub struct FeedbackApi {
    rest: RestApi,
}

impl FeedbackApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    pub async fn submit(&self, feedback: &Feedback) -> Envelope<Value> {
        self.rest.post(FEEDBACK, feedback).await
    }
}

#[derive(Clone)]
pub struct AuthApi {
    rest: RestApi,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthApi {
    pub fn new(rest: RestApi) -> Self {
        Self { rest }
    }

    pub async fn login(&self, email: &str, password: &str) -> Envelope<AuthResponse> {
        self.rest
            .post(AUTH_LOGIN, &Credentials { email, password })
            .await
    }

    pub async fn register(&self, sign_up: &SignUp) -> Envelope<AuthResponse> {
        self.rest.post(AUTH_REGISTER, sign_up).await
    }
}

/// All resource clients over one transport.
#[derive(Clone)]
pub struct ApiClient {
    pub rest: RestApi,
    pub companies: CompaniesApi,
    pub referral_events: ReferralEventsApi,
    pub applied_referrals: AppliedReferralsApi,
    pub jobs: JobsApi,
    pub feedback: FeedbackApi,
    pub auth: AuthApi,
}

impl ApiClient {
    pub fn new(transport: SharedTransport) -> Self {
        Self::with_token(transport, None)
    }

    pub fn with_token(transport: SharedTransport, token: Option<String>) -> Self {
        let rest = RestApi::new(transport).with_token(token);
        Self {
            companies: CompaniesApi::new(rest.clone()),
            referral_events: ReferralEventsApi::new(rest.clone()),
            applied_referrals: AppliedReferralsApi::new(rest.clone()),
            jobs: JobsApi::new(rest.clone()),
            feedback: FeedbackApi::new(rest.clone()),
            auth: AuthApi::new(rest.clone()),
            rest,
        }
    }

    /// Applies to `event`, then records the application so it shows up in the
    /// candidate's applied list. Only the apply itself can fail the call; a
    /// record that could not be written yields `Success(None)`.
    pub async fn apply_and_record(
        &self,
        event: &ReferralEvent,
        application: &ReferralApplication,
        now: DateTime<Utc>,
        notes: &str,
    ) -> Envelope<Option<AppliedReferral>> {
        if let Envelope::Failure(err) = self.referral_events.apply(event.id, application).await {
            return Envelope::Failure(err);
        }

        let record = NewAppliedReferral::for_event(event, now, notes);
        match self.applied_referrals.create(&record).await {
            Envelope::Success(created) => Envelope::Success(Some(created)),
            Envelope::Failure(err) => {
                warn!(event_id = event.id, error = %err, "failed to record applied referral");
                Envelope::Success(None)
            }
        }
    }
}
