//! Client library for the referral marketplace backend: a total transport,
//! typed resource clients, stateful list controllers and pure view helpers.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;
pub mod views;

pub use api::ApiClient;
pub use config::ApiConfig;
pub use controller::{FetchPhase, ListController, ResourceState};
pub use error::{ApiError, SessionError, TransitionError};
pub use session::{Identity, Role, Session, SessionStore};
pub use transport::{Envelope, HttpTransport, Transport};
