//! Session store
//!
//! Sessions are held in a concurrent TTL cache keyed by the id in the
//! `session` cookie. Each session carries the applicant identity and one
//! [`JourneyState`] per form.

use chrono::{DateTime, Utc};
use grants_config::{DevToolsConfig, SessionConfig};
use grants_state::{keys, FormState, VisitedSections};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Name of the cookie holding the session id
pub const SESSION_COOKIE: &str = "session";

/// Session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate new session id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cookie value
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who the applicant is and which business they act for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Single Business Identifier
    pub sbi: Option<String>,
    /// Customer Reference Number
    pub crn: Option<String>,
    /// Firm Reference Number
    pub frn: Option<String>,
    /// Defra identity id
    pub defra_id: Option<String>,
}

impl Identity {
    /// Demo identity used when dev tools are enabled
    #[must_use]
    pub fn demo(dev_tools: &DevToolsConfig) -> Self {
        Self {
            sbi: Some(dev_tools.demo_sbi.clone()),
            crn: None,
            frn: None,
            defra_id: None,
        }
    }

    /// Write identity fields into journey answers
    ///
    /// Unset fields leave the answers untouched.
    pub fn apply_to(&self, state: &mut FormState) {
        let fields = [
            (keys::SBI, &self.sbi),
            (keys::CRN, &self.crn),
            (keys::FRN, &self.frn),
            (keys::DEFRA_ID, &self.defra_id),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                state.insert(key, Value::String(value.clone()));
            }
        }
    }
}

/// Record of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    /// Reference shown to the applicant
    pub reference: String,
    /// When GAS accepted the submission
    pub submitted_at: DateTime<Utc>,
    /// Status GAS answered with
    pub gas_status: u16,
}

/// Per-form journey data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyState {
    /// Answers given so far
    pub answers: FormState,
    /// Sections the applicant has passed through
    pub visited_sections: VisitedSections,
    /// Set once the application has been submitted
    pub submission: Option<SubmissionRecord>,
}

impl JourneyState {
    /// Store the submission and drop the answers that produced it
    pub fn record_submission(&mut self, reference: impl Into<String>, gas_status: u16) {
        self.answers.clear();
        self.visited_sections = VisitedSections::new();
        self.submission = Some(SubmissionRecord {
            reference: reference.into(),
            submitted_at: Utc::now(),
            gas_status,
        });
    }

    /// Whether the journey has been submitted
    #[inline]
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }
}

/// One browser session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id
    pub id: SessionId,
    /// Applicant identity
    pub identity: Identity,
    /// Journeys keyed by form slug
    pub journeys: HashMap<String, JourneyState>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create session with an identity
    #[must_use]
    pub fn new(id: SessionId, identity: Identity) -> Self {
        Self {
            id,
            identity,
            journeys: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Journey for a form, if started
    #[inline]
    #[must_use]
    pub fn journey(&self, slug: &str) -> Option<&JourneyState> {
        self.journeys.get(slug)
    }

    /// Journey for a form, starting it when needed
    pub fn journey_mut(&mut self, slug: &str) -> &mut JourneyState {
        self.journeys.entry(slug.to_string()).or_default()
    }

    /// Forget a journey
    pub fn clear_journey(&mut self, slug: &str) -> Option<JourneyState> {
        self.journeys.remove(slug)
    }
}

/// Concurrent session cache with time-to-live
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Cache<SessionId, Session>,
    ttl: Duration,
}

impl SessionStore {
    /// Create store from session settings
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let ttl = Duration::from_millis(config.ttl_ms);
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    /// Configured time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load a stored session
    pub async fn load(&self, id: SessionId) -> Option<Session> {
        self.inner.get(&id).await
    }

    /// Load the session named by a cookie value, or start a new one
    ///
    /// A new session is not stored until [`SessionStore::save`] is called.
    pub async fn load_or_create<F>(&self, cookie: Option<&str>, identity: F) -> Session
    where
        F: FnOnce() -> Identity,
    {
        if let Some(id) = cookie.and_then(SessionId::parse) {
            if let Some(session) = self.load(id).await {
                return session;
            }
            tracing::debug!(session = %id, "session expired or unknown, starting new one");
        }
        Session::new(SessionId::new(), identity())
    }

    /// Store a session, resetting its TTL
    pub async fn save(&self, session: Session) {
        self.inner.insert(session.id, session).await;
    }

    /// Drop a session
    pub async fn remove(&self, id: SessionId) {
        self.inner.invalidate(&id).await;
    }

    /// Approximate number of stored sessions
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}
