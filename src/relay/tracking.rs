// file: src/relay/tracking.rs
// description: first-touch attribution captured per visitor session
// reference: utm parameter and referrer conventions

use crate::config::TrackingConfig;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

pub const DIRECT_SOURCE: &str = "direct";

const SOURCE_PARAMS: [&str; 3] = ["source", "channel", "utm_source"];
const CONTEXT_PARAMS: [&str; 2] = ["context", "notes"];

/// Known referrer domains and the source they are reported as.
const REFERRER_SOURCES: [(&str, &str); 7] = [
    ("facebook.com", "facebook"),
    ("fb.com", "facebook"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("instagram.com", "instagram"),
    ("linkedin.com", "linkedin"),
    ("reddit.com", "reddit"),
];

/// What the visitor's landing page looked like: its query parameters and the
/// referring url, if any.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandingVisit {
    #[serde(default)]
    pub query: HashMap<String, String>,
    pub referrer: Option<String>,
}

impl LandingVisit {
    fn first_param(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.query.get(*name))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTracking {
    pub source: String,
    pub context: Option<String>,
}

impl Default for SourceTracking {
    fn default() -> Self {
        Self {
            source: DIRECT_SOURCE.to_string(),
            context: None,
        }
    }
}

impl SourceTracking {
    /// Explicit `source`/`channel`/`utm_source` parameters win, then the
    /// referrer, then `direct`.
    pub fn capture(visit: &LandingVisit) -> Self {
        let source = match visit.first_param(&SOURCE_PARAMS) {
            Some(param) => param.to_string(),
            None => visit
                .referrer
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(classify_referrer)
                .unwrap_or_else(|| DIRECT_SOURCE.to_string()),
        };

        Self {
            source,
            context: visit.first_param(&CONTEXT_PARAMS).map(str::to_string),
        }
    }
}

/// Maps a referring url to a short source name. Unknown hosts are reported
/// as the host itself; unparseable referrers verbatim.
pub fn classify_referrer(referrer: &str) -> String {
    let host = match Url::parse(referrer)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
    {
        Some(host) => host,
        None => return referrer.to_string(),
    };

    if let Some((_, source)) = REFERRER_SOURCES
        .iter()
        .find(|(domain, _)| host_matches(&host, domain))
    {
        return source.to_string();
    }
    if host.split('.').any(|label| label == "google") {
        return "google".to_string();
    }
    if host_matches(&host, "bing.com") {
        return "bing".to_string();
    }

    host
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[derive(Debug, Clone)]
struct Session {
    tracking: SourceTracking,
    captured_at: Instant,
}

/// Attribution per client session token. The first capture for a session
/// sticks; later visits only read it back.
///
/// Sessions expire after `ttl`. Expired sessions are dropped whenever a new
/// one is inserted, and the oldest is evicted once `max_sessions` is reached.
#[derive(Debug)]
pub struct TrackingStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl TrackingStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(Duration::from_secs(config.session_ttl_secs), config.max_sessions)
    }

    fn is_live(&self, session: &Session, now: Instant) -> bool {
        now.duration_since(session.captured_at) < self.ttl
    }

    pub async fn capture_once(&self, session_id: &str, visit: &LandingVisit) -> SourceTracking {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get(session_id)
            && self.is_live(session, now)
        {
            return session.tracking.clone();
        }

        sessions.retain(|_, session| self.is_live(session, now));
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.captured_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                debug!("Tracking store full, evicted oldest session");
            }
        }

        let tracking = SourceTracking::capture(visit);
        debug!("Captured source {} for new session", tracking.source);
        sessions.insert(
            session_id.to_string(),
            Session {
                tracking: tracking.clone(),
                captured_at: now,
            },
        );
        tracking
    }

    /// Replaces the stored context; blank values leave it untouched.
    pub async fn update_context(&self, session_id: &str, context: &str) -> Option<SourceTracking> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        if !self.is_live(session, now) {
            return None;
        }

        let context = context.trim();
        if !context.is_empty() {
            session.tracking.context = Some(context.to_string());
        }
        Some(session.tracking.clone())
    }

    pub async fn get(&self, session_id: &str) -> Option<SourceTracking> {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|session| self.is_live(session, now))
            .map(|session| session.tracking.clone())
    }

    /// Stored sessions, including expired ones not yet dropped.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::from_config(&TrackingConfig::default())
    }
}
