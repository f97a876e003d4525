use serde::{Deserialize, Serialize};

/// Notice shown while a shortening request is in flight.
pub const PROCESSING_NOTICE: &str = "Generating your short link, please wait...";

/// Ttl is one entry of the fixed option table offered next to the URL input.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Ttl {
    #[default]
    Never,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Ttl {
    /// Options in display order. Index `i` of the option list maps to `ALL[i]`.
    pub const ALL: [Ttl; 6] = [Ttl::Never, Ttl::Hour, Ttl::Day, Ttl::Week, Ttl::Month, Ttl::Year];

    pub fn from_index(index: usize) -> Option<Ttl> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Ttl::Never => 0,
            Ttl::Hour => 1,
            Ttl::Day => 2,
            Ttl::Week => 3,
            Ttl::Month => 4,
            Ttl::Year => 5,
        }
    }

    /// Lifetime in seconds as the endpoint expects it, `-1` meaning no expiry.
    pub fn seconds(self) -> i64 {
        match self {
            Ttl::Never => -1,
            Ttl::Hour => 3_600,
            Ttl::Day => 86_400,
            Ttl::Week => 604_800,
            Ttl::Month => 2_592_000,
            Ttl::Year => 31_536_000,
        }
    }

    pub fn from_seconds(seconds: i64) -> Option<Ttl> {
        Self::ALL.into_iter().find(|ttl| ttl.seconds() == seconds)
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Ttl::Never => "never expires",
            Ttl::Hour => "1 hour",
            Ttl::Day => "1 day",
            Ttl::Week => "1 week",
            Ttl::Month => "1 month",
            Ttl::Year => "1 year",
        };
        write!(f, "{}", label)
    }
}

/// ShortenRequest is the (origin, ttl) pair captured when a submit is accepted.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShortenRequest {
    pub origin: String, // the long URL exactly as the user typed it
    pub ttl: i64,       // seconds, -1 for no expiry
}

impl ShortenRequest {
    pub fn new(origin: &str, ttl: Ttl) -> Self {
        Self {
            origin: origin.to_string(),
            ttl: ttl.seconds(),
        }
    }

    /// returns `origin=<component-encoded origin>&ttl=<seconds>`.
    pub fn query_string(&self) -> String {
        format!("origin={}&ttl={}", url_escape::encode_component(&self.origin), self.ttl)
    }
}

impl std::fmt::Display for ShortenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ttl: {}s)", self.origin, self.ttl)
    }
}

/// CreatedLink is one entry of the endpoint's per-caller history.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreatedLink {
    pub id: u64,
    pub origin: String,
    pub alias: String,
    pub ip: String,
    pub ctime: chrono::DateTime<chrono::Utc>,
    pub mtime: chrono::DateTime<chrono::Utc>,
    pub expired: bool,
    pub ttl: i64, // nanoseconds; negative means the link never expires
}

impl CreatedLink {
    pub fn ttl_option(&self) -> Option<Ttl> {
        if self.ttl < 0 {
            return Some(Ttl::Never);
        }
        Ttl::from_seconds(self.ttl / 1_000_000_000)
    }
}

impl std::fmt::Display for CreatedLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.alias, self.origin)?;
        match self.ttl_option() {
            Some(ttl) => write!(f, " ({})", ttl)?,
            None => write!(f, " (ttl: {}s)", self.ttl / 1_000_000_000)?,
        }
        if self.expired {
            write!(f, " [expired]")?;
        }
        write!(f, " [created: {}]", self.ctime)?;
        Ok(())
    }
}

/// LinkHistory is the body returned by `GET /history`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinkHistory {
    #[serde(default)]
    pub note: String,
    pub ip: String,
    #[serde(default)]
    pub links: Vec<CreatedLink>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Style {
    Normal,
    Error,
}

/// View is what the result region shows. Each new view replaces the previous one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum View {
    Notice(String),
    Link(String),
    Error(String),
}

impl View {
    pub fn processing() -> Self {
        View::Notice(PROCESSING_NOTICE.to_string())
    }

    pub fn style(&self) -> Style {
        match self {
            View::Error(_) => Style::Error,
            View::Notice(_) | View::Link(_) => Style::Normal,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            View::Notice(text) | View::Link(text) | View::Error(text) => text,
        }
    }
}
