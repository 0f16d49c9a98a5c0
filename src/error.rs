use ::scraper::error::SelectorErrorKind;
use std::num::ParseIntError;

/// All errors that can occur while talking to volleynet or parsing its pages.
#[derive(thiserror::Error, Debug)]
pub enum VolleynetError {
    /// The HTTP client could not be constructed from the given configuration.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// Failed to parse an integer from scraped text.
    #[error("failed to parse integer: {0}")]
    IntParse(#[from] ParseIntError),

    /// Failed to parse a date from scraped text.
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// An expected HTML element was not found on the page.
    #[error("expected element not found: {context}")]
    ElementNotFound { context: &'static str },

    /// A team table row had a column count none of the known layouts use.
    #[error("unknown tournament player table row with {columns} columns")]
    UnknownRowShape { columns: usize },

    /// A player cell did not carry a profile link with the player's id.
    #[error("player profile link missing or without id")]
    MissingPlayerId,

    /// No valid session, or the login was refused.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The entry form was accepted by the server but the entry did not go through.
    #[error("entry to tournament {tournament_id} was rejected")]
    EntryRejected { tournament_id: u32 },
}

impl VolleynetError {
    /// The remote site could not be reached or answered with an error status.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::UnexpectedStatus { .. } | Self::ResponseBody { .. }
        )
    }

    /// The markup could not be turned into records.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::Selector(_)
                | Self::IntParse(_)
                | Self::DateParse(_)
                | Self::ElementNotFound { .. }
                | Self::UnknownRowShape { .. }
                | Self::MissingPlayerId
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// The remote site was reached but refused the action.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EntryRejected { .. })
    }
}

impl<'a> From<SelectorErrorKind<'a>> for VolleynetError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        VolleynetError::Selector(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VolleynetError>;
