//! # roster-remote
//!
//! Blocking HTTP adapters behind the reconciler's gateway traits:
//! - [`SheetsClient`]: Google Sheets v4 `values` API ([`roster_sync::SheetGateway`])
//! - [`GitlabClient`]: GitLab v4 REST API ([`roster_sync::HostingGateway`])

pub mod error;
pub mod gitlab;
pub mod sheets;

pub use error::RemoteError;
pub use gitlab::GitlabClient;
pub use sheets::SheetsClient;

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single URL path segment (`/` included).
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
        .build()
}
