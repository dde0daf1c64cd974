//! Request classification.
//!
//! Turns the few fields the HTTP layer hands over (host, method, byte
//! lengths) into the keys the registry aggregates on.

/// Bucket used for requests that arrive without a host.
pub const NO_HOST: &str = "(no-host)";

/// Bytes of the request line not covered by the method and target
/// (separators, protocol version, CRLF).
pub const REQUEST_LINE_OVERHEAD: u64 = 11;

/// Coarse method bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodCategory {
    Get,
    Post,
    Other,
}

impl MethodCategory {
    /// Classify a method token. Matching is case-sensitive, so `get` is `Other`.
    pub fn from_method(method: &str) -> Self {
        match method {
            "GET" => MethodCategory::Get,
            "POST" => MethodCategory::Post,
            _ => MethodCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodCategory::Get => "GET",
            MethodCategory::Post => "POST",
            MethodCategory::Other => "OTHER",
        }
    }
}

/// Byte lengths of the parts of a request, as received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSizes {
    pub header: u64,
    pub body: u64,
    pub method: u64,
    pub uri: u64,
}

impl RequestSizes {
    /// Approximate wire size of the whole request.
    pub fn estimate(&self) -> u64 {
        self.header
            .saturating_add(self.body)
            .saturating_add(self.method)
            .saturating_add(self.uri)
            .saturating_add(REQUEST_LINE_OVERHEAD)
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub host_key: String,
    pub method: MethodCategory,
    pub size_estimate: u64,
}

/// Normalize a host into its registry key.
pub fn host_key(raw_host: &str) -> String {
    if raw_host.is_empty() {
        NO_HOST.to_string()
    } else {
        raw_host.to_lowercase()
    }
}

/// Derive the host key, method bucket and size estimate for one request.
pub fn classify(raw_host: &str, raw_method: &str, sizes: &RequestSizes) -> Classified {
    Classified {
        host_key: host_key(raw_host),
        method: MethodCategory::from_method(raw_method),
        size_estimate: sizes.estimate(),
    }
}
