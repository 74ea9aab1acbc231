use serde::{Deserialize, Serialize};

/// One per-user search-journal line. Fields are omitted from the
/// serialized JSON when unspecified, matching the bit-exact journal line
/// shape: `{"timestamp":...,"query":...,"results_count":N,
/// "search_time":F,"prefecture":"…"?,"cust_status":"…"?,"city":"…"?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEvent {
    pub timestamp: String,
    pub query: String,
    pub results_count: usize,
    pub search_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cust_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
