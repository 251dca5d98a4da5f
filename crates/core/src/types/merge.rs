//! Wire types for the cart merge endpoint.

use serde::{Deserialize, Serialize};

/// Response body of `POST {base}/cart/merge`.
///
/// The endpoint omits `itemsAdded` (and sometimes `message`) on failure
/// responses, so both default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Whether the server accepted and processed the merge.
    pub success: bool,
    /// How many guest lines were added to the server-side cart.
    #[serde(default)]
    pub items_added: u32,
    /// Human-readable status from the server.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_response() {
        let response: MergeResponse = serde_json::from_str(
            r#"{"success":true,"itemsAdded":2,"message":"2 item(s) merged into your cart"}"#,
        )
        .unwrap();

        assert!(response.success);
        assert_eq!(response.items_added, 2);
        assert_eq!(response.message, "2 item(s) merged into your cart");
    }

    #[test]
    fn test_decode_failure_without_items_added() {
        // Failure responses omit the itemsAdded field entirely.
        let response: MergeResponse =
            serde_json::from_str(r#"{"success":false,"message":"Not signed in"}"#).unwrap();

        assert!(!response.success);
        assert_eq!(response.items_added, 0);
    }

    #[test]
    fn test_decode_minimal_response() {
        let response: MergeResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();

        assert!(response.success);
        assert_eq!(response.items_added, 0);
        assert_eq!(response.message, "");
    }
}
