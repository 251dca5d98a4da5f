//! Cart merge: moving the guest cart into the signed-in shopper's cart.
//!
//! [`MergeClient`] is the HTTP layer; [`MergeBridge`] drives the full flow
//! around it: the single-flight guard, the empty-cart short-circuit, local
//! cleanup, notices, and the post-merge reload on cart views. The bridge
//! never fails its caller; every failure mode maps to a [`MergeOutcome`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use mangosteen_core::{CartLineItem, MergeResponse};

use crate::cart::GuestCartStore;
use crate::ui::{NoticeLevel, Notifier, PageHandle};

/// Path of the merge endpoint, relative to the storefront base URL.
pub const MERGE_PATH: &str = "/cart/merge";

/// Settle delay before an automatic merge fires on page load.
pub const AUTO_MERGE_DELAY: Duration = Duration::from_millis(100);

/// Delay before the post-merge reload of a cart view.
pub const RELOAD_DELAY: Duration = Duration::from_secs(1);

/// Success notice when the server sends no message of its own.
const MERGED_FALLBACK_MESSAGE: &str = "Cart merged successfully";
/// Notice for a server-side refusal.
const REJECTED_MESSAGE: &str = "Could not merge your cart";
/// Notice when the endpoint cannot be reached or answers garbage.
const UNREACHABLE_MESSAGE: &str = "Cart merge is temporarily unavailable";

/// Errors from the merge HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The request could not be sent or the response body not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("merge endpoint returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// Truncated response body for diagnostics.
        body: String,
    },

    /// The response body was not a merge response.
    #[error("merge response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// MergeClient
// =============================================================================

/// HTTP client for the storefront's cart merge endpoint.
#[derive(Clone)]
pub struct MergeClient {
    inner: Arc<MergeClientInner>,
}

struct MergeClientInner {
    client: reqwest::Client,
    endpoint: String,
}

impl MergeClient {
    /// Create a client for the storefront at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let endpoint = format!("{}{MERGE_PATH}", base_url.trim_end_matches('/'));

        Self {
            inner: Arc::new(MergeClientInner {
                client: reqwest::Client::new(),
                endpoint,
            }),
        }
    }

    /// The absolute URL requests go to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Submit guest lines for merging into the signed-in shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint is unreachable, answers with a
    /// non-success status, or returns a body that is not a merge response.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn submit(&self, items: &[CartLineItem]) -> Result<MergeResponse, MergeError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Accept", "application/json")
            .json(&items)
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "merge endpoint returned non-success status"
            );
            return Err(MergeError::Status {
                status,
                body: response_text.chars().take(200).collect(),
            });
        }

        match serde_json::from_str::<MergeResponse>(&response_text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse merge response"
                );
                Err(MergeError::Parse(e))
            }
        }
    }
}

// =============================================================================
// MergeBridge
// =============================================================================

/// What a merge attempt amounted to.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The server accepted the merge. With `items_added > 0` the local cart
    /// has been cleared; with 0 it is left in place for a later attempt.
    Merged {
        /// Guest lines the server took over.
        items_added: u32,
        /// The notice shown (server message, or the stock fallback).
        message: String,
    },
    /// The guest cart was empty; no request was made.
    NothingToMerge,
    /// The server processed the request but refused the merge. The local
    /// cart is untouched.
    Rejected {
        /// The server's stated reason.
        message: String,
    },
    /// The endpoint could not be reached or did not answer sensibly. The
    /// local cart is untouched; no retry is scheduled.
    Unreachable(MergeError),
    /// Another merge is still outstanding; this call did nothing.
    InFlight,
}

/// Drives the end-to-end merge flow.
///
/// Clones share one single-flight guard, so concurrent triggers (a page
/// load racing a manual merge button) collapse into a single request.
#[derive(Clone)]
pub struct MergeBridge {
    inner: Arc<MergeBridgeInner>,
}

struct MergeBridgeInner {
    cart: GuestCartStore,
    client: MergeClient,
    notifier: Arc<dyn Notifier>,
    page: Arc<dyn PageHandle>,
    in_flight: AtomicBool,
}

/// Releases the single-flight guard on every exit path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MergeBridge {
    /// Wire up a bridge from its collaborators.
    #[must_use]
    pub fn new(
        cart: GuestCartStore,
        client: MergeClient,
        notifier: Arc<dyn Notifier>,
        page: Arc<dyn PageHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(MergeBridgeInner {
                cart,
                client,
                notifier,
                page,
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Merge the guest cart into the signed-in shopper's server-side cart.
    ///
    /// Never fails the caller: every failure mode maps to an outcome plus a
    /// notice, and the guest cart is only cleared once the server has
    /// actually taken lines over.
    #[instrument(skip(self))]
    pub async fn merge(&self) -> MergeOutcome {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("merge already in flight, skipping");
            return MergeOutcome::InFlight;
        }
        let _guard = FlightGuard(&self.inner.in_flight);

        let cart = self.inner.cart.read();
        if cart.is_empty() {
            debug!("guest cart empty, nothing to merge");
            return MergeOutcome::NothingToMerge;
        }

        match self.inner.client.submit(cart.items()).await {
            Ok(response) if response.success => self.on_accepted(response),
            Ok(response) => {
                warn!(message = %response.message, "merge rejected by server");
                self.inner
                    .notifier
                    .notify(NoticeLevel::Error, REJECTED_MESSAGE);
                MergeOutcome::Rejected {
                    message: response.message,
                }
            }
            Err(err) => {
                warn!(error = %err, "merge attempt failed");
                self.inner
                    .notifier
                    .notify(NoticeLevel::Warning, UNREACHABLE_MESSAGE);
                MergeOutcome::Unreachable(err)
            }
        }
    }

    /// Merge automatically on page load.
    ///
    /// Returns `None` without merging on login paths (the login flow is
    /// about to navigate on its own), after the settle delay for signed-out
    /// shoppers, and for empty carts.
    #[instrument(skip(self))]
    pub async fn auto_merge_on_load(&self, signed_in: bool) -> Option<MergeOutcome> {
        if self.inner.page.path().contains("/login") {
            debug!("on a login path, skipping auto merge");
            return None;
        }

        tokio::time::sleep(AUTO_MERGE_DELAY).await;

        if !signed_in {
            debug!("shopper not signed in, skipping auto merge");
            return None;
        }
        if self.inner.cart.read().is_empty() {
            debug!("guest cart empty, skipping auto merge");
            return None;
        }

        Some(self.merge().await)
    }

    fn on_accepted(&self, response: MergeResponse) -> MergeOutcome {
        let items_added = response.items_added;

        if items_added == 0 {
            // Nothing was taken over; keep the local cart so a later merge
            // can still pick it up.
            info!("merge accepted with no items to add");
            return MergeOutcome::Merged {
                items_added: 0,
                message: response.message,
            };
        }

        if let Err(err) = self.inner.cart.clear() {
            // The server-side cart already holds the lines; a stale local
            // copy is cleared by the next successful merge.
            warn!(error = %err, "could not clear guest cart after merge");
        }

        let message = if response.message.is_empty() {
            MERGED_FALLBACK_MESSAGE.to_string()
        } else {
            response.message
        };
        self.inner.notifier.notify(NoticeLevel::Success, &message);
        self.schedule_reload_if_on_cart();

        info!(items_added, "guest cart merged");
        MergeOutcome::Merged {
            items_added,
            message,
        }
    }

    fn schedule_reload_if_on_cart(&self) {
        if !self.inner.page.path().contains("/cart") {
            return;
        }

        let page = Arc::clone(&self.inner.page);
        tokio::spawn(async move {
            tokio::time::sleep(RELOAD_DELAY).await;
            page.reload();
        });
    }
}
