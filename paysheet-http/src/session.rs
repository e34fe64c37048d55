//! Session-scoped checkout state.
//!
//! A [`CheckoutSession`] lives from sign-in to sign-out. It resolves the
//! Stripe customer once, keeps the saved payment methods current, and drives
//! one payment-sheet presentation at a time.

use std::sync::atomic::{AtomicBool, Ordering};

use paysheet::ServiceError;
use paysheet::proto::PaymentMethod;
use paysheet::sheet::{PaymentSheetOutcome, PaymentSheetPresenter};
use tokio::sync::RwLock;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::checkout::CheckoutRequest;
use crate::service::PaymentService;

/// Errors from [`CheckoutSession`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// An underlying call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// No customer has been resolved for this session yet.
    #[error("Unable to load customer data.")]
    CustomerUnavailable,
    /// Another payment sheet is already being presented.
    #[error("A payment is already in progress.")]
    PaymentInProgress,
}

#[derive(Debug, Default)]
struct SessionState {
    customer_id: Option<String>,
    payment_methods: Vec<PaymentMethod>,
    /// Bumped by every reset; results fetched under an older value are dropped.
    generation: u64,
}

/// Customer and saved payment methods for one signed-in session.
///
/// Locks are never held across network calls.
#[derive(Debug)]
pub struct CheckoutSession {
    service: PaymentService,
    state: RwLock<SessionState>,
    paying: AtomicBool,
}

/// Clears the in-flight flag when a presentation ends, however it ends.
struct PaymentGuard<'a>(&'a AtomicBool);

impl Drop for PaymentGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new(service: PaymentService) -> Self {
        Self {
            service,
            state: RwLock::new(SessionState::default()),
            paying: AtomicBool::new(false),
        }
    }

    /// The service the session calls through.
    #[must_use]
    pub const fn service(&self) -> &PaymentService {
        &self.service
    }

    /// Cached customer id, if [`Self::prepare`] has succeeded.
    pub async fn customer_id(&self) -> Option<String> {
        self.state.read().await.customer_id.clone()
    }

    /// Cached saved payment methods, in server order.
    pub async fn payment_methods(&self) -> Vec<PaymentMethod> {
        self.state.read().await.payment_methods.clone()
    }

    async fn require_customer(&self) -> Result<String, SessionError> {
        self.customer_id()
            .await
            .ok_or(SessionError::CustomerUnavailable)
    }

    async fn snapshot(&self) -> (Option<String>, u64) {
        let state = self.state.read().await;
        (state.customer_id.clone(), state.generation)
    }

    /// Resolves the customer on first use, then refreshes saved methods.
    ///
    /// Returns the customer id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if either call fails. A customer
    /// resolved before a failed refresh stays cached. Returns
    /// [`SessionError::CustomerUnavailable`] if the session is reset while the
    /// customer is being resolved; nothing is cached then.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.session.prepare", skip_all, err)
    )]
    pub async fn prepare(&self) -> Result<String, SessionError> {
        let (cached, generation) = self.snapshot().await;
        let customer_id = if let Some(id) = cached {
            id
        } else {
            let customer = self.service.ensure_customer().await?;
            let mut state = self.state.write().await;
            if state.generation != generation {
                #[cfg(feature = "telemetry")]
                tracing::debug!("session reset while resolving customer");
                return Err(SessionError::CustomerUnavailable);
            }
            state
                .customer_id
                .get_or_insert(customer.customer_id)
                .clone()
        };
        self.refresh_payment_methods().await?;
        Ok(customer_id)
    }

    /// Replaces the cached saved methods with a fresh listing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CustomerUnavailable`] before [`Self::prepare`]
    /// or if the session is reset during the call, or [`SessionError::Service`]
    /// if listing fails. The cache is then left as it was.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.session.refresh_payment_methods", skip_all, err)
    )]
    pub async fn refresh_payment_methods(&self) -> Result<Vec<PaymentMethod>, SessionError> {
        let (customer_id, generation) = self.snapshot().await;
        let customer_id = customer_id.ok_or(SessionError::CustomerUnavailable)?;
        let methods = self.service.list_payment_methods(&customer_id).await?;
        let mut state = self.state.write().await;
        if state.generation != generation {
            return Err(SessionError::CustomerUnavailable);
        }
        state.payment_methods.clone_from(&methods);
        Ok(methods)
    }

    /// Detaches a saved method, then refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if no customer is cached or either call fails.
    pub async fn remove_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Vec<PaymentMethod>, SessionError> {
        let customer_id = self.require_customer().await?;
        self.service
            .detach_payment_method(&customer_id, payment_method_id)
            .await?;
        self.refresh_payment_methods().await
    }

    /// Prepares and presents a payment sheet for the cached customer.
    ///
    /// After [`PaymentSheetOutcome::Completed`] the saved methods are
    /// refreshed; a failed refresh is logged and does not change the outcome.
    ///
    /// # Errors
    ///
    /// - [`SessionError::PaymentInProgress`] while another presentation runs
    /// - [`SessionError::CustomerUnavailable`] before [`Self::prepare`]
    /// - [`SessionError::Service`] if checkout preparation fails; the sheet is
    ///   then not presented
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.session.accept_payment", skip_all, fields(shop = %request.intent.shop_id), err)
    )]
    pub async fn accept_payment(
        &self,
        presenter: &dyn PaymentSheetPresenter,
        request: &CheckoutRequest,
    ) -> Result<PaymentSheetOutcome, SessionError> {
        if self.paying.swap(true, Ordering::AcqRel) {
            return Err(SessionError::PaymentInProgress);
        }
        let _guard = PaymentGuard(&self.paying);

        let customer_id = self.require_customer().await?;
        let data = self.service.prepare_checkout(&customer_id, request).await?;
        let outcome = presenter.present(&data).await;

        #[cfg(feature = "telemetry")]
        tracing::info!(?outcome, "payment sheet closed");

        if outcome == PaymentSheetOutcome::Completed
            && let Err(_e) = self.refresh_payment_methods().await
        {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %_e, "failed to refresh payment methods after payment");
        }
        Ok(outcome)
    }

    /// Forgets the cached customer and methods, e.g. on sign-out.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = SessionState {
            generation: state.generation.wrapping_add(1),
            ..SessionState::default()
        };
    }
}
