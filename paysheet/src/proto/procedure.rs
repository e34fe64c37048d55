//! The fixed set of server-side callable procedures.

use std::fmt;

/// A known callable procedure, addressed as `POST {base_url}/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// Creates (idempotently) the Stripe customer for the signed-in user.
    CreateCustomer,
    /// Mints an ephemeral key for a customer.
    CreateEphemeralKey,
    /// Returns the publishable key and payment mode.
    GetConfig,
    /// Lists a customer's saved payment methods.
    ListPaymentMethods,
    /// Detaches a saved payment method from a customer.
    DetachPaymentMethod,
    /// Creates a payment intent for a shop.
    CreatePaymentIntent,
}

impl Procedure {
    /// Every known procedure.
    pub const ALL: [Self; 6] = [
        Self::CreateCustomer,
        Self::CreateEphemeralKey,
        Self::GetConfig,
        Self::ListPaymentMethods,
        Self::DetachPaymentMethod,
        Self::CreatePaymentIntent,
    ];

    /// The path segment the procedure is served under.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateCustomer => "create-customer",
            Self::CreateEphemeralKey => "create-ephemeral-key",
            Self::GetConfig => "get-config",
            Self::ListPaymentMethods => "list-payment-methods",
            Self::DetachPaymentMethod => "detach-payment-method",
            Self::CreatePaymentIntent => "create-payment-intent",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AsRef<str> for Procedure {
    fn as_ref(&self) -> &str {
        self.name()
    }
}
