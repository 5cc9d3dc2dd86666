//! Turns a cart into persisted orders via the payment and order-store
//! collaborators.

use uuid::Uuid;

use crate::domain::address::{Address, Profile};
use crate::domain::cart::{CartFingerprint, CartLine, CartStore};
use crate::domain::errors::StorefrontError;
use crate::domain::order::drafts_from_lines;
use crate::domain::ports::{
    AuthGateway, CustomerDirectory, OrderRepository, PaymentConfirmation, PaymentGateway,
    PaymentPrefill, PaymentRequest, UserIdentity,
};
use crate::domain::pricing;

use super::require_user;

pub const PAYMENT_CURRENCY: &str = "INR";
pub const PAYMENT_DESCRIPTION: &str = "Plant purchase";

/// Progress of one checkout attempt. `Success` and `Failed` are terminal;
/// a retry starts a fresh attempt at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    AddressSelected,
    AwaitingPayment,
    Submitting,
    Success,
    Failed,
}

impl CheckoutPhase {
    pub fn can_advance_to(self, next: CheckoutPhase) -> bool {
        use CheckoutPhase::*;
        match (self, next) {
            (Success | Failed, _) => false,
            (_, Failed) => true,
            (Idle, AddressSelected)
            | (AddressSelected, AwaitingPayment)
            | (AwaitingPayment, Submitting)
            | (Submitting, Success) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct PhaseLog(Vec<CheckoutPhase>);

impl PhaseLog {
    fn start() -> Self {
        Self(vec![CheckoutPhase::Idle])
    }

    fn current(&self) -> CheckoutPhase {
        self.0.last().copied().unwrap_or(CheckoutPhase::Idle)
    }

    fn advance(&mut self, next: CheckoutPhase) {
        debug_assert!(
            self.current().can_advance_to(next),
            "checkout phase {:?} cannot advance to {:?}",
            self.current(),
            next
        );
        self.0.push(next);
    }
}

/// A begun attempt whose payment widget is open. Consumed exactly once by
/// [`CheckoutService::confirm`]; dropping it abandons the attempt without
/// side effects.
#[derive(Debug)]
pub struct PendingPayment {
    customer: UserIdentity,
    address: Address,
    snapshot: Vec<CartLine>,
    fingerprint: CartFingerprint,
    request: PaymentRequest,
    phases: PhaseLog,
}

impl PendingPayment {
    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrders {
    pub order_ids: Vec<Uuid>,
    pub payment_ref: String,
}

/// What a finished attempt came to, with the phases it moved through.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub result: Result<PlacedOrders, StorefrontError>,
    pub phases: Vec<CheckoutPhase>,
}

impl CheckoutOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn final_phase(&self) -> CheckoutPhase {
        self.phases.last().copied().unwrap_or(CheckoutPhase::Idle)
    }

    pub fn into_result(self) -> Result<PlacedOrders, StorefrontError> {
        self.result
    }

    fn failed(error: StorefrontError, mut phases: PhaseLog) -> Self {
        phases.advance(CheckoutPhase::Failed);
        Self {
            result: Err(error),
            phases: phases.0,
        }
    }
}

pub struct CheckoutService<A, D, O, P> {
    auth: A,
    directory: D,
    orders: O,
    payments: P,
}

impl<A, D, O, P> CheckoutService<A, D, O, P>
where
    A: AuthGateway,
    D: CustomerDirectory,
    O: OrderRepository,
    P: PaymentGateway,
{
    pub fn new(auth: A, directory: D, orders: O, payments: P) -> Self {
        Self {
            auth,
            directory,
            orders,
            payments,
        }
    }

    /// Runs the whole protocol: identity, address, payment, batch insert,
    /// cart clear. Every failure leaves the cart untouched so the user can
    /// retry.
    pub async fn place_order(
        &self,
        cart: &mut CartStore,
        chosen_address: Option<Uuid>,
    ) -> CheckoutOutcome {
        let pending = match self.begin(cart, chosen_address).await {
            Ok(pending) => pending,
            Err(error) => {
                return CheckoutOutcome {
                    result: Err(error),
                    phases: vec![CheckoutPhase::Idle, CheckoutPhase::Failed],
                }
            }
        };
        let confirmation = match self.payments.collect(pending.request.clone()).await {
            Ok(confirmation) => confirmation,
            Err(error) => return CheckoutOutcome::failed(error, pending.phases),
        };
        self.confirm(cart, pending, confirmation).await
    }

    /// First half of an attempt: resolves identity and address, freezes the
    /// cart, and produces the payment request for the widget.
    pub async fn begin(
        &self,
        cart: &CartStore,
        chosen_address: Option<Uuid>,
    ) -> Result<PendingPayment, StorefrontError> {
        let mut phases = PhaseLog::start();
        let customer = require_user(&self.auth).await?;
        let profile = self.directory.profile(customer.id).await?;
        let saved = self.directory.addresses(customer.id).await?;
        let address = resolve_address(chosen_address, &saved, profile.as_ref())?;
        phases.advance(CheckoutPhase::AddressSelected);

        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        let amount_minor = pricing::to_minor_units(&pricing::grand_total(cart))?;
        let request = PaymentRequest {
            amount_minor,
            currency: PAYMENT_CURRENCY.to_string(),
            description: PAYMENT_DESCRIPTION.to_string(),
            prefill: PaymentPrefill {
                name: profile.as_ref().and_then(|p| p.name.clone()),
                email: customer.email.clone(),
                contact: profile.as_ref().and_then(|p| p.phone.clone()),
            },
        };
        phases.advance(CheckoutPhase::AwaitingPayment);
        log::info!(
            "checkout: {} line(s), {} minor units, awaiting payment",
            cart.len(),
            amount_minor
        );

        Ok(PendingPayment {
            customer,
            address,
            snapshot: cart.snapshot(),
            fingerprint: cart.fingerprint(),
            request,
            phases,
        })
    }

    /// Second half, entered when the widget confirms. Refuses to act on a
    /// cart that changed while the widget was open.
    pub async fn confirm(
        &self,
        cart: &mut CartStore,
        pending: PendingPayment,
        confirmation: PaymentConfirmation,
    ) -> CheckoutOutcome {
        let PendingPayment {
            customer,
            address,
            snapshot,
            fingerprint,
            request: _,
            mut phases,
        } = pending;

        if cart.fingerprint() != fingerprint {
            log::warn!("checkout: cart changed while the payment widget was open");
            return CheckoutOutcome::failed(StorefrontError::StaleCheckout, phases);
        }

        phases.advance(CheckoutPhase::Submitting);
        let drafts = drafts_from_lines(customer.id, &snapshot, &address, &confirmation.payment_ref);
        match self.orders.insert_batch(drafts).await {
            Ok(order_ids) => {
                cart.clear();
                phases.advance(CheckoutPhase::Success);
                log::info!("checkout: placed {} order(s)", order_ids.len());
                CheckoutOutcome {
                    result: Ok(PlacedOrders {
                        order_ids,
                        payment_ref: confirmation.payment_ref,
                    }),
                    phases: phases.0,
                }
            }
            Err(error) => {
                log::error!("checkout: batch insert failed: {error}");
                CheckoutOutcome::failed(error, phases)
            }
        }
    }
}

/// Shipping-address preference: the caller's explicit choice, else the saved
/// default, else the profile's address.
fn resolve_address(
    chosen: Option<Uuid>,
    saved: &[Address],
    profile: Option<&Profile>,
) -> Result<Address, StorefrontError> {
    if let Some(id) = chosen {
        return saved
            .iter()
            .find(|a| a.id == Some(id))
            .cloned()
            .ok_or(StorefrontError::NoAddressSelected);
    }
    if let Some(default) = saved.iter().find(|a| a.is_default) {
        return Ok(default.clone());
    }
    profile
        .and_then(Profile::as_address)
        .ok_or(StorefrontError::NoAddressSelected)
}
