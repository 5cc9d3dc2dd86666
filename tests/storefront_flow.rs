//! End-to-end storefront flows: filled cart → payment widget → one persisted
//! order per cart line, plus order tracking through the live change feed and
//! the nursery status workflow.
//!
//! The hosted backend never participates here: every collaborator port gets a
//! small in-memory double, so what is under test is the protocol itself —
//! address resolution, the single-shot payment confirmation, the stale-cart
//! guard, per-line order splitting, and cart preservation across failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use futures::StreamExt;
use tokio::sync::oneshot;
use uuid::Uuid;

use plantflix::application::addresses::AddressBookService;
use plantflix::application::checkout::{CheckoutPhase, CheckoutService};
use plantflix::application::orders::{CustomerOrders, NurseryOrders, OrderBoard};
use plantflix::domain::address::{Address, NewAddress, Profile};
use plantflix::domain::cart::{CartLineInput, CartStore};
use plantflix::domain::errors::StorefrontError;
use plantflix::domain::order::{
    OrderChange, OrderDraft, OrderStatus, OrderView, PaymentStatus,
};
use plantflix::domain::ports::{
    AuthGateway, CustomerDirectory, OrderChanges, OrderRepository, PaymentConfirmation,
    PaymentGateway, PaymentRequest, UserIdentity,
};
use plantflix::infrastructure::realtime::ChannelOrderChanges;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ── In-memory collaborators ──────────────────────────────────────────────────

#[derive(Clone)]
struct StubAuth {
    user: Option<UserIdentity>,
}

impl StubAuth {
    fn signed_in(user: &UserIdentity) -> Self {
        Self {
            user: Some(user.clone()),
        }
    }

    fn signed_out() -> Self {
        Self { user: None }
    }
}

impl AuthGateway for StubAuth {
    async fn current_user(&self) -> Result<Option<UserIdentity>, StorefrontError> {
        Ok(self.user.clone())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<UserIdentity, StorefrontError> {
        self.user.clone().ok_or(StorefrontError::NotAuthenticated)
    }

    async fn sign_out(&self) -> Result<(), StorefrontError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct StubDirectory {
    profile: Option<Profile>,
    addresses: Vec<Address>,
    defaults_cleared: Arc<Mutex<u32>>,
}

impl CustomerDirectory for StubDirectory {
    async fn profile(&self, _user_id: Uuid) -> Result<Option<Profile>, StorefrontError> {
        Ok(self.profile.clone())
    }

    async fn addresses(&self, _user_id: Uuid) -> Result<Vec<Address>, StorefrontError> {
        Ok(self.addresses.clone())
    }

    async fn insert_address(&self, address: NewAddress) -> Result<Address, StorefrontError> {
        Ok(Address {
            id: Some(Uuid::new_v4()),
            user_id: Some(address.user_id),
            name: address.name,
            phone: address.phone,
            address_line: address.address_line,
            city: address.city,
            postal_code: address.postal_code,
            is_default: address.is_default,
        })
    }

    async fn update_address(&self, _address: Address) -> Result<(), StorefrontError> {
        Ok(())
    }

    async fn clear_default(&self, _user_id: Uuid) -> Result<(), StorefrontError> {
        *self.defaults_cleared.lock().expect("lock") += 1;
        Ok(())
    }
}

/// Order store double: records batch inserts and status updates, serves a
/// configured listing, and can be told to fail the next insert.
#[derive(Clone, Default)]
struct RecordingOrders {
    inserted: Arc<Mutex<Vec<OrderDraft>>>,
    status_updates: Arc<Mutex<Vec<(Uuid, OrderStatus)>>>,
    listing: Arc<Mutex<Vec<OrderView>>>,
    fail_insert: Arc<AtomicBool>,
}

impl RecordingOrders {
    fn failing() -> Self {
        let repo = Self::default();
        repo.fail_insert.store(true, Ordering::SeqCst);
        repo
    }

    fn with_listing(orders: Vec<OrderView>) -> Self {
        let repo = Self::default();
        *repo.listing.lock().expect("lock") = orders;
        repo
    }

    fn inserted(&self) -> Vec<OrderDraft> {
        self.inserted.lock().expect("lock").clone()
    }

    fn status_updates(&self) -> Vec<(Uuid, OrderStatus)> {
        self.status_updates.lock().expect("lock").clone()
    }
}

impl OrderRepository for RecordingOrders {
    async fn insert_batch(&self, drafts: Vec<OrderDraft>) -> Result<Vec<Uuid>, StorefrontError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StorefrontError::RemoteRequestFailed(
                "orders relation is down".to_string(),
            ));
        }
        let ids = drafts.iter().map(|_| Uuid::new_v4()).collect();
        self.inserted.lock().expect("lock").extend(drafts);
        Ok(ids)
    }

    async fn list_for_customer(
        &self,
        _customer_id: Uuid,
    ) -> Result<Vec<OrderView>, StorefrontError> {
        Ok(self.listing.lock().expect("lock").clone())
    }

    async fn list_for_nursery(&self, _nursery_id: Uuid) -> Result<Vec<OrderView>, StorefrontError> {
        Ok(self.listing.lock().expect("lock").clone())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StorefrontError> {
        self.status_updates.lock().expect("lock").push((id, status));
        Ok(())
    }
}

/// Payment widget double that confirms immediately.
#[derive(Clone)]
struct InstantPayment {
    payment_ref: String,
    requests: Arc<Mutex<Vec<PaymentRequest>>>,
}

impl InstantPayment {
    fn new(payment_ref: &str) -> Self {
        Self {
            payment_ref: payment_ref.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl PaymentGateway for InstantPayment {
    async fn collect(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentConfirmation, StorefrontError> {
        self.requests.lock().expect("lock").push(request);
        Ok(PaymentConfirmation {
            payment_ref: self.payment_ref.clone(),
        })
    }
}

/// Payment widget double that never opens.
#[derive(Clone)]
struct UnavailablePayment;

impl PaymentGateway for UnavailablePayment {
    async fn collect(
        &self,
        _request: PaymentRequest,
    ) -> Result<PaymentConfirmation, StorefrontError> {
        Err(StorefrontError::PaymentUnavailable(
            "widget script not loaded".to_string(),
        ))
    }
}

/// Payment widget double driven from the outside: `collect` suspends until
/// the test fires the one-shot sender, like a real success callback.
struct WidgetPayment {
    confirmation: Mutex<Option<oneshot::Receiver<PaymentConfirmation>>>,
}

impl WidgetPayment {
    fn new() -> (Self, oneshot::Sender<PaymentConfirmation>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                confirmation: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl PaymentGateway for WidgetPayment {
    async fn collect(
        &self,
        _request: PaymentRequest,
    ) -> Result<PaymentConfirmation, StorefrontError> {
        let rx = self
            .confirmation
            .lock()
            .expect("lock")
            .take()
            .ok_or_else(|| StorefrontError::PaymentUnavailable("widget already used".to_string()))?;
        rx.await
            .map_err(|_| StorefrontError::PaymentFailed("widget dismissed".to_string()))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn customer() -> UserIdentity {
    UserIdentity {
        id: Uuid::new_v4(),
        email: Some("asha@example.com".to_string()),
    }
}

fn default_address(user: &UserIdentity) -> Address {
    Address {
        id: Some(Uuid::new_v4()),
        user_id: Some(user.id),
        name: "Asha".to_string(),
        phone: "9999000011".to_string(),
        address_line: Some("12 Garden Lane".to_string()),
        city: Some("Pune".to_string()),
        postal_code: Some("411001".to_string()),
        is_default: true,
    }
}

fn profile_with_address(user: &UserIdentity) -> Profile {
    Profile {
        id: user.id,
        name: Some("Asha".to_string()),
        phone: Some("9999000011".to_string()),
        address: Some("Profile Lane".to_string()),
        city: Some("Pune".to_string()),
        postal_code: Some("411001".to_string()),
    }
}

/// Fern at 150 x 2 plus rose at 300 x 1: grand total 600, i.e. 60000 paise.
fn filled_cart() -> CartStore {
    let mut cart = CartStore::new();
    let fern = Uuid::new_v4();
    cart.add_item(CartLineInput {
        plant_id: fern,
        name: "Fern".to_string(),
        unit_price: BigDecimal::from(150),
        image_url: "https://img.example/fern.jpg".to_string(),
        nursery_id: Some(Uuid::new_v4()),
    });
    cart.add_item(CartLineInput {
        plant_id: Uuid::new_v4(),
        name: "Rose".to_string(),
        unit_price: BigDecimal::from(300),
        image_url: "https://img.example/rose.jpg".to_string(),
        nursery_id: None,
    });
    cart.set_quantity(fern, 2);
    cart
}

fn stored_order(user: &UserIdentity, status: OrderStatus) -> OrderView {
    OrderView {
        id: Uuid::new_v4(),
        customer_id: user.id,
        nursery_id: None,
        items: vec![],
        quantity: 1,
        unit_price: BigDecimal::from(150),
        total_price: BigDecimal::from(150),
        status,
        payment_status: PaymentStatus::Paid,
        payment_ref: Some("pay_123".to_string()),
        address: None,
        created_at: chrono::Utc::now(),
    }
}

// ── Checkout ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkout_places_one_order_per_line_and_clears_the_cart() {
    init_logs();
    let user = customer();
    let address = default_address(&user);
    let orders = RecordingOrders::default();
    let payments = InstantPayment::new("pay_123");
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![address.clone()],
            ..Default::default()
        },
        orders.clone(),
        payments.clone(),
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    let placed = outcome.result.expect("checkout succeeds");
    assert_eq!(placed.order_ids.len(), 2, "one order per cart line");
    assert_eq!(placed.payment_ref, "pay_123");
    assert!(cart.is_empty(), "cart clears on success");
    assert_eq!(
        outcome.phases,
        vec![
            CheckoutPhase::Idle,
            CheckoutPhase::AddressSelected,
            CheckoutPhase::AwaitingPayment,
            CheckoutPhase::Submitting,
            CheckoutPhase::Success,
        ]
    );

    let drafts = orders.inserted();
    assert_eq!(drafts.len(), 2);
    assert!(drafts.iter().all(|d| d.payment_ref == "pay_123"));
    assert!(drafts.iter().all(|d| d.address == address));
    assert!(drafts.iter().all(|d| d.status == OrderStatus::OrderPlaced));
    assert_eq!(drafts[0].total_price, BigDecimal::from(300));
    assert_eq!(drafts[1].total_price, BigDecimal::from(300));

    let requests = payments.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount_minor, 60_000);
    assert_eq!(requests[0].currency, "INR");
}

#[tokio::test]
async fn failing_batch_insert_leaves_the_cart_for_retry() {
    init_logs();
    let user = customer();
    let orders = RecordingOrders::failing();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![default_address(&user)],
            ..Default::default()
        },
        orders.clone(),
        InstantPayment::new("pay_123"),
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(matches!(
        outcome.result,
        Err(StorefrontError::RemoteRequestFailed(_))
    ));
    assert_eq!(outcome.final_phase(), CheckoutPhase::Failed);
    assert_eq!(cart.len(), 2, "cart is untouched after a failed insert");
}

#[tokio::test]
async fn unavailable_widget_fails_before_anything_is_written() {
    init_logs();
    let user = customer();
    let orders = RecordingOrders::default();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![default_address(&user)],
            ..Default::default()
        },
        orders.clone(),
        UnavailablePayment,
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(matches!(
        outcome.result,
        Err(StorefrontError::PaymentUnavailable(_))
    ));
    assert!(orders.inserted().is_empty());
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn signed_out_user_cannot_check_out() {
    init_logs();
    let service = CheckoutService::new(
        StubAuth::signed_out(),
        StubDirectory::default(),
        RecordingOrders::default(),
        InstantPayment::new("pay_123"),
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(matches!(
        outcome.result,
        Err(StorefrontError::NotAuthenticated)
    ));
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn checkout_without_any_address_is_refused() {
    init_logs();
    let user = customer();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory::default(),
        RecordingOrders::default(),
        InstantPayment::new("pay_123"),
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(matches!(
        outcome.result,
        Err(StorefrontError::NoAddressSelected)
    ));
}

#[tokio::test]
async fn profile_address_is_used_when_no_saved_default_exists() {
    init_logs();
    let user = customer();
    let orders = RecordingOrders::default();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            profile: Some(profile_with_address(&user)),
            ..Default::default()
        },
        orders.clone(),
        InstantPayment::new("pay_123"),
    );

    let mut cart = filled_cart();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(outcome.succeeded());
    let drafts = orders.inserted();
    assert_eq!(drafts[0].address.address_line.as_deref(), Some("Profile Lane"));
    assert_eq!(drafts[0].address.id, None, "profile snapshot has no row id");
}

#[tokio::test]
async fn an_empty_cart_never_reaches_the_widget() {
    init_logs();
    let user = customer();
    let payments = InstantPayment::new("pay_123");
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![default_address(&user)],
            ..Default::default()
        },
        RecordingOrders::default(),
        payments.clone(),
    );

    let mut cart = CartStore::new();
    let outcome = service.place_order(&mut cart, None).await;

    assert!(matches!(outcome.result, Err(StorefrontError::EmptyCart)));
    assert!(payments.requests().is_empty());
}

#[tokio::test]
async fn a_cart_edited_while_the_widget_was_open_aborts_the_attempt() {
    init_logs();
    let user = customer();
    let orders = RecordingOrders::default();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![default_address(&user)],
            ..Default::default()
        },
        orders.clone(),
        InstantPayment::new("pay_123"),
    );

    let mut cart = filled_cart();
    let fern = cart.lines()[0].plant_id;
    let pending = service.begin(&cart, None).await.expect("begin succeeds");

    // User keeps shopping while the widget is open.
    cart.set_quantity(fern, 5);

    let outcome = service
        .confirm(
            &mut cart,
            pending,
            PaymentConfirmation {
                payment_ref: "pay_123".to_string(),
            },
        )
        .await;

    assert!(matches!(outcome.result, Err(StorefrontError::StaleCheckout)));
    assert!(orders.inserted().is_empty(), "nothing is written");
    assert_eq!(cart.lines()[0].quantity, 5, "the edited cart survives");
}

#[tokio::test]
async fn a_confirmation_arriving_later_still_completes_the_checkout() {
    init_logs();
    let user = customer();
    let orders = RecordingOrders::default();
    let (payments, confirm) = WidgetPayment::new();
    let service = CheckoutService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            addresses: vec![default_address(&user)],
            ..Default::default()
        },
        orders.clone(),
        payments,
    );

    let mut cart = filled_cart();
    let attempt = tokio::spawn(async move {
        let outcome = service.place_order(&mut cart, None).await;
        (outcome, cart)
    });

    // The success callback fires at an arbitrary later time.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    confirm
        .send(PaymentConfirmation {
            payment_ref: "pay_999".to_string(),
        })
        .expect("checkout is still waiting");

    let (outcome, cart) = attempt.await.expect("task completes");
    let placed = outcome.result.expect("checkout succeeds");
    assert_eq!(placed.payment_ref, "pay_999");
    assert!(cart.is_empty());
    assert_eq!(orders.inserted().len(), 2);
}

// ── Address book ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn delivery_options_prepend_the_profile_when_no_default_exists() {
    init_logs();
    let user = customer();
    let mut saved = default_address(&user);
    saved.is_default = false;
    let service = AddressBookService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            profile: Some(profile_with_address(&user)),
            addresses: vec![saved.clone()],
            ..Default::default()
        },
    );

    let options = service.delivery_options().await.expect("lists");
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].id, None, "profile option comes first");
    assert_eq!(options[1].id, saved.id);
}

#[tokio::test]
async fn delivery_options_stay_as_saved_when_a_default_exists() {
    init_logs();
    let user = customer();
    let saved = default_address(&user);
    let service = AddressBookService::new(
        StubAuth::signed_in(&user),
        StubDirectory {
            profile: Some(profile_with_address(&user)),
            addresses: vec![saved.clone()],
            ..Default::default()
        },
    );

    let options = service.delivery_options().await.expect("lists");
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].id, saved.id);
}

#[tokio::test]
async fn saving_a_new_default_clears_the_old_flags_first() {
    init_logs();
    let user = customer();
    let directory = StubDirectory {
        addresses: vec![default_address(&user)],
        ..Default::default()
    };
    let service = AddressBookService::new(StubAuth::signed_in(&user), directory.clone());

    let saved = service
        .save(NewAddress {
            user_id: Uuid::nil(), // stamped by the service
            name: "Asha".to_string(),
            phone: "9999000011".to_string(),
            address_line: Some("3 Rose Street".to_string()),
            city: Some("Pune".to_string()),
            postal_code: Some("411002".to_string()),
            is_default: true,
        })
        .await
        .expect("saves");

    assert_eq!(saved.user_id, Some(user.id));
    assert!(saved.is_default);
    assert_eq!(*directory.defaults_cleared.lock().expect("lock"), 1);
}

// ── Order tracking and the status workflow ───────────────────────────────────

#[tokio::test]
async fn customers_can_cancel_only_live_orders() {
    init_logs();
    let user = customer();
    let placed = stored_order(&user, OrderStatus::OrderPlaced);
    let delivered = stored_order(&user, OrderStatus::Delivered);
    let orders = RecordingOrders::with_listing(vec![placed.clone(), delivered.clone()]);
    let service = CustomerOrders::new(StubAuth::signed_in(&user), orders.clone());

    let listed = service.my_orders().await.expect("listing succeeds");
    assert_eq!(listed.len(), 2);

    service.cancel(&placed).await.expect("live order cancels");
    assert_eq!(
        orders.status_updates(),
        vec![(placed.id, OrderStatus::Cancelled)]
    );

    let refused = service.cancel(&delivered).await;
    assert!(matches!(
        refused,
        Err(StorefrontError::InvalidStatusChange { .. })
    ));
}

#[tokio::test]
async fn someone_elses_order_cannot_be_cancelled() {
    init_logs();
    let user = customer();
    let other = customer();
    let foreign_order = stored_order(&other, OrderStatus::OrderPlaced);
    let service = CustomerOrders::new(
        StubAuth::signed_in(&user),
        RecordingOrders::default(),
    );

    let result = service.cancel(&foreign_order).await;
    assert!(matches!(result, Err(StorefrontError::NotFound)));
}

#[tokio::test]
async fn the_nursery_workflow_only_moves_forward() {
    init_logs();
    let user = customer();
    let shipped = stored_order(&user, OrderStatus::Shipped);
    let orders = RecordingOrders::default();
    let service = NurseryOrders::new(StubAuth::signed_in(&user), orders.clone());

    let backward = service.advance(&shipped, OrderStatus::Processing).await;
    assert!(matches!(
        backward,
        Err(StorefrontError::InvalidStatusChange { .. })
    ));
    assert!(orders.status_updates().is_empty());

    service
        .advance(&shipped, OrderStatus::Delivered)
        .await
        .expect("forward move succeeds");
    assert_eq!(
        orders.status_updates(),
        vec![(shipped.id, OrderStatus::Delivered)]
    );
}

#[tokio::test]
async fn the_order_board_follows_the_change_feed() {
    init_logs();
    let user = customer();
    let placed = stored_order(&user, OrderStatus::OrderPlaced);
    let mut board = OrderBoard::seeded(vec![placed.clone()]);

    let feed = ChannelOrderChanges::default();
    let mut stream = feed.subscribe();

    let mut shipped = placed.clone();
    shipped.status = OrderStatus::Shipped;
    feed.push(OrderChange::Updated(shipped));

    let fresh = stored_order(&user, OrderStatus::OrderPlaced);
    feed.push(OrderChange::Inserted(fresh.clone()));

    board.apply(stream.next().await.expect("update arrives"));
    board.apply(stream.next().await.expect("insert arrives"));

    assert_eq!(board.orders().len(), 2);
    assert_eq!(board.orders()[0].id, fresh.id, "inserts prepend");
    assert_eq!(board.orders()[1].status, OrderStatus::Shipped);
}
