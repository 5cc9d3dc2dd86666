use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Candidate for a cart line: a catalog plant the user picked, without a
/// quantity. The store decides whether a line is appended at all.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineInput {
    pub plant_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub image_url: String,
    pub nursery_id: Option<Uuid>,
}

/// One distinct plant selected for purchase. Quantity is always >= 1; a
/// decrement below one removes the line instead of storing zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub plant_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub image_url: String,
    pub quantity: u32,
    pub nursery_id: Option<Uuid>,
}

/// Order-sensitive digest of the cart's (plant, quantity) pairs. Two carts
/// compare equal exactly when they would produce the same order drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartFingerprint(Vec<(Uuid, u32)>);

/// The session's cart. Explicitly owned and dependency-passed; all
/// operations are synchronous and run on a single caller sequence, so no
/// interior locking exists.
#[derive(Debug, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new line with quantity 1 if no line shares the plant id.
    /// Re-adding an already-present plant is a silent no-op rather than a
    /// quantity bump. Returns whether a line was appended.
    pub fn add_item(&mut self, item: CartLineInput) -> bool {
        if self.contains(item.plant_id) {
            return false;
        }
        self.lines.push(CartLine {
            plant_id: item.plant_id,
            name: item.name,
            unit_price: item.unit_price,
            image_url: item.image_url,
            quantity: 1,
            nursery_id: item.nursery_id,
        });
        true
    }

    /// Removes the line with the matching plant id, if present.
    pub fn remove_item(&mut self, plant_id: Uuid) {
        self.lines.retain(|line| line.plant_id != plant_id);
    }

    /// Updates the matching line's quantity. Quantities below one are
    /// ignored; callers decrementing past one remove the line instead.
    pub fn set_quantity(&mut self, plant_id: Uuid, quantity: u32) {
        if quantity < 1 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.plant_id == plant_id) {
            line.quantity = quantity;
        }
    }

    /// Empties the cart unconditionally.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn contains(&self, plant_id: Uuid) -> bool {
        self.lines.iter().any(|line| line.plant_id == plant_id)
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Clone of the current lines, used to freeze the cart at the moment a
    /// payment widget opens.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn fingerprint(&self) -> CartFingerprint {
        CartFingerprint(
            self.lines
                .iter()
                .map(|line| (line.plant_id, line.quantity))
                .collect(),
        )
    }
}
