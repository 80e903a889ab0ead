use serde::{Deserialize, Serialize};

/// Unique identifier for a product.
///
/// Wraps the numeric id used on the wire to prevent mixing product ids
/// with order or user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a product ID from its numeric value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ProductId> for i64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Unique identifier for an order.
///
/// Order ids are allocated by the HTTP gateway; the reserved value `-1`
/// marks the "no such order" reply used instead of an error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// The reserved "not found / not applicable" order id.
    pub const SENTINEL: OrderId = OrderId(-1);

    /// Creates an order ID from its numeric value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric value.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// Returns true if this is the reserved sentinel id.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for i64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user ID from its numeric value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Money amount in whole currency units, matching the integer prices the
/// marketplace trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    units: i64,
}

impl Money {
    /// Creates a new Money amount from whole units.
    pub fn new(units: i64) -> Self {
        Self { units }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { units: 0 }
    }

    /// Returns the amount in whole units.
    pub fn units(&self) -> i64 {
        self.units
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.units > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.units < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            units: self.units * quantity as i64,
        }
    }

    /// Applies the 10% first-order discount, rounding down to whole units.
    pub fn with_first_order_discount(&self) -> Money {
        Money {
            units: self.units * 9 / 10,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.units)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            units: self.units + rhs.units,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            units: self.units - rhs.units,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.units += rhs.units;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_roundtrips_as_bare_number() {
        let id = ProductId::new(101);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "101");
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn order_id_sentinel_is_minus_one() {
        assert_eq!(OrderId::SENTINEL.get(), -1);
        assert!(OrderId::SENTINEL.is_sentinel());
        assert!(!OrderId::new(1).is_sentinel());
    }

    #[test]
    fn user_id_preserves_value() {
        let id = UserId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::new(100);
        let b = Money::new(50);

        assert_eq!((a + b).units(), 150);
        assert_eq!((a - b).units(), 50);
        assert_eq!(a.multiply(3).units(), 300);
    }

    #[test]
    fn money_add_assign() {
        let mut total = Money::zero();
        total += Money::new(200);
        total += Money::new(50);
        assert_eq!(total.units(), 250);
    }

    #[test]
    fn money_comparison() {
        assert!(Money::new(100).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::new(-100).is_negative());
    }

    #[test]
    fn first_order_discount_rounds_down() {
        assert_eq!(Money::new(250).with_first_order_discount().units(), 225);
        assert_eq!(Money::new(10).with_first_order_discount().units(), 9);
        assert_eq!(Money::new(9).with_first_order_discount().units(), 8);
        assert_eq!(Money::new(1).with_first_order_discount().units(), 0);
        assert_eq!(Money::new(0).with_first_order_discount().units(), 0);
    }

    #[test]
    fn money_serializes_transparent() {
        let price = Money::new(100);
        assert_eq!(serde_json::to_string(&price).unwrap(), "100");
        let back: Money = serde_json::from_str("100").unwrap();
        assert_eq!(back, price);
    }
}
