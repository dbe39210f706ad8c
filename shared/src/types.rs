use serde::{Deserialize, Serialize};
use std::fmt;

/// Money is carried as integer minor currency units (cents) end to end.
pub type Cents = i64;

// Order-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    OutForPickup,
    Returned,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Returned | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::OutForDelivery => write!(f, "out_for_delivery"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::OutForPickup => write!(f, "out_for_pickup"),
            OrderStatus::Returned => write!(f, "returned"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "return_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    /// A driver picks the bags up at the end of the rental (round trip).
    Pickup,
    /// The customer mails the bags back with a prepaid label (one way).
    Ship,
}

impl fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnMethod::Pickup => write!(f, "pickup"),
            ReturnMethod::Ship => write!(f, "ship"),
        }
    }
}

// Inventory-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inventory_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    Available,
    Retired,
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryStatus::Available => write!(f, "available"),
            InventoryStatus::Retired => write!(f, "retired"),
        }
    }
}

// Promo-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a whole-number percentage of the discount base.
    Percent,
    /// `discount_value` is a flat amount in cents.
    Fixed,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percent => write!(f, "percent"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

/// Why a promo code was not accepted. The first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoRejection {
    Invalid,
    Expired,
    UsageLimitReached,
    BelowMinimum,
}

impl fmt::Display for PromoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromoRejection::Invalid => write!(f, "invalid"),
            PromoRejection::Expired => write!(f, "expired"),
            PromoRejection::UsageLimitReached => write!(f, "usage_limit_reached"),
            PromoRejection::BelowMinimum => write!(f, "below_minimum"),
        }
    }
}

/// Which order address a customer wants to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressField {
    Delivery,
    Return,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressField::Delivery => write!(f, "delivery"),
            AddressField::Return => write!(f, "return"),
        }
    }
}

/// Outcome reported by the payment gateway for a capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentOutcome::Succeeded => write!(f, "succeeded"),
            PaymentOutcome::Failed => write!(f, "failed"),
        }
    }
}
