//! Status enums for orders.
//!
//! The remote API reports order state as a pair of booleans plus a payment
//! method string; these enums give the front-end something to match on.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How an order was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodType {
    /// Cash on delivery.
    Cash,
    /// Online card payment through a hosted checkout session.
    Card,
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cash => "Cash on delivery",
            Self::Card => "Card",
        })
    }
}

/// Whether an order has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl From<bool> for PaymentStatus {
    fn from(is_paid: bool) -> Self {
        if is_paid { Self::Paid } else { Self::Unpaid }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
        })
    }
}

/// Whether an order has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Delivered,
    Pending,
}

impl From<bool> for DeliveryStatus {
    fn from(is_delivered: bool) -> Self {
        if is_delivered {
            Self::Delivered
        } else {
            Self::Pending
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delivered => "Delivered",
            Self::Pending => "Pending",
        })
    }
}
