use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-reported order state. Progression is strictly linear and admin-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
}

/// Steps shown on the customer tracker. `Completed` replaces the tracker entirely.
pub const PROGRESS_STEPS: [OrderStatus; 3] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready for Pickup",
            OrderStatus::Completed => "Completed",
        }
    }

    /// Hex color used for status badges.
    pub fn color(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "#f39c12",
            OrderStatus::Preparing => "#e8652e",
            OrderStatus::Ready => "#2ecc71",
            OrderStatus::Completed => "#27ae60",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Label of the admin "advance" action; `None` disables it.
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => Some("Start Preparing"),
            OrderStatus::Preparing => Some("Mark Ready"),
            OrderStatus::Ready => Some("Complete"),
            OrderStatus::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Done flags for each of [`PROGRESS_STEPS`], or `None` once the order is completed.
    pub fn progress(&self) -> Option<[bool; 3]> {
        if self.is_terminal() {
            return None;
        }
        Some(PROGRESS_STEPS.map(|step| step <= *self))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown order status '{s}'"))
    }
}
