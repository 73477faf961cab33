//! Work order lifecycle rules
//!
//! The persisted status model is the four-state machine below. The newer UI
//! flows expose a five-label model (including "Pending Review" and "On Hold")
//! layered on top via `display_label`; those labels are not persisted states.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Persisted work order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    /// Parse the persisted spelling. Unknown strings parse to `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Open" => Some(WorkOrderStatus::Open),
            "In Progress" => Some(WorkOrderStatus::InProgress),
            "Completed" => Some(WorkOrderStatus::Completed),
            "Cancelled" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "Open",
            WorkOrderStatus::InProgress => "In Progress",
            WorkOrderStatus::Completed => "Completed",
            WorkOrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses a work order may move to from this one
    pub fn allowed_transitions(&self) -> &'static [WorkOrderStatus] {
        use WorkOrderStatus::*;
        match self {
            Open => &[InProgress, Completed, Cancelled],
            InProgress => &[Completed, Cancelled, Open],
            // Reversal of a completed order is allowed
            Completed => &[InProgress, Open],
            Cancelled => &[Open],
        }
    }

    /// A no-op transition (same status) is always permitted
    pub fn can_transition(&self, to: WorkOrderStatus) -> bool {
        *self == to || self.allowed_transitions().contains(&to)
    }

    /// Whether the order counts as open for PM idempotency purposes
    pub fn is_open(&self) -> bool {
        matches!(self, WorkOrderStatus::Open | WorkOrderStatus::InProgress)
    }

    /// Label shown by the newer UI flows. "Pending Review" and "On Hold"
    /// exist only at this layer; see DESIGN.md for the open product decision.
    pub fn display_label(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "Pending",
            WorkOrderStatus::InProgress => "In Progress",
            WorkOrderStatus::Completed => "Completed",
            WorkOrderStatus::Cancelled => "On Hold",
        }
    }
}

/// Validate a requested status change, naming the transition on rejection.
pub fn validate_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> Result<()> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            entity: "work order",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Work order and request priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkOrderStatus::*;

    #[test]
    fn test_parse_roundtrip() {
        for status in [Open, InProgress, Completed, Cancelled] {
            assert_eq!(WorkOrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkOrderStatus::parse("Pending Review"), None);
        assert_eq!(WorkOrderStatus::parse("open"), None);
    }

    #[test]
    fn test_transition_table() {
        // Full matrix per the lifecycle rules
        let allowed = [
            (Open, InProgress),
            (Open, Completed),
            (Open, Cancelled),
            (InProgress, Completed),
            (InProgress, Cancelled),
            (InProgress, Open),
            (Completed, InProgress),
            (Completed, Open),
            (Cancelled, Open),
        ];
        for (from, to) in allowed {
            assert!(from.can_transition(to), "{:?} -> {:?}", from, to);
            assert!(validate_transition(from, to).is_ok());
        }

        let rejected = [
            (Completed, Cancelled),
            (Cancelled, Completed),
            (Cancelled, InProgress),
        ];
        for (from, to) in rejected {
            assert!(!from.can_transition(to), "{:?} -> {:?}", from, to);
            let err = validate_transition(from, to).unwrap_err();
            assert!(err.to_string().contains(from.as_str()));
            assert!(err.to_string().contains(to.as_str()));
        }
    }

    #[test]
    fn test_same_status_always_allowed() {
        for status in [Open, InProgress, Completed, Cancelled] {
            assert!(status.can_transition(status));
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(Open.is_open());
        assert!(InProgress.is_open());
        assert!(!Completed.is_open());
        assert!(!Cancelled.is_open());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("Medium"), Some(Priority::Medium));
        assert_eq!(Priority::parse("urgent"), None);
    }
}
