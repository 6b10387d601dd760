//! Purchase-order transitions.

use thiserror::Error;

use procura_shared::AppError;

use super::types::{OrderAction, PoStatus};
use crate::request::RequestStatus;

/// Order errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Action not valid from the order's status.
    #[error("cannot {action} an order that is {actual}")]
    InvalidTransition {
        /// Attempted action.
        action: &'static str,
        /// Current status.
        actual: PoStatus,
    },
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

/// Stateless order service.
pub struct OrderService;

impl OrderService {
    /// Resulting status for a vendor action.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the action does not follow the current status.
    pub fn apply(current: PoStatus, action: &OrderAction) -> Result<PoStatus, OrderError> {
        let next = match (current, action) {
            (PoStatus::Issued, OrderAction::Acknowledge) => PoStatus::Acknowledged,
            (PoStatus::Acknowledged | PoStatus::PartiallyDelivered, OrderAction::Ship { .. }) => {
                PoStatus::Shipped
            }
            (PoStatus::Shipped | PoStatus::PartiallyDelivered, OrderAction::Deliver { partial }) => {
                if *partial {
                    PoStatus::PartiallyDelivered
                } else {
                    PoStatus::Delivered
                }
            }
            _ => {
                return Err(OrderError::InvalidTransition {
                    action: action.as_str(),
                    actual: current,
                });
            }
        };
        Ok(next)
    }

    /// Invoices are accepted until the order is paid or cancelled.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for PAID or CANCELLED orders.
    pub fn invoice(current: PoStatus) -> Result<PoStatus, OrderError> {
        match current {
            PoStatus::Paid | PoStatus::Cancelled => Err(OrderError::InvalidTransition {
                action: "invoice",
                actual: current,
            }),
            _ => Ok(PoStatus::Invoiced),
        }
    }

    /// Request status mirroring an order status, when there is one.
    #[must_use]
    pub fn request_status(po: PoStatus) -> Option<RequestStatus> {
        match po {
            PoStatus::Acknowledged => Some(RequestStatus::Ordered),
            PoStatus::Shipped => Some(RequestStatus::Shipped),
            PoStatus::PartiallyDelivered => Some(RequestStatus::PartiallyDelivered),
            PoStatus::Delivered => Some(RequestStatus::Delivered),
            PoStatus::Invoiced => Some(RequestStatus::Invoiced),
            PoStatus::Paid => Some(RequestStatus::Paid),
            PoStatus::Issued | PoStatus::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> OrderAction {
        OrderAction::Ship {
            tracking_number: Some("1Z999".into()),
            carrier: Some("UPS".into()),
        }
    }

    #[test]
    fn test_happy_path() {
        let s = OrderService::apply(PoStatus::Issued, &OrderAction::Acknowledge).unwrap();
        let s = OrderService::apply(s, &ship()).unwrap();
        let s = OrderService::apply(s, &OrderAction::Deliver { partial: false }).unwrap();
        assert_eq!(s, PoStatus::Delivered);
        assert_eq!(OrderService::invoice(s), Ok(PoStatus::Invoiced));
    }

    #[test]
    fn test_partial_delivery_then_second_shipment() {
        let s = OrderService::apply(PoStatus::Shipped, &OrderAction::Deliver { partial: true })
            .unwrap();
        assert_eq!(s, PoStatus::PartiallyDelivered);
        assert_eq!(OrderService::apply(s, &ship()), Ok(PoStatus::Shipped));
    }

    #[test]
    fn test_out_of_order_actions() {
        assert!(OrderService::apply(PoStatus::Issued, &ship()).is_err());
        assert!(OrderService::apply(PoStatus::Delivered, &OrderAction::Acknowledge).is_err());
        assert!(OrderService::invoice(PoStatus::Paid).is_err());
    }

    #[test]
    fn test_request_mirror() {
        assert_eq!(
            OrderService::request_status(PoStatus::Acknowledged),
            Some(RequestStatus::Ordered)
        );
        assert_eq!(OrderService::request_status(PoStatus::Issued), None);
    }
}
