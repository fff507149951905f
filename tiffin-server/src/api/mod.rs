//! HTTP API routers.
//!
//! Split the way the inbound surface is consumed: `payment` is the checkout
//! flow (initiate + validate), `order` is the order ledger surface used by
//! customers and shop owners.

pub mod order;
pub mod payment;
