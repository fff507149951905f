#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod cart;
pub mod checkout;
pub mod entities;
pub mod framework;
pub mod gateway;
