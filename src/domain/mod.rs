//! Domain model: value objects, policies and the ports the application layer
//! depends on.

pub mod account;
pub mod coupon;
pub mod document;
pub mod egress;
pub mod ports;
pub mod pricing;
pub mod principal;
pub mod transfer;
