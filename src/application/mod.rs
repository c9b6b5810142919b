//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `ShopService` which acts as the primary entry point
//! for every storefront operation, and the `TokenAuthenticator` that turns
//! bearer tokens into principals.

pub mod auth;
pub mod service;
