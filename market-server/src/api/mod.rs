//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`auth`] - signup / login / OTP flows
//! - [`users`] - account management
//! - [`products`] - catalog and inventory
//! - [`cart`] - per-user shopping cart
//! - [`orders`] - order lifecycle
//! - [`recipes`] - custom recipe builder and pricing
//! - [`didi`] - seller onboarding and approval
//! - [`dashboard`] - Didi dashboard aggregate
//! - [`location`] - GPS ping tracking
//! - [`training`] - lesson catalog and progress
//! - [`upload`] - image upload and static serving
//!
//! The user surface lives under `/api/v1/...`, everything else under
//! `/api/...` — clients already depend on both prefixes.

pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod didi;
pub mod health;
pub mod location;
pub mod orders;
pub mod products;
pub mod recipes;
pub mod training;
pub mod upload;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
