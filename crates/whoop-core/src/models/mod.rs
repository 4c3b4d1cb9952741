//! Typed response models for the WHOOP API.
//!
//! Collection records (cycles, recoveries, sleeps, workouts) stay as raw
//! JSON; the types here cover the fixed-shape responses:
//!
//! - `TokenResponse`: token endpoint body
//! - `UserProfile`, `BodyMeasurement`: account data
//! - `HeartRateValue`: legacy heart-rate samples

pub mod auth;
pub mod heart_rate;
pub mod user;

pub use auth::{TokenResponse, TokenUser, TokenUserProfile};
pub use heart_rate::{HeartRateResponse, HeartRateValue};
pub use user::{BodyMeasurement, UserProfile};
