//! Client for the NikoGrid charging station map.
//!
//! The map side is built from a [`camera::Camera`] that reports viewport
//! changes, a [`feed::FeedController`] that turns those into debounced
//! nearby queries, and [`marker`] which decides how each interest point is
//! drawn. The remaining modules wrap the backend's account, reservation and
//! admin endpoints.

pub mod admin;
pub mod api;
pub mod auth;
pub mod booking;
pub mod camera;
pub mod config;
pub mod debounce;
pub mod feed;
pub mod geo;
pub mod marker;
pub mod notice;
pub mod search;
pub mod session;
