//! Tour Guide: an embeddable product-tour engine.

pub mod analytics;
pub mod config;
pub mod error;
pub mod remote;
pub mod store;
pub mod tour;
pub mod widget;
