//! Brand Studio: a local front end for three generation workflows.
//!
//! Each workflow (brand asset, product assets, image-to-prompt) is a
//! [`controller::Controller`] that validates its form, sends one request to
//! the generation API through a [`client::Transport`], and keeps the outcome.

pub mod client;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod models;
pub mod outcome;
pub mod routes;
