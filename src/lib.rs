//! # Todo API
//!
//! A REST service for todo records, built with Axum, SQLx, and Tokio.
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod service;
