//! Transperth journey poller.
//!
//! Periodically asks the Transperth Journey Planner for trip options on a
//! set of configured routes and serves the latest results over HTTP.

pub mod config;
pub mod domain;
pub mod hub;
pub mod poller;
pub mod registry;
pub mod transperth;
pub mod web;
