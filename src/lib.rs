//! Airpulse - air-quality readings for any city.
//!
//! # Overview
//!
//! Airpulse shows current PM10 and PM2.5 readings for a featured city, lets
//! a user search for any city by name, compares two cities side by side,
//! detects the device location and keeps a list of favorite cities.
//!
//! Readings come from the Open-Meteo air-quality API and city search from
//! the Open-Meteo geocoding API. Favorites live in local SQLite storage.
//!
//! # Modules
//!
//! - [`model`]: Coordinates, samples, favorites and the PM2.5 status scale
//! - [`sparkline`]: Geometry for the recent PM2.5 history chart
//! - [`data_sources`]: Air-quality and geocoding HTTP clients
//! - [`geolocation`]: Single-shot device location
//! - [`storage`]: SQLite key/value storage
//! - [`favorites`]: The persisted favorites list
//! - [`views`]: Home, compare and favorites view state
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod data_sources;
pub mod favorites;
pub mod geolocation;
pub mod model;
pub mod sparkline;
pub mod storage;
pub mod views;
