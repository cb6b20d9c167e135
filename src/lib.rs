//! Terminal choropleth: countries colored by a metric relative to a baseline
//! country, with the baseline's trend across the metric's catalog years.

pub mod app;
pub mod braille;
pub mod catalog;
pub mod config;
pub mod data;
pub mod map;
pub mod selection;
pub mod ui;
pub mod views;
