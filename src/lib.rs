//! rv, a terminal viewer for dataset analysis reports.
//!
//! A report (row/column counts, column types, missing values, dropped
//! columns and feature importances of a trained model) is turned into a
//! [`view::DashboardView`] which the [`ui`] draws with ratatui.

pub mod controller;
pub mod domain;
pub mod logging;
pub mod model;
pub mod report;
pub mod series;
pub mod ui;
pub mod view;
