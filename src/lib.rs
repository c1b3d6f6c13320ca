//! Schedule catalog builder for the FES Acatlán group-saturation reports.
//!
//! [`acatlan`] negotiates a session with the legacy ASP site and fetches one
//! report per degree program, [`schedule`] turns a report into a course
//! catalog, and [`scraper`] runs the whole program list politely and collects
//! the results into a [`scraper::ConsolidatedDataset`].

pub mod acatlan;
pub mod cli;
pub mod config;
pub mod logging;
pub mod pacing;
pub mod schedule;
pub mod scraper;
pub mod sink;
pub mod utils;
