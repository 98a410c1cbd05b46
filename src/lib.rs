//! Trade route discovery over a fixed catalog of barter trades.
//!
//! A [`catalog::Catalog`] indexes trade rules by both endpoints and the
//! [`explorer`] walks it depth-first, producing every acyclic chain of trades
//! with exact quantities at each step.

pub mod catalog;
pub mod db;
pub mod explorer;
pub mod import;
pub mod models;
pub mod request;
