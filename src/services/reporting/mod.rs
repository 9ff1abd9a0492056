//! Bucketed metric reports over extraction pipeline tables.

pub mod calendar;
pub mod dataset;
pub mod filter;
pub mod merge;
pub mod mysql_store;
pub mod percentages;
pub mod reconcile;
pub mod reports;
pub mod store;
