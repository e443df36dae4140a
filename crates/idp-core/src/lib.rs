// Library root: season statistics ingestion, week-1 roster snapshots,
// feature assembly and labelled-example datasets for next-season IDP
// score prediction.

pub mod catalog;
pub mod dataset;
pub mod features;
pub mod parse;
pub mod roster;
pub mod season;
