//! Reporting façade: composes the dashboard, admin overview and detailed
//! analytics payloads from the aggregation engine and the directory.

pub mod facade;
pub mod payloads;

pub use facade::ReportingFacade;
