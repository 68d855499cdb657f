//! Metric record storage and the aggregation engine behind every analytics
//! surface: time series by day/week/month, summary statistics, and
//! campaign/client status breakdowns.

pub mod aggregate;
pub mod clickhouse_store;
pub mod engine;
pub mod grouping;
pub mod stats;
pub mod store;

pub use engine::AggregationEngine;
pub use grouping::GroupKey;
pub use store::{InMemoryMetricStore, MetricStore};
