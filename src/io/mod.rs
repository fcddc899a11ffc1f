/// CSV export of the consumer table.
pub mod export;
/// Submission sinks for finalized configurations.
pub mod sink;
