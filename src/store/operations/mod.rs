pub mod collections;
pub mod metrics;
pub mod orders;
pub mod question_sets;
pub mod question_stats;
