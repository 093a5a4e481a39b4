pub mod attributes;
pub mod identity;
pub mod listener;
pub mod metrics;
