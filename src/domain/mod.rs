// Domain layer - Dashboard state and its invariants
pub mod connection;
pub mod dashboard;
pub mod reading;
pub mod relay;
pub mod series;
pub mod statistics;
pub mod view;
