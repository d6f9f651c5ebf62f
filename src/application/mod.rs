// Application layer - Use cases, ports and the event loop
pub mod dashboard_service;
pub mod display;
pub mod events;
pub mod polling_scheduler;
pub mod telemetry_api;
