// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod metrics;
pub mod notify;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod ui;

/// How often the event loop wakes up to fire due timers
pub const TICK_RATE_MS: u64 = 50;
