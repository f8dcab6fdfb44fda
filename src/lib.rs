// Library surface for the terminal shell and integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod coach;
pub mod config;
pub mod feedback;
pub mod gemini;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod samples;
pub mod scoring;
pub mod session;
pub mod store;
pub mod timer;
