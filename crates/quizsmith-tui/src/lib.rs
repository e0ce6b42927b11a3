// Library root: re-exports the orchestrator and the terminal UI so the
// binary and the integration tests share one code path.

pub mod app;
pub mod protocol;
pub mod tui;
