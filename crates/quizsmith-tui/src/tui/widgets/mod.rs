// TUI widget modules, one per screen or overlay.

pub mod dashboard;
pub mod dialog;
pub mod form;
pub mod profile;
pub mod status_bar;
pub mod take_quiz;
