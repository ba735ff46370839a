// Rendering widgets for each screen and overlay of the wizard.

pub mod advisor_picker;
pub mod question_panel;
pub mod quit_confirm;
pub mod report;
pub mod review;
pub mod status_bar;
pub mod suggestions;
