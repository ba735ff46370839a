// Wizard domain: advisor personas, the question catalog, the step state
// machine, and the validation report.

pub mod advisor;
pub mod question;
pub mod report;
pub mod state;
