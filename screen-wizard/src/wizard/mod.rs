pub mod assembler;
pub mod coercion;
pub mod collection;
pub mod controller;
pub mod resolution;
pub mod step;
pub mod validator;

pub use controller::{PendingSubmission, SubmissionResult, SubmitError, WizardController};
