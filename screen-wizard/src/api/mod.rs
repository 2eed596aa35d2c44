pub mod registration;

pub use registration::{HttpRegistrationService, RegistrationError, ScreenRegistrationService};
