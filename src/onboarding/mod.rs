//! Onboarding: the screen-routing state machine and its effect driver.

pub mod driver;
pub mod machine;
pub mod session;

pub use driver::{OnboardingDriver, Outcome};
pub use machine::{Event, Notice, Onboarding, Screen, State};
pub use session::SessionContext;
