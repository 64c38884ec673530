//! Admission control
//!
//! Everything that decides whether a submission may enter the queue:
//! field validation and the inbound throttle.

mod throttle;
mod validator;

pub use throttle::AdmissionThrottle;
pub use validator::{Admitted, FieldError, TEMPERATURE_RANGE, ValidationError, admit, admit_payload};
