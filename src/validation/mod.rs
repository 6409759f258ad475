//! Response validation
//!
//! - `ResponseValidator`: the async seam the conversation engine calls
//! - `RuleValidator`: in-process checks driven by each question's rule
//! - `NatsValidator`: delegates to an external checker over NATS

mod remote;
mod rules;
mod validator;

pub use remote::NatsValidator;
pub use rules::{RuleValidator, ValidatorMessages};
pub use validator::{ResponseValidator, ValidationResult};
