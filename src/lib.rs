pub mod models {
    pub mod nest;
}

pub mod adjust;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use adjust::{Rejection, Setpoint, TemperatureAdjustment};
pub use client::{Endpoints, NestClient};
pub use error::{NestError, TokenProblem};
pub use session::{AuthorizationRequest, Credentials, Session};
