//! Use cases - Application operations exposed to the HTTP layer

pub mod health_check;

pub use health_check::HealthCheckUseCase;
