//! `keel-core`: error taxonomy and validation primitives shared by keel
//! services.
//!
//! This crate is framework-agnostic: it knows about HTTP status codes but
//! nothing about routing or serialization of responses.

pub mod error;
pub mod failure;
pub mod validation;

pub use error::{DomainError, FieldError, InvalidStatus, ServiceError};
pub use failure::{DomainErrorBox, DomainErrorExt, Failure, MediaTypeError, ValidationFailure};
pub use validation::{ValidationErrors, Validator, ValidatorRegistry, object_name};
