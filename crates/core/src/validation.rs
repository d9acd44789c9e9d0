//! Per-request validator dispatch.
//!
//! Validators are registered up front for the concrete type they check and
//! carry whatever collaborators they need. Dispatch looks the validator up by
//! the value's type; values without one pass through untouched.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::FieldError;
use crate::failure::ValidationFailure;

/// Errors collected while validating one target object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    object_name: String,
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            errors: Vec::new(),
        }
    }

    /// Collection named after `T` (see [`object_name`]).
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(object_name::<T>())
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn reject(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn reject_with_code(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError::with_code(field, code, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_failure(self) -> ValidationFailure {
        ValidationFailure::new(self.object_name, self.errors)
    }
}

/// Checks a value of type `T`, recording violations in `errors`.
///
/// Returning `Err` aborts validation; the error is propagated to the caller
/// as-is.
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, target: &T, errors: &mut ValidationErrors) -> anyhow::Result<()>;
}

impl<T, F> Validator<T> for F
where
    T: ?Sized,
    F: Fn(&T, &mut ValidationErrors) -> anyhow::Result<()> + Send + Sync,
{
    fn validate(&self, target: &T, errors: &mut ValidationErrors) -> anyhow::Result<()> {
        self(target, errors)
    }
}

type ErasedValidator =
    Arc<dyn Fn(&dyn Any, &mut ValidationErrors) -> anyhow::Result<()> + Send + Sync>;

/// Type-keyed validator lookup.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeId, ErasedValidator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the validator for `T`, replacing any previous one.
    pub fn register<T, V>(&mut self, validator: V) -> &mut Self
    where
        T: Any,
        V: Validator<T> + 'static,
    {
        let erased: ErasedValidator = Arc::new(move |target: &dyn Any, errors: &mut ValidationErrors| {
            match target.downcast_ref::<T>() {
                Some(target) => validator.validate(target, errors),
                None => Ok(()),
            }
        });
        self.validators.insert(TypeId::of::<T>(), erased);
        self
    }

    pub fn register_fn<T, F>(&mut self, f: F) -> &mut Self
    where
        T: Any,
        F: Fn(&T, &mut ValidationErrors) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register::<T, F>(f)
    }

    pub fn has_validator<T: Any>(&self) -> bool {
        self.validators.contains_key(&TypeId::of::<T>())
    }

    /// Run the validator registered for `T`, if any.
    pub fn validate<T: Any>(&self, target: &T, errors: &mut ValidationErrors) -> anyhow::Result<()> {
        match self.validators.get(&TypeId::of::<T>()) {
            Some(validator) => validator(target, errors),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Lower-camel short type name, e.g. `app::CreateThing` -> `createThing`.
pub fn object_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);

    let mut chars = short.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
