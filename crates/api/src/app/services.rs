//! Sample "things" service wired on top of the error conventions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use keel_core::{ServiceError, ValidationErrors, Validator, ValidatorRegistry};
use keel_health::Health;

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    pub id: u64,
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateThing {
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Restock {
    pub delta: u64,
}

/// In-memory thing storage (dev/test).
#[derive(Debug)]
pub struct ThingStore {
    things: Mutex<HashMap<u64, Thing>>,
    next_id: AtomicU64,
}

impl Default for ThingStore {
    fn default() -> Self {
        Self {
            things: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl ThingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Thing>> {
        self.things.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expects a validated request (non-negative quantity).
    pub fn create(&self, cmd: CreateThing) -> Result<Thing, ServiceError> {
        let mut things = self.lock();
        if things.values().any(|t| t.name == cmd.name) {
            return Err(ServiceError::conflict(format!("a thing named '{}' already exists", cmd.name))
                .code("THING_EXISTS")
                .field_error_with_code("name", "DUPLICATE", "is already taken"));
        }

        let thing = Thing {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: cmd.name,
            quantity: cmd.quantity.max(0).unsigned_abs(),
        };
        things.insert(thing.id, thing.clone());
        Ok(thing)
    }

    pub fn get(&self, id: u64) -> Result<Thing, ServiceError> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("thing {id} not found")))
    }

    pub fn restock(&self, id: u64, delta: u64) -> anyhow::Result<Thing> {
        let mut things = self.lock();
        let Some(thing) = things.get_mut(&id) else {
            return Err(ServiceError::not_found(format!("thing {id} not found")).into());
        };

        let Some(quantity) = thing.quantity.checked_add(delta) else {
            bail!("stock counter overflow for thing {id}: {} + {delta}", thing.quantity);
        };
        thing.quantity = quantity;
        Ok(thing.clone())
    }

    /// Health predicate: the store is usable unless a writer panicked.
    pub fn health(&self) -> Health {
        match self.things.lock() {
            Ok(things) => Health::up().with_detail("things", things.len()),
            Err(_) => Health::down().with_detail("error", "thing store lock poisoned"),
        }
    }
}

/// Validates new things against a set of reserved names.
#[derive(Debug, Clone)]
pub struct CreateThingValidator {
    reserved_names: Vec<String>,
}

impl CreateThingValidator {
    pub fn new(reserved_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            reserved_names: reserved_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator<CreateThing> for CreateThingValidator {
    fn validate(&self, target: &CreateThing, errors: &mut ValidationErrors) -> anyhow::Result<()> {
        let name = target.name.trim();
        if name.is_empty() {
            errors.reject("name", "must not be blank");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.reject("name", format!("size must be between 1 and {MAX_NAME_LEN}"));
        } else if self.reserved_names.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            errors.reject_with_code("name", "RESERVED", "is a reserved name");
        }

        if target.quantity < 0 {
            errors.reject("quantity", "must be greater than or equal to 0");
        }
        Ok(())
    }
}

/// Validators for every request body the service accepts.
pub fn validators() -> ValidatorRegistry {
    let mut registry = ValidatorRegistry::new();
    registry
        .register::<CreateThing, _>(CreateThingValidator::new(["admin", "system"]))
        .register_fn::<Restock, _>(|restock: &Restock, errors: &mut ValidationErrors| {
            if restock.delta == 0 {
                errors.reject("delta", "must be greater than 0");
            }
            Ok(())
        });
    registry
}

#[cfg(test)]
mod tests {
    use keel_core::{DomainError, Failure};

    use super::*;

    fn create(store: &ThingStore, name: &str, quantity: i64) -> Result<Thing, ServiceError> {
        store.create(CreateThing {
            name: name.to_string(),
            quantity,
        })
    }

    #[test]
    fn duplicate_names_conflict_with_field_error() {
        let store = ThingStore::new();
        create(&store, "widget", 1).unwrap();

        let err = create(&store, "widget", 2).unwrap_err();
        assert_eq!(err.http_status().as_u16(), 409);
        assert_eq!(err.error_code(), Some("THING_EXISTS"));
        assert_eq!(err.field_errors()[0].field, "name");
    }

    #[test]
    fn restock_overflow_is_unclassified() {
        let store = ThingStore::new();
        let thing = create(&store, "widget", 1).unwrap();

        let err = store.restock(thing.id, u64::MAX).unwrap_err();
        assert!(matches!(Failure::classify(err), Failure::Unclassified(_)));
    }

    #[test]
    fn restock_of_missing_thing_is_not_found() {
        let err = ThingStore::new().restock(7, 1).unwrap_err();
        match Failure::classify(err) {
            Failure::Domain(e) => assert_eq!(e.http_status().as_u16(), 404),
            other => panic!("expected domain failure, got {other:?}"),
        }
    }

    #[test]
    fn create_validator_checks_name_and_quantity() {
        let registry = validators();
        let body = CreateThing {
            name: "Admin".to_string(),
            quantity: -3,
        };
        let mut errors = ValidationErrors::for_type::<CreateThing>();
        registry.validate(&body, &mut errors).unwrap();

        assert_eq!(errors.object_name(), "createThing");
        assert_eq!(errors.error_count(), 2);
        assert_eq!(errors.errors()[0].code.as_deref(), Some("RESERVED"));
    }

    #[test]
    fn health_reports_thing_count() {
        let store = ThingStore::new();
        create(&store, "widget", 1).unwrap();
        let health = store.health();
        assert!(health.is_up());
        assert_eq!(health.details["things"], 1);
    }
}
