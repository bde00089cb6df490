//! Implementación Diesel de los contratos de persistencia del dominio
//! editorial (`WorkflowRepository` y `ContentStateRepository`).
//! Este archivo expone el módulo `schema` y reexporta el repositorio
//! Diesel; la implementación detallada está en `definition_persistence.rs`.
//! SQLite se usa en tests y desarrollo; Postgres se habilita con la
//! feature `pg`.

mod definition_persistence;
pub mod schema;

#[cfg(not(feature = "pg"))]
pub use definition_persistence::new_sqlite_for_test;
pub use definition_persistence::{new_from_env, DieselWorkflowRepository, MIGRATIONS};
