//! workflow-engine: evaluación de permisos y ejecución de transiciones
//!
//! Este crate implementa la lógica del motor editorial por encima del
//! modelo de `workflow-domain`:
//!
//! - `PermissionEvaluator`: roles efectivos bajo herencia por prioridad y
//!   legalidad de ejecución de transiciones (grants autoritativos sobre el
//!   shorthand `required_role`).
//! - `WorkflowService`: orquestación — guardar con validación,
//!   transiciones disponibles, instalación del workflow default.
//! - `DefaultWorkflowFactory`: pipeline canónico de 5 estados.
//! - `TransitionExecutor`: re-validación del lado servidor, commit CAS con
//!   auditoría y notificación best-effort.
//! - `collaborators`/`stubs`: traits inyectables (`RoleResolver`,
//!   `NotificationDispatcher`) y sus stubs en memoria.
//!
//! Ejemplo rápido:
//! ```rust
//! use std::sync::Arc;
//! use workflow_domain::InMemoryWorkflowRepository;
//! use workflow_engine::{StaticRoleResolver, WorkflowService};
//! let repo = Arc::new(InMemoryWorkflowRepository::new());
//! let service = WorkflowService::new(repo);
//! let resolver = StaticRoleResolver::with_editorial_tiers();
//! let (def, _warnings) = service.install_default_workflow("Blog", vec!["post".into()], &resolver).unwrap();
//! assert_eq!(def.states.len(), 5);
//! ```
pub mod collaborators;
pub mod executor;
pub mod factory;
pub mod permissions;
pub mod service;
pub mod stubs;

pub use collaborators::{NotificationDispatcher, RoleResolver};
pub use executor::TransitionExecutor;
pub use factory::DefaultWorkflowFactory;
pub use permissions::PermissionEvaluator;
pub use service::WorkflowService;
pub use stubs::{FailingDispatcher, RecordingDispatcher, StaticRoleResolver};
