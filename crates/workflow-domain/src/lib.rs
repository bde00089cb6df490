//! workflow-domain: modelo de datos del motor de workflows editoriales
//!
//! Define las entidades (`WorkflowDefinition`, `WorkflowState`,
//! `WorkflowTransition`, `WorkflowRole`, `TransitionGrant`,
//! `ContentWorkflowState`), la validación de definiciones, la taxonomía de
//! errores y los contratos de persistencia (`WorkflowRepository`,
//! `ContentStateRepository`) junto con una implementación en memoria útil
//! para pruebas (`InMemoryWorkflowRepository`).
mod content_state;
mod definition;
mod errors;
mod repository;
mod role;
mod state;
mod stubs;
mod transition;

pub use content_state::{CasResult, ContentWorkflowState};
pub use definition::{WorkflowDefinition, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
pub use errors::{Result, WorkflowError};
pub use repository::{ContentStateRepository, WorkflowRepository};
pub use role::{TransitionGrant, WorkflowRole};
pub use state::{is_valid_state_key, WorkflowState};
pub use stubs::InMemoryWorkflowRepository;
pub use transition::WorkflowTransition;
