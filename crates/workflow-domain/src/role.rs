// role.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rol configurable con alcance de una sola definición de workflow.
///
/// Distinto de los roles globales del sistema de identidad: el vínculo es
/// únicamente el string `role_key`, que el caller resuelve externamente. El
/// motor nunca valida la existencia del rol de identidad (referencia débil).
///
/// `priority` (1..=100, mayor = más senior) expresa el ordenamiento de
/// seniority usado por la herencia de visibilidad. `allowed_from_states` /
/// `allowed_to_states` restringen los extremos de las transiciones que este
/// rol habilita; lista vacía = sin restricción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRole {
  pub id: Uuid,
  pub definition_id: Uuid,
  /// Nombre del rol en el proveedor de identidad externo.
  pub role_key: String,
  pub name: String,
  pub description: Option<String>,
  pub priority: i32,
  pub can_create: bool,
  pub can_edit: bool,
  pub can_delete: bool,
  pub can_view_all: bool,
  pub allowed_from_states: Vec<String>,
  pub allowed_to_states: Vec<String>,
  pub sort_order: i32,
}

impl WorkflowRole {
  pub fn new(definition_id: Uuid, role_key: &str, name: &str, priority: i32, sort_order: i32) -> Self {
    Self { id: Uuid::new_v4(),
           definition_id,
           role_key: role_key.to_string(),
           name: name.to_string(),
           description: None,
           priority,
           can_create: false,
           can_edit: false,
           can_delete: false,
           can_view_all: false,
           allowed_from_states: Vec::new(),
           allowed_to_states: Vec::new(),
           sort_order }
  }

  pub fn viewing_all(mut self) -> Self {
    self.can_view_all = true;
    self
  }

  /// True si el rol admite una transición entre `from` y `to` según sus
  /// listas de estados permitidos (vacía = sin restricción).
  pub fn allows_endpoints(&self, from: &str, to: &str) -> bool {
    let from_ok = self.allowed_from_states.is_empty() || self.allowed_from_states.iter().any(|s| s == from);
    let to_ok = self.allowed_to_states.is_empty() || self.allowed_to_states.iter().any(|s| s == to);
    from_ok && to_ok
  }
}

/// Grant de autorización por transición (representación normalizada).
///
/// Une un `WorkflowRole` con una `WorkflowTransition`: `can_execute` otorga
/// la ejecución, `requires_approval` marca que el resultado queda pendiente
/// de aprobación, `conditions` es texto libre interpretado por capas
/// superiores. Unicidad compuesta: el par `(role_id, transition_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionGrant {
  pub id: Uuid,
  pub role_id: Uuid,
  pub transition_id: Uuid,
  pub can_execute: bool,
  pub requires_approval: bool,
  pub conditions: Option<String>,
}

impl TransitionGrant {
  pub fn executing(role_id: Uuid, transition_id: Uuid) -> Self {
    Self { id: Uuid::new_v4(),
           role_id,
           transition_id,
           can_execute: true,
           requires_approval: false,
           conditions: None }
  }
}
