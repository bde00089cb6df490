// transition.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Arista dirigida entre dos estados de una definición.
///
/// `required_role` es el gating legado de rol único: `None` significa que
/// cualquier actor puede ejecutar la transición (intencional, p.ej. devolver
/// contenido rechazado a borrador). La representación normalizada de
/// autorización vive en `TransitionGrant` (ver `role.rs`); cuando existen
/// grants para una transición, éstos son la lista autoritativa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTransition {
  pub id: Uuid,
  pub definition_id: Uuid,
  pub from_state_key: String,
  pub to_state_key: String,
  pub name: String,
  pub description: Option<String>,
  /// `role_key` requerido (shorthand legado); `None` = sin restricción.
  pub required_role: Option<String>,
  pub css_class: Option<String>,
  pub icon: Option<String>,
  pub sort_order: i32,
  pub requires_comment: bool,
  pub send_notification: bool,
  pub notification_template: Option<String>,
}

impl WorkflowTransition {
  pub fn new(definition_id: Uuid, from: &str, to: &str, name: &str, sort_order: i32) -> Self {
    Self { id: Uuid::new_v4(),
           definition_id,
           from_state_key: from.to_string(),
           to_state_key: to.to_string(),
           name: name.to_string(),
           description: None,
           required_role: None,
           css_class: None,
           icon: None,
           sort_order,
           requires_comment: false,
           send_notification: false,
           notification_template: None }
  }

  pub fn requiring_role(mut self, role_key: Option<&str>) -> Self {
    self.required_role = role_key.map(|s| s.to_string());
    self
  }

  pub fn requiring_comment(mut self) -> Self {
    self.requires_comment = true;
    self
  }

  pub fn notifying(mut self, template: Option<&str>) -> Self {
    self.send_notification = true;
    self.notification_template = template.map(|s| s.to_string());
    self
  }
}

impl fmt::Display for WorkflowTransition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "WorkflowTransition({} --[{}]--> {})", self.from_state_key, self.name, self.to_state_key)
  }
}
