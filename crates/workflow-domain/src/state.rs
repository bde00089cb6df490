// state.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Un nodo del pipeline editorial.
///
/// El `key` es el identificador estable dentro de la definición (minúsculas,
/// alfanumérico y guión bajo, único por definición); el resto son campos de
/// presentación y flags de semántica (`is_published`, `is_initial`,
/// `is_final`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
  pub id: Uuid,
  pub definition_id: Uuid,
  pub key: String,
  pub name: String,
  pub description: Option<String>,
  pub color: String,
  pub icon: String,
  pub sort_order: i32,
  /// El contenido en este estado es visible públicamente.
  pub is_published: bool,
  pub is_initial: bool,
  pub is_final: bool,
}

impl WorkflowState {
  /// Crea un estado con valores de presentación neutros. Los flags se
  /// ajustan con los builders `initial`/`published`/`final_state`.
  pub fn new(definition_id: Uuid, key: &str, name: &str, sort_order: i32) -> Self {
    Self { id: Uuid::new_v4(),
           definition_id,
           key: key.to_string(),
           name: name.to_string(),
           description: None,
           color: "#6c757d".to_string(),
           icon: "circle".to_string(),
           sort_order,
           is_published: false,
           is_initial: false,
           is_final: false }
  }

  pub fn initial(mut self) -> Self {
    self.is_initial = true;
    self
  }

  pub fn published(mut self) -> Self {
    self.is_published = true;
    self
  }

  pub fn final_state(mut self) -> Self {
    self.is_final = true;
    self
  }

  pub fn with_color(mut self, color: &str) -> Self {
    self.color = color.to_string();
    self
  }

  pub fn with_icon(mut self, icon: &str) -> Self {
    self.icon = icon.to_string();
    self
  }
}

/// Valida el formato de un `key` de estado: 1..=64 caracteres, sólo
/// minúsculas ASCII, dígitos y guión bajo.
pub fn is_valid_state_key(key: &str) -> bool {
  !key.is_empty()
  && key.len() <= 64
  && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for WorkflowState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "WorkflowState({}: {})", self.key, self.name)
  }
}
