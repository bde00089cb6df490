// definition.rs
use crate::errors::{Result, WorkflowError};
use crate::role::{TransitionGrant, WorkflowRole};
use crate::state::{is_valid_state_key, WorkflowState};
use crate::transition::WorkflowTransition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 512;

/// Configuración nombrada de un pipeline de aprobación editorial.
///
/// Una definición es dueña exclusiva de sus estados, transiciones, roles y
/// grants (composición; el borrado cascadea). Gobierna uno o más tipos de
/// contenido (`content_types`); a lo sumo una definición activa puede ser
/// default por tipo de contenido. Las definiciones inactivas quedan
/// invisibles para contenido nuevo pero se conservan por historial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub content_types: Vec<String>,
  pub is_default: bool,
  pub is_active: bool,
  pub initial_state_key: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub states: Vec<WorkflowState>,
  pub transitions: Vec<WorkflowTransition>,
  pub roles: Vec<WorkflowRole>,
  pub grants: Vec<TransitionGrant>,
}

impl WorkflowDefinition {
  /// Crea una definición vacía (sin estados todavía, por lo tanto inválida
  /// hasta que se le agreguen hijos y se fije `initial_state_key`).
  pub fn new(name: &str, content_types: Vec<String>) -> Self {
    let now = Utc::now();
    Self { id: Uuid::new_v4(),
           name: name.to_string(),
           description: None,
           content_types,
           is_default: false,
           is_active: true,
           initial_state_key: String::new(),
           created_at: now,
           updated_at: now,
           states: Vec::new(),
           transitions: Vec::new(),
           roles: Vec::new(),
           grants: Vec::new() }
  }

  pub fn state_by_key(&self, key: &str) -> Option<&WorkflowState> {
    self.states.iter().find(|s| s.key == key)
  }

  pub fn transition_by_id(&self, id: &Uuid) -> Option<&WorkflowTransition> {
    self.transitions.iter().find(|t| &t.id == id)
  }

  /// Transiciones salientes de `from_state_key`, ordenadas por `sort_order`.
  pub fn transitions_from(&self, from_state_key: &str) -> Vec<&WorkflowTransition> {
    let mut out: Vec<&WorkflowTransition> =
      self.transitions.iter().filter(|t| t.from_state_key == from_state_key).collect();
    out.sort_by_key(|t| t.sort_order);
    out
  }

  pub fn role_by_key(&self, role_key: &str) -> Option<&WorkflowRole> {
    self.roles.iter().find(|r| r.role_key == role_key)
  }

  /// Grants asociados a una transición concreta.
  pub fn grants_for(&self, transition_id: &Uuid) -> Vec<&TransitionGrant> {
    self.grants.iter().filter(|g| &g.transition_id == transition_id).collect()
  }

  /// Valida la definición completa.
  ///
  /// Devuelve la lista de advertencias (no fatales) si la definición es
  /// válida, o `WorkflowError::Validation` con todos los mensajes de error
  /// acumulados. Nunca se aplica una definición parcialmente: el caller no
  /// debe persistir si esto falla.
  pub fn validate(&self) -> Result<Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if self.name.trim().is_empty() {
      errors.push("El nombre de la definición es obligatorio".to_string());
    } else if self.name.len() > MAX_NAME_LEN {
      errors.push(format!("El nombre excede {} caracteres", MAX_NAME_LEN));
    }
    if let Some(d) = &self.description {
      if d.len() > MAX_DESCRIPTION_LEN {
        errors.push(format!("La descripción excede {} caracteres", MAX_DESCRIPTION_LEN));
      }
    }
    if self.content_types.iter().filter(|c| !c.trim().is_empty()).count() == 0 {
      errors.push("La definición debe gobernar al menos un tipo de contenido".to_string());
    }
    if self.initial_state_key.trim().is_empty() {
      errors.push("Falta initial_state_key".to_string());
    }
    if self.states.is_empty() {
      errors.push("La definición debe tener al menos un estado".to_string());
    }

    // Claves de estado: formato y unicidad dentro de la definición.
    let mut seen: HashSet<&str> = HashSet::new();
    for s in &self.states {
      if !is_valid_state_key(&s.key) {
        errors.push(format!("Clave de estado inválida: '{}'", s.key));
      }
      if !seen.insert(s.key.as_str()) {
        errors.push(format!("Clave de estado duplicada: '{}'", s.key));
      }
    }

    if !self.initial_state_key.trim().is_empty()
       && !self.states.is_empty()
       && !seen.contains(self.initial_state_key.as_str())
    {
      errors.push(format!("initial_state_key '{}' no corresponde a ningún estado definido", self.initial_state_key));
    }

    // Toda transición debe referenciar estados definidos.
    for t in &self.transitions {
      if !seen.contains(t.from_state_key.as_str()) {
        errors.push(format!("La transición '{}' parte del estado desconocido '{}'", t.name, t.from_state_key));
      }
      if !seen.contains(t.to_state_key.as_str()) {
        errors.push(format!("La transición '{}' llega al estado desconocido '{}'", t.name, t.to_state_key));
      }
    }

    // Exactamente un estado inicial; cero o varios es ambiguo y se rechaza.
    let initials: Vec<&WorkflowState> = self.states.iter().filter(|s| s.is_initial).collect();
    if !self.states.is_empty() {
      match initials.len() {
        0 => errors.push("Ningún estado está marcado como inicial".to_string()),
        1 => {
          if initials[0].key != self.initial_state_key {
            warnings.push(format!("El estado inicial marcado ('{}') difiere de initial_state_key ('{}')",
                                  initials[0].key, self.initial_state_key));
          }
        }
        n => errors.push(format!("Hay {} estados marcados como inicial; debe haber exactamente uno", n)),
      }
    }

    for r in &self.roles {
      if !(1..=100).contains(&r.priority) {
        errors.push(format!("El rol '{}' tiene prioridad {} fuera del rango 1..=100", r.role_key, r.priority));
      }
      for k in r.allowed_from_states.iter().chain(r.allowed_to_states.iter()) {
        if !seen.contains(k.as_str()) {
          warnings.push(format!("El rol '{}' referencia el estado desconocido '{}'", r.role_key, k));
        }
      }
    }

    // Unicidad compuesta (role_id, transition_id) en los grants.
    let mut pairs: HashSet<(Uuid, Uuid)> = HashSet::new();
    for g in &self.grants {
      if !pairs.insert((g.role_id, g.transition_id)) {
        errors.push(format!("Grant duplicado para el par rol/transición ({}, {})", g.role_id, g.transition_id));
      }
    }

    if errors.is_empty() {
      Ok(warnings)
    } else {
      Err(WorkflowError::Validation { messages: errors })
    }
  }

  /// Normaliza el shorthand legado `required_role` a filas de grant.
  ///
  /// Para cada transición con `required_role = Some(k)` cuyo rol exista en
  /// esta definición y que todavía no tenga grant para ese par, inserta un
  /// `TransitionGrant` con `can_execute = true`. El campo escalar se
  /// conserva para round-trip; la evaluación trata los grants como la lista
  /// autoritativa.
  pub fn normalize_grants(&mut self) {
    let mut new_grants: Vec<TransitionGrant> = Vec::new();
    for t in &self.transitions {
      let Some(key) = &t.required_role else { continue };
      let Some(role) = self.roles.iter().find(|r| &r.role_key == key) else {
        continue;
      };
      let already = self.grants.iter().chain(new_grants.iter())
                        .any(|g| g.role_id == role.id && g.transition_id == t.id);
      if !already {
        new_grants.push(TransitionGrant::executing(role.id, t.id));
      }
    }
    self.grants.extend(new_grants);
  }

  /// Propaga el `definition_id` del padre a todos los hijos. Útil al armar
  /// definiciones con los builders, donde los hijos se crean antes de
  /// conocer el id final.
  pub fn adopt_children(&mut self) {
    for s in &mut self.states {
      s.definition_id = self.id;
    }
    for t in &mut self.transitions {
      t.definition_id = self.id;
    }
    for r in &mut self.roles {
      r.definition_id = self.id;
    }
  }
}
