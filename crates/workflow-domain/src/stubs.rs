// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// Incluye `InMemoryWorkflowRepository`, que implementa tanto
// `WorkflowRepository` como `ContentStateRepository` sobre HashMaps
// protegidos por Mutex. No es durable; se usa en demos y pruebas locales.
use crate::content_state::{CasResult, ContentWorkflowState};
use crate::definition::WorkflowDefinition;
use crate::errors::{Result, WorkflowError};
use crate::repository::{ContentStateRepository, WorkflowRepository};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Repositorio en memoria para definiciones y estados de contenido.
pub struct InMemoryWorkflowRepository {
  /// Definiciones indexadas por id.
  definitions: Mutex<HashMap<Uuid, WorkflowDefinition>>,
  /// Estado de workflow por ítem de contenido.
  content: Mutex<HashMap<Uuid, ContentWorkflowState>>,
}

impl InMemoryWorkflowRepository {
  pub fn new() -> Self {
    Self { definitions: Mutex::new(HashMap::new()),
           content: Mutex::new(HashMap::new()) }
  }

  /// Helper para mapear `Mutex::lock()` en un `Result` con
  /// `WorkflowError::Storage`.
  fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, WorkflowError> {
    m.lock().map_err(|e| WorkflowError::Storage(format!("mutex poisoned: {:?}", e)))
  }
}

impl Default for InMemoryWorkflowRepository {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkflowRepository for InMemoryWorkflowRepository {
  /// Upsert completo de la definición. Al guardar una default activa,
  /// las demás definiciones activas que compartan tipo de contenido
  /// pierden su flag default (invariante de default único por tipo).
  fn save_definition(&self, definition: &WorkflowDefinition) -> Result<Uuid> {
    let mut defs = self.lock(&self.definitions)?;
    if definition.is_default && definition.is_active {
      for other in defs.values_mut() {
        if other.id != definition.id
           && other.is_active
           && other.is_default
           && other.content_types.iter().any(|c| definition.content_types.contains(c))
        {
          other.is_default = false;
        }
      }
    }
    defs.insert(definition.id, definition.clone());
    Ok(definition.id)
  }

  fn get_definition(&self, id: &Uuid) -> Result<Option<WorkflowDefinition>> {
    let defs = self.lock(&self.definitions)?;
    Ok(defs.get(id).cloned())
  }

  fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
    let defs = self.lock(&self.definitions)?;
    Ok(defs.values().cloned().collect())
  }

  fn find_by_content_type(&self, content_type: &str) -> Result<Vec<WorkflowDefinition>> {
    let defs = self.lock(&self.definitions)?;
    Ok(defs.values()
           .filter(|d| d.content_types.iter().any(|c| c == content_type))
           .cloned()
           .collect())
  }

  fn find_default_for(&self, content_type: &str) -> Result<Option<WorkflowDefinition>> {
    let defs = self.lock(&self.definitions)?;
    Ok(defs.values()
           .find(|d| d.is_active && d.is_default && d.content_types.iter().any(|c| c == content_type))
           .cloned())
  }

  fn delete_definition(&self, id: &Uuid) -> Result<()> {
    let mut defs = self.lock(&self.definitions)?;
    // Las colecciones hijas viven dentro de la definición, por lo que el
    // borrado cascadea de forma natural.
    defs.remove(id)
        .map(|_| ())
        .ok_or(WorkflowError::NotFound(format!("definición {}", id)))
  }
}

impl ContentStateRepository for InMemoryWorkflowRepository {
  fn get_content_state(&self, content_id: &Uuid) -> Result<Option<ContentWorkflowState>> {
    let content = self.lock(&self.content)?;
    Ok(content.get(content_id).cloned())
  }

  fn put_content_state(&self, state: &ContentWorkflowState) -> Result<()> {
    let mut content = self.lock(&self.content)?;
    content.insert(state.content_id, state.clone());
    Ok(())
  }

  /// CAS en memoria: compara el estado actual con el esperado bajo el
  /// mismo lock que realiza la escritura, de modo que de dos carreras
  /// desde el mismo origen gana exactamente una.
  fn apply_transition(&self,
                      content_id: &Uuid,
                      expected_state_key: &str,
                      new_state_key: &str,
                      reviewer_id: &Uuid,
                      comment: Option<&str>)
                      -> Result<CasResult> {
    let mut content = self.lock(&self.content)?;
    let item = content.get_mut(content_id)
                      .ok_or(WorkflowError::NotFound(format!("contenido {}", content_id)))?;
    if item.state_key != expected_state_key {
      return Ok(CasResult::Conflict);
    }
    item.state_key = new_state_key.to_string();
    item.last_reviewer_id = Some(*reviewer_id);
    item.last_reviewed_at = Some(Utc::now());
    item.last_comment = comment.map(|c| c.to_string());
    Ok(CasResult::Applied { new_state_key: new_state_key.to_string() })
  }

  fn delete_content_state(&self, content_id: &Uuid) -> Result<()> {
    let mut content = self.lock(&self.content)?;
    content.remove(content_id)
           .map(|_| ())
           .ok_or(WorkflowError::NotFound(format!("contenido {}", content_id)))
  }
}
