// content_state.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado de workflow de un ítem de contenido más sus campos de auditoría.
///
/// Un ítem ocupa exactamente un estado a la vez (`state_key`). Los campos
/// `last_*` se actualizan junto con el cambio de estado en la misma
/// transacción de persistencia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentWorkflowState {
  pub content_id: Uuid,
  pub content_type: String,
  pub state_key: String,
  pub owner_id: Uuid,
  pub last_reviewer_id: Option<Uuid>,
  pub last_reviewed_at: Option<DateTime<Utc>>,
  pub last_comment: Option<String>,
}

impl ContentWorkflowState {
  pub fn new(content_id: Uuid, content_type: &str, state_key: &str, owner_id: Uuid) -> Self {
    Self { content_id,
           content_type: content_type.to_string(),
           state_key: state_key.to_string(),
           owner_id,
           last_reviewer_id: None,
           last_reviewed_at: None,
           last_comment: None }
  }
}

/// Resultado de un compare-and-swap sobre el estado de un ítem.
///
/// `Conflict` indica que el estado actual ya no coincidía con el esperado
/// (otra transición ganó la carrera); el caller debe releer y decidir de
/// nuevo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CasResult {
  Applied { new_state_key: String },
  Conflict,
}
