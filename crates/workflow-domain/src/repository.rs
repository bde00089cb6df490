// Archivo: repository.rs
// Propósito: definir los traits `WorkflowRepository` y
// `ContentStateRepository`, el contrato que deben implementar las
// persistencias (Diesel, in-memory, etc.).
use crate::content_state::{CasResult, ContentWorkflowState};
use crate::definition::WorkflowDefinition;
use crate::errors::Result;
use uuid::Uuid;

/// Contrato de persistencia para definiciones de workflow.
///
/// El repositorio persiste la definición con sus colecciones hijas de forma
/// transaccional. `save_definition` es un upsert por id: si no existe fila
/// inserta; si existe, actualiza los escalares y reconcilia cada colección
/// hija por diff de ids (los removidos se borran, los coincidentes se
/// actualizan en el lugar, los nuevos se insertan). La reconciliación por
/// diff evita dejar huérfanas las referencias de claves foráneas de
/// contenido en vuelo y el churn innecesario de identificadores.
pub trait WorkflowRepository: Send + Sync {
  /// Upsert de la definición completa. Si `is_default` está activo, toda
  /// otra definición activa que comparta algún tipo de contenido pierde su
  /// flag default en la misma transacción (invariante de default único).
  fn save_definition(&self, definition: &WorkflowDefinition) -> Result<Uuid>;

  /// Recupera una definición por id con hijos cargados (estados,
  /// transiciones y roles ordenados por `sort_order`).
  fn get_definition(&self, id: &Uuid) -> Result<Option<WorkflowDefinition>>;

  /// Lista todas las definiciones.
  fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>>;

  /// Definiciones que gobiernan un tipo de contenido.
  fn find_by_content_type(&self, content_type: &str) -> Result<Vec<WorkflowDefinition>>;

  /// Definición default activa para un tipo de contenido
  /// (`is_active && is_default && content_types contiene el tag`).
  fn find_default_for(&self, content_type: &str) -> Result<Option<WorkflowDefinition>>;

  /// Elimina la definición y cascadea a estados, transiciones, roles y
  /// grants. Retorna `NotFound` si la definición no existe.
  fn delete_definition(&self, id: &Uuid) -> Result<()>;
}

/// Contrato de persistencia para el estado de workflow de ítems de
/// contenido.
pub trait ContentStateRepository: Send + Sync {
  fn get_content_state(&self, content_id: &Uuid) -> Result<Option<ContentWorkflowState>>;

  /// Inserta o reemplaza el registro de estado de un ítem.
  fn put_content_state(&self, state: &ContentWorkflowState) -> Result<()>;

  /// Aplica una transición con semántica compare-and-swap: el update sólo
  /// procede si el estado actual coincide con `expected_state_key`. El
  /// cambio de estado y los campos de auditoría se escriben en una única
  /// transacción. Dos transiciones concurrentes desde el mismo estado
  /// origen resultan en un `Applied` y un `Conflict`.
  fn apply_transition(&self,
                      content_id: &Uuid,
                      expected_state_key: &str,
                      new_state_key: &str,
                      reviewer_id: &Uuid,
                      comment: Option<&str>)
                      -> Result<CasResult>;

  fn delete_content_state(&self, content_id: &Uuid) -> Result<()>;
}
