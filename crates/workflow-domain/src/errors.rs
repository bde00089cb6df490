// Archivo: errors.rs
// Propósito: definir la taxonomía de errores del motor editorial y el alias
// Result<T> usado por las APIs del workspace. Una sola taxonomía compartida
// por dominio, motor y persistencia.
use thiserror::Error;

/// Errores del motor de workflows editoriales.
///
/// - `Validation`: definición inválida; lleva la lista completa de mensajes.
/// - `NotFound`: entidad no encontrada (definición, contenido, transición).
/// - `PermissionDenied`: el actor no tiene rol para la transición.
/// - `Conflict`: conflicto de concurrencia (CAS fallido); reintentable.
/// - `CommentRequired`: la transición exige comentario y no se proporcionó.
/// - `Storage`: error al acceder al almacenamiento externo.
/// - `Serialization`: error de serialización/deserialización JSON.
#[derive(Error, Debug)]
pub enum WorkflowError {
  /// Definición inválida. Los mensajes se entregan completos al caller,
  /// nunca se aplica una definición parcialmente.
  #[error("Error de validación: {}", messages.join("; "))]
  Validation { messages: Vec<String> },
  /// Entidad no encontrada.
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// El actor no posee un rol que habilite la operación.
  #[error("Permiso denegado: {0}")]
  PermissionDenied(String),
  /// Conflicto optimista: el estado cambió entre lectura y commit.
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Subtipo específico de validación: falta el comentario obligatorio.
  #[error("Comentario requerido para la transición '{0}'")]
  CommentRequired(String),
  /// Error genérico de almacenamiento (BD, pool, etc.).
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// Error de serialización JSON.
  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
  /// Helper para construir un `Validation` con un único mensaje.
  pub fn validation(msg: impl Into<String>) -> Self {
    WorkflowError::Validation { messages: vec![msg.into()] }
  }
}

/// Alias de resultado usado por las APIs del workspace.
pub type Result<T> = std::result::Result<T, WorkflowError>;
