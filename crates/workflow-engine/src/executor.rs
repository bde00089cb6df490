// Archivo: executor.rs
// Propósito: implementar el ejecutor de transiciones: re-validación del
// lado servidor, gate de comentario, commit compare-and-swap del nuevo
// estado con auditoría y notificación best-effort.
use crate::collaborators::NotificationDispatcher;
use crate::permissions::PermissionEvaluator;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use workflow_domain::{CasResult, ContentStateRepository, Result, WorkflowError, WorkflowRepository};

/// Aplica transiciones validadas al estado de workflow de ítems de
/// contenido.
///
/// El ejecutor relee el estado actual inmediatamente antes de validar y el
/// commit usa compare-and-swap sobre el estado esperado: de dos
/// transiciones concurrentes desde el mismo origen, exactamente una gana y
/// la otra recibe `Conflict` (reintentable con estado fresco). El despacho
/// de notificaciones es fire-and-forget: un fallo se registra y se
/// descarta, nunca revierte el commit.
pub struct TransitionExecutor<R, C>
    where R: WorkflowRepository,
          C: ContentStateRepository
{
    definitions: Arc<R>,
    content: Arc<C>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl<R, C> TransitionExecutor<R, C>
    where R: WorkflowRepository + 'static,
          C: ContentStateRepository + 'static
{
    pub fn new(definitions: Arc<R>, content: Arc<C>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { definitions, content, notifier }
    }

    /// Ejecuta la transición `transition_id` sobre el ítem `content_id`.
    ///
    /// Devuelve la clave del nuevo estado. Errores posibles: `NotFound`
    /// (ítem, definición o transición inexistente), `Conflict` (el estado
    /// cambió entre listar y ejecutar), `PermissionDenied` (el actor no
    /// tiene rol habilitante) y `CommentRequired`.
    pub fn execute(&self,
                   content_id: &Uuid,
                   transition_id: &Uuid,
                   actor_id: &Uuid,
                   actor_role_keys: &[String],
                   comment: Option<&str>)
                   -> Result<String> {
        // Lectura fresca del estado actual: nunca se confía en la lista de
        // transiciones que el cliente calculó antes.
        let item = self.content
                       .get_content_state(content_id)?
                       .ok_or(WorkflowError::NotFound(format!("contenido {}", content_id)))?;
        let definition =
            self.definitions
                .find_default_for(&item.content_type)?
                .ok_or(WorkflowError::NotFound(format!("ningún workflow gobierna el tipo '{}'", item.content_type)))?;
        let transition = definition.transition_by_id(transition_id)
                                   .ok_or(WorkflowError::NotFound(format!("transición {}", transition_id)))?;

        if transition.from_state_key != item.state_key {
            return Err(WorkflowError::Conflict(format!("el ítem está en '{}', la transición parte de '{}'",
                                                       item.state_key, transition.from_state_key)));
        }

        let evaluator = PermissionEvaluator::new(&definition);
        if !evaluator.can_execute(transition, actor_role_keys) {
            return Err(WorkflowError::PermissionDenied(format!("la transición '{}' no está habilitada para el actor",
                                                               transition.name)));
        }

        if transition.requires_comment && comment.map_or(true, |c| c.trim().is_empty()) {
            return Err(WorkflowError::CommentRequired(transition.name.clone()));
        }

        // Commit atómico: estado + auditoría en una sola transacción, CAS
        // sobre el estado origen esperado.
        let outcome = self.content.apply_transition(content_id,
                                                    &transition.from_state_key,
                                                    &transition.to_state_key,
                                                    actor_id,
                                                    comment)?;
        let new_state_key = match outcome {
            CasResult::Applied { new_state_key } => new_state_key,
            CasResult::Conflict => {
                return Err(WorkflowError::Conflict(format!("el estado de {} cambió durante la ejecución; releer y \
                                                            reintentar",
                                                           content_id)));
            }
        };

        if transition.send_notification {
            let template = transition.notification_template.as_deref().unwrap_or(&transition.name);
            let context = json!({
                "content_id": content_id,
                "actor_id": actor_id,
                "from_state": transition.from_state_key,
                "to_state": transition.to_state_key,
                "transition": transition.name,
            });
            if let Err(e) = self.notifier.notify(template, &context) {
                // Best-effort: el fallo de notificación no altera el
                // resultado de la transición ya confirmada.
                log::warn!("fallo al notificar '{}' para {}: {}", template, content_id, e);
            }
        }

        Ok(new_state_key)
    }
}
