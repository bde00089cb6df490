// Archivo: collaborators.rs
// Propósito: definir los traits de colaboradores externos que el motor
// consume por inyección: resolución de roles de identidad y despacho de
// notificaciones. Describe el contrato que deben implementar los
// adaptadores concretos (proveedor de identidad, mailer, etc.).
use serde_json::Value as JsonValue;
use workflow_domain::Result;

/// Fuente de roles de identidad externa.
///
/// El motor nunca inspecciona el proveedor de identidad directamente: se
/// inyecta este trait. Un nombre de rol que no se puede resolver se trata
/// como "restricción no alcanzable" (la transición queda sin gating), nunca
/// como error fatal.
pub trait RoleResolver: Send + Sync {
    /// Resuelve un nombre de rol al identificador del proveedor de
    /// identidad, si existe.
    fn resolve_role_id(&self, role_name: &str) -> Option<String>;

    /// Conjunto de role-keys del actor actual, como claves opacas.
    fn current_actor_roles(&self) -> Vec<String>;
}

/// Despachador de notificaciones (fire-and-forget).
///
/// El executor lo invoca después de confirmar una transición; un fallo de
/// despacho se registra y se descarta, jamás revierte ni reintenta el
/// cambio de estado.
pub trait NotificationDispatcher: Send + Sync {
    /// Envía la notificación identificada por `template_key` con los campos
    /// de contexto (título del contenido, actor, estados origen/destino).
    fn notify(&self, template_key: &str, context: &JsonValue) -> Result<()>;
}
