// Archivo: stubs.rs
// Propósito: implementaciones en memoria de los colaboradores externos,
// para pruebas y wiring rápido. No son durables.
use crate::collaborators::{NotificationDispatcher, RoleResolver};
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use workflow_domain::{Result, WorkflowError};

/// Resolutor de roles estático: conoce un conjunto fijo de nombres de rol.
///
/// Simula el proveedor de identidad en pruebas y demos; cada nombre
/// conocido se resuelve a un id sintético `"role:<nombre>"`.
pub struct StaticRoleResolver {
    known: Vec<String>,
    actor_roles: Vec<String>,
}

impl StaticRoleResolver {
    pub fn new(known: &[&str]) -> Self {
        Self { known: known.iter().map(|s| s.to_string()).collect(),
               actor_roles: Vec::new() }
    }

    /// Jerarquía editorial completa (Writer/Editor/Approver/SysAdmin).
    pub fn with_editorial_tiers() -> Self {
        Self::new(&["Writer", "Editor", "Approver", "SysAdmin"])
    }

    pub fn acting_as(mut self, roles: &[&str]) -> Self {
        self.actor_roles = roles.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl RoleResolver for StaticRoleResolver {
    fn resolve_role_id(&self, role_name: &str) -> Option<String> {
        self.known
            .iter()
            .find(|k| k.as_str() == role_name)
            .map(|k| format!("role:{}", k))
    }

    fn current_actor_roles(&self) -> Vec<String> {
        self.actor_roles.clone()
    }
}

/// Despachador que registra cada notificación en memoria.
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(String, JsonValue)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self { sent: Mutex::new(Vec::new()) }
    }

    /// Notificaciones registradas hasta el momento (template, contexto).
    pub fn sent(&self) -> Vec<(String, JsonValue)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, template_key: &str, context: &JsonValue) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((template_key.to_string(), context.clone()));
        Ok(())
    }
}

/// Despachador que siempre falla; verifica que el executor trate la
/// notificación como best-effort.
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn notify(&self, template_key: &str, _context: &JsonValue) -> Result<()> {
        Err(WorkflowError::Storage(format!("despachador caído: {}", template_key)))
    }
}
