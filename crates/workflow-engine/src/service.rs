// Archivo: service.rs
// Propósito: implementar `WorkflowService`, la capa orquestadora que expone
// operaciones de alto nivel sobre definiciones de workflow (guardar con
// validación, transiciones disponibles, instalación del default). Esta capa
// debe ser invocada desde handlers HTTP o desde la CLI.
use crate::collaborators::RoleResolver;
use crate::factory::DefaultWorkflowFactory;
use crate::permissions::PermissionEvaluator;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use workflow_domain::{Result, WorkflowDefinition, WorkflowError, WorkflowRepository, WorkflowTransition};

/// Servicio de alto nivel sobre definiciones de workflow.
///
/// Orquesta el repositorio y el evaluador de permisos. Todas las
/// operaciones son reintentables: no hay I/O más allá del round-trip al
/// repositorio.
pub struct WorkflowService<R>
    where R: WorkflowRepository
{
    repo: Arc<R>,
}

impl<R> WorkflowService<R> where R: WorkflowRepository + 'static
{
    /// Crea el servicio inyectando el `WorkflowRepository`.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> Arc<R> {
        self.repo.clone()
    }

    /// Transiciones legales ahora mismo para un actor, desde un estado.
    ///
    /// Resuelve la definición default activa del tipo de contenido, filtra
    /// las transiciones salientes del estado actual por legalidad según el
    /// evaluador y las devuelve ordenadas por `sort_order` ascendente.
    /// Si ningún workflow gobierna el tipo de contenido, o ninguna
    /// transición califica, devuelve lista vacía (no es un error).
    pub fn available_transitions(&self,
                                 content_type: &str,
                                 current_state_key: &str,
                                 actor_role_keys: &[String])
                                 -> Result<Vec<WorkflowTransition>> {
        let Some(definition) = self.repo.find_default_for(content_type)? else {
            return Ok(Vec::new());
        };
        let evaluator = PermissionEvaluator::new(&definition);
        Ok(definition.transitions_from(current_state_key)
                     .into_iter()
                     .filter(|t| evaluator.can_execute(t, actor_role_keys))
                     .cloned()
                     .collect())
    }

    /// True si el par `(from, to)` aparece entre las transiciones
    /// disponibles para el actor. El lado servidor siempre re-verifica con
    /// esto; nunca se confía en listas calculadas por el cliente.
    pub fn validate_transition(&self,
                               content_type: &str,
                               from_state_key: &str,
                               to_state_key: &str,
                               actor_role_keys: &[String])
                               -> Result<bool> {
        let available = self.available_transitions(content_type, from_state_key, actor_role_keys)?;
        Ok(available.iter().any(|t| t.to_state_key == to_state_key))
    }

    /// Valida y persiste la definición.
    ///
    /// Si la validación falla no se persiste nada (los mensajes viajan
    /// completos en el error). En éxito: sella `updated_at`, propaga el id
    /// a los hijos, normaliza el shorthand `required_role` a grants y
    /// delega el upsert transaccional (diff de hijos + invariante de
    /// default único) al repositorio. Devuelve el id y las advertencias.
    pub fn save_definition(&self, definition: &mut WorkflowDefinition) -> Result<(Uuid, Vec<String>)> {
        let warnings = definition.validate()?;
        definition.updated_at = Utc::now();
        definition.adopt_children();
        definition.normalize_grants();
        let id = self.repo.save_definition(definition)?;
        Ok((id, warnings))
    }

    /// Recupera una definición; `NotFound` si no existe.
    pub fn get_definition(&self, id: &Uuid) -> Result<WorkflowDefinition> {
        self.repo
            .get_definition(id)?
            .ok_or(WorkflowError::NotFound(format!("definición {}", id)))
    }

    pub fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
        self.repo.list_definitions()
    }

    /// Definición default activa para un tipo de contenido, si existe.
    /// `None` significa "ningún workflow gobierna este contenido", no un
    /// fallo duro.
    pub fn find_default_for(&self, content_type: &str) -> Result<Option<WorkflowDefinition>> {
        self.repo.find_default_for(content_type)
    }

    pub fn delete_definition(&self, id: &Uuid) -> Result<()> {
        self.repo.delete_definition(id)
    }

    /// Construye el workflow canónico de 5 estados, lo marca como default
    /// para los tipos de contenido dados y lo persiste. Devuelve la
    /// definición instalada junto con las advertencias de validación.
    pub fn install_default_workflow(&self,
                                    name: &str,
                                    content_types: Vec<String>,
                                    resolver: &dyn RoleResolver)
                                    -> Result<(WorkflowDefinition, Vec<String>)> {
        let mut definition = DefaultWorkflowFactory::build(name, content_types, resolver);
        definition.is_default = true;
        let (_, warnings) = self.save_definition(&mut definition)?;
        Ok((definition, warnings))
    }
}
