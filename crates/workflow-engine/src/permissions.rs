// Archivo: permissions.rs
// Propósito: implementar el evaluador de permisos: roles efectivos bajo
// herencia por prioridad y legalidad de ejecución de transiciones.
use uuid::Uuid;
use workflow_domain::{WorkflowDefinition, WorkflowRole, WorkflowTransition};

/// Evaluador de permisos sobre una definición concreta.
///
/// Dos decisiones distintas, con reglas distintas a propósito:
///
/// - **Visibilidad** (`effective_roles`, `can_view`): aplica herencia por
///   prioridad — un rol senior ve todo lo que ven los roles de prioridad
///   menor o igual.
/// - **Ejecución** (`can_execute`): NO aplica herencia. Únicamente el
///   role-key crudo del actor cuenta; la delegación explícita por
///   transición (`TransitionGrant.can_execute`) gobierna quién puede
///   actuar. Un rol senior ve más, pero no ejecuta transiciones ajenas sin
///   grant explícito.
pub struct PermissionEvaluator<'a> {
    definition: &'a WorkflowDefinition,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(definition: &'a WorkflowDefinition) -> Self {
        Self { definition }
    }

    /// Roles de la definición cuyo `role_key` aparece en el set crudo del
    /// actor.
    pub fn matched_roles(&self, raw_keys: &[String]) -> Vec<&'a WorkflowRole> {
        self.definition
            .roles
            .iter()
            .filter(|r| raw_keys.iter().any(|k| k == &r.role_key))
            .collect()
    }

    /// Roles efectivos bajo herencia por prioridad: los roles coincidentes
    /// con las claves crudas más todo rol cuya prioridad sea menor o igual
    /// al máximo de los coincidentes. Se usa sólo para decisiones de
    /// visibilidad y reporte, nunca para otorgar ejecución.
    pub fn effective_roles(&self, raw_keys: &[String]) -> Vec<&'a WorkflowRole> {
        let matched = self.matched_roles(raw_keys);
        let Some(max_priority) = matched.iter().map(|r| r.priority).max() else {
            return Vec::new();
        };
        let mut out: Vec<&WorkflowRole> = self.definition
                                              .roles
                                              .iter()
                                              .filter(|r| {
                                                  r.priority <= max_priority
                                                  || raw_keys.iter().any(|k| k == &r.role_key)
                                              })
                                              .collect();
        out.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.sort_order.cmp(&b.sort_order)));
        out
    }

    /// Decide si el actor puede ejecutar la transición.
    ///
    /// Cuando existen grants para la transición, son la lista autoritativa:
    /// algún rol coincidente (crudo) debe tener `can_execute` y admitir los
    /// extremos de la transición. Sin grants rige el shorthand legado:
    /// `required_role = None` es ejecutable por cualquiera; `Some(k)` exige
    /// que `k` esté en las claves crudas del actor.
    pub fn can_execute(&self, transition: &WorkflowTransition, raw_keys: &[String]) -> bool {
        let grants = self.definition.grants_for(&transition.id);
        if !grants.is_empty() {
            let matched = self.matched_roles(raw_keys);
            return matched.iter().any(|role| {
                              grants.iter().any(|g| g.role_id == role.id && g.can_execute)
                              && role.allows_endpoints(&transition.from_state_key, &transition.to_state_key)
                          });
        }
        match &transition.required_role {
            None => true,
            Some(key) => {
                if !raw_keys.iter().any(|k| k == key) {
                    return false;
                }
                // Si el rol está definido en la definición, sus listas de
                // estados permitidos también aplican.
                match self.definition.role_by_key(key) {
                    Some(role) => role.allows_endpoints(&transition.from_state_key, &transition.to_state_key),
                    None => true,
                }
            }
        }
    }

    /// Visibilidad de un ítem: el dueño siempre ve su contenido; de lo
    /// contrario algún rol efectivo debe tener `can_view_all`.
    pub fn can_view(&self, content_owner_id: &Uuid, actor_id: &Uuid, raw_keys: &[String]) -> bool {
        if content_owner_id == actor_id {
            return true;
        }
        self.effective_roles(raw_keys).iter().any(|r| r.can_view_all)
    }
}
