// Archivo: factory.rs
// Propósito: construir la definición de workflow canónica de 5 estados que
// se instala por defecto para un tipo de contenido, resolviendo los
// nombres de rol contra el proveedor de identidad inyectado.
use crate::collaborators::RoleResolver;
use once_cell::sync::Lazy;
use workflow_domain::{WorkflowDefinition, WorkflowRole, WorkflowState, WorkflowTransition};

/// Jerarquía editorial de cuatro niveles sembrada en el workflow default:
/// (nombre, prioridad, can_create, can_edit, can_delete, can_view_all).
static DEFAULT_ROLE_TIERS: Lazy<Vec<(&'static str, i32, bool, bool, bool, bool)>> = Lazy::new(|| {
    vec![("Writer", 25, true, false, false, false),
         ("Editor", 50, true, true, false, false),
         ("Approver", 75, true, true, false, true),
         ("SysAdmin", 100, true, true, true, true)]
});

/// Fábrica del pipeline editorial canónico.
///
/// ```text
/// draft --(submit_for_review)--> in_review
/// in_review --(approve)--> approved
/// in_review --(reject, comentario obligatorio)--> rejected
/// approved --(publish)--> published
/// rejected --(back_to_draft)--> draft
/// published --(unpublish)--> draft
/// ```
///
/// Gating de roles del default: submit_for_review y back_to_draft sin
/// restricción; approve/reject exigen "Editor"; publish/unpublish exigen
/// "Approver". Los nombres de rol se resuelven dinámicamente vía
/// `RoleResolver`; un nombre irresoluble degrada a `None` (sin
/// restricción), nunca a error.
pub struct DefaultWorkflowFactory;

impl DefaultWorkflowFactory {
    /// Construye la definición completa (estados, transiciones y roles).
    /// No persiste: el caller decide si la instala como default.
    pub fn build(name: &str, content_types: Vec<String>, resolver: &dyn RoleResolver) -> WorkflowDefinition {
        let mut def = WorkflowDefinition::new(name, content_types);
        def.initial_state_key = "draft".to_string();

        def.states = vec![WorkflowState::new(def.id, "draft", "Borrador", 1).initial().with_icon("pencil"),
                          WorkflowState::new(def.id, "in_review", "En revisión", 2).with_color("#ffc107")
                                                                                   .with_icon("eye"),
                          WorkflowState::new(def.id, "approved", "Aprobado", 3).with_color("#28a745")
                                                                              .with_icon("check"),
                          WorkflowState::new(def.id, "rejected", "Rechazado", 4).with_color("#dc3545")
                                                                               .with_icon("x"),
                          WorkflowState::new(def.id, "published", "Publicado", 5).final_state()
                                                                                .published()
                                                                                .with_color("#007bff")
                                                                                .with_icon("globe")];

        // Gating resuelto contra el proveedor de identidad: si el nombre no
        // existe allí, la transición queda sin restricción.
        let editor = Self::resolve(resolver, "Editor");
        let approver = Self::resolve(resolver, "Approver");

        def.transitions =
            vec![WorkflowTransition::new(def.id, "draft", "in_review", "submit_for_review", 1)
                     .notifying(Some("content_submitted")),
                 WorkflowTransition::new(def.id, "in_review", "approved", "approve", 2)
                     .requiring_role(editor.as_deref()),
                 WorkflowTransition::new(def.id, "in_review", "rejected", "reject", 3)
                     .requiring_role(editor.as_deref())
                     .requiring_comment()
                     .notifying(Some("content_rejected")),
                 WorkflowTransition::new(def.id, "approved", "published", "publish", 4)
                     .requiring_role(approver.as_deref())
                     .notifying(Some("content_published")),
                 WorkflowTransition::new(def.id, "rejected", "draft", "back_to_draft", 5),
                 WorkflowTransition::new(def.id, "published", "draft", "unpublish", 6)
                     .requiring_role(approver.as_deref())];

        // Sembrar la jerarquía de cuatro niveles; sólo los roles que el
        // proveedor de identidad conoce.
        let mut sort = 1;
        for (role_name, priority, c, e, d, v) in DEFAULT_ROLE_TIERS.iter() {
            if resolver.resolve_role_id(role_name).is_none() {
                continue;
            }
            let mut role = WorkflowRole::new(def.id, role_name, role_name, *priority, sort);
            role.can_create = *c;
            role.can_edit = *e;
            role.can_delete = *d;
            role.can_view_all = *v;
            def.roles.push(role);
            sort += 1;
        }

        def.adopt_children();
        def
    }

    /// Devuelve el role-key sólo si el proveedor de identidad lo conoce.
    fn resolve(resolver: &dyn RoleResolver, role_name: &str) -> Option<String> {
        resolver.resolve_role_id(role_name).map(|_| role_name.to_string())
    }
}
