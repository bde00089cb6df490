// Ejemplo autocontenido: instala el workflow editorial default sobre un
// repositorio en memoria y acompaña un artículo de borrador a publicado.
use std::sync::Arc;
use uuid::Uuid;
use workflow_domain::{ContentStateRepository, ContentWorkflowState, InMemoryWorkflowRepository};
use workflow_engine::{NotificationDispatcher, RecordingDispatcher, StaticRoleResolver,
                      TransitionExecutor, WorkflowService};

fn main() {
    let repo = Arc::new(InMemoryWorkflowRepository::new());
    let service = WorkflowService::new(Arc::clone(&repo));

    // Instalar el pipeline canónico de 5 estados como default para "post"
    let resolver = StaticRoleResolver::with_editorial_tiers();
    let (def, warnings) = service.install_default_workflow("Blog", vec!["post".into()], &resolver)
                                 .expect("install");
    println!("Workflow '{}' instalado: {} estados, {} transiciones (avisos: {})",
             def.name,
             def.states.len(),
             def.transitions.len(),
             warnings.len());

    // Sembrar un artículo en borrador
    let content_id = Uuid::new_v4();
    let writer = Uuid::new_v4();
    repo.put_content_state(&ContentWorkflowState::new(content_id, "post", "draft", writer))
        .expect("seed");

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let executor = TransitionExecutor::new(Arc::clone(&repo),
                                           Arc::clone(&repo),
                                           Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>);

    // draft -> in_review -> approved -> published, con los roles que cada
    // paso exige
    let steps: [(&str, &[&str]); 3] =
        [("submit_for_review", &[]), ("approve", &["Editor"]), ("publish", &["Approver"])];
    for (name, roles) in steps {
        let transition = def.transitions.iter().find(|t| t.name == name).expect("transición");
        let role_keys: Vec<String> = roles.iter().map(|s| s.to_string()).collect();
        let new_state = executor.execute(&content_id, &transition.id, &Uuid::new_v4(), &role_keys, None)
                                .expect(name);
        println!("{} -> {}", name, new_state);
    }

    for (template, _context) in dispatcher.sent() {
        println!("notificación despachada: {}", template);
    }
}
