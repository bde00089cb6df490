use std::sync::Arc;
use uuid::Uuid;
use workflow_domain::{ContentStateRepository, ContentWorkflowState, InMemoryWorkflowRepository,
                      WorkflowError};
use workflow_engine::{FailingDispatcher, NotificationDispatcher, RecordingDispatcher,
                      StaticRoleResolver, TransitionExecutor, WorkflowService};

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

struct Harness {
    repo: Arc<InMemoryWorkflowRepository>,
    dispatcher: Arc<RecordingDispatcher>,
    executor: TransitionExecutor<InMemoryWorkflowRepository, InMemoryWorkflowRepository>,
    service: WorkflowService<InMemoryWorkflowRepository>,
}

/// Instala el workflow editorial canónico sobre un repositorio en memoria
/// y deja un ítem de tipo "post" sembrado en `state_key`.
fn harness(content_id: Uuid, owner_id: Uuid, state_key: &str) -> Harness {
    let repo = Arc::new(InMemoryWorkflowRepository::new());
    let service = WorkflowService::new(Arc::clone(&repo));
    let resolver = StaticRoleResolver::with_editorial_tiers();
    service.install_default_workflow("Blog", vec!["post".to_string()], &resolver)
           .expect("install");

    repo.put_content_state(&ContentWorkflowState::new(content_id, "post", state_key, owner_id))
        .expect("seed");

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let executor =
        TransitionExecutor::new(Arc::clone(&repo),
                                Arc::clone(&repo),
                                Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>);
    Harness { repo, dispatcher, executor, service }
}

fn transition_id(h: &Harness, name: &str) -> Uuid {
    let def = h.service.find_default_for("post").expect("query").expect("default");
    def.transitions
       .iter()
       .find(|t| t.name == name)
       .unwrap_or_else(|| panic!("sin transición '{}'", name))
       .id
}

#[test]
fn approve_moves_the_item_and_records_the_audit_trail() {
    let content_id = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let h = harness(content_id, owner, "in_review");

    let approve = transition_id(&h, "approve");
    let new_state = h.executor
                     .execute(&content_id, &approve, &editor, &keys(&["Editor"]), Some("se ve bien"))
                     .expect("approve");
    assert_eq!(new_state, "approved");

    let item = h.repo.get_content_state(&content_id).expect("get").expect("item");
    assert_eq!(item.state_key, "approved");
    assert_eq!(item.last_reviewer_id, Some(editor));
    assert!(item.last_reviewed_at.is_some());
    assert_eq!(item.last_comment.as_deref(), Some("se ve bien"));
}

#[test]
fn reject_without_comment_is_refused_and_state_is_untouched() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "in_review");

    let reject = transition_id(&h, "reject");
    for comment in [None, Some(""), Some("   ")] {
        match h.executor.execute(&content_id, &reject, &Uuid::new_v4(), &keys(&["Editor"]), comment) {
            Err(WorkflowError::CommentRequired(name)) => assert_eq!(name, "reject"),
            other => panic!("esperaba CommentRequired, llegó: {:?}", other),
        }
    }
    let item = h.repo.get_content_state(&content_id).expect("get").expect("item");
    assert_eq!(item.state_key, "in_review");
    assert!(item.last_comment.is_none());
}

#[test]
fn actor_without_the_gating_role_is_denied() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "in_review");

    let approve = transition_id(&h, "approve");
    // Ni Writer ni el heredado por prioridad (SysAdmin no ejecuta approve
    // sólo por estar por encima de Editor en la jerarquía de visibilidad).
    for roles in [keys(&[]), keys(&["Writer"])] {
        match h.executor.execute(&content_id, &approve, &Uuid::new_v4(), &roles, None) {
            Err(WorkflowError::PermissionDenied(_)) => {}
            other => panic!("esperaba PermissionDenied, llegó: {:?}", other),
        }
    }
}

#[test]
fn stale_transition_from_a_previous_state_yields_conflict() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "approved");

    // La lista que el cliente calculó cuando el ítem estaba en revisión ya
    // no aplica: approve parte de in_review, el ítem está en approved.
    let approve = transition_id(&h, "approve");
    match h.executor.execute(&content_id, &approve, &Uuid::new_v4(), &keys(&["Editor"]), None) {
        Err(WorkflowError::Conflict(_)) => {}
        other => panic!("esperaba Conflict, llegó: {:?}", other),
    }
    let item = h.repo.get_content_state(&content_id).expect("get").expect("item");
    assert_eq!(item.state_key, "approved");
}

#[test]
fn of_two_racing_transitions_only_the_first_commit_wins() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "in_review");

    let approve = transition_id(&h, "approve");
    let reject = transition_id(&h, "reject");
    let editor = keys(&["Editor"]);

    h.executor.execute(&content_id, &approve, &Uuid::new_v4(), &editor, None).expect("winner");
    match h.executor.execute(&content_id, &reject, &Uuid::new_v4(), &editor, Some("demasiado tarde")) {
        Err(WorkflowError::Conflict(_)) => {}
        other => panic!("esperaba Conflict para el perdedor, llegó: {:?}", other),
    }
    let item = h.repo.get_content_state(&content_id).expect("get").expect("item");
    assert_eq!(item.state_key, "approved");
}

#[test]
fn notifying_transitions_dispatch_with_the_template_and_context() {
    let content_id = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "draft");

    let submit = transition_id(&h, "submit_for_review");
    h.executor.execute(&content_id, &submit, &actor, &keys(&[]), None).expect("submit");

    let sent = h.dispatcher.sent();
    assert_eq!(sent.len(), 1);
    let (template, context) = &sent[0];
    assert_eq!(template, "content_submitted");
    assert_eq!(context["content_id"], serde_json::json!(content_id));
    assert_eq!(context["from_state"], "draft");
    assert_eq!(context["to_state"], "in_review");
}

#[test]
fn silent_transitions_do_not_dispatch() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "in_review");

    let approve = transition_id(&h, "approve");
    h.executor.execute(&content_id, &approve, &Uuid::new_v4(), &keys(&["Editor"]), None).expect("approve");
    assert!(h.dispatcher.sent().is_empty());
}

#[test]
fn a_broken_dispatcher_never_reverts_a_committed_transition() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "draft");

    let executor = TransitionExecutor::new(Arc::clone(&h.repo),
                                           Arc::clone(&h.repo),
                                           Arc::new(FailingDispatcher));
    let submit = transition_id(&h, "submit_for_review");
    let new_state = executor.execute(&content_id, &submit, &Uuid::new_v4(), &keys(&[]), None)
                            .expect("el commit sobrevive al fallo de notificación");
    assert_eq!(new_state, "in_review");
    let item = h.repo.get_content_state(&content_id).expect("get").expect("item");
    assert_eq!(item.state_key, "in_review");
}

#[test]
fn executing_against_missing_content_or_transition_is_not_found() {
    let content_id = Uuid::new_v4();
    let h = harness(content_id, Uuid::new_v4(), "draft");

    let submit = transition_id(&h, "submit_for_review");
    match h.executor.execute(&Uuid::new_v4(), &submit, &Uuid::new_v4(), &keys(&[]), None) {
        Err(WorkflowError::NotFound(_)) => {}
        other => panic!("esperaba NotFound para ítem inexistente, llegó: {:?}", other),
    }
    match h.executor.execute(&content_id, &Uuid::new_v4(), &Uuid::new_v4(), &keys(&[]), None) {
        Err(WorkflowError::NotFound(_)) => {}
        other => panic!("esperaba NotFound para transición inexistente, llegó: {:?}", other),
    }
}
