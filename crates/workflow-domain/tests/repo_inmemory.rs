use uuid::Uuid;
use workflow_domain::{CasResult, ContentStateRepository, ContentWorkflowState, InMemoryWorkflowRepository,
                      WorkflowDefinition, WorkflowError, WorkflowRepository, WorkflowState, WorkflowTransition};

fn sample_definition(name: &str, content_type: &str) -> WorkflowDefinition {
  let mut def = WorkflowDefinition::new(name, vec![content_type.to_string()]);
  def.initial_state_key = "draft".to_string();
  def.states = vec![WorkflowState::new(def.id, "draft", "Borrador", 1).initial(),
                    WorkflowState::new(def.id, "done", "Terminado", 2).final_state()];
  def.transitions = vec![WorkflowTransition::new(def.id, "draft", "done", "finish", 1)];
  def.adopt_children();
  def
}

#[test]
fn save_and_get_round_trips_the_definition() {
  let repo = InMemoryWorkflowRepository::new();
  let def = sample_definition("Round trip", "post");
  let id = repo.save_definition(&def).expect("save");
  let loaded = repo.get_definition(&id).expect("get").expect("definition should exist");
  assert_eq!(loaded, def);
}

#[test]
fn find_default_filters_active_and_default_and_tag() {
  let repo = InMemoryWorkflowRepository::new();

  let mut inactive = sample_definition("Inactiva", "post");
  inactive.is_default = true;
  inactive.is_active = false;
  repo.save_definition(&inactive).expect("save inactive");

  let mut other_type = sample_definition("Otro tipo", "page");
  other_type.is_default = true;
  repo.save_definition(&other_type).expect("save other type");

  assert!(repo.find_default_for("post").expect("query").is_none());

  let mut good = sample_definition("Default activa", "post");
  good.is_default = true;
  repo.save_definition(&good).expect("save good");
  let found = repo.find_default_for("post").expect("query").expect("default should exist");
  assert_eq!(found.id, good.id);
}

#[test]
fn saving_a_new_default_demotes_the_previous_one() {
  let repo = InMemoryWorkflowRepository::new();
  let mut first = sample_definition("Primera", "post");
  first.is_default = true;
  repo.save_definition(&first).expect("save first");

  let mut second = sample_definition("Segunda", "post");
  second.is_default = true;
  repo.save_definition(&second).expect("save second");

  // Invariant: at most one active default per content type.
  let found = repo.find_default_for("post").expect("query").expect("default");
  assert_eq!(found.id, second.id);
  let first_again = repo.get_definition(&first.id).expect("get").expect("first still stored");
  assert!(!first_again.is_default, "previous default should have been demoted");
}

#[test]
fn demotion_ignores_defaults_of_disjoint_content_types() {
  let repo = InMemoryWorkflowRepository::new();
  let mut posts = sample_definition("Posts", "post");
  posts.is_default = true;
  repo.save_definition(&posts).expect("save posts");

  let mut pages = sample_definition("Pages", "page");
  pages.is_default = true;
  repo.save_definition(&pages).expect("save pages");

  assert!(repo.get_definition(&posts.id).unwrap().unwrap().is_default);
  assert!(repo.get_definition(&pages.id).unwrap().unwrap().is_default);
}

#[test]
fn delete_cascades_and_reports_not_found_afterwards() {
  let repo = InMemoryWorkflowRepository::new();
  let def = sample_definition("Efímera", "post");
  repo.save_definition(&def).expect("save");
  repo.delete_definition(&def.id).expect("delete");
  assert!(repo.get_definition(&def.id).expect("get").is_none());
  match repo.delete_definition(&def.id) {
    Err(WorkflowError::NotFound(_)) => {}
    other => panic!("expected NotFound, got: {:?}", other.err()),
  }
}

#[test]
fn find_by_content_type_returns_every_governing_definition() {
  let repo = InMemoryWorkflowRepository::new();
  let a = sample_definition("A", "post");
  let mut b = sample_definition("B", "post");
  b.content_types.push("page".to_string());
  let c = sample_definition("C", "page");
  for d in [&a, &b, &c] {
    repo.save_definition(d).expect("save");
  }
  let posts = repo.find_by_content_type("post").expect("query");
  let mut ids: Vec<Uuid> = posts.iter().map(|d| d.id).collect();
  ids.sort();
  let mut expected = vec![a.id, b.id];
  expected.sort();
  assert_eq!(ids, expected);
}

#[test]
fn content_state_round_trip_and_audit_fields() {
  let repo = InMemoryWorkflowRepository::new();
  let content_id = Uuid::new_v4();
  let owner = Uuid::new_v4();
  let reviewer = Uuid::new_v4();
  let item = ContentWorkflowState::new(content_id, "post", "draft", owner);
  repo.put_content_state(&item).expect("put");

  let res = repo.apply_transition(&content_id, "draft", "in_review", &reviewer, Some("lgtm"))
                .expect("apply");
  assert_eq!(res, CasResult::Applied { new_state_key: "in_review".to_string() });

  let after = repo.get_content_state(&content_id).expect("get").expect("exists");
  assert_eq!(after.state_key, "in_review");
  assert_eq!(after.last_reviewer_id, Some(reviewer));
  assert_eq!(after.last_comment.as_deref(), Some("lgtm"));
  assert!(after.last_reviewed_at.is_some());
}

#[test]
fn stale_expected_state_yields_conflict_not_a_second_apply() {
  let repo = InMemoryWorkflowRepository::new();
  let content_id = Uuid::new_v4();
  let reviewer = Uuid::new_v4();
  repo.put_content_state(&ContentWorkflowState::new(content_id, "post", "approved", Uuid::new_v4()))
      .expect("put");

  // Two racers both read "approved"; the slower one must lose.
  let first = repo.apply_transition(&content_id, "approved", "published", &reviewer, None).expect("first");
  assert_eq!(first, CasResult::Applied { new_state_key: "published".to_string() });
  let second = repo.apply_transition(&content_id, "approved", "in_review", &reviewer, None).expect("second");
  assert_eq!(second, CasResult::Conflict);

  let after = repo.get_content_state(&content_id).expect("get").expect("exists");
  assert_eq!(after.state_key, "published");
}

#[test]
fn apply_transition_on_missing_content_is_not_found() {
  let repo = InMemoryWorkflowRepository::new();
  match repo.apply_transition(&Uuid::new_v4(), "draft", "done", &Uuid::new_v4(), None) {
    Err(WorkflowError::NotFound(_)) => {}
    other => panic!("expected NotFound, got: {:?}", other),
  }
}
