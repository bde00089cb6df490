use uuid::Uuid;
use workflow_domain::{TransitionGrant, WorkflowDefinition, WorkflowRole, WorkflowState, WorkflowTransition};
use workflow_engine::PermissionEvaluator;

fn keys(names: &[&str]) -> Vec<String> {
  names.iter().map(|s| s.to_string()).collect()
}

/// Definition with the editorial role ladder and one gated transition.
fn review_definition() -> WorkflowDefinition {
  let mut def = WorkflowDefinition::new("Revisión", vec!["post".to_string()]);
  def.initial_state_key = "draft".to_string();
  def.states = vec![WorkflowState::new(def.id, "draft", "Borrador", 1).initial(),
                    WorkflowState::new(def.id, "in_review", "En revisión", 2),
                    WorkflowState::new(def.id, "approved", "Aprobado", 3)];
  def.transitions = vec![WorkflowTransition::new(def.id, "draft", "in_review", "submit", 1),
                         WorkflowTransition::new(def.id, "in_review", "approved", "approve", 2)
                             .requiring_role(Some("Editor"))];
  let mut writer = WorkflowRole::new(def.id, "Writer", "Writer", 25, 1);
  writer.can_create = true;
  let editor = WorkflowRole::new(def.id, "Editor", "Editor", 50, 2);
  let approver = WorkflowRole::new(def.id, "Approver", "Approver", 75, 3).viewing_all();
  let admin = WorkflowRole::new(def.id, "SysAdmin", "SysAdmin", 100, 4);
  def.roles = vec![writer, editor, approver, admin];
  def.adopt_children();
  def
}

#[test]
fn unrestricted_transition_is_legal_for_anyone() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let submit = &def.transitions[0];
  assert!(evaluator.can_execute(submit, &keys(&[])));
  assert!(evaluator.can_execute(submit, &keys(&["Nadie"])));
}

#[test]
fn required_role_gates_execution_on_the_raw_key_set() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let approve = &def.transitions[1];
  assert!(!evaluator.can_execute(approve, &keys(&[])));
  assert!(!evaluator.can_execute(approve, &keys(&["Writer"])));
  assert!(evaluator.can_execute(approve, &keys(&["Editor"])));
}

#[test]
fn priority_inheritance_never_grants_execution() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let approve = &def.transitions[1];
  // SysAdmin outranks Editor in priority; execution still requires the
  // explicit key or an explicit grant.
  assert!(!evaluator.can_execute(approve, &keys(&["SysAdmin"])));
}

#[test]
fn grants_are_authoritative_over_the_legacy_field() {
  let mut def = review_definition();
  let writer_id = def.role_by_key("Writer").unwrap().id;
  let approve_id = def.transitions[1].id;
  // Explicit delegation to Writer on a transition whose legacy field
  // says Editor.
  def.grants.push(TransitionGrant::executing(writer_id, approve_id));

  let evaluator = PermissionEvaluator::new(&def);
  let approve = &def.transitions[1];
  assert!(evaluator.can_execute(approve, &keys(&["Writer"])));
  // With grants present they are the whole grant list: the legacy
  // required_role no longer admits Editor on its own.
  assert!(!evaluator.can_execute(approve, &keys(&["Editor"])));
}

#[test]
fn grant_without_can_execute_does_not_authorize() {
  let mut def = review_definition();
  let writer_id = def.role_by_key("Writer").unwrap().id;
  let approve_id = def.transitions[1].id;
  let mut grant = TransitionGrant::executing(writer_id, approve_id);
  grant.can_execute = false;
  grant.requires_approval = true;
  def.grants.push(grant);

  let evaluator = PermissionEvaluator::new(&def);
  assert!(!evaluator.can_execute(&def.transitions[1], &keys(&["Writer"])));
}

#[test]
fn role_state_filters_constrain_the_granting_role() {
  let mut def = review_definition();
  let editor_id = def.role_by_key("Editor").unwrap().id;
  let approve_id = def.transitions[1].id;
  def.grants.push(TransitionGrant::executing(editor_id, approve_id));
  // Editor is only allowed to act out of "draft"; the approve transition
  // leaves from "in_review", so the grant is inert.
  if let Some(role) = def.roles.iter_mut().find(|r| r.role_key == "Editor") {
    role.allowed_from_states = vec!["draft".to_string()];
  }

  let evaluator = PermissionEvaluator::new(&def);
  assert!(!evaluator.can_execute(&def.transitions[1], &keys(&["Editor"])));
}

#[test]
fn effective_roles_include_lower_priority_tiers() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let effective = evaluator.effective_roles(&keys(&["Approver"]));
  let names: Vec<&str> = effective.iter().map(|r| r.role_key.as_str()).collect();
  // Approver (75) pulls in Editor (50) and Writer (25) but not SysAdmin.
  assert_eq!(names, vec!["Approver", "Editor", "Writer"]);
}

#[test]
fn effective_roles_empty_for_unknown_keys() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  assert!(evaluator.effective_roles(&keys(&["Fantasma"])).is_empty());
  assert!(evaluator.effective_roles(&keys(&[])).is_empty());
}

#[test]
fn owner_always_views_their_content() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let owner = Uuid::new_v4();
  assert!(evaluator.can_view(&owner, &owner, &keys(&[])));
}

#[test]
fn view_all_flows_through_priority_inheritance() {
  let def = review_definition();
  let evaluator = PermissionEvaluator::new(&def);
  let owner = Uuid::new_v4();
  let actor = Uuid::new_v4();
  // SysAdmin itself has can_view_all = false here, but it inherits the
  // Approver tier (75 <= 100), which does.
  assert!(evaluator.can_view(&owner, &actor, &keys(&["SysAdmin"])));
  // Editor (50) inherits only Writer; neither can view all.
  assert!(!evaluator.can_view(&owner, &actor, &keys(&["Editor"])));
}
