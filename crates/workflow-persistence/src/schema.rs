// Esquema Diesel del motor editorial (SQLite en tests, Postgres con `pg`).
// Tablas: workflow_definitions, workflow_states, workflow_transitions,
// workflow_roles, workflow_role_permissions, content_workflow_states
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    workflow_definitions (id) {
        id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        content_types -> Text,
        is_default -> Bool,
        is_active -> Bool,
        initial_state_key -> Text,
        created_at_ts -> BigInt,
        updated_at_ts -> BigInt,
    }
}
diesel::table! {
    workflow_states (id) {
        id -> Text,
        definition_id -> Text,
        key -> Text,
        name -> Text,
        description -> Nullable<Text>,
        color -> Text,
        icon -> Text,
        sort_order -> Integer,
        is_published -> Bool,
        is_initial -> Bool,
        is_final -> Bool,
    }
}
diesel::table! {
    workflow_transitions (id) {
        id -> Text,
        definition_id -> Text,
        from_state_key -> Text,
        to_state_key -> Text,
        name -> Text,
        description -> Nullable<Text>,
        required_role -> Nullable<Text>,
        css_class -> Nullable<Text>,
        icon -> Nullable<Text>,
        sort_order -> Integer,
        requires_comment -> Bool,
        send_notification -> Bool,
        notification_template -> Nullable<Text>,
    }
}
diesel::table! {
    workflow_roles (id) {
        id -> Text,
        definition_id -> Text,
        role_key -> Text,
        name -> Text,
        description -> Nullable<Text>,
        priority -> Integer,
        can_create -> Bool,
        can_edit -> Bool,
        can_delete -> Bool,
        can_view_all -> Bool,
        allowed_from_states -> Text,
        allowed_to_states -> Text,
        sort_order -> Integer,
    }
}
diesel::table! {
    workflow_role_permissions (id) {
        id -> Text,
        role_id -> Text,
        transition_id -> Text,
        can_execute -> Bool,
        requires_approval -> Bool,
        conditions -> Nullable<Text>,
    }
}
diesel::table! {
    content_workflow_states (content_id) {
        content_id -> Text,
        content_type -> Text,
        state_key -> Text,
        owner_id -> Text,
        last_reviewer_id -> Nullable<Text>,
        last_reviewed_at_ts -> Nullable<BigInt>,
        last_comment -> Nullable<Text>,
    }
}
allow_tables_to_appear_in_same_query!(workflow_definitions,
                                      workflow_states,
                                      workflow_transitions,
                                      workflow_roles,
                                      workflow_role_permissions,
                                      content_workflow_states);
