use crate::schema;
use crate::schema::content_workflow_states::dsl as content_dsl;
use crate::schema::workflow_definitions::dsl as defs_dsl;
use crate::schema::workflow_role_permissions::dsl as grants_dsl;
use crate::schema::workflow_roles::dsl as roles_dsl;
use crate::schema::workflow_states::dsl as states_dsl;
use crate::schema::workflow_transitions::dsl as trans_dsl;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use workflow_domain::{CasResult, ContentStateRepository, ContentWorkflowState, TransitionGrant, WorkflowDefinition,
                      WorkflowError, WorkflowRepository, WorkflowRole, WorkflowState, WorkflowTransition};
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
#[cfg(all(feature = "pg", not(test)))]
type DbPool = Pool<ConnectionManager<PgConnection>>;
#[cfg(any(test, not(feature = "pg")))]
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
#[cfg(all(feature = "pg", not(test)))]
type DbConn = PgConnection;
#[cfg(any(test, not(feature = "pg")))]
type DbConn = SqliteConnection;

/// Repo Diesel que implementa `WorkflowRepository` y
/// `ContentStateRepository`.
pub struct DieselWorkflowRepository {
  pool: Arc<DbPool>,
}

impl DieselWorkflowRepository {
  pub fn new(database_url: &str) -> Self {
    #[cfg(any(test, not(feature = "pg")))]
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    #[cfg(all(feature = "pg", not(test)))]
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().max_size(4).build(manager).expect("no se pudo crear el pool de conexiones");
    let repo = DieselWorkflowRepository { pool: Arc::new(pool) };
    if let Ok(mut c) = repo.conn_raw() {
      let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA foreign_keys = ON;").execute(&mut c);
      let _ = c.run_pending_migrations(MIGRATIONS);
    }
    repo
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<DbConn>>, r2d2::Error> {
    // Note: when built with pg feature this will be adjusted by cfg above
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>, WorkflowError> {
    self.conn_raw().map_err(|e| WorkflowError::Storage(format!("pool: {}", e)))
  }
}

// Diesel row structs for the workflow tables
#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::workflow_definitions)]
#[diesel(treat_none_as_null = true)]
struct DefinitionRow {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub content_types: String,
  pub is_default: bool,
  pub is_active: bool,
  pub initial_state_key: String,
  pub created_at_ts: i64,
  pub updated_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::workflow_states)]
#[diesel(treat_none_as_null = true)]
struct StateRow {
  pub id: String,
  pub definition_id: String,
  pub key: String,
  pub name: String,
  pub description: Option<String>,
  pub color: String,
  pub icon: String,
  pub sort_order: i32,
  pub is_published: bool,
  pub is_initial: bool,
  pub is_final: bool,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::workflow_transitions)]
#[diesel(treat_none_as_null = true)]
struct TransitionRow {
  pub id: String,
  pub definition_id: String,
  pub from_state_key: String,
  pub to_state_key: String,
  pub name: String,
  pub description: Option<String>,
  pub required_role: Option<String>,
  pub css_class: Option<String>,
  pub icon: Option<String>,
  pub sort_order: i32,
  pub requires_comment: bool,
  pub send_notification: bool,
  pub notification_template: Option<String>,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::workflow_roles)]
#[diesel(treat_none_as_null = true)]
struct RoleRow {
  pub id: String,
  pub definition_id: String,
  pub role_key: String,
  pub name: String,
  pub description: Option<String>,
  pub priority: i32,
  pub can_create: bool,
  pub can_edit: bool,
  pub can_delete: bool,
  pub can_view_all: bool,
  pub allowed_from_states: String,
  pub allowed_to_states: String,
  pub sort_order: i32,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::workflow_role_permissions)]
#[diesel(treat_none_as_null = true)]
struct GrantRow {
  pub id: String,
  pub role_id: String,
  pub transition_id: String,
  pub can_execute: bool,
  pub requires_approval: bool,
  pub conditions: Option<String>,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::content_workflow_states)]
struct ContentRow {
  pub content_id: String,
  pub content_type: String,
  pub state_key: String,
  pub owner_id: String,
  pub last_reviewer_id: Option<String>,
  pub last_reviewed_at_ts: Option<i64>,
  pub last_comment: Option<String>,
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, WorkflowError> {
  res.map_err(|e| WorkflowError::Storage(format!("db: {}", e)))
}

fn parse_uuid(s: &str) -> Result<Uuid, WorkflowError> {
  Uuid::parse_str(s).map_err(|e| WorkflowError::Storage(format!("uuid inválido '{}': {}", s, e)))
}

fn from_epoch(ts: i64) -> DateTime<Utc> {
  DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

// Las listas (tipos de contenido, estados permitidos) se almacenan como
// TEXT separado por comas; lista vacía = cadena vacía.
fn join_list(items: &[String]) -> String {
  items.join(",")
}

fn split_list(s: &str) -> Vec<String> {
  s.split(',').filter(|p| !p.trim().is_empty()).map(|p| p.trim().to_string()).collect()
}

fn definition_row(def: &WorkflowDefinition) -> DefinitionRow {
  DefinitionRow { id: def.id.to_string(),
                  name: def.name.clone(),
                  description: def.description.clone(),
                  content_types: join_list(&def.content_types),
                  is_default: def.is_default,
                  is_active: def.is_active,
                  initial_state_key: def.initial_state_key.clone(),
                  created_at_ts: def.created_at.timestamp(),
                  updated_at_ts: def.updated_at.timestamp() }
}

fn state_row(s: &WorkflowState) -> StateRow {
  StateRow { id: s.id.to_string(),
             definition_id: s.definition_id.to_string(),
             key: s.key.clone(),
             name: s.name.clone(),
             description: s.description.clone(),
             color: s.color.clone(),
             icon: s.icon.clone(),
             sort_order: s.sort_order,
             is_published: s.is_published,
             is_initial: s.is_initial,
             is_final: s.is_final }
}

fn transition_row(t: &WorkflowTransition) -> TransitionRow {
  TransitionRow { id: t.id.to_string(),
                  definition_id: t.definition_id.to_string(),
                  from_state_key: t.from_state_key.clone(),
                  to_state_key: t.to_state_key.clone(),
                  name: t.name.clone(),
                  description: t.description.clone(),
                  required_role: t.required_role.clone(),
                  css_class: t.css_class.clone(),
                  icon: t.icon.clone(),
                  sort_order: t.sort_order,
                  requires_comment: t.requires_comment,
                  send_notification: t.send_notification,
                  notification_template: t.notification_template.clone() }
}

fn role_row(r: &WorkflowRole) -> RoleRow {
  RoleRow { id: r.id.to_string(),
            definition_id: r.definition_id.to_string(),
            role_key: r.role_key.clone(),
            name: r.name.clone(),
            description: r.description.clone(),
            priority: r.priority,
            can_create: r.can_create,
            can_edit: r.can_edit,
            can_delete: r.can_delete,
            can_view_all: r.can_view_all,
            allowed_from_states: join_list(&r.allowed_from_states),
            allowed_to_states: join_list(&r.allowed_to_states),
            sort_order: r.sort_order }
}

fn grant_row(g: &TransitionGrant) -> GrantRow {
  GrantRow { id: g.id.to_string(),
             role_id: g.role_id.to_string(),
             transition_id: g.transition_id.to_string(),
             can_execute: g.can_execute,
             requires_approval: g.requires_approval,
             conditions: g.conditions.clone() }
}

fn state_from_row(r: StateRow) -> Result<WorkflowState, WorkflowError> {
  Ok(WorkflowState { id: parse_uuid(&r.id)?,
                     definition_id: parse_uuid(&r.definition_id)?,
                     key: r.key,
                     name: r.name,
                     description: r.description,
                     color: r.color,
                     icon: r.icon,
                     sort_order: r.sort_order,
                     is_published: r.is_published,
                     is_initial: r.is_initial,
                     is_final: r.is_final })
}

fn transition_from_row(r: TransitionRow) -> Result<WorkflowTransition, WorkflowError> {
  Ok(WorkflowTransition { id: parse_uuid(&r.id)?,
                          definition_id: parse_uuid(&r.definition_id)?,
                          from_state_key: r.from_state_key,
                          to_state_key: r.to_state_key,
                          name: r.name,
                          description: r.description,
                          required_role: r.required_role,
                          css_class: r.css_class,
                          icon: r.icon,
                          sort_order: r.sort_order,
                          requires_comment: r.requires_comment,
                          send_notification: r.send_notification,
                          notification_template: r.notification_template })
}

fn role_from_row(r: RoleRow) -> Result<WorkflowRole, WorkflowError> {
  Ok(WorkflowRole { id: parse_uuid(&r.id)?,
                    definition_id: parse_uuid(&r.definition_id)?,
                    role_key: r.role_key,
                    name: r.name,
                    description: r.description,
                    priority: r.priority,
                    can_create: r.can_create,
                    can_edit: r.can_edit,
                    can_delete: r.can_delete,
                    can_view_all: r.can_view_all,
                    allowed_from_states: split_list(&r.allowed_from_states),
                    allowed_to_states: split_list(&r.allowed_to_states),
                    sort_order: r.sort_order })
}

fn grant_from_row(r: GrantRow) -> Result<TransitionGrant, WorkflowError> {
  Ok(TransitionGrant { id: parse_uuid(&r.id)?,
                       role_id: parse_uuid(&r.role_id)?,
                       transition_id: parse_uuid(&r.transition_id)?,
                       can_execute: r.can_execute,
                       requires_approval: r.requires_approval,
                       conditions: r.conditions })
}

fn content_from_row(r: ContentRow) -> Result<ContentWorkflowState, WorkflowError> {
  let last_reviewer_id = match r.last_reviewer_id {
    Some(s) => Some(parse_uuid(&s)?),
    None => None,
  };
  Ok(ContentWorkflowState { content_id: parse_uuid(&r.content_id)?,
                            content_type: r.content_type,
                            state_key: r.state_key,
                            owner_id: parse_uuid(&r.owner_id)?,
                            last_reviewer_id,
                            last_reviewed_at: r.last_reviewed_at_ts.map(from_epoch),
                            last_comment: r.last_comment })
}

impl DieselWorkflowRepository {
  /// Carga una definición con hijos desde una conexión ya adquirida.
  fn load_definition(&self, conn: &mut DbConn, row: DefinitionRow) -> Result<WorkflowDefinition, WorkflowError> {
    let def_id = row.id.clone();
    let state_rows = map_db_err(states_dsl::workflow_states.filter(states_dsl::definition_id.eq(&def_id))
                                                           .order(states_dsl::sort_order.asc())
                                                           .load::<StateRow>(conn))?;
    let transition_rows = map_db_err(trans_dsl::workflow_transitions.filter(trans_dsl::definition_id.eq(&def_id))
                                                                    .order(trans_dsl::sort_order.asc())
                                                                    .load::<TransitionRow>(conn))?;
    let role_rows = map_db_err(roles_dsl::workflow_roles.filter(roles_dsl::definition_id.eq(&def_id))
                                                        .order(roles_dsl::sort_order.asc())
                                                        .load::<RoleRow>(conn))?;
    let role_ids: Vec<String> = role_rows.iter().map(|r| r.id.clone()).collect();
    let grant_rows = if role_ids.is_empty() {
      Vec::new()
    } else {
      map_db_err(grants_dsl::workflow_role_permissions.filter(grants_dsl::role_id.eq_any(&role_ids))
                                                      .load::<GrantRow>(conn))?
    };

    let mut states = Vec::with_capacity(state_rows.len());
    for r in state_rows {
      states.push(state_from_row(r)?);
    }
    let mut transitions = Vec::with_capacity(transition_rows.len());
    for r in transition_rows {
      transitions.push(transition_from_row(r)?);
    }
    let mut roles = Vec::with_capacity(role_rows.len());
    for r in role_rows {
      roles.push(role_from_row(r)?);
    }
    let mut grants = Vec::with_capacity(grant_rows.len());
    for r in grant_rows {
      grants.push(grant_from_row(r)?);
    }

    Ok(WorkflowDefinition { id: parse_uuid(&row.id)?,
                            name: row.name,
                            description: row.description,
                            content_types: split_list(&row.content_types),
                            is_default: row.is_default,
                            is_active: row.is_active,
                            initial_state_key: row.initial_state_key,
                            created_at: from_epoch(row.created_at_ts),
                            updated_at: from_epoch(row.updated_at_ts),
                            states,
                            transitions,
                            roles,
                            grants })
  }
}

impl WorkflowRepository for DieselWorkflowRepository {
  /// Upsert transaccional de la definición completa.
  ///
  /// Las colecciones hijas se reconcilian por diff de ids (borrar
  /// removidos, actualizar coincidentes en el lugar, insertar nuevos) en
  /// vez de borrar-y-reinsertar, para no dejar huérfanas las referencias
  /// de contenido en vuelo ni regenerar identificadores sin necesidad. Si
  /// la definición entra como default activa, las demás defaults activas
  /// que compartan tipo de contenido se degradan en la misma transacción.
  fn save_definition(&self, definition: &WorkflowDefinition) -> Result<Uuid, WorkflowError> {
    let mut conn = self.conn()?;
    let def_id = definition.id.to_string();
    let def = definition;
    map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                 let row = definition_row(def);
                 let exists = defs_dsl::workflow_definitions.filter(defs_dsl::id.eq(&def_id))
                                                            .select(defs_dsl::id)
                                                            .first::<String>(conn)
                                                            .optional()?
                                                            .is_some();
                 if exists {
                   diesel::update(defs_dsl::workflow_definitions.filter(defs_dsl::id.eq(&def_id))).set(&row)
                                                                                                  .execute(conn)?;
                 } else {
                   diesel::insert_into(defs_dsl::workflow_definitions).values(&row).execute(conn)?;
                 }

                 // Invariante de default único por tipo de contenido:
                 // degradar las otras defaults activas que compartan tag.
                 if def.is_default && def.is_active {
                   let candidates = defs_dsl::workflow_definitions.filter(defs_dsl::is_default.eq(true))
                                                                  .filter(defs_dsl::is_active.eq(true))
                                                                  .filter(defs_dsl::id.ne(&def_id))
                                                                  .load::<DefinitionRow>(conn)?;
                   for other in candidates {
                     let tags = split_list(&other.content_types);
                     if tags.iter().any(|t| def.content_types.contains(t)) {
                       log::info!("degradando default '{}' ({})", other.name, other.id);
                       diesel::update(defs_dsl::workflow_definitions.filter(defs_dsl::id.eq(&other.id)))
                         .set(defs_dsl::is_default.eq(false))
                         .execute(conn)?;
                     }
                   }
                 }

                 // --- estados ---
                 let existing: Vec<String> = states_dsl::workflow_states.filter(states_dsl::definition_id.eq(&def_id))
                                                                        .select(states_dsl::id)
                                                                        .load::<String>(conn)?;
                 let existing: HashSet<String> = existing.into_iter().collect();
                 let incoming: HashSet<String> = def.states.iter().map(|s| s.id.to_string()).collect();
                 let removed: Vec<&String> = existing.iter().filter(|id| !incoming.contains(*id)).collect();
                 if !removed.is_empty() {
                   diesel::delete(states_dsl::workflow_states.filter(states_dsl::id.eq_any(removed))).execute(conn)?;
                 }
                 for s in &def.states {
                   let row = state_row(s);
                   if existing.contains(&row.id) {
                     diesel::update(states_dsl::workflow_states.filter(states_dsl::id.eq(&row.id))).set(&row)
                                                                                                   .execute(conn)?;
                   } else {
                     diesel::insert_into(states_dsl::workflow_states).values(&row).execute(conn)?;
                   }
                 }

                 // --- transiciones ---
                 let existing: Vec<String> =
                   trans_dsl::workflow_transitions.filter(trans_dsl::definition_id.eq(&def_id))
                                                  .select(trans_dsl::id)
                                                  .load::<String>(conn)?;
                 let existing: HashSet<String> = existing.into_iter().collect();
                 let incoming: HashSet<String> = def.transitions.iter().map(|t| t.id.to_string()).collect();
                 let removed: Vec<&String> = existing.iter().filter(|id| !incoming.contains(*id)).collect();
                 if !removed.is_empty() {
                   diesel::delete(grants_dsl::workflow_role_permissions
                     .filter(grants_dsl::transition_id.eq_any(removed.clone()))).execute(conn)?;
                   diesel::delete(trans_dsl::workflow_transitions.filter(trans_dsl::id.eq_any(removed))).execute(conn)?;
                 }
                 for t in &def.transitions {
                   let row = transition_row(t);
                   if existing.contains(&row.id) {
                     diesel::update(trans_dsl::workflow_transitions.filter(trans_dsl::id.eq(&row.id))).set(&row)
                                                                                                      .execute(conn)?;
                   } else {
                     diesel::insert_into(trans_dsl::workflow_transitions).values(&row).execute(conn)?;
                   }
                 }

                 // --- roles ---
                 let existing: Vec<String> = roles_dsl::workflow_roles.filter(roles_dsl::definition_id.eq(&def_id))
                                                                      .select(roles_dsl::id)
                                                                      .load::<String>(conn)?;
                 let existing: HashSet<String> = existing.into_iter().collect();
                 let incoming: HashSet<String> = def.roles.iter().map(|r| r.id.to_string()).collect();
                 let removed: Vec<&String> = existing.iter().filter(|id| !incoming.contains(*id)).collect();
                 if !removed.is_empty() {
                   diesel::delete(grants_dsl::workflow_role_permissions
                     .filter(grants_dsl::role_id.eq_any(removed.clone()))).execute(conn)?;
                   diesel::delete(roles_dsl::workflow_roles.filter(roles_dsl::id.eq_any(removed))).execute(conn)?;
                 }
                 for r in &def.roles {
                   let row = role_row(r);
                   if existing.contains(&row.id) {
                     diesel::update(roles_dsl::workflow_roles.filter(roles_dsl::id.eq(&row.id))).set(&row)
                                                                                                .execute(conn)?;
                   } else {
                     diesel::insert_into(roles_dsl::workflow_roles).values(&row).execute(conn)?;
                   }
                 }

                 // --- grants (alcance: roles de esta definición) ---
                 let role_ids: Vec<String> = def.roles.iter().map(|r| r.id.to_string()).collect();
                 let existing: Vec<String> = if role_ids.is_empty() {
                   Vec::new()
                 } else {
                   grants_dsl::workflow_role_permissions.filter(grants_dsl::role_id.eq_any(&role_ids))
                                                        .select(grants_dsl::id)
                                                        .load::<String>(conn)?
                 };
                 let existing: HashSet<String> = existing.into_iter().collect();
                 let incoming: HashSet<String> = def.grants.iter().map(|g| g.id.to_string()).collect();
                 let removed: Vec<&String> = existing.iter().filter(|id| !incoming.contains(*id)).collect();
                 if !removed.is_empty() {
                   diesel::delete(grants_dsl::workflow_role_permissions.filter(grants_dsl::id.eq_any(removed)))
                     .execute(conn)?;
                 }
                 for g in &def.grants {
                   let row = grant_row(g);
                   if existing.contains(&row.id) {
                     diesel::update(grants_dsl::workflow_role_permissions.filter(grants_dsl::id.eq(&row.id)))
                       .set(&row)
                       .execute(conn)?;
                   } else {
                     diesel::insert_into(grants_dsl::workflow_role_permissions).values(&row).execute(conn)?;
                   }
                 }

                 Ok(())
               }))?;
    Ok(definition.id)
  }

  fn get_definition(&self, id: &Uuid) -> Result<Option<WorkflowDefinition>, WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let opt = map_db_err(defs_dsl::workflow_definitions.filter(defs_dsl::id.eq(&id_s))
                                                       .first::<DefinitionRow>(&mut conn)
                                                       .optional())?;
    match opt {
      Some(row) => Ok(Some(self.load_definition(&mut conn, row)?)),
      None => Ok(None),
    }
  }

  fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>, WorkflowError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(defs_dsl::workflow_definitions.order(defs_dsl::name.asc())
                                                        .load::<DefinitionRow>(&mut conn))?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      out.push(self.load_definition(&mut conn, row)?);
    }
    Ok(out)
  }

  fn find_by_content_type(&self, content_type: &str) -> Result<Vec<WorkflowDefinition>, WorkflowError> {
    // El matching sobre la lista separada por comas se hace en Rust; un
    // LIKE sería impreciso con tags que son prefijos de otros.
    let mut conn = self.conn()?;
    let rows = map_db_err(defs_dsl::workflow_definitions.load::<DefinitionRow>(&mut conn))?;
    let mut out = Vec::new();
    for row in rows {
      if split_list(&row.content_types).iter().any(|t| t == content_type) {
        out.push(self.load_definition(&mut conn, row)?);
      }
    }
    Ok(out)
  }

  fn find_default_for(&self, content_type: &str) -> Result<Option<WorkflowDefinition>, WorkflowError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(defs_dsl::workflow_definitions.filter(defs_dsl::is_default.eq(true))
                                                        .filter(defs_dsl::is_active.eq(true))
                                                        .load::<DefinitionRow>(&mut conn))?;
    for row in rows {
      if split_list(&row.content_types).iter().any(|t| t == content_type) {
        return Ok(Some(self.load_definition(&mut conn, row)?));
      }
    }
    Ok(None)
  }

  /// Borra la definición y cascadea a estados, transiciones, roles y
  /// grants en una única transacción.
  fn delete_definition(&self, id: &Uuid) -> Result<(), WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let deleted = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                               let role_ids: Vec<String> =
                                 roles_dsl::workflow_roles.filter(roles_dsl::definition_id.eq(&id_s))
                                                          .select(roles_dsl::id)
                                                          .load::<String>(conn)?;
                               if !role_ids.is_empty() {
                                 diesel::delete(grants_dsl::workflow_role_permissions
                                   .filter(grants_dsl::role_id.eq_any(&role_ids))).execute(conn)?;
                               }
                               diesel::delete(roles_dsl::workflow_roles.filter(roles_dsl::definition_id.eq(&id_s)))
                                 .execute(conn)?;
                               diesel::delete(trans_dsl::workflow_transitions
                                 .filter(trans_dsl::definition_id.eq(&id_s))).execute(conn)?;
                               diesel::delete(states_dsl::workflow_states
                                 .filter(states_dsl::definition_id.eq(&id_s))).execute(conn)?;
                               let n = diesel::delete(defs_dsl::workflow_definitions.filter(defs_dsl::id.eq(&id_s)))
                                 .execute(conn)?;
                               Ok(n)
                             }))?;
    if deleted == 0 {
      return Err(WorkflowError::NotFound(format!("definición {}", id)));
    }
    Ok(())
  }
}

impl ContentStateRepository for DieselWorkflowRepository {
  fn get_content_state(&self, content_id: &Uuid) -> Result<Option<ContentWorkflowState>, WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = content_id.to_string();
    let opt = map_db_err(content_dsl::content_workflow_states.filter(content_dsl::content_id.eq(&id_s))
                                                             .first::<ContentRow>(&mut conn)
                                                             .optional())?;
    opt.map(content_from_row).transpose()
  }

  fn put_content_state(&self, state: &ContentWorkflowState) -> Result<(), WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = state.content_id.to_string();
    let row = ContentRow { content_id: id_s.clone(),
                           content_type: state.content_type.clone(),
                           state_key: state.state_key.clone(),
                           owner_id: state.owner_id.to_string(),
                           last_reviewer_id: state.last_reviewer_id.map(|u| u.to_string()),
                           last_reviewed_at_ts: state.last_reviewed_at.map(|d| d.timestamp()),
                           last_comment: state.last_comment.clone() };
    // Upsert por id: borrar la fila previa (si existe) e insertar dentro
    // de una transacción.
    map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                 diesel::delete(content_dsl::content_workflow_states.filter(content_dsl::content_id.eq(&id_s)))
                   .execute(conn)?;
                 diesel::insert_into(content_dsl::content_workflow_states).values(&row).execute(conn)?;
                 Ok(())
               }))?;
    Ok(())
  }

  /// CAS sobre la clave de estado: el UPDATE condiciona por
  /// `content_id` y `state_key = expected`, así que de dos transiciones
  /// concurrentes desde el mismo origen sólo una afecta filas; la otra ve
  /// 0 filas afectadas y recibe `Conflict`.
  fn apply_transition(&self,
                      content_id: &Uuid,
                      expected_state_key: &str,
                      new_state_key: &str,
                      reviewer_id: &Uuid,
                      comment: Option<&str>)
                      -> Result<CasResult, WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = content_id.to_string();
    let outcome = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                               let exists = content_dsl::content_workflow_states
                                 .filter(content_dsl::content_id.eq(&id_s))
                                 .select(content_dsl::content_id)
                                 .first::<String>(conn)
                                 .optional()?
                                 .is_some();
                               if !exists {
                                 return Ok(None);
                               }
                               let updated = diesel::update(content_dsl::content_workflow_states
                                 .filter(content_dsl::content_id.eq(&id_s))
                                 .filter(content_dsl::state_key.eq(expected_state_key)))
                                 .set((content_dsl::state_key.eq(new_state_key),
                                       content_dsl::last_reviewer_id.eq(Some(reviewer_id.to_string())),
                                       content_dsl::last_reviewed_at_ts.eq(Some(Utc::now().timestamp())),
                                       content_dsl::last_comment.eq(comment.map(|c| c.to_string()))))
                                 .execute(conn)?;
                               Ok(Some(updated > 0))
                             }))?;
    match outcome {
      None => Err(WorkflowError::NotFound(format!("contenido {}", content_id))),
      Some(true) => Ok(CasResult::Applied { new_state_key: new_state_key.to_string() }),
      Some(false) => Ok(CasResult::Conflict),
    }
  }

  fn delete_content_state(&self, content_id: &Uuid) -> Result<(), WorkflowError> {
    let mut conn = self.conn()?;
    let id_s = content_id.to_string();
    let n = map_db_err(diesel::delete(content_dsl::content_workflow_states
                         .filter(content_dsl::content_id.eq(&id_s))).execute(&mut conn))?;
    if n == 0 {
      return Err(WorkflowError::NotFound(format!("contenido {}", content_id)));
    }
    Ok(())
  }
}

/// Crear repo desde las variables de entorno (o default sqlite in-memory en
/// tests). Con soporte Postgres compilado se prefiere EDITFLOW_DB_URL, con
/// DATABASE_URL como fallback.
#[cfg(all(feature = "pg", not(test)))]
pub fn new_from_env() -> Result<DieselWorkflowRepository, WorkflowError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("EDITFLOW_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                            .map_err(|_| {
                                              WorkflowError::Storage("EDITFLOW_DB_URL / DATABASE_URL not set".into())
                                            })?;
  let l = url.to_lowercase();
  if !(l.starts_with("postgres") || l.starts_with("postgresql://") || url.contains('@')) {
    return Err(WorkflowError::Storage("EDITFLOW_DB_URL / DATABASE_URL does not look like Postgres URL".into()));
  }
  Ok(DieselWorkflowRepository::new(&url))
}

#[cfg(test)]
pub fn new_from_env() -> Result<DieselWorkflowRepository, WorkflowError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("EDITFLOW_DB_URL").unwrap_or_else(|_| "file:editflowdb?mode=memory&cache=shared".into());
  Ok(DieselWorkflowRepository::new(&url))
}

#[cfg(all(not(feature = "pg"), not(test)))]
pub fn new_from_env() -> Result<DieselWorkflowRepository, WorkflowError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("EDITFLOW_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                            .unwrap_or_else(|_| "file:editflowdb?mode=memory&cache=shared".into());
  Ok(DieselWorkflowRepository::new(&url))
}

// Test helper: construct a DieselWorkflowRepository backed by explicit
// SQLite connection manager. This bypasses environment parsing and avoids
// cases where the build or features might cause the ConnectionManager to
// treat the string as Postgres connection info.
#[cfg(not(feature = "pg"))]
pub fn new_sqlite_for_test(database_url: &str) -> DieselWorkflowRepository {
  DieselWorkflowRepository::new(database_url)
}
