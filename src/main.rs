use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;
use workflow_engine::{StaticRoleResolver, WorkflowService};

/// Pequeño menú interactivo para administrar definiciones de workflow
/// usando el repositorio proporcionado por `workflow-persistence`.
///
/// Opciones soportadas:
/// 1) Ver definiciones (tabla con id, nombre y tipos de contenido)
/// 2) Instalar workflow default para un tipo de contenido
/// 3) Ver transiciones disponibles desde un estado
/// 4) Eliminar definición (cascadea a estados/transiciones/roles)
/// 5) Salir
fn main() -> Result<(), Box<dyn Error>> {
    // Inicializar repo (aplica migraciones embebidas si procede)
    let repo = workflow_persistence::new_from_env().map_err(|e| Box::new(e) as Box<dyn Error>)?;
    let service = WorkflowService::new(Arc::new(repo));
    let resolver = StaticRoleResolver::with_editorial_tiers();

    loop {
        println!("\n== Editorial workflow menu ==");
        println!("1) Ver definiciones");
        println!("2) Instalar workflow default para un tipo de contenido");
        println!("3) Ver transiciones disponibles desde un estado");
        println!("4) Eliminar definición");
        println!("5) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => match service.list_definitions() {
                Ok(defs) => {
                    println!("\nID                                   | DEFAULT | NOMBRE / TIPOS");
                    println!("--------------------------------------------------------------------------");
                    for d in defs {
                        let mark = if d.is_default { "   *   " } else { "       " };
                        println!("{} | {} | {} [{}]", d.id, mark, d.name, d.content_types.join(","));
                    }
                }
                Err(e) => eprintln!("Error listando definiciones: {}", e),
            },
            "2" => {
                let name = prompt("Nombre del workflow: ")?;
                let ct = prompt("Tipo de contenido (p.ej. post): ")?;
                if name.trim().is_empty() || ct.trim().is_empty() {
                    eprintln!("Nombre y tipo de contenido son obligatorios");
                    continue;
                }
                match service.install_default_workflow(name.trim(), vec![ct.trim().to_string()], &resolver) {
                    Ok((def, warnings)) => {
                        println!("Workflow instalado: {} ({} estados, {} transiciones)",
                                 def.id,
                                 def.states.len(),
                                 def.transitions.len());
                        for w in warnings {
                            println!("  advertencia: {}", w);
                        }
                    }
                    Err(e) => eprintln!("Error instalando workflow: {}", e),
                }
            }
            "3" => {
                let ct = prompt("Tipo de contenido: ")?;
                let state = prompt("Estado actual (p.ej. draft): ")?;
                let roles = prompt("Roles del actor separados por coma (enter para ninguno): ")?;
                let keys: Vec<String> = roles.split(',')
                                             .map(|s| s.trim().to_string())
                                             .filter(|s| !s.is_empty())
                                             .collect();
                match service.available_transitions(ct.trim(), state.trim(), &keys) {
                    Ok(ts) if ts.is_empty() => println!("Sin transiciones disponibles"),
                    Ok(ts) => {
                        for t in ts {
                            println!("  {} --[{}]--> {}", t.from_state_key, t.name, t.to_state_key);
                        }
                    }
                    Err(e) => eprintln!("Error consultando transiciones: {}", e),
                }
            }
            "4" => {
                let id = prompt("Id de la definición (UUID): ")?;
                match Uuid::parse_str(id.trim()) {
                    Ok(id) => match service.delete_definition(&id) {
                        Ok(()) => println!("Definición eliminada"),
                        Err(e) => eprintln!("Error eliminando: {}", e),
                    },
                    Err(e) => eprintln!("UUID inválido: {}", e),
                }
            }
            "5" => break,
            other => eprintln!("Opción desconocida: {}", other),
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String, Box<dyn Error>> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
