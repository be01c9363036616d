use crate::cli::{WorkspaceAction, WorkspaceArgs};
use crate::commands::{save_session, table};
use crate::error::CliError;
use crate::session::{Session, SessionStore};
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_client::Workspace;

pub fn handle_workspace(args: WorkspaceArgs, store: &dyn SessionStore) -> Result<(), CliError> {
    match args.action {
        WorkspaceAction::Add { alias, target } => {
            let parsed: Workspace = target.parse()?;
            let shown = parsed.to_string();
            save_session(store, |session| {
                session.aliases.insert(alias.clone(), parsed);
            })?;
            println!("Saved alias '{}' for {}.", alias.cyan(), shown.cyan());
        }
        WorkspaceAction::List => {
            let session = store.load()?;
            if session.aliases.is_empty() && session.pending.is_empty() {
                println!("No workspace aliases saved.");
            } else {
                println!("{}", alias_table(&session));
            }
        }
        WorkspaceAction::Remove { alias } => {
            let mut session = store.load()?;
            if session.aliases.remove(&alias).is_none() {
                return Err(CliError::UnknownWorkspace(alias));
            }
            store.save(&session)?;
            println!("Removed alias '{}'.", alias.cyan());
        }
    }
    Ok(())
}

pub(crate) fn alias_table(session: &Session) -> Table {
    let mut t = table(&["Alias", "Workspace", "Pending submissions"]);
    for (alias, workspace) in &session.aliases {
        let pending = session.pending_for(workspace);
        t.add_row(vec![
            Cell::new(alias).fg(Color::Yellow),
            Cell::new(workspace),
            Cell::new(pending.join(", ")),
        ]);
    }
    for (workspace, ids) in &session.pending {
        if session.aliases.values().any(|w| &w.to_string() == workspace) {
            continue;
        }
        t.add_row(vec![
            Cell::new("-"),
            Cell::new(workspace),
            Cell::new(ids.iter().cloned().collect::<Vec<_>>().join(", ")),
        ]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::JsonSessionStore;

    fn store() -> (tempfile::TempDir, JsonSessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSessionStore::new(dir.path().join("session.json"));
        (dir, store)
    }

    fn add(alias: &str, workspace: &str) -> WorkspaceArgs {
        WorkspaceArgs {
            action: WorkspaceAction::Add {
                alias: alias.to_string(),
                target: workspace.to_string(),
            },
        }
    }

    #[test]
    fn test_add_and_remove_alias() {
        let (_dir, store) = store();
        handle_workspace(add("rna", "broad/rnaseq"), &store).unwrap();
        assert_eq!(
            store.load().unwrap().aliases.get("rna"),
            Some(&Workspace::new("broad", "rnaseq"))
        );

        let remove = WorkspaceArgs {
            action: WorkspaceAction::Remove {
                alias: "rna".to_string(),
            },
        };
        handle_workspace(remove, &store).unwrap();
        assert!(store.load().unwrap().aliases.is_empty());
    }

    #[test]
    fn test_add_rejects_malformed_workspace() {
        let (_dir, store) = store();
        assert!(handle_workspace(add("rna", "rnaseq"), &store).is_err());
        assert!(store.load().unwrap().aliases.is_empty());
    }

    #[test]
    fn test_remove_unknown_alias() {
        let (_dir, store) = store();
        let remove = WorkspaceArgs {
            action: WorkspaceAction::Remove {
                alias: "nope".to_string(),
            },
        };
        assert!(matches!(
            handle_workspace(remove, &store),
            Err(CliError::UnknownWorkspace(_))
        ));
    }

    #[test]
    fn test_alias_table_shows_pending() {
        let mut session = Session::default();
        let ws = Workspace::new("broad", "rnaseq");
        session.aliases.insert("rna".to_string(), ws.clone());
        session.add_pending(&ws, vec!["sub-1".to_string()]);
        session.add_pending(&Workspace::new("lab", "exome"), vec!["sub-9".to_string()]);
        let rendered = alias_table(&session).to_string();
        assert!(rendered.contains("broad/rnaseq"));
        assert!(rendered.contains("sub-1"));
        assert!(rendered.contains("lab/exome"));
        assert!(rendered.contains("sub-9"));
    }
}
