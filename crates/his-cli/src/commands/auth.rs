use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use his_auth::{FileSessionPersistence, SessionStore};
use his_core::{Role, User};

use crate::cli::{LoginArgs, OutputFormat};
use crate::config::ConfigStore;
use crate::output::{print_json, print_success};

/// The profile's session, restored from disk.
pub fn session_store(store: &ConfigStore, profile: &str) -> SessionStore {
    let persistence = FileSessionPersistence::new(store.session_path(profile));
    SessionStore::restore(Arc::new(persistence))
}

pub fn login(store: &ConfigStore, profile: &str, args: &LoginArgs) -> Result<()> {
    let role: Role = args
        .role
        .parse()
        .context("--role must be one of nurse, doctor, pharmacy, admin")?;
    if args.token.trim().is_empty() {
        anyhow::bail!("--token must not be empty");
    }

    let mut user = User::new(role, args.name.trim()).with_ids(args.user_id, args.related_id);
    if let Some(dept) = &args.dept {
        user = user.with_dept(dept.trim());
    }

    session_store(store, profile).login(args.token.trim(), user);
    print_success(&format!(
        "Signed in as {} ({}) → {} {}",
        args.name.cyan(),
        role,
        role.workstation(),
        role.home_path().dimmed()
    ));
    Ok(())
}

pub fn logout(store: &ConfigStore, profile: &str) -> Result<()> {
    let session = session_store(store, profile);
    if session.token().is_some() {
        session.logout();
        print_success("Signed out (session cleared)");
    } else {
        println!("No session found for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(store: &ConfigStore, profile: &str, format: OutputFormat) -> Result<()> {
    let session = session_store(store, profile);
    let (Some(token), Some(user)) = (session.token(), session.user()) else {
        println!("Not signed in (profile \"{profile}\")");
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "profile": profile,
            "token": mask_token(&token),
            "user": user,
        }))?,
        OutputFormat::Table => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!("{}: {}", "Name".cyan(), user.name);
            match user.role() {
                Some(role) => println!(
                    "{}: {} ({})",
                    "Role".cyan(),
                    role,
                    role.workstation()
                ),
                None => println!("{}: {} (unrecognised)", "Role".cyan(), user.role),
            }
            if let Some(dept) = &user.dept {
                println!("{}: {}", "Dept".cyan(), dept);
            }
            println!("{}: {}", "Token".cyan(), mask_token(&token));
        }
    }
    Ok(())
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if visible.len() == token.len() {
        "****".to_string()
    } else {
        format!("{visible}…")
    }
}
