//! identity-admin: administer identities and their roles.
//!
//! # Usage
//!
//! ```bash
//! export DATABASE_URL=postgres://localhost/tessera
//!
//! identity-admin add-role editor --description "Can edit content"
//! TESSERA_PASSWORD=pw123 identity-admin create --username alice --role editor
//! identity-admin set-role alice admin
//! identity-admin show alice
//! identity-admin delete alice
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sea_orm::Database;
use serde::Serialize;

use tessera_core::config::Config as _;
use tessera_core::tracing::init_tracing;
use tessera_domain::identity::IdentityStatus;
use tessera_identity::config::IdentityConfig;
use tessera_identity::domain::types::{Identity, NewIdentity, Password, Role};
use tessera_identity::error::IdentityError;
use tessera_identity::state::{AppState, DbIdentityStore};

#[derive(Parser)]
#[command(name = "identity-admin", about = "Administer identities and role assignments")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an identity with a password and a role
    Create {
        #[arg(long)]
        username: String,
        /// Plaintext password; prefer the env var over the flag
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Department id; an empty value means no department
        #[arg(long)]
        department: Option<String>,
    },
    /// Print an active identity with its current role
    Show { username: String },
    /// Replace the role of an active identity
    SetRole { username: String, role: String },
    /// Set a new password for an active identity
    SetPassword {
        username: String,
        #[arg(long, env = "TESSERA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Issue a new session token, invalidating persistent logins
    RotateToken { username: String },
    /// Mark an active identity as deleted
    Delete { username: String },
    /// List the roles defined in the role authority
    Roles,
    /// Define a new role
    AddRole {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

/// Presentation of an identity; secrets are never included.
#[derive(Serialize)]
struct IdentityView {
    id: String,
    username: String,
    status: IdentityStatus,
    full_name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    department: Option<String>,
    role: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityView {
    fn new(identity: Identity, role: Option<String>) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username,
            status: identity.status,
            full_name: identity.full_name,
            address: identity.address,
            phone: identity.phone,
            department: identity.department_ref,
            role,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

#[derive(Serialize)]
struct RoleView {
    name: String,
    description: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let config = IdentityConfig::try_from_env().context("load configuration")?;
    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    let state = AppState {
        db,
        config: Arc::new(config),
    };
    let store = state.identity_store()?;

    match args.command {
        Command::Create {
            username,
            password,
            role,
            full_name,
            address,
            phone,
            department,
        } => {
            let identity = store
                .create(NewIdentity {
                    username,
                    password: Some(Password::new(password)),
                    role: Some(role),
                    full_name,
                    address,
                    phone,
                    department_ref: department,
                })
                .await?;
            print_identity(&store, identity).await
        }
        Command::Show { username } => {
            let identity = require(&store, &username).await?;
            print_identity(&store, identity).await
        }
        Command::SetRole { username, role } => {
            let mut identity = require(&store, &username).await?;
            identity.desired_role = Some(role);
            store.save(&mut identity).await?;
            print_identity(&store, identity).await
        }
        Command::SetPassword { username, password } => {
            let mut identity = require(&store, &username).await?;
            identity.desired_role = store.load_role_for_display(&identity).await?;
            identity.new_password = Some(Password::new(password));
            store.save(&mut identity).await?;
            print_identity(&store, identity).await
        }
        Command::RotateToken { username } => {
            let mut identity = require(&store, &username).await?;
            identity.desired_role = store.load_role_for_display(&identity).await?;
            store.regenerate_session_token(&mut identity);
            store.save(&mut identity).await?;
            print_identity(&store, identity).await
        }
        Command::Delete { username } => {
            let identity = require(&store, &username).await?;
            store.soft_delete(identity.id).await?;
            println!("{}", serde_json::json!({ "deleted": identity.id.to_string() }));
            Ok(())
        }
        Command::Roles => {
            let roles: Vec<RoleView> = store
                .available_roles()
                .await?
                .into_iter()
                .map(|r| RoleView {
                    name: r.name,
                    description: r.description,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&roles)?);
            Ok(())
        }
        Command::AddRole { name, description } => {
            state
                .role_authority()
                .create_role(&Role {
                    name: name.clone(),
                    description,
                })
                .await?;
            println!("{}", serde_json::json!({ "created": name }));
            Ok(())
        }
    }
}

async fn require(store: &DbIdentityStore, username: &str) -> Result<Identity> {
    store
        .find_active_by_username(username)
        .await?
        .ok_or(IdentityError::NotFound)
        .with_context(|| format!("no active identity named {username:?}"))
}

async fn print_identity(store: &DbIdentityStore, identity: Identity) -> Result<()> {
    let role = store.load_role_for_display(&identity).await?;
    let view = IdentityView::new(identity, role);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
