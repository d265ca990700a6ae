//! Bulk-load users, projects and assignments from a JSON file.
//!
//! Assignments are replayed through the engine as the owning project's manager,
//! so a seed that would over-allocate someone is partially rejected rather than
//! loaded as-is.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ulid::Ulid;

use crate::auth::{Identity, RequestContext, TokenTable};
use crate::directory::InMemoryDirectory;
use crate::engine::Engine;
use crate::model::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    #[serde(flatten)]
    pub user: Engineer,
    /// Bearer token to register for this user, if any.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub assignments: Vec<NewAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub projects: usize,
    pub created: Vec<Ulid>,
    pub rejected: usize,
}

impl Seed {
    pub fn load(path: &Path) -> io::Result<Seed> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> io::Result<Seed> {
        serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub async fn apply(
        &self,
        engine: &Engine,
        directory: &InMemoryDirectory,
        tokens: &TokenTable,
    ) -> SeedReport {
        let mut report = SeedReport::default();

        for seed_user in &self.users {
            let user = &seed_user.user;
            if let Some(token) = &seed_user.token {
                tokens.insert(token.clone(), Identity::new(user.id, user.role));
            }
            directory.upsert_engineer(user.clone());
            report.users += 1;
        }

        let mut owners: HashMap<Ulid, Ulid> = HashMap::new();
        for project in &self.projects {
            owners.insert(project.id, project.manager_id);
            directory.upsert_project(project.clone());
            report.projects += 1;
        }

        for new in &self.assignments {
            let Some(&manager_id) = owners.get(&new.project_id) else {
                warn!("seed assignment for unknown project {} skipped", new.project_id);
                report.rejected += 1;
                continue;
            };
            let ctx = RequestContext::new(Identity::new(manager_id, Role::Manager));
            match engine.create_assignment(&ctx, new.clone()).await {
                Ok(a) => report.created.push(a.id),
                Err(e) => {
                    warn!(
                        "seed assignment for engineer {} on project {} rejected: {e}",
                        new.engineer_id, new.project_id
                    );
                    report.rejected += 1;
                }
            }
        }

        info!(
            "seed loaded: {} users, {} projects, {} assignments ({} rejected)",
            report.users,
            report.projects,
            report.created.len(),
            report.rejected
        );
        report
    }
}
