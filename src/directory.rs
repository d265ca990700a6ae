//! Read-only view of the external user and project directory.

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Engineer, Project};

/// Lookup port the engine consumes. Implementations own the records;
/// the engine never writes through it.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn engineer(&self, id: Ulid) -> Option<Engineer>;

    async fn project(&self, id: Ulid) -> Option<Project>;

    /// Every user record, managers included.
    async fn engineers(&self) -> Vec<Engineer>;
}

/// Directory held in memory, for seeding and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    engineers: DashMap<Ulid, Engineer>,
    projects: DashMap<Ulid, Project>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_engineer(&self, engineer: Engineer) {
        self.engineers.insert(engineer.id, engineer);
    }

    pub fn upsert_project(&self, project: Project) {
        self.projects.insert(project.id, project);
    }

    pub fn remove_engineer(&self, id: &Ulid) -> Option<Engineer> {
        self.engineers.remove(id).map(|(_, e)| e)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.projects.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn engineer(&self, id: Ulid) -> Option<Engineer> {
        self.engineers.get(&id).map(|e| e.value().clone())
    }

    async fn project(&self, id: Ulid) -> Option<Project> {
        self.projects.get(&id).map(|e| e.value().clone())
    }

    async fn engineers(&self) -> Vec<Engineer> {
        self.engineers.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[tokio::test]
    async fn upsert_and_lookup() {
        let dir = InMemoryDirectory::new();
        let id = Ulid::new();
        assert!(dir.engineer(id).await.is_none());

        let mut e = Engineer::new(id, Role::Engineer);
        dir.upsert_engineer(e.clone());
        assert_eq!(dir.engineer(id).await, Some(e.clone()));

        e.max_capacity = 50;
        dir.upsert_engineer(e.clone());
        assert_eq!(dir.engineer(id).await.unwrap().max_capacity, 50);
        assert_eq!(dir.engineers().await.len(), 1);

        assert!(dir.remove_engineer(&id).is_some());
        assert!(dir.engineers().await.is_empty());
    }
}
