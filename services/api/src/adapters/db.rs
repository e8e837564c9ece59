//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsmith_core::domain::{
    Comment, DocType, Feedback, NewNode, NewProject, NewRevision, Node, NodeEdit, Project,
    Revision, User, UserCredentials,
};
use docsmith_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn nodes_for_projects(&self, project_ids: &[Uuid]) -> PortResult<HashMap<Uuid, Vec<Node>>> {
        let records = sqlx::query_as::<_, NodeRecord>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE project_id = ANY($1) ORDER BY seq ASC"
        ))
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut grouped: HashMap<Uuid, Vec<Node>> = HashMap::new();
        for record in records {
            grouped
                .entry(record.project_id)
                .or_default()
                .push(record.to_domain());
        }
        Ok(grouped)
    }
}

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";
const PROJECT_COLUMNS: &str = "id, user_id, title, doc_type, main_prompt, created_at, updated_at";
const NODE_COLUMNS: &str = "id, project_id, idx, title, content_current, created_at";
const REVISION_COLUMNS: &str = "id, node_id, user_id, prompt_text, result_text, feedback, created_at";
const COMMENT_COLUMNS: &str = "id, node_id, user_id, comment_text, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ProjectRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    doc_type: String,
    main_prompt: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProjectRecord {
    fn to_domain(self, nodes: Vec<Node>) -> PortResult<Project> {
        let doc_type = self
            .doc_type
            .parse::<DocType>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Project {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            doc_type,
            main_prompt: self.main_prompt,
            created_at: self.created_at,
            updated_at: self.updated_at,
            nodes,
        })
    }
}

#[derive(FromRow)]
struct NodeRecord {
    id: Uuid,
    project_id: Uuid,
    idx: i32,
    title: Option<String>,
    content_current: Option<String>,
    created_at: DateTime<Utc>,
}
impl NodeRecord {
    fn to_domain(self) -> Node {
        Node {
            id: self.id,
            project_id: self.project_id,
            idx: self.idx,
            title: self.title,
            content_current: self.content_current,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct RevisionRecord {
    id: Uuid,
    node_id: Uuid,
    user_id: Uuid,
    prompt_text: String,
    result_text: String,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}
impl RevisionRecord {
    fn to_domain(self) -> Revision {
        Revision {
            id: self.id,
            node_id: self.node_id,
            user_id: self.user_id,
            prompt_text: self.prompt_text,
            result_text: self.result_text,
            feedback: self.feedback.as_deref().and_then(Feedback::parse),
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRecord {
    id: Uuid,
    node_id: Uuid,
    user_id: Uuid,
    comment_text: String,
    created_at: DateTime<Utc>,
}
impl CommentRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            node_id: self.node_id,
            user_id: self.user_id,
            comment_text: self.comment_text,
            created_at: self.created_at,
        }
    }
}

async fn insert_node<'e, E>(executor: E, project_id: Uuid, node: &NewNode) -> Result<NodeRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, NodeRecord>(&format!(
        "INSERT INTO nodes (id, project_id, idx, title) VALUES ($1, $2, $3, $4) RETURNING {NODE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(project_id)
    .bind(node.idx)
    .bind(&node.title)
    .fetch_one(executor)
    .await
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} already registered", email))
            }
            other => PortError::Unexpected(other.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", email)))?;
        Ok(record.to_credentials())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_project(&self, user_id: Uuid, project: NewProject) -> PortResult<Project> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, ProjectRecord>(&format!(
            "INSERT INTO projects (id, user_id, title, doc_type, main_prompt) VALUES ($1, $2, $3, $4, $5) RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&project.title)
        .bind(project.doc_type.as_str())
        .bind(&project.main_prompt)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let mut nodes = Vec::with_capacity(project.nodes.len());
        for node in &project.nodes {
            let node_record = insert_node(&mut *tx, record.id, node)
                .await
                .map_err(unexpected)?;
            nodes.push(node_record.to_domain());
        }

        tx.commit().await.map_err(unexpected)?;
        debug!("Created project {} with {} nodes", record.id, nodes.len());
        record.to_domain(nodes)
    }

    async fn get_project(&self, project_id: Uuid) -> PortResult<Project> {
        let record = sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Project {} not found", project_id)))?;

        let mut nodes = self.nodes_for_projects(&[project_id]).await?;
        record.to_domain(nodes.remove(&project_id).unwrap_or_default())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        let records = sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY seq ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut nodes = self.nodes_for_projects(&ids).await?;
        records
            .into_iter()
            .map(|r| {
                let project_nodes = nodes.remove(&r.id).unwrap_or_default();
                r.to_domain(project_nodes)
            })
            .collect()
    }

    async fn delete_project(&self, project_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Project {} not found", project_id)));
        }
        Ok(())
    }

    async fn add_node(&self, project_id: Uuid, node: NewNode) -> PortResult<Node> {
        let record = insert_node(&self.pool, project_id, &node)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    PortError::NotFound(format!("Project {} not found", project_id))
                }
                other => PortError::Unexpected(other.to_string()),
            })?;
        Ok(record.to_domain())
    }

    async fn get_node(&self, project_id: Uuid, node_id: Uuid) -> PortResult<Node> {
        let record = sqlx::query_as::<_, NodeRecord>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1 AND project_id = $2"
        ))
        .bind(node_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Node {} not found", node_id)))?;
        Ok(record.to_domain())
    }

    async fn update_node_content(&self, node_id: Uuid, content: &str) -> PortResult<Node> {
        let record = sqlx::query_as::<_, NodeRecord>(&format!(
            "UPDATE nodes SET content_current = $1 WHERE id = $2 RETURNING {NODE_COLUMNS}"
        ))
        .bind(content)
        .bind(node_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Node {} not found", node_id)))?;
        Ok(record.to_domain())
    }

    async fn edit_node(&self, node_id: Uuid, edit: NodeEdit) -> PortResult<Node> {
        let record = sqlx::query_as::<_, NodeRecord>(&format!(
            "UPDATE nodes SET \
                title = COALESCE($1, title), \
                idx = COALESCE($2, idx), \
                content_current = COALESCE($3, content_current) \
             WHERE id = $4 RETURNING {NODE_COLUMNS}"
        ))
        .bind(edit.title)
        .bind(edit.idx)
        .bind(edit.content_current)
        .bind(node_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Node {} not found", node_id)))?;
        Ok(record.to_domain())
    }

    async fn create_revision(&self, revision: NewRevision) -> PortResult<Revision> {
        let record = sqlx::query_as::<_, RevisionRecord>(&format!(
            "INSERT INTO revisions (id, node_id, user_id, prompt_text, result_text, feedback) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REVISION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(revision.node_id)
        .bind(revision.user_id)
        .bind(&revision.prompt_text)
        .bind(&revision.result_text)
        .bind(revision.feedback.map(|f| f.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_revisions(&self, node_id: Uuid) -> PortResult<Vec<Revision>> {
        let records = sqlx::query_as::<_, RevisionRecord>(&format!(
            "SELECT {REVISION_COLUMNS} FROM revisions WHERE node_id = $1 ORDER BY seq ASC"
        ))
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn add_comment(&self, node_id: Uuid, user_id: Uuid, text: &str) -> PortResult<Comment> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "INSERT INTO comments (id, node_id, user_id, comment_text) VALUES ($1, $2, $3, $4) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(node_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_comments(&self, node_id: Uuid) -> PortResult<Vec<Comment>> {
        let records = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE node_id = $1 ORDER BY seq ASC"
        ))
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

// These run against a throwaway Postgres database created by `sqlx::test`:
// `DATABASE_URL=postgres://... cargo test -p api -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn user(db: &DbAdapter, email: &str) -> User {
        db.create_user(email, None, "$argon2id$stub").await.unwrap()
    }

    fn new_project(nodes: &[(&str, i32)]) -> NewProject {
        NewProject {
            title: "Ocean Report".into(),
            doc_type: DocType::Pptx,
            main_prompt: Some("Ocean currents".into()),
            nodes: nodes
                .iter()
                .map(|(title, idx)| NewNode {
                    title: title.to_string(),
                    idx: *idx,
                })
                .collect(),
        }
    }

    async fn count(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn duplicate_email_is_a_conflict(pool: PgPool) {
        let db = DbAdapter::new(pool);
        user(&db, "ada@example.com").await;
        let err = db
            .create_user("ada@example.com", Some("Ada"), "$argon2id$other")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)), "{:?}", err);

        let stored = db.get_user_by_email("ada@example.com").await.unwrap();
        assert_eq!(stored.password_hash, "$argon2id$stub");
        assert!(matches!(
            db.get_user_by_email("nobody@example.com").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn project_and_nodes_come_back_in_insertion_order(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let owner = user(&db, "ada@example.com").await;
        let created = db
            .create_project(owner.id, new_project(&[("B", 1), ("A", 0), ("C", 1)]))
            .await
            .unwrap();
        assert_eq!(created.doc_type, DocType::Pptx);

        let loaded = db.get_project(created.id).await.unwrap();
        let titles: Vec<Option<String>> = loaded.nodes.iter().map(|n| n.title.clone()).collect();
        assert_eq!(
            titles,
            vec![Some("B".into()), Some("A".into()), Some("C".into())]
        );

        let second = db.create_project(owner.id, new_project(&[])).await.unwrap();
        let listed: Vec<Uuid> = db
            .list_projects_for_user(owner.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(listed, vec![created.id, second.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn project_for_unknown_owner_leaves_no_rows(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let err = db
            .create_project(Uuid::new_v4(), new_project(&[("A", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
        assert_eq!(count(&pool, "projects").await, 0);
        assert_eq!(count(&pool, "nodes").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn revisions_and_comments_keep_insertion_order_on_equal_timestamps(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let owner = user(&db, "ada@example.com").await;
        let project = db
            .create_project(owner.id, new_project(&[("A", 0)]))
            .await
            .unwrap();
        let node_id = project.nodes[0].id;

        for text in ["first", "second", "third"] {
            db.create_revision(NewRevision {
                node_id,
                user_id: owner.id,
                prompt_text: format!("prompt {text}"),
                result_text: text.to_string(),
                feedback: None,
            })
            .await
            .unwrap();
            db.add_comment(node_id, owner.id, text).await.unwrap();
        }
        for table in ["revisions", "comments"] {
            sqlx::query(&format!(
                "UPDATE {table} SET created_at = '2025-01-01T00:00:00Z'"
            ))
            .execute(&pool)
            .await
            .unwrap();
        }

        let revisions: Vec<String> = db
            .list_revisions(node_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.result_text)
            .collect();
        assert_eq!(revisions, vec!["first", "second", "third"]);
        let comments: Vec<String> = db
            .list_comments(node_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.comment_text)
            .collect();
        assert_eq!(comments, vec!["first", "second", "third"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn node_updates_touch_only_the_given_fields(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let owner = user(&db, "ada@example.com").await;
        let project = db
            .create_project(owner.id, new_project(&[("Intro", 0)]))
            .await
            .unwrap();
        let node_id = project.nodes[0].id;

        db.update_node_content(node_id, "Draft").await.unwrap();
        let edited = db
            .edit_node(
                node_id,
                NodeEdit {
                    idx: Some(4),
                    ..NodeEdit::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.title.as_deref(), Some("Intro"));
        assert_eq!(edited.idx, 4);
        assert_eq!(edited.content_current.as_deref(), Some("Draft"));

        assert!(matches!(
            db.get_node(Uuid::new_v4(), node_id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            db.add_node(Uuid::new_v4(), NewNode { title: "X".into(), idx: 0 }).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn deleting_a_project_cascades_to_its_children(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let owner = user(&db, "ada@example.com").await;
        let project = db
            .create_project(owner.id, new_project(&[("A", 0), ("B", 1)]))
            .await
            .unwrap();
        let node_id = project.nodes[0].id;
        db.create_revision(NewRevision {
            node_id,
            user_id: owner.id,
            prompt_text: "p".into(),
            result_text: "r".into(),
            feedback: None,
        })
        .await
        .unwrap();
        db.add_comment(node_id, owner.id, "note").await.unwrap();

        db.delete_project(project.id).await.unwrap();
        for table in ["projects", "nodes", "revisions", "comments"] {
            assert_eq!(count(&pool, table).await, 0, "{table} still has rows");
        }
        assert!(matches!(
            db.delete_project(project.id).await,
            Err(PortError::NotFound(_))
        ));
    }
}
