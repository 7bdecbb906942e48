use crate::auth::middleware::CredentialStore;
use crate::types::{
    AppError, ArticleView, PageRequest, Result, SimulationSort, SimulationView,
    UpdateSimulationRequest, UserView,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use std::time::Duration;
use tracing::info;

/// How long a file-backed connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Backend {
    /// `:memory:` databases exist per connection, so one connection is shared.
    Memory(Connection),
    Local,
    Remote,
}

pub struct TursoClient {
    db: Database,
    backend: Backend,
}

impl TursoClient {
    /// Connect to a remote Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        let client = Self {
            db,
            backend: Backend::Remote,
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Open (or create) a SQLite database file.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::new_memory().await;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database {}: {}", path, e)))?;

        let client = Self {
            db,
            backend: Backend::Local,
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Create an ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        configure(&conn, false).await?;

        let client = Self {
            db,
            backend: Backend::Memory(conn),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Returns a connection with foreign keys enforced.
    pub async fn connection(&self) -> Result<Connection> {
        match &self.backend {
            Backend::Memory(conn) => Ok(conn.clone()),
            Backend::Local | Backend::Remote => {
                let conn = self
                    .db
                    .connect()
                    .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
                configure(&conn, matches!(self.backend, Backend::Local)).await?;
                Ok(conn)
            }
        }
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection().await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                hashed_password TEXT,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 1,
                author_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create articles table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS simulations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                data INTEGER NOT NULL,
                data2 INTEGER NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 1,
                owner_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create simulations table: {}", e)))?;

        // The UNIQUE pair is what keeps likes at one per user and simulation,
        // regardless of how many processes write concurrently.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS simulation_likes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                simulation_id INTEGER NOT NULL REFERENCES simulations(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                CONSTRAINT uq_user_simulation_like UNIQUE (user_id, simulation_id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create simulation_likes table: {}", e))
        })?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_articles_public_created ON articles (is_public, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_simulations_public_created ON simulations (is_public, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_simulation_likes_simulation ON simulation_likes (simulation_id)",
        ];
        for sql in indexes {
            conn.execute(sql, ())
                .await
                .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    // User operations

    /// Insert a user. A duplicate email is reported as `Conflict`.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<User> {
        let conn = self.connection().await?;
        let created_at = created_at.timestamp();

        let mut rows = conn
            .query(
                "INSERT INTO users (username, email, hashed_password, created_at)
                 VALUES (?, ?, ?, ?) RETURNING id",
                (username, email, password_hash, created_at),
            )
            .await
            .map_err(|e| user_insert_error(email, e))?;

        let row = rows
            .next()
            .await
            .map_err(|e| user_insert_error(email, e))?
            .ok_or_else(|| AppError::Database("User insert returned no id".to_string()))?;

        Ok(User {
            id: row.get(0).map_err(database_error)?,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.map(str::to_string),
            created_at,
        })
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, username, email, hashed_password, created_at
                 FROM users WHERE email = ?",
                [email],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(database_error)? {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, username, email, hashed_password, created_at
                 FROM users WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(database_error)? {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Administrative removal of a user. Articles, simulations and likes
    /// owned by the user go with it.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.connection().await?;

        let deleted = conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        if deleted > 0 {
            info!(user_id = id, "User deleted");
        }
        Ok(deleted > 0)
    }

    // Article operations

    pub async fn create_article(
        &self,
        author_id: Option<i64>,
        title: &str,
        content: &str,
        is_public: bool,
    ) -> Result<i64> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                "INSERT INTO articles (title, content, is_public, author_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
                (title, content, i64::from(is_public), author_id, now, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create article: {}", e)))?;

        returned_id(&mut rows, "article").await
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, title, content, is_public, author_id, created_at, updated_at
                 FROM articles WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query article: {}", e)))?;

        match rows.next().await.map_err(database_error)? {
            Some(row) => Ok(Some(Article::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Public articles, newest first, optionally filtered by a
    /// case-insensitive substring of the title or content.
    pub async fn list_public_articles(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Vec<Article>> {
        let conn = self.connection().await?;

        let mut rows = match search.filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", escape_like(q));
                conn.query(
                    "SELECT id, title, content, is_public, author_id, created_at, updated_at
                     FROM articles
                     WHERE is_public = 1
                       AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')
                     ORDER BY created_at DESC, id DESC
                     LIMIT ? OFFSET ?",
                    (pattern.clone(), pattern, page.limit(), page.offset()),
                )
                .await
            }
            None => {
                conn.query(
                    "SELECT id, title, content, is_public, author_id, created_at, updated_at
                     FROM articles
                     WHERE is_public = 1
                     ORDER BY created_at DESC, id DESC
                     LIMIT ? OFFSET ?",
                    (page.limit(), page.offset()),
                )
                .await
            }
        }
        .map_err(|e| AppError::Database(format!("Failed to list articles: {}", e)))?;

        let mut articles = Vec::new();
        while let Some(row) = rows.next().await.map_err(database_error)? {
            articles.push(Article::from_row(&row)?);
        }

        Ok(articles)
    }

    /// Update the payload of an article. The author is never touched.
    pub async fn update_article(
        &self,
        id: i64,
        title: &str,
        content: &str,
        is_public: Option<bool>,
    ) -> Result<Article> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let updated = conn
            .execute(
                "UPDATE articles
                 SET title = ?, content = ?, is_public = COALESCE(?, is_public), updated_at = ?
                 WHERE id = ?",
                (title, content, is_public.map(i64::from), now, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update article: {}", e)))?;

        if updated == 0 {
            return Err(AppError::NotFound("Article not found".to_string()));
        }

        self.get_article(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Article not found".to_string()))
    }

    pub async fn delete_article(&self, id: i64) -> Result<bool> {
        let conn = self.connection().await?;

        let deleted = conn
            .execute("DELETE FROM articles WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete article: {}", e)))?;

        Ok(deleted > 0)
    }

    // Simulation operations

    pub async fn create_simulation(
        &self,
        owner_id: Option<i64>,
        title: &str,
        data: i64,
        data2: i64,
        is_public: bool,
    ) -> Result<i64> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                "INSERT INTO simulations (title, data, data2, is_public, owner_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
                (title, data, data2, i64::from(is_public), owner_id, now, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create simulation: {}", e)))?;

        returned_id(&mut rows, "simulation").await
    }

    /// A simulation with its like count, counted at read time.
    pub async fn get_simulation(&self, id: i64) -> Result<Option<Simulation>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                "SELECT s.id, s.title, s.data, s.data2, s.is_public, s.owner_id,
                        s.created_at, s.updated_at,
                        (SELECT COUNT(*) FROM simulation_likes l WHERE l.simulation_id = s.id)
                 FROM simulations s WHERE s.id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query simulation: {}", e)))?;

        match rows.next().await.map_err(database_error)? {
            Some(row) => Ok(Some(Simulation::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Public simulations, newest first or by like count.
    pub async fn list_public_simulations(
        &self,
        page: PageRequest,
        sort: SimulationSort,
    ) -> Result<Vec<Simulation>> {
        let conn = self.connection().await?;

        let order_by = match sort {
            SimulationSort::Latest => "s.created_at DESC, s.id DESC",
            SimulationSort::Likes => "likes DESC, s.created_at DESC, s.id DESC",
        };
        let sql = format!(
            "SELECT s.id, s.title, s.data, s.data2, s.is_public, s.owner_id,
                    s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM simulation_likes l WHERE l.simulation_id = s.id) AS likes
             FROM simulations s
             WHERE s.is_public = 1
             ORDER BY {}
             LIMIT ? OFFSET ?",
            order_by
        );

        let mut rows = conn
            .query(&sql, (page.limit(), page.offset()))
            .await
            .map_err(|e| AppError::Database(format!("Failed to list simulations: {}", e)))?;

        let mut simulations = Vec::new();
        while let Some(row) = rows.next().await.map_err(database_error)? {
            simulations.push(Simulation::from_row(&row)?);
        }

        Ok(simulations)
    }

    /// Apply the fields present in `changes`. The owner is never touched.
    pub async fn update_simulation(
        &self,
        id: i64,
        changes: &UpdateSimulationRequest,
    ) -> Result<Simulation> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let updated = conn
            .execute(
                "UPDATE simulations
                 SET title = COALESCE(?, title),
                     data = COALESCE(?, data),
                     data2 = COALESCE(?, data2),
                     is_public = COALESCE(?, is_public),
                     updated_at = ?
                 WHERE id = ?",
                (
                    changes.title.as_deref(),
                    changes.data,
                    changes.data2,
                    changes.is_public.map(i64::from),
                    now,
                    id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update simulation: {}", e)))?;

        if updated == 0 {
            return Err(AppError::NotFound("Simulation not found".to_string()));
        }

        self.get_simulation(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Simulation not found".to_string()))
    }

    /// Delete a simulation; its likes are removed by the cascade.
    pub async fn delete_simulation(&self, id: i64) -> Result<bool> {
        let conn = self.connection().await?;

        let deleted = conn
            .execute("DELETE FROM simulations WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete simulation: {}", e)))?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl CredentialStore for TursoClient {
    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        self.get_user(id).await
    }
}

// ============= Connection helpers =============

async fn configure(conn: &Connection, local_file: bool) -> Result<()> {
    pragma(conn, "PRAGMA foreign_keys = ON").await?;
    if local_file {
        pragma(
            conn,
            &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT.as_millis()),
        )
        .await?;
    }
    Ok(())
}

async fn pragma(conn: &Connection, sql: &str) -> Result<()> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| AppError::Database(format!("Failed to apply {}: {}", sql, e)))?;

    // Stepping is what applies the pragma; some report the new value as a row.
    while rows.next().await.map_err(database_error)?.is_some() {}
    Ok(())
}

async fn returned_id(rows: &mut libsql::Rows, what: &str) -> Result<i64> {
    let row = rows
        .next()
        .await
        .map_err(|e| AppError::Database(format!("Failed to create {}: {}", what, e)))?
        .ok_or_else(|| AppError::Database(format!("{} insert returned no id", what)))?;

    row.get(0).map_err(database_error)
}

pub(crate) fn database_error(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

/// Constraint failures are matched on SQLite's message text, which is the
/// same for local connections and for errors relayed by a remote server.
pub(crate) fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

pub(crate) fn is_foreign_key_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("FOREIGN KEY constraint failed")
}

fn user_insert_error(email: &str, e: libsql::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(format!("Email {} is already registered", email))
    } else {
        AppError::Database(format!("Failed to create user: {}", e))
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Internal(format!("Invalid stored timestamp: {}", secs)))
}

// ============= Records =============

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Absent for accounts that cannot log in with a password.
    pub password_hash: Option<String>,
    pub created_at: i64,
}

impl User {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0).map_err(database_error)?,
            username: row.get(1).map_err(database_error)?,
            email: row.get(2).map_err(database_error)?,
            password_hash: row.get(3).map_err(database_error)?,
            created_at: row.get(4).map_err(database_error)?,
        })
    }

    pub fn to_view(&self) -> Result<UserView> {
        Ok(UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: timestamp(self.created_at)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub author_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Article {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0).map_err(database_error)?,
            title: row.get(1).map_err(database_error)?,
            content: row.get(2).map_err(database_error)?,
            is_public: row.get::<i64>(3).map_err(database_error)? != 0,
            author_id: row.get(4).map_err(database_error)?,
            created_at: row.get(5).map_err(database_error)?,
            updated_at: row.get(6).map_err(database_error)?,
        })
    }

    pub fn into_view(self) -> Result<ArticleView> {
        Ok(ArticleView {
            id: self.id,
            title: self.title,
            content: self.content,
            is_public: self.is_public,
            author_id: self.author_id,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    pub id: i64,
    pub title: String,
    pub data: i64,
    pub data2: i64,
    pub is_public: bool,
    pub owner_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Like count as of the query that loaded this record.
    pub likes: i64,
}

impl Simulation {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0).map_err(database_error)?,
            title: row.get(1).map_err(database_error)?,
            data: row.get(2).map_err(database_error)?,
            data2: row.get(3).map_err(database_error)?,
            is_public: row.get::<i64>(4).map_err(database_error)? != 0,
            owner_id: row.get(5).map_err(database_error)?,
            created_at: row.get(6).map_err(database_error)?,
            updated_at: row.get(7).map_err(database_error)?,
            likes: row.get(8).map_err(database_error)?,
        })
    }

    pub fn into_view(self) -> Result<SimulationView> {
        Ok(SimulationView {
            id: self.id,
            title: self.title,
            data: self.data,
            data2: self.data2,
            is_public: self.is_public,
            owner_id: self.owner_id,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
            likes: self.likes,
            liked_by_me: None,
        })
    }
}
