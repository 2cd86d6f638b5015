//! Warta test utilities.
//!
//! Helpers for integration testing: an in-memory SQLite database with the
//! content schema, fixture builders for each collection, and assertion
//! utilities for list responses.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

/// Content schema used by the list engine's adapters.
pub const SCHEMA: &str = r#"
CREATE TABLE event_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    start_date TEXT NOT NULL,
    end_date TEXT,
    location TEXT,
    status TEXT NOT NULL DEFAULT 'PUBLISHED',
    published INTEGER NOT NULL DEFAULT 1,
    category_id INTEGER REFERENCES event_categories(id),
    image_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE speakers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    title TEXT,
    organization TEXT,
    image_url TEXT
);

CREATE TABLE event_speakers (
    event_id INTEGER NOT NULL REFERENCES events(id),
    speaker_id INTEGER NOT NULL REFERENCES speakers(id),
    role TEXT,
    display_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (event_id, speaker_id)
);

CREATE TABLE tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE tags_on_events (
    event_id INTEGER NOT NULL REFERENCES events(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (event_id, tag_id)
);

CREATE TABLE publications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    abstract TEXT,
    type TEXT,
    status TEXT NOT NULL DEFAULT 'PUBLISHED',
    published INTEGER NOT NULL DEFAULT 1,
    publication_date TEXT,
    category_id INTEGER REFERENCES event_categories(id),
    file_url TEXT,
    cover_image TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    title TEXT,
    organization TEXT
);

CREATE TABLE authors_on_publications (
    publication_id INTEGER NOT NULL REFERENCES publications(id),
    author_id INTEGER NOT NULL REFERENCES authors(id),
    display_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (publication_id, author_id)
);

CREATE TABLE tags_on_publications (
    publication_id INTEGER NOT NULL REFERENCES publications(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (publication_id, tag_id)
);

CREATE TABLE careers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    location TEXT,
    type TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    posted_date TEXT,
    deadline TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE mail_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    code TEXT NOT NULL
);

CREATE TABLE mails (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mail_number TEXT NOT NULL,
    subject TEXT NOT NULL,
    sender TEXT,
    recipient TEXT,
    date TEXT NOT NULL,
    type TEXT NOT NULL,
    status TEXT,
    category_id INTEGER REFERENCES mail_categories(id),
    description TEXT,
    file_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    owner_id TEXT,
    due_date TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE project_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    user_id TEXT NOT NULL,
    role TEXT
);

CREATE TABLE tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'TODO',
    priority TEXT NOT NULL DEFAULT 'MEDIUM',
    assigned_to TEXT,
    agent_id TEXT,
    project_id INTEGER REFERENCES projects(id),
    tags TEXT,
    due_date TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE partners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    logo_url TEXT,
    website TEXT,
    display_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
"#;

/// Open a fresh in-memory database with [`SCHEMA`] applied.
///
/// The pool holds a single connection that never expires: every
/// connection to `:memory:` is a separate database.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.with_regexp();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    Ok(pool)
}

/// Timestamp `offset_minutes` after a fixed base, as stored in `created_at`.
///
/// Fixtures use distinct, ordered timestamps so default sorts are
/// predictable.
pub fn timestamp(offset_minutes: i64) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default();
    (base + Duration::minutes(offset_minutes))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Current time in the stored format.
pub fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn unique_slug(title: &str) -> String {
    let base: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}-{}", base.trim_matches('-'), Uuid::now_v7().simple())
}

/// Create a test event with default values.
pub fn test_event(title: &str) -> TestEvent {
    TestEvent {
        title: title.to_string(),
        description: None,
        location: None,
        status: "PUBLISHED".to_string(),
        published: true,
        category_id: None,
        start_date: "2024-06-01".to_string(),
        end_date: None,
        created_at: now(),
    }
}

/// An event fixture.
#[derive(Debug, Clone)]
pub struct TestEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub published: bool,
    pub category_id: Option<i64>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_at: String,
}

impl TestEvent {
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn starting(mut self, date: &str) -> Self {
        self.start_date = date.to_string();
        self
    }

    pub fn created(mut self, at: String) -> Self {
        self.created_at = at;
        self
    }

    /// Insert the event and return its id.
    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO events (title, slug, description, start_date, end_date, location, status, published, category_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.title)
        .bind(unique_slug(&self.title))
        .bind(&self.description)
        .bind(&self.start_date)
        .bind(&self.end_date)
        .bind(&self.location)
        .bind(&self.status)
        .bind(self.published)
        .bind(self.category_id)
        .bind(&self.created_at)
        .bind(&self.created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Create a test publication with default values.
pub fn test_publication(title: &str) -> TestPublication {
    TestPublication {
        title: title.to_string(),
        summary: None,
        kind: Some("REPORT".to_string()),
        status: "PUBLISHED".to_string(),
        published: true,
        category_id: None,
        publication_date: Some("2024-03-01".to_string()),
        created_at: now(),
    }
}

/// A publication fixture.
#[derive(Debug, Clone)]
pub struct TestPublication {
    pub title: String,
    /// Stored in the `abstract` column.
    pub summary: Option<String>,
    /// Stored in the `type` column.
    pub kind: Option<String>,
    pub status: String,
    pub published: bool,
    pub category_id: Option<i64>,
    pub publication_date: Option<String>,
    pub created_at: String,
}

impl TestPublication {
    pub fn with_abstract(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn created(mut self, at: String) -> Self {
        self.created_at = at;
        self
    }

    /// Insert the publication and return its id.
    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO publications (title, slug, abstract, type, status, published, publication_date, category_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.title)
        .bind(unique_slug(&self.title))
        .bind(&self.summary)
        .bind(&self.kind)
        .bind(&self.status)
        .bind(self.published)
        .bind(&self.publication_date)
        .bind(self.category_id)
        .bind(&self.created_at)
        .bind(&self.created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Create a test career posting with default values.
pub fn test_career(title: &str) -> TestCareer {
    TestCareer {
        title: title.to_string(),
        location: None,
        kind: "FULL_TIME".to_string(),
        active: true,
        created_at: now(),
    }
}

/// A career posting fixture.
#[derive(Debug, Clone)]
pub struct TestCareer {
    pub title: String,
    pub location: Option<String>,
    pub kind: String,
    pub active: bool,
    pub created_at: String,
}

impl TestCareer {
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn created(mut self, at: String) -> Self {
        self.created_at = at;
        self
    }

    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO careers (title, location, type, is_active, posted_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.title)
        .bind(&self.location)
        .bind(&self.kind)
        .bind(self.active)
        .bind(&self.created_at)
        .bind(&self.created_at)
        .bind(&self.created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Create a test mail record with default values.
pub fn test_mail(mail_number: &str, subject: &str) -> TestMail {
    TestMail {
        mail_number: mail_number.to_string(),
        subject: subject.to_string(),
        sender: None,
        recipient: None,
        date: "2024-02-01".to_string(),
        kind: "INCOMING".to_string(),
        status: Some("RECEIVED".to_string()),
        category_id: None,
    }
}

/// A mail record fixture.
#[derive(Debug, Clone)]
pub struct TestMail {
    pub mail_number: String,
    pub subject: String,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub date: String,
    pub kind: String,
    pub status: Option<String>,
    pub category_id: Option<i64>,
}

impl TestMail {
    pub fn from_sender(mut self, sender: &str) -> Self {
        self.sender = Some(sender.to_string());
        self
    }

    pub fn dated(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn outgoing(mut self) -> Self {
        self.kind = "OUTGOING".to_string();
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let created = now();
        let result = sqlx::query(
            "INSERT INTO mails (mail_number, subject, sender, recipient, date, type, status, category_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.mail_number)
        .bind(&self.subject)
        .bind(&self.sender)
        .bind(&self.recipient)
        .bind(&self.date)
        .bind(&self.kind)
        .bind(&self.status)
        .bind(self.category_id)
        .bind(&created)
        .bind(&created)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Create a test project with default values.
pub fn test_project(title: &str) -> TestProject {
    TestProject {
        title: title.to_string(),
        status: "ACTIVE".to_string(),
        owner_id: Some("user-001".to_string()),
        deleted: false,
        created_at: now(),
    }
}

/// A project fixture.
#[derive(Debug, Clone)]
pub struct TestProject {
    pub title: String,
    pub status: String,
    pub owner_id: Option<String>,
    pub deleted: bool,
    pub created_at: String,
}

impl TestProject {
    pub fn owned_by(mut self, owner: &str) -> Self {
        self.owner_id = Some(owner.to_string());
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn created(mut self, at: String) -> Self {
        self.created_at = at;
        self
    }

    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO projects (title, status, owner_id, deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.title)
        .bind(&self.status)
        .bind(&self.owner_id)
        .bind(i64::from(self.deleted))
        .bind(&self.created_at)
        .bind(&self.created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Create a test task with default values.
pub fn test_task(title: &str) -> TestTask {
    TestTask {
        title: title.to_string(),
        status: "TODO".to_string(),
        priority: "MEDIUM".to_string(),
        assigned_to: None,
        agent_id: None,
        project_id: None,
        tags: None,
        deleted: false,
        created_at: now(),
    }
}

/// A task fixture.
#[derive(Debug, Clone)]
pub struct TestTask {
    pub title: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub agent_id: Option<String>,
    pub project_id: Option<i64>,
    /// Comma-separated tag list, stored as text.
    pub tags: Option<String>,
    pub deleted: bool,
    pub created_at: String,
}

impl TestTask {
    pub fn in_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn completed(self) -> Self {
        self.with_status("COMPLETED")
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = priority.to_string();
        self
    }

    pub fn assigned_to(mut self, user: &str) -> Self {
        self.assigned_to = Some(user.to_string());
        self
    }

    pub fn with_agent(mut self, agent: &str) -> Self {
        self.agent_id = Some(agent.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = Some(tags.to_string());
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn created(mut self, at: String) -> Self {
        self.created_at = at;
        self
    }

    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tasks (title, status, priority, assigned_to, agent_id, project_id, tags, deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.title)
        .bind(&self.status)
        .bind(&self.priority)
        .bind(&self.assigned_to)
        .bind(&self.agent_id)
        .bind(self.project_id)
        .bind(&self.tags)
        .bind(i64::from(self.deleted))
        .bind(&self.created_at)
        .bind(&self.created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Insert a partner shown at `display_order`.
pub async fn insert_partner(
    pool: &SqlitePool,
    name: &str,
    display_order: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO partners (name, display_order, created_at) VALUES (?, ?, ?)",
    )
    .bind(name)
    .bind(display_order)
    .bind(now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Insert an event/publication category.
pub async fn insert_category(pool: &SqlitePool, name: &str) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO event_categories (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(unique_slug(name))
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Insert a mail category.
pub async fn insert_mail_category(
    pool: &SqlitePool,
    name: &str,
    code: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO mail_categories (name, code) VALUES (?, ?)")
        .bind(name)
        .bind(code)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Insert a tag.
pub async fn insert_tag(pool: &SqlitePool, name: &str) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(unique_slug(name))
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Insert a speaker.
pub async fn insert_speaker(pool: &SqlitePool, name: &str) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO speakers (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Insert an author.
pub async fn insert_author(pool: &SqlitePool, name: &str) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO authors (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Link a speaker to an event.
pub async fn link_speaker(
    pool: &SqlitePool,
    event_id: i64,
    speaker_id: i64,
    role: &str,
    display_order: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_speakers (event_id, speaker_id, role, display_order) VALUES (?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(speaker_id)
    .bind(role)
    .bind(display_order)
    .execute(pool)
    .await?;
    Ok(())
}

/// Link an author to a publication.
pub async fn link_author(
    pool: &SqlitePool,
    publication_id: i64,
    author_id: i64,
    display_order: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO authors_on_publications (publication_id, author_id, display_order) VALUES (?, ?, ?)",
    )
    .bind(publication_id)
    .bind(author_id)
    .bind(display_order)
    .execute(pool)
    .await?;
    Ok(())
}

/// Tag an event.
pub async fn tag_event(pool: &SqlitePool, event_id: i64, tag_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tags_on_events (event_id, tag_id) VALUES (?, ?)")
        .bind(event_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Tag a publication.
pub async fn tag_publication(
    pool: &SqlitePool,
    publication_id: i64,
    tag_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tags_on_publications (publication_id, tag_id) VALUES (?, ?)")
        .bind(publication_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add a member to a project.
pub async fn add_project_member(
    pool: &SqlitePool,
    project_id: i64,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES (?, ?, 'MEMBER')")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Assertion helpers for list responses.
pub mod assert {
    use serde_json::Value;

    /// Assert a JSON object has a key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected key '{}' in JSON: {}",
            key,
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }

    /// Extract a string field from every item, in order.
    pub fn field_values<'a>(items: &'a [Value], field: &str) -> Vec<&'a str> {
        items
            .iter()
            .map(|item| item.get(field).and_then(Value::as_str).unwrap_or(""))
            .collect()
    }

    /// Extract an integer field from every item, in order.
    pub fn int_values(items: &[Value], field: &str) -> Vec<i64> {
        items
            .iter()
            .map(|item| item.get(field).and_then(Value::as_i64).unwrap_or(i64::MIN))
            .collect()
    }

    /// Assert string values are in non-increasing order.
    pub fn descending(values: &[&str]) {
        for pair in values.windows(2) {
            assert!(pair[0] >= pair[1], "Expected descending order, got {values:?}");
        }
    }

    /// Assert string values are in non-decreasing order.
    pub fn ascending(values: &[&str]) {
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1], "Expected ascending order, got {values:?}");
        }
    }
}
