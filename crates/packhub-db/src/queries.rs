use crate::{Database, now_iso};
use anyhow::Result;
use packhub_types::{ListParams, Pack, PackKind, User};
use rusqlite::types::ToSql;
use rusqlite::{OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

const PACK_COLUMNS: &str = "id, name, description, author_id, author_name, version, \
     system_prompt, rules, memos, tags, downloads, published, created_at, updated_at";

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Normalized listing query. Filters are AND-combined; empty-string filters
/// are treated as absent. Pagination is clamped, never rejected.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn from_params(params: &ListParams) -> Self {
        Self {
            search: params.search.clone().filter(|s| !s.is_empty()),
            tag: params.tag.clone().filter(|s| !s.is_empty()),
            author: params.author.clone().filter(|s| !s.is_empty()),
            page: params.page.filter(|&p| p >= 1).unwrap_or(1),
            limit: params
                .limit
                .filter(|&l| l >= 1 && l <= Self::MAX_LIMIT)
                .unwrap_or(Self::DEFAULT_LIMIT),
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::from_params(&ListParams::default())
    }
}

impl Database {
    // -- Users --

    /// Create a user with a freshly minted bearer token. Username uniqueness
    /// is enforced by the UNIQUE constraint.
    pub fn create_user(
        &self,
        username: &str,
        display_name: &str,
    ) -> Result<User, CreateUserError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            token: mint_token(),
            created_at: now_iso(),
        };

        let inserted = self
            .with_conn(|conn| {
                let res = conn.execute(
                    "INSERT INTO users (id, username, display_name, token, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        user.id,
                        user.username,
                        user.display_name,
                        user.token,
                        user.created_at
                    ],
                );
                match res {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .map_err(CreateUserError::Store)?;

        if inserted {
            Ok(user)
        } else {
            Err(CreateUserError::UsernameTaken)
        }
    }

    pub fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, display_name, token, created_at
                 FROM users WHERE token = ?1",
            )?;
            let row = stmt.query_row([token], user_from_row).optional()?;
            Ok(row)
        })
    }

    /// Lookup by id. The token is not returned on this path.
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, display_name, '', created_at
                 FROM users WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], user_from_row).optional()?;
            Ok(row)
        })
    }

    // -- Packs --

    pub fn insert_pack(&self, kind: PackKind, pack: &Pack) -> Result<()> {
        let rules = serde_json::to_string(&pack.rules)?;
        let memos = serde_json::to_string(&pack.memos)?;
        let tags = serde_json::to_string(&pack.tags)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO packs (id, kind, name, description, author_id, author_name,
                                    version, system_prompt, rules, memos, tags,
                                    downloads, published, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    pack.id,
                    kind.as_str(),
                    pack.name,
                    pack.description,
                    pack.author_id,
                    pack.author_name,
                    pack.version,
                    pack.system_prompt,
                    rules,
                    memos,
                    tags,
                    pack.downloads,
                    pack.published as i64,
                    pack.created_at,
                    pack.updated_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_pack(&self, kind: PackKind, id: &str) -> Result<Option<Pack>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {PACK_COLUMNS} FROM packs WHERE kind = ?1 AND id = ?2");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(rusqlite::params![kind.as_str(), id], pack_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// List published packs matching the query. Returns the page slice and
    /// the total match count before pagination.
    ///
    /// Search is a case-insensitive substring match against name, description,
    /// or the denormalized author name. The tag filter matches exact
    /// containment in the serialized tag array, not a substring of a tag.
    pub fn list_packs(&self, kind: PackKind, q: &ListQuery) -> Result<(Vec<Pack>, i64)> {
        self.with_conn(|conn| {
            let mut clauses: Vec<&str> = vec!["kind = ?", "published = 1"];
            let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(kind.as_str().to_string())];

            if let Some(search) = &q.search {
                clauses.push("(name LIKE ? OR description LIKE ? OR author_name LIKE ?)");
                let needle = format!("%{}%", search);
                args.push(Box::new(needle.clone()));
                args.push(Box::new(needle.clone()));
                args.push(Box::new(needle));
            }
            if let Some(tag) = &q.tag {
                clauses.push("tags LIKE ?");
                args.push(Box::new(format!("%\"{}\"%", tag)));
            }
            if let Some(author) = &q.author {
                clauses.push("author_id = ?");
                args.push(Box::new(author.clone()));
            }

            let where_sql = clauses.join(" AND ");

            let refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM packs WHERE {where_sql}"),
                refs.as_slice(),
                |row| row.get(0),
            )?;

            let offset = (q.page as i64 - 1) * q.limit as i64;
            args.push(Box::new(q.limit as i64));
            args.push(Box::new(offset));
            let refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();

            // Secondary key keeps tie ordering stable within one store.
            let sql = format!(
                "SELECT {PACK_COLUMNS} FROM packs WHERE {where_sql}
                 ORDER BY updated_at DESC, id LIMIT ? OFFSET ?"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(refs.as_slice(), pack_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((items, total))
        })
    }

    /// Replace the mutable fields of a pack. Scoped to `author_id`, which is
    /// the real ownership enforcement point; returns the number of rows
    /// touched (0 when the pack is missing or owned by someone else).
    pub fn update_pack(&self, kind: PackKind, pack: &Pack) -> Result<usize> {
        let rules = serde_json::to_string(&pack.rules)?;
        let memos = serde_json::to_string(&pack.memos)?;
        let tags = serde_json::to_string(&pack.tags)?;

        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE packs SET name=?1, description=?2, version=?3, system_prompt=?4,
                                  rules=?5, memos=?6, tags=?7, published=?8, updated_at=?9
                 WHERE id=?10 AND author_id=?11 AND kind=?12",
                rusqlite::params![
                    pack.name,
                    pack.description,
                    pack.version,
                    pack.system_prompt,
                    rules,
                    memos,
                    tags,
                    pack.published as i64,
                    pack.updated_at,
                    pack.id,
                    pack.author_id,
                    kind.as_str()
                ],
            )?;
            Ok(n)
        })
    }

    /// Author-scoped delete; same enforcement shape as [`update_pack`].
    ///
    /// [`update_pack`]: Database::update_pack
    pub fn delete_pack(&self, kind: PackKind, id: &str, author_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM packs WHERE id=?1 AND author_id=?2 AND kind=?3",
                rusqlite::params![id, author_id, kind.as_str()],
            )?;
            Ok(n)
        })
    }

    pub fn increment_downloads(&self, kind: PackKind, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE packs SET downloads = downloads + 1 WHERE id = ?1 AND kind = ?2",
                rusqlite::params![id, kind.as_str()],
            )?;
            Ok(())
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        token: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn pack_from_row(row: &Row<'_>) -> rusqlite::Result<Pack> {
    let rules: String = row.get(7)?;
    let memos: String = row.get(8)?;
    let tags: String = row.get(9)?;
    let published: i64 = row.get(11)?;

    Ok(Pack {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        version: row.get(5)?,
        system_prompt: row.get(6)?,
        // Collections are never null on a read path, even for corrupt rows.
        rules: serde_json::from_str(&rules).unwrap_or_default(),
        memos: serde_json::from_str(&memos).unwrap_or_default(),
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        downloads: row.get(10)?,
        published: published != 0,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn mint_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packhub_types::{Memo, Rule};

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_pack(name: &str, author: &User, updated_at: &str) -> Pack {
        Pack {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            author_id: author.id.clone(),
            author_name: author.display_name.clone(),
            version: "1.0.0".to_string(),
            system_prompt: String::new(),
            rules: vec![],
            memos: vec![],
            tags: vec![],
            downloads: 0,
            published: true,
            created_at: updated_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn query() -> ListQuery {
        ListQuery::default()
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let db = test_db();
        db.create_user("alice", "Alice").unwrap();

        let err = db.create_user("alice", "Alice Again").unwrap_err();
        assert!(matches!(err, CreateUserError::UsernameTaken));

        // Exactly one row survives, reachable by its token.
        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE username = 'alice'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn token_resolves_to_user_and_is_unique_per_user() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();
        let bob = db.create_user("bob", "Bob").unwrap();
        assert_ne!(alice.token, bob.token);

        let found = db.get_user_by_token(&alice.token).unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(db.get_user_by_token("no-such-token").unwrap().is_none());

        // The by-id path never exposes the token.
        let by_id = db.get_user_by_id(&alice.id).unwrap().unwrap();
        assert!(by_id.token.is_empty());
    }

    #[test]
    fn collections_round_trip() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();

        let mut pack = new_pack("focus", &alice, "2025-01-01T00:00:00");
        pack.rules = vec![Rule {
            title: "T".to_string(),
            update_rule: "U".to_string(),
        }];
        pack.memos = vec![Memo {
            title: "m".to_string(),
            content: "c".to_string(),
        }];
        pack.tags = vec!["x".to_string(), "y".to_string()];
        db.insert_pack(PackKind::Rule, &pack).unwrap();

        let got = db.get_pack(PackKind::Rule, &pack.id).unwrap().unwrap();
        assert_eq!(got, pack);
        assert_eq!(got.downloads, 0);
        assert!(got.published);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice Wonder").unwrap();

        let by_name = new_pack("Productivity Boost", &alice, "2025-01-01T00:00:01");
        let mut by_desc = new_pack("other", &alice, "2025-01-01T00:00:02");
        by_desc.description = "boost your flow".to_string();
        let by_author = new_pack("third", &alice, "2025-01-01T00:00:03");
        for p in [&by_name, &by_desc, &by_author] {
            db.insert_pack(PackKind::Rule, p).unwrap();
        }

        let mut q = query();
        q.search = Some("BOOST".to_string());
        let (items, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert_eq!(total, 2);
        let names: Vec<&str> = items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["other", "Productivity Boost"]);

        q.search = Some("wonder".to_string());
        let (_, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert_eq!(total, 3, "author display name matches every pack");
    }

    #[test]
    fn tag_filter_is_containment_not_substring() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();

        let mut tagged = new_pack("a", &alice, "2025-01-01T00:00:01");
        tagged.tags = vec!["rust".to_string()];
        let mut near_miss = new_pack("b", &alice, "2025-01-01T00:00:02");
        near_miss.tags = vec!["rustacean".to_string()];
        db.insert_pack(PackKind::Rule, &tagged).unwrap();
        db.insert_pack(PackKind::Rule, &near_miss).unwrap();

        let mut q = query();
        q.tag = Some("rust".to_string());
        let (items, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, tagged.id);
    }

    #[test]
    fn filters_combine_with_and_over_published_rows() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();
        let bob = db.create_user("bob", "Bob").unwrap();

        let mut hit = new_pack("alpha kit", &alice, "2025-01-01T00:00:01");
        hit.tags = vec!["x".to_string()];
        let mut wrong_author = new_pack("alpha kit", &bob, "2025-01-01T00:00:02");
        wrong_author.tags = vec!["x".to_string()];
        let mut wrong_tag = new_pack("alpha kit", &alice, "2025-01-01T00:00:03");
        wrong_tag.tags = vec!["y".to_string()];
        for p in [&hit, &wrong_author, &wrong_tag] {
            db.insert_pack(PackKind::Rule, p).unwrap();
        }

        let mut q = query();
        q.search = Some("alpha".to_string());
        q.tag = Some("x".to_string());
        q.author = Some(alice.id.clone());
        let (items, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, hit.id);
        assert!(items.iter().all(|p| p.published));
    }

    #[test]
    fn pagination_window_and_total() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();
        for i in 0..25 {
            let p = new_pack(
                &format!("pack-{i:02}"),
                &alice,
                &format!("2025-01-01T00:00:{:02}", 25 - i),
            );
            db.insert_pack(PackKind::Rule, &p).unwrap();
        }

        let mut q = query();
        q.limit = 20;
        q.page = 2;
        let (items, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert_eq!(total, 25);
        assert_eq!(items.len(), 5);
        // Most-recently-updated first: page 2 holds the 5 oldest.
        let names: Vec<&str> = items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["pack-20", "pack-21", "pack-22", "pack-23", "pack-24"]
        );

        q.page = 9;
        let (items, total) = db.list_packs(PackKind::Rule, &q).unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 25);
    }

    #[test]
    fn list_params_are_clamped() {
        let q = ListQuery::from_params(&ListParams {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        });
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, ListQuery::DEFAULT_LIMIT);

        let q = ListQuery::from_params(&ListParams {
            search: Some(String::new()),
            ..Default::default()
        });
        assert!(q.search.is_none(), "empty search means no filter");
    }

    #[test]
    fn kinds_are_isolated() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();

        let rule_pack = new_pack("r", &alice, "2025-01-01T00:00:01");
        let memo_pack = new_pack("m", &alice, "2025-01-01T00:00:02");
        db.insert_pack(PackKind::Rule, &rule_pack).unwrap();
        db.insert_pack(PackKind::Memo, &memo_pack).unwrap();

        let (items, total) = db.list_packs(PackKind::Rule, &query()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, rule_pack.id);

        assert!(db.get_pack(PackKind::Rule, &memo_pack.id).unwrap().is_none());
        assert!(db.get_pack(PackKind::Memo, &memo_pack.id).unwrap().is_some());
    }

    #[test]
    fn update_and_delete_are_scoped_to_the_owner() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();
        let bob = db.create_user("bob", "Bob").unwrap();

        let pack = new_pack("mine", &alice, "2025-01-01T00:00:01");
        db.insert_pack(PackKind::Rule, &pack).unwrap();

        let mut stolen = pack.clone();
        stolen.name = "hijacked".to_string();
        stolen.author_id = bob.id.clone();
        assert_eq!(db.update_pack(PackKind::Rule, &stolen).unwrap(), 0);
        assert_eq!(db.delete_pack(PackKind::Rule, &pack.id, &bob.id).unwrap(), 0);

        let unchanged = db.get_pack(PackKind::Rule, &pack.id).unwrap().unwrap();
        assert_eq!(unchanged.name, "mine");

        let mut mine = pack.clone();
        mine.name = "renamed".to_string();
        mine.updated_at = "2025-01-02T00:00:00".to_string();
        assert_eq!(db.update_pack(PackKind::Rule, &mine).unwrap(), 1);
        let got = db.get_pack(PackKind::Rule, &pack.id).unwrap().unwrap();
        assert_eq!(got.name, "renamed");
        assert_eq!(got.updated_at, "2025-01-02T00:00:00");

        assert_eq!(db.delete_pack(PackKind::Rule, &pack.id, &alice.id).unwrap(), 1);
        assert!(db.get_pack(PackKind::Rule, &pack.id).unwrap().is_none());
    }

    #[test]
    fn downloads_increment_monotonically() {
        let db = test_db();
        let alice = db.create_user("alice", "Alice").unwrap();
        let pack = new_pack("p", &alice, "2025-01-01T00:00:01");
        db.insert_pack(PackKind::Rule, &pack).unwrap();

        for expected in 1..=3 {
            db.increment_downloads(PackKind::Rule, &pack.id).unwrap();
            let got = db.get_pack(PackKind::Rule, &pack.id).unwrap().unwrap();
            assert_eq!(got.downloads, expected);
        }
    }
}
