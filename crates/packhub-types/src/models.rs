use serde::{Deserialize, Serialize};

/// Which collection a pack belongs to. Rule packs and memo packs share one
/// shape but are listed, fetched, and counted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    Rule,
    Memo,
}

impl PackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PackKind::Rule => "rule",
            PackKind::Memo => "memo",
        }
    }

    /// URL collection segment, e.g. `rule-packs` in `/api/rule-packs`.
    pub fn collection(self) -> &'static str {
        match self {
            PackKind::Rule => "rule-packs",
            PackKind::Memo => "memo-packs",
        }
    }
}

/// A single rule within a pack: how an associated memory item is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub title: String,
    pub update_rule: String,
}

/// A free-text note bundled in a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub title: String,
    pub content: String,
}

/// A named, versioned, taggable bundle of rules and memos.
///
/// `author_name` is the author's display name captured at publish time; it
/// does not track later renames. Timestamps are second-precision UTC strings
/// (`%Y-%m-%dT%H:%M:%S`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub id: String,
    pub name: String,
    pub description: String,
    pub author_id: String,
    pub author_name: String,
    pub version: String,
    pub system_prompt: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub memos: Vec<Memo>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub downloads: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A registered publisher. The bearer token is the sole credential; it is
/// minted once at registration and omitted from responses that did not
/// resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    pub created_at: String,
}

/// Identity of one backend node; each node is one channel on the client side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
