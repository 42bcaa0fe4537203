use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::json;
use uuid::Uuid;

use packhub_db::{ListQuery, now_iso};
use packhub_types::{ListParams, Pack, PackKind, PackList, PublishPackRequest};

use crate::auth::AuthUser;
use crate::{ApiError, AppState, with_db};

/// GET /api/{kind}-packs — public listing with search/tag/author filters.
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    Query(params): Query<ListParams>,
) -> Result<Json<PackList>, ApiError> {
    let q = ListQuery::from_params(&params);
    let (page, limit) = (q.page, q.limit);

    let (items, total) = with_db(&state, move |db| db.list_packs(kind, &q)).await?;

    Ok(Json(PackList {
        items,
        total,
        page,
        limit,
    }))
}

/// GET /api/{kind}-packs/{id} — public fetch.
pub async fn get_one(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    Path(id): Path<String>,
) -> Result<Json<Pack>, ApiError> {
    let pack = with_db(&state, move |db| db.get_pack(kind, &id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(pack))
}

/// GET /api/{kind}-packs/{id}/download — bump the counter and return the
/// pack with the incremented count. The read and the increment are separate
/// statements; a concurrent download may under-count but never corrupts.
pub async fn download(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    Path(id): Path<String>,
) -> Result<Json<Pack>, ApiError> {
    let mut pack = with_db(&state, move |db| {
        let pack = db.get_pack(kind, &id)?;
        if pack.is_some() {
            db.increment_downloads(kind, &id)?;
        }
        Ok(pack)
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    pack.downloads += 1;
    Ok(Json(pack))
}

/// POST /api/{kind}-packs — publish a new pack under the caller's identity.
pub async fn publish(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    AuthUser(user): AuthUser,
    body: Result<Json<PublishPackRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Pack>), ApiError> {
    let Json(req) = body.map_err(|_| ApiError::Validation("invalid JSON".into()))?;

    if req.name.is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }

    let now = now_iso();
    let pack = Pack {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        author_id: user.id,
        author_name: user.display_name,
        version: if req.version.is_empty() {
            "1.0.0".to_string()
        } else {
            req.version
        },
        system_prompt: req.system_prompt,
        rules: req.rules,
        memos: req.memos,
        tags: req.tags,
        downloads: 0,
        published: true,
        created_at: now.clone(),
        updated_at: now,
    };

    let stored = pack.clone();
    with_db(&state, move |db| db.insert_pack(kind, &stored)).await?;

    Ok((StatusCode::CREATED, Json(pack)))
}

/// PUT /api/{kind}-packs/{id} — full replace of the mutable fields.
/// Check order: exists (404), owned by caller (403), then mutate.
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<PublishPackRequest>, JsonRejection>,
) -> Result<Json<Pack>, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::Validation("invalid JSON".into()))?;

    let pack = with_db(&state, move |db| {
        let Some(existing) = db.get_pack(kind, &id)? else {
            return Ok(Err(ApiError::NotFound));
        };
        if existing.author_id != user.id {
            return Ok(Err(ApiError::Forbidden));
        }

        let mut pack = existing;
        pack.name = req.name;
        pack.description = req.description;
        pack.version = req.version;
        pack.system_prompt = req.system_prompt;
        pack.rules = req.rules;
        pack.memos = req.memos;
        pack.tags = req.tags;
        pack.updated_at = now_iso();

        db.update_pack(kind, &pack)?;
        Ok(Ok(pack))
    })
    .await??;

    Ok(Json(pack))
}

/// DELETE /api/{kind}-packs/{id} — owner-only delete.
pub async fn remove(
    State(state): State<AppState>,
    Extension(kind): Extension<PackKind>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    with_db(&state, move |db| {
        let Some(existing) = db.get_pack(kind, &id)? else {
            return Ok(Err(ApiError::NotFound));
        };
        if existing.author_id != user.id {
            return Ok(Err(ApiError::Forbidden));
        }
        db.delete_pack(kind, &id, &user.id)?;
        Ok(Ok(()))
    })
    .await??;

    Ok(Json(json!({ "status": "deleted" })))
}
