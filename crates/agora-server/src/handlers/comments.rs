use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use agora_shared::constants::MSG_COMMENT_DELETED;
use agora_shared::engagement::{CommentList, CommentRequest, CommentResponse, UpdateCommentRequest};
use agora_shared::{MessageResponse, PostRef};
use agora_store::{Comment, Database, StoreError, User};

use super::{load_post, parse_post_ref};
use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, ValidJson};

pub fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post: comment.post_id,
        author: comment.author_id,
        author_username: comment.author_username,
        body: comment.body,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

/// Whether only a comment's author (or a superuser) may change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Open,
    Enforced,
}

impl Ownership {
    pub fn from_flag(enforce: bool) -> Self {
        if enforce {
            Ownership::Enforced
        } else {
            Ownership::Open
        }
    }
}

fn load_comment(db: &Database, id: Uuid) -> Result<Comment, ApiError> {
    match db.get_comment(id) {
        Ok(comment) => Ok(comment),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Comment not found.")),
        Err(e) => Err(e.into()),
    }
}

fn check_owner(comment: &Comment, requester: &User, ownership: Ownership) -> Result<(), ApiError> {
    if ownership == Ownership::Enforced
        && comment.author_id != requester.id
        && !requester.is_superuser
    {
        return Err(ApiError::forbidden(
            "You do not have permission to modify this comment.",
        ));
    }
    Ok(())
}

/// All comments on a post. A post without comments yields an empty list.
pub fn list_comments(db: &Database, post: PostRef) -> Result<CommentList, ApiError> {
    let post = load_post(db, post)?;
    let comments: Vec<CommentResponse> = db
        .list_comments_for_post(post.pkid)?
        .into_iter()
        .map(comment_response)
        .collect();
    Ok(CommentList {
        num_comments: comments.len(),
        comments,
    })
}

/// The post and author come from the path and the token, never the body.
pub fn create_comment(
    db: &Database,
    requester: &User,
    post: PostRef,
    req: CommentRequest,
) -> Result<Comment, ApiError> {
    let post = load_post(db, post)?;
    let comment = db.create_comment(post.pkid, requester.id, req.body.trim())?;
    info!(post = %post.id, comment = %comment.id, author = %requester.username, "comment created");
    Ok(comment)
}

/// Existence and ownership are checked before the payload is validated.
pub fn update_comment(
    db: &Database,
    requester: &User,
    id: Uuid,
    req: UpdateCommentRequest,
    ownership: Ownership,
) -> Result<Comment, ApiError> {
    let comment = load_comment(db, id)?;
    check_owner(&comment, requester, ownership)?;
    req.validate()?;
    let body = req.body.as_deref().map(str::trim);
    Ok(db.update_comment(comment.id, body)?)
}

pub fn delete_comment(
    db: &Database,
    requester: &User,
    id: Uuid,
    ownership: Ownership,
) -> Result<(), ApiError> {
    let comment = load_comment(db, id)?;
    check_owner(&comment, requester, ownership)?;
    if !db.delete_comment(comment.id)? {
        return Err(ApiError::not_found("Comment not found."));
    }
    info!(comment = %comment.id, by = %requester.username, "comment deleted");
    Ok(())
}

fn parse_comment_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Comment not found."))
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CommentList>, ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    Ok(Json(list_comments(&db, post)?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    let comment = create_comment(&db, &user, post, req)?;
    Ok((StatusCode::CREATED, Json(comment_response(comment))))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let id = parse_comment_id(&id)?;
    let ownership = Ownership::from_flag(state.config.enforce_comment_ownership);
    let db = state.db()?;
    let comment = update_comment(&db, &user, id, req, ownership)?;
    Ok(Json(comment_response(comment)))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_comment_id(&id)?;
    let ownership = Ownership::from_flag(state.config.enforce_comment_ownership);
    let db = state.db()?;
    delete_comment(&db, &user, id, ownership)?;
    Ok(Json(MessageResponse::new(MSG_COMMENT_DELETED)))
}
