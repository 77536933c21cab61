//! Post lifecycle: create, list, retrieve (counting unique views), update
//! and delete.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use validator::Validate;

use agora_shared::constants::{MSG_POST_CREATED, MSG_POST_NOT_FOUND};
use agora_shared::page::limit_offset;
use agora_shared::post::{CreatePostRequest, PostListQuery, PostResponse, UpdatePostRequest};
use agora_shared::validation::normalize_tags;
use agora_shared::{MessageResponse, Page, PageQuery, PostRef};
use agora_store::{Database, NewPost, Post, PostChanges, PostFilter, StoreError, User};

use super::{load_post, parse_post_ref};
use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::client_ip::ClientIp;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, Query, ValidJson};

pub fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        pkid: post.pkid,
        author: post.author_username,
        author_id: post.author_id,
        title: post.title,
        body: post.body,
        image: post.image,
        tags: post.tags,
        views: post.views,
        average_rating: post.average_rating,
        num_ratings: post.num_ratings,
        num_comments: post.num_comments,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Create a post. The author defaults to the requester; naming someone else
/// requires a superuser.
pub fn create_post(db: &Database, requester: &User, req: CreatePostRequest) -> Result<Post, ApiError> {
    let author_id = match req.author {
        Some(author) if author != requester.id => {
            if !requester.is_superuser {
                return Err(ApiError::forbidden(
                    "You do not have permission to create posts for another user.",
                ));
            }
            match db.get_user(author) {
                Ok(user) => user.id,
                Err(StoreError::NotFound) => {
                    return Err(ApiError::invalid_field(
                        "author",
                        format!("Invalid pk \"{author}\" - object does not exist."),
                    ))
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ => requester.id,
    };

    let post = db.create_post(&NewPost {
        author_id,
        title: req.title.trim().to_string(),
        body: req.body,
        image: req.image,
        tags: normalize_tags(&req.tags),
    })?;

    info!(post = %post.id, pkid = post.pkid, title = %post.title, author = %post.author_username, "post created");
    Ok(post)
}

pub fn list_posts(
    db: &Database,
    config: &ServerConfig,
    query: PostListQuery,
) -> Result<Page<PostResponse>, ApiError> {
    let (page, size) = PageQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve(config.page_size, config.max_page_size);
    let (limit, offset) = limit_offset(page, size);

    let filter = PostFilter {
        author: query.author,
        title: query.title,
        tag: query.tag.map(|t| t.trim().to_lowercase()),
        ordering: query.ordering,
    };
    let (posts, count) = db.list_posts(&filter, limit, offset)?;
    Ok(Page::new(posts, count, page, size).map(post_response))
}

/// Fetch a post and count the view if this client has not viewed it before.
pub fn retrieve_post(db: &Database, post: PostRef, client: &ClientIp) -> Result<Post, ApiError> {
    let post = load_post(db, post)?;
    if db.record_post_view(post.pkid, &client.key())? {
        tracing::debug!(post = post.pkid, ip = %client, "new view recorded");
        return Ok(db.get_post_by_pkid(post.pkid)?);
    }
    Ok(post)
}

/// Author-only partial update. Existence and ownership are checked before
/// the payload is validated.
pub fn update_post(
    db: &Database,
    requester: &User,
    post: PostRef,
    req: UpdatePostRequest,
) -> Result<Post, ApiError> {
    let post = load_post(db, post)?;
    if post.author_id != requester.id {
        return Err(ApiError::forbidden(
            "You can't update or edit a post that does not belong to you",
        ));
    }
    req.validate()?;

    let changes = PostChanges {
        title: req.title.map(|t| t.trim().to_string()),
        body: req.body,
        image: req.image,
        tags: req.tags.as_deref().map(normalize_tags),
    };
    let updated = db.update_post(post.pkid, &changes)?;
    info!(post = %updated.id, pkid = updated.pkid, "post updated");
    Ok(updated)
}

/// Delete a post. Permitted to the author or a superuser.
pub fn delete_post(db: &Database, requester: &User, post: PostRef) -> Result<(), ApiError> {
    let post = load_post(db, post)?;
    if post.author_id != requester.id && !requester.is_superuser {
        return Err(ApiError::forbidden(
            "You do not have permission to perform this action.",
        ));
    }
    if !db.delete_post(post.pkid)? {
        return Err(ApiError::not_found(MSG_POST_NOT_FOUND));
    }
    info!(post = %post.id, pkid = post.pkid, by = %requester.username, "post deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let db = state.db()?;
    create_post(&db, &user, req)?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(MSG_POST_CREATED))))
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Page<PostResponse>>, ApiError> {
    let db = state.db()?;
    Ok(Json(list_posts(&db, &state.config, query)?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _user: CurrentUser,
    client: ClientIp,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    Ok(Json(post_response(retrieve_post(&db, post, &client)?)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdatePostRequest>,
) -> Result<StatusCode, ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    update_post(&db, &user, post, req)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    delete_post(&db, &user, post)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use agora_store::NewUser;
    use std::net::IpAddr;

    pub(crate) fn user(db: &Database, name: &str, superuser: bool) -> User {
        db.create_user(&NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            password_hash: "$argon2id$unused".to_string(),
            is_superuser: superuser,
        })
        .unwrap()
    }

    pub(crate) fn request(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            author: None,
            title: title.to_string(),
            body: "B".to_string(),
            image: "/media/x.png".to_string(),
            tags: vec![" Rust ".to_string(), "rust".to_string(), "web".to_string()],
        }
    }

    fn ip(s: &str) -> ClientIp {
        ClientIp(Some(s.parse::<IpAddr>().unwrap()))
    }

    #[test]
    fn create_defaults_author_and_normalizes_tags() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        let post = create_post(&db, &alice, request("T")).unwrap();
        assert_eq!(post.author_id, alice.id);
        assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(post.views, 0);
    }

    #[test]
    fn create_for_another_author_needs_superuser() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        let bob = user(&db, "bob", false);
        let admin = user(&db, "admin", true);

        let mut req = request("T");
        req.author = Some(bob.id);
        assert!(matches!(
            create_post(&db, &alice, req.clone()),
            Err(ApiError::PermissionDenied(_))
        ));
        assert_eq!(create_post(&db, &admin, req).unwrap().author_id, bob.id);

        let mut ghost = request("T");
        ghost.author = Some(uuid::Uuid::new_v4());
        assert!(matches!(
            create_post(&db, &admin, ghost),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn views_count_once_per_ip() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        let post = create_post(&db, &alice, request("T")).unwrap();
        let by_id = PostRef::Id(post.id);

        assert_eq!(retrieve_post(&db, by_id, &ip("10.0.0.1")).unwrap().views, 1);
        assert_eq!(retrieve_post(&db, by_id, &ip("10.0.0.1")).unwrap().views, 1);
        assert_eq!(
            retrieve_post(&db, PostRef::Pkid(post.pkid), &ip("10.0.0.2")).unwrap().views,
            2
        );
        assert_eq!(retrieve_post(&db, by_id, &ClientIp(None)).unwrap().views, 3);
        assert_eq!(retrieve_post(&db, by_id, &ClientIp(None)).unwrap().views, 3);
    }

    #[test]
    fn retrieve_missing_post_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = retrieve_post(&db, PostRef::Pkid(42), &ip("10.0.0.1")).unwrap_err();
        assert_eq!(err.to_string(), MSG_POST_NOT_FOUND);
    }

    #[test]
    fn update_is_author_only_and_checks_ownership_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        let bob = user(&db, "bob", false);
        let post = create_post(&db, &alice, request("T")).unwrap();

        let invalid = UpdatePostRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            update_post(&db, &bob, PostRef::Pkid(post.pkid), invalid.clone()),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            update_post(&db, &alice, PostRef::Pkid(post.pkid), invalid),
            Err(ApiError::Validation { .. })
        ));

        let updated = update_post(
            &db,
            &alice,
            PostRef::Pkid(post.pkid),
            UpdatePostRequest {
                title: Some("New".into()),
                tags: Some(vec!["Go".into()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.body, "B");
        assert_eq!(updated.tags, vec!["go".to_string()]);
    }

    #[test]
    fn delete_by_author_or_superuser() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        let bob = user(&db, "bob", false);
        let admin = user(&db, "admin", true);
        let first = create_post(&db, &alice, request("one")).unwrap();
        let second = create_post(&db, &alice, request("two")).unwrap();

        assert!(matches!(
            delete_post(&db, &bob, PostRef::Pkid(first.pkid)),
            Err(ApiError::PermissionDenied(_))
        ));
        delete_post(&db, &alice, PostRef::Pkid(first.pkid)).unwrap();
        delete_post(&db, &admin, PostRef::Id(second.id)).unwrap();
        assert!(matches!(
            delete_post(&db, &alice, PostRef::Pkid(first.pkid)),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn list_filters_and_paginates() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice", false);
        for i in 0..3 {
            create_post(&db, &alice, request(&format!("Post {i}"))).unwrap();
        }
        let config = ServerConfig::default();

        let page = list_posts(
            &db,
            &config,
            PostListQuery {
                page_size: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.next, Some(2));
        assert_eq!(page.results[0].title, "Post 2");

        let tagged = list_posts(
            &db,
            &config,
            PostListQuery {
                tag: Some("RUST".into()),
                title: Some("post 1".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tagged.count, 1);
        assert_eq!(tagged.results[0].author, "alice");
    }
}
