use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use validator::Validate;

use agora_shared::constants::{MAX_RATING, MIN_RATING, MSG_RATING_ADDED, MSG_ZERO_RATING};
use agora_shared::engagement::RatingRequest;
use agora_shared::{ErrorCode, MessageResponse, PostRef};
use agora_store::{Database, Rating, User};

use super::{load_post, parse_post_ref};
use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path};

fn already_rated() -> ApiError {
    ApiError::Conflict(
        ErrorCode::AlreadyRated,
        "You have already rated this post".to_string(),
    )
}

/// Record `requester`'s rating of a post.
///
/// Checks run in a fixed order: the post exists, the requester is not its
/// author, the requester has not rated it yet, then the value itself. The
/// unique `(post, rated_by)` index has the final say on duplicates.
pub fn rate_post(
    db: &Database,
    requester: &User,
    post: PostRef,
    req: RatingRequest,
) -> Result<Rating, ApiError> {
    let post = load_post(db, post)?;

    if post.author_id == requester.id {
        return Err(ApiError::Conflict(
            ErrorCode::CannotRateOwnPost,
            "You can't rate your own post".to_string(),
        ));
    }
    if db.has_rated(post.pkid, requester.id)? {
        return Err(already_rated());
    }
    let value = req
        .value
        .ok_or_else(|| ApiError::invalid_field("value", "This field is required."))?;
    if value == 0 {
        return Err(ApiError::invalid_field("value", MSG_ZERO_RATING));
    }
    if !RatingRequest::value_in_range(value) {
        return Err(ApiError::invalid_field(
            "value",
            format!("Ensure this value is between {MIN_RATING} and {MAX_RATING}."),
        ));
    }
    req.validate()?;

    let rating = db
        .insert_rating(post.pkid, requester.id, value, req.review.trim())?
        .ok_or_else(already_rated)?;

    info!(post = %post.id, rated_by = %requester.username, value = rating.value, "rating added");
    Ok(rating)
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RatingRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let post = parse_post_ref(&id)?;
    let db = state.db()?;
    rate_post(&db, &user, post, req)?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(MSG_RATING_ADDED))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::posts::create_post;
    use crate::handlers::posts::tests::{request, user};

    fn rating(value: i64) -> RatingRequest {
        RatingRequest {
            value: Some(value),
            review: "nice".to_string(),
        }
    }

    fn setup() -> (Database, User, User, PostRef) {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author", false);
        let reader = user(&db, "reader", false);
        let post = create_post(&db, &author, request("T")).unwrap();
        (db, author, reader, PostRef::Pkid(post.pkid))
    }

    #[test]
    fn second_rating_is_a_conflict() {
        let (db, _author, reader, post) = setup();
        rate_post(&db, &reader, post, rating(4)).unwrap();

        let err = rate_post(&db, &reader, post, rating(2)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyRated);

        let PostRef::Pkid(pkid) = post else { unreachable!() };
        let rows = db.list_ratings_for_post(pkid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 4);
    }

    #[test]
    fn own_post_cannot_be_rated() {
        let (db, author, _reader, post) = setup();
        let err = rate_post(&db, &author, post, rating(5)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotRateOwnPost);
        let PostRef::Pkid(pkid) = post else { unreachable!() };
        assert!(db.list_ratings_for_post(pkid).unwrap().is_empty());
    }

    #[test]
    fn zero_rating_is_a_validation_error() {
        let (db, _author, reader, post) = setup();
        let err = rate_post(&db, &reader, post, rating(0)).unwrap_err();
        let body = err.body();
        assert_eq!(body.status_code, 400);
        assert_eq!(body.message, MSG_ZERO_RATING);
    }

    #[test]
    fn self_rating_is_reported_before_zero_value() {
        let (db, author, _reader, post) = setup();
        let err = rate_post(&db, &author, post, rating(0)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotRateOwnPost);
    }

    #[test]
    fn out_of_range_and_missing_post() {
        let (db, _author, reader, post) = setup();
        assert!(matches!(
            rate_post(&db, &reader, post, rating(6)),
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            rate_post(&db, &reader, PostRef::Pkid(999), rating(3)),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn missing_value_is_checked_after_post_rules() {
        let (db, author, reader, post) = setup();
        let blank = || RatingRequest {
            value: None,
            review: "x".to_string(),
        };

        let err = rate_post(&db, &reader, PostRef::Pkid(999), blank()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = rate_post(&db, &author, post, blank()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotRateOwnPost);

        let err = rate_post(&db, &reader, post, blank()).unwrap_err();
        assert_eq!(err.body().errors.unwrap()["value"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn rating_updates_post_aggregates() {
        let (db, _author, reader, post) = setup();
        let other = user(&db, "other", false);
        rate_post(&db, &reader, post, rating(4)).unwrap();
        rate_post(&db, &other, post, rating(2)).unwrap();

        let post = db.get_post(post).unwrap();
        assert_eq!(post.num_ratings, 2);
        assert!((post.average_rating - 3.0).abs() < f64::EPSILON);
    }
}
