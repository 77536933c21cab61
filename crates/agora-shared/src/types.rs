use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to a post as it appears in a URL: either the integer primary
/// key or the public UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostRef {
    Pkid(i64),
    Id(Uuid),
}

impl FromStr for PostRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(pkid) = s.parse::<i64>() {
            return Ok(PostRef::Pkid(pkid));
        }
        Uuid::parse_str(s)
            .map(PostRef::Id)
            .map_err(|_| format!("invalid post identifier: {s}"))
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostRef::Pkid(pkid) => write!(f, "{pkid}"),
            PostRef::Id(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Sort order accepted by the post list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostOrdering {
    #[serde(rename = "created_at")]
    CreatedAsc,
    #[default]
    #[serde(rename = "-created_at")]
    CreatedDesc,
    #[serde(rename = "views")]
    ViewsAsc,
    #[serde(rename = "-views")]
    ViewsDesc,
    #[serde(rename = "title")]
    TitleAsc,
    #[serde(rename = "-title")]
    TitleDesc,
}

impl PostOrdering {
    /// SQL `ORDER BY` clause body for this ordering.
    pub fn sql(&self) -> &'static str {
        match self {
            PostOrdering::CreatedAsc => "p.created_at ASC, p.pkid ASC",
            PostOrdering::CreatedDesc => "p.created_at DESC, p.pkid DESC",
            PostOrdering::ViewsAsc => "p.views ASC, p.pkid ASC",
            PostOrdering::ViewsDesc => "p.views DESC, p.pkid DESC",
            PostOrdering::TitleAsc => "p.title COLLATE NOCASE ASC, p.pkid ASC",
            PostOrdering::TitleDesc => "p.title COLLATE NOCASE DESC, p.pkid DESC",
        }
    }
}

/// Plain confirmation body, e.g. `{"message": "Rating has been added"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_ref_parses_pkid_and_uuid() {
        assert_eq!("42".parse::<PostRef>().unwrap(), PostRef::Pkid(42));

        let id = Uuid::new_v4();
        assert_eq!(id.to_string().parse::<PostRef>().unwrap(), PostRef::Id(id));

        assert!("not-a-post".parse::<PostRef>().is_err());
    }

    #[test]
    fn ordering_deserializes_from_query_values() {
        let o: PostOrdering = serde_json::from_str("\"-views\"").unwrap();
        assert_eq!(o, PostOrdering::ViewsDesc);
        assert_eq!(PostOrdering::default(), PostOrdering::CreatedDesc);
        assert!(serde_json::from_str::<PostOrdering>("\"pkid\"").is_err());
    }

    #[test]
    fn gender_round_trips_through_str() {
        for g in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(g.as_str().parse::<Gender>().unwrap(), g);
        }
    }
}
