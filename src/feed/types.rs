use serde::{Deserialize, Deserializer};

/// Top-level payload of one review feed page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReviewFeed {
    pub feed: Feed,
}

/// Feed metadata and the review entries of one page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub author: Author,
    #[serde(deserialize_with = "one_or_many")]
    pub entry: Vec<Entry>,
    pub icon: Label,
    pub id: Label,
    #[serde(deserialize_with = "one_or_many")]
    pub link: Vec<Link>,
    pub rights: Label,
    pub title: Label,
    pub updated: Label,
}

/// A single customer review
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub author: Author,
    pub content: Content,
    pub id: Label,
    #[serde(rename = "im:contentType")]
    pub im_content_type: Link,
    #[serde(rename = "im:rating")]
    pub im_rating: Label,
    #[serde(rename = "im:version")]
    pub im_version: Label,
    #[serde(rename = "im:voteCount")]
    pub im_vote_count: Label,
    #[serde(rename = "im:voteSum")]
    pub im_vote_sum: Label,
    pub link: Link,
    pub title: Label,
    pub updated: Label,
}

/// Review or feed author
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Author {
    pub label: String,
    pub name: Label,
    pub uri: Label,
}

/// Review body with its content attributes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Content {
    pub attributes: Attributes,
    pub label: String,
}

/// Leaf value wrapper, serialized as `{"label": "..."}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Label {
    pub label: String,
}

impl Label {
    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Attribute-only value such as a link or a content type
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Link {
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub href: String,
    pub rel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub term: String,
    pub label: String,
}

/// The feed collapses one-element lists into a bare object
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}
