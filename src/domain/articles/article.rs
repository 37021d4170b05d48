use serde::{Deserialize, Serialize};

/// Characters kept when an article is reduced to its abstract.
pub const ABSTRACT_CHARS: usize = 128;

/// Lifecycle state shared by drafts and published snapshots.
///
/// `Unknown` is the zero value and is never assigned on purpose: a request
/// that omits the status must not be read as a meaningful state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ArticleStatus {
    #[default]
    Unknown,
    Unpublished,
    Published,
    Private,
}

impl ArticleStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            ArticleStatus::Unknown => 0,
            ArticleStatus::Unpublished => 1,
            ArticleStatus::Published => 2,
            ArticleStatus::Private => 3,
        }
    }

    pub fn as_i16(self) -> i16 {
        self.as_u8() as i16
    }

    pub fn from_i16(v: i16) -> Self {
        u8::try_from(v).map(Self::from).unwrap_or_default()
    }

    /// No transition is defined into `Unknown`.
    pub fn is_assignable(self) -> bool {
        !matches!(self, ArticleStatus::Unknown)
    }

    pub fn is_published(self) -> bool {
        matches!(self, ArticleStatus::Published)
    }

    /// Statuses a draft must currently hold for `SyncStatus` to move it to
    /// `self`. Withdrawal (`Published -> Private`) is the only such move;
    /// saving and publishing go through their own paths.
    pub fn sync_status_sources(self) -> &'static [ArticleStatus] {
        match self {
            ArticleStatus::Private => &[ArticleStatus::Published],
            _ => &[],
        }
    }

    pub fn can_transition_to(self, target: ArticleStatus) -> bool {
        target.sync_status_sources().contains(&self)
    }
}

impl From<u8> for ArticleStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => ArticleStatus::Unpublished,
            2 => ArticleStatus::Published,
            3 => ArticleStatus::Private,
            _ => ArticleStatus::Unknown,
        }
    }
}

impl From<ArticleStatus> for u8 {
    fn from(s: ArticleStatus) -> Self {
        s.as_u8()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub status: ArticleStatus,
    /// Millisecond epoch, assigned by the store.
    pub create_time: i64,
    /// Millisecond epoch, assigned by the store.
    pub update_time: i64,
}

impl Article {
    pub fn new_draft(author_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Leading `ABSTRACT_CHARS` characters of the content, cut on a char boundary.
    pub fn summary(&self) -> &str {
        match self.content.char_indices().nth(ABSTRACT_CHARS) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }

    /// Copy of the article whose content is replaced by its abstract.
    pub fn abstracted(&self) -> Article {
        Article {
            content: self.summary().to_string(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_codes() {
        for s in [
            ArticleStatus::Unknown,
            ArticleStatus::Unpublished,
            ArticleStatus::Published,
            ArticleStatus::Private,
        ] {
            assert_eq!(ArticleStatus::from_i16(s.as_i16()), s);
        }
        assert_eq!(ArticleStatus::from_i16(42), ArticleStatus::Unknown);
        assert_eq!(ArticleStatus::from_i16(-1), ArticleStatus::Unknown);
    }

    #[test]
    fn status_serializes_as_number() {
        let json = serde_json::to_string(&ArticleStatus::Published).unwrap();
        assert_eq!(json, "2");
        let back: ArticleStatus = serde_json::from_str("3").unwrap();
        assert_eq!(back, ArticleStatus::Private);
    }

    #[test]
    fn unknown_is_not_assignable() {
        assert!(!ArticleStatus::Unknown.is_assignable());
        assert!(ArticleStatus::Private.is_assignable());
    }

    #[test]
    fn only_published_articles_can_be_withdrawn() {
        use ArticleStatus::*;
        assert!(Published.can_transition_to(Private));
        assert!(!Unpublished.can_transition_to(Private));
        assert!(!Private.can_transition_to(Private));
        assert!(!Private.can_transition_to(Published));
        assert!(!Unpublished.can_transition_to(Published));
        assert!(!Published.can_transition_to(Unpublished));
        assert!(!Published.can_transition_to(Unknown));
    }

    #[test]
    fn summary_keeps_short_content() {
        let art = Article::new_draft(1, "t", "short");
        assert_eq!(art.summary(), "short");
    }

    #[test]
    fn summary_cuts_on_char_boundary() {
        let content: String = "文".repeat(ABSTRACT_CHARS + 10);
        let art = Article::new_draft(1, "t", content);
        let summary = art.summary();
        assert_eq!(summary.chars().count(), ABSTRACT_CHARS);
        let abs = art.abstracted();
        assert_eq!(abs.content, summary);
        assert_eq!(abs.title, "t");
    }
}
