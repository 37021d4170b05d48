use serde::{Deserialize, Serialize};

/// Interaction counters of one `(biz, biz_id)` subject, plus the viewer's own flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactive {
    pub biz: String,
    pub biz_id: i64,
    pub read_cnt: i64,
    pub like_cnt: i64,
    pub collect_cnt: i64,
    pub liked: bool,
    pub collected: bool,
}

impl Interactive {
    pub fn empty(biz: &str, biz_id: i64) -> Self {
        Self {
            biz: biz.to_string(),
            biz_id,
            ..Default::default()
        }
    }

    pub fn count(&self, field: CounterField) -> i64 {
        match field {
            CounterField::Read => self.read_cnt,
            CounterField::Like => self.like_cnt,
            CounterField::Collect => self.collect_cnt,
        }
    }

    /// Applies `delta` to one counter. Counters never go below zero.
    pub fn add(&mut self, field: CounterField, delta: i64) {
        let slot = match field {
            CounterField::Read => &mut self.read_cnt,
            CounterField::Like => &mut self.like_cnt,
            CounterField::Collect => &mut self.collect_cnt,
        };
        *slot = (*slot + delta).max(0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    Read,
    Like,
    Collect,
}

impl CounterField {
    /// Column name in the counters table and field name in the cache hash.
    pub fn as_str(self) -> &'static str {
        match self {
            CounterField::Read => "read_cnt",
            CounterField::Like => "like_cnt",
            CounterField::Collect => "collect_cnt",
        }
    }
}

/// Per-user reactions that are recorded once per `(uid, biz, biz_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    Like,
    Collect,
}

impl Reaction {
    pub fn counter(self) -> CounterField {
        match self {
            Reaction::Like => CounterField::Like,
            Reaction::Collect => CounterField::Collect,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Collect => "collect",
        }
    }
}

/// Status of a reaction record. Cancelling flips the status; rows are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// Liked / collected.
    Active,
    /// Unliked / uncollected.
    Cancelled,
}

impl RecordStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            RecordStatus::Active => 1,
            RecordStatus::Cancelled => 2,
        }
    }
}

/// Result of an idempotent reaction write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The record changed and the counter moved.
    Applied,
    /// Already in the requested state; nothing changed.
    Duplicate,
}
