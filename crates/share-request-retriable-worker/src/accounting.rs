//! Retry accounting: one attempt in, one queue mutation out.

/// Attempts after which a request is dropped from the queue.
pub const MAX_TRIES: i64 = 5;

/// What to do with a request after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accounting {
    /// Keep the request, storing the new attempt count.
    Update { new_tries: i64 },
    /// Delete the request; `new_tries` exceeded the limit.
    Evict { new_tries: i64 },
}

impl Accounting {
    /// Decide the mutation for a request that had `tries` attempts before this one.
    ///
    /// The delivery outcome plays no part in the decision.
    pub fn for_attempt(tries: i64, max_tries: i64) -> Self {
        let new_tries = tries.saturating_add(1);
        if new_tries > max_tries {
            Accounting::Evict { new_tries }
        } else {
            Accounting::Update { new_tries }
        }
    }

    pub fn new_tries(&self) -> i64 {
        match *self {
            Accounting::Update { new_tries } | Accounting::Evict { new_tries } => new_tries,
        }
    }

    pub fn is_evict(&self) -> bool {
        matches!(self, Accounting::Evict { .. })
    }
}
