// HTTP routes
pub mod analysis;
pub mod batch;
pub mod comparison;
pub mod health;

pub use analysis::*;
pub use batch::*;
pub use comparison::*;
pub use health::*;

use serde::Deserialize;

use crate::kernel::store::DEFAULT_RECENT_LIMIT;

/// `?limit=N` on the recent listings. Missing, unparseable or non-positive
/// values fall back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    limit: Option<String>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_RECENT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_limit_defaults() {
        let limit = |v: Option<&str>| RecentQuery {
            limit: v.map(str::to_string),
        }
        .limit();

        assert_eq!(limit(None), 10);
        assert_eq!(limit(Some("abc")), 10);
        assert_eq!(limit(Some("0")), 10);
        assert_eq!(limit(Some("3")), 3);
    }
}
