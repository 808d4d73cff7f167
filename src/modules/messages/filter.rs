//! Spam and frequency filter for public message submissions.
//!
//! Each client key keeps the timestamps of its accepted submissions. A new
//! submission is rejected when the key already has `per_minute` entries in the
//! last minute or `per_day` entries in the last day. Content is additionally
//! screened against a static list of sensitive words.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

pub const MAX_CONTENT_CHARS: usize = 500;

/// Matched as case-insensitive substrings.
pub const SENSITIVE_WORDS: &[&str] = &[
    "代开发票",
    "博彩",
    "赌博",
    "六合彩",
    "刷单",
    "加微信",
    "贷款",
    "色情",
    "兼职日结",
    "办证",
    "viagra",
    "casino",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRejection {
    Empty,
    TooLong { max: usize },
    SensitiveWord(&'static str),
    MinuteLimit { limit: usize },
    DailyLimit { limit: usize },
}

impl FilterRejection {
    /// Frequency rejections map to 429, content rejections to 400.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            FilterRejection::MinuteLimit { .. } | FilterRejection::DailyLimit { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            FilterRejection::Empty => "留言内容不能为空。".to_string(),
            FilterRejection::TooLong { max } => format!("留言内容不能超过 {max} 个字符。"),
            FilterRejection::SensitiveWord(word) => {
                format!("留言包含敏感词“{word}”，请修改后再提交。")
            }
            FilterRejection::MinuteLimit { limit } => {
                format!("提交过于频繁：每分钟最多 {limit} 条留言，请稍后再试。")
            }
            FilterRejection::DailyLimit { limit } => {
                format!("今日留言次数已达上限（{limit} 条），请明天再试。")
            }
        }
    }
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub struct MessageFilter {
    per_minute: usize,
    per_day: usize,
    submissions: HashMap<String, Vec<DateTime<Utc>>>,
}

impl MessageFilter {
    pub fn new(per_minute: usize, per_day: usize) -> Self {
        Self {
            per_minute,
            per_day,
            submissions: HashMap::new(),
        }
    }

    /// Checks content first, then the minute window, then the day window.
    pub fn check(
        &self,
        key: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<(), FilterRejection> {
        let content = content.trim();
        if content.is_empty() {
            return Err(FilterRejection::Empty);
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(FilterRejection::TooLong {
                max: MAX_CONTENT_CHARS,
            });
        }
        if let Some(word) = find_sensitive_word(content) {
            return Err(FilterRejection::SensitiveWord(word));
        }

        let history = self.submissions.get(key).map(Vec::as_slice).unwrap_or_default();
        let within = |window: Duration| {
            history
                .iter()
                .filter(|at| now.signed_duration_since(**at) < window)
                .count()
        };

        if within(Duration::minutes(1)) >= self.per_minute {
            return Err(FilterRejection::MinuteLimit {
                limit: self.per_minute,
            });
        }
        if within(Duration::days(1)) >= self.per_day {
            return Err(FilterRejection::DailyLimit {
                limit: self.per_day,
            });
        }
        Ok(())
    }

    pub fn record(&mut self, key: &str, now: DateTime<Utc>) {
        self.submissions.entry(key.to_string()).or_default().push(now);
    }

    /// Drops timestamps older than a day and keys left empty. Returns the number of keys removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.submissions.len();
        self.submissions.retain(|_, history| {
            history.retain(|at| now.signed_duration_since(*at) < Duration::days(1));
            !history.is_empty()
        });
        before - self.submissions.len()
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.submissions.len()
    }
}

pub fn find_sensitive_word(content: &str) -> Option<&'static str> {
    let lowered = content.to_lowercase();
    SENSITIVE_WORDS
        .iter()
        .copied()
        .find(|word| lowered.contains(&word.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_screened_before_frequency() {
        let filter = MessageFilter::new(3, 10);
        let now = Utc::now();

        assert_eq!(filter.check("1.1.1.1", "   ", now), Err(FilterRejection::Empty));
        assert_eq!(
            filter.check("1.1.1.1", &"字".repeat(MAX_CONTENT_CHARS + 1), now),
            Err(FilterRejection::TooLong {
                max: MAX_CONTENT_CHARS
            })
        );
        assert!(filter
            .check("1.1.1.1", &"字".repeat(MAX_CONTENT_CHARS), now)
            .is_ok());

        let rejection = filter
            .check("1.1.1.1", "低价代开发票，联系我", now)
            .unwrap_err();
        assert_eq!(rejection, FilterRejection::SensitiveWord("代开发票"));
        assert!(!rejection.is_rate_limit());
        assert!(rejection.message().contains("代开发票"));
    }

    #[test]
    fn sensitive_words_match_case_insensitively() {
        assert_eq!(find_sensitive_word("Best CASINO in town"), Some("casino"));
        assert_eq!(find_sensitive_word("请问低保如何申请？"), None);
    }

    #[test]
    fn minute_window_limits_bursts() {
        let mut filter = MessageFilter::new(3, 10);
        let start = Utc::now();

        for offset in 0..3 {
            let at = start + Duration::seconds(offset);
            filter.check("10.0.0.1", "你好", at).unwrap();
            filter.record("10.0.0.1", at);
        }

        let rejection = filter
            .check("10.0.0.1", "你好", start + Duration::seconds(10))
            .unwrap_err();
        assert_eq!(rejection, FilterRejection::MinuteLimit { limit: 3 });
        assert!(rejection.is_rate_limit());

        assert!(filter.check("10.0.0.2", "你好", start).is_ok());
        assert!(filter
            .check("10.0.0.1", "你好", start + Duration::seconds(61))
            .is_ok());
    }

    #[test]
    fn rejected_content_leaves_the_windows_untouched() {
        let mut filter = MessageFilter::new(3, 10);
        let start = Utc::now();

        for offset in 0..2 {
            assert!(filter
                .check("10.0.0.9", "加微信领补贴", start + Duration::seconds(offset))
                .is_err());
        }

        for offset in 2..5 {
            let at = start + Duration::seconds(offset);
            filter.check("10.0.0.9", "请问临时救助怎么申请？", at).unwrap();
            filter.record("10.0.0.9", at);
        }

        assert_eq!(
            filter.check("10.0.0.9", "再问一次", start + Duration::seconds(6)),
            Err(FilterRejection::MinuteLimit { limit: 3 })
        );
    }

    #[test]
    fn day_window_caps_total_submissions() {
        let mut filter = MessageFilter::new(3, 4);
        let start = Utc::now();

        for offset in 0..4 {
            filter.record("10.0.0.1", start + Duration::minutes(offset * 5));
        }

        let later = start + Duration::hours(2);
        assert_eq!(
            filter.check("10.0.0.1", "你好", later),
            Err(FilterRejection::DailyLimit { limit: 4 })
        );
        assert!(filter
            .check("10.0.0.1", "你好", start + Duration::days(1) + Duration::minutes(1))
            .is_ok());
    }

    #[test]
    fn prune_drops_stale_history() {
        let mut filter = MessageFilter::new(3, 10);
        let start = Utc::now();

        filter.record("old", start);
        filter.record("fresh", start);
        filter.record("fresh", start + Duration::hours(20));

        let removed = filter.prune(start + Duration::hours(25));
        assert_eq!(removed, 1);
        assert_eq!(filter.tracked_keys(), 1);
    }
}
