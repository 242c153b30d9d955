//! Keyword-based sentiment and frequency analysis for news items.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::Serialize;

use crate::models::NewsItem;

pub const POSITIVE_KEYWORDS: [&str; 15] = [
    "增长", "上涨", "盈利", "利好", "突破", "创新", "合作", "收购", "扩张", "业绩", "超预期",
    "看好", "推荐", "买入", "持有",
];

pub const NEGATIVE_KEYWORDS: [&str; 15] = [
    "下跌", "亏损", "风险", "警告", "下调", "减持", "卖出", "退市", "调查", "违规", "处罚",
    "停牌", "延期", "取消", "失败",
];

/// Sentiment shares for one text. The three components sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScore {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScore {
    pub fn neutral() -> SentimentScore {
        SentimentScore {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }

    pub fn stance(&self) -> &'static str {
        if self.positive > self.negative {
            "positive"
        } else if self.negative > self.positive {
            "negative"
        } else {
            "neutral"
        }
    }
}

/// Score a text by the share of positive and negative keywords it
/// mentions. Each keyword counts once no matter how often it appears;
/// a text without any keyword is fully neutral.
pub fn score_text(text: &str) -> SentimentScore {
    let text = text.to_lowercase();
    let positive = POSITIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    let negative = NEGATIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    let total = positive + negative;

    if total == 0 {
        return SentimentScore::neutral();
    }
    let positive = positive as f64 / total as f64;
    let negative = negative as f64 / total as f64;
    SentimentScore {
        positive,
        negative,
        neutral: 1.0 - positive - negative,
    }
}

/// Component-wise average of many scores. An empty batch is neutral.
pub fn average_sentiment(scores: &[SentimentScore]) -> SentimentScore {
    if scores.is_empty() {
        return SentimentScore::neutral();
    }
    let n = scores.len() as f64;
    SentimentScore {
        positive: scores.iter().map(|s| s.positive).sum::<f64>() / n,
        negative: scores.iter().map(|s| s.negative).sum::<f64>() / n,
        neutral: scores.iter().map(|s| s.neutral).sum::<f64>() / n,
    }
}

/// Publication frequency summary of a news batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsFrequency {
    pub total: usize,
    /// Item count per calendar day, oldest day first.
    pub daily_counts: BTreeMap<String, usize>,
    /// Item count per source, busiest first.
    pub source_counts: Vec<(String, usize)>,
    /// Most frequent multi-character CJK tokens in the titles.
    pub top_keywords: Vec<(String, usize)>,
    pub date_range: Option<(String, String)>,
}

pub fn analyze_frequency(items: &[NewsItem], top_k: usize) -> NewsFrequency {
    if items.is_empty() {
        return NewsFrequency::default();
    }

    let mut daily_counts: BTreeMap<String, usize> = BTreeMap::new();
    for item in items {
        if let Some(date) = item.date_part() {
            *daily_counts.entry(date).or_default() += 1;
        }
    }

    // Channels win over the raw source field when any item carries them.
    let use_channels = items.iter().any(|i| i.channels.is_some());
    let mut sources: HashMap<String, usize> = HashMap::new();
    for item in items {
        let source = if use_channels { &item.channels } else { &item.src };
        if let Some(source) = source {
            *sources.entry(source.clone()).or_default() += 1;
        }
    }
    let mut source_counts: Vec<(String, usize)> = sources.into_iter().collect();
    source_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top_keywords = top_title_keywords(items, top_k);

    let date_range = match (daily_counts.keys().next(), daily_counts.keys().next_back()) {
        (Some(start), Some(end)) => Some((start.clone(), end.clone())),
        _ => None,
    };

    NewsFrequency {
        total: items.len(),
        daily_counts,
        source_counts,
        top_keywords,
        date_range,
    }
}

fn top_title_keywords(items: &[NewsItem], top_k: usize) -> Vec<(String, usize)> {
    let cjk_run = Regex::new(r"[一-鿿]+").unwrap();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        let Some(title) = &item.title else { continue };
        for token in cjk_run.find_iter(title) {
            let token = token.as_str();
            if token.chars().count() > 1 {
                *counts.entry(token.to_string()).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(datetime: &str, title: &str, src: Option<&str>, channels: Option<&str>) -> NewsItem {
        NewsItem {
            datetime: Some(datetime.to_string()),
            title: Some(title.to_string()),
            content: None,
            src: src.map(str::to_string),
            channels: channels.map(str::to_string),
        }
    }

    #[test]
    fn test_score_positive_text() {
        let score = score_text("业绩超预期，营收大幅增长");
        // Three positive hits, no negative ones.
        assert!((score.positive - 1.0).abs() < 1e-9);
        assert!((score.negative - 0.0).abs() < 1e-9);
        assert_eq!(score.stance(), "positive");
    }

    #[test]
    fn test_score_mixed_text() {
        let score = score_text("利好落地但仍有风险");
        assert!((score.positive - 0.5).abs() < 1e-9);
        assert!((score.negative - 0.5).abs() < 1e-9);
        assert!((score.neutral - 0.0).abs() < 1e-9);
        assert_eq!(score.stance(), "neutral");
    }

    #[test]
    fn test_score_without_keywords_is_neutral() {
        let score = score_text("今日无事发生");
        assert_eq!(score, SentimentScore::neutral());
    }

    #[test]
    fn test_average_sentiment() {
        let scores = [
            score_text("增长"),
            score_text("下跌"),
            SentimentScore::neutral(),
        ];
        let avg = average_sentiment(&scores);

        assert!((avg.positive - 1.0 / 3.0).abs() < 1e-9);
        assert!((avg.negative - 1.0 / 3.0).abs() < 1e-9);
        assert!((avg.neutral - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_daily_counts_and_range() {
        let items = vec![
            item("2023-06-01 09:00:00", "宁德时代发布业绩", Some("新浪"), None),
            item("2023-06-01 15:30:00", "股价创新高", Some("新浪"), None),
            item("2023-06-02 10:00:00", "市场回调", Some("同花顺"), None),
        ];
        let freq = analyze_frequency(&items, 10);

        assert_eq!(freq.total, 3);
        assert_eq!(freq.daily_counts.get("2023-06-01"), Some(&2));
        assert_eq!(freq.daily_counts.get("2023-06-02"), Some(&1));
        assert_eq!(
            freq.date_range,
            Some(("2023-06-01".to_string(), "2023-06-02".to_string()))
        );
        assert_eq!(freq.source_counts[0], ("新浪".to_string(), 2));
    }

    #[test]
    fn test_frequency_prefers_channels_over_src() {
        let items = vec![
            item("2023-06-01 09:00:00", "快讯", Some("新浪"), Some("要闻")),
            item("2023-06-01 10:00:00", "快讯", Some("新浪"), Some("要闻")),
        ];
        let freq = analyze_frequency(&items, 10);
        assert_eq!(freq.source_counts[0], ("要闻".to_string(), 2));
    }

    #[test]
    fn test_top_keywords_count_cjk_runs() {
        // Tokens are contiguous CJK runs, so punctuation and ASCII split
        // them; runs of a single character are dropped.
        let items = vec![
            item("2023-06-01 09:00:00", "新能源汽车: 销量创新高", None, None),
            item("2023-06-01 10:00:00", "新能源汽车 2023出口增长", None, None),
        ];
        let freq = analyze_frequency(&items, 5);

        assert_eq!(freq.top_keywords[0].0, "新能源汽车");
        assert_eq!(freq.top_keywords[0].1, 2);
        assert!(freq.top_keywords.iter().all(|(token, _)| token.chars().count() > 1));
    }

    #[test]
    fn test_empty_batch() {
        let freq = analyze_frequency(&[], 10);
        assert_eq!(freq.total, 0);
        assert_eq!(freq.date_range, None);
    }
}
