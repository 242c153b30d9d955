use serde::{Deserialize, Serialize};

/// Flash news item (`news`). The vendor schema is loose, so every field is
/// optional and decoding never fails on missing columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub channels: Option<String>,
}

impl NewsItem {
    /// Title and content joined for text analysis
    pub fn text(&self) -> String {
        let mut text = String::new();
        if let Some(title) = &self.title {
            text.push_str(title);
        }
        if let Some(content) = &self.content {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(content);
        }
        text
    }

    /// Calendar-date part of the publish time ("2023-01-04 09:30:00" → "2023-01-04")
    pub fn date_part(&self) -> Option<String> {
        self.datetime
            .as_deref()
            .and_then(|dt| dt.split_whitespace().next())
            .map(String::from)
    }

    /// Source label, preferring the channel tag over the raw feed name
    pub fn source(&self) -> Option<&str> {
        self.channels.as_deref().or(self.src.as_deref())
    }
}

/// Company announcement (`anns`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Announcement {
    #[serde(default)]
    pub ts_code: Option<String>,
    #[serde(default)]
    pub ann_date: Option<String>,
    #[serde(default)]
    pub ann_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Broker research report (`report`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchReport {
    #[serde(default)]
    pub ts_code: Option<String>,
    #[serde(default)]
    pub report_date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_title_and_content() {
        let item = NewsItem {
            title: Some("业绩超预期".into()),
            content: Some("公司盈利增长".into()),
            ..Default::default()
        };
        assert_eq!(item.text(), "业绩超预期 公司盈利增长");

        let title_only = NewsItem {
            title: Some("利好".into()),
            ..Default::default()
        };
        assert_eq!(title_only.text(), "利好");
    }

    #[test]
    fn test_date_part() {
        let item = NewsItem {
            datetime: Some("2023-01-04 09:30:00".into()),
            ..Default::default()
        };
        assert_eq!(item.date_part().as_deref(), Some("2023-01-04"));
        assert_eq!(NewsItem::default().date_part(), None);
    }

    #[test]
    fn test_source_prefers_channels() {
        let item = NewsItem {
            src: Some("sina".into()),
            channels: Some("要闻".into()),
            ..Default::default()
        };
        assert_eq!(item.source(), Some("要闻"));

        let src_only = NewsItem {
            src: Some("sina".into()),
            ..Default::default()
        };
        assert_eq!(src_only.source(), Some("sina"));
    }
}
