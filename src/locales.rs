//! User-facing strings in the supported languages
//!
//! Only the messages the relay itself produces live here: the fallback shown
//! when a run stops early, and the placeholder returned by roster tools when
//! nothing matches.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported message languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Lang {
    /// English
    #[default]
    #[serde(rename = "en")]
    En,
    /// Japanese
    #[serde(rename = "ja")]
    Ja,
    /// Chinese (`zh_TW` and `zh_CN` share these strings)
    #[serde(rename = "zh", alias = "zh_TW", alias = "zh_CN")]
    Zh,
    /// Thai
    #[serde(rename = "th")]
    Th,
}

impl FromStr for Lang {
    type Err = RelayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Lang::En),
            "ja" => Ok(Lang::Ja),
            "zh" | "zh_TW" | "zh_CN" => Ok(Lang::Zh),
            "th" => Ok(Lang::Th),
            other => Err(RelayError::Config(format!(
                "Unsupported language: {}. Must be one of: en, ja, zh, zh_TW, zh_CN, th",
                other
            ))),
        }
    }
}

/// Message keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The run stopped before the assistant could finish its answer
    AnswerTooLong,
    /// A roster lookup matched no records
    NoData,
}

/// Look up a message in the given language
pub fn t(lang: Lang, key: Key) -> &'static str {
    match (lang, key) {
        (Lang::En, Key::AnswerTooLong) => "The answer is too long. Please ask a narrower question.",
        (Lang::En, Key::NoData) => "No data found for the requested dates or nicknames.",
        (Lang::Ja, Key::AnswerTooLong) => "回答が長すぎます。質問を絞ってください。",
        (Lang::Ja, Key::NoData) => "該当するデータが見つかりませんでした。",
        (Lang::Zh, Key::AnswerTooLong) => "回答過長，請縮小問題範圍。",
        (Lang::Zh, Key::NoData) => "查無符合的資料。",
        (Lang::Th, Key::AnswerTooLong) => "คำตอบยาวเกินไป กรุณาถามให้เจาะจงมากขึ้น",
        (Lang::Th, Key::NoData) => "ไม่พบข้อมูลตามวันที่หรือชื่อเล่นที่ระบุ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_from_str_aliases() {
        assert_eq!("zh_TW".parse::<Lang>().unwrap(), Lang::Zh);
        assert_eq!("zh_CN".parse::<Lang>().unwrap(), Lang::Zh);
        assert_eq!("th".parse::<Lang>().unwrap(), Lang::Th);
        assert!("fr".parse::<Lang>().is_err());
    }

    #[test]
    fn test_lang_deserialize_alias() {
        let lang: Lang = serde_yaml::from_str("zh_TW").unwrap();
        assert_eq!(lang, Lang::Zh);
    }

    #[test]
    fn test_every_language_has_every_key() {
        for lang in [Lang::En, Lang::Ja, Lang::Zh, Lang::Th] {
            assert!(!t(lang, Key::AnswerTooLong).is_empty());
            assert!(!t(lang, Key::NoData).is_empty());
        }
    }
}
