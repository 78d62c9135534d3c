//! Localized string tables, one `pass.strings` file per locale.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::locale::normalize_locale;
use crate::pipeline::BundleMember;

pub const STRINGS_FILENAME: &str = "pass.strings";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Localizations {
    tables: BTreeMap<String, BTreeMap<String, String>>,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

impl Localizations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        let locale = normalize_locale(locale).ok()?;
        self.tables.get(&locale)?.get(key).map(String::as_str)
    }

    pub fn add(&mut self, locale: &str, key: impl Into<String>, value: impl Into<String>) -> Result<&mut Self> {
        let locale = normalize_locale(locale)?;
        self.tables
            .entry(locale)
            .or_default()
            .insert(key.into(), value.into());
        Ok(self)
    }

    /// `"key" = "value";` lines, sorted by key.
    pub fn strings_file(&self, locale: &str) -> Option<String> {
        let table = self.tables.get(locale)?;
        let mut out = String::new();
        for (key, value) in table {
            out.push_str(&format!("\"{}\" = \"{}\";\n", escape(key), escape(value)));
        }
        Some(out)
    }

    pub fn to_members(&self) -> Vec<BundleMember> {
        self.tables
            .keys()
            .filter_map(|locale| {
                self.strings_file(locale).map(|body| BundleMember {
                    path: format!("{locale}.lproj/{STRINGS_FILENAME}"),
                    data: body.into_bytes(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_per_locale() {
        let mut l = Localizations::new();
        l.add("en", "GATE", "Gate").unwrap();
        l.add("zh_hans", "GATE", "登机口").unwrap();
        let members = l.to_members();
        let paths: Vec<_> = members.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["en.lproj/pass.strings", "zh-Hans.lproj/pass.strings"]);
        assert_eq!(l.get("zh-Hans", "GATE"), Some("登机口"));
    }

    #[test]
    fn test_strings_are_escaped() {
        let mut l = Localizations::new();
        l.add("fr", "say \"hi\"", "line1\nline2").unwrap();
        assert_eq!(
            l.strings_file("fr").unwrap(),
            "\"say \\\"hi\\\"\" = \"line1\\nline2\";\n"
        );
    }

    #[test]
    fn test_invalid_locale_rejected() {
        assert!(Localizations::new().add("not a locale", "k", "v").is_err());
    }
}
