//! Locale tags used for `.lproj` folder names.

use crate::error::{PassError, Result};

fn is_alpha(s: &str, lens: &[usize]) -> bool {
    lens.contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_region_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())
}

fn title_case(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Normalize `lang[-Script|-NNN][-CC|-NNN]`, e.g. `zh_hans_cn` -> `zh-Hans-CN`.
/// Both `-` and `_` are accepted as separators.
pub fn normalize_locale(locale: &str) -> Result<String> {
    let invalid = || PassError::type_error(format!("Invalid locale string: {locale}"));
    let parts: Vec<&str> = locale.split(['-', '_']).collect();

    let (lang, rest) = parts.split_first().ok_or_else(invalid)?;
    if !is_alpha(lang, &[2, 3, 4]) {
        return Err(invalid());
    }
    let mut result = lang.to_ascii_lowercase();

    let mut rest = rest.iter().peekable();
    if let Some(variant) = rest.next_if(|p| is_alpha(p, &[4]) || is_region_code(p)) {
        result.push('-');
        result.push_str(&title_case(variant));
    }
    if let Some(country) = rest.next_if(|p| is_alpha(p, &[2]) || is_region_code(p)) {
        result.push('-');
        result.push_str(&country.to_ascii_uppercase());
    }
    if rest.next().is_some() {
        return Err(invalid());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_separators() {
        assert_eq!(normalize_locale("en").unwrap(), "en");
        assert_eq!(normalize_locale("en_us").unwrap(), "en-US");
        assert_eq!(normalize_locale("ZH-hans").unwrap(), "zh-Hans");
        assert_eq!(normalize_locale("zh_hant_tw").unwrap(), "zh-Hant-TW");
        assert_eq!(normalize_locale("es-419").unwrap(), "es-419");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "e", "english", "en-", "en-US-x-y", "en US"] {
            assert!(normalize_locale(bad).is_err(), "{bad}");
        }
    }
}
