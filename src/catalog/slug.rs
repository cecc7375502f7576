//! URL slugs for products and packages.

use std::collections::HashSet;

/// Lowercased name with whitespace runs replaced by `-`; anything other than
/// alphanumerics and `-` is dropped.
pub fn generate_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// First of `base`, `base-1`, `base-2`, ... not present in `taken`.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_name() {
        assert_eq!(generate_slug("Dragon Knight"), "dragon-knight");
        assert_eq!(generate_slug("  Big   Orc  "), "big-orc");
        assert_eq!(generate_slug("Elf (limited) #2"), "elf-limited-2");
        assert_eq!(generate_slug("Păpușă Mică"), "păpușă-mică");
        assert_eq!(generate_slug("already-slugged"), "already-slugged");
    }

    #[test]
    fn suffixes_until_free() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("orc", &taken), "orc");

        taken.insert("orc".to_string());
        assert_eq!(unique_slug("orc", &taken), "orc-1");

        taken.insert("orc-1".to_string());
        taken.insert("orc-3".to_string());
        assert_eq!(unique_slug("orc", &taken), "orc-2");
    }
}
