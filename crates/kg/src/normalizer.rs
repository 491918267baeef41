use regex::Regex;
use std::collections::HashMap;

/// Folds mention surface forms into canonical keys so that coreference
/// resolution can cluster variants of the same entity ("OpenAI" vs
/// "OpenAI Inc", "the USA" vs "USA").
pub struct EntityNormalizer {
    /// Maps folded surface -> canonical key
    aliases: HashMap<String, String>,
    punct: Regex,
    spaces: Regex,
}

impl EntityNormalizer {
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
            punct: Regex::new(r"[.,!?;:']").unwrap(),
            spaces: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Fold a surface form and resolve it to its canonical key, registering
    /// a new canonical when no existing entity is similar enough.
    pub fn normalize(&mut self, surface: &str) -> String {
        let folded = self.fold(surface);

        if let Some(canonical) = self.aliases.get(&folded) {
            return canonical.clone();
        }

        // Near-duplicate check against known canonicals
        let mut found = None;
        for (existing, canonical) in &self.aliases {
            if are_similar(&folded, existing) {
                found = Some(canonical.clone());
                break;
            }
        }

        if let Some(canonical) = found {
            self.aliases.insert(folded, canonical.clone());
            return canonical;
        }

        self.aliases.insert(folded.clone(), folded.clone());
        folded
    }

    fn fold(&self, surface: &str) -> String {
        let lowered = surface.to_lowercase();
        let stripped = self.punct.replace_all(lowered.trim(), "");
        self.spaces.replace_all(&stripped, " ").trim().to_string()
    }

    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }
}

impl Default for EntityNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Heuristic similarity between two folded surfaces. Containment handles
/// abbreviations; word overlap handles reordered multi-word names.
fn are_similar(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    if a.contains(b) || b.contains(a) {
        return true;
    }

    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();

    if words_a.len() > 1 && words_b.len() > 1 {
        let common = words_a.iter().filter(|w| words_b.contains(w)).count();
        let total = words_a.len().max(words_b.len());
        return common as f64 / total as f64 > 0.7;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folding() {
        let mut normalizer = EntityNormalizer::new();

        assert_eq!(normalizer.normalize("Paris"), "paris");
        assert_eq!(normalizer.normalize("Paris!"), "paris");
        assert_eq!(normalizer.normalize("  Paris  "), "paris");
    }

    #[test]
    fn test_alias_resolution() {
        let mut normalizer = EntityNormalizer::new();

        let n1 = normalizer.normalize("OpenAI");
        let n2 = normalizer.normalize("OpenAI Inc");

        assert_eq!(n1, n2);
    }

    #[test]
    fn test_distinct_entities_stay_distinct() {
        let mut normalizer = EntityNormalizer::new();

        let n1 = normalizer.normalize("Paris");
        let n2 = normalizer.normalize("Germany");

        assert_ne!(n1, n2);
    }
}
