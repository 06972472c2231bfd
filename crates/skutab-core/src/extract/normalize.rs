//! Canonical surface form of attribute names.

/// Normalize an attribute name.
///
/// Drops every character outside `[A-Za-z0-9 ]`, collapses whitespace, trims and
/// title-cases each word. `"  screen-SIZE* "` becomes `"Screensize"`, `"battery  life:"`
/// becomes `"Battery Life"`.
pub fn normalize_attribute(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();

    kept.split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case a letter when it starts a run of letters, lower-case it otherwise.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_alpha = false;
    for c in word.chars() {
        if c.is_ascii_alphabetic() {
            out.push(if prev_alpha {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            });
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_attribute() {
        assert_eq!(normalize_attribute("color"), "Color");
        assert_eq!(normalize_attribute("  BATTERY   life: "), "Battery Life");
        assert_eq!(normalize_attribute("**Screen-Size**"), "Screensize");
        assert_eq!(normalize_attribute("RAM (GB)"), "Ram Gb");
        assert_eq!(normalize_attribute("4G\tLTE"), "4Glte");
        assert_eq!(normalize_attribute("max 4gb"), "Max 4Gb");
    }

    #[test]
    fn test_variants_compare_equal() {
        assert_eq!(
            normalize_attribute("support phase"),
            normalize_attribute("Support  Phase:")
        );
        assert_eq!(normalize_attribute("- Color -"), normalize_attribute("COLOR"));
    }

    #[test]
    fn test_only_punctuation_normalizes_to_empty() {
        assert_eq!(normalize_attribute("***"), "");
        assert_eq!(normalize_attribute("Größe"), "Gre");
    }
}
