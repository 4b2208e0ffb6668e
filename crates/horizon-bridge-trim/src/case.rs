//! Component name to host tag conversion.

/// Whether an imported name refers to a host component.
///
/// Components are exported with an uppercase first character (`View`,
/// `CoverView`); helpers and hooks are not.
pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Convert an identifier to kebab case.
///
/// Words break at non-alphanumeric characters, at lowercase to uppercase
/// transitions, before the last capital of an acronym followed by lowercase,
/// and between letters and digits.
///
/// ```
/// use horizon_bridge_trim::kebab_case;
///
/// assert_eq!(kebab_case("CoverView"), "cover-view");
/// assert_eq!(kebab_case("HTMLView"), "html-view");
/// assert_eq!(kebab_case("Button2"), "button-2");
/// ```
pub fn kebab_case(name: &str) -> String {
    words(name).join("-")
}

fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p))
            && !current.is_empty()
            && is_boundary(prev, c, chars.get(i + 1).copied())
        {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn is_boundary(prev: char, c: char, next: Option<char>) -> bool {
    if prev.is_lowercase() && c.is_uppercase() {
        return true;
    }
    if prev.is_uppercase() && c.is_uppercase() && next.is_some_and(char::is_lowercase) {
        return true;
    }
    prev.is_numeric() != c.is_numeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("View"), "view");
        assert_eq!(kebab_case("CoverView"), "cover-view");
        assert_eq!(kebab_case("MovableArea"), "movable-area");
        assert_eq!(kebab_case("OpenData"), "open-data");
        assert_eq!(kebab_case("WebView"), "web-view");
        assert_eq!(kebab_case("HTMLView"), "html-view");
        assert_eq!(kebab_case("Button2"), "button-2");
        assert_eq!(kebab_case("snake_case"), "snake-case");
        assert_eq!(kebab_case("  Spaced  Out "), "spaced-out");
        assert_eq!(kebab_case(""), "");
    }

    #[test]
    fn test_is_component_name() {
        assert!(is_component_name("View"));
        assert!(is_component_name("CoverView"));
        assert!(!is_component_name("render"));
        assert!(!is_component_name("useVisibility"));
        assert!(!is_component_name("_Private"));
        assert!(!is_component_name(""));
    }
}
