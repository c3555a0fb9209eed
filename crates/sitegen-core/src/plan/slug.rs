//! URL slug derivation for page titles.

/// Slug used when a title contains no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "page";

/// Lowercase the title, keep ASCII alphanumerics, and collapse every other
/// run of characters into a single `-`. Leading and trailing dashes are
/// trimmed. Uniqueness is the store's job.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(slugify("About Us"), "about-us");
        assert_eq!(slugify("Pricing & Plans"), "pricing-plans");
        assert_eq!(slugify("FAQ"), "faq");
        assert_eq!(slugify("Top 10 Tips"), "top-10-tips");
    }

    #[test]
    fn trims_and_collapses_separators() {
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
        assert_eq!(slugify("a___b"), "a-b");
    }

    #[test]
    fn non_ascii_is_treated_as_separator() {
        assert_eq!(slugify("Café Menu"), "caf-menu");
    }

    #[test]
    fn empty_result_falls_back() {
        assert_eq!(slugify(""), "page");
        assert_eq!(slugify("!!!"), "page");
        assert_eq!(slugify("日本語"), "page");
    }
}
