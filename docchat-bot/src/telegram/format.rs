//! Telegram Markdown format converter.
//!
//! Model output arrives as standard Markdown, but Telegram's legacy Markdown
//! mode only understands single-asterisk bold and has no heading syntax.
//! Double-emphasis and heading markers are collapsed to single emphasis.
//!
//! Other markup-significant characters are not escaped; malformed markup in
//! model output can produce malformed messages.

/// Convert standard Markdown emphasis and headings for Telegram display.
///
/// # Conversion Rules
///
/// | Input      | Output  |
/// |------------|---------|
/// | `**bold**` | `*bold*`|
/// | `### Head` | `*Head` |
/// | `###Head`  | `*Head` |
pub fn format_for_telegram(text: &str) -> String {
    // The spaced heading marker must be replaced first so "### " does not
    // leave a stray space behind.
    text.replace("**", "*")
        .replace("### ", "*")
        .replace("###", "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_markers_collapsed() {
        assert_eq!(format_for_telegram("**bold**"), "*bold*");
    }

    #[test]
    fn heading_with_trailing_space() {
        assert_eq!(
            format_for_telegram("**bold** and ### Heading"),
            "*bold* and *Heading"
        );
    }

    #[test]
    fn heading_without_trailing_space() {
        assert_eq!(format_for_telegram("###NoSpace"), "*NoSpace");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(format_for_telegram("no markup here"), "no markup here");
    }

    #[test]
    fn mixed_markers_across_lines() {
        let input = "### Summary\n\n**Key point** one\n###Details";
        assert_eq!(format_for_telegram(input), "*Summary\n\n*Key point* one\n*Details");
    }
}
