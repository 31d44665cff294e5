//! The mention engine.
//!
//! Scans free text for `@DisplayName` tokens against a snapshot of the user
//! directory and produces two things: the set of mentioned user ids (for
//! notification fan-out) and an HTML-escaped copy of the text with every
//! resolved mention wrapped in a highlight span.
//!
//! Matching tries the longest known display name first so that `@Jonathan`
//! is never swallowed by a shorter directory entry like `Jon`. Name
//! comparison is ASCII-case-insensitive. Unresolved `@token`s are left as
//! plain escaped text.

use crate::types::UserId;

/// One row of the cached user directory, as the mention engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: UserId,
    pub display_name: String,
}

/// Result of scanning one body of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionScan {
    /// Ids of resolved mention targets, deduplicated, author excluded.
    pub tagged: Vec<UserId>,
    /// HTML-escaped body with resolved mentions wrapped in
    /// `<span class="mention">…</span>`.
    pub html: String,
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Resolve `@name` mentions in `raw` against `directory`.
///
/// `author` is the id of whoever wrote the text; self-mentions are
/// highlighted but never produce a notification target.
pub fn resolve_mentions(raw: &str, directory: &[DirectoryEntry], author: UserId) -> MentionScan {
    // Longest display name first, so a prefix never shadows the full name.
    let mut ordered: Vec<&DirectoryEntry> = directory
        .iter()
        .filter(|e| !e.display_name.is_empty())
        .collect();
    ordered.sort_by(|a, b| {
        b.display_name
            .chars()
            .count()
            .cmp(&a.display_name.chars().count())
    });

    let mut html = String::with_capacity(raw.len() + 32);
    let mut tagged: Vec<UserId> = Vec::new();

    let mut plain_start = 0usize;
    let mut i = 0usize;
    while i < raw.len() {
        if raw.as_bytes()[i] == b'@' {
            let after = &raw[i + 1..];
            if let Some((entry, name_len)) = ordered
                .iter()
                .find_map(|e| match_name(after, &e.display_name).map(|len| (*e, len)))
            {
                html.push_str(&escape_html(&raw[plain_start..i]));
                html.push_str("<span class=\"mention\">");
                html.push_str(&escape_html(&raw[i..i + 1 + name_len]));
                html.push_str("</span>");

                if entry.id != author && !tagged.contains(&entry.id) {
                    tagged.push(entry.id);
                }

                i += 1 + name_len;
                plain_start = i;
                continue;
            }
        }
        // Not a mention start; skip one char.
        i += raw[i..].chars().next().map(char::len_utf8).unwrap_or(1);
    }
    html.push_str(&escape_html(&raw[plain_start..]));

    MentionScan { tagged, html }
}

/// If `text` starts with `name` (ASCII-case-insensitive) followed by a word
/// boundary, return the byte length of the matched prefix.
fn match_name(text: &str, name: &str) -> Option<usize> {
    let mut len = 0usize;
    let mut text_chars = text.chars();
    for nch in name.chars() {
        let tch = text_chars.next()?;
        if !tch.eq_ignore_ascii_case(&nch) {
            return None;
        }
        len += tch.len_utf8();
    }

    // The char after the name must not continue an identifier, otherwise
    // we would partial-match inside a longer word.
    match text[len..].chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(names: &[&str]) -> Vec<DirectoryEntry> {
        names
            .iter()
            .map(|n| DirectoryEntry {
                id: UserId::new(),
                display_name: n.to_string(),
            })
            .collect()
    }

    fn id_of<'a>(dir: &'a [DirectoryEntry], name: &str) -> UserId {
        dir.iter().find(|e| e.display_name == name).unwrap().id
    }

    #[test]
    fn longest_name_wins_over_prefix() {
        let dir = directory(&["Jon", "Jonathan"]);
        let scan = resolve_mentions("ping @Jonathan and @Jon", &dir, UserId::new());

        assert_eq!(
            scan.tagged,
            vec![id_of(&dir, "Jonathan"), id_of(&dir, "Jon")]
        );
        assert_eq!(
            scan.html,
            "ping <span class=\"mention\">@Jonathan</span> and <span class=\"mention\">@Jon</span>"
        );
    }

    #[test]
    fn prefix_of_unknown_longer_word_stays_plain() {
        // "Jon" is known but "@Jonquil" must not partial-match it.
        let dir = directory(&["Jon"]);
        let scan = resolve_mentions("cc @Jonquil", &dir, UserId::new());

        assert!(scan.tagged.is_empty());
        assert_eq!(scan.html, "cc @Jonquil");
    }

    #[test]
    fn unresolved_token_is_escaped_text() {
        let dir = directory(&["Ada"]);
        let scan = resolve_mentions("hey @nobody <b>bold</b>", &dir, UserId::new());

        assert!(scan.tagged.is_empty());
        assert_eq!(scan.html, "hey @nobody &lt;b&gt;bold&lt;/b&gt;");
    }

    #[test]
    fn author_is_excluded_and_targets_deduplicated() {
        let dir = directory(&["Ada", "Grace"]);
        let author = id_of(&dir, "Ada");
        let scan = resolve_mentions("@Ada @Grace @Grace", &dir, author);

        assert_eq!(scan.tagged, vec![id_of(&dir, "Grace")]);
        // The self-mention is still highlighted.
        assert!(scan.html.starts_with("<span class=\"mention\">@Ada</span>"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let dir = directory(&["Grace"]);
        let scan = resolve_mentions("thanks @grace!", &dir, UserId::new());

        assert_eq!(scan.tagged, vec![id_of(&dir, "Grace")]);
        assert_eq!(
            scan.html,
            "thanks <span class=\"mention\">@grace</span>!"
        );
    }

    #[test]
    fn multi_word_display_name_resolves() {
        let dir = directory(&["Jo", "Jo Ann"]);
        let scan = resolve_mentions("ask @Jo Ann about it", &dir, UserId::new());

        assert_eq!(scan.tagged, vec![id_of(&dir, "Jo Ann")]);
    }

    #[test]
    fn empty_directory_escapes_everything() {
        let scan = resolve_mentions("a & b @x", &[], UserId::new());
        assert!(scan.tagged.is_empty());
        assert_eq!(scan.html, "a &amp; b @x");
    }

    #[test]
    fn escape_html_covers_all_significant_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
