//! Pre-commit text normalization and document diagnostics

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::task::File;

/// Fixes with fewer characters than this are treated as a fixer malfunction
pub const MIN_FIX_LEN: usize = 8;

/// Deterministic text cleanup applied to each edited file before commit
pub trait Normalizer: Send + Sync {
    /// Return the cleaned text, or `None` when nothing needed fixing
    fn fix(&self, text: &str) -> Option<String>;
}

/// Whether a normalizer result may replace `input`
///
/// The result must be at least [`MIN_FIX_LEN`] characters and actually
/// differ from the input.
pub fn accept_fix(input: &str, fixed: Option<&str>) -> bool {
    match fixed {
        Some(fixed) => fixed.chars().count() >= MIN_FIX_LEN && fixed != input,
        None => false,
    }
}

/// Run `normalizer` over every locally changed file
///
/// Returns the updated file map and the paths whose edits were replaced.
/// The input map is left untouched.
pub fn apply_fixes(
    files: &BTreeMap<String, File>,
    normalizer: &dyn Normalizer,
) -> (BTreeMap<String, File>, Vec<String>) {
    let mut fixed_files = files.clone();
    let mut changed = Vec::new();

    for (path, file) in fixed_files.iter_mut() {
        let Some(edited) = file.edited_content.as_deref() else {
            continue;
        };
        if edited == file.content {
            continue;
        }

        let fixed = normalizer.fix(edited);
        if !accept_fix(edited, fixed.as_deref()) {
            if let Some(ref rejected) = fixed {
                let chars = rejected.chars().count();
                if chars < MIN_FIX_LEN {
                    warn!(path = %path, chars, "Discarding implausibly short fix");
                }
            }
            continue;
        }

        debug!(path = %path, "Applied lint fix");
        file.edited_content = fixed;
        changed.push(path.clone());
    }

    (fixed_files, changed)
}

/// Whitespace cleanup for asciidoc sources
///
/// Normalizes line endings to `\n`, strips trailing whitespace, collapses
/// runs of more than two blank lines, and ends the document with exactly
/// one newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciidocNormalizer;

impl Normalizer for AsciidocNormalizer {
    fn fix(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut blank_run = 0;

        for line in text.replace("\r\n", "\n").split('\n') {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 2 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }

        let trimmed_len = out.trim_end_matches('\n').len();
        out.truncate(trimmed_len);
        out.push('\n');

        if out == text {
            None
        } else {
            Some(out)
        }
    }
}

/// A structural problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// Structural checks run for information only; never blocks a submission
pub trait Validator: Send + Sync {
    fn validate(&self, text: &str) -> Vec<Diagnostic>;
}

/// Flags delimited blocks that are opened but never closed
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockValidator;

const BLOCK_DELIMITERS: [&str; 5] = ["____", "----", "====", "****", "...."];

impl Validator for BlockValidator {
    fn validate(&self, text: &str) -> Vec<Diagnostic> {
        let mut open: Vec<(&str, usize)> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end();
            let Some(delim) = BLOCK_DELIMITERS.iter().copied().find(|d| *d == line) else {
                continue;
            };
            match open.last() {
                Some((top, _)) if *top == delim => {
                    open.pop();
                }
                _ => open.push((delim, idx + 1)),
            }
        }

        open.into_iter()
            .map(|(delim, line)| Diagnostic {
                line,
                message: format!("block opened with `{}` is never closed", delim),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl Normalizer for Fixed {
        fn fix(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn test_accept_fix_rules() {
        assert!(!accept_fix("input text", Some("ok")));
        assert!(!accept_fix("identical!", Some("identical!")));
        assert!(accept_fix("input text", Some("0123456789")));
        assert!(!accept_fix("input text", None));
    }

    #[test]
    fn test_accept_fix_counts_characters() {
        // eight bytes, four characters
        assert!(!accept_fix("input text", Some("éééé")));
        assert!(accept_fix("input text", Some("ééééé ééé")));
    }

    fn one_file(edit: &str) -> BTreeMap<String, File> {
        let mut files = BTreeMap::new();
        files.insert(
            "doc.adoc".to_string(),
            File::new("doc.adoc", "s", "original").with_edit(edit),
        );
        files
    }

    #[test]
    fn test_short_fix_discarded() {
        let files = one_file("edited text");
        let (out, changed) = apply_fixes(&files, &Fixed(Some("ok")));
        assert!(changed.is_empty());
        assert_eq!(out, files);
    }

    #[test]
    fn test_short_multibyte_fix_discarded() {
        let files = one_file("edited text");
        let (out, changed) = apply_fixes(&files, &Fixed(Some("éééé")));
        assert!(changed.is_empty());
        assert_eq!(out, files);
    }

    #[test]
    fn test_good_fix_applied_without_mutating_input() {
        let files = one_file("edited text");
        let (out, changed) = apply_fixes(&files, &Fixed(Some("0123456789")));
        assert_eq!(changed, vec!["doc.adoc".to_string()]);
        assert_eq!(
            out["doc.adoc"].edited_content.as_deref(),
            Some("0123456789")
        );
        assert_eq!(
            files["doc.adoc"].edited_content.as_deref(),
            Some("edited text")
        );
    }

    #[test]
    fn test_untouched_files_skipped() {
        let mut files = BTreeMap::new();
        files.insert("a".to_string(), File::new("a", "s", "original"));
        files.insert(
            "b".to_string(),
            File::new("b", "s", "original").with_edit("original"),
        );
        let (_, changed) = apply_fixes(&files, &Fixed(Some("0123456789")));
        assert!(changed.is_empty());
    }

    #[test]
    fn test_asciidoc_normalizer() {
        let n = AsciidocNormalizer;
        assert_eq!(
            n.fix("== Title  \r\n\r\n\r\n\r\nText\t\n\n").as_deref(),
            Some("== Title\n\n\nText\n")
        );
        assert_eq!(n.fix("== Title\n\nText\n"), None);
    }

    #[test]
    fn test_block_validator() {
        let v = BlockValidator;
        assert!(v.validate("____\nquote\n____\n").is_empty());

        let diags = v.validate("intro\n____\nquote never closed\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 2);
    }

    #[test]
    fn test_block_validator_nested() {
        let v = BlockValidator;
        assert!(v.validate("====\n----\ncode\n----\n====\n").is_empty());
    }
}
