//! Comment-preserving rewrite of a re-serialized POM.
//!
//! The XML model drops comments on parse, so the original file's raw text is
//! scanned line by line to capture every standalone comment together with the
//! structural path of the elements around it, and the captured comments are
//! re-inserted into the freshly marshaled document at the structurally
//! equivalent location. Treats XML as line-oriented text on purpose: the
//! marshaled output puts one tag per line, and anchoring on tag paths keeps
//! the original comment bytes untouched.

use crate::error::{PombumpError, Result};
use crate::validation::validate_file_path;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

pub(crate) const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub(crate) const MAX_LINE_COUNT: usize = 100_000;

/// Bare tag names only: namespace prefixes and attributes are not part of
/// the tracked path.
static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9._-]*)[^>]*>").expect("Invalid regex"));
static CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</([a-zA-Z][a-zA-Z0-9._-]*)>").expect("Invalid regex"));
static SELF_CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9._-]*)[^>]*/\s*>").expect("Invalid regex"));

/// Where a captured comment re-attaches in the rebuilt document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Appeared before the `<?xml` declaration.
    PreDeclaration,
    /// Appeared after the `</project>` closing line.
    EndOfFile,
    /// Anchored to element paths inside the document.
    InDocument,
}

/// One extracted comment with its positional context.
#[derive(Debug, Clone)]
struct CommentBlock {
    /// Raw comment lines, byte-for-byte as captured.
    content: Vec<String>,
    /// Path of the element the comment trails.
    after_xpath: Option<String>,
    /// Path of the element immediately following the comment.
    before_xpath: Option<String>,
    placement: Placement,
    /// Original line number, for stable ordering among ties.
    line_number: usize,
    /// Leading whitespace width of the first captured line.
    indent: usize,
}

/// Merges the comments of the original file at `input_path` into the newly
/// marshaled `output_content`.
///
/// An empty `output_content` yields an empty result. Comments whose anchor
/// no longer exists in the new document are dropped silently; the patch
/// pipeline only edits and adds elements, so anchors normally survive.
pub fn preserve_comments(input_path: &Path, output_content: &[u8]) -> Result<Vec<u8>> {
    validate_file_path(&input_path.to_string_lossy())?;

    let meta = std::fs::metadata(input_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PombumpError::NotFound {
                path: input_path.display().to_string(),
                source: e,
            }
        } else {
            PombumpError::Io(e)
        }
    })?;
    if meta.len() > MAX_FILE_SIZE {
        return Err(PombumpError::resource_limit(format!(
            "file too large: {} bytes (max: {})",
            meta.len(),
            MAX_FILE_SIZE
        )));
    }

    let original = std::fs::read_to_string(input_path)?;
    let comments = extract_all_comments(&original)?;
    debug!(
        "extracted {} comment blocks from {}",
        comments.len(),
        input_path.display()
    );

    if output_content.is_empty() {
        return Ok(Vec::new());
    }

    let output = String::from_utf8_lossy(output_content);
    Ok(insert_comments(&output, comments).into_bytes())
}

/// Single linear scan of the original text: captures standalone comments
/// with their structural context. Inline comments (sharing a line with
/// non-comment XML content) are dropped.
fn extract_all_comments(original: &str) -> Result<Vec<CommentBlock>> {
    let lines: Vec<&str> = original.lines().collect();
    if lines.len() > MAX_LINE_COUNT {
        return Err(PombumpError::resource_limit(format!(
            "file has too many lines: {} (max: {})",
            lines.len(),
            MAX_LINE_COUNT
        )));
    }

    let project_close_line = lines.iter().position(|l| l.contains("</project>"));

    let mut pre_declaration: Vec<CommentBlock> = Vec::new();
    let mut comments: Vec<CommentBlock> = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut found_declaration = false;

    let mut in_comment = false;
    let mut current: Vec<String> = Vec::new();
    let mut comment_start = 0usize;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with("<?xml") {
            found_declaration = true;
        }

        if !in_comment && line.contains("<!--") {
            in_comment = true;
            comment_start = i;
            current = vec![(*line).to_string()];

            if line.contains("-->") {
                // Single-line comment. Dropped entirely when it shares the
                // line with markup.
                if has_non_comment_content(line) {
                    in_comment = false;
                    current.clear();
                    continue;
                }
                let block = classify_comment(
                    std::mem::take(&mut current),
                    comment_start,
                    found_declaration,
                    project_close_line,
                    &path,
                    lines.get(i + 1).copied(),
                );
                match block.placement {
                    Placement::PreDeclaration => pre_declaration.push(block),
                    _ => comments.push(block),
                }
                in_comment = false;
            }
            continue;
        }

        if in_comment {
            current.push((*line).to_string());
            if line.contains("-->") {
                let block = classify_comment(
                    std::mem::take(&mut current),
                    comment_start,
                    found_declaration,
                    project_close_line,
                    &path,
                    lines.get(i + 1).copied(),
                );
                match block.placement {
                    Placement::PreDeclaration => pre_declaration.push(block),
                    _ => comments.push(block),
                }
                in_comment = false;
            }
            continue;
        }

        track_path(trimmed, &mut path);
    }

    pre_declaration.extend(comments);
    Ok(pre_declaration)
}

/// Updates the running open-tag stack for one non-comment line.
fn track_path(trimmed: &str, path: &mut Vec<String>) {
    // A self-closing tag neither opens nor closes a path segment.
    if SELF_CLOSING_TAG.is_match(trimmed) {
        return;
    }
    if let Some(caps) = OPEN_TAG.captures(trimmed) {
        path.push(caps[1].to_string());
    }
    if let Some(caps) = CLOSE_TAG.captures(trimmed)
        && path.last().is_some_and(|top| *top == caps[1])
    {
        path.pop();
    }
}

fn classify_comment(
    content: Vec<String>,
    line_number: usize,
    found_declaration: bool,
    project_close_line: Option<usize>,
    path: &[String],
    next_line: Option<&str>,
) -> CommentBlock {
    let indent = content
        .first()
        .map_or(0, |l| l.len() - l.trim_start_matches([' ', '\t']).len());

    if !found_declaration {
        return CommentBlock {
            content,
            after_xpath: None,
            before_xpath: None,
            placement: Placement::PreDeclaration,
            line_number,
            indent,
        };
    }

    if project_close_line.is_some_and(|close| close > 0 && line_number > close) {
        return CommentBlock {
            content,
            after_xpath: None,
            before_xpath: None,
            placement: Placement::EndOfFile,
            line_number,
            indent,
        };
    }

    let after_xpath = if path.is_empty() {
        None
    } else {
        Some(format!("/{}", path.join("/")))
    };

    // One-line look-ahead: anchor the comment in front of the next element.
    // relativePath is commonly self-closing and optional, an unreliable
    // anchor.
    let before_xpath = next_line
        .and_then(|line| OPEN_TAG.captures(line.trim()))
        .map(|caps| caps[1].to_string())
        .filter(|tag| tag != "relativePath")
        .map(|tag| {
            let mut extended = path.to_vec();
            extended.push(tag);
            format!("/{}", extended.join("/"))
        });

    CommentBlock {
        content,
        after_xpath,
        before_xpath,
        placement: Placement::InDocument,
        line_number,
        indent,
    }
}

/// True when a line carries XML content outside the comment markers.
fn has_non_comment_content(line: &str) -> bool {
    let (Some(start), Some(end)) = (line.find("<!--"), line.find("-->")) else {
        return false;
    };
    !line[..start].trim().is_empty() || !line[end + 3..].trim().is_empty()
}

/// Single linear scan of the marshaled text, rebuilding the structural path
/// the same way and emitting each captured comment at most once.
fn insert_comments(output: &str, comments: Vec<CommentBlock>) -> String {
    if comments.is_empty() {
        return output.to_string();
    }

    let mut pre_declaration: Vec<&CommentBlock> = Vec::new();
    let mut end_of_file: Vec<&CommentBlock> = Vec::new();
    let mut regular: Vec<&CommentBlock> = Vec::new();
    for comment in &comments {
        match comment.placement {
            Placement::PreDeclaration => pre_declaration.push(comment),
            Placement::EndOfFile => end_of_file.push(comment),
            // A comment with no anchor on either side (e.g. floating between
            // the declaration and the root element) has nowhere to attach;
            // keep it by emitting it at the top of the file.
            Placement::InDocument
                if comment.after_xpath.is_none() && comment.before_xpath.is_none() =>
            {
                pre_declaration.push(comment);
            }
            Placement::InDocument => regular.push(comment),
        }
    }

    let mut lines: Vec<&str> = output.lines().collect();
    let mut result: Vec<String> = Vec::new();

    if let Some(decl_idx) = lines.iter().position(|l| l.contains("<?xml")) {
        for comment in &pre_declaration {
            result.extend(comment.content.iter().cloned());
        }
        lines.drain(..decl_idx);
    } else if !pre_declaration.is_empty() {
        for comment in &pre_declaration {
            result.extend(comment.content.iter().cloned());
        }
    }

    let mut inserted = vec![false; regular.len()];
    let mut path: Vec<String> = Vec::new();

    for line in &lines {
        let trimmed = line.trim();

        if let Some(caps) = SELF_CLOSING_TAG.captures(trimmed) {
            let full_path = extend_path(&path, &caps[1]);
            emit_first_match(&regular, &mut inserted, &full_path, &mut result);
        } else if let Some(caps) = OPEN_TAG.captures(trimmed) {
            let tag = caps[1].to_string();
            let full_path = extend_path(&path, &tag);
            emit_first_match(&regular, &mut inserted, &full_path, &mut result);
            path.push(tag);
        }

        result.push((*line).to_string());

        // The top-of-file copyright case: a comment logically inside
        // <project> but ahead of any child element.
        if line.contains("<project") {
            for (i, comment) in regular.iter().enumerate() {
                if !inserted[i]
                    && comment.after_xpath.as_deref() == Some("/project")
                    && !comment
                        .before_xpath
                        .as_deref()
                        .is_some_and(|b| b.starts_with("/project/"))
                {
                    result.extend(comment.content.iter().cloned());
                    inserted[i] = true;
                }
            }
        }

        if let Some(caps) = CLOSE_TAG.captures(trimmed)
            && path.last().is_some_and(|top| *top == caps[1])
        {
            path.pop();
        }
    }

    for comment in &end_of_file {
        result.extend(comment.content.iter().cloned());
    }

    let mut merged = result.join("\n");
    if output.ends_with('\n') {
        merged.push('\n');
    }
    merged
}

fn extend_path(path: &[String], tag: &str) -> String {
    let mut extended = path.to_vec();
    extended.push(tag.to_string());
    format!("/{}", extended.join("/"))
}

/// Emits the first not-yet-inserted comment anchored in front of
/// `full_path`, consuming at most one per tag occurrence so repeated
/// sibling elements pick up their comments in original order.
fn emit_first_match(
    regular: &[&CommentBlock],
    inserted: &mut [bool],
    full_path: &str,
    result: &mut Vec<String>,
) {
    for (i, comment) in regular.iter().enumerate() {
        if !inserted[i] && comment.before_xpath.as_deref() == Some(full_path) {
            result.extend(comment.content.iter().cloned());
            inserted[i] = true;
            return;
        }
    }
}
