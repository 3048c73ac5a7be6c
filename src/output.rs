//! CLI output formatting.
//!
//! Every command has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! Entities follow the same two-level pattern: a header line with a
//! positional index, then indented context lines.
//!
//! # Output Format
//!
//! ## Update
//!
//! ```text
//! Links (symbolic)
//! 001 photo_0.jpg
//!     Source: /photos/2020 _noah_/a.jpg
//! 002 photo_1.JPG
//!     Source: /photos/100_1213 _baby nipples_.JPG
//!
//! Scanned 12 photos, linked 2
//! Cache: saved
//! ```
//!
//! ## Status
//!
//! ```text
//! Ingest directories
//! 001 /photos
//!
//! Filter
//!     Required: noah
//!     Disallowed: blurry
//!     Expression: beach | park
//!
//! Order: any
//! Link type: symbolic
//! Photos: 12
//! ```
//!
//! ## List
//!
//! ```text
//! 001 a.jpg (2020-07-01)
//!     Source: /photos/2020 _noah_/a.jpg
//!     Tags: beach, noah
//! ```

use crate::link::{self, LinkMap};
use crate::repo::UpdateSummary;
use crate::types::{LinkType, PhotoRecord, RepoState};
use std::path::Path;

/// Format a positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

// ============================================================================
// Update
// ============================================================================

/// Format the result of a full update: links by index, then totals.
pub fn format_update_output(
    summary: &UpdateSummary,
    links: &LinkMap,
    link_type: LinkType,
) -> Vec<String> {
    let mut lines = vec![format!("Links ({link_type})")];

    let mut ordered: Vec<(usize, String, &Path)> = links
        .iter()
        .map(|(source, link)| {
            let name = link
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let index = link::link_index(&name).unwrap_or(usize::MAX);
            (index, name, source.as_path())
        })
        .collect();
    ordered.sort_by_key(|(index, _, _)| *index);

    for (pos, (_, name, source)) in ordered.into_iter().enumerate() {
        lines.push(format!("{} {}", format_index(pos + 1), name));
        lines.push(format!("{}Source: {}", indent(1), source.display()));
    }

    lines.push(String::new());
    lines.push(format!(
        "Scanned {} photos, linked {}",
        summary.scanned, summary.matched
    ));
    if summary.saved {
        lines.push("Cache: saved".to_string());
    } else {
        lines.push("Cache: not saved (previous cache failed to load; rerun with --force)".to_string());
    }
    lines
}

pub fn print_update_output(summary: &UpdateSummary, links: &LinkMap, link_type: LinkType) {
    for line in format_update_output(summary, links, link_type) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

/// Format the repository settings and photo count.
pub fn format_status(state: &RepoState) -> Vec<String> {
    let mut lines = vec!["Ingest directories".to_string()];
    if state.ingest_dirs.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, dir) in state.ingest_dirs.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), dir.display()));
    }

    lines.push(String::new());
    lines.push("Filter".to_string());
    let filter = &state.filter;
    lines.push(format!(
        "{}Required: {}",
        indent(1),
        join_or_none(filter.required().iter().map(String::as_str))
    ));
    lines.push(format!(
        "{}Disallowed: {}",
        indent(1),
        join_or_none(filter.disallowed().iter().map(String::as_str))
    ));
    for expr in filter.bool_expr() {
        lines.push(format!("{}Expression: {}", indent(1), expr));
    }

    lines.push(String::new());
    lines.push(format!("Order: {}", state.order));
    lines.push(format!("Link type: {}", state.link_type));
    lines.push(format!("Photos: {}", state.photos.len()));
    lines
}

pub fn print_status(state: &RepoState) {
    for line in format_status(state) {
        println!("{}", line);
    }
}

// ============================================================================
// List
// ============================================================================

/// Format matching photos in link order.
pub fn format_photo_list(photos: &[(&Path, &PhotoRecord)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (path, record)) in photos.iter().enumerate() {
        let header = match record.date {
            Some(date) => format!("{} {} ({})", format_index(i + 1), record.basename, date),
            None => format!("{} {}", format_index(i + 1), record.basename),
        };
        lines.push(header);
        lines.push(format!("{}Source: {}", indent(1), path.display()));
        if !record.tags.is_empty() {
            lines.push(format!(
                "{}Tags: {}",
                indent(1),
                join_or_none(record.tags.iter().map(String::as_str))
            ));
        }
    }
    if lines.is_empty() {
        lines.push("No matching photos".to_string());
    }
    lines
}

pub fn print_photo_list(photos: &[(&Path, &PhotoRecord)]) {
    for line in format_photo_list(photos) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::tag_set;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn update_output_lists_links_by_index() {
        let mut links = LinkMap::new();
        links.insert(PathBuf::from("/p/z.jpg"), PathBuf::from("/out/photo_0.jpg"));
        links.insert(PathBuf::from("/p/a.png"), PathBuf::from("/out/photo_1.png"));
        let summary = UpdateSummary {
            scanned: 5,
            matched: 2,
            saved: true,
        };

        let lines = format_update_output(&summary, &links, LinkType::Symbolic);

        assert_eq!(
            lines,
            vec![
                "Links (symbolic)",
                "001 photo_0.jpg",
                "    Source: /p/z.jpg",
                "002 photo_1.png",
                "    Source: /p/a.png",
                "",
                "Scanned 5 photos, linked 2",
                "Cache: saved",
            ]
        );
    }

    #[test]
    fn update_output_mentions_unsaved_cache() {
        let summary = UpdateSummary {
            scanned: 0,
            matched: 0,
            saved: false,
        };
        let lines = format_update_output(&summary, &LinkMap::new(), LinkType::Test);
        assert_eq!(lines[0], "Links (test)");
        assert!(lines.last().unwrap().contains("--force"));
    }

    #[test]
    fn status_shows_settings() {
        let mut state = RepoState::default();
        state.ingest_dirs.push(PathBuf::from("/photos"));
        state
            .filter
            .add_filter(&["noah"], &[], &["beach | park"])
            .unwrap();

        let lines = format_status(&state);

        assert_eq!(lines[0], "Ingest directories");
        assert_eq!(lines[1], "001 /photos");
        assert!(lines.contains(&"    Required: noah".to_string()));
        assert!(lines.contains(&"    Disallowed: (none)".to_string()));
        assert!(lines.contains(&"    Expression: beach | park".to_string()));
        assert!(lines.contains(&"Order: any".to_string()));
        assert!(lines.contains(&"Link type: symbolic".to_string()));
        assert_eq!(lines.last().unwrap(), "Photos: 0");
    }

    #[test]
    fn photo_list_shows_date_and_tags() {
        let record = PhotoRecord {
            tags: tag_set(&["noah", "beach"]),
            date: NaiveDate::from_ymd_opt(2020, 7, 1),
            basename: "a.jpg".into(),
        };
        let path = PathBuf::from("/p/a.jpg");

        let lines = format_photo_list(&[(path.as_path(), &record)]);

        assert_eq!(
            lines,
            vec![
                "001 a.jpg (2020-07-01)",
                "    Source: /p/a.jpg",
                "    Tags: beach, noah",
            ]
        );
    }

    #[test]
    fn empty_photo_list() {
        assert_eq!(format_photo_list(&[]), vec!["No matching photos"]);
    }
}
