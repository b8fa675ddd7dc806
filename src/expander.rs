use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    // `*` never matches a leading dot, so hidden entries only match when the
    // pattern itself starts with `.`.
    require_literal_leading_dot: true,
};

/// Expand a token containing `*` against a directory and append the results
/// to `args`.
///
/// The directory is the text before the last `/` (or `.`); the rest of the
/// token is split at its first `*` into a prefix and a suffix. Matches are
/// appended in directory order with the token's directory part kept in
/// front. When the directory can't be read or nothing matches, the token is
/// appended unchanged.
pub fn expand_wildcard(token: &str, args: &mut Vec<String>) {
    let before = args.len();
    append_matches(token, args);
    if args.len() == before {
        args.push(token.to_string());
    }
}

fn append_matches(token: &str, args: &mut Vec<String>) {
    let (dir, lead, file_pattern) = match token.rfind('/') {
        Some(0) => ("/", "/", &token[1..]),
        Some(i) => (&token[..i], &token[..=i], &token[i + 1..]),
        None => (".", "", token),
    };

    let Some((prefix, suffix)) = file_pattern.split_once('*') else {
        return;
    };

    let pattern = format!("{}*{}", Pattern::escape(prefix), Pattern::escape(suffix));
    let Ok(pattern) = Pattern::new(&pattern) else {
        return;
    };

    let Ok(entries) = fs::read_dir(Path::new(dir)) else {
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if pattern.matches_with(name, MATCH_OPTIONS) {
            args.push(format!("{lead}{name}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn scratch(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "").unwrap();
        }
        dir
    }

    fn expand(token: &str) -> Vec<String> {
        let mut args = Vec::new();
        expand_wildcard(token, &mut args);
        args
    }

    fn names(dir: &Path, found: Vec<String>) -> BTreeSet<String> {
        let lead = format!("{}/", dir.display());
        found
            .into_iter()
            .map(|p| p.strip_prefix(&lead).expect("directory kept in front").to_string())
            .collect()
    }

    #[test]
    fn suffix_match() {
        let dir = scratch(&["a.c", "b.c", "c.h", "notc"]);
        let found = expand(&format!("{}/*.c", dir.path().display()));
        assert_eq!(names(dir.path(), found), BTreeSet::from(["a.c".into(), "b.c".into()]));
    }

    #[test]
    fn prefix_and_suffix_match() {
        let dir = scratch(&["test_one.rs", "test_two.txt", "main.rs", "test_.rs"]);
        let found = expand(&format!("{}/test_*.rs", dir.path().display()));
        assert_eq!(
            names(dir.path(), found),
            BTreeSet::from(["test_one.rs".into(), "test_.rs".into()])
        );
    }

    #[test]
    fn prefix_and_suffix_cannot_overlap() {
        let dir = scratch(&["aba", "ab"]);
        let found = expand(&format!("{}/ab*ba", dir.path().display()));
        // "aba" starts with "ab" and ends with "ba" but is too short
        assert_eq!(found, vec![format!("{}/ab*ba", dir.path().display())]);
    }

    #[test]
    fn hidden_entries_skipped_by_default() {
        let dir = scratch(&[".hidden", "visible"]);
        let found = expand(&format!("{}/*", dir.path().display()));
        assert_eq!(names(dir.path(), found), BTreeSet::from(["visible".into()]));
    }

    #[test]
    fn dot_prefix_matches_hidden_entries() {
        let dir = scratch(&[".bashrc", ".profile", "visible"]);
        let found = expand(&format!("{}/.*", dir.path().display()));
        assert_eq!(
            names(dir.path(), found),
            BTreeSet::from([".bashrc".into(), ".profile".into()])
        );
    }

    #[test]
    fn no_match_keeps_literal() {
        let dir = scratch(&["a.txt"]);
        let token = format!("{}/*.c", dir.path().display());
        assert_eq!(expand(&token), vec![token]);
    }

    #[test]
    fn unreadable_directory_keeps_literal() {
        assert_eq!(expand("/definitely/not/here/*.c"), vec!["/definitely/not/here/*.c"]);
    }

    #[test]
    fn glob_metacharacters_in_prefix_are_literal() {
        let dir = scratch(&["[x]1", "x1"]);
        let found = expand(&format!("{}/[x]*", dir.path().display()));
        assert_eq!(names(dir.path(), found), BTreeSet::from(["[x]1".into()]));
    }

    #[test]
    fn bare_pattern_searches_current_dir_without_prefix() {
        // cargo runs unit tests from the package root
        let found = expand("Cargo.*");
        assert!(found.iter().any(|name| name == "Cargo.toml"), "found: {found:?}");
        assert!(found.iter().all(|name| !name.contains('/')), "found: {found:?}");
    }

    #[test]
    fn root_pattern_searches_root_dir() {
        let found = expand("/tm*");
        assert!(found.iter().any(|path| path == "/tmp"), "found: {found:?}");
        assert!(found.iter().all(|path| !path.starts_with("//")), "found: {found:?}");
    }

    #[test]
    fn appends_after_existing_args() {
        let dir = scratch(&["only.c"]);
        let mut args = vec!["ls".to_string()];
        expand_wildcard(&format!("{}/*.c", dir.path().display()), &mut args);
        assert_eq!(args, vec!["ls".to_string(), format!("{}/only.c", dir.path().display())]);
    }
}
