//! SPOE configuration text format.
//!
//! ```text
//! # _version=3
//! [ip-reputation]
//! spoe-agent iprep-agent
//!     messages check-client-ip
//!     timeout processing 10ms
//!
//! spoe-message check-client-ip
//!     args ip=src
//!     event on-client-session
//! ```
//!
//! The `# _version=N` comment is the version marker. A file without one is
//! treated as version 1. Blank lines carry no meaning; other comments stay
//! attached to the scope or section they appear in.

use crate::document::ConfigDocument;
use crate::error::{DocumentError, DocumentResult};
use crate::section::{check_name, Section, SectionKind};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of the version marker comment.
const VERSION_PREFIX: &str = "# _version=";

/// Version assigned to documents that carry no marker.
pub const DEFAULT_VERSION: i64 = 1;

/// Indentation used for directive lines when rendering.
const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scope {
    name: String,
    comments: Vec<String>,
    sections: Vec<(SectionKind, Section)>,
}

impl Scope {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            comments: Vec::new(),
            sections: Vec::new(),
        }
    }

    fn position(&self, kind: SectionKind, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|(k, s)| *k == kind && s.name == name)
    }
}

/// A parsed SPOE configuration file.
///
/// # Example
///
/// ```rust
/// use spoecfg_document::{ConfigDocument, SectionKind, SpoeDocument};
///
/// let doc: SpoeDocument = "# _version=4\n[scope]\nspoe-agent a\n    timeout hello 2s\n"
///     .parse()
///     .unwrap();
/// assert_eq!(doc.version().unwrap(), 4);
/// assert_eq!(doc.sections("scope", SectionKind::Agent).unwrap(), vec!["a"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoeDocument {
    version: i64,
    preamble: Vec<String>,
    scopes: Vec<Scope>,
}

impl Default for SpoeDocument {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            preamble: Vec::new(),
            scopes: Vec::new(),
        }
    }
}

impl SpoeDocument {
    /// Creates an empty document at the default version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a document from text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` with the offending line number on malformed input.
    pub fn parse(text: &str) -> DocumentResult<Self> {
        let mut doc = Self::new();
        let mut version_seen = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let indented = line.starts_with([' ', '\t']);
            let trimmed = line.trim_start();

            if !indented && trimmed.starts_with('#') {
                if let Some(value) = trimmed.strip_prefix(VERSION_PREFIX) {
                    if !version_seen && doc.scopes.is_empty() {
                        doc.version = value.trim().parse().map_err(|_| {
                            DocumentError::parse(line_no, format!("invalid version marker: {value}"))
                        })?;
                        version_seen = true;
                        continue;
                    }
                }
                doc.attach_comment(trimmed);
                continue;
            }

            if indented {
                let (_, section) = doc
                    .scopes
                    .last_mut()
                    .and_then(|s| s.sections.last_mut())
                    .ok_or_else(|| DocumentError::parse(line_no, "directive outside of a section"))?;
                section.directives.push(trimmed.to_string());
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| DocumentError::parse(line_no, "unterminated scope header"))?
                    .trim();
                if name.is_empty() {
                    return Err(DocumentError::parse(line_no, "empty scope name"));
                }
                check_name(name).map_err(|e| DocumentError::parse(line_no, e.to_string()))?;
                if doc.scope(name).is_some() {
                    return Err(DocumentError::parse(line_no, format!("duplicate scope [{name}]")));
                }
                doc.scopes.push(Scope::new(name));
                continue;
            }

            let mut words = trimmed.split_whitespace();
            let keyword = words.next().unwrap_or_default();
            let kind = SectionKind::from_keyword(keyword)
                .ok_or_else(|| DocumentError::parse(line_no, format!("unknown keyword: {keyword}")))?;
            let name = words
                .next()
                .ok_or_else(|| DocumentError::parse(line_no, format!("{kind} without a name")))?;
            if words.next().is_some() {
                return Err(DocumentError::parse(
                    line_no,
                    format!("unexpected tokens after {kind} {name}"),
                ));
            }
            check_name(name).map_err(|e| DocumentError::parse(line_no, e.to_string()))?;
            let scope = doc
                .scopes
                .last_mut()
                .ok_or_else(|| DocumentError::parse(line_no, format!("{kind} {name} outside of a scope")))?;
            if scope.position(kind, name).is_some() {
                return Err(DocumentError::parse(line_no, format!("duplicate {kind} {name}")));
            }
            scope.sections.push((kind, Section::new(name)));
        }

        Ok(doc)
    }

    fn attach_comment(&mut self, comment: &str) {
        match self.scopes.last_mut() {
            Some(scope) => match scope.sections.last_mut() {
                Some((_, section)) => section.directives.push(comment.to_string()),
                None => scope.comments.push(comment.to_string()),
            },
            None => self.preamble.push(comment.to_string()),
        }
    }

    /// Checks every scope name, section name and directive.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidName` or `InvalidDirective` found.
    pub fn validate(&self) -> DocumentResult<()> {
        for scope in &self.scopes {
            check_name(&scope.name)?;
            for (_, section) in &scope.sections {
                section.validate()?;
            }
        }
        Ok(())
    }

    fn scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.name == name)
    }

    fn scope_mut(&mut self, name: &str) -> Option<&mut Scope> {
        self.scopes.iter_mut().find(|s| s.name == name)
    }
}

fn section_missing(kind: SectionKind, name: &str) -> DocumentError {
    DocumentError::SectionMissing {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl FromStr for SpoeDocument {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SpoeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{VERSION_PREFIX}{}", self.version)?;
        for line in &self.preamble {
            writeln!(f, "{line}")?;
        }
        for scope in &self.scopes {
            writeln!(f)?;
            writeln!(f, "[{}]", scope.name)?;
            for line in &scope.comments {
                writeln!(f, "{line}")?;
            }
            for (i, (kind, section)) in scope.sections.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "{kind} {}", section.name)?;
                for directive in &section.directives {
                    writeln!(f, "{INDENT}{directive}")?;
                }
            }
        }
        Ok(())
    }
}

impl ConfigDocument for SpoeDocument {
    fn load(path: &Path) -> DocumentResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Validates, writes to `<path>.tmp`, syncs it, then renames it over `path`.
    fn save(&self, path: &Path) -> DocumentResult<()> {
        self.validate()?;
        let temp = temp_path(path);
        let result = File::create(&temp)
            .and_then(|mut file| {
                file.write_all(self.to_string().as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp, path));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn scopes(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.name.clone()).collect()
    }

    fn create_scope(&mut self, scope: &str) -> DocumentResult<()> {
        check_name(scope)?;
        if self.scope(scope).is_some() {
            return Err(DocumentError::ScopeAlreadyExists(scope.to_string()));
        }
        self.scopes.push(Scope::new(scope));
        Ok(())
    }

    fn delete_scope(&mut self, scope: &str) -> DocumentResult<()> {
        let before = self.scopes.len();
        self.scopes.retain(|s| s.name != scope);
        if self.scopes.len() == before {
            return Err(DocumentError::ScopeMissing(scope.to_string()));
        }
        Ok(())
    }

    fn sections(&self, scope: &str, kind: SectionKind) -> DocumentResult<Vec<String>> {
        let scope = self
            .scope(scope)
            .ok_or_else(|| DocumentError::fetch(format!("scope [{scope}]")))?;
        Ok(scope
            .sections
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, s)| s.name.clone())
            .collect())
    }

    fn section(&self, scope: &str, kind: SectionKind, name: &str) -> DocumentResult<&Section> {
        self.scope(scope)
            .and_then(|s| s.sections.iter().find(|(k, sec)| *k == kind && sec.name == name))
            .map(|(_, section)| section)
            .ok_or_else(|| section_missing(kind, name))
    }

    fn section_mut(
        &mut self,
        scope: &str,
        kind: SectionKind,
        name: &str,
    ) -> DocumentResult<&mut Section> {
        self.scope_mut(scope)
            .and_then(|s| {
                s.sections
                    .iter_mut()
                    .find(|(k, sec)| *k == kind && sec.name == name)
            })
            .map(|(_, section)| section)
            .ok_or_else(|| section_missing(kind, name))
    }

    fn create_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: Section,
    ) -> DocumentResult<()> {
        check_name(scope)?;
        section.validate()?;
        if self.scope(scope).is_none() {
            self.scopes.push(Scope::new(scope));
        }
        let target = self
            .scope_mut(scope)
            .ok_or_else(|| DocumentError::ScopeMissing(scope.to_string()))?;
        if target.position(kind, &section.name).is_some() {
            return Err(DocumentError::SectionAlreadyExists {
                kind: kind.to_string(),
                name: section.name,
            });
        }
        target.sections.push((kind, section));
        Ok(())
    }

    fn set_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: Section,
    ) -> DocumentResult<()> {
        section.validate()?;
        let existing = self.section_mut(scope, kind, &section.name)?;
        *existing = section;
        Ok(())
    }

    fn delete_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        name: &str,
    ) -> DocumentResult<()> {
        let target = self
            .scope_mut(scope)
            .ok_or_else(|| section_missing(kind, name))?;
        let pos = target
            .position(kind, name)
            .ok_or_else(|| section_missing(kind, name))?;
        target.sections.remove(pos);
        Ok(())
    }

    fn version(&self) -> DocumentResult<i64> {
        Ok(self.version)
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
# _version=3
# managed by spoecfg
[ip-reputation]
spoe-agent iprep-agent
    messages check-client-ip
    timeout processing 10ms

spoe-message check-client-ip
    args ip=src
    event on-client-session

[waf]
# web application firewall
spoe-agent waf-agent
    use-backend waf
";

    #[test]
    fn parse_sample() {
        let doc = SpoeDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.version().unwrap(), 3);
        assert_eq!(doc.scopes(), vec!["ip-reputation", "waf"]);
        assert_eq!(
            doc.sections("ip-reputation", SectionKind::Agent).unwrap(),
            vec!["iprep-agent"]
        );
        let message = doc
            .section("ip-reputation", SectionKind::Message, "check-client-ip")
            .unwrap();
        assert_eq!(message.directives, vec!["args ip=src", "event on-client-session"]);
        assert!(doc.sections("waf", SectionKind::Group).unwrap().is_empty());
    }

    #[test]
    fn missing_marker_defaults_to_one() {
        let doc = SpoeDocument::parse("[s]\nspoe-group g\n    messages m\n").unwrap();
        assert_eq!(doc.version().unwrap(), DEFAULT_VERSION);
    }

    #[test]
    fn parse_errors_report_line() {
        let cases = [
            ("# _version=x\n", 1),
            ("[s]\nbackend b\n", 2),
            ("    timeout 1s\n", 1),
            ("spoe-agent a\n", 1),
            ("[s]\n\nspoe-agent\n", 3),
            ("[s]\nspoe-agent a\nspoe-agent a\n", 3),
            ("[s]\n[s]\n", 2),
            ("[s\n", 1),
            ("[a b]\n", 1),
            ("[s]\nspoe-agent a[b\n", 2),
        ];
        for (text, expected) in cases {
            match SpoeDocument::parse(text) {
                Err(DocumentError::Parse { line, .. }) => assert_eq!(line, expected, "{text:?}"),
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn render_is_stable() {
        let doc = SpoeDocument::parse(SAMPLE).unwrap();
        let rendered = doc.to_string();
        let reparsed = SpoeDocument::parse(&rendered).unwrap();
        assert_eq!(doc, reparsed);
        assert_eq!(rendered, reparsed.to_string());
    }

    #[test]
    fn save_and_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spoe.cfg");

        let mut doc = SpoeDocument::parse(SAMPLE).unwrap();
        doc.set_version(9);
        doc.save(&path).unwrap();

        let loaded = SpoeDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(!temp.path().join("spoe.cfg.tmp").exists());
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spoe.cfg");
        fs::write(&path, SAMPLE).unwrap();

        let missing_dir = temp.path().join("gone").join("spoe.cfg");
        let doc = SpoeDocument::new();
        assert!(matches!(doc.save(&missing_dir), Err(DocumentError::Io(_))));

        // A directory in the way makes the rename fail after the temp write.
        let blocked = temp.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("child"), "x").unwrap();
        assert!(doc.save(&blocked).is_err());
        assert!(!temp.path().join("blocked.tmp").exists());

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn load_missing_file() {
        let temp = tempdir().unwrap();
        let result = SpoeDocument::load(&temp.path().join("nope.cfg"));
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[test]
    fn section_crud() {
        let mut doc = SpoeDocument::parse(SAMPLE).unwrap();

        let group = Section::new("grp").with_directive("messages check-client-ip");
        doc.create_section("ip-reputation", SectionKind::Group, group.clone())
            .unwrap();
        assert!(matches!(
            doc.create_section("ip-reputation", SectionKind::Group, group),
            Err(DocumentError::SectionAlreadyExists { .. })
        ));

        // Same name, different kind, is a different section.
        doc.create_section("ip-reputation", SectionKind::Agent, Section::new("grp"))
            .unwrap();

        let replacement = Section::new("grp").with_directive("messages other");
        doc.set_section("ip-reputation", SectionKind::Group, replacement.clone())
            .unwrap();
        assert_eq!(
            doc.section("ip-reputation", SectionKind::Group, "grp").unwrap(),
            &replacement
        );
        assert!(matches!(
            doc.set_section("waf", SectionKind::Group, Section::new("grp")),
            Err(DocumentError::SectionMissing { .. })
        ));

        doc.delete_section("ip-reputation", SectionKind::Group, "grp")
            .unwrap();
        assert!(matches!(
            doc.delete_section("ip-reputation", SectionKind::Group, "grp"),
            Err(DocumentError::SectionMissing { .. })
        ));
        assert!(matches!(
            doc.delete_section("nowhere", SectionKind::Agent, "a"),
            Err(DocumentError::SectionMissing { .. })
        ));
    }

    #[test]
    fn create_section_adds_scope() {
        let mut doc = SpoeDocument::new();
        doc.create_section("fresh", SectionKind::Agent, Section::new("a"))
            .unwrap();
        assert_eq!(doc.scopes(), vec!["fresh"]);
    }

    #[test]
    fn scope_crud() {
        let mut doc = SpoeDocument::parse(SAMPLE).unwrap();
        assert!(matches!(
            doc.create_scope("waf"),
            Err(DocumentError::ScopeAlreadyExists(_))
        ));
        doc.create_scope("new").unwrap();
        doc.delete_scope("waf").unwrap();
        assert_eq!(doc.scopes(), vec!["ip-reputation", "new"]);
        assert!(matches!(
            doc.delete_scope("waf"),
            Err(DocumentError::ScopeMissing(_))
        ));
        assert!(matches!(
            doc.sections("waf", SectionKind::Agent),
            Err(DocumentError::Fetch { .. })
        ));
    }

    #[test]
    fn comments_are_preserved() {
        let doc = SpoeDocument::parse(SAMPLE).unwrap();
        let rendered = doc.to_string();
        assert!(rendered.contains("# managed by spoecfg"));
        assert!(rendered.contains("# web application firewall"));
    }

    #[test]
    fn invalid_input_leaves_document_unchanged() {
        let mut doc = SpoeDocument::parse(SAMPLE).unwrap();
        let before = doc.clone();

        for name in ["", "two words", "a]b", "#x", "[s"] {
            assert!(matches!(
                doc.create_scope(name),
                Err(DocumentError::InvalidName { .. })
            ));
            assert!(matches!(
                doc.create_section("fresh", SectionKind::Agent, Section::new(name)),
                Err(DocumentError::InvalidName { .. })
            ));
        }

        for line in ["", "   ", " padded", "one\ntwo", "cr\r"] {
            let section = Section::new("fresh").with_directive(line);
            assert!(matches!(
                doc.create_section("fresh", SectionKind::Agent, section),
                Err(DocumentError::InvalidDirective { .. })
            ));
        }

        let agent = doc.section("ip-reputation", SectionKind::Agent, "iprep-agent").unwrap();
        let replacement = agent.clone().with_directive("x\nspoe-agent injected");
        assert!(matches!(
            doc.set_section("ip-reputation", SectionKind::Agent, replacement),
            Err(DocumentError::InvalidDirective { .. })
        ));

        assert_eq!(doc, before);
    }

    #[test]
    fn save_refuses_invalid_document() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spoe.cfg");
        let mut doc = SpoeDocument::parse(SAMPLE).unwrap();
        doc.section_mut("ip-reputation", SectionKind::Agent, "iprep-agent")
            .unwrap()
            .directives
            .push("timeout 1s\n[evil]".to_string());

        assert!(matches!(
            doc.save(&path),
            Err(DocumentError::InvalidDirective { .. })
        ));
        assert!(!path.exists());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn section_comments_count_as_directives() {
        let text = "[s]\nspoe-agent a\n# note\n    timeout hello 2s\n";
        let doc = SpoeDocument::parse(text).unwrap();

        let section = doc.section("s", SectionKind::Agent, "a").unwrap();
        assert_eq!(section.directive(0).unwrap(), "# note");
        assert_eq!(section.directive(1).unwrap(), "timeout hello 2s");

        let rendered = doc.to_string();
        assert!(rendered.contains("    # note\n"));
        assert_eq!(SpoeDocument::parse(&rendered).unwrap(), doc);
    }

    proptest! {
        #[test]
        fn directives_survive_render(
            version in 1i64..1_000_000,
            lines in prop::collection::vec("[a-z][a-z0-9 =._-]{0,24}[a-z0-9]", 0..8),
        ) {
            let mut doc = SpoeDocument::new();
            doc.set_version(version);
            let mut section = Section::new("agent");
            section.directives = lines;
            doc.create_section("scope", SectionKind::Agent, section.clone()).unwrap();

            let reparsed = SpoeDocument::parse(&doc.to_string()).unwrap();
            prop_assert_eq!(reparsed.version().unwrap(), version);
            prop_assert_eq!(reparsed.section("scope", SectionKind::Agent, "agent").unwrap(), &section);
        }
    }
}
