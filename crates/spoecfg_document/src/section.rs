//! Section types shared by all document implementations.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a named section inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// `spoe-agent` section.
    #[serde(rename = "spoe-agent")]
    Agent,
    /// `spoe-message` section.
    #[serde(rename = "spoe-message")]
    Message,
    /// `spoe-group` section.
    #[serde(rename = "spoe-group")]
    Group,
}

impl SectionKind {
    /// All section kinds, in rendering order.
    pub const ALL: [SectionKind; 3] = [Self::Agent, Self::Message, Self::Group];

    /// Returns the keyword that opens this section in the text format.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Agent => "spoe-agent",
            Self::Message => "spoe-message",
            Self::Group => "spoe-group",
        }
    }

    /// Parses a section keyword, returning `None` for anything else.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(s).ok_or_else(|| format!("unknown section kind: {s}"))
    }
}

/// A named section: its name plus the ordered directive lines in its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section name.
    pub name: String,
    /// Directive lines, without indentation.
    ///
    /// Comment lines that appear inside the section body are kept here too,
    /// in file order, so they count towards directive indexes and are
    /// written back indented.
    pub directives: Vec<String>,
}

/// Checks that `name` can be written as a scope or section name.
///
/// Names are a single non-empty token without `[`, `]` or `#`.
pub fn check_name(name: &str) -> DocumentResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "name contains whitespace"
    } else if name.contains(['[', ']', '#']) {
        "name contains '[', ']' or '#'"
    } else {
        return Ok(());
    };
    Err(DocumentError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Checks that `line` can be written as a directive.
///
/// Directives are non-empty single lines without leading or trailing
/// whitespace.
pub fn check_directive(line: &str) -> DocumentResult<()> {
    let reason = if line.trim().is_empty() {
        "directive is empty"
    } else if line.contains(['\n', '\r']) {
        "directive spans several lines"
    } else if line.trim() != line {
        "directive has leading or trailing whitespace"
    } else {
        return Ok(());
    };
    Err(DocumentError::InvalidDirective {
        directive: line.to_string(),
        reason,
    })
}

impl Section {
    /// Creates an empty section.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: Vec::new(),
        }
    }

    /// Adds a directive line (builder style).
    #[must_use]
    pub fn with_directive(mut self, line: impl Into<String>) -> Self {
        self.directives.push(line.into());
        self
    }

    /// Returns the directive at `index`.
    pub fn directive(&self, index: usize) -> DocumentResult<&str> {
        self.directives
            .get(index)
            .map(String::as_str)
            .ok_or(DocumentError::IndexOutOfRange {
                index,
                len: self.directives.len(),
            })
    }

    /// Inserts a directive before `index`. `index == len` appends.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the end, or `InvalidDirective` for a
    /// line that cannot be written back.
    pub fn insert_directive(&mut self, index: usize, line: impl Into<String>) -> DocumentResult<()> {
        if index > self.directives.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: self.directives.len(),
            });
        }
        let line = line.into();
        check_directive(&line)?;
        self.directives.insert(index, line);
        Ok(())
    }

    /// Checks the name and every directive.
    pub fn validate(&self) -> DocumentResult<()> {
        check_name(&self.name)?;
        self.directives.iter().try_for_each(|line| check_directive(line))
    }

    /// Removes and returns the directive at `index`.
    pub fn remove_directive(&mut self, index: usize) -> DocumentResult<String> {
        if index >= self.directives.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: self.directives.len(),
            });
        }
        Ok(self.directives.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_keyword(kind.keyword()), Some(kind));
            assert_eq!(kind.to_string().parse::<SectionKind>().unwrap(), kind);
        }
        assert!(SectionKind::from_keyword("backend").is_none());
    }

    #[test]
    fn directive_index_checks() {
        let mut section = Section::new("agent").with_directive("timeout hello 2s");

        assert_eq!(section.directive(0).unwrap(), "timeout hello 2s");
        assert!(matches!(
            section.directive(1),
            Err(DocumentError::IndexOutOfRange { index: 1, len: 1 })
        ));

        section.insert_directive(1, "use-backend agents").unwrap();
        section.insert_directive(0, "messages check").unwrap();
        assert_eq!(section.directives.len(), 3);
        assert_eq!(section.directive(0).unwrap(), "messages check");

        assert!(section.insert_directive(5, "x").is_err());
        assert_eq!(section.remove_directive(2).unwrap(), "use-backend agents");
        assert!(section.remove_directive(2).is_err());
    }

    #[test]
    fn names_are_single_tokens() {
        for name in ["iprep-agent", "check_client.ip", "grp-1"] {
            assert!(check_name(name).is_ok(), "{name}");
        }
        for name in ["", "two words", "tab\there", "a]", "[a", "a#b"] {
            assert!(
                matches!(check_name(name), Err(DocumentError::InvalidName { .. })),
                "{name:?}"
            );
        }
    }

    #[test]
    fn invalid_directive_is_not_inserted() {
        let mut section = Section::new("agent").with_directive("timeout hello 2s");

        for line in ["", "  ", "trailing ", "two\nlines", "cr\rlf"] {
            assert!(matches!(
                section.insert_directive(0, line),
                Err(DocumentError::InvalidDirective { .. })
            ));
        }
        assert_eq!(section.directives, vec!["timeout hello 2s"]);
        assert!(section.validate().is_ok());

        section.directives.push("a\nb".into());
        assert!(section.validate().is_err());
    }
}
