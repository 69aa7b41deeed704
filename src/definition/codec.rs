// src/definition/codec.rs

//! Definition text format
//!
//! A definition file is a sequence of sections. Each section starts with a
//! tag line (`%%% BUILD`, `%%% META`, ...) and runs until the next tag line or
//! a bare `%%%` terminator. Lines outside any section are ignored, which is
//! where comments and blank separators go.
//!
//! ```text
//! %%% DESCRIPTION
//! Example package
//! %%% META
//! name: foo
//! version: "1.0"
//! sources:
//!   - https://example.com/foo-1.0.tar.gz
//! %%% BUILD
//! tar xf foo-1.0.tar.gz && make -C foo-1.0 DESTDIR="$GUMSHIELD_FAKE_ROOT_DIR" install
//! %%%
//! ```
//!
//! A line that looks like a tag (`%%%` prefix) but names no known section
//! closes the current section and its contents are dropped until the next
//! known tag. Newer files with extra sections therefore still parse.

use super::{PackageDefinition, PackageMetadata, validate_name};
use crate::error::{Error, Result};
use tracing::debug;

const TAG_PREFIX: &str = "%%%";

/// Parser state: which section the current line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Meta,
    Build,
    BeforeInstall,
    AfterInstall,
    Uninstall,
    Files,
}

impl Section {
    /// Sections in serialization order
    const ALL: [Section; 7] = [
        Section::Description,
        Section::Meta,
        Section::Build,
        Section::BeforeInstall,
        Section::AfterInstall,
        Section::Uninstall,
        Section::Files,
    ];

    fn tag(self) -> &'static str {
        match self {
            Section::Description => "%%% DESCRIPTION",
            Section::Meta => "%%% META",
            Section::Build => "%%% BUILD",
            Section::BeforeInstall => "%%% BEFORE INSTALL",
            Section::AfterInstall => "%%% AFTER INSTALL",
            Section::Uninstall => "%%% UNINSTALL",
            Section::Files => "%%% FILES",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Transition taken on a tag-like line, `None` if the line is content
fn transition(line: &str) -> Option<Option<Section>> {
    if !line.starts_with(TAG_PREFIX) {
        return None;
    }
    let next = Section::ALL
        .into_iter()
        .find(|section| line.starts_with(section.tag()));
    Some(next)
}

/// Parse definition text
pub fn parse(content: &str) -> Result<PackageDefinition> {
    let mut sections: [Vec<&str>; 7] = Default::default();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        if let Some(next) = transition(line) {
            if next.is_none() && line.trim_end() != TAG_PREFIX {
                debug!("Ignoring unknown section tag: {}", line);
            }
            current = next;
            continue;
        }
        if let Some(section) = current {
            sections[section.index()].push(line);
        }
    }

    let text = |section: Section| sections[section.index()].join("\n");

    let metadata = parse_metadata(&text(Section::Meta))?;
    validate_name(&metadata.name)?;

    let files = sections[Section::Files.index()]
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();

    Ok(PackageDefinition {
        name: metadata.name,
        version: metadata.version,
        description: text(Section::Description),
        sources: metadata.sources,
        build_logic: text(Section::Build),
        before_install_logic: text(Section::BeforeInstall),
        after_install_logic: text(Section::AfterInstall),
        uninstall_logic: text(Section::Uninstall),
        files,
    })
}

/// Serialize a definition into its text form
///
/// `DESCRIPTION` and `FILES` are written only when non-empty; every other
/// section is always present.
pub fn serialize(pkg: &PackageDefinition) -> Result<String> {
    let mut out = String::new();

    let mut write_section = |section: Section, body: &str| {
        out.push_str(section.tag());
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    };

    if !pkg.description.is_empty() {
        write_section(Section::Description, &pkg.description);
    }

    let meta = serde_yaml::to_string(&pkg.metadata())
        .map_err(|e| Error::ParseError(format!("Failed to serialize META section: {}", e)))?;
    write_section(Section::Meta, &meta);

    write_section(Section::Build, &pkg.build_logic);
    write_section(Section::BeforeInstall, &pkg.before_install_logic);
    write_section(Section::AfterInstall, &pkg.after_install_logic);
    write_section(Section::Uninstall, &pkg.uninstall_logic);

    if !pkg.files.is_empty() {
        write_section(Section::Files, &pkg.files.join("\n"));
    }

    Ok(out)
}

fn parse_metadata(yaml: &str) -> Result<PackageMetadata> {
    if yaml.trim().is_empty() {
        return Ok(PackageMetadata::default());
    }
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::ParseError(format!("Invalid META section: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackageDefinition {
        PackageDefinition {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            description: String::new(),
            sources: vec!["http://x/y.tar".to_string()],
            build_logic: "echo hi".to_string(),
            before_install_logic: "echo b".to_string(),
            after_install_logic: "echo a".to_string(),
            uninstall_logic: "echo u".to_string(),
            files: vec!["bin/foo".to_string()],
        }
    }

    #[test]
    fn test_round_trip() {
        let def = sample();
        let text = serialize(&def).unwrap();
        assert_eq!(parse(&text).unwrap(), def);
    }

    #[test]
    fn test_round_trip_multiline_scripts_and_description() {
        let mut def = sample();
        def.description = "A package\nwith two lines".to_string();
        def.build_logic = "cd src\n./configure\nmake".to_string();
        def.files = vec!["bin".to_string(), "bin/foo".to_string(), "etc".to_string()];

        let text = serialize(&def).unwrap();
        assert_eq!(parse(&text).unwrap(), def);
    }

    #[test]
    fn test_empty_optional_sections_omitted() {
        let mut def = sample();
        def.files.clear();

        let text = serialize(&def).unwrap();
        assert!(!text.contains("%%% DESCRIPTION"));
        assert!(!text.contains("%%% FILES"));
        assert!(text.contains("%%% META"));

        let parsed = parse(&text).unwrap();
        assert!(parsed.description.is_empty());
        assert!(parsed.files.is_empty());
        assert_eq!(parsed, def);
    }

    #[test]
    fn test_section_order() {
        let mut def = sample();
        def.description = "desc".to_string();
        let text = serialize(&def).unwrap();

        let positions: Vec<usize> = Section::ALL
            .iter()
            .map(|s| text.find(s.tag()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_hand_written() {
        let content = r#"# comment before any section
%%% DESCRIPTION
Hello world
%%%
this line is outside every section
%%% META
name: hello
version: 2.12
sources:
  - https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz
%%% BUILD
tar xf hello-2.12.tar.gz
%%% BEFORE INSTALL
true
%%% AFTER INSTALL
true
%%% UNINSTALL
true
%%% FILES
usr

usr/bin
"#;
        let def = parse(content).unwrap();
        assert_eq!(def.name, "hello");
        assert_eq!(def.version, "2.12");
        assert_eq!(def.description, "Hello world");
        assert_eq!(def.sources.len(), 1);
        assert_eq!(def.build_logic, "tar xf hello-2.12.tar.gz");
        assert_eq!(def.before_install_logic, "true");
        assert_eq!(def.files, vec!["usr", "usr/bin"]);
    }

    #[test]
    fn test_file_entries_kept_verbatim() {
        let mut def = sample();
        def.files = vec![" leading".to_string(), "trailing ".to_string(), "a b".to_string()];

        let text = serialize(&def).unwrap();
        assert_eq!(parse(&text).unwrap().files, def.files);

        let crlf = "%%% META\r\nname: foo\r\n%%% FILES\r\nbin\r\n\r\nbin/foo\r\n";
        assert_eq!(parse(crlf).unwrap().files, vec!["bin", "bin/foo"]);
    }

    #[test]
    fn test_unknown_tag_ends_section() {
        let content = "%%% META\nname: foo\n%%% BUILD\nmake\n%%% CHECKSUMS\nabc123\n%%% UNINSTALL\nrm -f x\n";
        let def = parse(content).unwrap();
        assert_eq!(def.build_logic, "make");
        assert_eq!(def.uninstall_logic, "rm -f x");
        assert!(!def.build_logic.contains("abc123"));
    }

    #[test]
    fn test_malformed_meta_is_error() {
        let content = "%%% META\nname: [unterminated\n";
        assert!(matches!(parse(content), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_missing_name_is_error() {
        assert!(parse("%%% BUILD\nmake\n").is_err());
        assert!(parse("%%% META\nversion: \"1\"\n").is_err());
    }
}
