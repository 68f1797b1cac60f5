use crate::manifest::{Manifest, ReplaceTarget, Replacement, Requirement, Retraction};
use std::fmt::Write;

struct Entry {
    comments: Vec<String>,
    text: String,
}

impl Entry {
    fn plain(text: String) -> Self {
        Self {
            comments: Vec::new(),
            text,
        }
    }
}

impl Manifest {
    /// Canonical `go.mod` text.
    ///
    /// Layout: `module`, `go`, `toolchain`, `godebug`, direct requirements,
    /// indirect requirements, `exclude`, `replace`, `retract`, `tool`, each
    /// section separated by a blank line. A section with a single entry uses
    /// the one-line form; larger sections use a parenthesized block.
    pub fn format(&self) -> String {
        let mut sections: Vec<String> = vec![
            format!("module {}\n", quote(&self.module_path)),
            format!("go {}\n", self.go_version),
        ];
        if let Some(toolchain) = self.toolchain.as_deref().filter(|t| !t.is_empty()) {
            sections.push(format!("toolchain {toolchain}\n"));
        }

        let godebug = self
            .godebug
            .iter()
            .map(|(k, v)| Entry::plain(quote(&format!("{k}={v}"))))
            .collect::<Vec<_>>();
        let (direct, indirect) = self.requirement_groups();
        let direct = direct.into_iter().map(requirement_entry).collect::<Vec<_>>();
        let indirect = indirect.into_iter().map(requirement_entry).collect::<Vec<_>>();
        let excludes = self
            .excludes
            .iter()
            .map(|e| Entry::plain(format!("{} {}", quote(&e.path), quote(&e.version))))
            .collect::<Vec<_>>();
        let replacements = self.replacements.iter().map(replace_entry).collect::<Vec<_>>();
        let retractions = self.retractions.iter().map(retract_entry).collect::<Vec<_>>();
        let tools = self.tools.iter().map(|t| Entry::plain(quote(t))).collect::<Vec<_>>();

        for (verb, entries) in [
            ("godebug", godebug),
            ("require", direct),
            ("require", indirect),
            ("exclude", excludes),
            ("replace", replacements),
            ("retract", retractions),
            ("tool", tools),
        ] {
            if let Some(section) = section(verb, &entries) {
                sections.push(section);
            }
        }

        sections.join("\n")
    }
}

fn section(verb: &str, entries: &[Entry]) -> Option<String> {
    let mut out = String::new();
    match entries {
        [] => return None,
        [single] => {
            for c in &single.comments {
                let _ = writeln!(out, "{}", comment(c));
            }
            let _ = writeln!(out, "{verb} {}", single.text);
        }
        many => {
            let _ = writeln!(out, "{verb} (");
            for entry in many {
                for c in &entry.comments {
                    let _ = writeln!(out, "\t{}", comment(c));
                }
                let _ = writeln!(out, "\t{}", entry.text);
            }
            out.push_str(")\n");
        }
    }
    Some(out)
}

fn comment(text: &str) -> String {
    if text.is_empty() {
        "//".to_owned()
    } else {
        format!("// {text}")
    }
}

fn requirement_entry(r: &Requirement) -> Entry {
    let mut text = format!("{} {}", quote(&r.path), quote(&r.version));
    if r.indirect {
        text.push_str(" // indirect");
    }
    Entry::plain(text)
}

fn target(t: &ReplaceTarget) -> String {
    match &t.version {
        Some(v) => format!("{} {}", quote(&t.path), quote(v)),
        None => quote(&t.path),
    }
}

fn replace_entry(r: &Replacement) -> Entry {
    Entry::plain(format!("{} => {}", target(&r.old), target(&r.new)))
}

fn retract_entry(r: &Retraction) -> Entry {
    let text = if r.low == r.high {
        quote(&r.low)
    } else {
        format!("[{}, {}]", quote(&r.low), quote(&r.high))
    };
    let comments = if r.rationale.is_empty() {
        Vec::new()
    } else {
        r.rationale.lines().map(str::to_owned).collect()
    };
    Entry { comments, text }
}

/// Whether a token has to be quoted to survive re-parsing.
pub fn must_quote(s: &str) -> bool {
    if s.is_empty() || s.contains("//") || s.contains("/*") {
        return true;
    }
    s.chars().any(|c| match c {
        ' ' | '"' | '\'' | '`' => true,
        '(' | ')' | '[' | ']' | '{' | '}' | ',' => s.len() > 1,
        c => c.is_whitespace() || c.is_control(),
    })
}

/// Quote `s` if needed.
pub fn quote(s: &str) -> String {
    if !must_quote(s) {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleVersion;
    use crate::parse::parse_manifest_str;

    fn sample() -> Manifest {
        let mut m = Manifest::new("example.com/app", "1.21");
        m.toolchain = Some("go1.21.5".to_owned());
        m.requirements = vec![
            Requirement::new("example.com/b", "v1.1.0", true),
            Requirement::new("example.com/a", "v1.0.0", false),
            Requirement::new("example.com/c", "v0.3.0", true),
        ];
        m.excludes = vec![ModuleVersion::new("example.com/x", "v0.1.0")];
        m.replacements = vec![Replacement {
            old: ReplaceTarget::new("example.com/a", None),
            new: ReplaceTarget::new("../a", None),
        }];
        m.retractions = vec![
            Retraction::new("v1.0.0", "v1.0.0", ""),
            Retraction::new("v1.2.0", "v1.2.9", "Corrupt tags.\nDo not use."),
        ];
        m
    }

    #[test]
    fn formats_canonical_layout() {
        let expected = "\
module example.com/app

go 1.21

toolchain go1.21.5

require example.com/a v1.0.0

require (
\texample.com/b v1.1.0 // indirect
\texample.com/c v0.3.0 // indirect
)

exclude example.com/x v0.1.0

replace example.com/a => ../a

retract (
\tv1.0.0
\t// Corrupt tags.
\t// Do not use.
\t[v1.2.0, v1.2.9]
)
";
        assert_eq!(sample().format(), expected);
    }

    #[test]
    fn every_section_kind_is_rendered() {
        let mut m = sample();
        m.godebug = vec![
            ("panicnil".to_owned(), "1".to_owned()),
            ("asynctimerchan".to_owned(), "0".to_owned()),
        ];
        m.tools = vec!["golang.org/x/tools/cmd/stringer".to_owned()];

        let text = m.format();
        assert!(text.contains("\n\ngodebug (\n\tpanicnil=1\n\tasynctimerchan=0\n)\n"));
        assert!(text.ends_with("\n\ntool golang.org/x/tools/cmd/stringer\n"));
        assert_eq!(text.matches("require").count(), 2);
        assert!(text.contains("\nexclude example.com/x v0.1.0\n"));
        assert!(text.contains("\nreplace example.com/a => ../a\n"));
        assert!(text.contains("\nretract (\n"));
    }

    #[test]
    fn minimal_manifest_has_no_empty_sections() {
        let m = Manifest::new("example.com/m", "1.22");
        assert_eq!(m.format(), "module example.com/m\n\ngo 1.22\n");
    }

    #[test]
    fn format_is_reparseable() {
        let m = sample();
        let reparsed = parse_manifest_str("go.mod", &m.format()).unwrap();
        assert_eq!(reparsed.format(), m.format());
        assert_eq!(reparsed.retractions, m.retractions);
        assert_eq!(reparsed.replacements, m.replacements);
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote("example.com/m"), "example.com/m");
        assert_eq!(quote("has space"), "\"has space\"");
        assert_eq!(quote("a//b"), "\"a//b\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("("), "(");
        assert_eq!(quote("a(b"), "\"a(b\"");
    }

    #[test]
    fn quoted_module_path_survives_reparse() {
        let m = Manifest::new("example.com/odd path", "1.21");
        let reparsed = parse_manifest_str("go.mod", &m.format()).unwrap();
        assert_eq!(reparsed.module_path, "example.com/odd path");
    }
}
