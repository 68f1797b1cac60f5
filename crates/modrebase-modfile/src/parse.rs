//! `go.mod` reader.
//!
//! The grammar is line oriented: a directive verb followed by arguments,
//! optionally grouped in a parenthesized block (`require ( ... )`). Only
//! `//` comments exist; a trailing `// indirect` marks an indirect
//! requirement and comments attached to a `retract` line carry its rationale.

use crate::manifest::{
    Manifest, ModfileError, ModuleVersion, ReplaceTarget, Replacement, Requirement, Retraction,
};
use crate::version;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    LParen,
    RParen,
    LBrack,
    RBrack,
    Comma,
}

#[derive(Debug)]
struct Line {
    number: usize,
    tokens: Vec<Token>,
    comment: Option<String>,
}

/// Comments attached to a directive: full-line comments directly above it
/// and the comment trailing it on the same line.
#[derive(Debug, Default, Clone)]
struct Comments {
    before: Vec<String>,
    suffix: Option<String>,
}

impl Comments {
    fn is_empty(&self) -> bool {
        self.before.is_empty() && self.suffix.is_none()
    }

    fn joined(&self) -> String {
        self.before
            .iter()
            .chain(self.suffix.iter())
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Parser<'a> {
    file: &'a str,
    manifest: Manifest,
    module_seen: bool,
    go_seen: bool,
}

pub fn parse_manifest_str(file: &str, input: &str) -> Result<Manifest, ModfileError> {
    let lines = input
        .lines()
        .enumerate()
        .map(|(i, text)| lex_line(file, i + 1, text))
        .collect::<Result<Vec<_>, _>>()?;

    let mut parser = Parser {
        file,
        manifest: Manifest::new("", ""),
        module_seen: false,
        go_seen: false,
    };

    let mut pending: Vec<String> = Vec::new();
    let mut block: Option<(String, usize, Comments)> = None;

    for line in lines {
        if line.tokens.is_empty() {
            match line.comment {
                Some(c) => pending.push(c),
                None => pending.clear(),
            }
            continue;
        }

        let comments = Comments {
            before: std::mem::take(&mut pending),
            suffix: line.comment.clone(),
        };

        if block.is_some() && line.tokens == [Token::RParen] {
            block = None;
            continue;
        }
        if let Some((verb, _, block_comments)) = &block {
            parser.directive(verb, &line.tokens, line.number, &comments, Some(block_comments))?;
            continue;
        }

        let Token::Word(verb) = &line.tokens[0] else {
            return Err(parser.error(line.number, "unexpected punctuation at start of line"));
        };

        if line.tokens.len() == 2 && line.tokens[1] == Token::LParen {
            if !matches!(
                verb.as_str(),
                "require" | "exclude" | "replace" | "retract" | "godebug" | "tool"
            ) {
                return Err(parser.error(line.number, &format!("{verb} does not allow a block")));
            }
            block = Some((verb.clone(), line.number, comments));
            continue;
        }

        parser.directive(verb, &line.tokens[1..], line.number, &comments, None)?;
    }

    if let Some((verb, number, _)) = block {
        return Err(parser.error(number, &format!("unterminated {verb} block")));
    }
    if !parser.module_seen {
        return Err(parser.error(1, "no module directive found"));
    }
    if !parser.go_seen {
        return Err(parser.error(1, "no go directive found"));
    }

    Ok(parser.manifest)
}

/// Read and parse a `go.mod` file. Errors name the file by its base name.
pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ModfileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    parse_manifest_str(&name, &content)
}

impl Parser<'_> {
    fn error(&self, line: usize, msg: &str) -> ModfileError {
        ModfileError::Parse {
            file: self.file.to_owned(),
            line,
            msg: msg.to_owned(),
        }
    }

    fn words(&self, line: usize, verb: &str, args: &[Token]) -> Result<Vec<String>, ModfileError> {
        args.iter()
            .map(|t| match t {
                Token::Word(w) => Ok(w.clone()),
                _ => Err(self.error(line, &format!("unexpected punctuation in {verb} directive"))),
            })
            .collect()
    }

    fn module_version(&self, line: usize, v: &str) -> Result<String, ModfileError> {
        if version::is_canonical(v) {
            Ok(v.to_owned())
        } else {
            Err(self.error(
                line,
                &format!("invalid module version {v:?}: must be of the form v1.2.3"),
            ))
        }
    }

    fn directive(
        &mut self,
        verb: &str,
        args: &[Token],
        line: usize,
        comments: &Comments,
        block: Option<&Comments>,
    ) -> Result<(), ModfileError> {
        match verb {
            "module" => {
                let [path] = self.words(line, verb, args)?.try_into().map_err(|_| {
                    self.error(line, "usage: module module/path")
                })?;
                if self.module_seen {
                    return Err(self.error(line, "repeated module statement"));
                }
                if path.is_empty() {
                    return Err(self.error(line, "module path must not be empty"));
                }
                self.module_seen = true;
                self.manifest.module_path = path;
            }
            "go" => {
                let [v] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: go 1.23"))?;
                if self.go_seen {
                    return Err(self.error(line, "repeated go statement"));
                }
                if !version::is_valid_go_version(&v) {
                    return Err(self.error(line, &format!("invalid go version '{v}'")));
                }
                self.go_seen = true;
                self.manifest.go_version = v;
            }
            "toolchain" => {
                let [name] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: toolchain go1.23.0"))?;
                if self.manifest.toolchain.is_some() {
                    return Err(self.error(line, "repeated toolchain statement"));
                }
                if !version::is_valid_toolchain(&name) {
                    return Err(self.error(line, &format!("invalid toolchain name '{name}'")));
                }
                self.manifest.toolchain = Some(name);
            }
            "godebug" => {
                let [setting] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: godebug key=value"))?;
                let Some((key, value)) = setting.split_once('=') else {
                    return Err(self.error(line, "usage: godebug key=value"));
                };
                if key.is_empty() {
                    return Err(self.error(line, "godebug key must not be empty"));
                }
                self.manifest
                    .godebug
                    .push((key.to_owned(), value.to_owned()));
            }
            "tool" => {
                let [path] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: tool module/path"))?;
                self.manifest.tools.push(path);
            }
            "require" => {
                let [path, v] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: require module/path v1.2.3"))?;
                let v = self.module_version(line, &v)?;
                if self.manifest.requirement(&path).is_some() {
                    return Err(self.error(line, &format!("duplicate requirement for {path}")));
                }
                let indirect = comments.suffix.as_deref().is_some_and(is_indirect);
                self.manifest
                    .requirements
                    .push(Requirement::new(&path, &v, indirect));
            }
            "exclude" => {
                let [path, v] = self
                    .words(line, verb, args)?
                    .try_into()
                    .map_err(|_| self.error(line, "usage: exclude module/path v1.2.3"))?;
                let v = self.module_version(line, &v)?;
                self.manifest.excludes.push(ModuleVersion::new(&path, &v));
            }
            "replace" => {
                let replacement = self.replace(line, args)?;
                self.manifest.replacements.push(replacement);
            }
            "retract" => {
                let (low, high) = self.retract_interval(line, args)?;
                let attached = match block {
                    Some(b) if comments.is_empty() => b,
                    _ => comments,
                };
                self.manifest
                    .retractions
                    .push(Retraction::new(&low, &high, &attached.joined()));
            }
            other => return Err(self.error(line, &format!("unknown directive: {other}"))),
        }
        Ok(())
    }

    fn replace(&self, line: usize, args: &[Token]) -> Result<Replacement, ModfileError> {
        const USAGE: &str =
            "usage: replace module/path [v1.2.3] => other/module v1.4\n\t or replace module/path [v1.2.3] => ../local/directory";
        let words = self.words(line, "replace", args)?;
        let arrow = match words.iter().position(|w| w == "=>") {
            Some(i @ (1 | 2)) => i,
            _ => return Err(self.error(line, USAGE)),
        };
        let (old, new) = (&words[..arrow], &words[arrow + 1..]);

        let old_version = match old {
            [_, v] => Some(self.module_version(line, v)?),
            _ => None,
        };
        let new = match new {
            [path] => {
                if !is_directory_path(path) {
                    return Err(self.error(
                        line,
                        "replacement module without version must be directory path (rooted or starting with ./ or ../)",
                    ));
                }
                ReplaceTarget::new(path, None)
            }
            [path, v] => {
                let v = self.module_version(line, v)?;
                ReplaceTarget::new(path, Some(&v))
            }
            _ => return Err(self.error(line, USAGE)),
        };

        Ok(Replacement {
            old: ReplaceTarget {
                path: old[0].clone(),
                version: old_version,
            },
            new,
        })
    }

    fn retract_interval(&self, line: usize, args: &[Token]) -> Result<(String, String), ModfileError> {
        match args {
            [Token::Word(v)] => {
                let v = self.module_version(line, v)?;
                Ok((v.clone(), v))
            }
            [Token::LBrack, Token::Word(low), Token::Comma, Token::Word(high), Token::RBrack] => {
                let low = self.module_version(line, low)?;
                let high = self.module_version(line, high)?;
                if version::compare(&low, &high).is_gt() {
                    return Err(self.error(
                        line,
                        &format!("version {high} is lower than version {low}"),
                    ));
                }
                Ok((low, high))
            }
            _ => Err(self.error(line, "usage: retract version | retract [low, high]")),
        }
    }
}

fn is_indirect(comment: &str) -> bool {
    let c = comment.trim();
    c == "indirect" || c.starts_with("indirect;")
}

fn is_directory_path(path: &str) -> bool {
    path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
        || path == "."
        || path == ".."
        || path.starts_with(".\\")
        || path.starts_with("..\\")
        || path.as_bytes().get(1) == Some(&b':')
}

fn is_word_char(c: char) -> bool {
    !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ',') && !c.is_whitespace() && !c.is_control()
}

fn lex_line(file: &str, number: usize, text: &str) -> Result<Line, ModfileError> {
    let err = |msg: String| ModfileError::Parse {
        file: file.to_owned(),
        line: number,
        msg,
    };
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut comment = None;
    let mut i = 0;

    let starts = |i: usize, pat: &str| {
        pat.chars()
            .enumerate()
            .all(|(k, p)| chars.get(i + k) == Some(&p))
    };

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if starts(i, "//") {
            comment = Some(chars[i + 2..].iter().collect::<String>().trim().to_owned());
            break;
        }
        if starts(i, "/*") {
            return Err(err("mod files must use // comments (not /* */ comments)".to_owned()));
        }
        match c {
            '(' | ')' | '[' | ']' | ',' => {
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBrack,
                    ']' => Token::RBrack,
                    _ => Token::Comma,
                });
                i += 1;
            }
            '"' | '`' => {
                let (word, next) = lex_quoted(&chars, i).ok_or_else(|| {
                    err("unterminated quoted string".to_owned())
                })?;
                tokens.push(Token::Word(word));
                i = next;
            }
            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) && !starts(i, "//") {
                    if starts(i, "/*") {
                        return Err(err(
                            "mod files must use // comments (not /* */ comments)".to_owned(),
                        ));
                    }
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            other => return Err(err(format!("unexpected input character {other:?}"))),
        }
    }

    Ok(Line {
        number,
        tokens,
        comment,
    })
}

/// Read a quoted token starting at `start`. Returns the unquoted value and
/// the index just past the closing quote.
fn lex_quoted(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Some((out, i + 1));
        }
        if c == '\\' && quote == '"' {
            let escaped = *chars.get(i + 1)?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }
    None
}
