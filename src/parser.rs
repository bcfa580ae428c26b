//! Line parser: classify each line as a header or a body and group bodies under
//! the header that precedes them. Each line is matched on its own with PEST.

use std::collections::HashSet;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use tracing::{debug, trace};

use crate::ast::*;
use crate::error::{DefError, Result};
use crate::source::{self, SourceLine};

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct DefLineParser;

const HEADER_PREFIX: &str = "CMTCODE:";

/// Line classification after comments and blank lines are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Ignored,
    Header,
    Body,
}

pub fn classify(text: &str) -> LineKind {
    if text.is_empty() || text.starts_with('#') {
        LineKind::Ignored
    } else if text.starts_with(HEADER_PREFIX) {
        LineKind::Header
    } else {
        LineKind::Body
    }
}

/// Parse definition text into the flat entity list, tags validated.
pub fn parse(source: &str) -> Result<Vec<Entity>> {
    let lines = source::lines_from_str(source);
    let entities = parse_entities(&lines)?;
    validate_tags(&entities)?;
    Ok(entities)
}

/// Group lines into entities in header order. Does not check tag uniqueness.
pub fn parse_entities(lines: &[SourceLine]) -> Result<Vec<Entity>> {
    if lines.is_empty() {
        return Err(DefError::EmptySource);
    }
    let mut entities: Vec<Entity> = Vec::new();
    for line in lines {
        match classify(&line.text) {
            LineKind::Ignored => {}
            LineKind::Header => {
                let header = parse_header(line)?;
                trace!(line = line.number, code = %header.code, "header");
                entities.push(Entity::new(header));
            }
            LineKind::Body => {
                let current = entities.last_mut().ok_or_else(|| DefError::BodyBeforeHeader {
                    line: line.number,
                    text: line.text.clone(),
                })?;
                current.fields.push(parse_body(line)?);
            }
        }
    }
    if entities.is_empty() {
        return Err(DefError::NoEntities);
    }
    debug!(entities = entities.len(), "parsed definition lines");
    Ok(entities)
}

/// Every entity's tags must be unique within that entity.
pub fn validate_tags(entities: &[Entity]) -> Result<()> {
    for entity in entities {
        let mut seen = HashSet::new();
        for field in &entity.fields {
            if !seen.insert(field.tag.as_str()) {
                return Err(DefError::DuplicateTag {
                    tag: field.tag.clone(),
                    code: entity.header.code.clone(),
                });
            }
        }
    }
    Ok(())
}

fn parse_header(line: &SourceLine) -> Result<Header> {
    let pair = DefLineParser::parse(Rule::header_line, &line.text)
        .map_err(|e| DefError::MalformedHeader {
            line: line.number,
            text: line.text.clone(),
            reason: e.variant.message().into_owned(),
        })?
        .next()
        .ok_or_else(|| DefError::MalformedHeader {
            line: line.number,
            text: line.text.clone(),
            reason: "empty match".to_string(),
        })?;

    let mut code = None;
    let mut label = None;
    let mut path = None;
    let mut parent = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::code => code = Some(token(inner)),
            Rule::label => label = Some(token(inner)),
            Rule::path => path = Some(token(inner)),
            Rule::parent => parent = Some(ParentCode::from_token(inner.as_str())),
            _ => {}
        }
    }
    match (code, label, path, parent) {
        (Some(code), Some(label), Some(path), Some(parent)) => Ok(Header {
            code,
            label,
            path,
            parent,
        }),
        _ => Err(DefError::MalformedHeader {
            line: line.number,
            text: line.text.clone(),
            reason: "missing header component".to_string(),
        }),
    }
}

fn parse_body(line: &SourceLine) -> Result<Field> {
    let pair = DefLineParser::parse(Rule::body_line, &line.text)
        .map_err(|e| DefError::MalformedBody {
            line: line.number,
            text: line.text.clone(),
            reason: e.variant.message().into_owned(),
        })?
        .next()
        .ok_or_else(|| DefError::MalformedBody {
            line: line.number,
            text: line.text.clone(),
            reason: "empty match".to_string(),
        })?;

    let parts: Vec<String> = pair
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(token)
        .collect();
    let [tag, description, path, presence, sign, type_name]: [String; 6] =
        parts.try_into().map_err(|parts: Vec<String>| DefError::MalformedBody {
            line: line.number,
            text: line.text.clone(),
            reason: format!("expected 6 tokens, found {}", parts.len()),
        })?;
    Ok(Field {
        tag,
        description,
        path,
        required: presence == "M",
        signed: sign == "y",
        type_name,
        embedded: None,
    })
}

fn token(pair: Pair<Rule>) -> String {
    pair.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_lines() {
        assert_eq!(classify(""), LineKind::Ignored);
        assert_eq!(classify("# CMTCODE:X"), LineKind::Ignored);
        assert_eq!(classify("CMTCODE:X v1 PATH:/x ParentCMTCODE:NULL"), LineKind::Header);
        // Prefix is case sensitive; anything else is a body.
        assert_eq!(classify("cmtcode:X v1 PATH:/x ParentCMTCODE:NULL"), LineKind::Body);
        assert_eq!(classify("F1 d /x M y int"), LineKind::Body);
    }

    #[test]
    fn header_fields() {
        let line = SourceLine {
            number: 3,
            text: "CMTCODE:GRP1 v1\tPATH:/root/group   ParentCMTCODE:MSG1".to_string(),
        };
        let h = parse_header(&line).expect("header");
        assert_eq!(h.code, "GRP1");
        assert_eq!(h.label, "v1");
        assert_eq!(h.path, "/root/group");
        assert_eq!(h.parent, ParentCode::Code("MSG1".to_string()));
    }

    #[test]
    fn header_requires_all_components() {
        for text in [
            "CMTCODE:A PATH:/a ParentCMTCODE:NULL",
            "CMTCODE:A v1 /a ParentCMTCODE:NULL",
            "CMTCODE:A v1 PATH:/a Parent:NULL",
            "CMTCODE: A v1 PATH:/a ParentCMTCODE:NULL",
            "CMTCODE:A v1 PATH:/a ParentCMTCODE:NULL extra",
        ] {
            let line = SourceLine { number: 1, text: text.to_string() };
            let err = parse_header(&line).unwrap_err();
            assert!(matches!(err, DefError::MalformedHeader { line: 1, .. }), "{}", text);
        }
    }

    #[test]
    fn body_flags() {
        let line = SourceLine { number: 2, text: "F1 Field1 /root/f1 M y int".to_string() };
        let f = parse_body(&line).expect("body");
        assert_eq!(f.tag, "F1");
        assert_eq!(f.description, "Field1");
        assert_eq!(f.path, "/root/f1");
        assert!(f.required);
        assert!(f.signed);
        assert_eq!(f.type_name, "int");
        assert!(!f.is_embedded_set());

        // Only the exact literals M and y set the flags.
        let line = SourceLine { number: 2, text: "F2 Field2 /root/f2 m Y int".to_string() };
        let f = parse_body(&line).expect("body");
        assert!(!f.required);
        assert!(!f.signed);
    }

    #[test]
    fn body_token_count() {
        for text in ["F1 Field1 /root/f1 M y", "F1 Field1 /root/f1 M y int extra"] {
            let line = SourceLine { number: 9, text: text.to_string() };
            let err = parse_body(&line).unwrap_err();
            assert!(matches!(err, DefError::MalformedBody { line: 9, .. }), "{}", text);
        }
    }

    #[test]
    fn bodies_follow_their_header() {
        let src = "\
CMTCODE:A v1 PATH:/a ParentCMTCODE:NULL
A1 d /a/1 M y int
# comment between bodies
A2 d /a/2 O n str

CMTCODE:B v1 PATH:/b ParentCMTCODE:NULL
B1 d /b/1 M n int
";
        let entities = parse(src).expect("parse");
        assert_eq!(entities.len(), 2);
        let tags: Vec<_> = entities[0].fields.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, vec!["A1", "A2"]);
        assert_eq!(entities[1].fields.len(), 1);
    }

    #[test]
    fn header_without_bodies() {
        let entities = parse("CMTCODE:A v1 PATH:/a ParentCMTCODE:NULL\n").expect("parse");
        assert_eq!(entities.len(), 1);
        assert!(entities[0].fields.is_empty());
    }

    #[test]
    fn body_before_header() {
        let err = parse("# lead\nF1 d /x M y int\nCMTCODE:A v1 PATH:/a ParentCMTCODE:NULL\n")
            .unwrap_err();
        assert!(matches!(err, DefError::BodyBeforeHeader { line: 2, .. }));
    }

    #[test]
    fn empty_and_comment_only() {
        assert!(matches!(parse("").unwrap_err(), DefError::EmptySource));
        assert!(matches!(parse("# only\n\n").unwrap_err(), DefError::NoEntities));
    }

    #[test]
    fn duplicate_tag_names_tag_and_code() {
        let src = "CMTCODE:A v1 PATH:/a ParentCMTCODE:NULL\nF1 d /a/1 M y int\nF1 e /a/2 O n int\n";
        let err = parse(src).unwrap_err();
        match &err {
            DefError::DuplicateTag { tag, code } => {
                assert_eq!(tag, "F1");
                assert_eq!(code, "A");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.to_string(), "the tag F1 is duplicated in A");
    }

    #[test]
    fn same_tag_in_different_entities() {
        let src = "\
CMTCODE:A v1 PATH:/a ParentCMTCODE:NULL
F1 d /a/1 M y int
CMTCODE:B v1 PATH:/b ParentCMTCODE:NULL
F1 d /b/1 M y int
";
        assert!(parse(src).is_ok());
    }
}
