//! Parse UDT sources into a [`UdtType`] using PEST.
//!
//! Sources are read line by line. The header (`TYPE "Name"`), the `VERSION`
//! line and the struct body are matched with the line rules in `grammar.pest`;
//! nested `STRUCT` fields recurse into the body reader until their own
//! `END_STRUCT;`. A field declared as `Name : "Other";` loads `Other.udt` (or the
//! legacy `Other.awl`) from the reference directory and grafts the parsed type in
//! as a nested struct.
//!
//! Any malformed line aborts the whole parse; no partial tree is returned.

use crate::error::UdtError;
use crate::field::{
    normalize_version, validate_name, ArrayField, Field, PrimitiveField, StringField, StructField, UdtType,
};
use crate::primitive::PrimitiveType;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct UdtLineParser;

/// Parse UDT source text. `"Other"` references resolve against `reference_dir`.
pub fn parse(source: &str, reference_dir: impl AsRef<Path>) -> Result<UdtType, UdtError> {
    let mut lines = Lines::new(source.lines().map(|l| Ok::<_, io::Error>(l.to_string())));
    parse_type(&mut lines, reference_dir.as_ref(), &mut Vec::new())
}

/// Parse UDT source from a reader. `"Other"` references resolve against `reference_dir`.
pub fn parse_reader<R: BufRead>(reader: R, reference_dir: impl AsRef<Path>) -> Result<UdtType, UdtError> {
    let mut lines = Lines::new(reader.lines());
    parse_type(&mut lines, reference_dir.as_ref(), &mut Vec::new())
}

/// Parse a `.udt` file; references resolve against the file's directory.
pub fn parse_file(path: impl AsRef<Path>) -> Result<UdtType, UdtError> {
    parse_path(path.as_ref(), &mut Vec::new())
}

/// Parse a `.udt` file, resolving references against `reference_dir` instead of
/// the file's own directory.
pub fn parse_file_with_references(
    path: impl AsRef<Path>,
    reference_dir: impl AsRef<Path>,
) -> Result<UdtType, UdtError> {
    parse_path_in(path.as_ref(), reference_dir.as_ref(), &mut Vec::new())
}

/// Where `Name : "type_name";` is loaded from: `<type_name>.udt`, else an existing
/// `<type_name>.awl`. When neither exists the `.udt` path is returned so the
/// error names it.
pub fn resolve_reference(reference_dir: &Path, type_name: &str) -> PathBuf {
    let udt = reference_dir.join(format!("{}.udt", type_name));
    if udt.exists() {
        return udt;
    }
    let awl = reference_dir.join(format!("{}.awl", type_name));
    if awl.exists() {
        log::debug!("{} not found, using legacy {}", udt.display(), awl.display());
        return awl;
    }
    udt
}

/// Line source with 1-based line numbers for error messages.
struct Lines<I> {
    inner: I,
    line_no: usize,
}

impl<I: Iterator<Item = io::Result<String>>> Lines<I> {
    fn new(inner: I) -> Self {
        Lines { inner, line_no: 0 }
    }

    fn next_line(&mut self) -> Result<Option<String>, UdtError> {
        match self.inner.next() {
            None => Ok(None),
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line?))
            }
        }
    }

    fn next_non_blank(&mut self) -> Result<Option<String>, UdtError> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

fn parse_path(path: &Path, chain: &mut Vec<String>) -> Result<UdtType, UdtError> {
    let reference_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_path_in(path, reference_dir, chain)
}

fn parse_path_in(path: &Path, reference_dir: &Path, chain: &mut Vec<String>) -> Result<UdtType, UdtError> {
    if !path.exists() {
        return Err(UdtError::NotFound { path: path.to_path_buf() });
    }
    let file = File::open(path)?;
    let mut lines = Lines::new(BufReader::new(file).lines());
    parse_type(&mut lines, reference_dir, chain)
}

/// Parse one complete type. `chain` holds the names of the types currently
/// being parsed (outermost first) so a reference back into it is rejected.
fn parse_type<I>(lines: &mut Lines<I>, reference_dir: &Path, chain: &mut Vec<String>) -> Result<UdtType, UdtError>
where
    I: Iterator<Item = io::Result<String>>,
{
    let header = lines
        .next_non_blank()?
        .ok_or_else(|| UdtError::MalformedHeader("file is not a valid UDT type (empty)".to_string()))?;
    let (name, comment) = parse_header(header.trim_start_matches('\u{feff}').trim())?;
    validate_name(&name)?;

    if chain.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
        return Err(UdtError::CyclicReference(format!("{} -> {}", chain.join(" -> "), name)));
    }
    log::trace!("parsing type '{}'", name);

    chain.push(name);
    let result = parse_type_body(lines, reference_dir, chain);
    let name = chain.pop().unwrap_or_default();
    let (version, fields) = result?;

    Ok(UdtType::new(name, version, fields)?.with_comment(comment))
}

fn parse_type_body<I>(
    lines: &mut Lines<I>,
    reference_dir: &Path,
    chain: &mut Vec<String>,
) -> Result<(String, Vec<Field>), UdtError>
where
    I: Iterator<Item = io::Result<String>>,
{
    let owner = chain.last().cloned().unwrap_or_default();

    // At most one metadata line (attributes, TITLE, ...) may precede VERSION.
    let mut line = lines
        .next_line()?
        .ok_or_else(|| UdtError::MalformedHeader(format!("'{}': missing VERSION", owner)))?;
    if UdtLineParser::parse(Rule::version_line, line.trim()).is_err() {
        log::trace!("'{}': skipping metadata line {}", owner, lines.line_no);
        line = lines
            .next_line()?
            .ok_or_else(|| UdtError::MalformedHeader(format!("'{}': missing VERSION", owner)))?;
    }
    let version = parse_version(line.trim()).ok_or_else(|| {
        UdtError::MalformedHeader(format!("line {}: expected VERSION, found '{}'", lines.line_no, line.trim()))
    })?;

    let open = lines
        .next_non_blank()?
        .ok_or_else(|| UdtError::MalformedHeader(format!("'{}': missing STRUCT", owner)))?;
    if UdtLineParser::parse(Rule::struct_line, open.trim()).is_err() {
        return Err(UdtError::MalformedHeader(format!(
            "line {}: expected STRUCT, found '{}'",
            lines.line_no,
            open.trim()
        )));
    }

    let fields = parse_struct_body(lines, reference_dir, chain, &owner)?;

    let mut footer = false;
    while let Some(line) = lines.next_line()? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if UdtLineParser::parse(Rule::end_type_line, line).is_ok() {
            footer = true;
            break;
        }
        log::warn!("'{}': ignoring line {} after END_STRUCT: {}", owner, lines.line_no, line);
    }
    if !footer {
        log::warn!("'{}': missing END_TYPE", owner);
    }

    Ok((version, fields))
}

fn parse_header(line: &str) -> Result<(String, String), UdtError> {
    let pair = UdtLineParser::parse(Rule::header_line, line)
        .map_err(|_| UdtError::MalformedHeader(format!("file is not a valid UDT type: '{}'", line)))?
        .next()
        .ok_or_else(|| UdtError::MalformedHeader("empty header".to_string()))?;
    let mut name = String::new();
    let mut comment = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_title => name = inner.as_str().trim().to_string(),
            Rule::comment => comment = comment_text(inner),
            _ => {}
        }
    }
    Ok((name, comment))
}

/// Version text from its first digit on, e.g. `VERSION : 0.1` -> `0.1`.
fn parse_version(line: &str) -> Option<String> {
    let pair = UdtLineParser::parse(Rule::version_line, line).ok()?.next()?;
    let text = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::version_text)
        .map(|p| p.as_str())
        .unwrap_or("");
    Some(normalize_version(text))
}

/// Collect fields until the matching `END_STRUCT;`.
fn parse_struct_body<I>(
    lines: &mut Lines<I>,
    reference_dir: &Path,
    chain: &mut Vec<String>,
    owner: &str,
) -> Result<Vec<Field>, UdtError>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut fields = Vec::new();
    while let Some(line) = lines.next_line()? {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if UdtLineParser::parse(Rule::end_struct_line, line).is_ok() {
            return Ok(fields);
        }
        fields.push(parse_field(line, lines, reference_dir, chain)?);
    }
    Err(UdtError::UnterminatedStruct(format!("'{}' has no END_STRUCT;", owner)))
}

fn parse_field<I>(
    line: &str,
    lines: &mut Lines<I>,
    reference_dir: &Path,
    chain: &mut Vec<String>,
) -> Result<Field, UdtError>
where
    I: Iterator<Item = io::Result<String>>,
{
    let line_no = lines.line_no;
    let pair = UdtLineParser::parse(Rule::field_line, line)
        .map_err(|e| UdtError::MalformedField {
            line: line_no,
            message: format!("Parse error: {}", e),
        })?
        .next()
        .ok_or_else(|| malformed(line_no, "empty field line"))?;

    let mut name = None;
    let mut comment = String::new();
    let mut decl = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::bare_name | Rule::quoted_name => name = Some(inner.as_str().trim().to_string()),
            Rule::comment => comment = comment_text(inner),
            Rule::struct_open | Rule::type_ref | Rule::array_decl | Rule::string_decl | Rule::simple_decl => {
                decl = Some(inner)
            }
            _ => {}
        }
    }
    let name = name.ok_or_else(|| malformed(line_no, "missing field name"))?;
    validate_name(&name)?;
    let decl = decl.ok_or_else(|| malformed(line_no, "missing field type"))?;

    match decl.as_rule() {
        Rule::struct_open => {
            let fields = parse_struct_body(lines, reference_dir, chain, &name)?;
            Ok(StructField::new(name, fields)?.with_comment(comment).into())
        }
        Rule::type_ref => {
            let type_name = decl
                .into_inner()
                .find(|p| p.as_rule() == Rule::ref_name)
                .map(|p| p.as_str().trim().to_string())
                .ok_or_else(|| malformed(line_no, "missing referenced type"))?;
            let path = resolve_reference(reference_dir, &type_name);
            log::debug!("'{}' references {}", name, path.display());
            let referenced = parse_path(&path, chain)?;
            Ok(referenced.into_struct_named(name, comment).into())
        }
        Rule::array_decl => build_array(decl, name, comment).map_err(|e| e.at_line(line_no)),
        Rule::string_decl => build_string(decl, name, comment).map_err(|e| e.at_line(line_no)),
        Rule::simple_decl => build_simple(decl, name, comment).map_err(|e| e.at_line(line_no)),
        other => Err(malformed(line_no, &format!("unhandled field rule: {:?}", other))),
    }
}

fn build_simple(decl: Pair<Rule>, name: String, comment: String) -> Result<Field, UdtError> {
    let mut ty = None;
    let mut default = String::new();
    for inner in decl.into_inner() {
        match inner.as_rule() {
            Rule::type_name => ty = Some(PrimitiveType::lookup(inner.as_str())?),
            Rule::default => default = default_text(inner),
            _ => {}
        }
    }
    let ty = ty.ok_or_else(|| malformed(0, "missing type name"))?;
    Ok(PrimitiveField::new(name, ty)?
        .with_comment(comment)
        .with_default(default)?
        .into())
}

fn build_string(decl: Pair<Rule>, name: String, comment: String) -> Result<Field, UdtError> {
    let length_text = decl
        .into_inner()
        .find(|p| p.as_rule() == Rule::length_text)
        .map(|p| p.as_str().trim())
        .unwrap_or("");
    let length: usize = length_text.parse().map_err(|_| {
        UdtError::InvalidRange(format!("'{}': string length '{}' is not a valid integer", name, length_text))
    })?;
    Ok(StringField::new(name, length)?.with_comment(comment).into())
}

fn build_array(decl: Pair<Rule>, name: String, comment: String) -> Result<Field, UdtError> {
    let mut range = None;
    let mut ty = None;
    let mut default = String::new();
    for inner in decl.into_inner() {
        match inner.as_rule() {
            Rule::range_text => range = Some(parse_range(inner.as_str())?),
            Rule::type_name => ty = Some(PrimitiveType::lookup(inner.as_str())?),
            Rule::default => default = default_text(inner),
            _ => {}
        }
    }
    let (start, end) = range.ok_or_else(|| UdtError::InvalidRange(format!("'{}': missing range", name)))?;
    let ty = ty.ok_or_else(|| malformed(0, "missing element type"))?;
    Ok(ArrayField::new(name, ty, start..=end)?
        .with_comment(comment)
        .with_default(default)?
        .into())
}

/// `start..end` with both ends inclusive integers.
fn parse_range(text: &str) -> Result<(i64, i64), UdtError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UdtError::InvalidRange("range cannot be empty".to_string()));
    }
    let (start, end) = text
        .split_once("..")
        .ok_or_else(|| UdtError::InvalidRange(format!("'{}' must be in format 'start..end'", text)))?;
    let start: i64 = start
        .trim()
        .parse()
        .map_err(|_| UdtError::InvalidRange(format!("start of '{}' is not a valid integer", text)))?;
    let end: i64 = end
        .trim()
        .parse()
        .map_err(|_| UdtError::InvalidRange(format!("end of '{}' is not a valid integer", text)))?;
    Ok((start, end))
}

fn comment_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::comment_text)
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

fn default_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::default_value)
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

fn malformed(line: usize, message: &str) -> UdtError {
    UdtError::MalformedField {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parsing() {
        assert_eq!(parse_range("0..3").unwrap(), (0, 3));
        assert_eq!(parse_range(" -2 .. 5 ").unwrap(), (-2, 5));
        assert!(matches!(parse_range(""), Err(UdtError::InvalidRange(_))));
        assert!(matches!(parse_range("0..*"), Err(UdtError::InvalidRange(_))));
        assert!(matches!(parse_range("3"), Err(UdtError::InvalidRange(_))));
    }

    #[test]
    fn version_from_first_digit() {
        assert_eq!(parse_version("VERSION : 0.1").as_deref(), Some("0.1"));
        assert_eq!(parse_version("version: V2.3 ").as_deref(), Some("2.3"));
        assert_eq!(parse_version("VERSION :").as_deref(), Some(""));
        assert_eq!(parse_version("TITLE = x"), None);
    }

    #[test]
    fn header_with_comment() {
        let (name, comment) = parse_header("TYPE \"Motor\"   // drive data").unwrap();
        assert_eq!(name, "Motor");
        assert_eq!(comment, "drive data");
        assert!(matches!(parse_header("FUNCTION_BLOCK \"x\""), Err(UdtError::MalformedHeader(_))));
        assert!(matches!(parse_header("TYPE Motor"), Err(UdtError::MalformedHeader(_))));
    }

    #[test]
    fn field_line_rules() {
        assert!(UdtLineParser::parse(Rule::field_line, "a : Bool;").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : Bool := true;   // c").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a { S7_SetPoint := 'False'} : Int;").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : Array[0..3] of Int;").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : String[10];").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : Struct   // c").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : \"Other\";").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "\"quoted name\" : Int;").is_ok());
        assert!(UdtLineParser::parse(Rule::field_line, "a : Int").is_err());
        assert!(UdtLineParser::parse(Rule::field_line, "a Int;").is_err());
    }
}
