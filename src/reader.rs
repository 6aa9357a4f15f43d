// ABOUTME: Reader turning a character stream into an S-expression value tree

use crate::error::Error;
use crate::symbol::Symbol;
use crate::value::Value;
use num_rational::Rational64;
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::Chars;
use std::sync::OnceLock;

// Commas are whitespace, as are the escapes the reader itself produces.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | ',' | '\n' | '\t' | '\r' | '\u{8}' | '\u{c}')
}

fn int_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<sign>[+-])?(?:(?P<base>[1-9]\d?)[rR](?P<value>[0-9a-zA-Z]+)|(?P<dec>0|[1-9]\d*)|0(?P<oct>[0-7]+)|0[xX](?P<hex>[0-9a-fA-F]+))$",
        )
        .expect("failed to parse int pattern")
    })
}

fn float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?\d+(\.\d*([eE][+-]?\d+)?|[eE][+-]?\d+)$")
            .expect("failed to parse float pattern")
    })
}

fn ratio_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<sign>[-+])?(?P<numer>0|[1-9]\d*)/(?P<denom>0|[1-9]\d*)$")
            .expect("failed to parse ratio pattern")
    })
}

/// Match a token against the numeric literal grammar. `Ok(None)` means the
/// token is not numeric at all; `Err` means it matched a numeric shape but
/// cannot denote a number (bad radix, overflow, zero denominator).
fn match_number(s: &str) -> Result<Option<Value>, String> {
    let invalid = || format!("Invalid number: {}", s);

    if let Some(caps) = int_pattern().captures(s) {
        let negative = caps.name("sign").map(|m| m.as_str()) == Some("-");
        let magnitude = if let Some(value) = caps.name("value") {
            let base: u32 = caps
                .name("base")
                .expect("base is captured alongside value")
                .as_str()
                .parse()
                .map_err(|_| invalid())?;
            if !(2..=36).contains(&base) {
                return Err(format!("Radix out of range in number: {}", s));
            }
            i64::from_str_radix(value.as_str(), base).map_err(|_| invalid())?
        } else if let Some(dec) = caps.name("dec") {
            dec.as_str().parse::<i64>().map_err(|_| invalid())?
        } else if let Some(oct) = caps.name("oct") {
            i64::from_str_radix(oct.as_str(), 8).map_err(|_| invalid())?
        } else {
            let hex = caps.name("hex").expect("int pattern alternative");
            i64::from_str_radix(hex.as_str(), 16).map_err(|_| invalid())?
        };
        let n = if negative { -magnitude } else { magnitude };
        return Ok(Some(Value::Int(n)));
    }

    if float_pattern().is_match(s) {
        let n = s.parse::<f64>().map_err(|_| invalid())?;
        return Ok(Some(Value::Float(n)));
    }

    if let Some(caps) = ratio_pattern().captures(s) {
        let numer: i64 = caps["numer"].parse().map_err(|_| invalid())?;
        let denom: i64 = caps["denom"].parse().map_err(|_| invalid())?;
        if denom == 0 {
            return Err(format!("Ratio with zero denominator: {}", s));
        }
        let negative = caps.name("sign").map(|m| m.as_str()) == Some("-");
        let numer = if negative { -numer } else { numer };
        return Ok(Some(Value::Ratio(Rational64::new(numer, denom))));
    }

    Ok(None)
}

type ReaderMacro = fn(&mut Reader<'_>, char) -> Result<Option<Value>, Error>;

/// The reader-macro table. A handler returning `Ok(None)` produced no value
/// and the read loop keeps going.
fn reader_macro(c: char) -> Option<ReaderMacro> {
    match c {
        '\\' => Some(char_reader),
        '"' => Some(string_reader),
        '\'' => Some(quote_reader),
        '(' => Some(list_reader),
        '[' => Some(vector_reader),
        '{' => Some(map_reader),
        ')' | ']' | '}' => Some(unmatched_delimiter_reader),
        _ => None,
    }
}

fn is_macro_char(c: char) -> bool {
    reader_macro(c).is_some()
}

/// A character source with one char of pushback and a (line, column)
/// position for error reporting.
pub struct Reader<'a> {
    chars: Chars<'a>,
    pushback: Option<char>,
    line: u32,
    column: u32,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Reader {
            chars: source.chars(),
            pushback: None,
            line: 1,
            column: 0,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.pushback.take().or_else(|| self.chars.next())?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn unread(&mut self, c: char) {
        debug_assert!(self.pushback.is_none());
        self.pushback = Some(c);
    }

    fn fail(&self, cause: impl Into<String>) -> Error {
        Error::Reader {
            line: self.line,
            column: self.column,
            cause: cause.into(),
        }
    }

    /// Read the next form. At EOF, returns `Ok(None)` unless the caller
    /// asked for EOF to be an error (inside a partially read form).
    pub fn read(&mut self, eof_is_error: bool) -> Result<Option<Value>, Error> {
        loop {
            let mut c = match self.next_char() {
                Some(c) => c,
                None if eof_is_error => return Err(self.fail("EOF while reading")),
                None => return Ok(None),
            };

            while is_whitespace(c) {
                c = match self.next_char() {
                    Some(c) => c,
                    None if eof_is_error => return Err(self.fail("EOF while reading")),
                    None => return Ok(None),
                };
            }

            if c.is_ascii_digit() {
                return self.read_number(c).map(Some);
            }

            if let Some(handler) = reader_macro(c) {
                match handler(self, c)? {
                    Some(value) => return Ok(Some(value)),
                    None => continue,
                }
            }

            let token = self.read_token(c);
            return self.interpret_token(&token).map(Some);
        }
    }

    /// A token runs until whitespace, EOF, or a reader-macro character.
    fn read_token(&mut self, first: char) -> String {
        let mut token = String::new();
        token.push(first);
        while let Some(c) = self.next_char() {
            if is_whitespace(c) || is_macro_char(c) {
                self.unread(c);
                break;
            }
            token.push(c);
        }
        token
    }

    fn read_number(&mut self, first: char) -> Result<Value, Error> {
        let token = self.read_token(first);
        match match_number(&token) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(self.fail(format!("Invalid number: {}", token))),
            Err(cause) => Err(self.fail(cause)),
        }
    }

    fn interpret_token(&self, token: &str) -> Result<Value, Error> {
        match token {
            "nil" => return Ok(Value::Nil),
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }

        // Signed numeric tokens arrive here (the digit fast path only sees
        // unsigned ones), so numbers take precedence over symbols.
        match match_number(token) {
            Ok(Some(value)) => return Ok(value),
            Err(cause) => return Err(self.fail(cause)),
            Ok(None) => {}
        }

        Symbol::intern(token)
            .map(Value::Symbol)
            .ok_or_else(|| self.fail(format!("Invalid token: {}", token)))
    }

    fn read_delimited(&mut self, delimiter: char) -> Result<Vec<Value>, Error> {
        let first_line = self.line;
        let mut items = Vec::new();

        loop {
            let mut c = match self.next_char() {
                Some(c) => c,
                None => {
                    return Err(self.fail(format!(
                        "EOF while reading, starting at line {}",
                        first_line
                    )))
                }
            };

            while is_whitespace(c) {
                c = match self.next_char() {
                    Some(c) => c,
                    None => {
                        return Err(self.fail(format!(
                            "EOF while reading, starting at line {}",
                            first_line
                        )))
                    }
                };
            }

            if c == delimiter {
                return Ok(items);
            }

            self.unread(c);
            if let Some(value) = self.read(true)? {
                items.push(value);
            }
        }
    }

    /// Accumulate digits of `base` after an already validated first digit,
    /// up to `length` digits total. `exact` demands the full length.
    fn read_codepoint_digits(
        &mut self,
        first: char,
        base: u32,
        length: usize,
        exact: bool,
    ) -> Result<u32, Error> {
        let mut digits = String::new();
        digits.push(first);

        while digits.len() < length {
            match self.next_char() {
                Some(c) if c.is_digit(base) => digits.push(c),
                Some(c) => {
                    if exact {
                        return Err(self.fail(format!(
                            "Invalid character length: {}, should be: {}",
                            digits.len(),
                            length
                        )));
                    }
                    self.unread(c);
                    break;
                }
                None => {
                    if exact {
                        return Err(self.fail(format!(
                            "Invalid character length: {}, should be: {}",
                            digits.len(),
                            length
                        )));
                    }
                    break;
                }
            }
        }

        u32::from_str_radix(&digits, base)
            .map_err(|_| self.fail(format!("Invalid character code: {}", digits)))
    }
}

/// Read the first form of a string.
pub fn read_str(source: &str) -> Result<Option<Value>, Error> {
    Reader::new(source).read(false)
}

fn char_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let first = r
        .next_char()
        .ok_or_else(|| r.fail("EOF while reading character"))?;
    let token = r.read_token(first);

    let mut chars = token.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        return Ok(Some(Value::Char(only)));
    }

    let named = match token.as_str() {
        "newline" => Some('\n'),
        "space" => Some(' '),
        "tab" => Some('\t'),
        "backspace" => Some('\u{8}'),
        "formfeed" => Some('\u{c}'),
        "return" => Some('\r'),
        _ => None,
    };
    if let Some(c) = named {
        return Ok(Some(Value::Char(c)));
    }

    if token.starts_with(['u', 'U']) {
        let code = u32::from_str_radix(&token[1..], 16)
            .map_err(|_| r.fail(format!("Invalid unicode character: {}", token)))?;
        let c = char::from_u32(code)
            .ok_or_else(|| r.fail(format!("Invalid unicode character: {}", token)))?;
        return Ok(Some(Value::Char(c)));
    }

    if token.starts_with(['o', 'O']) {
        if token.len() > 4 {
            return Err(r.fail(format!(
                "Invalid octal escape sequence length in literal string: {}",
                token
            )));
        }
        let code = u32::from_str_radix(&token[1..], 8)
            .map_err(|_| r.fail(format!("Invalid octal character: {}", token)))?;
        if code > 0xFF {
            return Err(r.fail(format!(
                "Octal escape sequence in literal string must be in range [0, 377], got: ({})",
                code
            )));
        }
        let c = char::from_u32(code)
            .ok_or_else(|| r.fail(format!("Invalid octal character: {}", token)))?;
        return Ok(Some(Value::Char(c)));
    }

    Err(r.fail(format!("Unsupported character: \\{}", token)))
}

fn string_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let mut out = String::new();

    loop {
        let c = r
            .next_char()
            .ok_or_else(|| r.fail("EOF while reading string"))?;
        match c {
            '"' => return Ok(Some(Value::Str(out))),
            '\\' => {
                let escape = r
                    .next_char()
                    .ok_or_else(|| r.fail("EOF while reading string"))?;
                match escape {
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'n' => out.push('\n'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    'u' => {
                        let first = r
                            .next_char()
                            .ok_or_else(|| r.fail("EOF while reading string"))?;
                        if !first.is_ascii_hexdigit() {
                            return Err(r.fail(format!(
                                "Hexadecimal digit expected after \\u in literal string, got: ({})",
                                first
                            )));
                        }
                        let code = r.read_codepoint_digits(first, 16, 4, true)?;
                        let c = char::from_u32(code).ok_or_else(|| {
                            r.fail(format!("Invalid unicode character: \\u{:04x}", code))
                        })?;
                        out.push(c);
                    }
                    '0'..='7' => {
                        let code = r.read_codepoint_digits(escape, 8, 3, false)?;
                        if code > 0xFF {
                            return Err(r.fail(format!(
                                "Octal escape sequence in literal string must be in range [0, 377], got: ({})",
                                code
                            )));
                        }
                        let c = char::from_u32(code).ok_or_else(|| {
                            r.fail(format!("Invalid octal character: \\{:o}", code))
                        })?;
                        out.push(c);
                    }
                    other => {
                        return Err(r.fail(format!(
                            "Unsupported escape character in literal string: {}",
                            other
                        )))
                    }
                }
            }
            _ => out.push(c),
        }
    }
}

fn quote_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let form = r
        .read(true)?
        .ok_or_else(|| r.fail("EOF while reading"))?;
    Ok(Some(Value::List(vec![
        Value::Symbol(Symbol::new("quote")),
        form,
    ])))
}

fn list_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let items = r.read_delimited(')')?;
    Ok(Some(Value::List(items)))
}

fn vector_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let items = r.read_delimited(']')?;
    Ok(Some(Value::Vector(items)))
}

fn map_reader(r: &mut Reader<'_>, _c: char) -> Result<Option<Value>, Error> {
    let items = r.read_delimited('}')?;
    if items.len() % 2 != 0 {
        return Err(r.fail("Map literal must contain an even number of forms"));
    }

    let mut entries = HashMap::new();
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        entries.insert(k, v);
    }
    Ok(Some(Value::Map(Rc::new(entries))))
}

fn unmatched_delimiter_reader(r: &mut Reader<'_>, c: char) -> Result<Option<Value>, Error> {
    Err(r.fail(format!("Unmatched delimiter: {}", c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(source: &str) -> Value {
        read_str(source).unwrap().unwrap()
    }

    fn read_err(source: &str) -> Error {
        read_str(source).unwrap_err()
    }

    #[test]
    fn test_read_atoms() {
        assert_eq!(read_one("nil"), Value::Nil);
        assert_eq!(read_one("true"), Value::Bool(true));
        assert_eq!(read_one("false"), Value::Bool(false));
        assert_eq!(read_one("foo"), Value::Symbol(Symbol::new("foo")));
        assert_eq!(
            read_one("my.ns/foo"),
            Value::Symbol(Symbol::qualified("my.ns", "foo"))
        );
        assert_eq!(read_one(":kw"), Value::Symbol(Symbol::new(":kw")));
    }

    #[test]
    fn test_read_integers() {
        assert_eq!(read_one("0"), Value::Int(0));
        assert_eq!(read_one("42"), Value::Int(42));
        assert_eq!(read_one("-42"), Value::Int(-42));
        assert_eq!(read_one("+42"), Value::Int(42));
    }

    #[test]
    fn test_read_octal_and_hex() {
        assert_eq!(read_one("0666"), Value::Int(0o666));
        assert_eq!(read_one("0x1F"), Value::Int(0x1F));
        assert_eq!(read_one("0XdeadBEEF"), Value::Int(0xdead_beef));
        assert_eq!(read_one("-0x10"), Value::Int(-16));
    }

    #[test]
    fn test_read_radix_integers() {
        assert_eq!(read_one("2r1010"), Value::Int(10));
        assert_eq!(read_one("16rFF"), Value::Int(255));
        assert_eq!(read_one("36rZZ"), Value::Int(35 * 36 + 35));
        assert_eq!(read_one("-12rAA"), Value::Int(-130));
    }

    #[test]
    fn test_integer_round_trip_across_bases() {
        for n in [0i64, 1, 7, 8, 255, 1000, 123_456] {
            assert_eq!(read_one(&n.to_string()), Value::Int(n));
            assert_eq!(read_one(&format!("0x{:x}", n + 1)), Value::Int(n + 1));
            if n > 0 {
                assert_eq!(read_one(&format!("0{:o}", n)), Value::Int(n));
            }
        }
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(read_err("1rZZ"), Error::Reader { .. }));
        assert!(matches!(read_err("99r10"), Error::Reader { .. }));
        assert!(matches!(read_err("12xyz"), Error::Reader { .. }));
        assert!(matches!(read_err("089"), Error::Reader { .. }));
    }

    #[test]
    fn test_read_floats() {
        assert_eq!(read_one("1.5"), Value::Float(1.5));
        assert_eq!(read_one("-2.5"), Value::Float(-2.5));
        assert_eq!(read_one("42."), Value::Float(42.0));
        assert_eq!(read_one("1e3"), Value::Float(1000.0));
        assert_eq!(read_one("1.5e-2"), Value::Float(0.015));
    }

    #[test]
    fn test_read_ratios() {
        assert_eq!(read_one("1/3"), Value::Ratio(Rational64::new(1, 3)));
        assert_eq!(read_one("-1/3"), Value::Ratio(Rational64::new(-1, 3)));
        // Reduced to lowest terms on construction
        assert_eq!(read_one("4/6"), Value::Ratio(Rational64::new(2, 3)));
        assert!(matches!(read_err("1/0"), Error::Reader { .. }));
    }

    #[test]
    fn test_signed_tokens_are_numbers_not_symbols() {
        assert_eq!(read_one("-5"), Value::Int(-5));
        assert_eq!(read_one("+"), Value::Symbol(Symbol::new("+")));
        assert_eq!(read_one("-"), Value::Symbol(Symbol::new("-")));
    }

    #[test]
    fn test_read_char_literals() {
        assert_eq!(read_one("\\a"), Value::Char('a'));
        assert_eq!(read_one("\\1"), Value::Char('1'));
        assert_eq!(read_one("\\newline"), Value::Char('\n'));
        assert_eq!(read_one("\\space"), Value::Char(' '));
        assert_eq!(read_one("\\tab"), Value::Char('\t'));
        assert_eq!(read_one("\\u0041"), Value::Char('A'));
        assert_eq!(read_one("\\o101"), Value::Char('A'));
    }

    #[test]
    fn test_bad_char_literals() {
        assert!(matches!(read_err("\\frobnicate"), Error::Reader { .. }));
        assert!(matches!(read_err("\\o1012"), Error::Reader { .. }));
        assert!(matches!(read_err("\\o777"), Error::Reader { .. }));
        assert!(matches!(read_err("\\"), Error::Reader { .. }));
    }

    #[test]
    fn test_read_strings() {
        assert_eq!(read_one("\"hello\""), Value::Str("hello".into()));
        assert_eq!(read_one("\"\""), Value::Str(String::new()));
        assert_eq!(read_one(r#""a\nb\tc""#), Value::Str("a\nb\tc".into()));
        assert_eq!(read_one(r#""say \"hi\"""#), Value::Str("say \"hi\"".into()));
        assert_eq!(read_one(r#""back\\slash""#), Value::Str("back\\slash".into()));
        assert_eq!(read_one(r#""A""#), Value::Str("A".into()));
        assert_eq!(read_one(r#""\101""#), Value::Str("A".into()));
    }

    #[test]
    fn test_bad_strings() {
        assert!(matches!(read_err("\"unterminated"), Error::Reader { .. }));
        assert!(matches!(read_err(r#""\q""#), Error::Reader { .. }));
        assert!(matches!(read_err(r#""\uzz""#), Error::Reader { .. }));
    }

    #[test]
    fn test_read_collections() {
        assert_eq!(
            read_one("(1 2 3)"),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(read_one("()"), Value::List(vec![]));
        assert_eq!(
            read_one("[1 [2] 3]"),
            Value::Vector(vec![
                Value::Int(1),
                Value::Vector(vec![Value::Int(2)]),
                Value::Int(3)
            ])
        );

        let map = read_one("{:a 1, :b 2}");
        match map {
            Value::Map(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(
                    entries.get(&Value::Symbol(Symbol::new(":a"))),
                    Some(&Value::Int(1))
                );
            }
            other => panic!("expected map, got {}", other),
        }

        match read_one("{}") {
            Value::Map(entries) => assert!(entries.is_empty()),
            other => panic!("expected map, got {}", other),
        }
    }

    #[test]
    fn test_commas_are_whitespace() {
        assert_eq!(
            read_one("(1,2,,3)"),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_quote_wraps_next_form() {
        assert_eq!(
            read_one("'foo"),
            Value::List(vec![
                Value::Symbol(Symbol::new("quote")),
                Value::Symbol(Symbol::new("foo"))
            ])
        );
        assert_eq!(
            read_one("'(1 2)"),
            Value::List(vec![
                Value::Symbol(Symbol::new("quote")),
                Value::List(vec![Value::Int(1), Value::Int(2)])
            ])
        );
    }

    #[test]
    fn test_unmatched_delimiters() {
        for source in [")", "]", "}", "(1 2]"] {
            let err = read_err(source);
            assert!(
                err.to_string().contains("Unmatched delimiter"),
                "unexpected error for {:?}: {}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_unterminated_list_reports_start_line() {
        let err = read_err("(1 2");
        assert!(err.to_string().contains("EOF while reading"));
    }

    #[test]
    fn test_odd_map_literal_is_an_error() {
        assert!(matches!(read_err("{:a 1 :b}"), Error::Reader { .. }));
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(read_err("foo:"), Error::Reader { .. }));
        assert!(matches!(read_err("a::b"), Error::Reader { .. }));
    }

    #[test]
    fn test_eof_handling() {
        assert_eq!(read_str("").unwrap(), None);
        assert_eq!(read_str("   ,, ").unwrap(), None);
        assert!(Reader::new("").read(true).is_err());
    }

    #[test]
    fn test_reader_error_position() {
        let err = read_err("(1 2\n   ]");
        match err {
            Error::Reader { line, .. } => assert_eq!(line, 2),
            other => panic!("expected reader error, got {}", other),
        }
    }

    #[test]
    fn test_sequential_reads() {
        let mut reader = Reader::new("1 two \"three\"");
        assert_eq!(reader.read(false).unwrap(), Some(Value::Int(1)));
        assert_eq!(
            reader.read(false).unwrap(),
            Some(Value::Symbol(Symbol::new("two")))
        );
        assert_eq!(
            reader.read(false).unwrap(),
            Some(Value::Str("three".into()))
        );
        assert_eq!(reader.read(false).unwrap(), None);
    }

    #[test]
    fn test_print_read_round_trip_for_atoms() {
        let atoms = [
            Value::Int(42),
            Value::Int(-7),
            Value::Float(2.5),
            Value::Float(4.0),
            Value::Ratio(Rational64::new(3, 7)),
            Value::Str("plain text".into()),
            Value::Symbol(Symbol::new("foo")),
            Value::Symbol(Symbol::qualified("user", "bar")),
            Value::Symbol(Symbol::new(":kw")),
            Value::Char('x'),
            Value::Char('\n'),
            Value::Bool(true),
            Value::Nil,
        ];
        for atom in atoms {
            let printed = atom.to_string();
            assert_eq!(read_one(&printed), atom, "round trip failed for {}", printed);
        }
    }
}
