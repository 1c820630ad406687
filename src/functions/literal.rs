// Literal evaluation of python-style call arguments
//
// Tokenizes an argument list such as `1, "a", tags=["x", "y"]`, parses it as
// call arguments and evaluates every literal argument (numbers, strings,
// booleans, None, lists, tuples, sets, dicts) to a JSON value. Arguments
// that are valid expressions but not literals keep their exact source text.
// Malformed input is a `LiteralError`; callers fall back to a plain splitter.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Errors raised while parsing an argument list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unbalanced '{0}'")]
    Unbalanced(char),

    #[error("unexpected token at byte {0}")]
    UnexpectedToken(usize),

    #[error("positional argument follows keyword argument")]
    PositionalAfterKeyword,

    #[error("unexpected end of input")]
    UnexpectedEnd,
}

/// A single evaluated argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// The argument was a literal
    Literal(Value),
    /// The argument was some other expression, kept as written
    Source(String),
}

impl Argument {
    pub fn into_value(self) -> Value {
        match self {
            Argument::Literal(value) => value,
            Argument::Source(text) => Value::String(text),
        }
    }
}

/// Arguments of one call, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    pub positional: Vec<Argument>,
    pub keywords: Vec<(String, Argument)>,
}

/// Parse and evaluate the text between the parentheses of a call
pub fn parse_call_arguments(src: &str) -> Result<CallArguments, LiteralError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    parser.parse_arguments()
}

// Tokenizer

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// A number; `None` when it has no JSON form (complex, overflow)
    Number(Option<Value>),
    /// A string; `literal` is false for bytes and f-strings
    Str { value: String, literal: bool },
    Name(String),
    Op(&'static str),
    Open(char),
    Close(char),
    Comma,
    Colon,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

/// Longest first so that `**` wins over `*`
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "->", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "<", ">", "&", "|",
    "^", "~", "@", ".",
];

const BINARY_OPERATORS: &[&str] = &[
    "**", "//", "<<", ">>", "<=", ">=", "==", "!=", ":=", "+", "-", "*", "/", "%", "<", ">", "&",
    "|", "^", "@",
];

const KEYWORD_OPERATORS: &[&str] = &["and", "or", "not", "in", "is", "if", "else"];

const RESERVED: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "elif", "lambda", "for", "while", "yield",
    "await", "async", "def", "class", "return", "import", "from", "as", "with", "pass", "del",
    "global", "nonlocal", "assert", "raise", "try", "except", "finally", "break", "continue",
];

fn tokenize(src: &str) -> Result<Vec<Token>, LiteralError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let byte_at = |idx: usize| chars.get(idx).map(|c| c.0).unwrap_or(src.len());
    let char_at = |idx: usize| chars.get(idx).map(|c| c.1);

    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, ch) = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && char_at(i + 1).is_some_and(|c| c.is_ascii_digit()))
        {
            let (kind, next) = read_number(src, &chars, i);
            tokens.push(Token {
                kind,
                start,
                end: byte_at(next),
            });
            i = next;
            continue;
        }

        if ch == '_' || ch.is_alphabetic() {
            let mut j = i;
            while char_at(j).is_some_and(|c| c == '_' || c.is_alphanumeric()) {
                j += 1;
            }
            let ident = &src[start..byte_at(j)];

            if matches!(char_at(j), Some('\'') | Some('"')) && is_string_prefix(ident) {
                let (kind, next) = read_string(&chars, j, ident)?;
                tokens.push(Token {
                    kind,
                    start,
                    end: byte_at(next),
                });
                i = next;
                continue;
            }

            tokens.push(Token {
                kind: TokenKind::Name(ident.to_string()),
                start,
                end: byte_at(j),
            });
            i = j;
            continue;
        }

        if ch == '\'' || ch == '"' {
            let (kind, next) = read_string(&chars, i, "")?;
            tokens.push(Token {
                kind,
                start,
                end: byte_at(next),
            });
            i = next;
            continue;
        }

        let single = match ch {
            '(' | '[' | '{' => Some(TokenKind::Open(ch)),
            ')' | ']' | '}' => Some(TokenKind::Close(ch)),
            ',' => Some(TokenKind::Comma),
            ':' if char_at(i + 1) != Some('=') => Some(TokenKind::Colon),
            '=' if char_at(i + 1) != Some('=') => Some(TokenKind::Assign),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token {
                kind,
                start,
                end: byte_at(i + 1),
            });
            i += 1;
            continue;
        }

        let rest = &src[start..];
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                // Operators are ASCII, one char per byte
                tokens.push(Token {
                    kind: TokenKind::Op(*op),
                    start,
                    end: start + op.len(),
                });
                i += op.len();
            }
            None => return Err(LiteralError::UnexpectedChar { ch, pos: start }),
        }
    }

    Ok(tokens)
}

fn is_string_prefix(ident: &str) -> bool {
    matches!(
        ident.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

fn read_number(src: &str, chars: &[(usize, char)], i: usize) -> (TokenKind, usize) {
    let byte_at = |idx: usize| chars.get(idx).map(|c| c.0).unwrap_or(src.len());
    let char_at = |idx: usize| chars.get(idx).map(|c| c.1);
    let is_digit = |idx: usize| char_at(idx).is_some_and(|c| c.is_ascii_digit() || c == '_');

    if char_at(i) == Some('0') {
        let radix = match char_at(i + 1) {
            Some('x') | Some('X') => Some(16),
            Some('o') | Some('O') => Some(8),
            Some('b') | Some('B') => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            let mut j = i + 2;
            while char_at(j).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                j += 1;
            }
            let digits = src[byte_at(i + 2)..byte_at(j)].replace('_', "");
            let value = i64::from_str_radix(&digits, radix).ok().map(Value::from);
            return (TokenKind::Number(value), j);
        }
    }

    let mut j = i;
    let mut is_float = false;
    while is_digit(j) {
        j += 1;
    }
    if char_at(j) == Some('.') {
        is_float = true;
        j += 1;
        while is_digit(j) {
            j += 1;
        }
    }
    if matches!(char_at(j), Some('e') | Some('E')) {
        let signed = matches!(char_at(j + 1), Some('+') | Some('-'));
        let first_digit = if signed { j + 2 } else { j + 1 };
        if char_at(first_digit).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            j = first_digit;
            while is_digit(j) {
                j += 1;
            }
        }
    }
    if matches!(char_at(j), Some('j') | Some('J')) {
        return (TokenKind::Number(None), j + 1);
    }

    let text = src[byte_at(i)..byte_at(j)].replace('_', "");
    let value = if is_float {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    } else {
        parse_integer(&text)
    };
    (TokenKind::Number(value), j)
}

fn parse_integer(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn read_string(
    chars: &[(usize, char)],
    i: usize,
    prefix: &str,
) -> Result<(TokenKind, usize), LiteralError> {
    let prefix = prefix.to_ascii_lowercase();
    let raw = prefix.contains('r');
    let literal = !prefix.contains('b') && !prefix.contains('f');

    let char_at = |idx: usize| chars.get(idx).map(|c| c.1);
    let (start_pos, quote) = chars[i];
    let triple = char_at(i + 1) == Some(quote) && char_at(i + 2) == Some(quote);

    let mut j = if triple { i + 3 } else { i + 1 };
    let mut value = String::new();

    loop {
        let c = char_at(j).ok_or(LiteralError::UnterminatedString(start_pos))?;

        if c == '\\' {
            let next = char_at(j + 1).ok_or(LiteralError::UnterminatedString(start_pos))?;
            j += 2;
            if raw {
                value.push('\\');
                value.push(next);
                continue;
            }
            match next {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                'a' => value.push('\x07'),
                'b' => value.push('\x08'),
                'f' => value.push('\x0c'),
                'v' => value.push('\x0b'),
                '\\' | '\'' | '"' => value.push(next),
                '\n' => {}
                'x' | 'u' | 'U' => {
                    let width = match next {
                        'x' => 2,
                        'u' => 4,
                        _ => 8,
                    };
                    match read_hex(chars, j, width) {
                        Some(decoded) => {
                            value.push(decoded);
                            j += width;
                        }
                        None => {
                            value.push('\\');
                            value.push(next);
                        }
                    }
                }
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
            continue;
        }

        if c == quote {
            if !triple {
                return Ok((TokenKind::Str { value, literal }, j + 1));
            }
            if char_at(j + 1) == Some(quote) && char_at(j + 2) == Some(quote) {
                return Ok((TokenKind::Str { value, literal }, j + 3));
            }
        }

        if c == '\n' && !triple {
            return Err(LiteralError::UnterminatedString(start_pos));
        }

        value.push(c);
        j += 1;
    }
}

fn read_hex(chars: &[(usize, char)], j: usize, width: usize) -> Option<char> {
    let digits: String = chars.get(j..j + width)?.iter().map(|c| c.1).collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
}

// Parser

/// A parsed expression: its literal value if it has one, and its source span
#[derive(Debug)]
struct Expr {
    value: Option<Value>,
    /// Plain number constant (possibly parenthesized); only these take a sign
    numeric: bool,
    start: usize,
    end: usize,
}

impl Expr {
    fn literal(value: Value, start: usize, end: usize) -> Self {
        Self {
            value: Some(value),
            numeric: false,
            start,
            end,
        }
    }

    fn opaque(start: usize, end: usize) -> Self {
        Self {
            value: None,
            numeric: false,
            start,
            end,
        }
    }

    fn into_argument(self, src: &str) -> Argument {
        match self.value {
            Some(value) => Argument::Literal(value),
            None => Argument::Source(src[self.start..self.end].to_string()),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek_token() {
            Some(token) => LiteralError::UnexpectedToken(token.start),
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn parse_arguments(&mut self) -> Result<CallArguments, LiteralError> {
        let mut args = CallArguments::default();
        let mut seen_keyword = false;

        while self.peek().is_some() {
            let keyword = match (
                self.tokens.get(self.pos).map(|t| &t.kind),
                self.tokens.get(self.pos + 1).map(|t| &t.kind),
            ) {
                (Some(TokenKind::Name(name)), Some(TokenKind::Assign))
                    if !RESERVED.contains(&name.as_str()) =>
                {
                    Some(name.clone())
                }
                _ => None,
            };

            if let Some(name) = keyword {
                self.pos += 2;
                let expr = self.parse_expr()?;
                args.keywords.push((name, expr.into_argument(self.src)));
                seen_keyword = true;
            } else if self.peek() == Some(&TokenKind::Op("**")) {
                // **kwargs has no keyword to assign to
                self.pos += 1;
                self.parse_expr()?;
                seen_keyword = true;
            } else if self.peek() == Some(&TokenKind::Op("*")) {
                let star = self.advance().ok_or(LiteralError::UnexpectedEnd)?;
                let expr = self.parse_expr()?;
                args.positional
                    .push(Expr::opaque(star.start, expr.end).into_argument(self.src));
            } else {
                if seen_keyword {
                    return Err(LiteralError::PositionalAfterKeyword);
                }
                let expr = self.parse_expr()?;
                args.positional.push(expr.into_argument(self.src));
            }

            match self.peek() {
                None => break,
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::Close(c)) => return Err(LiteralError::Unbalanced(*c)),
                Some(_) => return Err(self.unexpected()),
            }
        }

        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr, LiteralError> {
        let first = self.parse_operand()?;
        let start = first.start;
        let mut end = first.end;
        let mut compound = false;

        loop {
            let is_operator = match self.peek() {
                Some(TokenKind::Op(op)) => BINARY_OPERATORS.contains(op),
                Some(TokenKind::Name(name)) => KEYWORD_OPERATORS.contains(&name.as_str()),
                _ => false,
            };
            if !is_operator {
                break;
            }

            let op = self.advance().ok_or(LiteralError::UnexpectedEnd)?;
            if op.kind == TokenKind::Name("not".to_string()) {
                // `not` in binary position only appears as `not in`
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::Name(name),
                        ..
                    }) if name == "in" => {}
                    Some(token) => return Err(LiteralError::UnexpectedToken(token.start)),
                    None => return Err(LiteralError::UnexpectedEnd),
                }
            }

            let rhs = self.parse_operand()?;
            end = rhs.end;
            compound = true;
        }

        if self.at_comprehension() {
            return self.skip_comprehension(start, end);
        }

        if compound {
            Ok(Expr::opaque(start, end))
        } else {
            Ok(first)
        }
    }

    /// True at a `for` or `async for` clause
    fn at_comprehension(&self) -> bool {
        let name_at = |idx: usize| match self.tokens.get(idx).map(|t| &t.kind) {
            Some(TokenKind::Name(name)) => Some(name.as_str()),
            _ => None,
        };
        match name_at(self.pos) {
            Some("for") => true,
            Some("async") => name_at(self.pos + 1) == Some("for"),
            _ => false,
        }
    }

    /// Consume comprehension clauses up to the enclosing closer or the end.
    ///
    /// A comprehension is the only item of its brackets, so top-level
    /// commas (`for k, v in ...`) belong to it.
    fn skip_comprehension(&mut self, start: usize, mut end: usize) -> Result<Expr, LiteralError> {
        let mut stack: Vec<char> = Vec::new();

        while let Some(token) = self.peek_token().cloned() {
            match token.kind {
                TokenKind::Open(c) => stack.push(c),
                TokenKind::Close(c) => match stack.pop() {
                    None => break,
                    Some(open) if closer_for(open) != c => return Err(LiteralError::Unbalanced(c)),
                    Some(_) => {}
                },
                _ => {}
            }
            end = token.end;
            self.pos += 1;
        }

        if let Some(open) = stack.pop() {
            return Err(LiteralError::Unbalanced(open));
        }
        Ok(Expr::opaque(start, end))
    }

    /// `lambda params: body`, kept as source up to the next top-level comma
    /// or the enclosing closer
    fn skip_lambda(&mut self, start: usize) -> Result<Expr, LiteralError> {
        let mut stack: Vec<char> = Vec::new();
        let mut in_body = false;
        let mut end = start;

        while let Some(token) = self.peek_token().cloned() {
            match token.kind {
                TokenKind::Open(c) => stack.push(c),
                TokenKind::Close(c) => match stack.pop() {
                    None => break,
                    Some(open) if closer_for(open) != c => return Err(LiteralError::Unbalanced(c)),
                    Some(_) => {}
                },
                TokenKind::Colon if stack.is_empty() => in_body = true,
                TokenKind::Comma if stack.is_empty() && in_body => break,
                _ => {}
            }
            end = token.end;
            self.pos += 1;
        }

        if let Some(open) = stack.pop() {
            return Err(LiteralError::Unbalanced(open));
        }
        if !in_body {
            return Err(self.unexpected());
        }
        Ok(Expr::opaque(start, end))
    }

    fn parse_operand(&mut self) -> Result<Expr, LiteralError> {
        let token = self
            .peek_token()
            .cloned()
            .ok_or(LiteralError::UnexpectedEnd)?;

        match &token.kind {
            TokenKind::Op(op) if matches!(*op, "-" | "+" | "~") => {
                self.pos += 1;
                let inner = self.parse_operand()?;
                let value = match (*op, inner.numeric, inner.value) {
                    ("-", true, Some(value)) => negate(&value),
                    ("+", true, Some(value)) => Some(value),
                    _ => None,
                };
                Ok(Expr {
                    value,
                    numeric: false,
                    start: token.start,
                    end: inner.end,
                })
            }
            TokenKind::Name(name) if name == "lambda" => self.skip_lambda(token.start),
            TokenKind::Name(name) if name == "not" => {
                self.pos += 1;
                let inner = self.parse_operand()?;
                Ok(Expr::opaque(token.start, inner.end))
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, LiteralError> {
        let token = self.advance().ok_or(LiteralError::UnexpectedEnd)?;

        match token.kind {
            TokenKind::Number(value) => Ok(Expr {
                numeric: value.is_some(),
                value,
                start: token.start,
                end: token.end,
            }),
            TokenKind::Str { value, literal } => {
                // Adjacent string literals concatenate
                let mut text = value;
                let mut literal = literal;
                let mut end = token.end;
                while let Some(Token {
                    kind:
                        TokenKind::Str {
                            value: next,
                            literal: next_literal,
                        },
                    end: next_end,
                    ..
                }) = self.peek_token().cloned()
                {
                    text.push_str(&next);
                    literal &= next_literal;
                    end = next_end;
                    self.pos += 1;
                }
                Ok(Expr {
                    value: literal.then_some(Value::String(text)),
                    numeric: false,
                    start: token.start,
                    end,
                })
            }
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::literal(Value::Bool(true), token.start, token.end)),
                "False" => Ok(Expr::literal(Value::Bool(false), token.start, token.end)),
                "None" => Ok(Expr::literal(Value::Null, token.start, token.end)),
                other if RESERVED.contains(&other) => {
                    Err(LiteralError::UnexpectedToken(token.start))
                }
                _ => Ok(Expr::opaque(token.start, token.end)),
            },
            TokenKind::Open('(') => self.parse_parenthesized(token.start),
            TokenKind::Open('[') => {
                let (items, _, end) = self.parse_items(']')?;
                Ok(collect_array(items, token.start, end))
            }
            TokenKind::Open('{') => self.parse_braced(token.start),
            TokenKind::Close(c) => Err(LiteralError::Unbalanced(c)),
            _ => Err(LiteralError::UnexpectedToken(token.start)),
        }
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, LiteralError> {
        loop {
            match self.peek() {
                Some(TokenKind::Op(".")) => {
                    self.pos += 1;
                    match self.advance() {
                        Some(Token {
                            kind: TokenKind::Name(_),
                            end,
                            ..
                        }) => expr = Expr::opaque(expr.start, end),
                        Some(token) => return Err(LiteralError::UnexpectedToken(token.start)),
                        None => return Err(LiteralError::UnexpectedEnd),
                    }
                }
                Some(TokenKind::Open('(')) | Some(TokenKind::Open('[')) => {
                    let end = self.skip_balanced()?;
                    expr = Expr::opaque(expr.start, end);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `( ... )`: a parenthesized expression or a tuple
    fn parse_parenthesized(&mut self, start: usize) -> Result<Expr, LiteralError> {
        let (mut items, trailing_comma, end) = self.parse_items(')')?;

        if items.len() == 1 && !trailing_comma {
            if let Some(inner) = items.pop() {
                return Ok(Expr { start, end, ..inner });
            }
        }

        Ok(collect_array(items, start, end))
    }

    /// Comma-separated expressions up to `close`; returns the items,
    /// whether the last item was followed by a comma, and the end offset
    fn parse_items(&mut self, close: char) -> Result<(Vec<Expr>, bool, usize), LiteralError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;

        loop {
            if let Some(TokenKind::Close(c)) = self.peek() {
                let c = *c;
                if c != close {
                    return Err(LiteralError::Unbalanced(c));
                }
                let token = self.advance().ok_or(LiteralError::UnexpectedEnd)?;
                return Ok((items, trailing_comma, token.end));
            }

            let item = if self.peek() == Some(&TokenKind::Op("*")) {
                let star = self.advance().ok_or(LiteralError::UnexpectedEnd)?;
                let expr = self.parse_expr()?;
                Expr::opaque(star.start, expr.end)
            } else {
                self.parse_expr()?
            };
            items.push(item);
            trailing_comma = false;

            match self.peek() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(TokenKind::Close(_)) => {}
                Some(_) => return Err(self.unexpected()),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    /// `{ ... }`: a dict, or a set when the first item has no colon
    fn parse_braced(&mut self, start: usize) -> Result<Expr, LiteralError> {
        let mut is_dict: Option<bool> = None;
        let mut entries: Vec<(Expr, Expr)> = Vec::new();
        let mut set_items: Vec<Expr> = Vec::new();
        let mut opaque = false;

        let end = loop {
            if let Some(TokenKind::Close(c)) = self.peek() {
                let c = *c;
                if c != '}' {
                    return Err(LiteralError::Unbalanced(c));
                }
                let token = self.advance().ok_or(LiteralError::UnexpectedEnd)?;
                break token.end;
            }

            if self.peek() == Some(&TokenKind::Op("**")) {
                if is_dict == Some(false) {
                    return Err(self.unexpected());
                }
                is_dict = Some(true);
                self.pos += 1;
                self.parse_expr()?;
                opaque = true;
            } else {
                let key = self.parse_expr()?;
                if self.peek() == Some(&TokenKind::Colon) {
                    if is_dict == Some(false) {
                        return Err(self.unexpected());
                    }
                    is_dict = Some(true);
                    self.pos += 1;
                    let value = self.parse_expr()?;
                    entries.push((key, value));
                } else {
                    if is_dict == Some(true) {
                        return Err(self.unexpected());
                    }
                    is_dict = Some(false);
                    set_items.push(key);
                }
            }

            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::Close(_)) => {}
                Some(_) => return Err(self.unexpected()),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        };

        if is_dict == Some(false) {
            return Ok(collect_array(set_items, start, end));
        }
        if opaque {
            return Ok(Expr::opaque(start, end));
        }

        let mut map = Map::new();
        for (key, value) in entries {
            let (Some(key), Some(value)) = (key.value, value.value) else {
                return Ok(Expr::opaque(start, end));
            };
            let Some(key) = key_string(&key) else {
                return Ok(Expr::opaque(start, end));
            };
            map.insert(key, value);
        }
        Ok(Expr::literal(Value::Object(map), start, end))
    }

    /// Consume a bracketed group starting at the current opener; returns its end
    fn skip_balanced(&mut self) -> Result<usize, LiteralError> {
        let mut stack: Vec<char> = Vec::new();

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::Open(c) => stack.push(c),
                TokenKind::Close(c) => {
                    let open = stack.pop().ok_or(LiteralError::Unbalanced(c))?;
                    if closer_for(open) != c {
                        return Err(LiteralError::Unbalanced(c));
                    }
                    if stack.is_empty() {
                        return Ok(token.end);
                    }
                }
                _ => {}
            }
        }

        Err(LiteralError::UnexpectedEnd)
    }
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn collect_array(items: Vec<Expr>, start: usize, end: usize) -> Expr {
    let values: Option<Vec<Value>> = items.into_iter().map(|item| item.value).collect();
    match values {
        Some(values) => Expr::literal(Value::Array(values), start, end),
        None => Expr::opaque(start, end),
    }
}

fn negate(value: &Value) -> Option<Value> {
    if let Some(n) = value.as_i64() {
        return match n.checked_neg() {
            Some(negated) => Some(Value::from(negated)),
            None => Number::from_f64(-(n as f64)).map(Value::Number),
        };
    }
    value
        .as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
}

/// JSON object key for a literal dict key; containers cannot be keys
fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positional(src: &str) -> Vec<Argument> {
        parse_call_arguments(src).unwrap().positional
    }

    fn lit(value: Value) -> Argument {
        Argument::Literal(value)
    }

    fn source(text: &str) -> Argument {
        Argument::Source(text.to_string())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            positional("1, -2, 3.5, +4, 'a', \"b\", True, False, None"),
            vec![
                lit(json!(1)),
                lit(json!(-2)),
                lit(json!(3.5)),
                lit(json!(4)),
                lit(json!("a")),
                lit(json!("b")),
                lit(json!(true)),
                lit(json!(false)),
                lit(Value::Null),
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            positional("0x1F, 1_000, 1e3, .5, -(2)"),
            vec![
                lit(json!(31)),
                lit(json!(1000)),
                lit(json!(1000.0)),
                lit(json!(0.5)),
                lit(json!(-2)),
            ]
        );
    }

    #[test]
    fn test_containers() {
        let args = positional("[1, 2], (3, 4), {'k': [True]}, {5, 6}, (7,), ()");
        assert_eq!(
            args,
            vec![
                lit(json!([1, 2])),
                lit(json!([3, 4])),
                lit(json!({"k": [true]})),
                lit(json!([5, 6])),
                lit(json!([7])),
                lit(json!([])),
            ]
        );
    }

    #[test]
    fn test_dict_keys_become_strings() {
        assert_eq!(
            positional("{1: 'a', True: 'b', None: 'c'}"),
            vec![lit(json!({"1": "a", "true": "b", "null": "c"}))]
        );
    }

    #[test]
    fn test_string_escapes_and_concatenation() {
        assert_eq!(
            positional(r#"'it\'s', "tab\there", 'a' "b", r'\d+', 'é'"#),
            vec![
                lit(json!("it's")),
                lit(json!("tab\there")),
                lit(json!("ab")),
                lit(json!("\\d+")),
                lit(json!("é")),
            ]
        );
    }

    #[test]
    fn test_triple_quoted_string() {
        assert_eq!(
            positional("'''line one\nline two'''"),
            vec![lit(json!("line one\nline two"))]
        );
    }

    #[test]
    fn test_non_literals_keep_source() {
        assert_eq!(
            positional("x, a.b, f(1, 2), 1 + 2, [1, y], data['k'], not x, 1j, f'{x}'"),
            vec![
                source("x"),
                source("a.b"),
                source("f(1, 2)"),
                source("1 + 2"),
                source("[1, y]"),
                source("data['k']"),
                source("not x"),
                source("1j"),
                source("f'{x}'"),
            ]
        );
    }

    #[test]
    fn test_double_negation_is_not_literal() {
        assert_eq!(positional("--1"), vec![source("--1")]);
    }

    #[test]
    fn test_keywords() {
        let args = parse_call_arguments("1, b=[2], c = 'x'").unwrap();
        assert_eq!(args.positional, vec![lit(json!(1))]);
        assert_eq!(
            args.keywords,
            vec![
                ("b".to_string(), lit(json!([2]))),
                ("c".to_string(), lit(json!("x"))),
            ]
        );
    }

    #[test]
    fn test_comparison_is_not_keyword() {
        let args = parse_call_arguments("a == 1").unwrap();
        assert_eq!(args.positional, vec![source("a == 1")]);
        assert!(args.keywords.is_empty());
    }

    #[test]
    fn test_kwargs_unpacking_skipped() {
        let args = parse_call_arguments("a=1, **extra").unwrap();
        assert_eq!(args.keywords.len(), 1);
        assert!(args.positional.is_empty());
    }

    #[test]
    fn test_empty_and_trailing_comma() {
        assert_eq!(parse_call_arguments("").unwrap(), CallArguments::default());
        assert_eq!(positional("1, 2,"), vec![lit(json!(1)), lit(json!(2))]);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(
            parse_call_arguments("'open"),
            Err(LiteralError::UnterminatedString(0))
        );
        assert_eq!(
            parse_call_arguments("a=1, 2"),
            Err(LiteralError::PositionalAfterKeyword)
        );
        assert!(parse_call_arguments("[1, 2").is_err());
        assert!(parse_call_arguments("(1]").is_err());
        assert!(parse_call_arguments("a b").is_err());
        assert!(parse_call_arguments("$x").is_err());
        assert!(parse_call_arguments("1,,2").is_err());
        assert!(parse_call_arguments("lambda x").is_err());
        assert!(parse_call_arguments("[x for x in (y]").is_err());
    }

    #[test]
    fn test_comprehensions_keep_source() {
        assert_eq!(
            positional("1, [x for x in y], {k: v for k, v in items}, {x async for x in y}"),
            vec![
                lit(json!(1)),
                source("[x for x in y]"),
                source("{k: v for k, v in items}"),
                source("{x async for x in y}"),
            ]
        );
        assert_eq!(positional("x * 2 for x in range(3)"), vec![source("x * 2 for x in range(3)")]);
    }

    #[test]
    fn test_lambdas_keep_source() {
        assert_eq!(
            positional("lambda v: v, 2, lambda: {'a': 1}, lambda a, b=1: (a, b)"),
            vec![
                source("lambda v: v"),
                lit(json!(2)),
                source("lambda: {'a': 1}"),
                source("lambda a, b=1: (a, b)"),
            ]
        );
        let args = parse_call_arguments("key=lambda item: item[0], reverse=True").unwrap();
        assert_eq!(
            args.keywords,
            vec![
                ("key".to_string(), source("lambda item: item[0]")),
                ("reverse".to_string(), lit(json!(true))),
            ]
        );
        assert_eq!(
            positional("{'fn': lambda: 1, 'n': 2}"),
            vec![source("{'fn': lambda: 1, 'n': 2}")]
        );
    }
}
