use serde_json::Value;

use super::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// `@request.auth.<field>`
    Auth(String),
    /// `@request.data.<field>`
    Data(String),
    /// A field of the record under test.
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare { left: Operand, op: Op, right: Operand },
}

/// A parsed, non-empty rule expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    source: String,
    expr: Expr,
}

impl Rule {
    pub fn parse(source: &str) -> Result<Self, RuleError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if let Some((pos, token)) = parser.tokens.get(parser.pos) {
            return Err(RuleError::UnexpectedToken {
                pos: *pos,
                found: token.describe(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Record field names the rule reads.
    pub fn field_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_fields(&self.expr, &mut names);
        names
    }
}

fn collect_fields<'a>(expr: &'a Expr, names: &mut Vec<&'a str>) {
    match expr {
        Expr::And(l, r) | Expr::Or(l, r) => {
            collect_fields(l, names);
            collect_fields(r, names);
        }
        Expr::Compare { left, right, .. } => {
            for operand in [left, right] {
                if let Operand::Field(name) = operand {
                    if !names.contains(&name.as_str()) {
                        names.push(name);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Op(Op),
    Str(String),
    Num(f64),
    Ident(String),
    Macro(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::And => "'&&'".into(),
            Token::Or => "'||'".into(),
            Token::Op(op) => format!("operator {:?}", op),
            Token::Str(s) => format!("string {:?}", s),
            Token::Num(n) => format!("number {}", n),
            Token::Ident(s) => format!("identifier {}", s),
            Token::Macro(s) => format!("macro {}", s),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, RuleError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push((pos, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((pos, Token::RParen));
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push((pos, Token::And));
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push((pos, Token::Or));
                i += 2;
            }
            '=' => {
                tokens.push((pos, Token::Op(Op::Eq)));
                i += 1;
            }
            '~' => {
                tokens.push((pos, Token::Op(Op::Like)));
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push((pos, Token::Op(Op::Neq)));
                i += 2;
            }
            '!' if next == Some('~') => {
                tokens.push((pos, Token::Op(Op::NotLike)));
                i += 2;
            }
            '>' | '<' => {
                let or_equal = next == Some('=');
                let op = match (c, or_equal) {
                    ('>', false) => Op::Gt,
                    ('>', true) => Op::Gte,
                    ('<', false) => Op::Lt,
                    _ => Op::Lte,
                };
                tokens.push((pos, Token::Op(op)));
                i += if or_equal { 2 } else { 1 };
            }
            '"' | '\'' => {
                let quote = c;
                let mut value = String::new();
                let mut j = i + 1;
                let mut closed = false;
                while j < chars.len() {
                    let (_, ch) = chars[j];
                    if ch == '\\' && j + 1 < chars.len() {
                        value.push(chars[j + 1].1);
                        j += 2;
                        continue;
                    }
                    if ch == quote {
                        closed = true;
                        break;
                    }
                    value.push(ch);
                    j += 1;
                }
                if !closed {
                    return Err(RuleError::UnterminatedString(pos));
                }
                tokens.push((pos, Token::Str(value)));
                i = j + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_ascii_digit() || chars[j].1 == '.') {
                    j += 1;
                }
                let end = chars.get(j).map_or(input.len(), |(p, _)| *p);
                let text = &input[pos..end];
                let number = text
                    .parse::<f64>()
                    .map_err(|_| RuleError::UnexpectedChar { pos, ch: c })?;
                tokens.push((pos, Token::Num(number)));
                i = j;
            }
            '@' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j].1) {
                    j += 1;
                }
                let end = chars.get(j).map_or(input.len(), |(p, _)| *p);
                tokens.push((pos, Token::Macro(input[pos..end].to_string())));
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j].1) {
                    j += 1;
                }
                let end = chars.get(j).map_or(input.len(), |(p, _)| *p);
                tokens.push((pos, Token::Ident(input[pos..end].to_string())));
                i = j;
            }
            _ => return Err(RuleError::UnexpectedChar { pos, ch: c }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Result<(usize, Token), RuleError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(RuleError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_or(&mut self) -> Result<Expr, RuleError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, RuleError> {
        let mut left = self.parse_term()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, RuleError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            return match self.next()? {
                (_, Token::RParen) => Ok(inner),
                (pos, token) => Err(RuleError::UnexpectedToken {
                    pos,
                    found: token.describe(),
                }),
            };
        }

        let left = self.parse_operand()?;
        let op = match self.next()? {
            (_, Token::Op(op)) => op,
            (pos, token) => {
                return Err(RuleError::UnexpectedToken {
                    pos,
                    found: token.describe(),
                });
            }
        };
        let right = self.parse_operand()?;
        Ok(Expr::Compare { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand, RuleError> {
        match self.next()? {
            (_, Token::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            (_, Token::Num(n)) => Ok(Operand::Literal(
                serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            )),
            (_, Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "null" => Operand::Literal(Value::Null),
                _ if name.contains('.') => return Err(RuleError::UnsupportedPath(name)),
                _ => Operand::Field(name),
            }),
            (_, Token::Macro(path)) => {
                if let Some(field) = path.strip_prefix("@request.auth.") {
                    Ok(Operand::Auth(single_segment(&path, field)?))
                } else if let Some(field) = path.strip_prefix("@request.data.") {
                    Ok(Operand::Data(single_segment(&path, field)?))
                } else {
                    Err(RuleError::UnknownMacro(path))
                }
            }
            (pos, token) => Err(RuleError::UnexpectedToken {
                pos,
                found: token.describe(),
            }),
        }
    }
}

fn single_segment(path: &str, field: &str) -> Result<String, RuleError> {
    if field.is_empty() || field.contains('.') {
        return Err(RuleError::UnsupportedPath(path.to_string()));
    }
    Ok(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_owner_rule() {
        let rule = Rule::parse("@request.auth.id != \"\" && user = @request.auth.id").unwrap();
        assert_eq!(
            rule.expr(),
            &Expr::And(
                Box::new(Expr::Compare {
                    left: Operand::Auth("id".into()),
                    op: Op::Neq,
                    right: Operand::Literal(json!("")),
                }),
                Box::new(Expr::Compare {
                    left: Operand::Field("user".into()),
                    op: Op::Eq,
                    right: Operand::Auth("id".into()),
                }),
            )
        );
        assert_eq!(rule.field_refs(), vec!["user"]);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let rule = Rule::parse("a = 1 || b = 2 && c = 3").unwrap();
        assert!(matches!(rule.expr(), Expr::Or(_, right) if matches!(**right, Expr::And(_, _))));

        let grouped = Rule::parse("(a = 1 || b = 2) && c = 3").unwrap();
        assert!(matches!(grouped.expr(), Expr::And(_, _)));
    }

    #[test]
    fn parses_literals_and_operators() {
        let rule = Rule::parse("size >= -1.5 && name !~ 'tmp' && done = true && note = null").unwrap();
        assert_eq!(rule.field_refs(), vec!["size", "name", "done", "note"]);
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(matches!(Rule::parse("user ="), Err(RuleError::UnexpectedEnd)));
        assert!(matches!(Rule::parse("user = 'abc"), Err(RuleError::UnterminatedString(7))));
        assert!(matches!(Rule::parse("user # 1"), Err(RuleError::UnexpectedChar { pos: 5, ch: '#' })));
        assert!(matches!(Rule::parse("user = 1 2"), Err(RuleError::UnexpectedToken { .. })));
        assert!(matches!(Rule::parse("@collection.x = 1"), Err(RuleError::UnknownMacro(_))));
        assert!(matches!(Rule::parse("user.name = 'x'"), Err(RuleError::UnsupportedPath(_))));
        assert!(matches!(Rule::parse("(a = 1"), Err(RuleError::UnexpectedEnd)));
    }
}
