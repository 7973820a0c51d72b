use thiserror::Error;

// ============================================================================
// Selector AST
// ============================================================================

/// Comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// A chain of compounds joined by combinators, e.g. `ul.list > li a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// Started with `>`: the first compound must be a direct child of the
    /// query root.
    pub scoped: bool,
    pub parts: Vec<SelectorPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPart {
    pub compound: Compound,
    /// Relation to the part on the left; `None` for the first part.
    pub combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub universal: bool,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
    pub pseudos: Vec<Pseudo>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCondition {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pseudo {
    Not(SelectorList),
    NthChild(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} at offset {offset} in `{selector}`")]
    Unexpected {
        selector: String,
        offset: usize,
        found: char,
    },
    #[error("unexpected end of selector `{selector}`")]
    UnexpectedEnd { selector: String },
    #[error("unsupported selector feature `{feature}` in `{selector}`")]
    Unsupported { selector: String, feature: String },
}

// ============================================================================
// Parser
// ============================================================================

/// Parse the CSS subset used for grounding: type, `*`, `#id`, `.class`,
/// `[attr]`, `[attr="value"]`, `:not(...)`, `:nth-child(n)`, descendant and
/// child combinators, selector lists and a leading `>`.
pub fn parse_selector(selector: &str) -> Result<SelectorList, SelectorError> {
    if selector.trim().is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut parser = Parser {
        src: selector,
        chars: selector.chars().collect(),
        pos: 0,
    };
    let list = parser.selector_list()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(list),
        Some(found) => Err(parser.unexpected(found)),
    }
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(self.end()),
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.src.to_string(),
            offset: self.pos,
            found,
        }
    }

    fn end(&self) -> SelectorError {
        SelectorError::UnexpectedEnd {
            selector: self.src.to_string(),
        }
    }

    fn unsupported(&self, feature: impl Into<String>) -> SelectorError {
        SelectorError::Unsupported {
            selector: self.src.to_string(),
            feature: feature.into(),
        }
    }

    fn selector_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = vec![self.complex()?];
        loop {
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
            selectors.push(self.complex()?);
        }
        Ok(SelectorList(selectors))
    }

    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_ws();
        let scoped = self.eat('>');
        let mut parts: Vec<SelectorPart> = Vec::new();
        let mut pending: Option<Combinator> = if scoped { Some(Combinator::Child) } else { None };

        loop {
            self.skip_ws();
            match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    if parts.is_empty() || pending.is_some() {
                        return Err(self.unexpected('>'));
                    }
                    self.pos += 1;
                    pending = Some(Combinator::Child);
                }
                Some(c @ ('+' | '~')) => return Err(self.unsupported(format!("combinator {c}"))),
                Some(_) => {
                    let compound = self.compound()?;
                    let combinator = if parts.is_empty() {
                        pending = None;
                        None
                    } else {
                        Some(pending.take().unwrap_or(Combinator::Descendant))
                    };
                    parts.push(SelectorPart { compound, combinator });
                }
            }
        }

        if parts.is_empty() || pending.is_some() {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(self.end()),
            };
        }
        Ok(ComplexSelector { scoped, parts })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut first = true;

        while let Some(ch) = self.peek() {
            match ch {
                '*' if first => {
                    self.pos += 1;
                    compound.universal = true;
                }
                '#' => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.pos += 1;
                    let condition = self.attribute()?;
                    compound.attrs.push(condition);
                }
                ':' => {
                    self.pos += 1;
                    let pseudo = self.pseudo()?;
                    compound.pseudos.push(pseudo);
                }
                c if first && is_ident_start(c) => {
                    compound.tag = Some(self.ident()?.to_ascii_lowercase());
                }
                c if c.is_whitespace() || c == '>' || c == ',' || c == ')' => break,
                c => return Err(self.unexpected(c)),
            }
            first = false;
        }

        if compound.is_empty() {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(self.end()),
            };
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrCondition, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(AttrCondition::Exists(name)),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.pos += 1;
                        self.quoted(q)?
                    }
                    Some(_) => self.ident()?,
                    None => return Err(self.end()),
                };
                self.skip_ws();
                self.expect(']')?;
                Ok(AttrCondition::Equals(name, value))
            }
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                Err(self.unsupported(format!("attribute operator {op}=")))
            }
            Some(found) => {
                self.pos -= 1;
                Err(self.unexpected(found))
            }
            None => Err(self.end()),
        }
    }

    fn pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "not" => {
                self.expect('(')?;
                let inner = self.selector_list()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Pseudo::Not(inner))
            }
            "nth-child" => {
                self.expect('(')?;
                self.skip_ws();
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n = digits
                    .parse::<usize>()
                    .map_err(|_| self.unsupported(format!(":nth-child at offset {start}")))?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Pseudo::NthChild(n))
            }
            other => Err(self.unsupported(format!(":{other}"))),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.pos += 1;
                out.push(self.escape()?);
            } else if is_ident_char(ch) {
                self.pos += 1;
                out.push(ch);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(self.end()),
            };
        }
        Ok(out)
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
                None => return Err(self.end()),
            }
        }
    }

    /// Called after a backslash.
    fn escape(&mut self) -> Result<char, SelectorError> {
        let start = self.pos;
        while self.pos < start + 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos > start {
            let hex: String = self.chars[start..self.pos].iter().collect();
            if self.peek().is_some_and(|c| c.is_whitespace()) {
                self.pos += 1;
            }
            let decoded = u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|&cp| cp != 0)
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            return Ok(decoded);
        }
        self.bump().ok_or_else(|| self.end())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

// ============================================================================
// Escaping
// ============================================================================

/// Escape a string for use as a CSS identifier or inside a quoted value,
/// following the `CSS.escape()` algorithm.
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if code == 0 {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{code:x} "));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}
