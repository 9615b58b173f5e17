// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubernetes label selector parsing
//!
//! Selectors are validated up front so a typo fails the lookup before any API
//! call, and rendered back in a canonical form (requirements sorted by key,
//! set values sorted and de-duplicated) so that equivalent selectors share
//! one cache slot.
//!
//! ## Supported syntax
//!
//! - Equality: `app=web`, `app==web`, `tier!=db`
//! - Sets: `env in (prod, staging)`, `env notin (dev)`
//! - Existence: `app`, `!canary`
//! - Numeric: `replicas>1`, `replicas<5`

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::{LookupError, LookupResult};

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// Label selector operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOperator {
    /// `=`
    Equals,
    /// `==`
    DoubleEquals,
    /// `!=`
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
}

/// One comma-separated clause of a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: SelectorOperator,
    /// Sorted, de-duplicated values (empty for existence operators)
    pub values: Vec<String>,
}

impl Requirement {
    /// Check a label set against this requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            SelectorOperator::Equals | SelectorOperator::DoubleEquals | SelectorOperator::In => {
                value.is_some_and(|v| self.values.contains(v))
            }
            SelectorOperator::NotEquals | SelectorOperator::NotIn => {
                value.is_none_or(|v| !self.values.contains(v))
            }
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
            SelectorOperator::GreaterThan | SelectorOperator::LessThan => {
                let (Some(actual), Some(bound)) = (
                    value.and_then(|v| v.parse::<i64>().ok()),
                    self.values.first().and_then(|v| v.parse::<i64>().ok()),
                ) else {
                    return false;
                };
                if self.operator == SelectorOperator::GreaterThan {
                    actual > bound
                } else {
                    actual < bound
                }
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.values.first().map(String::as_str).unwrap_or_default();
        match self.operator {
            SelectorOperator::Exists => write!(f, "{}", self.key),
            SelectorOperator::DoesNotExist => write!(f, "!{}", self.key),
            SelectorOperator::Equals => write!(f, "{}={}", self.key, first),
            SelectorOperator::DoubleEquals => write!(f, "{}=={}", self.key, first),
            SelectorOperator::NotEquals => write!(f, "{}!={}", self.key, first),
            SelectorOperator::GreaterThan => write!(f, "{}>{}", self.key, first),
            SelectorOperator::LessThan => write!(f, "{}<{}", self.key, first),
            SelectorOperator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            SelectorOperator::NotIn => {
                write!(f, "{} notin ({})", self.key, self.values.join(","))
            }
        }
    }
}

/// A parsed label selector; the empty selector matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Parse an optional selector; `None` and blank strings give the empty selector
pub fn parse_optional(selector: Option<&str>) -> LookupResult<LabelSelector> {
    match selector {
        Some(s) => parse_label_selector(s),
        None => Ok(LabelSelector::default()),
    }
}

/// Parse and validate a label selector string
pub fn parse_label_selector(selector: &str) -> LookupResult<LabelSelector> {
    let tokens = tokenize(selector);
    let mut parser = Parser {
        input: selector,
        tokens,
        pos: 0,
    };
    let mut requirements = parser.parse()?;
    requirements.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(LabelSelector { requirements })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Bang,
    Equals,
    DoubleEquals,
    NotEquals,
    Greater,
    Less,
    OpenParen,
    CloseParen,
    Comma,
}

fn is_special(c: char) -> bool {
    matches!(c, '!' | '=' | '(' | ')' | ',' | '<' | '>') || c.is_whitespace()
}

fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '!' if next == Some('=') => {
                tokens.push(Token::NotEquals);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::DoubleEquals);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Equals);
                i += 1;
            }
            '>' => {
                tokens.push(Token::Greater);
                i += 1;
            }
            '<' => {
                tokens.push(Token::Less);
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            _ => {
                let start = i;
                while i < chars.len() && !is_special(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
        }
    }

    tokens
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> LookupError {
        LookupError::InvalidSelector {
            selector: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse(&mut self) -> LookupResult<Vec<Requirement>> {
        let mut requirements = Vec::new();
        if self.tokens.is_empty() {
            return Ok(requirements);
        }

        loop {
            requirements.push(self.parse_requirement()?);
            match self.next() {
                None => return Ok(requirements),
                Some(Token::Comma) => {
                    if self.peek().is_none() {
                        return Err(self.error("trailing comma"));
                    }
                }
                Some(other) => {
                    return Err(self.error(format!("expected ',' but found {:?}", other)));
                }
            }
        }
    }

    fn parse_requirement(&mut self) -> LookupResult<Requirement> {
        if self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            let key = self.parse_key()?;
            return Ok(Requirement {
                key,
                operator: SelectorOperator::DoesNotExist,
                values: vec![],
            });
        }

        let key = self.parse_key()?;
        let operator = match self.peek() {
            None | Some(Token::Comma) => {
                return Ok(Requirement {
                    key,
                    operator: SelectorOperator::Exists,
                    values: vec![],
                });
            }
            Some(Token::Equals) => SelectorOperator::Equals,
            Some(Token::DoubleEquals) => SelectorOperator::DoubleEquals,
            Some(Token::NotEquals) => SelectorOperator::NotEquals,
            Some(Token::Greater) => SelectorOperator::GreaterThan,
            Some(Token::Less) => SelectorOperator::LessThan,
            Some(Token::Ident(word)) if word == "in" => SelectorOperator::In,
            Some(Token::Ident(word)) if word == "notin" => SelectorOperator::NotIn,
            Some(other) => {
                return Err(self.error(format!("unexpected {:?} after key '{}'", other, key)));
            }
        };
        self.pos += 1;

        let values = match operator {
            SelectorOperator::In | SelectorOperator::NotIn => self.parse_value_set()?,
            SelectorOperator::GreaterThan | SelectorOperator::LessThan => {
                let value = self.parse_value()?;
                if value.parse::<i64>().is_err() {
                    return Err(self.error(format!(
                        "'{}' must be an integer for operator on key '{}'",
                        value, key
                    )));
                }
                vec![value]
            }
            _ => vec![self.parse_value()?],
        };

        Ok(Requirement {
            key,
            operator,
            values,
        })
    }

    fn parse_key(&mut self) -> LookupResult<String> {
        match self.next() {
            Some(Token::Ident(key)) => {
                validate_key(&key).map_err(|reason| self.error(reason))?;
                Ok(key)
            }
            Some(other) => Err(self.error(format!("expected a label key, found {:?}", other))),
            None => Err(self.error("expected a label key")),
        }
    }

    /// A single value; an empty value (`app=`) is allowed
    fn parse_value(&mut self) -> LookupResult<String> {
        match self.peek() {
            Some(Token::Ident(value)) => {
                let value = value.clone();
                self.pos += 1;
                validate_value(&value).map_err(|reason| self.error(reason))?;
                Ok(value)
            }
            None | Some(Token::Comma) | Some(Token::CloseParen) => Ok(String::new()),
            Some(other) => Err(self.error(format!("expected a value, found {:?}", other))),
        }
    }

    fn parse_value_set(&mut self) -> LookupResult<Vec<String>> {
        if self.next() != Some(Token::OpenParen) {
            return Err(self.error("expected '(' after set operator"));
        }

        let mut values = BTreeSet::new();
        loop {
            values.insert(self.parse_value()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::CloseParen) => break,
                Some(other) => {
                    return Err(self.error(format!("expected ',' or ')', found {:?}", other)));
                }
                None => return Err(self.error("missing closing ')'")),
            }
        }

        Ok(values.into_iter().collect())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_dns_label(part: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    part.chars().next().is_some_and(alnum)
        && part.chars().last().is_some_and(alnum)
        && part.chars().all(|c| alnum(c) || c == '-')
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.len() > MAX_NAME_LEN {
        return Err(format!("'{}' must be no more than 63 characters", name));
    }
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok || !name.chars().all(is_name_char) {
        return Err(format!(
            "'{}' must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            name
        ));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), String> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            let prefix_ok = !prefix.is_empty()
                && prefix.len() <= MAX_PREFIX_LEN
                && prefix.split('.').all(is_dns_label);
            if !prefix_ok {
                return Err(format!("prefix part of '{}' must be a DNS subdomain", key));
            }
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err(format!("name part of '{}' must be non-empty", key));
    }
    validate_name(name)
}

fn validate_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    validate_name(value)
}
