//! Reading propagator keys in their text form.
//!
//! The accessors here work on canonical text as stored by external
//! consumers; [`parse`] rebuilds the tree. Both accept children separated
//! by commas or simply concatenated.

use polyplan_core::{KeyError, MonomerType, SeedName};

use crate::key::{KeyChild, PropagatorKey};

/// One top-level child read from key text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextDependency<'a> {
    /// Child key text.
    pub key: &'a str,
    /// Segment count read from the child.
    pub n_segment: u32,
    /// Repeat count, 1 when absent.
    pub n_repeated: u32,
}

/// Number of leading `(` or `[` characters.
pub fn height(text: &str) -> u32 {
    text.bytes()
        .take_while(|&c| c == b'(' || c == b'[')
        .count() as u32
}

/// Text after the last closing bracket or brace; the whole text for a
/// plain leaf.
pub fn monomer_type(text: &str) -> &str {
    match text.rfind([')', ']', '}']) {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

/// The key text without its trailing monomer type.
pub fn strip_monomer_type(text: &str) -> &str {
    match text.rfind([')', ']', '}']) {
        Some(i) => &text[..=i],
        None => "",
    }
}

/// Seed name of a seeded leaf, e.g. `G0` for `{G0}A`.
pub fn seed(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('{')?;
    rest.find('}').map(|end| &rest[..end])
}

/// Top-level children of a branch or aggregate key. Leaves have none.
///
/// # Errors
///
/// [`KeyError`] if the bracket group is unbalanced or a child lacks its
/// segment count.
pub fn dependencies(text: &str) -> Result<Vec<TextDependency<'_>>, KeyError> {
    let bytes = text.as_bytes();
    let open = *bytes.first().ok_or(KeyError::Empty)?;
    let close = match open {
        b'(' => b')',
        b'[' => b']',
        _ => return Ok(Vec::new()),
    };

    let mut deps = Vec::new();
    let mut pos = 1;
    loop {
        if bytes.get(pos) == Some(&close) {
            return Err(KeyError::EmptyChildren {
                key: text.to_string(),
                position: pos,
            });
        }

        // Child key: everything up to the first digit outside nested
        // brackets.
        let start = pos;
        let mut depth = 0u32;
        while let Some(&c) = bytes.get(pos) {
            match c {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' if depth == 0 => break,
                b')' | b']' | b'}' => depth -= 1,
                b'0'..=b'9' if depth == 0 => break,
                _ => {}
            }
            pos += 1;
        }
        if pos == bytes.len() {
            return Err(KeyError::Unbalanced {
                key: text.to_string(),
                position: pos,
            });
        }
        let key = &text[start..pos];
        let (n_segment, next) = read_count(text, pos)?;
        pos = next;
        let mut n_repeated = 1;
        if bytes.get(pos) == Some(&b':') {
            let (n, next) = read_count(text, pos + 1)?;
            if n == 0 {
                return Err(KeyError::InvalidCount {
                    key: text.to_string(),
                    position: pos + 1,
                });
            }
            n_repeated = n;
            pos = next;
        }
        if key.is_empty() {
            return Err(KeyError::UnexpectedCharacter {
                key: text.to_string(),
                position: start,
                found: char::from(bytes[start]),
            });
        }
        deps.push(TextDependency {
            key,
            n_segment,
            n_repeated,
        });

        match bytes.get(pos) {
            Some(&b',') => pos += 1,
            Some(&c) if c == close => return Ok(deps),
            Some(_) => {}
            None => {
                return Err(KeyError::Unbalanced {
                    key: text.to_string(),
                    position: pos,
                })
            }
        }
    }
}

/// Parse key text into a [`PropagatorKey`].
///
/// The result is canonical: children are re-sorted, so
/// `parse("(B2,A2)C")` renders as `(A2,B2)C`.
///
/// # Errors
///
/// [`KeyError`] describing the first malformed position.
pub fn parse(text: &str) -> Result<PropagatorKey, KeyError> {
    if text.is_empty() {
        return Err(KeyError::Empty);
    }
    let mut parser = Parser { text, pos: 0 };
    let key = parser.key()?;
    match parser.peek() {
        None => Ok(key),
        Some(found) => Err(parser.unexpected(found)),
    }
}

fn read_count(text: &str, start: usize) -> Result<(u32, usize), KeyError> {
    let digits = text.as_bytes()[start..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 {
        return Err(KeyError::MissingSegmentCount {
            key: text.to_string(),
            position: start,
        });
    }
    let value = text[start..start + digits]
        .parse::<u32>()
        .map_err(|_| KeyError::InvalidCount {
            key: text.to_string(),
            position: start,
        })?;
    Ok((value, start + digits))
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn unexpected(&self, found: u8) -> KeyError {
        KeyError::UnexpectedCharacter {
            key: self.text.to_string(),
            position: self.pos,
            found: char::from(found),
        }
    }

    fn key(&mut self) -> Result<PropagatorKey, KeyError> {
        match self.peek() {
            Some(b'{') => {
                let rest = &self.text[self.pos + 1..];
                let end = rest.find('}').ok_or_else(|| KeyError::Unbalanced {
                    key: self.text.to_string(),
                    position: self.pos,
                })?;
                let seed = SeedName::new(&rest[..end])?;
                self.pos += end + 2;
                let monomer = self.monomer()?;
                Ok(PropagatorKey::leaf(monomer, Some(seed)))
            }
            Some(open @ (b'(' | b'[')) => {
                let open_at = self.pos;
                self.pos += 1;
                let close = if open == b'(' { b')' } else { b']' };
                let mut children = Vec::new();
                loop {
                    match self.peek() {
                        None => {
                            return Err(KeyError::Unbalanced {
                                key: self.text.to_string(),
                                position: open_at,
                            })
                        }
                        Some(c) if c == close => {
                            if children.is_empty() {
                                return Err(KeyError::EmptyChildren {
                                    key: self.text.to_string(),
                                    position: open_at,
                                });
                            }
                            self.pos += 1;
                            break;
                        }
                        Some(b',') if !children.is_empty() => self.pos += 1,
                        Some(_) => children.push(self.child()?),
                    }
                }
                let monomer = self.monomer()?;
                Ok(if open == b'(' {
                    PropagatorKey::branch(monomer, children)
                } else {
                    PropagatorKey::aggregate(monomer, children)
                })
            }
            Some(_) => Ok(PropagatorKey::leaf(self.monomer()?, None)),
            None => Err(KeyError::Unbalanced {
                key: self.text.to_string(),
                position: self.pos,
            }),
        }
    }

    fn child(&mut self) -> Result<KeyChild, KeyError> {
        let key = self.key()?;
        let (n_segment, next) = read_count(self.text, self.pos)?;
        self.pos = next;
        let mut n_repeated = 1;
        if self.peek() == Some(b':') {
            let (n, next) = read_count(self.text, self.pos + 1)?;
            if n == 0 {
                return Err(KeyError::InvalidCount {
                    key: self.text.to_string(),
                    position: self.pos + 1,
                });
            }
            n_repeated = n;
            self.pos = next;
        }
        Ok(KeyChild::repeated(key, n_segment, n_repeated))
    }

    fn monomer(&mut self) -> Result<MonomerType, KeyError> {
        let start = self.pos;
        let len = self.text.as_bytes()[start..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic() || **c == b'_')
            .count();
        self.pos += len;
        Ok(MonomerType::new(&self.text[start..start + len])?)
    }
}
