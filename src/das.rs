//! Parse DAS text and attach its attributes to an existing variable tree.
//!
//! ```text
//! das       := "attributes" "{" (attribute | container)* "}"
//! container := path "{" (attribute | container)* "}"
//! attribute := type name value ("," value)* ";"
//! ```
//!
//! A container whose name is a dotted path, or the name of a child of a
//! Dataset/Structure/Sequence target, moves the target for the duration of its
//! body. Dotted paths may also step into a Grid's array or maps. Any other
//! container becomes a nested attribute group on the current target.
//!
//! The current target is tracked as a path of component names from the dataset
//! root and passed down through the recursive calls.

use crate::ast::*;
use crate::cursor::{pattern, Cursor};
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Parse DAS source and populate `dataset`'s attributes in place.
/// No structural node is added, renamed or removed.
pub fn parse_das(source: &str, dataset: &mut DapVar) -> Result<()> {
    let mut parser = DasParser {
        cursor: Cursor::new(source),
        dataset,
    };
    parser.attributes()?;
    debug!(dataset = %parser.dataset.name, "parsed DAS");
    Ok(())
}

struct DasParser<'a, 'd> {
    cursor: Cursor<'a>,
    dataset: &'d mut DapVar,
}

impl<'a, 'd> DasParser<'a, 'd> {
    fn attributes(&mut self) -> Result<()> {
        self.cursor.consume(pattern::ATTRIBUTES)?;
        self.cursor.consume(pattern::OPEN_BRACE)?;
        let root: Vec<String> = Vec::new();
        while self.cursor.peek(pattern::CLOSE_BRACE).is_empty() {
            self.attr_container(&root)?;
        }
        self.cursor.consume(pattern::CLOSE_BRACE)?;
        Ok(())
    }

    fn at_attribute(&mut self) -> bool {
        DataType::from_name(self.cursor.peek(pattern::WORD)).is_some()
    }

    fn attr_container(&mut self, target: &[String]) -> Result<()> {
        if self.at_attribute() {
            let (name, value) = self.attribute(target)?;
            self.target_mut(target)?.attributes.insert(name, value);
            self.promote_grid_maps(target);
            Ok(())
        } else {
            self.container(target)
        }
    }

    fn container(&mut self, target: &[String]) -> Result<()> {
        let name = self.cursor.consume(pattern::CONTAINER_NAME)?.to_string();
        self.cursor.consume(pattern::OPEN_BRACE)?;

        let nested = if name.contains('.') {
            let mut path = target.to_vec();
            path.extend(name.split('.').map(str::to_string));
            if self.dataset.descend(&path).is_none() {
                return Err(Error::Lookup(format!(
                    "no variable {:?} below {:?}",
                    name,
                    self.target(target)?.id
                )));
            }
            Some(path)
        } else if self.target(target)?.child(&name).is_some() {
            let mut path = target.to_vec();
            path.push(name.clone());
            Some(path)
        } else {
            None
        };

        match nested {
            Some(path) => {
                while self.cursor.peek(pattern::CLOSE_BRACE).is_empty() {
                    self.attr_container(&path)?;
                }
            }
            None => {
                let group = self.metadata(target)?;
                self.target_mut(target)?
                    .attributes
                    .insert(name, AttrValue::Map(group));
            }
        }
        self.cursor.consume(pattern::CLOSE_BRACE)?;
        Ok(())
    }

    /// Body of an attribute group that is not linked to a variable.
    fn metadata(&mut self, target: &[String]) -> Result<Attributes> {
        let mut group = Attributes::new();
        while self.cursor.peek(pattern::CLOSE_BRACE).is_empty() {
            if self.at_attribute() {
                let (name, value) = self.attribute(target)?;
                group.insert(name, value);
            } else {
                let name = self.cursor.consume(pattern::CONTAINER_NAME)?.to_string();
                self.cursor.consume(pattern::OPEN_BRACE)?;
                let inner = self.metadata(target)?;
                self.cursor.consume(pattern::CLOSE_BRACE)?;
                group.insert(name, AttrValue::Map(inner));
            }
        }
        Ok(group)
    }

    fn attribute(&mut self, target: &[String]) -> Result<(String, AttrValue)> {
        let at = self.cursor.position();
        let type_name = self.cursor.consume(pattern::WORD)?;
        let data_type = DataType::from_name(type_name).ok_or_else(|| Error::InvalidLiteral {
            position: at,
            literal: type_name.to_string(),
            expected: "type",
        })?;
        let name = self.cursor.consume(pattern::ATTRIBUTE_NAME)?.to_string();

        let mut values = Vec::new();
        while self.cursor.peek(pattern::SEMICOLON).is_empty() {
            let at = self.cursor.position();
            let token = self.cursor.consume(pattern::LITERAL)?.trim_end();
            let value = match data_type {
                DataType::String | DataType::Url => classify_text(token),
                DataType::Alias => self.resolve_alias(target, token)?,
                _ => classify_number(token).ok_or_else(|| Error::InvalidLiteral {
                    position: at,
                    literal: token.to_string(),
                    expected: "number",
                })?,
            };
            values.push(value);
            if !self.cursor.peek(pattern::COMMA).is_empty() {
                self.cursor.consume(pattern::COMMA)?;
            }
        }
        self.cursor.consume(pattern::SEMICOLON)?;

        let value = match values.len() {
            1 => values.remove(0),
            _ => AttrValue::List(values),
        };
        Ok((name, value))
    }

    /// Resolve an alias path against the current target, or against the root
    /// when it starts with `\.`.
    fn resolve_alias(&self, target: &[String], token: &str) -> Result<AttrValue> {
        let raw = unquote(token).unwrap_or_else(|| token.to_string());
        let (start, path) = match raw.strip_prefix("\\.") {
            Some(rest) => (&*self.dataset, rest),
            None => (self.target(target)?, raw.as_str()),
        };

        let mut found = Found::Var(start);
        for segment in path.split('.') {
            found = match found {
                Found::Var(var) => var
                    .component(segment)
                    .map(Found::Var)
                    .or_else(|| var.attributes.get(segment).map(Found::Attr)),
                Found::Attr(AttrValue::Map(group)) => group.get(segment).map(Found::Attr),
                Found::Attr(_) => None,
            }
            .ok_or_else(|| Error::Lookup(format!("alias {:?}: nothing named {:?}", raw, segment)))?;
        }
        trace!(alias = %raw, "resolved alias");
        Ok(match found {
            Found::Var(var) => AttrValue::Variable(var.id.clone()),
            Found::Attr(value) => value.clone(),
        })
    }

    /// Copy Grid map attributes onto the same-named top-level variables.
    fn promote_grid_maps(&mut self, target: &[String]) {
        let Some(node) = self.dataset.descend(target) else {
            return;
        };
        let promoted: Vec<(String, Attributes)> = match &node.kind {
            VarKind::Grid(grid) => grid
                .maps
                .iter()
                .map(|m| (m.name.clone(), m.attributes.clone()))
                .collect(),
            VarKind::Base(_) if self.is_grid_map(target) => {
                vec![(node.name.clone(), node.attributes.clone())]
            }
            _ => return,
        };
        let Some(top) = self.dataset.children_mut() else {
            return;
        };
        for (name, attributes) in promoted {
            if let Some(var) = top.get_mut(&name) {
                for (key, value) in attributes {
                    var.attributes.insert(key, value);
                }
            }
        }
    }

    fn is_grid_map(&self, target: &[String]) -> bool {
        let Some((name, parent)) = target.split_last() else {
            return false;
        };
        self.dataset
            .descend(parent)
            .and_then(DapVar::as_grid)
            .map_or(false, |grid| grid.maps.get(name).is_some())
    }

    fn target(&self, path: &[String]) -> Result<&DapVar> {
        self.dataset
            .descend(path)
            .ok_or_else(|| Error::Lookup(format!("no variable at {:?}", path.join("."))))
    }

    fn target_mut(&mut self, path: &[String]) -> Result<&mut DapVar> {
        self.dataset
            .descend_mut(path)
            .ok_or_else(|| Error::Lookup(format!("no variable at {:?}", path.join("."))))
    }
}

enum Found<'t> {
    Var(&'t DapVar),
    Attr(&'t AttrValue),
}

/// Contents of a double-quoted token with `\` escapes removed.
fn unquote(token: &str) -> Option<String> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// String/URL values: quoted text stays text; a bare token is a number when it
/// parses as one, text otherwise.
fn classify_text(token: &str) -> AttrValue {
    if let Some(text) = unquote(token) {
        return AttrValue::Text(text);
    }
    if token.contains('"') {
        return AttrValue::Text(token.to_string());
    }
    parse_number(token).unwrap_or_else(|| AttrValue::Text(token.to_string()))
}

/// Numeric-typed values: quoted text stays text; `nan` is NaN; anything else must be a number.
fn classify_number(token: &str) -> Option<AttrValue> {
    if let Some(text) = unquote(token) {
        return Some(AttrValue::Text(text));
    }
    if token.contains('"') {
        return Some(AttrValue::Text(token.to_string()));
    }
    if token.eq_ignore_ascii_case("nan") {
        return Some(AttrValue::Float(f64::NAN));
    }
    parse_number(token)
}

/// Decimal integer, `0x` hex integer, or decimal float with optional exponent.
/// Rejects `inf`/`infinity` and signs inside hex digits.
fn parse_number(token: &str) -> Option<AttrValue> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let v = i64::from_str_radix(hex, 16).ok()?;
        return Some(AttrValue::Int(if negative { -v } else { v }));
    }
    let numeric = |b: u8| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-');
    if !token.bytes().all(numeric) {
        return None;
    }
    if let Ok(i) = token.parse::<i64>() {
        return Some(AttrValue::Int(i));
    }
    token.parse::<f64>().ok().map(AttrValue::Float)
}
