//! Parse DDS text into a variable tree.
//!
//! ```text
//! dataset     := "dataset" "{" declaration* "}" name ";"
//! declaration := grid | structure | sequence | base
//! grid        := "grid" "{" "array" ":" base "maps" ":" base* "}" name ";"
//! structure   := "structure" "{" declaration* "}" name ";"
//! sequence    := "sequence" "{" declaration* "}" name ";"
//! base        := type name ("[" (dimname "=")? extent "]")* ";"
//! ```

use crate::ast::*;
use crate::cursor::{pattern, Cursor};
use crate::error::{Error, Result};
use tracing::debug;

/// Parse DDS source into a tree with ids assigned.
pub fn parse_dds(source: &str) -> Result<DapVar> {
    let mut parser = DdsParser {
        cursor: Cursor::new(source),
    };
    let dataset = parser.dataset()?;
    let mut count = 0usize;
    dataset.walk(&mut |_| count += 1);
    debug!(dataset = %dataset.name, nodes = count, "parsed DDS");
    Ok(dataset)
}

struct DdsParser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> DdsParser<'a> {
    fn dataset(&mut self) -> Result<DapVar> {
        self.cursor.consume(pattern::DATASET)?;
        self.cursor.consume(pattern::OPEN_BRACE)?;
        let children = self.declarations()?;
        self.cursor.consume(pattern::CLOSE_BRACE)?;
        let name = self.cursor.consume(pattern::DATASET_NAME)?.trim_end().to_string();
        self.cursor.consume(pattern::SEMICOLON)?;

        let mut dataset = DapVar::new(name.clone(), VarKind::Dataset { children });
        dataset.id = name;
        dataset.assign_ids();
        Ok(dataset)
    }

    /// Declarations up to (not including) the closing brace.
    fn declarations(&mut self) -> Result<Children> {
        let mut children = Children::new();
        while self.cursor.peek(pattern::CLOSE_BRACE).is_empty() {
            children.insert(self.declaration()?);
        }
        Ok(children)
    }

    fn declaration(&mut self) -> Result<DapVar> {
        match self.cursor.peek(pattern::WORD).to_ascii_lowercase().as_str() {
            "grid" => self.grid(),
            "structure" => self.container(pattern::STRUCTURE, |children| VarKind::Structure { children }),
            "sequence" => self.container(pattern::SEQUENCE, |children| VarKind::Sequence { children }),
            _ => self.base_declaration(),
        }
    }

    fn container(&mut self, keyword: &'static str, kind: fn(Children) -> VarKind) -> Result<DapVar> {
        self.cursor.consume(keyword)?;
        self.cursor.consume(pattern::OPEN_BRACE)?;
        let children = self.declarations()?;
        self.cursor.consume(pattern::CLOSE_BRACE)?;
        let name = self.cursor.consume(pattern::WORD)?;
        self.cursor.consume(pattern::SEMICOLON)?;
        Ok(DapVar::new(name, kind(children)))
    }

    fn grid(&mut self) -> Result<DapVar> {
        self.cursor.consume(pattern::GRID)?;
        self.cursor.consume(pattern::OPEN_BRACE)?;
        self.cursor.consume(pattern::ARRAY)?;
        self.cursor.consume(pattern::COLON)?;
        let array = self.base_declaration()?;
        self.cursor.consume(pattern::MAPS)?;
        self.cursor.consume(pattern::COLON)?;
        let mut maps = Children::new();
        while self.cursor.peek(pattern::CLOSE_BRACE).is_empty() {
            maps.insert(self.base_declaration()?);
        }
        self.cursor.consume(pattern::CLOSE_BRACE)?;
        let name = self.cursor.consume(pattern::WORD)?;
        self.cursor.consume(pattern::SEMICOLON)?;
        Ok(DapVar::new(
            name,
            VarKind::Grid(Grid {
                array: Box::new(array),
                maps,
            }),
        ))
    }

    fn base_declaration(&mut self) -> Result<DapVar> {
        let at = self.cursor.position();
        let type_name = self.cursor.consume(pattern::WORD)?;
        let data_type = DataType::from_name(type_name).ok_or_else(|| Error::InvalidLiteral {
            position: at,
            literal: type_name.to_string(),
            expected: "type",
        })?;
        let name = self.cursor.consume(pattern::WORD)?;

        let mut dimensions = Vec::new();
        let mut shape = Vec::new();
        while self.cursor.peek(pattern::SEMICOLON).is_empty() {
            self.cursor.consume(pattern::OPEN_BRACKET)?;
            let mut at = self.cursor.position();
            let mut token = self.cursor.consume(pattern::WORD)?;
            if self.cursor.peek(pattern::EQUALS).is_empty() {
                dimensions.push(None);
            } else {
                dimensions.push(Some(token.to_string()));
                self.cursor.consume(pattern::EQUALS)?;
                at = self.cursor.position();
                token = self.cursor.consume(pattern::DIGITS)?;
            }
            let extent = token.parse::<usize>().map_err(|_| Error::InvalidLiteral {
                position: at,
                literal: token.to_string(),
                expected: "dimension extent",
            })?;
            shape.push(extent);
            self.cursor.consume(pattern::CLOSE_BRACKET)?;
        }
        self.cursor.consume(pattern::SEMICOLON)?;

        Ok(DapVar::new(
            name,
            VarKind::Base(BaseVar {
                data_type,
                dimensions,
                shape,
            }),
        ))
    }
}
