//! Target shapes
//!
//! A [`Shape`] is a raw type plus ordered type arguments, e.g.
//! `Pair<Integer, List<String>>`. Shapes are what callers ask fixtures for;
//! they keep the generic arguments that [`TypeRef`] erases.

use crate::builtin::lookup_builtin_type;
use crate::types::{ClassRegistry, TypeRef};
use std::fmt;

/// Shape parse errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// Name is neither built in nor a registered class
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Malformed shape text
    #[error("Invalid type \"{text}\" at offset {offset}: {message}")]
    Syntax {
        /// Whole input
        text: String,
        /// Byte offset of the problem
        offset: usize,
        /// What was expected
        message: String,
    },
}

/// A possibly generic target type
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Raw type
    pub raw: TypeRef,
    /// Type arguments, in order
    pub args: Vec<Shape>,
}

impl Shape {
    /// Non-generic shape
    pub fn new(raw: TypeRef) -> Self {
        Self {
            raw,
            args: Vec::new(),
        }
    }

    /// Shape with type arguments
    pub fn generic(raw: TypeRef, args: Vec<Shape>) -> Self {
        Self { raw, args }
    }

    /// Check if the shape has type arguments
    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Parse shape text such as `TestCase<List<Integer>, String>`
    pub fn parse(registry: &ClassRegistry, text: &str) -> Result<Shape, ShapeError> {
        let mut parser = Parser {
            registry,
            text,
            pos: 0,
        };
        let shape = parser.shape()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(shape)
    }

    /// The type this shape denotes, with container elements filled in from
    /// the arguments (class arguments are erased)
    pub fn to_type(&self) -> TypeRef {
        match (&self.raw, self.args.last()) {
            (TypeRef::List(_), Some(arg)) => TypeRef::list(arg.to_type()),
            (TypeRef::Array(_), Some(arg)) => TypeRef::array(arg.to_type()),
            (TypeRef::Map(_), Some(arg)) => TypeRef::map(arg.to_type()),
            (raw, _) => raw.clone(),
        }
    }

    /// Shape of a container's elements (map values for maps)
    pub fn element_shape(&self) -> Option<Shape> {
        let element = self.raw.element()?;
        Some(match self.args.last() {
            Some(arg) => arg.clone(),
            None => Shape::new(element.clone()),
        })
    }

    /// Display adapter resolving class names through `registry`
    pub fn display<'a>(&'a self, registry: &'a ClassRegistry) -> ShapeDisplay<'a> {
        ShapeDisplay {
            shape: self,
            registry,
        }
    }
}

/// Displays a [`Shape`] as `Raw<A, B>`
pub struct ShapeDisplay<'a> {
    shape: &'a Shape,
    registry: &'a ClassRegistry,
}

impl fmt::Display for ShapeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.shape.is_generic() {
            return write!(f, "{}", self.shape.raw.display(self.registry));
        }

        // Generic containers print their bare name before the arguments
        match &self.shape.raw {
            TypeRef::List(_) => f.write_str("List")?,
            TypeRef::Map(_) => f.write_str("Map")?,
            raw => write!(f, "{}", raw.display(self.registry))?,
        }
        f.write_str("<")?;
        for (i, arg) in self.shape.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg.display(self.registry))?;
        }
        f.write_str(">")
    }
}

struct Parser<'a> {
    registry: &'a ClassRegistry,
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn shape(&mut self) -> Result<Shape, ShapeError> {
        self.skip_ws();
        let name = self.name()?;
        let raw = lookup_builtin_type(name)
            .or_else(|| self.registry.by_name(name).map(TypeRef::Class))
            .ok_or_else(|| ShapeError::UnknownType(name.to_string()))?;

        let mut shape = Shape::new(raw);
        self.skip_ws();
        if self.eat('<') {
            loop {
                shape.args.push(self.shape()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }

        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            shape = Shape::new(TypeRef::array(shape.to_type()));
        }

        Ok(shape)
    }

    fn name(&mut self) -> Result<&'a str, ShapeError> {
        let text = self.text;
        let start = self.pos;
        let rest = &text[start..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '.' || *c == '$'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        let name = &text[start..self.pos];
        // Qualified names resolve by their simple name
        Ok(name.rsplit('.').next().unwrap_or(name))
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.text[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, message: &str) -> ShapeError {
        ShapeError::Syntax {
            text: self.text.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }
}
