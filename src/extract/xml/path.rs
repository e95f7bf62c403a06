//! Compiler for the supported location-path subset.
//!
//! ```text
//! path      := ('/' | '//')? step (('/' | '//') step)*
//! step      := ('@' (name | '*') | 'text()' | name | '*') ('[' predicate ']')*
//! predicate := number | '@' name ('=' literal)? | name ('=' literal)?
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    /// Any depth below the context node.
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Element(String),
    AnyElement,
    Text,
    Attribute(String),
    AnyAttribute,
}

impl NodeTest {
    pub(crate) fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::AnyAttribute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Predicate {
    /// 1-based position among the step's matches under one parent.
    Position(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
    ChildEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Predicate>,
}

pub(crate) fn compile(expr: &str) -> Result<Vec<Step>, String> {
    let mut cursor = Cursor::new(expr.trim());
    if cursor.at_end() {
        return Err("empty path".into());
    }

    let mut steps = Vec::new();
    let mut axis = cursor.axis().unwrap_or(Axis::Child);
    loop {
        if cursor.at_end() {
            return Err("path ends with a separator".into());
        }
        steps.push(cursor.step(axis)?);
        if cursor.at_end() {
            break;
        }
        axis = cursor
            .axis()
            .ok_or_else(|| cursor.unexpected("`/` or `[`"))?;
    }

    let last = steps.len() - 1;
    for (i, step) in steps.iter().enumerate() {
        if i != last && (step.test.is_attribute() || step.test == NodeTest::Text) {
            return Err("attribute and text() steps must come last".into());
        }
        if step.test.is_attribute() && !step.predicates.is_empty() {
            return Err("attribute steps take no predicates".into());
        }
    }
    Ok(steps)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{token}`")))
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn unexpected(&self, wanted: &str) -> String {
        match self.rest().chars().next() {
            Some(c) => format!("expected {wanted} at offset {}, found `{c}`", self.pos),
            None => format!("expected {wanted} at end of path"),
        }
    }

    fn axis(&mut self) -> Option<Axis> {
        if self.eat("//") {
            Some(Axis::Descendant)
        } else if self.eat("/") {
            Some(Axis::Child)
        } else {
            None
        }
    }

    fn step(&mut self, axis: Axis) -> Result<Step, String> {
        let test = if self.eat("@") {
            if self.eat("*") {
                NodeTest::AnyAttribute
            } else {
                NodeTest::Attribute(self.name()?)
            }
        } else if self.eat("*") {
            NodeTest::AnyElement
        } else {
            let name = self.name()?;
            if name == "text" && self.eat("()") {
                NodeTest::Text
            } else {
                NodeTest::Element(name)
            }
        };

        let mut predicates = Vec::new();
        while self.eat("[") {
            self.skip_whitespace();
            predicates.push(self.predicate()?);
            self.skip_whitespace();
            self.expect("]")?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate, String> {
        if self.rest().starts_with(|c: char| c.is_ascii_digit()) {
            let digits: String = self.rest().chars().take_while(char::is_ascii_digit).collect();
            self.pos += digits.len();
            let position: usize = digits
                .parse()
                .map_err(|_| format!("position `{digits}` is out of range"))?;
            if position == 0 {
                return Err("positions start at 1".into());
            }
            return Ok(Predicate::Position(position));
        }

        let attribute = self.eat("@");
        let name = self.name()?;
        self.skip_whitespace();
        let value = if self.eat("=") {
            self.skip_whitespace();
            Some(self.literal()?)
        } else {
            None
        };

        Ok(match (attribute, value) {
            (true, Some(value)) => Predicate::AttributeEquals(name, value),
            (true, None) => Predicate::HasAttribute(name),
            (false, Some(value)) => Predicate::ChildEquals(name, value),
            (false, None) => Predicate::HasChild(name),
        })
    }

    /// A possibly prefixed name, returned without its prefix.
    fn name(&mut self) -> Result<String, String> {
        let len: usize = self
            .rest()
            .chars()
            .take_while(|&c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
            .map(char::len_utf8)
            .sum();
        if len == 0 {
            return Err(self.unexpected("a name"));
        }
        let qualified = &self.rest()[..len];
        self.pos += len;
        let local = qualified.rsplit(':').next().unwrap_or(qualified);
        if local.is_empty() {
            return Err(format!("name `{qualified}` has no local part"));
        }
        Ok(local.to_owned())
    }

    fn literal(&mut self) -> Result<String, String> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.unexpected("a quoted string")),
        };
        self.pos += 1;
        let Some(end) = self.rest().find(quote) else {
            return Err("unterminated string literal".into());
        };
        let value = self.rest()[..end].to_owned();
        self.pos += end + 1;
        Ok(value)
    }
}
