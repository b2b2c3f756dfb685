//! Dependency expressions from `depends="..."` attributes.
//!
//! The registry writes dependencies as boolean expressions over feature and
//! extension names: `,` is OR, `+` is AND, and parentheses group. `+` binds
//! tighter than `,`, although the registry parenthesizes every mixed use.
//!
//! ```text
//! VK_KHR_get_physical_device_properties2,VK_VERSION_1_1
//! (VK_KHR_maintenance1+VK_KHR_maintenance2),VK_VERSION_1_1
//! ```
use std::fmt;

/// A parsed dependency expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Depends {
    /// A single feature or extension name.
    Name(String),
    /// Every operand must hold (`a+b`).
    All(Vec<Depends>),
    /// At least one operand must hold (`a,b`).
    Any(Vec<Depends>),
}

/// Error for a syntactically invalid dependency expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid dependency expression '{expression}': {reason}")]
pub struct DependsError {
    /// The full expression that failed to parse.
    pub expression: String,
    /// What went wrong.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        match c {
            '+' => tokens.push(Token::And),
            ',' => tokens.push(Token::Or),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            c if c.is_whitespace() => {}
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let end = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len());
                let (name, tail) = rest.split_at(end);
                tokens.push(Token::Name(name));
                rest = tail;
                continue;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
        rest = rest.get(c.len_utf8()..).unwrap_or_default();
    }
    Ok(tokens)
}

/// Recursive-descent parser over the token list.
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (',' term)*
    fn expr(&mut self) -> Result<Depends, String> {
        let mut operands = vec![self.term()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            operands.push(self.term()?);
        }
        Ok(collapse(operands, Depends::Any))
    }

    // term := factor ('+' factor)*
    fn term(&mut self) -> Result<Depends, String> {
        let mut operands = vec![self.factor()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            operands.push(self.factor()?);
        }
        Ok(collapse(operands, Depends::All))
    }

    // factor := NAME | '(' expr ')'
    fn factor(&mut self) -> Result<Depends, String> {
        match self.next() {
            Some(Token::Name(name)) => Ok(Depends::Name(name.to_string())),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(Token::Close) => Err("unexpected ')'".to_string()),
            Some(Token::And | Token::Or) => Err("operator without left operand".to_string()),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn collapse(mut operands: Vec<Depends>, wrap: fn(Vec<Depends>) -> Depends) -> Depends {
    if operands.len() == 1
        && let Some(only) = operands.pop()
    {
        return only;
    }
    wrap(operands)
}

impl Depends {
    /// Parse a `depends` attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`DependsError`] for empty input, stray characters, unbalanced
    /// parentheses or dangling operators.
    pub fn parse(expression: &str) -> Result<Self, DependsError> {
        let error = |reason: String| DependsError {
            expression: expression.to_string(),
            reason,
        };
        let tokens = tokenize(expression).map_err(error)?;
        let mut parser = Parser { tokens, pos: 0 };
        let parsed = parser.expr().map_err(error)?;
        if parser.pos < parser.tokens.len() {
            return Err(error("trailing input".to_string()));
        }
        Ok(parsed)
    }

    /// Build an expression requiring every name in `names` (the legacy
    /// `requires="a,b"` attribute, where the comma means AND).
    #[must_use]
    pub fn all_of<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let operands: Vec<Self> = names
            .into_iter()
            .map(|n| Self::Name(n.into()))
            .collect();
        if operands.is_empty() {
            None
        } else {
            Some(collapse(operands, Self::All))
        }
    }

    /// Evaluate against a predicate telling whether a name is enabled.
    pub fn is_satisfied(&self, enabled: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Name(name) => enabled(name),
            Self::All(operands) => operands.iter().all(|d| d.is_satisfied(enabled)),
            Self::Any(operands) => operands.iter().any(|d| d.is_satisfied(enabled)),
        }
    }

    /// Preprocessor guard form: every name becomes `defined(NAME)`, `+` becomes
    /// `&&` and `,` becomes `||`, with the same grouping as [`Display`](fmt::Display).
    #[must_use]
    pub fn to_guard(&self) -> String {
        struct Guard<'a>(&'a Depends);

        impl fmt::Display for Guard<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.write_expr(f, |f, name| write!(f, "defined({name})"), " && ", " || ")
            }
        }

        Guard(self).to_string()
    }

    fn write_expr(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: fn(&mut fmt::Formatter<'_>, &str) -> fmt::Result,
        and: &str,
        or: &str,
    ) -> fmt::Result {
        let (operands, sep) = match self {
            Self::Name(n) => return name(f, n),
            Self::All(operands) => (operands, and),
            Self::Any(operands) => (operands, or),
        };
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            if let Self::Name(n) = operand {
                name(f, n)?;
            } else {
                f.write_str("(")?;
                operand.write_expr(f, name, and, or)?;
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Depends {
    /// Registry syntax, parenthesizing every nested operand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_expr(f, |f, name| f.write_str(name), "+", ",")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const NESTED: &str = "(((VK_KHR_get_physical_device_properties2,VK_VERSION_1_1)+VK_KHR_synchronization2),VK_VERSION_1_3)+VK_KHR_pipeline_library+VK_KHR_spirv_1_4";

    fn name(s: &str) -> Depends {
        Depends::Name(s.to_string())
    }

    #[test]
    fn single_name() {
        assert_eq!(Depends::parse("VK_KHR_surface").unwrap(), name("VK_KHR_surface"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = Depends::parse("A+B,C").unwrap();
        assert_eq!(
            parsed,
            Depends::Any(vec![Depends::All(vec![name("A"), name("B")]), name("C")])
        );
    }

    #[test]
    fn parentheses_group() {
        let parsed = Depends::parse("A+(B,C)").unwrap();
        assert_eq!(
            parsed,
            Depends::All(vec![name("A"), Depends::Any(vec![name("B"), name("C")])])
        );
    }

    #[test]
    fn nested_expression_satisfaction() {
        let parsed = Depends::parse(NESTED).unwrap();
        assert!(!parsed.is_satisfied(&|_| false));
        let enabled = [
            "VK_VERSION_1_0",
            "VK_VERSION_1_1",
            "VK_KHR_synchronization2",
            "VK_KHR_pipeline_library",
            "VK_KHR_spirv_1_4",
        ];
        assert!(parsed.is_satisfied(&|n| enabled.contains(&n)));
    }

    #[test]
    fn display_is_registry_syntax() {
        let parsed = Depends::parse("(A,B)+C").unwrap();
        assert_eq!(parsed.to_string(), "(A,B)+C");
    }

    #[test]
    fn display_keeps_nested_grouping() {
        let parsed = Depends::parse(NESTED).unwrap();
        assert_eq!(parsed.to_string(), NESTED);
    }

    #[test]
    fn guard_uses_preprocessor_operators() {
        let parsed = Depends::parse("VK_KHR_get_physical_device_properties2,VK_VERSION_1_1").unwrap();
        assert_eq!(
            parsed.to_guard(),
            "defined(VK_KHR_get_physical_device_properties2) || defined(VK_VERSION_1_1)"
        );
        assert_eq!(name("VK_KHR_surface").to_guard(), "defined(VK_KHR_surface)");
    }

    #[test]
    fn guard_keeps_nested_grouping() {
        let parsed = Depends::parse(NESTED).unwrap();
        assert_eq!(
            parsed.to_guard(),
            "(((defined(VK_KHR_get_physical_device_properties2) || defined(VK_VERSION_1_1)) \
             && defined(VK_KHR_synchronization2)) || defined(VK_VERSION_1_3)) \
             && defined(VK_KHR_pipeline_library) && defined(VK_KHR_spirv_1_4)"
        );
    }

    #[test]
    fn all_of_builds_conjunction() {
        assert_eq!(Depends::all_of(Vec::<String>::new()), None);
        assert_eq!(Depends::all_of(["A"]), Some(name("A")));
        assert_eq!(
            Depends::all_of(["A", "B"]),
            Some(Depends::All(vec![name("A"), name("B")]))
        );
    }

    #[test]
    fn rejects_malformed_expressions() {
        for bad in ["", "A+", ",A", "(A,B", "A)", "A B", "A-B", "()"] {
            assert!(Depends::parse(bad).is_err(), "expected '{bad}' to fail");
        }
    }
}
