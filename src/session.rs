use std::collections::HashMap;

const TOKEN_OPEN: &str = "${";
const TOKEN_CLOSE: char = '}';

/// Variables owned by a single virtual user.
///
/// A session is threaded by `&mut` through every dispatch of its user, so a
/// later action observes what an earlier one extracted and two dispatches can
/// never touch the same session at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    vars: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Shorthand for [`substitute`] against this session.
    pub fn substitute(&self, template: &str) -> String {
        substitute(self, template)
    }
}

impl<K, V> FromIterator<(K, V)> for Session
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<HashMap<String, String>> for Session {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

/// Replace every `${name}` in `template` with the session's value for `name`.
///
/// Tokens naming unknown variables, and `${` sequences that do not form a
/// token, are copied through untouched. Substituted values are not rescanned.
///
/// ```rust
/// use barrage::{Session, substitute};
///
/// let session: Session = [("user", "alice")].into_iter().collect();
/// assert_eq!(substitute(&session, "/users/${user}"), "/users/alice");
/// assert_eq!(substitute(&session, "/users/${missing}"), "/users/${missing}");
/// ```
pub fn substitute(session: &Session, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(TOKEN_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + TOKEN_OPEN.len()..];

        match after.find(TOKEN_CLOSE) {
            Some(end) if is_variable_name(&after[..end]) => {
                let name = &after[..end];
                match session.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str(TOKEN_OPEN);
                        out.push_str(name);
                        out.push(TOKEN_CLOSE);
                    }
                }
                rest = &after[end + 1..];
            }
            // Not a token, emit the opener and keep scanning right after it
            _ => {
                out.push_str(TOKEN_OPEN);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
