use std::fmt::{Display, Formatter};

use super::name::Name;
use super::object::Object;

/// Dictionary objects (like `<< /Length 42 >>`).
///
/// Entries keep their source order. Keys are unique: inserting under an
/// existing key overwrites the earlier value.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Dict(Vec<(Name, Object)>);

impl Dict {
    pub fn insert(&mut self, key: Name, value: Object) {
        match self.0.iter_mut().find(|(name, _)| name == &key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value))
        }
    }

    /// Looks up the value for a given key. If not present, returns a static
    /// reference to [`Object::Null`].
    pub fn lookup(&self, key: &[u8]) -> &Object {
        self.0.iter()
            .find(|(name, _obj)| name == &key)
            .map(|(_name, obj)| obj)
            .unwrap_or(&Object::Null)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(Name, Object)] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<(Name, Object)> {
        self.0
    }
}

impl From<Vec<(Name, Object)>> for Dict {
    fn from(vec: Vec<(Name, Object)>) -> Dict {
        Dict(vec)
    }
}

impl Display for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("<< ")?;
        for (key, val) in &self.0 {
            write!(f, "{key} {val} ")?;
        }
        f.write_str(">>")
    }
}
