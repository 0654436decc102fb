use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Customer-identifying text (names, phone numbers) that must not show up in logs.
///
/// Debug and Display keep the first character and mask the rest, which is enough for
/// an operator to correlate log lines with a ticket. Serialization writes the real
/// value because the kitchen display needs it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn masked(&self) -> String {
        let value = self.0.as_ref();
        match value.chars().next() {
            Some(first) => format!("{}{}", first, "*".repeat(value.chars().count().saturating_sub(1).max(3))),
            None => String::new(),
        }
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", self.masked())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}
