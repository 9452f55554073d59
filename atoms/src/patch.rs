use serde::{Deserialize, Deserializer};

/// A field of a partial update.
///
/// `Unset` means the field was absent from the request and must be left
/// untouched. `Set(None)` is an explicit `null` that clears the stored
/// value. Fields of this type need `#[serde(default)]` so that absence
/// deserializes to `Unset`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unset,
    Set(Option<T>),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    /// Write the patch into `target`, leaving it alone when unset.
    pub fn apply_to(self, target: &mut Option<T>) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::Set)
    }
}
