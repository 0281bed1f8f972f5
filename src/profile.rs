//! Entity profiles and the datasets they are resolved in.
//!
//! A [`Dataset`] holds either one collection of profiles (dirty ER: duplicates
//! within the collection) or two (clean-clean ER: duplicates across two
//! collections that are individually duplicate-free).
//!
//! Profiles are addressed by a *unified index*. Indices `0..d1` refer to the
//! first collection, `d1..d1 + d2` to the second. Every downstream structure
//! (blocks, candidate pairs, graph nodes, clusters) uses this index space.

use crate::error::{Error, Result};

/// One `(name, value)` pair of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A record describing (possibly) some real-world entity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityProfile {
    id: usize,
    attributes: Vec<Attribute>,
}

impl EntityProfile {
    /// Create an empty profile. `id` is the profile's position in its collection.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            attributes: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Position of the profile in its own collection.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Lower-cased alphanumeric tokens of every attribute value, in order
    /// (duplicates included).
    pub fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.attributes.iter().flat_map(|a| tokenize(&a.value))
    }
}

/// Split `text` on every non-alphanumeric character and lower-case the pieces.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// The profile collection(s) a resolution run operates on.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    d1: Vec<EntityProfile>,
    d2: Option<Vec<EntityProfile>>,
}

impl Dataset {
    /// Dirty ER: find duplicates within a single collection.
    pub fn dirty(profiles: Vec<EntityProfile>) -> Result<Self> {
        check_ids(&profiles)?;
        Ok(Self {
            d1: profiles,
            d2: None,
        })
    }

    /// Clean-clean ER: find matches between two duplicate-free collections.
    ///
    /// Profiles of `second` keep their own positional ids; their unified index is
    /// offset by `first.len()`.
    pub fn clean_clean(first: Vec<EntityProfile>, second: Vec<EntityProfile>) -> Result<Self> {
        check_ids(&first)?;
        check_ids(&second)?;
        Ok(Self {
            d1: first,
            d2: Some(second),
        })
    }

    /// True for clean-clean ER.
    pub fn is_clean_clean(&self) -> bool {
        self.d2.is_some()
    }

    /// Size of the first collection (also the unified-index offset of the second).
    pub fn d1_len(&self) -> usize {
        self.d1.len()
    }

    /// Size of the second collection, if any.
    pub fn d2_len(&self) -> Option<usize> {
        self.d2.as_ref().map(Vec::len)
    }

    /// Total number of profiles.
    pub fn len(&self) -> usize {
        self.d1.len() + self.d2_len().unwrap_or(0)
    }

    /// True if there are no profiles at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Profile at a unified index.
    pub fn profile(&self, index: usize) -> Option<&EntityProfile> {
        if index < self.d1.len() {
            self.d1.get(index)
        } else {
            self.d2.as_ref()?.get(index - self.d1.len())
        }
    }

    /// Iterate `(unified index, profile)` over both collections.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &EntityProfile)> {
        let offset = self.d1.len();
        self.d1.iter().enumerate().chain(
            self.d2
                .iter()
                .flat_map(move |d2| d2.iter().enumerate().map(move |(i, p)| (offset + i, p))),
        )
    }
}

fn check_ids(profiles: &[EntityProfile]) -> Result<()> {
    for (pos, p) in profiles.iter().enumerate() {
        if p.id != pos {
            return Err(Error::ProfileIdMismatch {
                expected: pos,
                found: p.id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_punctuation_and_lowercases() {
        let tokens: Vec<String> = tokenize("J. Smith_Jr, NEW-York 42").collect();
        assert_eq!(tokens, vec!["j", "smith", "jr", "new", "york", "42"]);
    }

    #[test]
    fn tokenize_empty_and_symbol_only() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize(" -- ,, ").count(), 0);
    }

    #[test]
    fn unified_index_spans_both_collections() {
        let d1 = vec![EntityProfile::new(0), EntityProfile::new(1)];
        let d2 = vec![EntityProfile::new(0).with_attribute("name", "x")];
        let ds = Dataset::clean_clean(d1, d2).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.d1_len(), 2);
        assert_eq!(ds.profile(2).unwrap().attributes()[0].value, "x");
        assert!(ds.profile(3).is_none());

        let ids: Vec<usize> = ds.iter().map(|(i, _)| i).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_misnumbered_profiles() {
        let err = Dataset::dirty(vec![EntityProfile::new(0), EntityProfile::new(5)]).unwrap_err();
        assert!(matches!(
            err,
            Error::ProfileIdMismatch {
                expected: 1,
                found: 5
            }
        ));
    }

    #[test]
    fn empty_dataset_is_valid() {
        let ds = Dataset::dirty(Vec::new()).unwrap();
        assert!(ds.is_empty());
        assert!(!ds.is_clean_clean());
    }
}
