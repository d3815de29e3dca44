//! # Hashtag Allow-List
//!
//! The allow-list is the union of a named preset and a free-form,
//! comma-separated tag list. It is built once when the engine starts and is
//! read-only afterwards. An empty list lets every post through.

use std::collections::HashSet;

/// Named presets selectable through configuration.
pub const PRESET_HASHTAGS: &[(&str, &[&str])] = &[(
    "art",
    &[
        "art",
        "digitalart",
        "fanart",
        "illustration",
        "drawing",
        "oc",
        "photography",
        "artist",
        "traditionalart",
        "blender",
        "render",
        "c4d",
        "3d",
        "3dart",
        "procreate",
        "sketch",
        "pixelart",
    ],
)];

/// Lower-cases and trims a raw tag.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A set of normalized tags. Empty means "allow all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    tags: HashSet<String>,
}

impl AllowList {
    /// Builds the list from an optional preset name and an optional
    /// comma-separated custom tag string.
    ///
    /// Unknown presets are ignored (with a warning) rather than rejected, so a
    /// typo in the preset still leaves the custom tags in effect.
    pub fn from_spec(preset: Option<&str>, custom: Option<&str>) -> Self {
        let mut tags = HashSet::new();

        if let Some(name) = preset.map(normalize_tag).filter(|n| !n.is_empty()) {
            match PRESET_HASHTAGS.iter().find(|(key, _)| *key == name) {
                Some((_, preset_tags)) => {
                    tags.extend(preset_tags.iter().map(|t| t.to_string()));
                }
                None => log::warn!("Unknown hashtag preset '{}'; ignoring it.", name),
            }
        }

        if let Some(custom) = custom {
            tags.extend(
                custom
                    .split(',')
                    .map(normalize_tag)
                    .filter(|t| !t.is_empty()),
            );
        }

        Self { tags }
    }

    /// Builds the list directly from tags, normalizing each one.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| normalize_tag(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(&normalize_tag(tag))
    }
}
