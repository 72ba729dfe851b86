//! Raw serde shapes for the on-disk document, before validation.

use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use serde_json::Value;

/// Top-level document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDocument {
    /// Mode entries in document order, duplicates preserved.
    #[serde(default)]
    pub modes: Entries<RawProfile>,
    #[serde(default, alias = "poll_interval_secs")]
    /// Optional daemon poll interval.
    pub poll_interval_secs: Option<u64>,
    /// Any other top-level key.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One mode entry as written.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProfile {
    #[serde(default, alias = "dock_items")]
    /// Dock items, if the profile manages the dock.
    pub dock_items: Option<Vec<String>>,
    #[serde(default, alias = "wallpaper", alias = "wallpaper_path")]
    /// Wallpaper path as written, possibly `~/`-relative.
    pub wallpaper_path: Option<String>,
    #[serde(default)]
    /// Explicit extension map.
    pub extensions: BTreeMap<String, Value>,
    /// Unknown profile keys; folded into `extensions`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Render an extension value as the string stored in the profile.
pub(crate) fn extension_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Ordered map entries that keep duplicate keys so validation can report them.
///
/// `serde_json` silently keeps the last value for a repeated key when
/// deserializing into a map type; this visitor records every entry instead.
#[derive(Debug)]
pub(crate) struct Entries<T>(pub Vec<(String, T)>);

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for Entries<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        /// Map visitor collecting entries in order.
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for EntriesVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of focus mode names to profiles")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((k, v)) = map.next_entry::<String, T>()? {
                    out.push((k, v));
                }
                Ok(Entries(out))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
