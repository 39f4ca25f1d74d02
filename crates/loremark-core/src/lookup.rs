use serde_json::Value;

/// Deferred lookup: an ordered path of keys resolved against the
/// evaluation context, with an optional fallback value.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookup {
    path: Vec<String>,
    default: Option<Value>,
}

impl Lookup {
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    /// A lookup with no path at all; it always resolves to `value`.
    pub fn constant(value: Value) -> Self {
        Self {
            path: Vec::new(),
            default: Some(value),
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Walks the context along the path. Objects are indexed by key,
    /// arrays by numeric segment. A missing segment (or an index past
    /// the end of an array) resolves to the default if present, else to
    /// a placeholder string naming the unresolved path.
    pub fn resolve(&self, ctx: &Value) -> Value {
        if self.path.is_empty() {
            return self.fallback();
        }
        let mut current = ctx;
        for segment in &self.path {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return self.fallback(),
            }
        }
        current.clone()
    }

    pub fn resolve_text(&self, ctx: &Value) -> String {
        stringify(&self.resolve(ctx))
    }

    fn fallback(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None => Value::String(format!("[unresolved: {}]", self.path.join("."))),
        }
    }
}

/// Display form of a resolved value. Strings pass through unquoted;
/// everything else uses its JSON rendering.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Formats the gallery-image URL for the id yielded by `id_lookup`,
/// using the owning entry's identity from the context. Missing identity
/// fields degrade to placeholder segments, never to errors.
pub(crate) fn gallery_url(id_lookup: &Lookup, ctx: &Value) -> String {
    let id = id_lookup.resolve_text(ctx);
    let universe = Lookup::new(["item", "universe_short"]).resolve_text(ctx);
    let shortname = Lookup::new(["item", "shortname"]).resolve_text(ctx);
    format!("/api/universe/{universe}/item/{shortname}/gallery/{id}")
}
