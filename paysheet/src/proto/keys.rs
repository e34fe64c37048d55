//! Response key normalization.
//!
//! Callable procedures may answer with `snake_case` keys while the wire types
//! are declared in `camelCase`. Keys are rewritten before typed decoding:
//!
//! - a key without interior underscores is left untouched (`last4`, `expMonth`)
//! - `exp_month` becomes `expMonth`, `STRIPE_customer_id` becomes `stripeCustomerId`
//! - leading and trailing underscores are preserved (`_private_key_` becomes `_privateKey_`)

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Converts a single `snake_case` key to `camelCase`.
#[must_use]
pub fn snake_to_camel(key: &str) -> Cow<'_, str> {
    let Some(start) = key.find(|c| c != '_') else {
        return Cow::Borrowed(key);
    };
    let end = key.rfind(|c| c != '_').map_or(key.len(), |i| i + 1);
    let core = &key[start..end];

    let mut words = core.split('_').filter(|w| !w.is_empty());
    let Some(first) = words.next() else {
        return Cow::Borrowed(key);
    };
    let rest: Vec<&str> = words.collect();
    if rest.is_empty() {
        return Cow::Borrowed(key);
    }

    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..start]);
    out.push_str(&first.to_lowercase());
    for word in rest {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            out.extend(head.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str(&key[end..]);
    Cow::Owned(out)
}

/// Recursively rewrites every object key in `value` with [`snake_to_camel`].
#[must_use]
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = match snake_to_camel(&key) {
                    Cow::Borrowed(_) => key,
                    Cow::Owned(converted) => converted,
                };
                normalized.insert(key, normalize_keys(inner));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}
