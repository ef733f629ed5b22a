//! Naming, casing, and per-type override tables.
//!
//! Every backend spells names through these functions so independently
//! generated files agree on spelling. The override tables bound the
//! schema-external irregularities (platform defaults, legacy wire shims,
//! the hand-written purchase-params type) to one auditable place.

use std::borrow::Cow;

/// Platform-style acronym segments kept verbatim when re-casing wire
/// tags, except in leading position where the whole name is lowercased.
const ACRONYMS: &[&str] = &["IOS", "MACOS", "TVOS", "WATCHOS", "URL", "ID", "SDK"];

/// Escape a name that collides with a target's reserved words by
/// appending an underscore. Idempotent: an escaped name never collides
/// again, so re-applying is a no-op.
pub fn escape_keyword<'a>(name: &'a str, keywords: &[&str]) -> Cow<'a, str> {
    if keywords.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Convert a wire-format tag (`SCREAMING_SNAKE`, `kebab-case`,
/// `snake_case`, or already camel) to lowerCamelCase, preserving
/// recognized acronym segments: `STORE_IOS` becomes `storeIOS`,
/// never `storeIos`.
///
/// This transform must be byte-identical across all backends for the
/// same input; generated files in different languages reference each
/// other's spellings.
pub fn enum_value_case(raw: &str) -> String {
    let words = split_words(raw);
    let mut out = String::with_capacity(raw.len());
    for (index, word) in words.iter().enumerate() {
        if index == 0 {
            out.push_str(&word.to_lowercase());
        } else if ACRONYMS.contains(&word.to_uppercase().as_str())
            && word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit())
        {
            out.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
    out
}

/// Field names arrive camel-cased from the schema; backends emit them
/// unchanged.
pub fn field_name_case(name: &str) -> &str {
    name
}

/// Upper-camel a name for synthesized type names (wrapper subtypes,
/// handler aliases). Acronym segments stay verbatim.
pub fn type_name_case(raw: &str) -> String {
    let camel = enum_value_case(raw);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => camel,
    }
}

fn split_words(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_upper = false;
    for c in raw.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_upper = false;
        } else if c.is_uppercase() && !previous_upper && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
            previous_upper = true;
        } else {
            previous_upper = c.is_uppercase();
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// An irregular, schema-external mapping override for one declared type.
/// Consulted before the generic rule; never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOverride {
    /// A field receives a literal default so callers don't repeat
    /// boilerplate; the literal is the enum wire tag of the record's own
    /// platform.
    FieldDefault {
        field: &'static str,
        enum_name: &'static str,
        raw_tag: &'static str,
    },
    /// The record synthesizes one extra optional bool absent from the
    /// IR, kept solely for backward wire compatibility.
    LegacyBoolShim { field: &'static str },
    /// The whole type is hand-emitted as the two-variant purchase
    /// params hierarchy; the generic input rule never runs for it.
    HandWrittenPurchaseParams,
}

/// The input type hand-emitted as a two-variant purchase hierarchy.
pub const PURCHASE_PARAMS_TYPE: &str = "PurchaseParams";

/// `(label, one-shot payload type, subscription payload type)` per
/// storefront, in emission order.
pub const PURCHASE_STOREFRONTS: &[(&str, &str, &str)] = &[
    ("appStore", "AppStoreInAppDetails", "AppStoreSubscriptionDetails"),
    ("playStore", "PlayStoreInAppDetails", "PlayStoreSubscriptionDetails"),
    ("web", "WebInAppDetails", "WebSubscriptionDetails"),
];

/// The flag shared by both purchase variants.
pub const PURCHASE_SHARED_FLAG: &str = "offerPersonalized";

/// Wire discriminants for the two purchase variants.
pub const PURCHASE_KIND_TAGS: &[(&str, &str)] = &[("inApp", "in-app"), ("subscription", "subs")];

/// Argument names that trigger automatic flattening of an input-typed
/// operation argument into named per-field parameters.
pub const FLATTENED_ARG_NAMES: &[&str] = &["params", "options", "config", "props"];

/// The closed override table. Adding an entry here is the only way to
/// change mapping for a named type.
const OVERRIDES: &[(&str, TypeOverride)] = &[
    (
        "AppStoreOffer",
        TypeOverride::FieldDefault {
            field: "store",
            enum_name: "Store",
            raw_tag: "app-store",
        },
    ),
    (
        "PlayStoreOffer",
        TypeOverride::FieldDefault {
            field: "store",
            enum_name: "Store",
            raw_tag: "play-store",
        },
    ),
    (
        "Paywall",
        TypeOverride::LegacyBoolShim {
            field: "hasCustomPayload",
        },
    ),
    (
        "Transaction",
        TypeOverride::LegacyBoolShim { field: "isSandbox" },
    ),
    (
        PURCHASE_PARAMS_TYPE,
        TypeOverride::HandWrittenPurchaseParams,
    ),
];

/// Overrides registered for a type name, in table order.
pub fn overrides_for(type_name: &str) -> impl Iterator<Item = &'static TypeOverride> {
    OVERRIDES
        .iter()
        .filter(move |(name, _)| *name == type_name)
        .map(|(_, o)| o)
}

/// The literal default registered for `type_name.field`, if any.
pub fn field_default(type_name: &str, field: &str) -> Option<(&'static str, &'static str)> {
    overrides_for(type_name).find_map(|o| match o {
        TypeOverride::FieldDefault {
            field: f,
            enum_name,
            raw_tag,
        } if *f == field => Some((*enum_name, *raw_tag)),
        _ => None,
    })
}

/// The synthesized legacy bool field for `type_name`, if any.
pub fn legacy_bool_shim(type_name: &str) -> Option<&'static str> {
    overrides_for(type_name).find_map(|o| match o {
        TypeOverride::LegacyBoolShim { field } => Some(*field),
        _ => None,
    })
}

/// Whether `type_name` is the hand-emitted purchase params type.
pub fn is_purchase_params(type_name: &str) -> bool {
    overrides_for(type_name).any(|o| matches!(o, TypeOverride::HandWrittenPurchaseParams))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_appends_underscore_once() {
        let keywords = &["class", "in"];
        assert_eq!(escape_keyword("class", keywords), "class_");
        assert_eq!(escape_keyword("name", keywords), "name");
        // Idempotent: the escaped form is not a keyword.
        let escaped = escape_keyword("in", keywords).into_owned();
        assert_eq!(escape_keyword(&escaped, keywords), "in_");
    }

    #[test]
    fn enum_case_handles_wire_formats() {
        assert_eq!(enum_value_case("in-app"), "inApp");
        assert_eq!(enum_value_case("subs"), "subs");
        assert_eq!(enum_value_case("APP_STORE"), "appStore");
        assert_eq!(enum_value_case("play_store"), "playStore");
        assert_eq!(enum_value_case("alreadyCamel"), "alreadyCamel");
    }

    #[test]
    fn enum_case_preserves_acronym_suffixes() {
        assert_eq!(enum_value_case("STORE_IOS"), "storeIOS");
        assert_eq!(enum_value_case("store-macos"), "storeMacos");
        assert_eq!(enum_value_case("STORE_MACOS"), "storeMACOS");
        // Leading acronyms are lowercased with the rest of the head.
        assert_eq!(enum_value_case("IOS_STORE"), "iosStore");
    }

    #[test]
    fn type_case_upper_camels() {
        assert_eq!(type_name_case("products"), "Products");
        assert_eq!(type_name_case("paywall_shown"), "PaywallShown");
    }

    #[test]
    fn override_table_lookups() {
        assert_eq!(
            field_default("AppStoreOffer", "store"),
            Some(("Store", "app-store"))
        );
        assert_eq!(field_default("AppStoreOffer", "price"), None);
        assert_eq!(legacy_bool_shim("Paywall"), Some("hasCustomPayload"));
        assert_eq!(legacy_bool_shim("Transaction"), Some("isSandbox"));
        assert_eq!(legacy_bool_shim("Product"), None);
        assert!(is_purchase_params("PurchaseParams"));
        assert!(!is_purchase_params("Paywall"));
    }
}
