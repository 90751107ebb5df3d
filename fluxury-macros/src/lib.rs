//! Procedural macros for fluxury

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Rename every variant: `SCREAMING_SNAKE_CASE`, `snake_case` or `camelCase`
    #[darling(default)]
    rename_all: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit action type name
    #[darling(default)]
    rename: Option<String>,
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn apply_rename_all(rule: &str, name: &str) -> Option<String> {
    let parts = split_pascal_case(name);
    let renamed = match rule {
        "SCREAMING_SNAKE_CASE" => parts
            .iter()
            .map(|p| p.to_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
        "snake_case" => parts
            .iter()
            .map(|p| p.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        "camelCase" => parts
            .iter()
            .enumerate()
            .map(|(i, p)| if i == 0 { p.to_lowercase() } else { p.clone() })
            .collect(),
        _ => return None,
    };
    Some(renamed)
}

/// Match arm mapping one variant to its action type
fn name_arm(enum_name: &syn::Ident, variant: &ActionVariant, action_name: &str) -> TokenStream2 {
    let variant_name = &variant.ident;
    match &variant.fields.style {
        darling::ast::Style::Unit => quote! {
            #enum_name::#variant_name => #action_name
        },
        darling::ast::Style::Tuple => quote! {
            #enum_name::#variant_name(..) => #action_name
        },
        darling::ast::Style::Struct => quote! {
            #enum_name::#variant_name { .. } => #action_name
        },
    }
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method returning each variant's action type, plus an
/// associated `NAMES` constant listing every type in declaration order. By
/// default the type is the variant name itself, mirroring it as a key.
///
/// - `#[action(rename_all = "SCREAMING_SNAKE_CASE")]` on the enum renames
///   every variant (`snake_case` and `camelCase` are also accepted)
/// - `#[action(rename = "...")]` on a variant overrides its type
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// #[action(rename_all = "SCREAMING_SNAKE_CASE")]
/// enum CounterAction {
///     Inc,
///     Dec,
///     #[action(rename = "loadMessage")]
///     LoadMessage(String),
/// }
///
/// assert_eq!(CounterAction::Inc.name(), "INC");
/// assert_eq!(CounterAction::NAMES, &["INC", "DEC", "loadMessage"]);
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}

fn expand(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let opts = ActionOpts::from_derive_input(input)?;
    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return Err(darling::Error::custom("Action can only be derived for enums")
                .with_span(&input.ident));
        }
    };

    // An empty match on `&Self` is not exhaustive, so reject these up front
    if variants.is_empty() {
        return Err(darling::Error::custom("Action requires at least one variant")
            .with_span(&input.ident));
    }

    let mut action_names = Vec::with_capacity(variants.len());
    let mut seen = HashSet::new();
    for v in variants.iter() {
        let default_name = v.ident.to_string();
        let action_name = match (&v.rename, &opts.rename_all) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(rule)) => apply_rename_all(rule, &default_name).ok_or_else(|| {
                darling::Error::custom(format!("unsupported rename_all rule: {rule:?}"))
                    .with_span(&input.ident)
            })?,
            (None, None) => default_name,
        };

        if !seen.insert(action_name.clone()) {
            return Err(
                darling::Error::custom(format!("duplicate action name: {action_name:?}"))
                    .with_span(&v.ident),
            );
        }
        action_names.push(action_name);
    }

    let name_arms = variants
        .iter()
        .zip(&action_names)
        .map(|(v, action_name)| name_arm(name, v, action_name));

    Ok(quote! {
        impl #name {
            /// Every action type of this enum, in declaration order
            pub const NAMES: &'static [&'static str] = &[#(#action_names),*];
        }

        impl fluxury::Action for #name {
            fn name(&self) -> &str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    })
}
