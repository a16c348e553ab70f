/*!
Procedural macros for strut schema reflection.

`#[derive(Reflect)]` describes a struct or enum to the reflector. It reads
the same serde attributes that shape the wire format, so the documented
schema follows what serde actually produces, plus a `#[schema(...)]`
attribute for constraints serde knows nothing about.
*/

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Expr, Field, Fields,
    Lit, UnOp, Visibility,
};

/// Derive `strut::Reflect` for structs and enums
#[proc_macro_derive(Reflect, attributes(schema))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    generate_reflect_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn generate_reflect_impl(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let container = ContainerAttrs::parse(&input.attrs)?;

    let body = match &input.data {
        Data::Struct(data) => {
            if container.transparent {
                transparent_body(&data.fields)?
            } else {
                struct_body(&data.fields, &container)?
            }
        }
        Data::Enum(data) => enum_body(data, &container)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Reflect cannot be derived for union types",
            ));
        }
    };

    let type_params: Vec<_> = input.generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = input.generics.make_where_clause();
    for param in type_params {
        where_clause
            .predicates
            .push(parse_quote!(#param: ::strut::Reflect));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::strut::Reflect for #name #ty_generics #where_clause {
            fn descriptor() -> ::strut::reflect::TypeDescriptor {
                #body
            }
        }
    })
}

/// Single-member structs marked `#[serde(transparent)]`
fn transparent_body(fields: &Fields) -> syn::Result<TokenStream2> {
    let mut members = fields.iter();
    match (members.next(), members.next()) {
        (Some(field), None) => {
            let ty = &field.ty;
            Ok(quote! { <#ty as ::strut::Reflect>::descriptor() })
        }
        _ => Err(syn::Error::new_spanned(
            fields,
            "transparent structs must have exactly one field",
        )),
    }
}

fn struct_body(fields: &Fields, container: &ContainerAttrs) -> syn::Result<TokenStream2> {
    match fields {
        Fields::Named(named) => {
            let mut members = Vec::with_capacity(named.named.len());
            for field in &named.named {
                members.push(field_tokens(field, container)?);
            }

            Ok(quote! {
                ::strut::reflect::TypeDescriptor::Record(
                    ::strut::reflect::RecordDescriptor::new()
                        #(#members)*
                )
            })
        }
        // Newtypes are aliases of what they wrap
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => transparent_body(fields),
        Fields::Unnamed(_) | Fields::Unit => Ok(quote! {
            ::strut::reflect::TypeDescriptor::Record(::strut::reflect::RecordDescriptor::new())
        }),
    }
}

fn field_tokens(field: &Field, container: &ContainerAttrs) -> syn::Result<TokenStream2> {
    let ident = match &field.ident {
        Some(ident) => ident.to_string(),
        None => return Err(syn::Error::new_spanned(field, "expected a named field")),
    };
    let ty = &field.ty;

    if !is_visible(&field.vis) {
        if let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("schema")) {
            return Err(syn::Error::new_spanned(
                attr,
                "#[schema] has no effect on a private field; make the field `pub`",
            ));
        }
        return Ok(quote! {
            .private_field(#ident, ::strut::reflect::TypeDescriptor::Opaque)
        });
    }

    let attrs = FieldAttrs::parse(&field.attrs)?;

    // Skipped members never reach the schema, so their type need not be reflectable
    if attrs.skip {
        return Ok(quote! {
            .field(#ident, ::strut::reflect::TypeDescriptor::Opaque, ::strut::reflect::FieldMeta::new().skip())
        });
    }

    let wire_name = match &attrs.rename {
        Some(name) => Some(name.clone()),
        None => match &container.rename_all {
            Some(rule) => Some(rule.apply(ident.strip_prefix("r#").unwrap_or(&ident))),
            None => None,
        },
    };

    let mut meta = quote! { ::strut::reflect::FieldMeta::new() };
    if let Some(name) = wire_name {
        meta.extend(quote! { .rename(#name) });
    }
    if attrs.omit_empty {
        meta.extend(quote! { .omit_empty() });
    }
    if attrs.flatten {
        meta.extend(quote! { .flatten() });
    }
    if let Some(description) = attrs.description.or_else(|| doc_comment(&field.attrs)) {
        meta.extend(quote! { .description(#description) });
    }
    for (setter, value) in &attrs.constraints {
        let setter = syn::Ident::new(setter, proc_macro2::Span::call_site());
        meta.extend(quote! { .#setter(#value) });
    }

    Ok(quote! {
        .field(#ident, <#ty as ::strut::Reflect>::descriptor(), #meta)
    })
}

fn enum_body(data: &DataEnum, container: &ContainerAttrs) -> syn::Result<TokenStream2> {
    if data
        .variants
        .iter()
        .any(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return Ok(quote! { ::strut::reflect::TypeDescriptor::Opaque });
    }

    let mut names = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        let attrs = FieldAttrs::parse(&variant.attrs)?;
        if attrs.skip {
            continue;
        }

        let ident = variant.ident.to_string();
        let name = match (attrs.rename, &container.rename_all) {
            (Some(name), _) => name,
            (None, Some(rule)) => rule.apply(&ident),
            (None, None) => ident,
        };
        names.push(name);
    }

    Ok(quote! {
        ::strut::reflect::TypeDescriptor::Enumeration(vec![#(#names.to_string()),*])
    })
}

fn is_visible(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_) | Visibility::Restricted(_))
}

/// Doc comment lines joined into one description
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

#[derive(Default)]
struct ContainerAttrs {
    rename_all: Option<RenameRule>,
    transparent: bool,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    if let Some(rule) = serialize_name(&meta)? {
                        parsed.rename_all = Some(RenameRule::from_str(&rule).ok_or_else(|| {
                            meta.error(format!("unknown rename rule `{}`", rule))
                        })?);
                    }
                } else if meta.path.is_ident("transparent") {
                    parsed.transparent = true;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
    omit_empty: bool,
    flatten: bool,
    description: Option<String>,
    /// `FieldMeta` setter and literal value, in attribute order
    constraints: Vec<(&'static str, String)>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| parsed.serde_meta(meta))?;
            } else if attr.path().is_ident("schema") {
                attr.parse_nested_meta(|meta| parsed.schema_meta(meta))?;
            }
        }
        Ok(parsed)
    }

    fn serde_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("rename") {
            if let Some(name) = serialize_name(&meta)? {
                self.rename = Some(name);
            }
        } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
            self.skip = true;
        } else if meta.path.is_ident("default") || meta.path.is_ident("skip_serializing_if") {
            self.omit_empty = true;
            skip_meta(&meta)?;
        } else if meta.path.is_ident("flatten") {
            self.flatten = true;
        } else {
            skip_meta(&meta)?;
        }
        Ok(())
    }

    fn schema_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("skip") {
            self.skip = true;
            return Ok(());
        }
        if meta.path.is_ident("optional") {
            self.omit_empty = true;
            return Ok(());
        }
        if meta.path.is_ident("description") {
            self.description = Some(literal_value(&meta)?);
            return Ok(());
        }

        let setter = match meta.path.get_ident().map(|ident| ident.to_string()).as_deref() {
            Some("type") => "kind",
            Some("minimum") => "minimum",
            Some("maximum") => "maximum",
            Some("exclusive_minimum") => "exclusive_minimum",
            Some("exclusive_maximum") => "exclusive_maximum",
            Some("min_length") => "min_length",
            Some("max_length") => "max_length",
            Some("pattern") => "pattern",
            Some("format") => "format",
            Some("min_items") => "min_items",
            Some("max_items") => "max_items",
            Some("enum") => "enumeration",
            _ => return Err(meta.error("unknown schema attribute")),
        };
        self.constraints.push((setter, literal_value(&meta)?));
        Ok(())
    }
}

/// Value of `key = ".."` or the `serialize` half of `key(serialize = "..", ..)`
fn serialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(syn::Token![=]) {
        return literal_value(meta).map(Some);
    }

    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            name = Some(literal_value(&inner)?);
        } else {
            skip_meta(&inner)?;
        }
        Ok(())
    })?;
    Ok(name)
}

/// Consume whatever follows an attribute key we do not interpret
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream2>()?;
    }
    Ok(())
}

/// A string, integer, float or bool literal rendered as text
fn literal_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    let expr: Expr = meta.value()?.parse()?;
    literal_text(&expr).ok_or_else(|| meta.error("expected a string, number or bool literal"))
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr) => match &expr.lit {
            Lit::Str(s) => Some(s.value()),
            Lit::Int(i) => Some(i.base10_digits().to_string()),
            Lit::Float(f) => Some(f.base10_digits().to_string()),
            Lit::Bool(b) => Some(b.value.to_string()),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            literal_text(&unary.expr).map(|digits| format!("-{}", digits))
        }
        Expr::Group(group) => literal_text(&group.expr),
        _ => None,
    }
}

/// serde's `rename_all` rules
#[derive(Debug, Clone, Copy, PartialEq)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_str(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_lowercase(),
            RenameRule::Upper => name.to_uppercase(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Kebab => name.to_kebab_case(),
            RenameRule::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}
