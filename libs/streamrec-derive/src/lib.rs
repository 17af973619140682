use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// Derive macro for record schema declarations.
///
/// Generates `streamrec::schema::Declare` (the ordered field list) and,
/// unless the struct is marked `#[event(base)]`, `streamrec::Event`.
///
/// # Example
///
/// ```ignore
/// #[derive(Event)]
/// #[event(base)]
/// pub struct Envelope {
///     pub id: String,
///     pub ts_ms: i64,
/// }
///
/// #[derive(Event, serde::Serialize, serde::Deserialize)]
/// #[event(serializer = "json", name = "Order")]
/// pub struct OrderPlaced {
///     #[event(extends)]
///     #[serde(flatten)]
///     pub envelope: Envelope,
///     pub amount: i64,
///     #[event(rename = "ccy")]
///     #[serde(rename = "ccy")]
///     pub currency: String,
///     #[event(ty = "timestamp")]
///     pub settled_at: Option<i64>,
/// }
/// ```
///
/// Struct attributes: `serializer = "..."`, `name = "..."`, `base`.
/// Field attributes: `extends`, `rename = "..."`, `ty = "..."`.
/// `ty` takes a scalar name or `decimal(p,s)`.
///
/// Generic structs are rejected: schemas are cached per concrete type.
///
/// Inferred types: `bool`; `i8`, `i16`, `i32`, `u8`, `u16` → int32;
/// `i64`, `u32`, `u64`, `isize`, `usize` → int64; `f32`; `f64`;
/// `String`/`str` → string; `Vec<u8>` → bytes; `Vec<T>` → array;
/// `Option<T>` → nullable; anything else → json.
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    // Schemas are cached per `TypeId`, which needs `'static` types.
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Event does not support generic structs; declare a concrete record type",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return expand(input, Vec::new());
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Event only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Event only supports structs",
            ))
        }
    };

    let mut declare_tokens = Vec::new();

    for field in fields {
        let field_ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[event(...)] attribute.
        let mut extends = false;
        let mut rename: Option<String> = None;
        let mut ty_override: Option<LitStr> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("event") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("extends") {
                    extends = true;
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                } else if meta.path.is_ident("ty") {
                    ty_override = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unknown field attribute (expected extends, rename, ty)"));
                }
                Ok(())
            })?;
        }

        if extends {
            if rename.is_some() || ty_override.is_some() {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "`extends` cannot be combined with `rename` or `ty`",
                ));
            }
            declare_tokens.push(quote! {
                __schema.extend::<#field_ty>();
            });
            continue;
        }

        let field_name = rename.unwrap_or_else(|| field_ident.to_string());
        let (inner_ty, nullable) = match option_inner(field_ty) {
            Some(inner) => (inner, true),
            None => (field_ty, false),
        };

        let field_type_expr = match &ty_override {
            Some(lit) => {
                let scalar = scalar_from_name(&lit.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        lit,
                        format!(
                            "unknown type '{}' (expected bool, int32, int64, float32, float64, \
                             decimal(p,s), string, bytes, timestamp, date, uuid, json)",
                            lit.value()
                        ),
                    )
                })?;
                if vec_inner(inner_ty).is_some_and(|t| !is_u8(t)) {
                    quote! { ::streamrec::schema::FieldType::Array(#scalar) }
                } else {
                    quote! { ::streamrec::schema::FieldType::Scalar(#scalar) }
                }
            }
            None => infer_field_type(inner_ty),
        };

        declare_tokens.push(quote! {
            __schema.field(::streamrec::schema::Field::new(
                #field_name,
                #field_type_expr,
                #nullable,
            ));
        });
    }

    expand(input, declare_tokens)
}

fn expand(input: &DeriveInput, declare_tokens: Vec<TokenStream2>) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Parse #[event(...)] on the struct.
    let mut serializer: Option<LitStr> = None;
    let mut display_name: Option<LitStr> = None;
    let mut base = false;

    for attr in &input.attrs {
        if !attr.path().is_ident("event") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("serializer") {
                serializer = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("name") {
                display_name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("base") {
                base = true;
            } else {
                return Err(meta.error("unknown struct attribute (expected serializer, name, base)"));
            }
            Ok(())
        })?;
    }

    let declare = quote! {
        impl #impl_generics ::streamrec::schema::Declare for #name #ty_generics #where_clause {
            fn declare(__schema: &mut ::streamrec::schema::SchemaBuilder) {
                #(#declare_tokens)*
            }
        }
    };

    if base {
        if serializer.is_some() || display_name.is_some() {
            return Err(syn::Error::new_spanned(
                name,
                "`base` types declare fields only; drop `serializer` and `name`",
            ));
        }
        return Ok(declare);
    }

    let name_str = display_name
        .map(|lit| lit.value())
        .unwrap_or_else(|| name.to_string());
    let serializer_expr = match serializer {
        Some(lit) => quote! { ::core::option::Option::Some(#lit) },
        None => quote! { ::core::option::Option::None },
    };

    Ok(quote! {
        #declare

        impl #impl_generics ::streamrec::Event for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
            const SERIALIZER: ::core::option::Option<&'static str> = #serializer_expr;
        }
    })
}

/// Declared type for a Rust field type (with `Option` already stripped).
fn infer_field_type(ty: &Type) -> TokenStream2 {
    if let Some(elem) = vec_inner(ty) {
        if is_u8(elem) {
            let scalar = scalar_tokens("bytes");
            return quote! { ::streamrec::schema::FieldType::Scalar(#scalar) };
        }
        let scalar = infer_scalar(elem);
        return quote! { ::streamrec::schema::FieldType::Array(#scalar) };
    }
    let scalar = infer_scalar(ty);
    quote! { ::streamrec::schema::FieldType::Scalar(#scalar) }
}

fn infer_scalar(ty: &Type) -> TokenStream2 {
    let name = match ty {
        Type::Reference(r) => return infer_scalar(&r.elem),
        _ => type_ident_name(ty),
    };
    let scalar = match name.as_deref() {
        Some("bool") => "bool",
        Some("i8" | "i16" | "i32" | "u8" | "u16") => "int32",
        Some("i64" | "u32" | "u64" | "isize" | "usize") => "int64",
        Some("f32") => "float32",
        Some("f64") => "float64",
        Some("String" | "str") => "string",
        _ => "json",
    };
    scalar_tokens(scalar)
}

fn scalar_from_name(name: &str) -> Option<TokenStream2> {
    match name {
        "bool" | "int32" | "int64" | "float32" | "float64" | "string" | "bytes" | "timestamp"
        | "date" | "uuid" | "json" => Some(scalar_tokens(name)),
        _ => {
            let (precision, scale) = parse_decimal(name)?;
            Some(quote! {
                ::streamrec::schema::ScalarType::Decimal { precision: #precision, scale: #scale }
            })
        }
    }
}

/// `decimal(p,s)` → `(p, s)`; whitespace around the numbers is allowed.
fn parse_decimal(name: &str) -> Option<(u8, u8)> {
    let args = name.strip_prefix("decimal(")?.strip_suffix(')')?;
    let (precision, scale) = args.split_once(',')?;
    let precision: u8 = precision.trim().parse().ok()?;
    let scale: u8 = scale.trim().parse().ok()?;
    (precision > 0 && scale <= precision).then_some((precision, scale))
}

fn scalar_tokens(name: &str) -> TokenStream2 {
    let variant = match name {
        "bool" => quote! { Bool },
        "int32" => quote! { Int32 },
        "int64" => quote! { Int64 },
        "float32" => quote! { Float32 },
        "float64" => quote! { Float64 },
        "string" => quote! { String },
        "bytes" => quote! { Bytes },
        "timestamp" => quote! { Timestamp },
        "date" => quote! { Date },
        "uuid" => quote! { Uuid },
        _ => quote! { Json },
    };
    quote! { ::streamrec::schema::ScalarType::#variant }
}

/// `T` for `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    generic_inner(ty, "Option")
}

/// `T` for `Vec<T>`.
fn vec_inner(ty: &Type) -> Option<&Type> {
    generic_inner(ty, "Vec")
}

fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn is_u8(ty: &Type) -> bool {
    type_ident_name(ty).as_deref() == Some("u8")
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
