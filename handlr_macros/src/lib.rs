use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Type,
};

/// Where a bound field takes its value from.
enum Origin {
    Path,
    Query,
    Ctx,
}

struct ParamAttr {
    origin: Origin,
    name: LitStr,
    required: bool,
}

/// Returns the `T` of an `Option<T>` field type.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else {
        return None;
    };
    let seg = p.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

fn parse_param_attr(field: &syn::Field) -> syn::Result<Option<ParamAttr>> {
    let mut found: Option<ParamAttr> = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("param")) {
        let mut origin: Option<(Origin, LitStr)> = None;
        let mut required = false;
        attr.parse_nested_meta(|meta| {
            let kind = if meta.path.is_ident("path") {
                Origin::Path
            } else if meta.path.is_ident("query") {
                Origin::Query
            } else if meta.path.is_ident("ctx") {
                Origin::Ctx
            } else if meta.path.is_ident("required") {
                required = true;
                return Ok(());
            } else {
                return Err(meta.error("expected `path`, `query`, `ctx` or `required`"));
            };
            if origin.is_some() {
                return Err(meta.error("a field binds from exactly one source"));
            }
            let name: LitStr = meta.value()?.parse()?;
            origin = Some((kind, name));
            Ok(())
        })?;
        let Some((origin, name)) = origin else {
            return Err(syn::Error::new_spanned(
                attr,
                "#[param] needs one of `path = \"..\"`, `query = \"..\"`, `ctx = \"..\"`",
            ));
        };
        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[param] attribute"));
        }
        found = Some(ParamAttr {
            origin,
            name,
            required,
        });
    }
    Ok(found)
}

fn field_binding(
    ident: &Ident,
    ty: &Type,
    attr: Option<ParamAttr>,
) -> syn::Result<TokenStream2> {
    let Some(ParamAttr {
        origin,
        name,
        required,
    }) = attr
    else {
        return Ok(quote! { #ident: ::core::default::Default::default(), });
    };
    Ok(match origin {
        Origin::Path => quote! {
            #ident: __source.value::<#ty>(::handlr::ParamOrigin::Path, #name, #required)?,
        },
        Origin::Query => quote! {
            #ident: __source.value::<#ty>(::handlr::ParamOrigin::Query, #name, #required)?,
        },
        Origin::Ctx => match option_inner(ty) {
            Some(_) if required => {
                return Err(syn::Error::new_spanned(
                    ty,
                    "an `Option` context field cannot be `required`; \
                     drop `required` or the `Option`",
                ));
            }
            Some(inner) => quote! {
                #ident: __source.context_optional::<#inner>(#name),
            },
            None => quote! {
                #ident: __source.context::<#ty>(#name, #required)?,
            },
        },
    })
}

fn expand_params(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "#[derive(Params)] only supports structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            name,
            "#[derive(Params)] only supports structs with named fields",
        ));
    };

    let mut bindings = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        let attr = parse_param_attr(field)?;
        if let Some(ident) = &field.ident {
            bindings.push(field_binding(ident, &field.ty, attr)?);
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::handlr::BindParams for #name #ty_generics #where_clause {
            fn bind(__source: &::handlr::ParamSource<'_>) -> ::core::result::Result<Self, ::handlr::BindError> {
                ::core::result::Result::Ok(Self {
                    #(#bindings)*
                })
            }
        }

        impl #impl_generics ::handlr::Payload for #name #ty_generics #where_clause {}
    })
}

/// Generates a compile-time `BindParams` implementation (and a `Payload`
/// implementation) for a struct whose fields carry `#[param(...)]` attributes:
///
/// ```ignore
/// #[derive(Params)]
/// struct GetPet {
///     #[param(path = "id", required)]
///     id: i64,
///     #[param(query = "expand")]
///     expand: Option<String>,
///     #[param(ctx = "user")]
///     user: String,
///     untouched: u32, // always Default::default()
/// }
/// ```
#[proc_macro_derive(Params, attributes(param))]
pub fn derive_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_params(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Marks a body or response type as a present payload.
#[proc_macro_derive(Payload)]
pub fn derive_payload(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::handlr::Payload for #name #ty_generics #where_clause {}
    }
    .into()
}
