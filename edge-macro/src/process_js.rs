use darling::{
    FromDeriveInput, FromField,
    ast::{Data, Style},
    util::Override,
};
use proc_macro2::TokenStream;
use quote::quote;

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(js))]
struct StructData {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), StructFields>,
}

#[derive(Debug, FromField)]
#[darling(attributes(js))]
struct StructFields {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    /// Property name on the JS side; defaults to the field name.
    #[darling(default)]
    rename: Option<String>,
    /// Fallback for a missing property: `#[js(default)]` uses
    /// `Default::default()`, `#[js(default = "path")]` calls `path()`.
    #[darling(default)]
    default: Option<Override<syn::Path>>,
}

impl StructFields {
    fn name(&self) -> syn::Result<&syn::Ident> {
        self.ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(&self.ty, "field must have a name"))
    }

    fn js_name(&self) -> syn::Result<String> {
        Ok(match &self.rename {
            Some(name) => name.clone(),
            None => self.name()?.to_string(),
        })
    }
}

pub fn process_from_js(input: syn::DeriveInput) -> syn::Result<TokenStream> {
    let (ident, generics, merged, fields) = parse_struct(input)?;

    let mut code = Vec::with_capacity(fields.len());
    let mut idents = Vec::with_capacity(fields.len());
    for field in &fields {
        let name = field.name()?;
        let js_name = field.js_name()?;
        let ty = &field.ty;

        code.push(match &field.default {
            Some(Override::Inherit) => quote! {
                let #name: #ty = __obj.get::<_, Option<#ty>>(#js_name)?.unwrap_or_default();
            },
            Some(Override::Explicit(path)) => quote! {
                let #name: #ty = __obj.get::<_, Option<#ty>>(#js_name)?.unwrap_or_else(#path);
            },
            None => quote! {
                let #name: #ty = __obj.get(#js_name)?;
            },
        });
        idents.push(name);
    }

    Ok(quote! {
        impl #merged rquickjs::FromJs<'js> for #ident #generics {
            fn from_js(_ctx: &rquickjs::Ctx<'js>, __v: rquickjs::Value<'js>) -> rquickjs::Result<Self> {
                let __ty = __v.type_name();
                let __obj = __v
                    .into_object()
                    .ok_or_else(|| rquickjs::Error::new_from_js(__ty, "object"))?;

                #(#code)*

                Ok(#ident {
                    #(#idents),*
                })
            }
        }
    })
}

pub fn process_into_js(input: syn::DeriveInput) -> syn::Result<TokenStream> {
    let (ident, generics, merged, fields) = parse_struct(input)?;

    let mut code = Vec::with_capacity(fields.len());
    for field in &fields {
        let name = field.name()?;
        let js_name = field.js_name()?;
        code.push(quote! {
            obj.set(#js_name, rquickjs::IntoJs::into_js(self.#name, ctx)?)?;
        });
    }

    Ok(quote! {
        impl #merged rquickjs::IntoJs<'js> for #ident #generics {
            fn into_js(self, ctx: &rquickjs::Ctx<'js>) -> rquickjs::Result<rquickjs::Value<'js>> {
                let obj = rquickjs::Object::new(ctx.clone())?;
                #(#code)*

                Ok(obj.into())
            }
        }
    })
}

fn parse_struct(
    input: syn::DeriveInput,
) -> syn::Result<(syn::Ident, syn::Generics, syn::Generics, Vec<StructFields>)> {
    let StructData {
        ident,
        generics,
        data,
    } = StructData::from_derive_input(&input)
        .map_err(|e| syn::Error::new_spanned(&input.ident, e.to_string()))?;

    let Data::Struct(fields) = data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "only structs are supported",
        ));
    };
    if !matches!(fields.style, Style::Struct) {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "only named fields are supported",
        ));
    }

    let mut merged = generics.clone();
    merged.params.push(syn::parse_quote!('js));

    Ok((ident, generics, merged, fields.fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_struct() -> syn::Result<()> {
        let input = r#"
          #[derive(FromJs)]
          struct Res {
            body: Option<String>,
            status: u16,
          }
        "#;
        let input = syn::parse_str::<syn::DeriveInput>(input)?;

        let (ident, generics, merged, fields) = parse_struct(input)?;

        assert_eq!(ident, "Res");
        assert_eq!(generics, syn::Generics::default());
        let mut merged_assert = syn::Generics::default();
        merged_assert.params.push(syn::parse_quote!('js));
        assert_eq!(merged, merged_assert);
        assert_eq!(fields.len(), 2);
        Ok(())
    }

    #[test]
    fn test_parse_enum_should_fail() -> syn::Result<()> {
        let input = syn::parse_str::<syn::DeriveInput>("enum Method { Get, Post }")?;
        assert!(parse_struct(input).is_err());

        let input = syn::parse_str::<syn::DeriveInput>("struct Pair(u16, u16);")?;
        assert!(parse_struct(input).is_err());
        Ok(())
    }

    #[test]
    fn test_process_from_js_should_work() -> syn::Result<()> {
        let input = r#"
            #[derive(FromJs)]
            struct Res {
                #[js(default)]
                body: Option<String>,
                #[js(rename = "statusCode")]
                status: u16,
            }
        "#;
        let input = syn::parse_str::<syn::DeriveInput>(input)?;

        let tokens = process_from_js(input)?;

        assert_eq!(tokens.to_string(), quote! {
            impl<'js> rquickjs::FromJs<'js> for Res {
                fn from_js(_ctx: &rquickjs::Ctx<'js>, __v: rquickjs::Value<'js>) -> rquickjs::Result<Self> {
                    let __ty = __v.type_name();
                    let __obj = __v
                        .into_object()
                        .ok_or_else(|| rquickjs::Error::new_from_js(__ty, "object"))?;

                    let body: Option<String> = __obj.get::<_, Option<Option<String> >>("body")?.unwrap_or_default();
                    let status: u16 = __obj.get("statusCode")?;

                    Ok(Res { body, status })
                }
            }
        }.to_string());
        Ok(())
    }

    #[test]
    fn test_process_from_js_should_not_clash_with_field_names() -> syn::Result<()> {
        let input = r#"
            #[derive(FromJs)]
            struct Shadow {
                obj: String,
                #[js(default = "default_status")]
                v: u16,
                ty: String,
            }
        "#;
        let input = syn::parse_str::<syn::DeriveInput>(input)?;

        let tokens = process_from_js(input)?;

        assert_eq!(tokens.to_string(), quote! {
            impl<'js> rquickjs::FromJs<'js> for Shadow {
                fn from_js(_ctx: &rquickjs::Ctx<'js>, __v: rquickjs::Value<'js>) -> rquickjs::Result<Self> {
                    let __ty = __v.type_name();
                    let __obj = __v
                        .into_object()
                        .ok_or_else(|| rquickjs::Error::new_from_js(__ty, "object"))?;

                    let obj: String = __obj.get("obj")?;
                    let v: u16 = __obj.get::<_, Option<u16>>("v")?.unwrap_or_else(default_status);
                    let ty: String = __obj.get("ty")?;

                    Ok(Shadow { obj, v, ty })
                }
            }
        }.to_string());
        Ok(())
    }

    #[test]
    fn test_process_into_js_should_work() -> syn::Result<()> {
        let input = r#"
            #[derive(IntoJs)]
            pub struct Req {
                #[builder(setter(into))]
                pub method: String,
                pub url: String,
                #[builder(default, setter(strip_option))]
                pub body: Option<String>,
            }
        "#;
        let input = syn::parse_str::<syn::DeriveInput>(input)?;
        let tokens = process_into_js(input)?;
        assert_eq!(tokens.to_string(), quote! {
            impl<'js> rquickjs::IntoJs<'js> for Req {
                fn into_js(self, ctx: &rquickjs::Ctx<'js>) -> rquickjs::Result<rquickjs::Value<'js>> {
                    let obj = rquickjs::Object::new(ctx.clone())?;
                    obj.set("method", rquickjs::IntoJs::into_js(self.method, ctx)?)?;
                    obj.set("url", rquickjs::IntoJs::into_js(self.url, ctx)?)?;
                    obj.set("body", rquickjs::IntoJs::into_js(self.body, ctx)?)?;

                    Ok(obj.into())
                }
            }
        }.to_string());
        Ok(())
    }
}
