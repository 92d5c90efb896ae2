use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, parse_macro_input};

/// Derive the `Component` trait for a struct, providing runtime reflection.
///
/// Every named field must implement `quasar_ecs::ComponentField` unless it
/// is marked `#[runtime]`. Runtime fields hold process-local state (engine
/// handles, rebuild caches) and are not listed, read or written.
///
/// ```ignore
/// #[derive(Component)]
/// struct BoxCollider {
///     size: Vec3,
///     offset: Vec3,
///     #[runtime]
///     shape: Option<ShapeHandle>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(runtime))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().filter(|f| !is_runtime(f)).collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(fields) => {
                return syn::Error::new_spanned(
                    fields,
                    "Component derive needs named fields to reflect",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                &input.ident,
                "Component can only be derived for structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let names: Vec<_> = idents.iter().map(|id| id.to_string()).collect();
    let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();

    let infos = names.iter().zip(&types).map(|(fname, ftype)| {
        quote! {
            quasar_ecs::FieldInfo {
                name: #fname,
                kind: <#ftype as quasar_ecs::ComponentField>::KIND,
            }
        }
    });

    let get_arms = names.iter().zip(&idents).map(|(fname, ident)| {
        quote! {
            #fname => ::core::option::Option::Some(
                quasar_ecs::ComponentField::to_field_value(&self.#ident)
            )
        }
    });

    let set_arms = names.iter().zip(&idents).zip(&types).map(|((fname, ident), ftype)| {
        quote! {
            #fname => match <#ftype as quasar_ecs::ComponentField>::from_field_value(&value) {
                ::core::option::Option::Some(v) => {
                    self.#ident = v;
                    ::core::result::Result::Ok(())
                }
                ::core::option::Option::None => ::core::result::Result::Err(
                    quasar_ecs::FieldError::TypeMismatch {
                        component: #name_str,
                        field: #fname,
                        expected: <#ftype as quasar_ecs::ComponentField>::KIND,
                        found: value.kind(),
                    }
                ),
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics quasar_ecs::Component for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;

            fn field_infos() -> &'static [quasar_ecs::FieldInfo] {
                const INFOS: &[quasar_ecs::FieldInfo] = &[#(#infos),*];
                INFOS
            }

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> ::core::option::Option<quasar_ecs::FieldValue> {
                match name {
                    #(#get_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: quasar_ecs::FieldValue,
            ) -> ::core::result::Result<(), quasar_ecs::FieldError> {
                match name {
                    #(#set_arms,)*
                    _ => ::core::result::Result::Err(quasar_ecs::FieldError::UnknownField {
                        component: #name_str,
                        field: ::std::string::String::from(name),
                    }),
                }
            }
        }
    };

    expanded.into()
}

/// Returns true if the field carries `#[runtime]`.
fn is_runtime(field: &Field) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident("runtime"))
}
