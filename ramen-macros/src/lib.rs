//! Procedural macros for the ramen port library.
//!
//! - `#[derive(Ports)]`: for every field marked `#[port]`, generates a method
//!   of the same name that projects `Pin<&Self>` to `Pin<&Field>`. Ports must
//!   be pinned before they can be connected, so an actor holding ports needs
//!   these projections to hand them out.
//!
//! Usage:
//! ```rust,ignore
//! use ramen::{Ports, Pushable, Pusher};
//!
//! #[derive(Ports)]
//! struct Relay<'a> {
//!     #[port]
//!     pub input: Pushable<'a, u8>,
//!     #[port]
//!     pub output: Pusher<'a, u8>,
//! }
//!
//! // relay: Pin<&Relay>
//! // relay.output().connect(other.input());
//! ```
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, GenericParam, Lifetime, LifetimeParam, parse_macro_input};

/// Derives pinned projections for `#[port]` fields.
///
/// The projection is sound only if the struct never moves a port out of a
/// pinned value. The derive enforces the two ways that could happen:
///
/// - The struct must not implement `Drop` (a destructor gets `&mut Self`).
/// - The struct must not implement `Unpin` by hand; it is `Unpin` only when
///   all of its fields are.
#[proc_macro_derive(Ports, attributes(port))]
pub fn derive_ports(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "#[derive(Ports)] requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "#[derive(Ports)] can only be used on structs",
            ));
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let projections = fields
        .iter()
        .filter(|field| field.attrs.iter().any(|attr| attr.path().is_ident("port")))
        .filter_map(|field| {
            let vis = &field.vis;
            let ty = &field.ty;
            let name = field.ident.as_ref()?;
            let doc = format!("Pinned access to the `{name}` port.");
            Some(quote! {
                #[doc = #doc]
                #[inline]
                #vis fn #name(self: ::core::pin::Pin<&Self>) -> ::core::pin::Pin<&#ty> {
                    unsafe { self.map_unchecked(|this| &this.#name) }
                }
            })
        })
        .collect::<Vec<_>>();

    if projections.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(Ports)] found no field marked #[port]",
        ));
    }

    let unpin_guard = unpin_guard(&input, fields.iter().map(|field| &field.ty));

    Ok(quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#projections)*
        }

        const _: () = {
            trait MustNotImplDrop {}
            #[allow(drop_bounds)]
            impl<T: ::core::ops::Drop> MustNotImplDrop for T {}
            impl #impl_generics MustNotImplDrop for #ident #ty_generics #where_clause {}
        };

        #unpin_guard
    })
}

/// `Unpin` for the struct, conditional on every field type being `Unpin`.
///
/// Having this impl in place makes a handwritten `impl Unpin` a conflict.
fn unpin_guard<'f>(input: &DeriveInput, field_types: impl Iterator<Item = &'f syn::Type>) -> TokenStream2 {
    let ident = &input.ident;
    let origin = format_ident!("__{}PortsOrigin", ident);
    let pin = Lifetime::new("'__pin", proc_macro2::Span::call_site());

    let mut generics = input.generics.clone();
    generics
        .params
        .insert(0, GenericParam::Lifetime(LifetimeParam::new(pin.clone())));
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let (_, origin_generics, _) = generics.split_for_impl();
    let (_, ty_generics, _) = input.generics.split_for_impl();
    let predicates = input.generics.where_clause.as_ref().map(|clause| &clause.predicates);

    let field_types = field_types.collect::<Vec<_>>();
    let names = (0..field_types.len()).map(|i| format_ident!("__field{}", i));

    quote! {
        const _: () = {
            #[allow(dead_code, non_camel_case_types)]
            struct #origin #impl_generics #where_clause {
                __pin: ::core::marker::PhantomData<&#pin ()>,
                #(#names: #field_types),*
            }

            impl #impl_generics ::core::marker::Unpin for #ident #ty_generics
            where
                #origin #origin_generics: ::core::marker::Unpin,
                #predicates
            {
            }
        };
    }
}
