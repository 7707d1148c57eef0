extern crate proc_macro;
extern crate quote;
extern crate syn;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident};

/// Implements `SerializableDynamics` for a serde-enabled dynamics struct,
/// and adds a `from_init` constructor building the struct from the
/// initialization events of its atomic model.
#[proc_macro_derive(SerializableDynamics)]
pub fn dynamics(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = input.ident;
    let tokens = quote! {
        impl #name {
            pub fn from_init(
                _init: &devsim::dynamics::DynamicsInit,
                events: &devsim::dynamics::InitEventList,
            ) -> Option<Box<dyn devsim::dynamics::Dynamics>> {
                match devsim::dynamics::from_init_events::<Self>(events) {
                    Some(dynamics) => Some(Box::new(dynamics)),
                    None => None,
                }
            }
        }
        impl devsim::dynamics::SerializableDynamics for #name {
            fn get_type(&self) -> &'static str {
                stringify!(#name)
            }
            fn serialize(&self) -> devsim::Value {
                devsim::dynamics::snapshot(self)
            }
        }
    };
    tokens.into()
}

#[proc_macro]
pub fn register(item: TokenStream) -> TokenStream {
    let name = parse_macro_input!(item as Ident);
    let tokens = quote! {
        devsim::dynamics::factory::register(
            stringify!(#name),
            #name::from_init as devsim::dynamics::factory::DynamicsConstructor
        );
    };
    tokens.into()
}
