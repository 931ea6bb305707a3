use proc_macro::TokenStream;
use quote::quote;
use syn::{Field, Fields, ItemStruct, parse_macro_input, parse_quote, punctuated::Punctuated};

/// Gives a sea-orm model the columns every registry row carries: an
/// auto-increment `id` primary key plus `created_at` and `updated_at`.
///
/// The generated `ActiveModel` implements `TimestampedActiveModel` and the
/// `Entity` implements `HasIdColumn`, both from `crate::db::dao::base_traits`,
/// so the model plugs straight into `DaoBase`.
#[proc_macro_attribute]
pub fn base_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let args = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(args, "#[base_entity] takes no arguments")
            .to_compile_error()
            .into();
    }

    let mut model = parse_macro_input!(item as ItemStruct);
    match prepend_row_columns(&mut model) {
        Ok(()) => expand(&model).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn row_columns() -> [Field; 3] {
    [
        parse_quote! {
            #[sea_orm(primary_key)]
            pub id: i32
        },
        parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub created_at: sea_orm::entity::prelude::DateTimeWithTimeZone
        },
        parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub updated_at: sea_orm::entity::prelude::DateTimeWithTimeZone
        },
    ]
}

fn prepend_row_columns(model: &mut ItemStruct) -> syn::Result<()> {
    let Fields::Named(named) = &mut model.fields else {
        return Err(syn::Error::new_spanned(
            &model.ident,
            "#[base_entity] needs a struct with named fields",
        ));
    };

    let generated = row_columns();
    for field in &named.named {
        let Some(ident) = &field.ident else { continue };
        if generated.iter().any(|column| column.ident.as_ref() == Some(ident)) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("`{ident}` is added by #[base_entity]; remove it from the struct"),
            ));
        }
    }

    let declared = std::mem::take(&mut named.named);
    let mut fields: Punctuated<Field, syn::Token![,]> = generated.into_iter().collect();
    fields.extend(declared);
    named.named = fields;
    Ok(())
}

fn expand(model: &ItemStruct) -> proc_macro2::TokenStream {
    quote! {
        #model

        impl crate::db::dao::base_traits::TimestampedActiveModel for ActiveModel {
            fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.created_at = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.updated_at = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl crate::db::dao::base_traits::HasIdColumn for Entity {
            fn id_column() -> Column {
                Column::Id
            }
        }
    }
}
