//! Procedural macros for orm-connections
//!
//! - `#[derive(Table)]` - table metadata and SQLite row decoding for a record struct

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// Derive `orm::Table` and `orm::FromSqlRow` for a struct with named fields.
///
/// # Usage
///
/// ```ignore
/// #[derive(Table)]
/// #[table(name = "books", primary_key = "id")]
/// pub struct Book {
///     pub id: i64,
///     pub title: String,
///     pub year: Option<i32>,
/// }
/// ```
///
/// Every field maps to a column of the same name. `name` defaults to the
/// snake_cased struct name, `primary_key` to `"id"`.
#[proc_macro_derive(Table, attributes(table))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_table(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Struct-level `#[table(...)]` options
#[derive(Default)]
struct TableAttrs {
    name: Option<String>,
    primary_key: Option<String>,
}

fn parse_table_attrs(input: &DeriveInput) -> syn::Result<TableAttrs> {
    let mut attrs = TableAttrs::default();

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("table")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("primary_key") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.primary_key = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported table attribute, expected `name` or `primary_key`"))
            }
        })?;
    }

    Ok(attrs)
}

fn expand_table(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Table can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Table can only be derived for structs",
            ));
        }
    };

    let attrs = parse_table_attrs(input)?;
    let table_name = attrs
        .name
        .unwrap_or_else(|| ident.to_string().to_case(Case::Snake));
    let primary_key = attrs.primary_key.unwrap_or_else(|| "id".to_string());

    let mut column_defs = Vec::new();
    let mut decoders = Vec::new();
    let mut has_primary_key = false;

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let column = field_ident.to_string().trim_start_matches("r#").to_string();
        let (sql_type, nullable) = sql_type_of(&field.ty);
        let is_primary_key = column == primary_key;
        has_primary_key |= is_primary_key;

        column_defs.push(quote! {
            ::orm_connections::orm::ColumnDef {
                name: #column,
                sql_type: #sql_type,
                nullable: #nullable,
                is_primary_key: #is_primary_key,
            }
        });
        decoders.push(quote! { #field_ident: row.try_get(#column)? });
    }

    if !has_primary_key {
        return Err(syn::Error::new_spanned(
            ident,
            format!("primary key column `{}` is not a field of this struct", primary_key),
        ));
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::orm_connections::orm::Table for #ident #ty_generics #where_clause {
            const TABLE_NAME: &'static str = #table_name;
            const PRIMARY_KEY: &'static str = #primary_key;

            fn columns() -> &'static [::orm_connections::orm::ColumnDef] {
                const COLUMNS: &[::orm_connections::orm::ColumnDef] = &[#(#column_defs),*];
                COLUMNS
            }
        }

        impl #impl_generics ::orm_connections::orm::FromSqlRow for #ident #ty_generics #where_clause {
            fn from_row(
                row: &::orm_connections::__private::sqlx::sqlite::SqliteRow,
            ) -> ::std::result::Result<Self, ::orm_connections::__private::sqlx::Error> {
                use ::orm_connections::__private::sqlx::Row as _;
                Ok(Self {
                    #(#decoders),*
                })
            }
        }
    })
}

/// Map a field type to its SQLite storage class and nullability.
fn sql_type_of(ty: &Type) -> (&'static str, bool) {
    let Type::Path(type_path) = ty else {
        return ("TEXT", false);
    };
    let Some(segment) = type_path.path.segments.last() else {
        return ("TEXT", false);
    };

    match segment.ident.to_string().as_str() {
        "Option" => {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(inner)) = args.args.first() {
                    return (sql_type_of(inner).0, true);
                }
            }
            ("TEXT", true)
        }
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "bool" => ("INTEGER", false),
        "f32" | "f64" => ("REAL", false),
        "Vec" => ("BLOB", false),
        _ => ("TEXT", false),
    }
}
