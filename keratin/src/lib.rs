pub mod config;
pub mod outline;
pub mod schema;

#[cfg(test)]
mod outline_test;
#[cfg(test)]
mod test_util;

use anyhow::Result;

pub use config::CompileOptions;
pub use schema::compile::{keratinize, ErrorKind, ObjectType, Property, Schema};
pub use schema::stringize::{stringize, ObjectSchema, PropertySchema, SchemaType, TypeShape};
pub use schema::ty::{parse_type, PrimitiveType, TypeExpr};

/// Parses schema source text into a validated, inheritance-resolved schema.
pub fn parse<S: AsRef<str>>(source: &str, reserved_type_names: &[S]) -> Result<Schema> {
  parse_with_options(source, &CompileOptions::with_reserved_names(reserved_type_names))
}

pub fn parse_with_options(source: &str, options: &CompileOptions) -> Result<Schema> {
  let outline = outline::parse_outline(source)?;
  keratinize(&outline, options)
}

/// The error kind of a failed `parse` or `stringize` call, if it came from
/// this crate.
pub fn error_kind(e: &anyhow::Error) -> Option<ErrorKind> {
  if let Some(x) = e.downcast_ref::<schema::compile::SchemaCompileError>() {
    return Some(x.kind());
  }
  if let Some(x) = e.downcast_ref::<schema::stringize::StringizeError>() {
    return Some(x.kind());
  }
  if e.downcast_ref::<outline::OutlineError>().is_some() {
    return Some(ErrorKind::Format);
  }
  None
}
