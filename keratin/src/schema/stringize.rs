use std::fmt::{Debug, Display};

use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use super::compile::{ErrorKind, ObjectType, Schema};
use super::ty::TypeExpr;

#[derive(Error, Debug)]
pub enum StringizeError {
  #[error("no unknown type handler result for: {0}")]
  UnhandledType(String),
}

impl StringizeError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UnhandledType(_) => ErrorKind::TypeSyntax,
    }
  }
}

/// How a type looks to the renderer.
pub enum TypeShape<'a, T> {
  Primitive(&'a str),
  Object(&'a str),
  Set(&'a T),
  List(&'a T),
  Map(&'a T, &'a T),
  /// Handed to the caller's unknown type handler.
  Unknown,
}

/// A type representation that can be rendered back into source text.
pub trait SchemaType: Sized {
  fn shape(&self) -> TypeShape<'_, Self>;
}

impl SchemaType for TypeExpr {
  fn shape(&self) -> TypeShape<'_, Self> {
    match self {
      Self::Primitive { primitive } => TypeShape::Primitive(primitive.name()),
      Self::Object { object } => TypeShape::Object(&**object),
      Self::Set { members } => TypeShape::Set(&**members),
      Self::List { members } => TypeShape::List(&**members),
      Self::Map { key, value } => TypeShape::Map(&**key, &**value),
    }
  }
}

#[derive(Clone, Debug)]
pub struct PropertySchema<T> {
  pub ty: T,
  pub code: i64,
  pub tags: Option<IndexSet<String>>,
}

#[derive(Clone, Debug)]
pub struct ObjectSchema<T> {
  pub tags: Option<IndexSet<String>>,
  /// Keys that parse as numbers are index entries, not properties, and are
  /// never rendered.
  pub properties: IndexMap<String, PropertySchema<T>>,
}

impl<T> Default for ObjectSchema<T> {
  fn default() -> Self {
    Self {
      tags: None,
      properties: IndexMap::new(),
    }
  }
}

/// Own properties only; supertypes go in the header tag position, which is
/// where the parser reads them from.
impl From<&ObjectType> for ObjectSchema<TypeExpr> {
  fn from(obj: &ObjectType) -> Self {
    let super_types = obj
      .super_types
      .iter()
      .map(|x| x.to_string())
      .collect::<IndexSet<_>>();
    Self {
      tags: if super_types.is_empty() {
        None
      } else {
        Some(super_types)
      },
      properties: obj
        .own_properties()
        .map(|p| {
          (
            p.name.to_string(),
            PropertySchema {
              ty: p.ty.clone(),
              code: p.code,
              tags: Some(p.tags.clone()),
            },
          )
        })
        .collect(),
    }
  }
}

fn write_tags(s: &mut String, tags: &Option<IndexSet<String>>) {
  if let Some(tags) = tags {
    for t in tags {
      s.push(' ');
      s.push_str(t);
    }
  }
}

fn is_numeric_key(key: &str) -> bool {
  let digits = key.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(key);
  digits
    .chars()
    .next()
    .map(|c| c.is_ascii_digit())
    .unwrap_or(false)
}

pub fn stringize_type<T, F>(t: &T, unknown_type_handler: &mut F) -> Result<String>
where
  T: SchemaType + Debug,
  F: FnMut(&T) -> Option<String>,
{
  Ok(match t.shape() {
    TypeShape::Primitive(x) | TypeShape::Object(x) => x.to_string(),
    TypeShape::Set(x) => format!("set:{}", stringize_type(x, unknown_type_handler)?),
    TypeShape::List(x) => format!("list:{}", stringize_type(x, unknown_type_handler)?),
    TypeShape::Map(k, v) => format!(
      "{}:{}",
      stringize_type(k, unknown_type_handler)?,
      stringize_type(v, unknown_type_handler)?
    ),
    TypeShape::Unknown => unknown_type_handler(t)
      .ok_or_else(|| StringizeError::UnhandledType(format!("{:?}", t)))?,
  })
}

/// Renders one object type as a header line followed by one tab-indented line
/// per property.
pub fn stringize<T, F>(
  schema: &ObjectSchema<T>,
  name: &str,
  code: i64,
  unknown_type_handler: F,
) -> Result<String>
where
  T: SchemaType + Debug,
  F: FnMut(&T) -> Option<String>,
{
  render_object(schema, name, code, true, unknown_type_handler)
}

/// With `skip_index_keys` unset every entry is a real property, including
/// names that start with a digit.
fn render_object<T, F>(
  schema: &ObjectSchema<T>,
  name: &str,
  code: i64,
  skip_index_keys: bool,
  mut unknown_type_handler: F,
) -> Result<String>
where
  T: SchemaType + Debug,
  F: FnMut(&T) -> Option<String>,
{
  let mut s = format!("{} {}", name, code);
  write_tags(&mut s, &schema.tags);
  s.push('\n');

  for (prop_name, prop) in &schema.properties {
    if skip_index_keys && is_numeric_key(prop_name) {
      continue;
    }
    let ty = stringize_type(&prop.ty, &mut unknown_type_handler)?;
    s.push_str(&format!("\t{} {} {}", prop_name, ty, prop.code));
    write_tags(&mut s, &prop.tags);
    s.push('\n');
  }

  Ok(s)
}

impl Display for Schema {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for obj in self.iter() {
      // Compiled objects carry no index entries.
      let text = render_object(&ObjectSchema::from(obj), &obj.name, obj.code, false, |_| None)
        .map_err(|_| std::fmt::Error)?;
      write!(f, "{}", text)?;
    }
    Ok(())
  }
}
