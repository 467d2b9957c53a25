use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use thiserror::Error;

use super::ty::{parse_type, TypeExpr};
use crate::config::CompileOptions;
use crate::outline::OutlineNode;

/// Deepest collection nesting accepted in a property type.
pub const MAX_TYPE_DEPTH: usize = 64;

/// Broad classes of schema failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
  Format,
  Name,
  Duplicate,
  Reference,
  Collision,
  TypeSyntax,
}

#[derive(Error, Debug)]
pub enum SchemaCompileError {
  #[error("line {line}: an object declaration needs a name and a code")]
  IncompleteObject { line: usize },

  #[error("line {line}: property of `{object}` needs a name, a type and a code")]
  IncompleteProperty { object: String, line: usize },

  #[error("property `{property}` of `{object}` has sub-properties; only one level of indentation is permitted")]
  NestedProperty { object: String, property: String },

  #[error("must provide integer code for object type `{object}`, got `{code}`")]
  BadObjectCode { object: String, code: String },

  #[error("property `{property}` of `{object}` must have an integer code, got `{code}`")]
  BadPropertyCode {
    object: String,
    property: String,
    code: String,
  },

  #[error("type of property `{property}` of `{object}` nests deeper than {limit} levels")]
  TypeTooDeep {
    object: String,
    property: String,
    limit: usize,
  },

  #[error("invalid name, reserved: `{0}`")]
  ReservedObjectName(String),

  #[error("property `{property}` of `{object}` has a reserved name")]
  ReservedPropertyName { object: String, property: String },

  #[error("object of type `{object}` uses property code {code} more than once: `{property}`")]
  DuplicatePropertyCode {
    object: String,
    property: String,
    code: i64,
  },

  #[error("duplicate property name `{property}` for `{object}`")]
  DuplicatePropertyName { object: String, property: String },

  #[error("object `{object}` is using a code that is already taken by `{existing}`: {code}")]
  DuplicateObjectCode {
    object: String,
    existing: String,
    code: i64,
  },

  #[error("duplicate name already taken: `{object}` (code {existing_code}, redeclared with code {code})")]
  DuplicateObjectName {
    object: String,
    existing_code: i64,
    code: i64,
  },

  #[error("object type referenced but not defined (in `{object}.{property}`): `{referenced}`")]
  MissingObjectType {
    object: String,
    property: String,
    referenced: String,
  },

  #[error("name collision in `{object}` between `{existing_owner}.{property}` and super type's `{incoming_owner}.{property}`")]
  PropertyNameCollision {
    object: String,
    property: String,
    existing_owner: String,
    incoming_owner: String,
  },

  #[error("type code collision in `{object}` between `{existing_owner}.{existing}` and super type property `{incoming_owner}.{incoming}`, both use type code: {code}")]
  PropertyCodeCollision {
    object: String,
    existing: String,
    existing_owner: String,
    incoming: String,
    incoming_owner: String,
    code: i64,
  },

  #[error("recursive inheritance through `{0}`")]
  RecursiveInheritance(String),
}

impl SchemaCompileError {
  pub fn kind(&self) -> ErrorKind {
    use SchemaCompileError::*;
    match self {
      IncompleteObject { .. } | IncompleteProperty { .. } | NestedProperty { .. } => {
        ErrorKind::Format
      }
      BadObjectCode { .. } | BadPropertyCode { .. } | TypeTooDeep { .. } => {
        ErrorKind::TypeSyntax
      }
      ReservedObjectName(_) | ReservedPropertyName { .. } => ErrorKind::Name,
      DuplicatePropertyCode { .. }
      | DuplicatePropertyName { .. }
      | DuplicateObjectCode { .. }
      | DuplicateObjectName { .. } => ErrorKind::Duplicate,
      MissingObjectType { .. } => ErrorKind::Reference,
      PropertyNameCollision { .. } | PropertyCodeCollision { .. } | RecursiveInheritance(_) => {
        ErrorKind::Collision
      }
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Property {
  pub name: Arc<str>,
  #[serde(rename = "type")]
  pub ty: TypeExpr,
  pub code: i64,
  pub tags: IndexSet<String>,
  /// The object type that declared this property.
  pub owner: Arc<str>,
}

impl Property {
  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.contains(tag)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectType {
  pub name: Arc<str>,
  pub code: i64,
  pub super_types: IndexSet<Arc<str>>,
  /// Direct subtypes, filled in during inheritance resolution.
  pub sub_types: IndexSet<Arc<str>>,
  /// Own and inherited properties. Inherited entries share the declaring
  /// object's `Arc`.
  pub properties: IndexMap<Arc<str>, Arc<Property>>,
  #[serde(skip)]
  pub properties_by_code: BTreeMap<i64, Arc<Property>>,
}

impl ObjectType {
  fn new(name: &str, code: i64) -> Self {
    Self {
      name: Arc::from(name),
      code,
      super_types: IndexSet::new(),
      sub_types: IndexSet::new(),
      properties: IndexMap::new(),
      properties_by_code: BTreeMap::new(),
    }
  }

  pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
    self.properties.get(name)
  }

  pub fn property_by_code(&self, code: i64) -> Option<&Arc<Property>> {
    self.properties_by_code.get(&code)
  }

  /// Properties declared by this object type itself, in declaration order.
  pub fn own_properties(&self) -> impl Iterator<Item = &Arc<Property>> {
    let name = self.name.clone();
    self.properties.values().filter(move |x| x.owner == name)
  }

  /// Registers a newly declared property, rejecting a reused name or code.
  fn declare(&mut self, prop: Arc<Property>) -> Result<()> {
    if self.properties_by_code.contains_key(&prop.code) {
      return Err(
        SchemaCompileError::DuplicatePropertyCode {
          object: self.name.to_string(),
          property: prop.name.to_string(),
          code: prop.code,
        }
        .into(),
      );
    }
    if self.properties.contains_key(&prop.name) {
      return Err(
        SchemaCompileError::DuplicatePropertyName {
          object: self.name.to_string(),
          property: prop.name.to_string(),
        }
        .into(),
      );
    }
    self.properties_by_code.insert(prop.code, prop.clone());
    self.properties.insert(prop.name.clone(), prop);
    Ok(())
  }

  /// Copies a property from a later declaration block of the same object.
  /// Repeating a property under the same name and code replaces it; reusing
  /// only one of the two would leave the name and code indexes disagreeing.
  fn redeclare(&mut self, prop: Arc<Property>) -> Result<()> {
    let same_name = self.properties.get(&prop.name).map(|x| x.code);
    let same_code = self.properties_by_code.get(&prop.code).map(|x| x.name.clone());
    match (same_name, same_code) {
      (None, None) => self.declare(prop),
      (Some(code), Some(name)) if code == prop.code && name == prop.name => {
        self.properties_by_code.insert(prop.code, prop.clone());
        self.properties.insert(prop.name.clone(), prop);
        Ok(())
      }
      (Some(_), _) => Err(
        SchemaCompileError::DuplicatePropertyName {
          object: self.name.to_string(),
          property: prop.name.to_string(),
        }
        .into(),
      ),
      (None, Some(_)) => Err(
        SchemaCompileError::DuplicatePropertyCode {
          object: self.name.to_string(),
          property: prop.name.to_string(),
          code: prop.code,
        }
        .into(),
      ),
    }
  }

  /// Pulls in a supertype's properties. A property that is already present
  /// by identity was reached through another path and is skipped.
  fn inherit(
    &mut self,
    by_name: &IndexMap<Arc<str>, Arc<Property>>,
    by_code: &BTreeMap<i64, Arc<Property>>,
  ) -> Result<()> {
    for (key, prop) in by_name {
      match self.properties.get(key) {
        Some(existing) if Arc::ptr_eq(existing, prop) => {}
        Some(existing) => {
          return Err(
            SchemaCompileError::PropertyNameCollision {
              object: self.name.to_string(),
              property: key.to_string(),
              existing_owner: existing.owner.to_string(),
              incoming_owner: prop.owner.to_string(),
            }
            .into(),
          );
        }
        None => {
          log::trace!("`{}` inherits `{}.{}`", self.name, prop.owner, key);
          self.properties.insert(key.clone(), prop.clone());
        }
      }
    }

    for (&code, prop) in by_code {
      match self.properties_by_code.get(&code) {
        Some(existing) if Arc::ptr_eq(existing, prop) => {}
        Some(existing) => {
          return Err(
            SchemaCompileError::PropertyCodeCollision {
              object: self.name.to_string(),
              existing: existing.name.to_string(),
              existing_owner: existing.owner.to_string(),
              incoming: prop.name.to_string(),
              incoming_owner: prop.owner.to_string(),
              code,
            }
            .into(),
          );
        }
        None => {
          self.properties_by_code.insert(code, prop.clone());
        }
      }
    }
    Ok(())
  }
}

#[derive(Debug, Default, Serialize)]
pub struct Schema {
  pub objects_by_name: IndexMap<Arc<str>, ObjectType>,
  pub objects_by_code: BTreeMap<i64, Arc<str>>,
}

impl Schema {
  pub fn get(&self, name: &str) -> Option<&ObjectType> {
    self.objects_by_name.get(name)
  }

  pub fn get_by_code(&self, code: i64) -> Option<&ObjectType> {
    self
      .objects_by_code
      .get(&code)
      .and_then(|x| self.objects_by_name.get(x))
  }

  /// Object types in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &ObjectType> {
    self.objects_by_name.values()
  }

  pub fn len(&self) -> usize {
    self.objects_by_name.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects_by_name.is_empty()
  }
}

struct ReservedNames {
  exact: HashSet<String>,
  lowercase: HashSet<String>,
}

impl ReservedNames {
  fn new(names: &[String]) -> Self {
    Self {
      exact: names.iter().cloned().collect(),
      lowercase: names.iter().map(|x| x.to_lowercase()).collect(),
    }
  }

  fn is_reserved_object(&self, name: &str) -> bool {
    self.exact.contains(name)
  }

  fn is_reserved_property(&self, name: &str) -> bool {
    self.lowercase.contains(&name.to_lowercase())
  }
}

/// Builds, validates and resolves a schema from top-level outline nodes.
pub fn keratinize(outline: &[OutlineNode], options: &CompileOptions) -> Result<Schema> {
  let reserved = ReservedNames::new(&options.reserved_names);
  let mut schema = Schema::default();

  log::debug!("building {} declarations", outline.len());
  for node in outline {
    if options.skip_derived_declarations && is_derived_declaration(node) {
      log::debug!("skipping derived declaration on line {}", node.line_number);
      continue;
    }
    declare_object(&mut schema, node, &reserved)?;
  }

  log::debug!("validating references");
  validate_references(&schema)?;

  log::debug!("resolving inheritance");
  let names = schema.objects_by_code.values().cloned().collect::<Vec<_>>();
  let mut resolver = InheritanceResolver {
    schema: &mut schema,
    path: vec![],
  };
  for name in &names {
    resolver.extend(name)?;
  }

  Ok(schema)
}

fn is_derived_declaration(node: &OutlineNode) -> bool {
  node.tokens.first().map(|x| x.contains('(')).unwrap_or(false) || node.line.contains(":=")
}

fn declare_object(schema: &mut Schema, node: &OutlineNode, reserved: &ReservedNames) -> Result<()> {
  let (name, code_text) = match node.tokens.as_slice() {
    [name, code, ..] => (name.as_str(), code.as_str()),
    _ => {
      return Err(
        SchemaCompileError::IncompleteObject {
          line: node.line_number,
        }
        .into(),
      )
    }
  };
  let code: i64 = code_text
    .parse()
    .map_err(|_| SchemaCompileError::BadObjectCode {
      object: name.to_string(),
      code: code_text.to_string(),
    })?;

  if reserved.is_reserved_object(name) {
    return Err(SchemaCompileError::ReservedObjectName(name.to_string()).into());
  }

  if let Some(existing) = schema.objects_by_code.get(&code) {
    if &**existing != name {
      return Err(
        SchemaCompileError::DuplicateObjectCode {
          object: name.to_string(),
          existing: existing.to_string(),
          code,
        }
        .into(),
      );
    }
  }

  let mut obj = ObjectType::new(name, code);
  for t in &node.tokens[2..] {
    obj.super_types.insert(Arc::from(t.as_str()));
  }
  for child in &node.children {
    let prop = build_property(&obj, child, reserved)?;
    obj.declare(Arc::new(prop))?;
  }

  match schema.objects_by_name.get_mut(name) {
    Some(existing) => {
      if existing.code != code {
        return Err(
          SchemaCompileError::DuplicateObjectName {
            object: name.to_string(),
            existing_code: existing.code,
            code,
          }
          .into(),
        );
      }
      log::debug!("merging another declaration block into `{}`", name);
      existing.super_types.extend(obj.super_types);
      for prop in obj.properties.into_iter().map(|x| x.1) {
        existing.redeclare(prop)?;
      }
    }
    None => {
      schema.objects_by_code.insert(code, obj.name.clone());
      schema.objects_by_name.insert(obj.name.clone(), obj);
    }
  }
  Ok(())
}

fn build_property(
  owner: &ObjectType,
  node: &OutlineNode,
  reserved: &ReservedNames,
) -> Result<Property> {
  if !node.children.is_empty() {
    return Err(
      SchemaCompileError::NestedProperty {
        object: owner.name.to_string(),
        property: node.tokens.first().cloned().unwrap_or_default(),
      }
      .into(),
    );
  }

  let (name, ty, code_text, tags) = match node.tokens.as_slice() {
    [name, ty, code, tags @ ..] => (name, ty, code, tags),
    _ => {
      return Err(
        SchemaCompileError::IncompleteProperty {
          object: owner.name.to_string(),
          line: node.line_number,
        }
        .into(),
      )
    }
  };

  let code: i64 = code_text
    .parse()
    .map_err(|_| SchemaCompileError::BadPropertyCode {
      object: owner.name.to_string(),
      property: name.clone(),
      code: code_text.clone(),
    })?;

  // Each `set:`, `list:` or map level adds one colon.
  if ty.matches(':').count() > MAX_TYPE_DEPTH {
    return Err(
      SchemaCompileError::TypeTooDeep {
        object: owner.name.to_string(),
        property: name.clone(),
        limit: MAX_TYPE_DEPTH,
      }
      .into(),
    );
  }

  if reserved.is_reserved_property(name) {
    return Err(
      SchemaCompileError::ReservedPropertyName {
        object: owner.name.to_string(),
        property: name.clone(),
      }
      .into(),
    );
  }

  Ok(Property {
    name: Arc::from(name.as_str()),
    ty: parse_type(ty),
    code,
    tags: tags.iter().cloned().collect(),
    owner: owner.name.clone(),
  })
}

/// Every object type named by a property type must be declared somewhere in the schema.
fn validate_references(schema: &Schema) -> Result<()> {
  for obj in schema.iter() {
    for (name, prop) in &obj.properties {
      for referenced in prop.ty.object_refs() {
        if !schema.objects_by_name.contains_key(referenced) {
          return Err(
            SchemaCompileError::MissingObjectType {
              object: obj.name.to_string(),
              property: name.to_string(),
              referenced: referenced.to_string(),
            }
            .into(),
          );
        }
      }
    }
  }
  Ok(())
}

struct InheritanceResolver<'a> {
  schema: &'a mut Schema,
  /// Object types currently being extended, outermost first.
  path: Vec<Arc<str>>,
}

impl<'a> InheritanceResolver<'a> {
  /// Merges all ancestors' properties into `name`. Shared ancestors are
  /// revisited on every path, which is harmless since inheriting is idempotent.
  fn extend(&mut self, name: &Arc<str>) -> Result<()> {
    if self.path.contains(name) {
      return Err(SchemaCompileError::RecursiveInheritance(name.to_string()).into());
    }

    let super_types = match self.schema.objects_by_name.get(name) {
      Some(x) => x.super_types.iter().cloned().collect::<Vec<_>>(),
      None => return Ok(()),
    };

    self.path.push(name.clone());
    for super_name in &super_types {
      if !self.schema.objects_by_name.contains_key(super_name) {
        log::warn!(
          "super type `{}` of `{}` is not declared; ignoring",
          super_name,
          name
        );
        continue;
      }
      self.extend(super_name)?;

      let (by_name, by_code) = match self.schema.objects_by_name.get_mut(super_name) {
        Some(st) => {
          st.sub_types.insert(name.clone());
          (st.properties.clone(), st.properties_by_code.clone())
        }
        None => continue,
      };
      if let Some(obj) = self.schema.objects_by_name.get_mut(name) {
        obj.inherit(&by_name, &by_code)?;
      }
    }
    self.path.pop();
    Ok(())
  }
}
