use std::sync::Arc;

use crate::{
  config::CompileOptions,
  outline::{parse_outline, OutlineNode},
  parse_with_options,
  schema::{compile::keratinize, ty::TypeExpr},
  test_util::{compile_err, compile_ok},
  ErrorKind,
};

const SIMPLE_SCHEMA: &str = r#"
User 1
	id int 1
	name string 2 optional
	groups set:Group 3
	active bool 4

Group 2
	members list:User 1
	labels string:Label 2

Label 3
	text string 1
"#;

#[test]
fn test_compile_simple() {
  let schema = compile_ok(SIMPLE_SCHEMA);
  assert_eq!(schema.len(), 3);

  let user = schema.get("User").unwrap();
  assert_eq!(user.code, 1);
  assert_eq!(user.properties.len(), 4);
  assert_eq!(user.properties_by_code.len(), 4);

  let name = user.property("name").unwrap();
  assert_eq!(name.code, 2);
  assert!(name.has_tag("optional"));
  assert_eq!(&*name.owner, "User");
  assert_eq!(user.property("active").unwrap().ty.to_string(), "boolean");
  assert!(Arc::ptr_eq(
    user.property("groups").unwrap(),
    user.property_by_code(3).unwrap()
  ));

  assert_eq!(&*schema.get_by_code(2).unwrap().name, "Group");
  assert!(schema.get_by_code(99).is_none());
}

#[test]
fn test_declaration_order_is_kept() {
  let schema = compile_ok(SIMPLE_SCHEMA);
  let names = schema.iter().map(|x| &*x.name).collect::<Vec<_>>();
  assert_eq!(names, vec!["User", "Group", "Label"]);
  let props = schema
    .get("User")
    .unwrap()
    .properties
    .keys()
    .map(|x| &**x)
    .collect::<Vec<_>>();
  assert_eq!(props, vec!["id", "name", "groups", "active"]);
}

#[test]
fn test_duplicate_property_code() {
  let (kind, msg) = compile_err(
    r#"
User 1
	id int 1
	name string 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
  assert!(msg.contains("User"));
}

#[test]
fn test_duplicate_property_name() {
  let (kind, _) = compile_err(
    r#"
User 1
	id int 1
	id string 2
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
}

#[test]
fn test_property_codes_are_per_object() {
  let schema = compile_ok(
    r#"
A 1
	x int 1
B 2
	y int 1
"#,
  );
  let y = schema.get("B").unwrap().property_by_code(1).unwrap();
  assert_eq!(&*y.name, "y");
}

#[test]
fn test_missing_reference() {
  let (kind, msg) = compile_err(
    r#"
User 1
	friends set:Person 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Reference);
  assert!(msg.contains("User.friends"));
  assert!(msg.contains("Person"));
}

#[test]
fn test_missing_reference_in_map_value() {
  let (kind, msg) = compile_err(
    r#"
User 1
	scores string:Score 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Reference);
  assert!(msg.contains("Score"));
}

#[test]
fn test_missing_reference_nested() {
  let (kind, _) = compile_err(
    r#"
User 1
	history list:set:Event 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Reference);
}

#[test]
fn test_self_reference() {
  let schema = compile_ok(
    r#"
Node 1
	children list:Node 1
	parent Node 2
"#,
  );
  assert_eq!(schema.get("Node").unwrap().properties.len(), 2);
}

#[test]
fn test_reserved_object_name() {
  let (kind, _) = compile_err(
    r#"
object 1
	id int 1
"#,
    &["object"],
  );
  assert_eq!(kind, ErrorKind::Name);
}

#[test]
fn test_reserved_object_name_is_case_sensitive() {
  let schema = parse_with_options(
    "Object 1\n\tx int 1\n",
    &CompileOptions::with_reserved_names(&["object"]),
  )
  .unwrap();
  assert!(schema.get("Object").is_some());
}

#[test]
fn test_reserved_property_name_is_case_insensitive() {
  let (kind, msg) = compile_err(
    r#"
User 1
	ID int 1
"#,
    &["id"],
  );
  assert_eq!(kind, ErrorKind::Name);
  assert!(msg.contains("ID"));
}

#[test]
fn test_non_integer_codes() {
  let (kind, _) = compile_err("User one\n", &[]);
  assert_eq!(kind, ErrorKind::TypeSyntax);
  let (kind, _) = compile_err("User 1\n\tid int first\n", &[]);
  assert_eq!(kind, ErrorKind::TypeSyntax);
}

#[test]
fn test_type_nesting_limit() {
  let deep = format!("User 1\n\tx {}int 1\n", "set:".repeat(100_000));
  let (kind, msg) = compile_err(&deep, &[]);
  assert_eq!(kind, ErrorKind::TypeSyntax);
  assert!(msg.contains("User"));

  let fine = format!("User 1\n\tx {}int 1\n", "list:".repeat(10));
  assert_eq!(compile_ok(&fine).len(), 1);
}

#[test]
fn test_wrong_token_count() {
  let (kind, _) = compile_err("User\n", &[]);
  assert_eq!(kind, ErrorKind::Format);
  let (kind, _) = compile_err("User 1\n\tid int\n", &[]);
  assert_eq!(kind, ErrorKind::Format);
}

#[test]
fn test_nested_property() {
  let (kind, _) = compile_err(
    r#"
User 1
	address string 1
		street string 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Format);

  // Even a malformed property line is rejected for having children first.
  let (kind, _) = compile_err("User 1\n\taddress\n\t\tstreet\n", &[]);
  assert_eq!(kind, ErrorKind::Format);
}

#[test]
fn test_object_code_reused_by_another_name() {
  let (kind, msg) = compile_err(
    r#"
User 1
	id int 1
Group 1
	id int 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
  assert!(msg.contains("Group"));
  assert!(msg.contains("User"));
}

#[test]
fn test_object_name_reused_with_another_code() {
  let (kind, _) = compile_err(
    r#"
User 1
	id int 1
User 2
	name string 2
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
}

#[test]
fn test_redeclaration_merges() {
  let schema = compile_ok(
    r#"
User 1
	id int 1
Group 2
	name string 1
User 1
	name string 2
	email string 3
"#,
  );
  assert_eq!(schema.len(), 2);
  let user = schema.get("User").unwrap();
  assert_eq!(user.properties.len(), 3);
  assert_eq!(&*user.property_by_code(3).unwrap().name, "email");
}

#[test]
fn test_redeclaration_repeats_property() {
  let schema = compile_ok(
    r#"
User 1
	id int 1
User 1
	id int 1
	email string 2
"#,
  );
  let user = schema.get("User").unwrap();
  assert_eq!(user.properties.len(), 2);
  assert_eq!(user.properties_by_code.len(), 2);
  assert!(Arc::ptr_eq(
    user.property("id").unwrap(),
    user.property_by_code(1).unwrap()
  ));
}

#[test]
fn test_redeclaration_renames_code() {
  let (kind, _) = compile_err(
    r#"
User 1
	id int 1
User 1
	id int 2
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
}

#[test]
fn test_redeclaration_conflicting_property() {
  let (kind, _) = compile_err(
    r#"
User 1
	id int 1
User 1
	uid int 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Duplicate);
}

#[test]
fn test_inherit_from_two_supertypes() {
  let schema = compile_ok(
    r#"
A 1
	x int 1
B 2
	y string 2
C 3 A B
	z long 3
"#,
  );
  let a = schema.get("A").unwrap();
  let c = schema.get("C").unwrap();
  assert_eq!(c.properties.len(), 3);
  assert_eq!(c.properties_by_code.len(), 3);
  assert!(Arc::ptr_eq(c.property("x").unwrap(), a.property("x").unwrap()));
  assert_eq!(&*c.property_by_code(2).unwrap().owner, "B");
  assert_eq!(c.own_properties().count(), 1);
  assert!(a.sub_types.contains("C"));
}

#[test]
fn test_name_collision_between_supertypes() {
  let (kind, msg) = compile_err(
    r#"
A 1
	x int 1
B 2
	x int 2
C 3 A B
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Collision);
  assert!(msg.contains("A.x"));
  assert!(msg.contains("B.x"));
}

#[test]
fn test_code_collision_with_own_property() {
  let (kind, msg) = compile_err(
    r#"
User 1
	id int 1
	name string 2
Admin 2 User
	level int 1
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Collision);
  assert!(msg.contains("Admin.level"));
  assert!(msg.contains("User.id"));
}

#[test]
fn test_diamond() {
  let schema = compile_ok(
    r#"
D 4 B C
	d int 4
B 2 A
	b int 2
C 3 A
	c int 3
A 1
	a int 1
"#,
  );
  let d = schema.get("D").unwrap();
  assert_eq!(d.properties.len(), 4);
  assert_eq!(d.properties_by_code.len(), 4);
  assert!(Arc::ptr_eq(
    d.property("a").unwrap(),
    schema.get("A").unwrap().property("a").unwrap()
  ));
}

#[test]
fn test_multi_level_chain() {
  let schema = compile_ok(
    r#"
Leaf 3 Middle
	leaf int 3
Middle 2 Root
	middle int 2
Root 1
	root int 1
"#,
  );
  let leaf = schema.get("Leaf").unwrap();
  assert!(leaf.property("root").is_some());
  assert!(leaf.property_by_code(1).is_some());
  assert_eq!(schema.get("Middle").unwrap().properties.len(), 2);
}

#[test]
fn test_recursive_inheritance() {
  let (kind, _) = compile_err(
    r#"
A 1 B
	a int 1
B 2 A
	b int 2
"#,
    &[],
  );
  assert_eq!(kind, ErrorKind::Collision);
}

#[test]
fn test_undeclared_supertype_is_ignored() {
  let schema = compile_ok("A 1 Missing\n\ta int 1\n");
  assert_eq!(schema.get("A").unwrap().properties.len(), 1);
}

#[test]
fn test_skip_derived_declarations() {
  let source = "User 1\n\tid int 1\nadmins(User) 2\nactive := User\n";
  let schema = compile_ok(source);
  assert_eq!(schema.len(), 1);

  let options = CompileOptions {
    skip_derived_declarations: false,
    ..Default::default()
  };
  assert!(parse_with_options(source, &options).is_err());
}

#[test]
fn test_keratinize_from_outline_nodes() {
  let mut user = OutlineNode::new("User 1", 1);
  user.children.push(OutlineNode::new("id int 1", 2));
  let schema = keratinize(&[user], &Default::default()).unwrap();
  assert_eq!(
    schema.get("User").unwrap().property("id").unwrap().ty,
    TypeExpr::Primitive {
      primitive: crate::PrimitiveType::Int
    }
  );

  let mut bad = OutlineNode::new("User 1", 1);
  let mut prop = OutlineNode::new("id int 1", 2);
  prop.children.push(OutlineNode::new("extra", 3));
  bad.children.push(prop);
  assert!(keratinize(&[bad], &Default::default()).is_err());

  let outline = parse_outline(SIMPLE_SCHEMA).unwrap();
  assert_eq!(keratinize(&outline, &Default::default()).unwrap().len(), 3);
}

#[test]
fn test_serialize() {
  let schema = compile_ok(SIMPLE_SCHEMA);
  let value = serde_json::to_value(&schema).unwrap();
  assert_eq!(
    value["objects_by_name"]["User"]["properties"]["groups"]["type"]["type"],
    "set"
  );
  assert_eq!(
    value["objects_by_name"]["User"]["properties"]["groups"]["type"]["members"]["object"],
    "Group"
  );
  let yaml = serde_yaml::to_string(&schema).unwrap();
  assert!(yaml.contains("Label"));
}
