use crate::{error_kind, outline::parse_outline, ErrorKind};

#[test]
fn test_outline_tree() {
  let nodes = parse_outline(
    "User 1\n\tid int 1\n\n\tname string 2 optional\nGroup 2 Base\n\t// members\n\tmembers set:User 1\n",
  )
  .unwrap();
  assert_eq!(nodes.len(), 2);
  assert_eq!(nodes[0].tokens, vec!["User", "1"]);
  assert_eq!(nodes[0].children.len(), 2);
  assert_eq!(nodes[0].children[1].tokens, vec!["name", "string", "2", "optional"]);
  assert_eq!(nodes[0].children[1].line_number, 4);
  assert_eq!(nodes[1].tokens, vec!["Group", "2", "Base"]);
  assert_eq!(nodes[1].children.len(), 1);
  assert_eq!(nodes[1].children[0].line, "\tmembers set:User 1");
}

#[test]
fn test_outline_spaces_and_uniform_indent() {
  let nodes = parse_outline(
    r#"
    User 1
      id int 1
        extra thing
      name string 2
    Group 2
  "#,
  )
  .unwrap();
  assert_eq!(nodes.len(), 2);
  assert_eq!(nodes[0].children.len(), 2);
  assert_eq!(nodes[0].children[0].children.len(), 1);
  assert_eq!(nodes[0].children[0].children[0].tokens, vec!["extra", "thing"]);
}

#[test]
fn test_outline_bad_dedent() {
  let e = parse_outline("A 1\n    x int 1\n  y int 2\n").unwrap_err();
  assert_eq!(error_kind(&e), Some(ErrorKind::Format));
  assert!(e.to_string().contains("line 3"));
}

#[test]
fn test_outline_mixed_indentation() {
  let e = parse_outline("A 1\n\t  x int 1\n").unwrap_err();
  assert_eq!(error_kind(&e), Some(ErrorKind::Format));
}

#[test]
fn test_outline_empty() {
  assert!(parse_outline("").unwrap().is_empty());
  assert!(parse_outline("\n   \n// nothing\n").unwrap().is_empty());
}
