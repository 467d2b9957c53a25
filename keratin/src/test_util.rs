use crate::{error_kind, parse, ErrorKind, Schema};

pub fn compile_ok(source: &str) -> Schema {
  let _ = pretty_env_logger::try_init();
  match parse::<&str>(source, &[]) {
    Ok(x) => x,
    Err(e) => panic!("schema failed to compile: {}", e),
  }
}

/// Compiles `source` expecting failure and returns the error's kind and message.
pub fn compile_err(source: &str, reserved: &[&str]) -> (ErrorKind, String) {
  let _ = pretty_env_logger::try_init();
  let e = match parse(source, reserved) {
    Ok(_) => panic!("schema compiled but an error was expected"),
    Err(e) => e,
  };
  let kind = error_kind(&e).unwrap_or_else(|| panic!("foreign error: {}", e));
  (kind, e.to_string())
}
