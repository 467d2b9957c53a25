use std::path::Path;

use anyhow::Result;
use keratin::{parse_type, parse_with_options, CompileOptions, Schema};
use structopt::StructOpt;
use thiserror::Error;

use crate::opt::{Opt, SubCommand};

mod opt;

#[derive(Error, Debug)]
enum CliError {
  #[error("cannot read config `{0}`: {1}")]
  BadConfig(String, String),
}

fn load_options(opt: &Opt) -> Result<CompileOptions> {
  let mut options = match &opt.config {
    Some(path) => {
      let text = std::fs::read_to_string(path)?;
      serde_yaml::from_str::<CompileOptions>(&text)
        .map_err(|e| CliError::BadConfig(path.display().to_string(), e.to_string()))?
    }
    None => CompileOptions::default(),
  };
  options.reserved_names.extend(opt.reserved.iter().cloned());
  Ok(options)
}

fn compile_file(path: &Path, options: &CompileOptions) -> Result<Schema> {
  let text = std::fs::read_to_string(path)?;
  let schema = parse_with_options(&text, options)?;
  log::info!(
    "Compiled {} object types from `{}`.",
    schema.len(),
    path.display()
  );
  Ok(schema)
}

fn main() -> Result<()> {
  if std::env::var("RUST_LOG").is_err() {
    std::env::set_var("RUST_LOG", "info");
  }
  pretty_env_logger::init_timed();
  let opt = Opt::from_args();
  let options = load_options(&opt)?;

  match &opt.subcmd {
    SubCommand::Check(x) => {
      let schema = compile_file(&x.schema, &options)?;
      println!(
        "{}",
        serde_json::to_string(&serde_json::json!({
          "objects": schema.len(),
          "properties": schema.iter().map(|x| x.own_properties().count()).sum::<usize>(),
        }))?
      );
    }
    SubCommand::Dump(x) => {
      let schema = compile_file(&x.schema, &options)?;
      if x.yaml {
        print!("{}", serde_yaml::to_string(&schema)?);
      } else {
        println!("{}", serde_json::to_string_pretty(&schema)?);
      }
    }
    SubCommand::Fmt(x) => {
      let schema = compile_file(&x.schema, &options)?;
      print!("{}", schema);
    }
    SubCommand::Type(x) => {
      let ty = parse_type(&x.expr);
      println!(
        "{}",
        serde_json::to_string(&serde_json::json!({
          "parsed": ty,
          "rendered": ty.to_string(),
        }))?
      );
    }
  }

  Ok(())
}
