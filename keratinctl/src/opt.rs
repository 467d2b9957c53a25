use std::path::PathBuf;

use structopt::StructOpt;

/// Keratin schema tool.
#[derive(Debug, StructOpt)]
#[structopt(name = "keratinctl", about = "Keratin schema compiler.")]
pub struct Opt {
  /// YAML file with compile options.
  #[structopt(long, parse(from_os_str))]
  pub config: Option<PathBuf>,

  /// Reserved name; may be repeated. Appended to the config's list.
  #[structopt(long = "reserved")]
  pub reserved: Vec<String>,

  #[structopt(subcommand)]
  pub subcmd: SubCommand,
}

#[derive(Debug, StructOpt)]
pub enum SubCommand {
  /// Compile a schema and print a summary.
  Check(SchemaFile),

  /// Print the resolved schema.
  Dump(Dump),

  /// Print the schema re-rendered in canonical form.
  Fmt(SchemaFile),

  /// Parse a single type expression.
  Type(TypeArg),
}

#[derive(Debug, StructOpt)]
pub struct SchemaFile {
  /// Path to the schema.
  #[structopt(parse(from_os_str))]
  pub schema: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct Dump {
  /// Path to the schema.
  #[structopt(parse(from_os_str))]
  pub schema: PathBuf,

  /// Emit YAML instead of JSON.
  #[structopt(long)]
  pub yaml: bool,
}

#[derive(Debug, StructOpt)]
pub struct TypeArg {
  pub expr: String,
}
