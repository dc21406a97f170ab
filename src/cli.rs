//! Command line interface

use clap::{Parser, Subcommand, ValueEnum};

use crate::command::{Command, CommandError};
use crate::entity::Kind;

#[derive(Debug, Parser)]
#[command(name = "shelfdb", version, about = "Authors and books in a JSON file")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Backing JSON file, overrides `db_path` from the configuration
    #[arg(long)]
    pub db: Option<String>,

    /// Collection to operate on
    #[arg(value_enum)]
    pub collection: CollectionArg,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    Authors,
    Books,
}

impl From<CollectionArg> for Kind {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Authors => Kind::Authors,
            CollectionArg::Books => Kind::Books,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Action {
    /// List all entities
    List,
    /// Print one entity, or null
    Get { id: String },
    /// Add an entity given as a JSON object with an `id`
    Add { json: String },
    /// Merge a JSON object into an entity
    Update { id: String, json: String },
    /// Delete an entity
    Delete { id: String },
}

impl Cli {
    /// Turn the parsed arguments into a store command
    pub fn command(&self) -> Result<Command, CommandError> {
        let kind = Kind::from(self.collection);
        let cmd = match &self.action {
            Action::List => Command::List(kind),
            Action::Get { id } => Command::Get(kind, id.clone()),
            Action::Add { json } => Command::add(kind, json)?,
            Action::Update { id, json } => Command::update(kind, id.clone(), json)?,
            Action::Delete { id } => Command::Delete(kind, id.clone()),
        };
        Ok(cmd)
    }
}
