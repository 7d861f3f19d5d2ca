//! Inspect command - lists the keys of a property file
//!
//! Each key is printed with the kind of tag its value carries. Values that
//! open with `[` but do not parse as a tag are reported as warnings since
//! the decoder would reject them for most field types.

use anyhow::{Context, Result};
use clap::Args;
use hotconf::parse_properties;
use hotconf::tag::parse_tag;
use std::path::PathBuf;

use crate::output;

#[derive(Args)]
pub struct InspectArgs {
    /// Property file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print values as well as keys
    #[arg(long)]
    pub values: bool
}

#[derive(Debug, PartialEq)]
pub enum Entry<'a> {
    Plain,
    Tagged(&'a str),
    Malformed
}

pub fn classify(value: &str) -> Entry<'_> {
    match parse_tag(value) {
        Some(tag) => Entry::Tagged(tag.name),
        None if value.trim_start().starts_with('[') => Entry::Malformed,
        None => Entry::Plain
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let store = parse_properties(&text);

    output::header(&format!("{} ({} keys)", args.file.display(), store.len()));
    let mut malformed = 0;
    for (key, value) in store.iter() {
        let shown = args.values.then_some(value);
        match classify(value) {
            Entry::Plain => println!("{}", output::entry_line(key, None, shown)),
            Entry::Tagged(name) => println!("{}", output::entry_line(key, Some(name), shown)),
            Entry::Malformed => {
                println!("{}", output::entry_line(key, None, shown));
                output::warn(&format!("{}: malformed tag {:?}", key, value));
                malformed += 1;
            }
        }
    }
    if malformed > 0 {
        output::hint("Wrap literal bracketed strings as [String:...]");
    }
    Ok(())
}
