//! Decode command - resolves a `[codec:payload]` value

use anyhow::{Context, Result};
use clap::Args;
use hotconf::Value;
use hotconf::tag::parse_tag;

use super::CodecContext;
use crate::ux_error;

#[derive(Args)]
pub struct DecodeArgs {
    /// Tagged value, e.g. [base64:aGVsbG8=]
    #[arg(value_name = "TAGGED")]
    pub tagged: String
}

pub fn run(ctx: &CodecContext, args: DecodeArgs) -> Result<()> {
    println!("{}", decode(ctx, &args.tagged)?);
    Ok(())
}

pub fn decode(ctx: &CodecContext, tagged: &str) -> Result<String> {
    let tag = parse_tag(tagged).ok_or_else(|| ux_error::malformed_tag(tagged))?;
    let Some(payload) = tag.payload else {
        return Err(ux_error::malformed_tag(tagged).into());
    };
    if !ctx.codecs.contains(tag.name) {
        return Err(ux_error::unknown_codec(tag.name, &ctx.codecs.names()).into());
    }
    let value = ctx
        .codecs
        .decode_tagged(tag.name, payload)
        .with_context(|| format!("Codec {} could not decode the payload", tag.name))?;

    Ok(match value {
        Value::Str(text) => text,
        other => match other.as_bytes() {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => other.to_string()
        }
    })
}
