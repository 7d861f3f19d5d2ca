//! Encode command - wraps a plain value in a codec tag
//!
//! Codecs are tried in the order given; the first one that produces output
//! wins. Byte codecs (`bytes64`, `bytesaes`) encode the UTF-8 bytes of the
//! value.

use anyhow::Result;
use clap::Args;
use hotconf::{TypeDescriptor, Value};
use hotconf::tag::render_parts;

use super::CodecContext;
use crate::ux_error;

const DEFAULT_CODEC: &str = "secret";

#[derive(Args)]
pub struct EncodeArgs {
    /// Plain value to encode
    #[arg(value_name = "VALUE")]
    pub value: String,

    /// Codec to try, in order (repeatable, default: secret)
    #[arg(long = "codec", value_name = "NAME")]
    pub codecs: Vec<String>
}

pub fn run(ctx: &CodecContext, args: EncodeArgs) -> Result<()> {
    let line = encode(ctx, &args)?;
    println!("{}", line);
    Ok(())
}

pub fn encode(ctx: &CodecContext, args: &EncodeArgs) -> Result<String> {
    let candidates = if args.codecs.is_empty() {
        vec![DEFAULT_CODEC.to_string()]
    } else {
        args.codecs.clone()
    };

    for name in &candidates {
        let Some(value_type) = ctx.codecs.value_type(name) else {
            return Err(ux_error::unknown_codec(name, &ctx.codecs.names()).into());
        };
        let value = if value_type == TypeDescriptor::bytes() {
            Value::bytes(args.value.as_bytes())
        } else {
            Value::str(args.value.clone())
        };
        if let Some(encoded) = ctx.codecs.encode(name, &value) {
            tracing::debug!("Encoded with {}", name);
            return Ok(render_parts(name, Some(&encoded)));
        }
    }
    Err(ux_error::no_codec_output(&candidates).into())
}
