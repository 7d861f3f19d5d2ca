use colored::Colorize;

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>,
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None,
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn unknown_codec(name: &str, known: &[String]) -> UxError {
    UxError::new(format!("Unknown codec '{}'", name))
        .why(format!("Registered codecs: {}", known.join(", ")))
        .fix("Pick one of the registered codec names")
        .suggest("hotconf encode <value> --codec base64")
}

pub fn no_codec_output(tried: &[String]) -> UxError {
    UxError::new(format!("No codec produced output (tried {})", tried.join(", ")))
        .why("AES-based codecs need an encrypt key, and byte codecs only accept byte values")
        .fix("Set HOTCONF_ENCRYPT_KEY to 32 hex characters")
        .fix("Or pass a key file with --settings")
        .suggest("hotconf encode <value> --codec base64")
}

pub fn malformed_tag(raw: &str) -> UxError {
    UxError::new(format!("'{}' is not a [codec:payload] value", raw))
        .why("Tagged values start with '[', end with ']' and name the codec before ':'")
        .suggest("hotconf decode '[base64:aGVsbG8=]'")
}
