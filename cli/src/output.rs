use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

/// One `inspect` line: `key [tag] = value`, with the tag and value parts
/// only when present. Left uncolored so it stays greppable.
pub fn entry_line(key: &str, tag: Option<&str>, value: Option<&str>) -> String {
    let mut line = key.to_string();
    if let Some(tag) = tag {
        line.push_str(&format!(" [{}]", tag));
    }
    if let Some(value) = value {
        line.push_str(&format!(" = {}", value));
    }
    line
}
