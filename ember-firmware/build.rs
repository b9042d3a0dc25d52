//! Build script for ember-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates ember.toml and turns it into `OUT_DIR/ember_config.rs`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = load_config();
    let generated = generate_config(&config);

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("ember_config.rs"), generated).unwrap();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and validate ember.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=ember.toml");

    let config_path = Path::new("ember.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: ember.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires an ember.toml configuration file          ║\n\
            ║  with [link] and [strip] sections in the ember-firmware          ║\n\
            ║  directory.                                                      ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read ember.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in ember.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_link(&config, &mut errors);
    validate_strip(&config, &mut errors);
    report("Invalid ember.toml configuration", &errors);

    println!("cargo:warning=ember.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with all collected errors, if any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Look up an integer and check its range
fn int_in(
    section: &toml::Table,
    name: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match section.get(key) {
        Some(toml::Value::Integer(v)) if range.contains(v) => {}
        Some(toml::Value::Integer(_)) => errors.push(format!(
            "[{}] {} must be {}-{}",
            name,
            key,
            range.start(),
            range.end()
        )),
        Some(_) => errors.push(format!("[{}] {} must be an integer", name, key)),
        None => errors.push(format!("[{}] missing '{}'", name, key)),
    }
}

/// Look up a string and check it against the allowed values
fn one_of(
    section: &toml::Table,
    name: &str,
    key: &str,
    allowed: &[&str],
    errors: &mut Vec<String>,
) {
    match section.get(key) {
        Some(toml::Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be one of {}",
            name,
            key,
            allowed.join(", ")
        )),
        None => errors.push(format!("[{}] missing '{}'", name, key)),
    }
}

fn section<'a>(config: &'a toml::Value, name: &str, errors: &mut Vec<String>) -> Option<&'a toml::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            errors.push(format!("Missing [{}] section", name));
            None
        }
    }
}

/// Validate the Modbus link settings
fn validate_link(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(link) = section(config, "link", errors) else {
        return;
    };

    // 0 is broadcast, 248-255 are reserved
    int_in(link, "link", "address", 1..=247, errors);
    int_in(link, "link", "baudrate", 1200..=115_200, errors);
    one_of(link, "link", "parity", &["none", "even", "odd"], errors);
    int_in(link, "link", "stop_bits", 1..=2, errors);
}

/// Validate the strip and render settings
fn validate_strip(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(strip) = section(config, "strip", errors) else {
        return;
    };

    // Pixel registers span 0x0100..=0xFFFF, two per pixel
    int_in(strip, "strip", "pixels", 1..=1024, errors);
    int_in(strip, "strip", "frame_period_ms", 5..=1000, errors);
    one_of(strip, "strip", "effect", &["none", "static", "fire"], errors);
    int_in(strip, "strip", "cooling", 0..=255, errors);
    int_in(strip, "strip", "sparking", 0..=255, errors);
}

fn int(config: &toml::Value, section: &str, key: &str) -> i64 {
    config[section][key].as_integer().unwrap()
}

fn string<'a>(config: &'a toml::Value, section: &str, key: &str) -> &'a str {
    config[section][key].as_str().unwrap()
}

/// Emit the validated values as Rust constants
fn generate_config(config: &toml::Value) -> String {
    let parity = match string(config, "link", "parity") {
        "none" => "None",
        "odd" => "Odd",
        _ => "Even",
    };
    let stop_bits = match int(config, "link", "stop_bits") {
        2 => "Two",
        _ => "One",
    };
    let effect = match string(config, "strip", "effect") {
        "static" => 1,
        "fire" => 2,
        _ => 0,
    };

    format!(
        "// Generated from ember.toml by build.rs\n\
         pub const SLAVE_ADDRESS: u8 = {};\n\
         pub const BAUDRATE: u32 = {};\n\
         pub const PARITY: ember_hal::uart::Parity = ember_hal::uart::Parity::{};\n\
         pub const STOP_BITS: ember_hal::uart::StopBits = ember_hal::uart::StopBits::{};\n\
         pub const PIXELS: usize = {};\n\
         pub const FRAME_PERIOD_MS: u32 = {};\n\
         pub const EFFECT: u16 = {};\n\
         pub const COOLING: u8 = {};\n\
         pub const SPARKING: u8 = {};\n",
        int(config, "link", "address"),
        int(config, "link", "baudrate"),
        parity,
        stop_bits,
        int(config, "strip", "pixels"),
        int(config, "strip", "frame_period_ms"),
        effect,
        int(config, "strip", "cooling"),
        int(config, "strip", "sparking"),
    )
}
