//! # CLI — BOB interactive shell
//!
//! A REPL-style command-line interface over a single BOB container file.
//! Reads commands from stdin, executes them against the handle, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET <text>    Replace the object with the given bytes
//! GET           Print the current object
//! LEN           Print the current object length in bytes
//! FLUSH         Force the object out to stable storage
//! STATS         Print handle debug info
//! EXIT / QUIT   Close the file and shut down
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! BOB_PATH        Container file path            (default: "data.bob")
//! BOB_BLOCK_SIZE  Block size in bytes, 0 = auto  (default: 0)
//! BOB_CUE_SIZE    Cue size in bytes, 0 = auto    (default: 0)
//! ```
//!
//! The file is opened if it exists and created otherwise; the size knobs
//! only matter on creation.
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! bob started (path=data.bob, blocksize=4096, cuesize=131072, len=0)
//! > SET hello world
//! OK
//! > GET
//! hello world
//! > LEN
//! 11
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use bob::{Bob, Config};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    let path = env_or("BOB_PATH", "data.bob");
    let blocksize: u64 = env_or("BOB_BLOCK_SIZE", "0").parse().unwrap_or(0);
    let cuesize: u64 = env_or("BOB_CUE_SIZE", "0").parse().unwrap_or(0);

    let mut bob = if Path::new(&path).exists() {
        Bob::open(&path)?
    } else {
        let mut cfg = Config::new();
        cfg.set_blocksize(blocksize);
        cfg.set_cuesize(cuesize);
        Bob::create(&cfg, &path)?
    };

    println!(
        "bob started (path={}, blocksize={}, cuesize={}, len={})",
        path,
        bob.blocksize(),
        bob.cuesize(),
        bob.current().len()
    );
    println!("Commands: SET <text> | GET | LEN | FLUSH | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.splitn(2, char::is_whitespace);
        if let Some(cmd) = parts.next().filter(|c| !c.is_empty()) {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    let value = parts.next().unwrap_or("");
                    match bob.set(value.as_bytes()) {
                        Ok(()) => println!("OK"),
                        Err(e) => println!("ERR set failed: {}", e),
                    }
                }
                "GET" => {
                    if bob.current().is_empty() {
                        println!("(empty)");
                    } else {
                        println!("{}", String::from_utf8_lossy(bob.current()));
                    }
                }
                "LEN" => {
                    println!("{}", bob.current().len());
                }
                "FLUSH" => match bob.flush() {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR flush failed: {}", e),
                },
                "STATS" => {
                    println!("{:?}", bob);
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    bob.close()?;
                    return Ok(());
                }
                other => {
                    println!("unknown command: {}", other);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    bob.close()?;
    Ok(())
}
