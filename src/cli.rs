//! Command-line interface for the `memaccess` binary.
//!
//! Argument parsing lives here together with command execution against an
//! attached [`Session`], so commands can run against any target the session
//! is generic over.

use crate::core::types::{Address, MemoryError, MemoryResult, ScalarKind};
use crate::memory::{OffsetChain, ProcessMemory};
use crate::session::Session;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Bytes per line in text dumps
const DUMP_WIDTH: usize = 16;

/// Read and write another process's memory.
///
/// Attaches to a running process and one of its loaded modules, then reads,
/// writes or resolves pointer chains relative to that module's base address.
#[derive(Parser, Debug)]
#[command(name = "memaccess")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to `memaccess.toml` in the current directory).
    #[arg(short, long, env = "MEMACCESS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Pointer width of the target (auto, 32, 64).
    #[arg(long, global = true)]
    pub pointer_width: Option<String>,

    /// Executable name of the target process, matched exactly.
    #[arg(short, long, global = true)]
    pub process: Option<String>,

    /// Module whose base address anchors chains (defaults to the process name).
    #[arg(short, long, global = true)]
    pub module: Option<String>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where a read or write lands
#[derive(Args, Debug, Clone)]
pub struct Location {
    /// Offset chain from the module base, e.g. "0x10,0x20,0x4".
    #[arg(required_unless_present = "at", conflicts_with = "at")]
    pub chain: Option<OffsetChain>,

    /// Absolute address instead of a chain.
    #[arg(long)]
    pub at: Option<Address>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the attached process and module.
    Base,

    /// Resolve an offset chain from the module base.
    Resolve {
        /// Offset chain, e.g. "0x10,0x20,0x4" or "0x10 -> 0x20 -> 0x4".
        chain: OffsetChain,

        /// Print every pointer hop.
        #[arg(long)]
        trace: bool,
    },

    /// Read a scalar.
    Read {
        /// Scalar kind (u8, u16, u32, u64, usize, i8..i64, f32, f64).
        kind: ScalarKind,

        #[command(flatten)]
        location: Location,
    },

    /// Write a scalar.
    Write {
        /// Scalar kind (u8, u16, u32, u64, usize, i8..i64, f32, f64).
        kind: ScalarKind,

        /// Value to write; unsigned kinds accept 0x-prefixed hex.
        value: String,

        #[command(flatten)]
        location: Location,
    },

    /// Hex dump raw bytes.
    Dump {
        /// Start address.
        address: Address,

        /// Number of bytes.
        len: usize,
    },

    /// Write raw bytes given as hex.
    Poke {
        /// Start address.
        address: Address,

        /// Bytes as a hex string, e.g. "90 90 c3" or "9090c3".
        bytes: String,
    },
}

fn locate<H: ProcessMemory>(session: &Session<H>, location: &Location) -> MemoryResult<Address> {
    match (&location.chain, location.at) {
        (_, Some(address)) => Ok(address),
        (Some(chain), None) => session.resolve_chain(chain),
        (None, None) => Err(MemoryError::InvalidValue(
            "either an offset chain or --at is required".to_string(),
        )),
    }
}

/// Run `command` against an attached session and render its output
pub fn execute<H: ProcessMemory>(
    session: &Session<H>,
    command: &Commands,
    format: OutputFormat,
) -> MemoryResult<String> {
    match command {
        Commands::Base => Ok(render_base(session, format)),
        Commands::Resolve { chain, trace } => {
            if *trace {
                let resolved = session.resolve_traced(chain)?;
                Ok(match format {
                    OutputFormat::Json => json!({
                        "base": resolved.base.to_string(),
                        "hops": resolved.hops.iter().map(|hop| json!({
                            "level": hop.level,
                            "address": hop.address.to_string(),
                            "value": hop.value.to_string(),
                        })).collect::<Vec<Value>>(),
                        "target": resolved.target.to_string(),
                    })
                    .to_string(),
                    OutputFormat::Text => {
                        let mut out = format!("base   {}\n", resolved.base);
                        for hop in &resolved.hops {
                            let _ = writeln!(out, "[{}]    {} -> {}", hop.level, hop.address, hop.value);
                        }
                        let _ = writeln!(out, "target {}", resolved.target);
                        out
                    }
                })
            } else {
                let target = session.resolve_chain(chain)?;
                Ok(match format {
                    OutputFormat::Json => json!({ "target": target.to_string() }).to_string(),
                    OutputFormat::Text => format!("{target}\n"),
                })
            }
        }
        Commands::Read { kind, location } => {
            let address = locate(session, location)?;
            let value = session.read_value(address, *kind)?;
            Ok(match format {
                OutputFormat::Json => json!({
                    "address": address.to_string(),
                    "value": value,
                })
                .to_string(),
                OutputFormat::Text => format!("{value}\n"),
            })
        }
        Commands::Write {
            kind,
            value,
            location,
        } => {
            let value = kind.parse_value(value)?;
            let address = locate(session, location)?;
            session.write_value(address, value)?;
            Ok(match format {
                OutputFormat::Json => json!({
                    "address": address.to_string(),
                    "written": value,
                })
                .to_string(),
                OutputFormat::Text => format!("wrote {value} ({kind}) at {address}\n"),
            })
        }
        Commands::Dump { address, len } => {
            let bytes = session.read_raw(*address, *len)?;
            Ok(match format {
                OutputFormat::Json => json!({
                    "address": address.to_string(),
                    "bytes": hex::encode(&bytes),
                })
                .to_string(),
                OutputFormat::Text => render_dump(*address, &bytes),
            })
        }
        Commands::Poke { address, bytes } => {
            let data = parse_hex_bytes(bytes)?;
            session.write_raw(*address, &data)?;
            Ok(match format {
                OutputFormat::Json => json!({
                    "address": address.to_string(),
                    "written": data.len(),
                })
                .to_string(),
                OutputFormat::Text => format!("wrote {} bytes at {}\n", data.len(), address),
            })
        }
    }
}

fn render_base<H: ProcessMemory>(session: &Session<H>, format: OutputFormat) -> String {
    let process = session.process();
    let module = session.module();
    match format {
        OutputFormat::Json => json!({
            "pid": process.pid,
            "process": process.name,
            "module": module.name,
            "base": module.base_address.to_string(),
            "size": module.size,
            "pointer_width": session.pointer_width().size() * 8,
        })
        .to_string(),
        OutputFormat::Text => format!(
            "{} [{}] {} base {} size 0x{:X} ({})\n",
            process.name,
            process.pid,
            module.name,
            module.base_address,
            module.size,
            session.pointer_width()
        ),
    }
}

fn render_dump(address: Address, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(DUMP_WIDTH).enumerate() {
        let line = address.add(row * DUMP_WIDTH);
        let hex = hex::encode(chunk);
        let spaced: Vec<&str> = (0..hex.len())
            .step_by(2)
            .map(|i| &hex[i..i + 2])
            .collect();
        let _ = writeln!(out, "{:>18}  {}", line.to_string(), spaced.join(" "));
    }
    out
}

/// Parse a hex byte string, ignoring whitespace and an optional 0x prefix
pub fn parse_hex_bytes(text: &str) -> MemoryResult<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits).map_err(|e| MemoryError::InvalidValue(format!("bad hex bytes: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PointerWidth;
    use crate::memory::SimulatedProcess;
    use crate::process::SimulatedSystem;
    use std::sync::Arc;

    fn attach() -> (Session<Arc<SimulatedProcess>>, Arc<SimulatedProcess>) {
        let mut system = SimulatedSystem::new();
        let memory = system.add_process(42, "game.exe");
        system
            .add_module(42, "game.exe", Address::new(0x400000), 0x1000)
            .set_pointer_width(42, PointerWidth::Bits32);
        memory
            .map_region(Address::new(0x400000), 0x1000)
            .map_region(Address::new(0x500000), 0x100)
            .poke_pointer(Address::new(0x400010), PointerWidth::Bits32, Address::new(0x500000));
        let session = Session::attach_with(&system, "game.exe", "game.exe").unwrap();
        (session, memory)
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from([
            "memaccess", "-p", "game.exe", "read", "u32", "0x10,0x4",
        ])
        .unwrap();
        assert_eq!(cli.process.as_deref(), Some("game.exe"));
        match cli.command {
            Commands::Read { kind, location } => {
                assert_eq!(kind, ScalarKind::U32);
                assert_eq!(location.chain.unwrap().offsets(), &[0x10, 0x4]);
                assert!(location.at.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cli_requires_location() {
        assert!(Cli::try_parse_from(["memaccess", "read", "u32"]).is_err());
        assert!(Cli::try_parse_from(["memaccess", "read", "u32", "0x10", "--at", "0x1000"]).is_err());
        assert!(Cli::try_parse_from(["memaccess", "read", "u32", "--at", "0x1000"]).is_ok());
    }

    #[test]
    fn test_execute_resolve_and_read() {
        let (session, memory) = attach();
        memory.poke(Address::new(0x500008), &77u32.to_ne_bytes());
        let chain: OffsetChain = "0x10, 0x8".parse().unwrap();

        let out = execute(
            &session,
            &Commands::Resolve {
                chain: chain.clone(),
                trace: false,
            },
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(out, "0x500008\n");

        let out = execute(
            &session,
            &Commands::Read {
                kind: ScalarKind::U32,
                location: Location {
                    chain: Some(chain),
                    at: None,
                },
            },
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(out, "77\n");
    }

    #[test]
    fn test_execute_write_json() {
        let (session, memory) = attach();
        let out = execute(
            &session,
            &Commands::Write {
                kind: ScalarKind::U16,
                value: "0xBEEF".to_string(),
                location: Location {
                    chain: None,
                    at: Some(Address::new(0x400020)),
                },
            },
            OutputFormat::Json,
        )
        .unwrap();

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["address"], "0x400020");
        assert_eq!(memory.peek(Address::new(0x400020), 2), 0xBEEFu16.to_ne_bytes());
    }

    #[test]
    fn test_execute_traced_resolution() {
        let (session, _memory) = attach();
        let out = execute(
            &session,
            &Commands::Resolve {
                chain: "0x10 -> 0x4".parse().unwrap(),
                trace: true,
            },
            OutputFormat::Json,
        )
        .unwrap();

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["hops"][0]["address"], "0x400010");
        assert_eq!(parsed["hops"][0]["value"], "0x500000");
        assert_eq!(parsed["target"], "0x500004");
    }

    #[test]
    fn test_poke_and_dump() {
        let (session, _memory) = attach();
        execute(
            &session,
            &Commands::Poke {
                address: Address::new(0x400100),
                bytes: "de ad be ef".to_string(),
            },
            OutputFormat::Text,
        )
        .unwrap();

        let out = execute(
            &session,
            &Commands::Dump {
                address: Address::new(0x400100),
                len: 4,
            },
            OutputFormat::Json,
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["bytes"], "deadbeef");
    }

    #[test]
    fn test_broken_chain_is_an_error() {
        let (session, _memory) = attach();
        let result = execute(
            &session,
            &Commands::Resolve {
                // 0x400800 holds a null pointer, so the second hop reads 0x0
                chain: "0x800, 0x0, 0x4".parse().unwrap(),
                trace: false,
            },
            OutputFormat::Text,
        );
        assert!(matches!(result, Err(MemoryError::Unresolved { level: 1, .. })));
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("0x9090c3").unwrap(), vec![0x90, 0x90, 0xC3]);
        assert_eq!(parse_hex_bytes("90 90 c3").unwrap(), vec![0x90, 0x90, 0xC3]);
        assert!(parse_hex_bytes("9").is_err());
    }

    #[test]
    fn test_render_dump_rows() {
        let bytes: Vec<u8> = (0..20).collect();
        let out = render_dump(Address::new(0x1000), &bytes);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].trim_start().starts_with("0x1010  10 11 12 13"));
    }
}
